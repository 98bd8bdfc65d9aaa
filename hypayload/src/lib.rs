//! Hypayload: a self-describing tag-length-value message payload.
//!
//! A [`Payload`] is one growable byte buffer holding a 3-byte versioned header
//! followed by field records. Each record carries a type tag, an optional numeric
//! field id, an optional name, and a value whose length is either implied by the
//! tag or stored explicitly.
//!
//! Reads are zero-copy: [`Payload::get_field`] and [`FieldIter`] hand out
//! [`Field`] views into the live buffer. Updates happen in place, shifting every
//! later record when a value changes size.
//!
//! Example
//! ```
//! use hypayload::{FieldType, Payload};
//!
//! let mut msg = Payload::new();
//! msg.add(None, 100, 12398i64).unwrap();
//! msg.add_string(Some("symbol"), 101, "ACME").unwrap();
//! msg.update(None, 100, 242355i64).unwrap();
//!
//! let field = msg.get_field(None, 100).unwrap();
//! assert_eq!(field.field_type(), FieldType::I64);
//! assert_eq!(field.as_string().unwrap(), "242355");
//!
//! let copy = Payload::from_byte_buffer(msg.serialize()).unwrap();
//! assert_eq!(copy.to_string(), "{[100]=242355,symbol[101]=ACME}");
//! ```

mod buffer;
pub mod config;
pub mod datetime;
pub mod dictionary;
pub mod error;
pub mod field;
pub mod header;
pub mod iter;
pub mod payload;
mod pretty;
pub mod price;
pub mod record;
pub mod types;
pub mod value;
pub mod vector;

pub use config::{ENV_PAYLOAD_CONFIG_PATH, PayloadConfig};
pub use datetime::DateTime;
pub use dictionary::{FieldDescriptor, FieldDictionary, StaticDictionary};
pub use error::{PayloadError, PayloadResult, Status};
pub use field::Field;
pub use header::{PAYLOAD_TYPE, WIRE_FORMAT_VERSION, WireHeader};
pub use iter::FieldIter;
pub use payload::Payload;
pub use price::{Price, PriceHints};
pub use record::RecordSpan;
pub use types::{FieldType, are_castable};
pub use value::{FieldValue, FixedElement, Quantity, Scalar, ScalarValue, VectorElement};
pub use vector::{MsgVector, ScalarVector, StringVector};
