//! Debug rendering of fields and payloads.
//!
//! `{name[fid]=value,...}`, or `name=value` for records without a fid. Nested and
//! composite values render as `{...}`.
use std::fmt;

use crate::{field::Field, payload::Payload};

impl fmt::Display for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name().unwrap_or_default();
        match self.fid() {
            0 => write!(f, "{name}=")?,
            fid => write!(f, "{name}[{fid}]=")?,
        }
        match self.value() {
            Ok(value) => write!(f, "{value}"),
            Err(_) => f.write_str("?"),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for field in self.iter() {
            if field.index() > 0 {
                f.write_str(",")?;
            }
            write!(f, "{field}")?;
        }
        f.write_str("}")
    }
}
