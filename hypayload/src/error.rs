use thiserror::Error;

use crate::types::FieldType;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Neither a field name nor a field id was supplied")]
    NullArgument,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No field matching name {name:?} / fid {fid} in payload")]
    NotFound { name: Option<String>, fid: u16 },

    #[error("Field is stored as {stored} and cannot be accessed as {requested}")]
    WrongFieldType {
        stored: FieldType,
        requested: FieldType,
    },

    #[error("Wire format version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("Unknown field type tag 0x{tag:02x} at offset {offset}")]
    UnknownFieldType { tag: u8, offset: usize },

    #[error("Record at offset {offset} needs {needed} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Cannot grow payload buffer to {requested} bytes (limit: {limit:?})")]
    OutOfMemory {
        requested: usize,
        limit: Option<usize>,
    },

    #[error("Operation `{0}` is not implemented")]
    NotImplemented(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse payload configuration '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },
}

pub type PayloadResult<T> = Result<T, PayloadError>;

impl PayloadError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PayloadError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(name: Option<&str>, fid: u16) -> Self {
        PayloadError::NotFound {
            name: name.map(str::to_owned),
            fid,
        }
    }

    /// The status code this error reports to the surrounding middleware.
    pub fn status(&self) -> Status {
        Status::from(self)
    }
}

/// Closed status taxonomy reported across the middleware boundary.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    NullArgument,
    InvalidArgument,
    NotFound,
    WrongFieldType,
    NotImplemented,
    OutOfMemory,
}

impl From<&PayloadError> for Status {
    fn from(value: &PayloadError) -> Self {
        match value {
            PayloadError::NullArgument => Status::NullArgument,
            PayloadError::InvalidArgument(_)
            | PayloadError::Truncated { .. }
            | PayloadError::Io(_)
            | PayloadError::ConfigParse { .. } => Status::InvalidArgument,
            PayloadError::NotFound { .. } => Status::NotFound,
            PayloadError::WrongFieldType { .. }
            | PayloadError::UnsupportedVersion { .. }
            | PayloadError::UnknownFieldType { .. } => Status::WrongFieldType,
            PayloadError::OutOfMemory { .. } => Status::OutOfMemory,
            PayloadError::NotImplemented(_) => Status::NotImplemented,
        }
    }
}

impl<T> From<&PayloadResult<T>> for Status {
    fn from(value: &PayloadResult<T>) -> Self {
        match value {
            Ok(_) => Status::Ok,
            Err(e) => e.into(),
        }
    }
}
