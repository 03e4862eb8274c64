use std::{error, fmt, io};

use crate::value::ValueType;

#[derive(Debug)]
pub enum Error {
    InvalidAttributeType { path: String, value_type: ValueType },
    MissingClassLabels { path: String },
    JsonError(Box<dyn error::Error + Send>),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAttributeType { path, value_type } => write!(
                f,
                "Attributes must be numbers, strings or booleans, not {value_type} (at `{path}`)"
            ),
            Self::MissingClassLabels { path } => write!(
                f,
                "Binding a class to `{path}` requires both truthy and falsy class names"
            ),
            Self::JsonError(err) => fmt::Display::fmt(err, f),
            Self::IoError(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::JsonError(Box::new(err))
    }
}
