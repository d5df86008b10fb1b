use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidFormat {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        ErrorKind::InvalidOperation { name: name.into() }.into()
    }

    pub fn short_buffer(element: impl Into<String>, expected: usize, actual: usize) -> Error {
        ErrorKind::ShortBuffer {
            element: element.into(),
            expected,
            actual,
        }
        .into()
    }

    pub fn unsupported_encoding(element: impl Into<String>, tag: u8) -> Error {
        ErrorKind::UnsupportedEncoding {
            element: element.into(),
            tag,
        }
        .into()
    }

    pub fn dest_too_small(required: usize, available: usize) -> Error {
        ErrorKind::DestBufferTooSmall {
            required,
            available,
        }
        .into()
    }

    pub fn value_out_of_range(element: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::ValueOutOfRange {
            element: element.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn parameter_mismatch(name: impl Into<String>, expected: u64, actual: u64) -> Error {
        ErrorKind::ParameterMismatch {
            name: name.into(),
            expected,
            actual,
        }
        .into()
    }

    /// Returns `true` for errors caused by a truncated or malformed input buffer.
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ShortBuffer { .. } | ErrorKind::InvalidFormat { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid encoded format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("short buffer for '{element}': expected at least {expected} bytes, got {actual}")]
    ShortBuffer {
        element: String,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported encoding tag {tag} for '{element}'")]
    UnsupportedEncoding { element: String, tag: u8 },

    #[error("destination buffer is too small: {required} values required, {available} available")]
    DestBufferTooSmall { required: usize, available: usize },

    #[error("value out of range for '{element}': {message}")]
    ValueOutOfRange { element: String, message: String },

    #[error("parameter mismatch for '{name}': expected {expected}, got {actual}")]
    ParameterMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
