use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the broad class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_chunk(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidChunk {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_index(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidIndex {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn out_of_bounds(index: usize, len: usize) -> Error {
        Error(ErrorKind::IndexOutOfBounds { index, len }.into())
    }

    pub fn shape_mismatch(value: &[usize], target: &[usize]) -> Error {
        Error(
            ErrorKind::ShapeMismatch {
                value: value.to_vec(),
                target: target.to_vec(),
            }
            .into(),
        )
    }

    pub fn count_mismatch(value: usize, target: usize) -> Error {
        Error(ErrorKind::CountMismatch { value, target }.into())
    }

    pub fn unsupported_selector(shape: &[usize], element_type: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnsupportedSelector {
                shape: shape.to_vec(),
                element_type: element_type.into(),
            }
            .into(),
        )
    }

    pub fn not_writeable() -> Error {
        Error(ErrorKind::NotWriteable.into())
    }

    pub fn arrow<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Arrow {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid chunk: {message}")]
    InvalidChunk { message: String },

    #[error("chunks are empty; cannot determine {what}")]
    EmptyArray { what: &'static str },

    #[error("negative indexes are not allowed in ChunkedArray (got {index})")]
    NegativeIndex { index: i64 },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(
        "boolean index did not match indexed array along dimension 0; \
         dimension is {len} but corresponding boolean dimension is {mask_len}"
    )]
    MaskLengthMismatch { len: usize, mask_len: usize },

    #[error("invalid index: {message}")]
    InvalidIndex { message: String },

    #[error("assignment destination is read-only")]
    NotWriteable,

    #[error("cannot copy sequence with size {value} to array with dimension {target}")]
    CountMismatch { value: usize, target: usize },

    #[error(
        "shape mismatch: value array of shape {value:?} could not be broadcast \
         to indexing result of shape {target:?}"
    )]
    ShapeMismatch {
        value: Vec<usize>,
        target: Vec<usize>,
    },

    #[error("cannot interpret shape {shape:?}, element type {element_type} as a fancy index or mask")]
    UnsupportedSelector {
        shape: Vec<usize>,
        element_type: String,
    },

    #[error("Arrow error: {context}")]
    Arrow {
        context: String,
        source: StdErrorBoxed,
    },
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::InvalidArgument { .. }
            | ErrorKind::InvalidChunk { .. }
            | ErrorKind::Arrow { .. } => ErrorCategory::Configuration,
            ErrorKind::EmptyArray { .. } => ErrorCategory::EmptyArray,
            ErrorKind::NegativeIndex { .. }
            | ErrorKind::IndexOutOfBounds { .. }
            | ErrorKind::MaskLengthMismatch { .. }
            | ErrorKind::InvalidIndex { .. } => ErrorCategory::Index,
            ErrorKind::NotWriteable => ErrorCategory::NotWriteable,
            ErrorKind::CountMismatch { .. } | ErrorKind::ShapeMismatch { .. } => {
                ErrorCategory::ShapeMismatch
            }
            ErrorKind::UnsupportedSelector { .. } => ErrorCategory::UnsupportedSelector,
        }
    }
}

/// Broad error classes, used by callers that only care about the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid construction arguments or chunk inputs.
    Configuration,
    /// Element type or dimension requested while every chunk is empty.
    EmptyArray,
    /// Negative, out-of-range or malformed positions.
    Index,
    /// Mutation attempted on a read-only array.
    NotWriteable,
    /// Assigned value disagrees with the selected region.
    ShapeMismatch,
    /// Selector that is neither integral, slice, integer array nor boolean array.
    UnsupportedSelector,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::invalid_arg("append_size", "must be positive").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::out_of_bounds(5, 5).category(),
            ErrorCategory::Index
        );
        assert_eq!(
            Error::from(ErrorKind::NegativeIndex { index: -1 }).category(),
            ErrorCategory::Index
        );
        assert_eq!(
            Error::count_mismatch(2, 3).category(),
            ErrorCategory::ShapeMismatch
        );
        assert_eq!(Error::not_writeable().category(), ErrorCategory::NotWriteable);
        assert_eq!(
            Error::unsupported_selector(&[2, 2], "Int64").category(),
            ErrorCategory::UnsupportedSelector
        );
    }

    #[test]
    fn test_messages_carry_values() {
        let err = Error::out_of_bounds(7, 5);
        assert_eq!(err.to_string(), "index 7 out of bounds for length 5");

        let err = Error::from(ErrorKind::MaskLengthMismatch {
            len: 5,
            mask_len: 4,
        });
        assert!(err.to_string().contains("dimension is 5"));
        assert!(err.to_string().contains("boolean dimension is 4"));

        let err = Error::shape_mismatch(&[2], &[3, 2]);
        assert!(err.to_string().contains("[2]"));
        assert!(err.to_string().contains("[3, 2]"));
    }
}
