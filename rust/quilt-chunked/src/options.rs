//! Construction options of a chunked array.

use quilt_common::{Result, verify_arg};
use serde::{Deserialize, Serialize};

/// Default number of elements reserved per appended chunk.
pub const DEFAULT_APPEND_SIZE: usize = 1024;

/// Options controlling mutation and growth of a [`ChunkedArray`](crate::ChunkedArray).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkedArrayOptions {
    /// When `false`, every write fails with a not-writeable error.
    pub writeable: bool,
    /// Whether chunks may be appended after construction.
    pub appendable: bool,
    /// Growth unit of the appendable mode. Must be positive.
    pub append_size: usize,
}

impl Default for ChunkedArrayOptions {
    fn default() -> Self {
        ChunkedArrayOptions {
            writeable: true,
            appendable: true,
            append_size: DEFAULT_APPEND_SIZE,
        }
    }
}

impl ChunkedArrayOptions {
    pub fn writeable(mut self, writeable: bool) -> Self {
        self.writeable = writeable;
        self
    }

    pub fn appendable(mut self, appendable: bool) -> Self {
        self.appendable = appendable;
        self
    }

    pub fn append_size(mut self, append_size: usize) -> Self {
        self.append_size = append_size;
        self
    }

    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `append_size` is zero.
    pub fn validate(&self) -> Result<()> {
        verify_arg!(append_size, self.append_size > 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilt_common::error::ErrorCategory;

    #[test]
    fn test_defaults() {
        let options = ChunkedArrayOptions::default();
        assert!(options.writeable);
        assert!(options.appendable);
        assert_eq!(options.append_size, 1024);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_append_size() {
        let err = ChunkedArrayOptions::default()
            .append_size(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("append_size"));
    }

    #[test]
    fn test_json() {
        let options: ChunkedArrayOptions =
            serde_json::from_str(r#"{ "writeable": false, "append_size": 16 }"#).unwrap();
        assert_eq!(
            options,
            ChunkedArrayOptions::default().writeable(false).append_size(16)
        );

        let json = serde_json::to_string(&options).unwrap();
        let back: ChunkedArrayOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
