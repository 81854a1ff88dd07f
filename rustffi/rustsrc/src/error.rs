use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("native library not found at '{}'", .0.display())]
    LibraryMissing(PathBuf),

    #[error("failed to load native library '{}': {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol '{symbol}' not found in '{}': {source}", path.display())]
    SymbolNotFound {
        symbol: String,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("invalid symbol name '{0}'")]
    InvalidSymbolName(String),

    #[error("invalid shape {shape:?} for {len} elements")]
    InvalidShape { shape: Vec<usize>, len: usize },

    #[error("expected an array of rank {expected}, got rank {found}")]
    Rank { expected: String, found: usize },

    #[error("library registry lock poisoned")]
    Registry,
}

pub type Result<T, E = MarshalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = MarshalError::LibraryMissing(PathBuf::from("zig-out/bin/bib_array.dll"));
        assert_eq!(
            err.to_string(),
            "native library not found at 'zig-out/bin/bib_array.dll'"
        );

        let err = MarshalError::InvalidShape {
            shape: vec![2, 0],
            len: 0,
        };
        assert_eq!(err.to_string(), "invalid shape [2, 0] for 0 elements");

        let err = MarshalError::Rank {
            expected: "3".to_string(),
            found: 2,
        };
        assert_eq!(err.to_string(), "expected an array of rank 3, got rank 2");
    }
}
