//! Error types for registry convergence operations.
//!
//! Precondition failures (missing hive, key or value, type conflicts,
//! impossible architecture views) each have their own variant so callers
//! can match on them. Transport failures are carried through unmodified.

use std::io;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while inspecting or converging the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The first path segment is not a known hive shorthand.
    #[error("Unknown registry hive in path '{path}'")]
    HiveMissing {
        /// Path that failed to resolve.
        path: String,
    },

    /// An operation required an existing key.
    #[error("Registry key '{path}' does not exist")]
    KeyMissing {
        /// Path of the missing key.
        path: String,
    },

    /// An operation required an existing value.
    #[error("Registry value '{name}' does not exist under '{path}'")]
    ValueMissing {
        /// Key path.
        path: String,
        /// Name of the missing value.
        name: String,
    },

    /// Create was invoked for a value name that is already present.
    #[error("Registry value '{name}' already exists under '{path}'")]
    ValueExists {
        /// Key path.
        path: String,
        /// Name of the existing value.
        name: String,
    },

    /// The live value's native type differs from the desired one.
    #[error("Registry value '{name}' under '{path}' has type {found:#x}, expected {expected:#x}")]
    TypesMismatch {
        /// Key path.
        path: String,
        /// Value name.
        name: String,
        /// Native type code of the desired value.
        expected: u32,
        /// Native type code found in the registry.
        found: u32,
    },

    /// A 64-bit registry view was requested on a 32-bit host.
    #[error("Cannot access the {requested} registry view on a {host} host")]
    ArchitectureIncorrect {
        /// Requested architecture token.
        requested: String,
        /// Host machine architecture token.
        host: String,
    },

    /// The transport could not find the requested key or value.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The transport refused the operation.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Native registry call failed with a Win32 error code.
    #[error("{operation} failed with Win32 error {code}")]
    Os {
        /// Name of the failing native call.
        operation: &'static str,
        /// Win32 error code.
        code: u32,
    },

    /// I/O error reported by the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid value payload.
    #[error("Invalid value data: {0}")]
    InvalidFormat(String),

    /// Value payload is shorter than its type requires.
    #[error("Truncated data for value '{name}': expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Value name.
        name: String,
        /// Byte count required by the type.
        expected: usize,
        /// Byte count present.
        actual: usize,
    },

    /// Invalid UTF-16 string data.
    #[error("Invalid UTF-16 string in value '{name}'")]
    InvalidUtf16 {
        /// Value name.
        name: String,
    },

    /// Native type code outside the supported set.
    #[error("Unsupported value type: {0:#x}")]
    InvalidValueType(u32),

    /// Symbolic value type tag not recognised.
    #[error("Unknown value type tag: {0}")]
    UnknownValueType(String),

    /// Architecture token not recognised.
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),
}

impl RegistryError {
    /// Creates a hive missing error for `path`.
    pub fn hive_missing(path: &str) -> Self {
        Self::HiveMissing {
            path: path.to_string(),
        }
    }

    /// Creates a key missing error for `path`.
    pub fn key_missing(path: &str) -> Self {
        Self::KeyMissing {
            path: path.to_string(),
        }
    }

    /// Creates a value missing error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use reg_converge::error::RegistryError;
    /// let err = RegistryError::value_missing("HKCU\\Software\\Root", "RootType1");
    /// assert!(err.to_string().contains("RootType1"));
    /// ```
    pub fn value_missing(path: &str, name: &str) -> Self {
        Self::ValueMissing {
            path: path.to_string(),
            name: name.to_string(),
        }
    }

    /// Creates a value exists error.
    pub fn value_exists(path: &str, name: &str) -> Self {
        Self::ValueExists {
            path: path.to_string(),
            name: name.to_string(),
        }
    }

    /// Creates a transport-level not found error.
    pub fn not_found(item_type: &str, name: &str) -> Self {
        Self::NotFound(format!("{} '{}'", item_type, name))
    }

    /// Returns true for the "not found" class of transport failures.
    ///
    /// The existence oracle maps these to `false`; everything else is
    /// propagated.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(err) => err.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(RegistryError::not_found("key", "Software\\Missing").is_not_found());
        assert!(RegistryError::Io(io::Error::from(io::ErrorKind::NotFound)).is_not_found());
        assert!(!RegistryError::AccessDenied("Software".into()).is_not_found());
        assert!(!RegistryError::key_missing("HKCU\\Software").is_not_found());
    }

    #[test]
    fn test_types_mismatch_message() {
        let err = RegistryError::TypesMismatch {
            path: "HKCU\\Software\\Root".into(),
            name: "Petals".into(),
            expected: 1,
            found: 7,
        };
        assert_eq!(
            err.to_string(),
            "Registry value 'Petals' under 'HKCU\\Software\\Root' has type 0x7, expected 0x1"
        );
    }
}
