//! # Windows Registry Convergence
//!
//! Declare the registry state you want (a key, a typed value, a CPU
//! architecture view) and let the engine inspect the live registry and apply
//! only the mutations needed to get there. Every mutating operation reports
//! whether it changed anything.
//!
//! ## Features
//!
//! - **Idempotent**: updates compare live data before writing
//! - **Safe by default**: missing ancestors and subtrees are only created or
//!   destroyed when recursion is explicitly requested
//! - **Architecture aware**: 32-bit and 64-bit registry views, validated
//!   against the host before any key is opened
//! - **Typed**: a closed set of value types with typed payloads
//! - **Pluggable transport**: the Win32 registry on Windows, an in-memory
//!   registry everywhere
//!
//! ## Architecture
//!
//! The engine is built from small layers:
//!
//! 1. **Path Resolver** ([`path`]): `HKCU\Software\Vendor` into hive and key
//! 2. **Architecture Selector** ([`arch`]): requested view vs. host bitness
//! 3. **Transport** ([`transport`]): open/enumerate/write/delete primitives
//! 4. **Existence checks and value operations** ([`registry`])
//! 5. **Key operations** ([`keys`])
//! 6. **Type Mapping** ([`value`]): symbolic types to native `REG_*` codes
//!
//! ## Outcomes
//!
//! ```text
//! Changed    the registry was modified
//! Unchanged  the registry already matched
//! Declined   skipped on purpose (missing parent or subkeys, no recursion)
//! ```
//!
//! ## Examples
//!
//! ### Converging a value
//!
//! ```rust
//! use reg_converge::{EngineConfig, HostArchitecture, MemoryTransport, Outcome, Registry, Value, ValueData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(
//!     MemoryTransport::new(HostArchitecture::X64),
//!     EngineConfig::new(HostArchitecture::X64),
//! )?;
//!
//! let path = "HKLM\\Software\\Vendor\\App";
//! let value = Value::new("InstallDir", ValueData::ExpandString("%ProgramFiles%\\App".into()));
//!
//! assert_eq!(registry.converge_value(path, &value, true)?, Outcome::Changed);
//! assert_eq!(registry.converge_value(path, &value, true)?, Outcome::Unchanged);
//! # Ok(())
//! # }
//! ```
//!
//! ### Targeting the 32-bit view
//!
//! ```rust
//! use reg_converge::{Architecture, EngineConfig, HostArchitecture, MemoryTransport, Registry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(
//!     MemoryTransport::new(HostArchitecture::X64),
//!     EngineConfig::new(HostArchitecture::X64),
//! )?;
//!
//! let wow64 = registry.with_architecture(Architecture::X86)?;
//! assert!(!wow64.key_exists("HKLM\\Software\\Vendor")?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arch;
pub mod config;
pub mod error;
pub mod keys;
pub mod path;
pub mod registry;
pub mod transport;
pub mod utils;
pub mod value;

// Re-export main types for convenience
pub use arch::{select_view, Architecture, HostArchitecture, View};
pub use config::EngineConfig;
pub use error::{RegistryError, Result};
pub use path::{Hive, RegistryPath};
pub use registry::{Outcome, Registry};
pub use transport::{Access, MemoryTransport, RegistryHandle, RegistryTransport};
#[cfg(windows)]
pub use transport::NativeTransport;
pub use value::{RawValue, Value, ValueData, ValueType};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
