//! Registry transport primitives.
//!
//! The engine never talks to the registry directly. It opens keys through a
//! [`RegistryTransport`] and works on the returned [`RegistryHandle`]. A
//! handle is closed when it is dropped, so every exit path releases it.
//!
//! Two transports are provided: [`MemoryTransport`], an in-process registry
//! usable on any platform, and `NativeTransport` (Windows only), backed by
//! the Win32 registry API.

use crate::arch::View;
use crate::error::Result;
use crate::path::Hive;
use crate::value::RawValue;

pub mod memory;
#[cfg(windows)]
pub mod native;

pub use memory::MemoryTransport;
#[cfg(windows)]
pub use native::NativeTransport;

/// Access requested when opening a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Query values and enumerate subkeys.
    Read,

    /// Query and set values.
    Write,

    /// Everything, including creating and deleting subkeys.
    Full,
}

impl Access {
    /// Returns true if this access permits setting and deleting values.
    pub fn can_write_values(&self) -> bool {
        matches!(self, Access::Write | Access::Full)
    }

    /// Returns true if this access permits creating and deleting subkeys.
    pub fn can_modify_subkeys(&self) -> bool {
        matches!(self, Access::Full)
    }
}

/// Opens registry keys.
pub trait RegistryTransport {
    /// Handle to an open key.
    type Key: RegistryHandle;

    /// Opens `key` (relative to `hive`, empty for the hive root) in `view`.
    ///
    /// A missing key must be reported with an error for which
    /// [`RegistryError::is_not_found`](crate::RegistryError::is_not_found)
    /// returns true.
    fn open(&self, hive: Hive, key: &str, access: Access, view: View) -> Result<Self::Key>;
}

impl<T: RegistryTransport + ?Sized> RegistryTransport for &T {
    type Key = T::Key;

    fn open(&self, hive: Hive, key: &str, access: Access, view: View) -> Result<Self::Key> {
        (**self).open(hive, key, access, view)
    }
}

/// Operations on an open key. Dropping the handle closes it.
pub trait RegistryHandle {
    /// Enumerates the key's values in registry order.
    fn values(&self) -> Result<Vec<RawValue>>;

    /// Enumerates the names of the immediate subkeys in registry order.
    fn subkey_names(&self) -> Result<Vec<String>>;

    /// Returns true if the key has at least one subkey.
    fn has_subkeys(&self) -> Result<bool> {
        Ok(!self.subkey_names()?.is_empty())
    }

    /// Writes (creates or replaces) a value.
    fn write_value(&self, name: &str, type_code: u32, data: &[u8]) -> Result<()>;

    /// Deletes a value.
    fn delete_value(&self, name: &str) -> Result<()>;

    /// Creates an immediate subkey. Succeeds if it already exists.
    fn create_subkey(&self, name: &str) -> Result<()>;

    /// Deletes an immediate subkey, with all its descendants if `recursive`.
    fn delete_subkey(&self, name: &str, recursive: bool) -> Result<()>;
}
