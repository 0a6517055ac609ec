//! Key operations and whole-value convergence.

use crate::error::Result;
use crate::path::RegistryPath;
use crate::registry::{Outcome, Registry};
use crate::transport::{Access, RegistryHandle, RegistryTransport};
use crate::value::Value;
use tracing::{debug, info, instrument, warn};

impl<T: RegistryTransport> Registry<T> {
    /// Creates a key and makes sure `value` exists under it.
    ///
    /// When the parent key is missing, `recursive` decides: `false` declines
    /// without touching the registry, `true` creates every missing ancestor
    /// from the shallowest down. An already existing key is left alone, but
    /// `value` is still created if absent (an existing value is never
    /// overwritten).
    ///
    /// Ancestors created before a failure are not rolled back. A `value`
    /// that cannot round-trip is rejected with `InvalidFormat` before any key
    /// is created.
    #[instrument(skip(self))]
    pub fn create_key(
        &self,
        path: &str,
        value: Option<&Value>,
        recursive: bool,
    ) -> Result<Outcome> {
        if let Some(value) = value {
            value.data.validate(&value.name)?;
        }
        let path = self.resolve(path)?;
        let mut changed = false;

        if let Some(parent) = path.parent() {
            if !self.key_exists_at(&parent)? {
                if !recursive {
                    warn!(%path, "Parent key missing and recursive not set, key not created");
                    return Ok(Outcome::Declined);
                }
                for ancestor in path.ancestors() {
                    if !self.key_exists_at(&ancestor)? {
                        self.create_subkey_at(&ancestor)?;
                        changed = true;
                    }
                }
            }
            if !self.key_exists_at(&path)? {
                self.create_subkey_at(&path)?;
                changed = true;
            }
        }

        if let Some(value) = value {
            if self.find_value(&path, &value.name)?.is_none() {
                self.create_value_at(&path, value)?;
                changed = true;
            }
        }

        Ok(if changed {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        })
    }

    fn create_subkey_at(&self, path: &RegistryPath) -> Result<()> {
        let (Some(parent), Some(leaf)) = (path.parent(), path.leaf()) else {
            return Ok(());
        };
        self.open_existing(&parent, Access::Full)?.create_subkey(leaf)?;
        info!(%path, "Created key");
        Ok(())
    }

    /// Deletes a key.
    ///
    /// A key with subkeys is only deleted, together with its whole subtree,
    /// when `recursive` is set; otherwise the call is declined. A missing key
    /// is already the desired state. Hive roots are never deleted.
    #[instrument(skip(self))]
    pub fn delete_key(&self, path: &str, recursive: bool) -> Result<Outcome> {
        let path = self.resolve(path)?;
        let (Some(parent), Some(leaf)) = (path.parent(), path.leaf()) else {
            warn!(%path, "Refusing to delete a hive root");
            return Ok(Outcome::Declined);
        };

        let has_subkeys = match self.open(&path, Access::Read) {
            Ok(key) => key.has_subkeys()?,
            Err(err) if err.is_not_found() => {
                debug!(%path, "Key missing, nothing to delete");
                return Ok(Outcome::Unchanged);
            }
            Err(err) => return Err(err),
        };

        if has_subkeys && !recursive {
            warn!(%path, "Key has subkeys and recursive not set, key not deleted");
            return Ok(Outcome::Declined);
        }

        match self
            .open_existing(&parent, Access::Full)?
            .delete_subkey(leaf, has_subkeys)
        {
            Ok(()) => {
                info!(%path, recursive = has_subkeys, "Deleted key");
                Ok(Outcome::Changed)
            }
            Err(err) if err.is_not_found() => Ok(Outcome::Unchanged),
            Err(err) => Err(err),
        }
    }

    /// Returns the names of the key's immediate subkeys, in registry order.
    ///
    /// # Errors
    ///
    /// Returns `KeyMissing` if the key does not exist.
    #[instrument(skip(self))]
    pub fn get_subkeys(&self, path: &str) -> Result<Vec<String>> {
        let path = self.resolve(path)?;
        self.open_existing(&path, Access::Read)?.subkey_names()
    }

    /// Brings a single value to the desired state.
    ///
    /// Creates the key (subject to `recursive`, see [`Registry::create_key`])
    /// and the value when missing, otherwise updates the value in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the payload cannot round-trip and
    /// `TypesMismatch` if the live value has a different type.
    #[instrument(skip(self))]
    pub fn converge_value(&self, path: &str, value: &Value, recursive: bool) -> Result<Outcome> {
        value.data.validate(&value.name)?;
        let resolved = self.resolve(path)?;
        if !self.key_exists_at(&resolved)? {
            return self.create_key(path, Some(value), recursive);
        }
        if self.find_value(&resolved, &value.name)?.is_none() {
            return self.create_value_at(&resolved, value);
        }
        self.update_value(path, value)
    }
}
