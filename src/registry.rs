//! Registry convergence engine: existence checks and value operations.
//!
//! Every operation resolves its path, opens the key it needs through the
//! transport, checks the live state and mutates only when the live state
//! differs from the desired one. Nothing is cached between calls; another
//! writer may change the registry at any time.

use crate::arch::{Architecture, View};
use crate::config::EngineConfig;
use crate::error::{RegistryError, Result};
use crate::path::{self, RegistryPath};
use crate::transport::{Access, RegistryHandle, RegistryTransport};
use crate::value::{RawValue, Value};
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// What a mutating operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The registry was modified.
    Changed,

    /// The registry already matched; nothing was written.
    Unchanged,

    /// A precondition was not met and the operation was skipped on purpose,
    /// e.g. a non-recursive create under a missing parent.
    Declined,
}

impl Outcome {
    /// Returns true if the registry was modified.
    pub fn is_changed(&self) -> bool {
        matches!(self, Outcome::Changed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Changed => "changed",
            Outcome::Unchanged => "unchanged",
            Outcome::Declined => "declined",
        })
    }
}

/// Registry convergence engine over a transport.
///
/// The default architecture view is fixed at construction. Use
/// [`Registry::with_architecture`] to run single operations against another
/// view.
///
/// # Examples
///
/// ```rust
/// use reg_converge::{EngineConfig, HostArchitecture, MemoryTransport, Outcome, Registry, Value, ValueData};
///
/// # fn main() -> reg_converge::Result<()> {
/// let registry = Registry::new(
///     MemoryTransport::new(HostArchitecture::X64),
///     EngineConfig::new(HostArchitecture::X64),
/// )?;
///
/// let value = Value::new("RootType1", ValueData::String("fibrous".into()));
/// assert_eq!(registry.create_key("HKCU\\Software\\Root", Some(&value), true)?, Outcome::Changed);
/// assert_eq!(registry.update_value("HKCU\\Software\\Root", &value)?, Outcome::Unchanged);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Registry<T> {
    transport: T,
    config: EngineConfig,
    view: View,
}

#[cfg(windows)]
impl Registry<crate::transport::NativeTransport> {
    /// Creates an engine over the live Windows registry.
    pub fn native(config: EngineConfig) -> Result<Self> {
        Self::new(crate::transport::NativeTransport::new(), config)
    }
}

impl<T: RegistryTransport> Registry<T> {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ArchitectureIncorrect`] if the configured
    /// architecture cannot be served by the host.
    pub fn new(transport: T, config: EngineConfig) -> Result<Self> {
        let view = config.view()?;
        debug!(architecture = %config.architecture, host = %config.host, ?view, "Registry engine configured");
        Ok(Self {
            transport,
            config,
            view,
        })
    }

    /// Returns an engine borrowing this one's transport with a different
    /// default architecture.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ArchitectureIncorrect`] if the architecture
    /// cannot be served by the host.
    pub fn with_architecture(&self, architecture: Architecture) -> Result<Registry<&T>> {
        Registry::new(&self.transport, self.config.with_architecture(architecture))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the view every open uses.
    pub fn view(&self) -> View {
        self.view
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn resolve(&self, path: &str) -> Result<RegistryPath> {
        let resolved = RegistryPath::parse(path)?;
        debug!(hive = %resolved.hive(), key = %resolved.key(), "Resolved registry path");
        Ok(resolved)
    }

    pub(crate) fn open(&self, path: &RegistryPath, access: Access) -> Result<T::Key> {
        self.transport.open(path.hive(), &path.key(), access, self.view)
    }

    /// Opens a key that must exist, mapping "not found" to `KeyMissing`.
    pub(crate) fn open_existing(&self, path: &RegistryPath, access: Access) -> Result<T::Key> {
        self.open(path, access).map_err(|err| {
            if err.is_not_found() {
                RegistryError::key_missing(&path.to_string())
            } else {
                err
            }
        })
    }

    pub(crate) fn key_exists_at(&self, path: &RegistryPath) -> Result<bool> {
        match self.open(path, Access::Read) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn find_value(&self, path: &RegistryPath, name: &str) -> Result<Option<RawValue>> {
        let key = self.open_existing(path, Access::Read)?;
        Ok(key
            .values()?
            .into_iter()
            .find(|v| v.name.eq_ignore_ascii_case(name)))
    }

    /// Returns true if the path's hive shorthand is known.
    pub fn hive_exists(&self, path: &str) -> bool {
        path::hive_exists(path)
    }

    /// Returns true if the key exists in this engine's view.
    ///
    /// # Errors
    ///
    /// Returns `HiveMissing` for an unknown hive, and any transport failure
    /// other than "not found".
    #[instrument(skip(self))]
    pub fn key_exists(&self, path: &str) -> Result<bool> {
        let path = self.resolve(path)?;
        self.key_exists_at(&path)
    }

    /// Fails with `KeyMissing` unless the key exists.
    pub fn require_key(&self, path: &str) -> Result<()> {
        if self.key_exists(path)? {
            Ok(())
        } else {
            Err(RegistryError::key_missing(path))
        }
    }

    /// Returns true if the key holds a value named `name`.
    ///
    /// # Errors
    ///
    /// Returns `KeyMissing` if the key does not exist.
    #[instrument(skip(self))]
    pub fn value_exists(&self, path: &str, name: &str) -> Result<bool> {
        let path = self.resolve(path)?;
        Ok(self.find_value(&path, name)?.is_some())
    }

    /// Fails with `ValueMissing` unless the value exists.
    pub fn require_value(&self, path: &str, name: &str) -> Result<()> {
        if self.value_exists(path, name)? {
            Ok(())
        } else {
            Err(RegistryError::value_missing(path, name))
        }
    }

    /// Returns true if the live value has the native type of `value`.
    ///
    /// # Errors
    ///
    /// Returns `ValueMissing` if no value of that name exists.
    #[instrument(skip(self))]
    pub fn type_matches(&self, path: &str, value: &Value) -> Result<bool> {
        let resolved = self.resolve(path)?;
        let live = self
            .find_value(&resolved, &value.name)?
            .ok_or_else(|| RegistryError::value_missing(path, &value.name))?;
        Ok(live.type_code == value.value_type().native_code())
    }

    /// Returns true if the key has at least one subkey.
    ///
    /// # Errors
    ///
    /// Returns `KeyMissing` if the key does not exist.
    #[instrument(skip(self))]
    pub fn has_subkeys(&self, path: &str) -> Result<bool> {
        let path = self.resolve(path)?;
        self.open_existing(&path, Access::Read)?.has_subkeys()
    }

    /// Returns every value under the key, in registry order.
    ///
    /// Values whose native type is outside [`ValueType`](crate::ValueType),
    /// or whose data does not decode as that type, are skipped; use
    /// [`Registry::get_raw_values`] to see them.
    ///
    /// # Errors
    ///
    /// Returns `KeyMissing` if the key does not exist.
    #[instrument(skip(self))]
    pub fn get_values(&self, path: &str) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for raw in self.get_raw_values(path)? {
            if raw.value_type().is_none() {
                warn!(name = %raw.name, type_code = raw.type_code, "Skipping value of unsupported type");
                continue;
            }
            match raw.decode() {
                Ok(value) => values.push(value),
                Err(err) => warn!(
                    name = %raw.name,
                    type_code = raw.type_code,
                    error = %err,
                    "Skipping undecodable value"
                ),
            }
        }
        Ok(values)
    }

    /// Returns every value under the key exactly as enumerated.
    pub fn get_raw_values(&self, path: &str) -> Result<Vec<RawValue>> {
        let path = self.resolve(path)?;
        self.open_existing(&path, Access::Read)?.values()
    }

    /// Returns a single value.
    ///
    /// # Errors
    ///
    /// Returns `KeyMissing` or `ValueMissing`, or
    /// [`RegistryError::InvalidValueType`] for an unsupported native type.
    #[instrument(skip(self))]
    pub fn get_value(&self, path: &str, name: &str) -> Result<Value> {
        let resolved = self.resolve(path)?;
        self.find_value(&resolved, name)?
            .ok_or_else(|| RegistryError::value_missing(path, name))?
            .decode()
    }

    /// Creates a value that must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the payload cannot round-trip, `KeyMissing`
    /// if the key does not exist and `ValueExists` if the name is already
    /// taken; the existing value is left untouched.
    #[instrument(skip(self))]
    pub fn create_value(&self, path: &str, value: &Value) -> Result<Outcome> {
        let path = self.resolve(path)?;
        self.create_value_at(&path, value)
    }

    pub(crate) fn create_value_at(&self, path: &RegistryPath, value: &Value) -> Result<Outcome> {
        value.data.validate(&value.name)?;
        let key = self.open_existing(path, Access::Write)?;
        if key.values()?.iter().any(|v| value.is_named(&v.name)) {
            return Err(RegistryError::value_exists(&path.to_string(), &value.name));
        }
        key.write_value(
            &value.name,
            value.value_type().native_code(),
            &value.data.to_bytes(),
        )?;
        info!(%path, name = %value.name, value_type = %value.value_type(), "Created value");
        Ok(Outcome::Changed)
    }

    /// Sets an existing value to the desired data if it differs.
    ///
    /// Returns [`Outcome::Unchanged`] without writing when the live data
    /// already matches.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the payload cannot round-trip, then
    /// `KeyMissing`, `ValueMissing`, or `TypesMismatch` when the live value
    /// has a different native type.
    #[instrument(skip(self))]
    pub fn update_value(&self, path: &str, value: &Value) -> Result<Outcome> {
        value.data.validate(&value.name)?;
        let resolved = self.resolve(path)?;
        let key = self.open_existing(&resolved, Access::Write)?;
        let live = key
            .values()?
            .into_iter()
            .find(|v| value.is_named(&v.name))
            .ok_or_else(|| RegistryError::value_missing(path, &value.name))?;

        let expected = value.value_type().native_code();
        if live.type_code != expected {
            return Err(RegistryError::TypesMismatch {
                path: path.to_string(),
                name: value.name.clone(),
                expected,
                found: live.type_code,
            });
        }

        // Undecodable live data counts as different and gets rewritten.
        let bytes = value.data.to_bytes();
        let same = live.data == bytes
            || live
                .decode()
                .map_or(false, |current| current.data == value.data);
        if same {
            debug!(name = %value.name, "Data is the same, value not updated");
            return Ok(Outcome::Unchanged);
        }

        key.write_value(&value.name, expected, &bytes)?;
        info!(path = %resolved, name = %value.name, "Updated value");
        Ok(Outcome::Changed)
    }

    /// Deletes a value if present.
    ///
    /// A missing value or a missing key is already the desired state and
    /// yields [`Outcome::Unchanged`].
    #[instrument(skip(self))]
    pub fn delete_value(&self, path: &str, name: &str) -> Result<Outcome> {
        let path = self.resolve(path)?;
        let key = match self.open(&path, Access::Write) {
            Ok(key) => key,
            Err(err) if err.is_not_found() => {
                debug!(%path, "Key missing, nothing to delete");
                return Ok(Outcome::Unchanged);
            }
            Err(err) => return Err(err),
        };

        if !key.values()?.iter().any(|v| v.name.eq_ignore_ascii_case(name)) {
            return Ok(Outcome::Unchanged);
        }
        match key.delete_value(name) {
            Ok(()) => {
                info!(%path, name = %name, "Deleted value");
                Ok(Outcome::Changed)
            }
            Err(err) if err.is_not_found() => Ok(Outcome::Unchanged),
            Err(err) => Err(err),
        }
    }
}
