//! Engine configuration.

use crate::arch::{select_view, Architecture, HostArchitecture, View};
use crate::error::Result;

/// Immutable configuration captured when a [`Registry`](crate::Registry) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Default architecture view for every operation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub architecture: Architecture,

    /// Machine architecture of the host.
    pub host: HostArchitecture,
}

impl EngineConfig {
    /// Creates a configuration for `host` using its native view.
    pub fn new(host: HostArchitecture) -> Self {
        Self {
            architecture: Architecture::Native,
            host,
        }
    }

    /// Sets the default architecture.
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// Checks the configuration and returns the view it selects.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ArchitectureIncorrect`](crate::RegistryError::ArchitectureIncorrect)
    /// for a 64-bit view on a 32-bit host.
    pub fn view(&self) -> Result<View> {
        select_view(self.architecture, self.host)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(HostArchitecture::detect())
    }
}
