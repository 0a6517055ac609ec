//! Architecture-aware registry view selection.
//!
//! 64-bit Windows keeps separate 32-bit and 64-bit views of parts of the
//! registry. A caller names the architecture it wants to see; this module
//! checks that the request is possible on the host and turns it into the
//! access flag OR-ed into every open.

use crate::error::{RegistryError, Result};
use std::fmt;
use std::str::FromStr;

/// Access flag selecting the 64-bit view (`KEY_WOW64_64KEY`).
pub const KEY_WOW64_64KEY: u32 = 0x0100;

/// Access flag selecting the 32-bit view (`KEY_WOW64_32KEY`).
pub const KEY_WOW64_32KEY: u32 = 0x0200;

/// Requested registry architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Architecture {
    /// Use the host's own bitness.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "machine"))]
    Native,

    /// 32-bit view (`i386`).
    #[cfg_attr(feature = "serde", serde(rename = "i386"))]
    X86,

    /// 64-bit view (`x86_64`).
    #[cfg_attr(feature = "serde", serde(rename = "x86_64"))]
    X64,
}

impl Architecture {
    /// Returns the architecture token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Native => "native",
            Architecture::X86 => "i386",
            Architecture::X64 => "x86_64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "native" | "machine" => Ok(Architecture::Native),
            "i386" | "x86" => Ok(Architecture::X86),
            "x86_64" | "amd64" | "x64" => Ok(Architecture::X64),
            other => Err(RegistryError::UnknownArchitecture(other.to_string())),
        }
    }
}

/// Native architecture of the running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostArchitecture {
    /// 32-bit machine.
    #[cfg_attr(feature = "serde", serde(rename = "i386"))]
    X86,

    /// 64-bit machine.
    #[cfg_attr(feature = "serde", serde(rename = "x86_64"))]
    X64,
}

impl HostArchitecture {
    /// Parses a machine string as reported by system inventory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reg_converge::HostArchitecture;
    ///
    /// assert_eq!(HostArchitecture::from_machine("x86_64").unwrap(), HostArchitecture::X64);
    /// assert_eq!(HostArchitecture::from_machine("i386").unwrap(), HostArchitecture::X86);
    /// ```
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" | "arm64" | "aarch64" => Ok(HostArchitecture::X64),
            "i386" | "i486" | "i586" | "i686" | "x86" => Ok(HostArchitecture::X86),
            _ => Err(RegistryError::UnknownArchitecture(machine.to_string())),
        }
    }

    /// Detects the machine architecture of the running host.
    ///
    /// A 32-bit process under WOW64 still reports a 64-bit machine.
    pub fn detect() -> Self {
        if cfg!(target_pointer_width = "64") {
            return HostArchitecture::X64;
        }
        match std::env::var("PROCESSOR_ARCHITEW6432") {
            Ok(machine) => Self::from_machine(&machine).unwrap_or(HostArchitecture::X86),
            Err(_) => HostArchitecture::X86,
        }
    }

    /// Returns the machine token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostArchitecture::X86 => "i386",
            HostArchitecture::X64 => "x86_64",
        }
    }

    /// Returns the view this host uses when no architecture is requested.
    pub fn native_view(&self) -> View {
        match self {
            HostArchitecture::X86 => View::Registry32,
            HostArchitecture::X64 => View::Registry64,
        }
    }
}

impl fmt::Display for HostArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostArchitecture {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_machine(s)
    }
}

/// Registry view a key is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// 32-bit view.
    Registry32,

    /// 64-bit view.
    Registry64,
}

impl View {
    /// Returns the access mask bit selecting this view.
    pub fn access_flag(&self) -> u32 {
        match self {
            View::Registry32 => KEY_WOW64_32KEY,
            View::Registry64 => KEY_WOW64_64KEY,
        }
    }
}

/// Selects the registry view for a requested architecture.
///
/// # Errors
///
/// Returns [`RegistryError::ArchitectureIncorrect`] when the 64-bit view is
/// requested on a 32-bit host.
pub fn select_view(requested: Architecture, host: HostArchitecture) -> Result<View> {
    match (requested, host) {
        (Architecture::Native, host) => Ok(host.native_view()),
        (Architecture::X64, HostArchitecture::X86) => Err(RegistryError::ArchitectureIncorrect {
            requested: requested.to_string(),
            host: host.to_string(),
        }),
        (Architecture::X64, HostArchitecture::X64) => Ok(View::Registry64),
        (Architecture::X86, _) => Ok(View::Registry32),
    }
}
