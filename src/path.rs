//! Hive-qualified registry path resolution.
//!
//! A path such as `HKCU\Software\Vendor\App` is split on backslashes. The
//! first segment selects one of the five well-known hives; the remaining
//! segments form the key path relative to that hive.

use crate::error::{RegistryError, Result};
use std::fmt;

/// Path separator used by the registry.
pub const SEPARATOR: char = '\\';

/// One of the well-known registry root keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    /// `HKEY_LOCAL_MACHINE` (`HKLM`).
    LocalMachine,

    /// `HKEY_USERS` (`HKU`).
    Users,

    /// `HKEY_CURRENT_USER` (`HKCU`).
    CurrentUser,

    /// `HKEY_CLASSES_ROOT` (`HKCR`).
    ClassesRoot,

    /// `HKEY_CURRENT_CONFIG` (`HKCC`).
    CurrentConfig,
}

impl Hive {
    /// All hives, in lookup table order.
    pub const ALL: [Hive; 5] = [
        Hive::LocalMachine,
        Hive::Users,
        Hive::CurrentUser,
        Hive::ClassesRoot,
        Hive::CurrentConfig,
    ];

    /// Looks up a hive by its shorthand.
    pub fn from_shorthand(shorthand: &str) -> Option<Self> {
        match shorthand {
            "HKLM" => Some(Hive::LocalMachine),
            "HKU" => Some(Hive::Users),
            "HKCU" => Some(Hive::CurrentUser),
            "HKCR" => Some(Hive::ClassesRoot),
            "HKCC" => Some(Hive::CurrentConfig),
            _ => None,
        }
    }

    /// Returns the shorthand for this hive.
    pub fn shorthand(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKLM",
            Hive::Users => "HKU",
            Hive::CurrentUser => "HKCU",
            Hive::ClassesRoot => "HKCR",
            Hive::CurrentConfig => "HKCC",
        }
    }

    /// Returns the full root key name.
    pub fn name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::Users => "HKEY_USERS",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::ClassesRoot => "HKEY_CLASSES_ROOT",
            Hive::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed, hive-qualified registry key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPath {
    hive: Hive,
    segments: Vec<String>,
}

impl RegistryPath {
    /// Parses a hive-qualified path.
    ///
    /// Empty segments (doubled or trailing separators) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::HiveMissing`] if the first segment is not a
    /// known hive shorthand.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reg_converge::{Hive, RegistryPath};
    ///
    /// let path = RegistryPath::parse("HKCU\\Software\\Root").unwrap();
    /// assert_eq!(path.hive(), Hive::CurrentUser);
    /// assert_eq!(path.key(), "Software\\Root");
    /// ```
    pub fn parse(path: &str) -> Result<Self> {
        let mut parts = path.split(SEPARATOR);
        let hive = parts
            .next()
            .and_then(Hive::from_shorthand)
            .ok_or_else(|| RegistryError::hive_missing(path))?;

        let segments = parts
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self { hive, segments })
    }

    /// Builds a path from a hive and relative key segments.
    pub fn from_parts<I, S>(hive: Hive, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hive,
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Splits the path into its hive and relative key.
    pub fn resolve(&self) -> (Hive, String) {
        (self.hive, self.key())
    }

    /// Returns the hive.
    pub fn hive(&self) -> Hive {
        self.hive
    }

    /// Returns the key path relative to the hive (empty for the hive root).
    pub fn key(&self) -> String {
        self.segments.join("\\")
    }

    /// Returns the relative key segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this path names the hive root itself.
    pub fn is_hive_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the last segment, or `None` for the hive root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the parent path, or `None` for the hive root.
    pub fn parent(&self) -> Option<RegistryPath> {
        if self.is_hive_root() {
            return None;
        }
        Some(Self {
            hive: self.hive,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns every proper ancestor below the hive root, shallowest first.
    ///
    /// For `HKCU\a\b\c` this yields `HKCU\a` and `HKCU\a\b`.
    pub fn ancestors(&self) -> Vec<RegistryPath> {
        (1..self.segments.len())
            .map(|depth| Self {
                hive: self.hive,
                segments: self.segments[..depth].to_vec(),
            })
            .collect()
    }

    /// Returns a child path.
    pub fn join(&self, name: &str) -> RegistryPath {
        let mut segments = self.segments.clone();
        segments.extend(
            name.split(SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Self {
            hive: self.hive,
            segments,
        }
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hive.shorthand())?;
        for segment in &self.segments {
            write!(f, "\\{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for RegistryPath {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Returns true if the path's first segment is a known hive shorthand.
///
/// The rest of the path is not inspected.
pub fn hive_exists(path: &str) -> bool {
    RegistryPath::parse(path).is_ok()
}
