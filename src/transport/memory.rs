//! In-process registry transport.
//!
//! Keeps one key tree per hive and view. On a 32-bit host both views share
//! the same tree, mirroring how Windows ignores the view flags there. Key and
//! value names compare case-insensitively and enumeration preserves insertion
//! order.

use super::{Access, RegistryHandle, RegistryTransport};
use crate::arch::{HostArchitecture, View};
use crate::error::{RegistryError, Result};
use crate::path::{Hive, RegistryPath};
use crate::value::{RawValue, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

#[derive(Debug, Default)]
struct KeyNode {
    name: String,
    values: Vec<RawValue>,
    subkeys: Vec<KeyNode>,
    read_only: bool,
}

impl KeyNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&KeyNode> {
        self.subkeys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut KeyNode> {
        self.subkeys.iter_mut().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    fn find(&self, segments: &[String]) -> Option<&KeyNode> {
        segments.iter().try_fold(self, |node, segment| node.child(segment))
    }

    fn find_mut(&mut self, segments: &[String]) -> Option<&mut KeyNode> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.child_mut(segment))
    }

    fn ensure_child(&mut self, name: &str) -> &mut KeyNode {
        let index = match self
            .subkeys
            .iter()
            .position(|k| k.name.eq_ignore_ascii_case(name))
        {
            Some(index) => index,
            None => {
                self.subkeys.push(KeyNode::new(name));
                self.subkeys.len() - 1
            }
        };
        &mut self.subkeys[index]
    }

    fn set_value(&mut self, value: RawValue) {
        match self
            .values
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(&value.name))
        {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
    }
}

#[derive(Debug)]
struct Inner {
    host: HostArchitecture,
    trees: RwLock<HashMap<(Hive, View), KeyNode>>,
    open_handles: AtomicUsize,
}

/// Registry held in memory.
///
/// Cloning yields another handle to the same registry.
///
/// # Examples
///
/// ```rust
/// use reg_converge::{HostArchitecture, MemoryTransport, Value, ValueData, View};
///
/// let transport = MemoryTransport::new(HostArchitecture::X64);
/// transport.create_key_all(View::Registry64, "HKCU\\Software\\Root").unwrap();
/// transport
///     .set_value(
///         View::Registry64,
///         "HKCU\\Software\\Root",
///         &Value::new("RootType1", ValueData::String("fibrous".into())),
///     )
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

impl MemoryTransport {
    /// Creates an empty registry for a host of the given architecture.
    pub fn new(host: HostArchitecture) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                trees: RwLock::new(HashMap::new()),
                open_handles: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns the host architecture this registry emulates.
    pub fn host(&self) -> HostArchitecture {
        self.inner.host
    }

    /// Returns the number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.inner.open_handles.load(Ordering::SeqCst)
    }

    /// Creates a key and all missing ancestors, bypassing any engine policy.
    pub fn create_key_all(&self, view: View, path: &str) -> Result<()> {
        let path = RegistryPath::parse(path)?;
        self.inner.with_tree_mut(path.hive(), view, |root| {
            let mut node = root;
            for segment in path.segments() {
                node = node.ensure_child(segment);
            }
            Ok(())
        })
    }

    /// Writes a typed value under an existing key.
    pub fn set_value(&self, view: View, path: &str, value: &Value) -> Result<()> {
        self.set_raw_value(
            view,
            path,
            RawValue {
                name: value.name.clone(),
                type_code: value.value_type().native_code(),
                data: value.data.to_bytes(),
            },
        )
    }

    /// Writes a raw value under an existing key.
    ///
    /// Allows native types the engine itself never writes.
    pub fn set_raw_value(&self, view: View, path: &str, value: RawValue) -> Result<()> {
        let path = RegistryPath::parse(path)?;
        self.inner.with_tree_mut(path.hive(), view, |root| {
            let node = root
                .find_mut(path.segments())
                .ok_or_else(|| RegistryError::not_found("key", &path.to_string()))?;
            node.set_value(value);
            Ok(())
        })
    }

    /// Makes a key refuse every write, as a key with a restrictive ACL would.
    pub fn set_read_only(&self, view: View, path: &str, read_only: bool) -> Result<()> {
        let path = RegistryPath::parse(path)?;
        self.inner.with_tree_mut(path.hive(), view, |root| {
            let node = root
                .find_mut(path.segments())
                .ok_or_else(|| RegistryError::not_found("key", &path.to_string()))?;
            node.read_only = read_only;
            Ok(())
        })
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(HostArchitecture::X64)
    }
}

impl Inner {
    /// A 32-bit host has a single view.
    fn effective_view(&self, view: View) -> View {
        match self.host {
            HostArchitecture::X86 => View::Registry32,
            HostArchitecture::X64 => view,
        }
    }

    fn with_tree<R>(&self, hive: Hive, view: View, f: impl FnOnce(Option<&KeyNode>) -> R) -> R {
        let trees = self.trees.read().expect("registry lock poisoned");
        f(trees.get(&(hive, self.effective_view(view))))
    }

    fn with_tree_mut<R>(&self, hive: Hive, view: View, f: impl FnOnce(&mut KeyNode) -> R) -> R {
        let mut trees = self.trees.write().expect("registry lock poisoned");
        let root = trees
            .entry((hive, self.effective_view(view)))
            .or_insert_with(|| KeyNode::new(hive.name()));
        f(root)
    }
}

impl RegistryTransport for MemoryTransport {
    type Key = MemoryKey;

    fn open(&self, hive: Hive, key: &str, access: Access, view: View) -> Result<MemoryKey> {
        let path = RegistryPath::from_parts(hive, key.split('\\'));
        let exists = self.inner.with_tree(hive, view, |root| match root {
            Some(root) => root.find(path.segments()).is_some(),
            None => path.is_hive_root(),
        });
        if !exists {
            return Err(RegistryError::not_found("key", &path.to_string()));
        }

        self.inner.open_handles.fetch_add(1, Ordering::SeqCst);
        trace!(path = %path, ?access, ?view, "Opened key");
        Ok(MemoryKey {
            inner: Arc::clone(&self.inner),
            path,
            view,
            access,
        })
    }
}

/// Open key in a [`MemoryTransport`].
#[derive(Debug)]
pub struct MemoryKey {
    inner: Arc<Inner>,
    path: RegistryPath,
    view: View,
    access: Access,
}

impl MemoryKey {
    fn read<R>(&self, f: impl FnOnce(&KeyNode) -> R) -> Result<R> {
        self.inner.with_tree(self.path.hive(), self.view, |root| {
            let empty;
            let root = match root {
                Some(root) => root,
                None => {
                    empty = KeyNode::default();
                    &empty
                }
            };
            root.find(self.path.segments())
                .map(f)
                .ok_or_else(|| RegistryError::not_found("key", &self.path.to_string()))
        })
    }

    fn write<R>(&self, allowed: bool, f: impl FnOnce(&mut KeyNode) -> Result<R>) -> Result<R> {
        if !allowed {
            return Err(RegistryError::AccessDenied(format!(
                "key '{}' opened with {:?} access",
                self.path, self.access
            )));
        }
        self.inner.with_tree_mut(self.path.hive(), self.view, |root| {
            let node = root
                .find_mut(self.path.segments())
                .ok_or_else(|| RegistryError::not_found("key", &self.path.to_string()))?;
            if node.read_only {
                return Err(RegistryError::AccessDenied(format!("key '{}'", self.path)));
            }
            f(node)
        })
    }
}

impl RegistryHandle for MemoryKey {
    fn values(&self) -> Result<Vec<RawValue>> {
        self.read(|node| node.values.clone())
    }

    fn subkey_names(&self) -> Result<Vec<String>> {
        self.read(|node| node.subkeys.iter().map(|k| k.name.clone()).collect())
    }

    fn has_subkeys(&self) -> Result<bool> {
        self.read(|node| !node.subkeys.is_empty())
    }

    fn write_value(&self, name: &str, type_code: u32, data: &[u8]) -> Result<()> {
        self.write(self.access.can_write_values(), |node| {
            node.set_value(RawValue {
                name: name.to_string(),
                type_code,
                data: data.to_vec(),
            });
            Ok(())
        })
    }

    fn delete_value(&self, name: &str) -> Result<()> {
        self.write(self.access.can_write_values(), |node| {
            let index = node
                .values
                .iter()
                .position(|v| v.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| RegistryError::not_found("value", name))?;
            node.values.remove(index);
            Ok(())
        })
    }

    fn create_subkey(&self, name: &str) -> Result<()> {
        self.write(self.access.can_modify_subkeys(), |node| {
            node.ensure_child(name);
            Ok(())
        })
    }

    fn delete_subkey(&self, name: &str, recursive: bool) -> Result<()> {
        self.write(self.access.can_modify_subkeys(), |node| {
            let index = node
                .subkeys
                .iter()
                .position(|k| k.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| RegistryError::not_found("key", name))?;
            if !recursive && !node.subkeys[index].subkeys.is_empty() {
                return Err(RegistryError::AccessDenied(format!(
                    "key '{}' has subkeys",
                    name
                )));
            }
            node.subkeys.remove(index);
            Ok(())
        })
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.inner.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueData;

    fn seeded() -> MemoryTransport {
        let transport = MemoryTransport::default();
        transport
            .create_key_all(View::Registry64, "HKCU\\Software\\Root\\Branch")
            .unwrap();
        transport
    }

    #[test]
    fn test_open_missing_key() {
        let transport = seeded();
        let err = transport
            .open(Hive::CurrentUser, "Software\\Trunk", Access::Read, View::Registry64)
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(transport.open_handles(), 0);
    }

    #[test]
    fn test_hive_root_always_opens() {
        let transport = MemoryTransport::default();
        let key = transport
            .open(Hive::CurrentConfig, "", Access::Read, View::Registry64)
            .unwrap();
        assert!(key.subkey_names().unwrap().is_empty());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let transport = seeded();
        assert!(transport
            .open(Hive::CurrentUser, "SOFTWARE\\root", Access::Read, View::Registry64)
            .is_ok());
    }

    #[test]
    fn test_views_are_separate_on_64_bit_host() {
        let transport = seeded();
        assert!(transport
            .open(Hive::CurrentUser, "Software\\Root", Access::Read, View::Registry32)
            .is_err());
    }

    #[test]
    fn test_views_are_shared_on_32_bit_host() {
        let transport = MemoryTransport::new(HostArchitecture::X86);
        transport
            .create_key_all(View::Registry32, "HKLM\\Software\\Vendor")
            .unwrap();
        assert!(transport
            .open(Hive::LocalMachine, "Software\\Vendor", Access::Read, View::Registry64)
            .is_ok());
    }

    #[test]
    fn test_read_handle_cannot_write() {
        let transport = seeded();
        let key = transport
            .open(Hive::CurrentUser, "Software\\Root", Access::Read, View::Registry64)
            .unwrap();
        let err = key.write_value("Name", 1, &[0, 0]).unwrap_err();
        assert!(matches!(err, RegistryError::AccessDenied(_)));
    }

    #[test]
    fn test_write_replaces_in_place() {
        let transport = seeded();
        let path = "HKCU\\Software\\Root";
        transport
            .set_value(View::Registry64, path, &Value::new("A", ValueData::Dword(1)))
            .unwrap();
        transport
            .set_value(View::Registry64, path, &Value::new("B", ValueData::Dword(2)))
            .unwrap();
        transport
            .set_value(View::Registry64, path, &Value::new("a", ValueData::Dword(3)))
            .unwrap();

        let key = transport
            .open(Hive::CurrentUser, "Software\\Root", Access::Read, View::Registry64)
            .unwrap();
        let names: Vec<String> = key.values().unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(names, ["a", "B"]);
    }

    #[test]
    fn test_non_recursive_delete_refuses_subtree() {
        let transport = seeded();
        let key = transport
            .open(Hive::CurrentUser, "Software", Access::Full, View::Registry64)
            .unwrap();
        assert!(key.delete_subkey("Root", false).is_err());
        key.delete_subkey("Root", true).unwrap();
        assert!(!key.has_subkeys().unwrap());
    }

    #[test]
    fn test_handles_counted() {
        let transport = seeded();
        {
            let _a = transport
                .open(Hive::CurrentUser, "Software", Access::Read, View::Registry64)
                .unwrap();
            let _b = transport
                .clone()
                .open(Hive::CurrentUser, "Software\\Root", Access::Read, View::Registry64)
                .unwrap();
            assert_eq!(transport.open_handles(), 2);
        }
        assert_eq!(transport.open_handles(), 0);
    }
}
