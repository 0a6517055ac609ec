//! Win32 registry transport.

use super::{Access, RegistryHandle, RegistryTransport};
use crate::arch::View;
use crate::error::{RegistryError, Result};
use crate::path::Hive;
use crate::utils::to_wide;
use crate::value::RawValue;
use std::ptr::{null, null_mut};
use tracing::trace;
use windows_sys::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS,
    ERROR_SUCCESS, WIN32_ERROR,
};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteKeyExW, RegDeleteTreeW, RegDeleteValueW,
    RegEnumKeyExW, RegEnumValueW, RegOpenKeyExW, RegSetValueExW, HKEY, HKEY_CLASSES_ROOT,
    HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_ALL_ACCESS,
    KEY_QUERY_VALUE, KEY_READ, KEY_SET_VALUE, REG_OPTION_NON_VOLATILE,
};

/// Longest key name the registry allows, plus terminator.
const MAX_KEY_NAME: usize = 256;

/// Longest value name the registry allows, plus terminator.
const MAX_VALUE_NAME: usize = 16384;

/// Initial value data buffer, grown on `ERROR_MORE_DATA`.
const INITIAL_DATA_SIZE: usize = 1024;

fn check(operation: &'static str, status: WIN32_ERROR, subject: &str) -> Result<()> {
    match status {
        ERROR_SUCCESS => Ok(()),
        ERROR_FILE_NOT_FOUND => Err(RegistryError::not_found("key or value", subject)),
        ERROR_ACCESS_DENIED => Err(RegistryError::AccessDenied(subject.to_string())),
        code => Err(RegistryError::Os { operation, code }),
    }
}

fn root_handle(hive: Hive) -> HKEY {
    match hive {
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
        Hive::Users => HKEY_USERS,
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::ClassesRoot => HKEY_CLASSES_ROOT,
        Hive::CurrentConfig => HKEY_CURRENT_CONFIG,
    }
}

fn access_mask(access: Access) -> u32 {
    match access {
        Access::Read => KEY_READ,
        Access::Write => KEY_SET_VALUE | KEY_QUERY_VALUE,
        Access::Full => KEY_ALL_ACCESS,
    }
}

/// Transport backed by the Win32 registry API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTransport;

impl NativeTransport {
    /// Creates a native transport.
    pub fn new() -> Self {
        Self
    }
}

impl RegistryTransport for NativeTransport {
    type Key = NativeKey;

    fn open(&self, hive: Hive, key: &str, access: Access, view: View) -> Result<NativeKey> {
        let wide = to_wide(key);
        let sam = access_mask(access) | view.access_flag();
        let mut hkey: HKEY = null_mut();
        // SAFETY: `wide` is a null-terminated UTF-16 buffer that outlives the
        // call and `hkey` is a valid out pointer.
        let status = unsafe { RegOpenKeyExW(root_handle(hive), wide.as_ptr(), 0, sam, &mut hkey) };
        check("RegOpenKeyExW", status, key)?;
        trace!(%hive, key, ?access, ?view, "Opened native key");
        Ok(NativeKey {
            hkey,
            view_flag: view.access_flag(),
            name: key.to_string(),
        })
    }
}

/// Open Win32 registry key, closed on drop.
#[derive(Debug)]
pub struct NativeKey {
    hkey: HKEY,
    view_flag: u32,
    name: String,
}

impl RegistryHandle for NativeKey {
    fn values(&self) -> Result<Vec<RawValue>> {
        let mut values = Vec::new();
        let mut name_buf = vec![0u16; MAX_VALUE_NAME];
        let mut data_buf = vec![0u8; INITIAL_DATA_SIZE];
        let mut index = 0;

        loop {
            let mut name_len = name_buf.len() as u32;
            let mut data_len = data_buf.len() as u32;
            let mut type_code = 0u32;
            // SAFETY: buffer lengths are passed alongside their pointers and
            // both buffers live across the call.
            let status = unsafe {
                RegEnumValueW(
                    self.hkey,
                    index,
                    name_buf.as_mut_ptr(),
                    &mut name_len,
                    null(),
                    &mut type_code,
                    data_buf.as_mut_ptr(),
                    &mut data_len,
                )
            };
            match status {
                ERROR_NO_MORE_ITEMS => break,
                ERROR_MORE_DATA => {
                    data_buf.resize(data_len as usize, 0);
                    continue;
                }
                status => check("RegEnumValueW", status, &self.name)?,
            }

            values.push(RawValue {
                name: String::from_utf16_lossy(&name_buf[..name_len as usize]),
                type_code,
                data: data_buf[..data_len as usize].to_vec(),
            });
            index += 1;
        }

        Ok(values)
    }

    fn subkey_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut index = 0;
        while let Some(name) = self.subkey_at(index)? {
            names.push(name);
            index += 1;
        }
        Ok(names)
    }

    fn has_subkeys(&self) -> Result<bool> {
        Ok(self.subkey_at(0)?.is_some())
    }

    fn write_value(&self, name: &str, type_code: u32, data: &[u8]) -> Result<()> {
        let wide = to_wide(name);
        // SAFETY: `wide` is null-terminated and `data` is valid for `data.len()` bytes.
        let status = unsafe {
            RegSetValueExW(
                self.hkey,
                wide.as_ptr(),
                0,
                type_code,
                data.as_ptr(),
                data.len() as u32,
            )
        };
        check("RegSetValueExW", status, name)
    }

    fn delete_value(&self, name: &str) -> Result<()> {
        let wide = to_wide(name);
        // SAFETY: `wide` is null-terminated.
        let status = unsafe { RegDeleteValueW(self.hkey, wide.as_ptr()) };
        check("RegDeleteValueW", status, name)
    }

    fn create_subkey(&self, name: &str) -> Result<()> {
        let wide = to_wide(name);
        let mut created: HKEY = null_mut();
        // SAFETY: `wide` is null-terminated, `created` is a valid out pointer,
        // and the returned handle is closed below.
        let status = unsafe {
            RegCreateKeyExW(
                self.hkey,
                wide.as_ptr(),
                0,
                null(),
                REG_OPTION_NON_VOLATILE,
                KEY_READ | self.view_flag,
                null(),
                &mut created,
                null_mut(),
            )
        };
        check("RegCreateKeyExW", status, name)?;
        // SAFETY: `created` was opened by the successful call above.
        unsafe { RegCloseKey(created) };
        Ok(())
    }

    fn delete_subkey(&self, name: &str, recursive: bool) -> Result<()> {
        let wide = to_wide(name);
        if recursive {
            // SAFETY: `wide` is null-terminated.
            let status = unsafe { RegDeleteTreeW(self.hkey, wide.as_ptr()) };
            check("RegDeleteTreeW", status, name)?;
        }
        // A tree delete may already have removed the key itself.
        // SAFETY: `wide` is null-terminated.
        let status = unsafe { RegDeleteKeyExW(self.hkey, wide.as_ptr(), self.view_flag, 0) };
        match check("RegDeleteKeyExW", status, name) {
            Err(err) if recursive && err.is_not_found() => Ok(()),
            result => result,
        }
    }
}

impl NativeKey {
    fn subkey_at(&self, index: u32) -> Result<Option<String>> {
        let mut name_buf = [0u16; MAX_KEY_NAME];
        let mut name_len = name_buf.len() as u32;
        // SAFETY: `name_buf` is valid for `name_len` UTF-16 units.
        let status = unsafe {
            RegEnumKeyExW(
                self.hkey,
                index,
                name_buf.as_mut_ptr(),
                &mut name_len,
                null(),
                null_mut(),
                null_mut(),
                null_mut(),
            )
        };
        if status == ERROR_NO_MORE_ITEMS {
            return Ok(None);
        }
        check("RegEnumKeyExW", status, &self.name)?;
        Ok(Some(String::from_utf16_lossy(&name_buf[..name_len as usize])))
    }
}

impl Drop for NativeKey {
    fn drop(&mut self) {
        // SAFETY: `hkey` was opened by RegOpenKeyExW and is closed exactly once.
        unsafe { RegCloseKey(self.hkey) };
    }
}
