//! Registry value types, typed payloads and their native encodings.
//!
//! [`ValueType`] is the closed set of symbolic types the engine can write.
//! Each maps to exactly one native `REG_*` code. [`ValueData`] carries a
//! payload whose variant fixes its type, and converts to and from the raw
//! bytes a registry transport stores.

use crate::error::{RegistryError, Result};
use crate::utils::{read_utf16_string, write_utf16_string};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fmt;
use std::str::FromStr;

/// Native code for `REG_NONE`.
pub const REG_NONE: u32 = 0;
/// Native code for `REG_SZ`.
pub const REG_SZ: u32 = 1;
/// Native code for `REG_EXPAND_SZ`.
pub const REG_EXPAND_SZ: u32 = 2;
/// Native code for `REG_BINARY`.
pub const REG_BINARY: u32 = 3;
/// Native code for `REG_DWORD`.
pub const REG_DWORD: u32 = 4;
/// Native code for `REG_DWORD_BIG_ENDIAN`.
pub const REG_DWORD_BIG_ENDIAN: u32 = 5;
/// Native code for `REG_MULTI_SZ`.
pub const REG_MULTI_SZ: u32 = 7;
/// Native code for `REG_QWORD`.
pub const REG_QWORD: u32 = 11;

/// Symbolic registry value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueType {
    /// Binary data.
    Binary,

    /// String (null-terminated).
    String,

    /// Multiple strings.
    MultiString,

    /// String with environment variables.
    ExpandString,

    /// 32-bit little-endian integer.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// 64-bit little-endian integer.
    Qword,
}

impl ValueType {
    /// All value types.
    pub const ALL: [ValueType; 7] = [
        ValueType::Binary,
        ValueType::String,
        ValueType::MultiString,
        ValueType::ExpandString,
        ValueType::Dword,
        ValueType::DwordBigEndian,
        ValueType::Qword,
    ];

    /// Returns the native registry type code.
    pub fn native_code(&self) -> u32 {
        match self {
            ValueType::Binary => REG_BINARY,
            ValueType::String => REG_SZ,
            ValueType::MultiString => REG_MULTI_SZ,
            ValueType::ExpandString => REG_EXPAND_SZ,
            ValueType::Dword => REG_DWORD,
            ValueType::DwordBigEndian => REG_DWORD_BIG_ENDIAN,
            ValueType::Qword => REG_QWORD,
        }
    }

    /// Maps a native type code back to its symbolic type.
    ///
    /// Returns `None` for native types outside the supported set
    /// (`REG_NONE`, `REG_LINK`, resource lists, ...).
    pub fn from_native(code: u32) -> Option<Self> {
        match code {
            REG_BINARY => Some(ValueType::Binary),
            REG_SZ => Some(ValueType::String),
            REG_MULTI_SZ => Some(ValueType::MultiString),
            REG_EXPAND_SZ => Some(ValueType::ExpandString),
            REG_DWORD => Some(ValueType::Dword),
            REG_DWORD_BIG_ENDIAN => Some(ValueType::DwordBigEndian),
            REG_QWORD => Some(ValueType::Qword),
            _ => None,
        }
    }

    /// Returns the symbolic tag (`"multi_string"`, `"dword"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Binary => "binary",
            ValueType::String => "string",
            ValueType::MultiString => "multi_string",
            ValueType::ExpandString => "expand_string",
            ValueType::Dword => "dword",
            ValueType::DwordBigEndian => "dword_big_endian",
            ValueType::Qword => "qword",
        }
    }

    /// Returns the native name of this value type.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Binary => "REG_BINARY",
            ValueType::String => "REG_SZ",
            ValueType::MultiString => "REG_MULTI_SZ",
            ValueType::ExpandString => "REG_EXPAND_SZ",
            ValueType::Dword => "REG_DWORD",
            ValueType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN",
            ValueType::Qword => "REG_QWORD",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        ValueType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownValueType(s.to_string()))
    }
}

/// Typed registry value payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "data", rename_all = "snake_case")
)]
pub enum ValueData {
    /// Binary data.
    Binary(Vec<u8>),

    /// String value.
    String(String),

    /// Multiple strings.
    MultiString(Vec<String>),

    /// Expandable string value.
    ExpandString(String),

    /// 32-bit integer.
    Dword(u32),

    /// 32-bit big-endian integer.
    DwordBigEndian(u32),

    /// 64-bit integer.
    Qword(u64),
}

impl ValueData {
    /// Returns the type of this payload.
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueData::Binary(_) => ValueType::Binary,
            ValueData::String(_) => ValueType::String,
            ValueData::MultiString(_) => ValueType::MultiString,
            ValueData::ExpandString(_) => ValueType::ExpandString,
            ValueData::Dword(_) => ValueType::Dword,
            ValueData::DwordBigEndian(_) => ValueType::DwordBigEndian,
            ValueData::Qword(_) => ValueType::Qword,
        }
    }

    /// Parses raw registry bytes as a payload of the given type.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw value bytes as stored by the registry.
    /// * `value_type` - Type of the value.
    /// * `name` - Value name, for error reporting.
    pub fn parse(data: &[u8], value_type: ValueType, name: &str) -> Result<Self> {
        match value_type {
            ValueType::Binary => Ok(ValueData::Binary(data.to_vec())),

            ValueType::String => Ok(ValueData::String(read_utf16_string(data, name)?)),

            ValueType::ExpandString => Ok(ValueData::ExpandString(read_utf16_string(data, name)?)),

            ValueType::MultiString => {
                let full_string = read_utf16_string(data, name)?;
                let strings = full_string
                    .split('\0')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(ValueData::MultiString(strings))
            }

            ValueType::Dword => {
                require_len(data, 4, name)?;
                Ok(ValueData::Dword(LittleEndian::read_u32(data)))
            }

            ValueType::DwordBigEndian => {
                require_len(data, 4, name)?;
                Ok(ValueData::DwordBigEndian(BigEndian::read_u32(data)))
            }

            ValueType::Qword => {
                require_len(data, 8, name)?;
                Ok(ValueData::Qword(LittleEndian::read_u64(data)))
            }
        }
    }

    /// Checks that the payload survives an encode/decode round trip.
    ///
    /// Strings are NUL-terminated on the wire and a multi-string ends at its
    /// first empty element, so an embedded NUL or an empty multi-string
    /// element would be read back as different data.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidFormat`] naming the offending value.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) if s.contains('\0') => Err(
                RegistryError::InvalidFormat(format!("value '{}' contains a NUL character", name)),
            ),
            ValueData::MultiString(strings) => {
                for (index, s) in strings.iter().enumerate() {
                    if s.is_empty() {
                        return Err(RegistryError::InvalidFormat(format!(
                            "value '{}' has an empty string at index {}",
                            name, index
                        )));
                    }
                    if s.contains('\0') {
                        return Err(RegistryError::InvalidFormat(format!(
                            "value '{}' has a NUL character at index {}",
                            name, index
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Encodes the payload into the bytes the registry stores.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ValueData::Binary(bytes) => bytes.clone(),
            ValueData::String(s) | ValueData::ExpandString(s) => {
                let mut out = Vec::with_capacity((s.len() + 1) * 2);
                write_utf16_string(s, &mut out);
                out
            }
            ValueData::MultiString(strings) => {
                let mut out = Vec::new();
                for s in strings {
                    write_utf16_string(s, &mut out);
                }
                out.extend_from_slice(&[0, 0]);
                out
            }
            ValueData::Dword(d) => {
                let mut out = vec![0; 4];
                LittleEndian::write_u32(&mut out, *d);
                out
            }
            ValueData::DwordBigEndian(d) => {
                let mut out = vec![0; 4];
                BigEndian::write_u32(&mut out, *d);
                out
            }
            ValueData::Qword(q) => {
                let mut out = vec![0; 8];
                LittleEndian::write_u64(&mut out, *q);
                out
            }
        }
    }
}

fn require_len(data: &[u8], expected: usize, name: &str) -> Result<()> {
    if data.len() < expected {
        return Err(RegistryError::TruncatedData {
            name: name.to_string(),
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => f.write_str(s),
            ValueData::Binary(b) => f.write_str(&hex::encode(b)),
            ValueData::Dword(d) | ValueData::DwordBigEndian(d) => write!(f, "{} (0x{:08X})", d, d),
            ValueData::Qword(q) => write!(f, "{} (0x{:016X})", q, q),
            ValueData::MultiString(strings) => f.write_str(&strings.join(", ")),
        }
    }
}

/// A named registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Value {
    /// Value name (empty for the key's default value).
    pub name: String,

    /// Typed payload.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub data: ValueData,
}

impl Value {
    /// Creates a value.
    pub fn new(name: impl Into<String>, data: ValueData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Returns the symbolic type of the value.
    pub fn value_type(&self) -> ValueType {
        self.data.value_type()
    }

    /// Returns true if `other` names this value (registry names ignore ASCII case).
    pub fn is_named(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }
}

/// A value exactly as enumerated from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// Value name.
    pub name: String,

    /// Native type code.
    pub type_code: u32,

    /// Raw data bytes.
    pub data: Vec<u8>,
}

impl RawValue {
    /// Returns the symbolic type, if the native type is supported.
    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::from_native(self.type_code)
    }

    /// Decodes into a typed [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidValueType`] for unsupported native
    /// types, or a decoding error for malformed data.
    pub fn decode(&self) -> Result<Value> {
        let value_type = self
            .value_type()
            .ok_or(RegistryError::InvalidValueType(self.type_code))?;
        Ok(Value {
            name: self.name.clone(),
            data: ValueData::parse(&self.data, value_type, &self.name)?,
        })
    }
}
