//! Unit and property tests for path parsing, type mapping and payload round trips.

use proptest::prelude::*;
use reg_converge::{
    EngineConfig, Hive, HostArchitecture, MemoryTransport, Outcome, Registry, RegistryError,
    RegistryPath, Value, ValueData, ValueType,
};

#[test]
fn test_native_type_codes() {
    assert_eq!(ValueType::String.native_code(), 1);
    assert_eq!(ValueType::ExpandString.native_code(), 2);
    assert_eq!(ValueType::Binary.native_code(), 3);
    assert_eq!(ValueType::Dword.native_code(), 4);
    assert_eq!(ValueType::DwordBigEndian.native_code(), 5);
    assert_eq!(ValueType::MultiString.native_code(), 7);
    assert_eq!(ValueType::Qword.native_code(), 11);
}

#[test]
fn test_type_mapping_is_injective() {
    let mut codes: Vec<u32> = ValueType::ALL.iter().map(|t| t.native_code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), ValueType::ALL.len());
}

#[test]
fn test_value_type_tags() {
    for value_type in ValueType::ALL {
        assert_eq!(value_type.as_str().parse::<ValueType>().unwrap(), value_type);
    }
}

#[test]
fn test_hive_table() {
    assert_eq!(Hive::from_shorthand("HKLM"), Some(Hive::LocalMachine));
    assert_eq!(Hive::from_shorthand("HKU"), Some(Hive::Users));
    assert_eq!(Hive::from_shorthand("HKCU"), Some(Hive::CurrentUser));
    assert_eq!(Hive::from_shorthand("HKCR"), Some(Hive::ClassesRoot));
    assert_eq!(Hive::from_shorthand("HKCC"), Some(Hive::CurrentConfig));
    assert_eq!(Hive::from_shorthand("HKEY_LOCAL_MACHINE"), None);
    assert_eq!(Hive::CurrentUser.to_string(), "HKEY_CURRENT_USER");
}

fn value_data() -> impl Strategy<Value = ValueData> {
    let text = "[a-zA-Z0-9 %\\\\._\\x00-]{0,24}";
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..64).prop_map(ValueData::Binary),
        text.prop_map(ValueData::String),
        text.prop_map(ValueData::ExpandString),
        prop::collection::vec("[a-zA-Z0-9 \\x00]{0,12}", 0..6).prop_map(ValueData::MultiString),
        any::<u32>().prop_map(ValueData::Dword),
        any::<u32>().prop_map(ValueData::DwordBigEndian),
        any::<u64>().prop_map(ValueData::Qword),
    ]
}

proptest! {
    #[test]
    fn prop_native_code_round_trip(index in 0usize..7) {
        let value_type = ValueType::ALL[index];
        prop_assert_eq!(ValueType::from_native(value_type.native_code()), Some(value_type));
    }

    #[test]
    fn prop_valid_payload_decodes_to_itself(data in value_data()) {
        let bytes = data.to_bytes();
        let decoded = ValueData::parse(&bytes, data.value_type(), "v").unwrap();
        match data.validate("v") {
            Ok(()) => prop_assert_eq!(decoded, data),
            Err(err) => {
                prop_assert!(matches!(err, RegistryError::InvalidFormat(_)), "unexpected {:?}", err);
            }
        }
    }

    #[test]
    fn prop_valid_payload_converges_once(data in value_data()) {
        prop_assume!(data.validate("Setting").is_ok());
        let registry = Registry::new(
            MemoryTransport::new(HostArchitecture::X64),
            EngineConfig::new(HostArchitecture::X64),
        )
        .unwrap();
        let value = Value::new("Setting", data);
        let path = "HKLM\\Software\\Vendor";

        prop_assert_eq!(registry.converge_value(path, &value, true).unwrap(), Outcome::Changed);
        prop_assert_eq!(registry.converge_value(path, &value, true).unwrap(), Outcome::Unchanged);
        prop_assert_eq!(registry.get_value(path, "Setting").unwrap(), value);
    }

    #[test]
    fn prop_path_display_round_trip(
        hive_index in 0usize..5,
        segments in prop::collection::vec("[A-Za-z0-9 _.-]{1,16}", 0..6),
    ) {
        let hive = Hive::ALL[hive_index];
        let text = std::iter::once(hive.shorthand().to_string())
            .chain(segments.iter().cloned())
            .collect::<Vec<_>>()
            .join("\\");

        let path = RegistryPath::parse(&text).unwrap();
        prop_assert_eq!(path.hive(), hive);
        prop_assert_eq!(path.key(), segments.join("\\"));
        prop_assert_eq!(path.to_string(), text);
        prop_assert_eq!(path.ancestors().len(), segments.len().saturating_sub(1));
    }

    #[test]
    fn prop_unknown_hive_rejected(shorthand in "[A-Z]{2,6}") {
        prop_assume!(Hive::from_shorthand(&shorthand).is_none());
        let result = RegistryPath::parse(&format!("{}\\Software", shorthand));
        prop_assert!(matches!(result, Err(RegistryError::HiveMissing { .. })), "expected HiveMissing");
    }
}
