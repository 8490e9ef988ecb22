use bitvec::prelude::{BitVec, Lsb0, Msb0};
use parity_scale_codec::{Compact, Decode, Encode};
use primitive_types::H256;
use scale_info::{meta_type, MetaType, PortableRegistry, Registry, TypeInfo};
use serde_json::{json, Value};
use std::{
    boxed::Box,
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use crate::error::{CodecError, MalformedRegistry, MetadataError, RegistryError};
use crate::metadata::{
    MessageKind, ProgramMetadata, ProgramMetadataRepr, StateMetadata, StateMetadataRepr, TypesRepr,
};
use crate::payload::{
    decode_payload, decode_state, decode_state_function_output, encode_payload,
    encode_payload_with_settings, encode_state_argument, Payload, RegistrySource, TypeSelector,
};
use crate::registry::{Primitive, TypeDescriptor, TypeRef, TypeRegistry};
use crate::settings::CodecSettings;
use crate::{decode_all_as_type, decode_as_type_at_position, encode_with_type};

#[derive(Encode, TypeInfo)]
struct Transfer {
    to: [u8; 32],
    amount: u128,
    memo: String,
    flag: bool,
}

#[derive(Encode, TypeInfo)]
struct Point {
    x: u32,
    y: u32,
}

#[derive(Encode, TypeInfo)]
enum Action {
    Stop,
    Move { x: i32, y: i32 },
    Say(String),
    Pair(u8, u16),
}

#[derive(Encode, TypeInfo)]
enum Event {
    Stopped,
    Moved(i32, i32),
}

#[derive(Encode, TypeInfo)]
struct InitConfig {
    owner: [u8; 32],
    limit: u32,
}

#[derive(Encode, TypeInfo)]
struct State {
    position: (i32, i32),
    log: Vec<String>,
}

#[derive(Encode, TypeInfo)]
enum Maybe {
    None,
    Some(u8),
}

#[derive(Encode, TypeInfo)]
enum List {
    Nil,
    Cons(u8, Box<List>),
}

#[derive(TypeInfo)]
struct Looping(Box<Looping>);

#[derive(Encode, TypeInfo)]
struct Foo(u8);

#[derive(Encode, TypeInfo)]
struct Bar(u32);

#[derive(Encode, TypeInfo)]
struct Wrapper<T> {
    inner: T,
}

#[derive(Encode, TypeInfo)]
struct Balance {
    #[codec(compact)]
    free: u128,
    reserved: u64,
}

#[derive(Encode, TypeInfo)]
struct Flags {
    lsb: BitVec<u8, Lsb0>,
    msb: BitVec<u16, Msb0>,
}

#[derive(TypeInfo)]
struct Holder {
    value: u64,
}

mod first {
    use scale_info::TypeInfo;

    #[derive(TypeInfo)]
    pub struct Same(pub u8);
}

mod second {
    use scale_info::TypeInfo;

    #[derive(TypeInfo)]
    pub struct Same(pub u16);
}

/// Encoded registry with given types, and the type ids.
fn registry_of(types: Vec<MetaType>) -> (Vec<u8>, Vec<u32>) {
    let mut registry = Registry::new();
    let ids = types.iter().map(|ty| registry.register_type(ty).id).collect();
    let portable: PortableRegistry = registry.into();
    (portable.encode(), ids)
}

fn parsed_registry_of(types: Vec<MetaType>) -> (TypeRegistry, Vec<u32>) {
    let (encoded, ids) = registry_of(types);
    (TypeRegistry::parse(&encoded).unwrap(), ids)
}

fn encode_value(value: &Value, registry: &TypeRegistry, index: u32) -> Vec<u8> {
    encode_payload(
        Payload::Value(value),
        RegistrySource::Registry(registry),
        None,
        &TypeSelector::by_index(index),
    )
    .unwrap()
    .into_bytes()
}

fn decode_value(data: &[u8], registry: &TypeRegistry, index: u32) -> Value {
    decode_payload(
        data,
        RegistrySource::Registry(registry),
        None,
        &TypeSelector::by_index(index),
    )
    .unwrap()
}

fn ids_hex(byte: &str) -> String {
    format!("0x{}", byte.repeat(32))
}

#[test]
fn struct_with_primitives() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Transfer>()]);
    let value = json!({
        "to": ids_hex("11"),
        "amount": 1000,
        "memo": "hi",
        "flag": true,
    });
    let expected = Transfer {
        to: [0x11; 32],
        amount: 1000,
        memo: "hi".to_string(),
        flag: true,
    }
    .encode();
    let encoded = encode_value(&value, &registry, ids[0]);
    assert!(
        encoded == expected,
        "Expected: {:?}\nReceived: {:?}",
        expected,
        encoded
    );
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);
}

#[test]
fn enum_variants() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Action>()]);
    let cases = [
        (json!("Stop"), Action::Stop.encode()),
        (
            json!({"Move": {"x": -1, "y": 2}}),
            Action::Move { x: -1, y: 2 }.encode(),
        ),
        (
            json!({"Say": "hello"}),
            Action::Say("hello".to_string()).encode(),
        ),
        (json!({"Pair": [1, 2]}), Action::Pair(1, 2).encode()),
    ];
    for (value, expected) in cases.iter() {
        let encoded = encode_value(value, &registry, ids[0]);
        assert_eq!(&encoded, expected);
        assert_eq!(&decode_value(&encoded, &registry, ids[0]), value);
    }
}

#[test]
fn unit_variant_as_object() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Action>()]);
    let encoded = encode_value(&json!({"Stop": null}), &registry, ids[0]);
    assert_eq!(encoded, vec![0]);
}

#[test]
fn unknown_variant() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Action>()]);
    let error = encode_payload(
        Payload::Value(&json!("Jump")),
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_index(ids[0]),
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::TypeMismatch { found: "unknown variant", .. }));
}

#[test]
fn option_and_look_alike_enum() {
    let (registry, ids) =
        parsed_registry_of(vec![meta_type::<Option<u8>>(), meta_type::<Maybe>()]);
    assert!(matches!(
        registry.resolve_by_index(ids[0]).unwrap(),
        TypeDescriptor::Option(TypeRef::Index(_))
    ));
    assert_eq!(encode_value(&json!(7), &registry, ids[0]), Some(7u8).encode());
    assert_eq!(encode_value(&json!(null), &registry, ids[0]), vec![0]);
    assert_eq!(decode_value(&[1, 7], &registry, ids[0]), json!(7));
    assert_eq!(decode_value(&[0], &registry, ids[0]), json!(null));

    assert_eq!(
        encode_value(&json!({"Some": 7}), &registry, ids[1]),
        Maybe::Some(7).encode()
    );
    assert_eq!(encode_value(&json!("None"), &registry, ids[1]), Maybe::None.encode());
    assert_eq!(decode_value(&[1, 7], &registry, ids[1]), json!({"Some": 7}));
    assert_eq!(decode_value(&[0], &registry, ids[1]), json!("None"));
}

#[test]
fn compact_boundaries() {
    let selector = TypeSelector::by_name("Compact<u32>");
    for number in [0u32, 63, 64, 16383, 16384, 1073741823, 1073741824, u32::MAX] {
        let encoded = encode_payload(
            Payload::Value(&json!(number)),
            RegistrySource::None,
            None,
            &selector,
        )
        .unwrap();
        let expected = Compact(number).encode();
        assert!(
            encoded.as_bytes() == expected.as_slice(),
            "Expected: {:?}\nReceived: {:?}",
            expected,
            encoded
        );
        let decoded =
            decode_payload(encoded.as_bytes(), RegistrySource::None, None, &selector).unwrap();
        assert_eq!(decoded, json!(number));
    }
    assert_eq!(Compact(63u32).encode(), vec![252]);
    assert_eq!(Compact(64u32).encode(), vec![1, 1]);
}

#[test]
fn compact_u128_as_string() {
    let selector = TypeSelector::by_name("Compact<u128>");
    let max = u128::MAX.to_string();
    let encoded = encode_payload(
        Payload::Value(&json!(max)),
        RegistrySource::None,
        None,
        &selector,
    )
    .unwrap();
    assert_eq!(encoded.as_bytes(), Compact(u128::MAX).encode().as_slice());
    let decoded = decode_payload(encoded.as_bytes(), RegistrySource::None, None, &selector).unwrap();
    assert_eq!(decoded, json!(max));
}

#[test]
fn non_canonical_compact() {
    let error = decode_payload(
        &[1, 0],
        RegistrySource::None,
        None,
        &TypeSelector::by_name("Compact<u32>"),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::NoCompact {
            path: String::from("$"),
            position: 0
        }
    );
}

#[test]
fn compact_field_in_struct() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Balance>()]);
    let value = json!({"free": 100, "reserved": 5});
    let encoded = encode_value(&value, &registry, ids[0]);
    assert_eq!(encoded, Balance { free: 100, reserved: 5 }.encode());
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);
}

#[test]
fn hex_pass_through() {
    let encoded = encode_payload(
        Payload::Hex("0x0102ff"),
        RegistrySource::None,
        None,
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(encoded.to_hex(), "0x0102ff");

    // true even if the type would encode the string differently
    let again = encode_payload(
        Payload::Value(&json!(encoded.to_hex())),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("String"),
    )
    .unwrap();
    assert_eq!(again, encoded);
}

#[test]
fn invalid_hex_rejected() {
    for hex_input in ["0x123", "0xzz", "0102"] {
        let error = encode_payload(
            Payload::Hex(hex_input),
            RegistrySource::None,
            None,
            &TypeSelector::new(),
        )
        .unwrap_err();
        assert!(matches!(error, CodecError::InvalidHex { .. }), "{hex_input}");
    }
}

#[test]
fn bytes_and_absent_pass_through() {
    let encoded = encode_payload(
        Payload::Bytes(&[4, 5, 6]),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u8"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), vec![4, 5, 6]);

    let encoded = encode_payload(
        Payload::Absent,
        RegistrySource::None,
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    assert!(encoded.as_bytes().is_empty());
    assert_eq!(encoded.to_hex(), "0x");
}

#[test]
fn untyped_value_goes_as_bytes() {
    let encoded = encode_payload(
        Payload::Value(&json!("hello")),
        RegistrySource::None,
        None,
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), b"hello".to_vec().encode());

    let encoded = encode_payload(
        Payload::Value(&json!([1, 2, 3])),
        RegistrySource::None,
        None,
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), vec![12, 1, 2, 3]);
}

#[test]
fn builtin_u32_without_registry() {
    let encoded = encode_payload(
        Payload::Value(&json!(42)),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u32"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), vec![42, 0, 0, 0]);

    let decoded = decode_payload(
        &[42, 0, 0, 0],
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u32"),
    )
    .unwrap();
    assert_eq!(decoded, json!(42));
}

#[test]
fn builtin_ids_and_strings() {
    let id = ids_hex("ab");
    let decoded = decode_payload(
        &[0xab; 32],
        RegistrySource::None,
        None,
        &TypeSelector::by_name("ActorId"),
    )
    .unwrap();
    assert_eq!(decoded, json!(id));

    let encoded = encode_payload(
        Payload::Value(&json!("gear")),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("String"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), "gear".to_string().encode());
}

#[test]
fn index_has_priority_over_name() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Foo>(), meta_type::<Bar>()]);
    assert_eq!(registry.resolve_by_name("Foo"), Some(ids[0]));
    assert_eq!(registry.resolve_by_name("Bar"), Some(ids[1]));
    let selector = TypeSelector::by_name("Foo").with_index(ids[1]);
    let encoded = encode_payload(
        Payload::Value(&json!(1)),
        RegistrySource::Registry(&registry),
        None,
        &selector,
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), Bar(1).encode());

    let encoded = encode_payload(
        Payload::Value(&json!(1)),
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_name("Foo"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), Foo(1).encode());
}

#[test]
fn raw_registry_source() {
    let (encoded_registry, ids) = registry_of(vec![meta_type::<Point>()]);
    let hex_registry = format!("0x{}", hex::encode(&encoded_registry));
    let encoded = encode_payload(
        Payload::Value(&json!({"x": 1, "y": 2})),
        RegistrySource::RawRegistry(&hex_registry),
        None,
        &TypeSelector::by_index(ids[0]),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), Point { x: 1, y: 2 }.encode());
    assert_eq!(
        TypeRegistry::from_hex(&hex_registry).unwrap(),
        TypeRegistry::parse(&encoded_registry).unwrap()
    );
}

#[test]
fn unknown_index_and_unresolved_name() {
    let (registry, _) = parsed_registry_of(vec![meta_type::<Point>()]);
    let error = encode_payload(
        Payload::Value(&json!(1)),
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_index(999),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::Registry(RegistryError::UnknownTypeIndex {
            index: 999,
            len: registry.len()
        })
    );

    let error = encode_payload(
        Payload::Value(&json!(1)),
        RegistrySource::None,
        None,
        &TypeSelector::by_index(0),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::Registry(RegistryError::UnknownTypeIndex { index: 0, len: 0 })
    );

    let error = encode_payload(
        Payload::Value(&json!(1)),
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_name("NoSuchType"),
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
}

#[test]
fn decode_does_not_fall_back() {
    let error = decode_payload(&[1, 2], RegistrySource::None, None, &TypeSelector::new()).unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
    let error = decode_state(&[1, 2], RegistrySource::None, &TypeSelector::new()).unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
}

#[test]
fn truncated_and_trailing() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Point>()]);
    let error = decode_payload(
        &[1, 0, 0, 0, 2],
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_index(ids[0]),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::Truncated {
            path: String::from("$.y"),
            position: 4,
            needed: 4,
            available: 1
        }
    );

    let error = decode_payload(
        &[1, 2],
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u8"),
    )
    .unwrap_err();
    assert_eq!(error, CodecError::TrailingBytes { from: 1, total: 2 });
}

#[test]
fn decode_at_position_leaves_the_rest() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Point>()]);
    let mut data = Point { x: 3, y: 4 }.encode();
    data.extend_from_slice(&[9, 9]);
    let mut position = 0;
    let value = decode_as_type_at_position(
        &TypeRef::Index(ids[0]),
        &data,
        &mut position,
        &registry,
        &CodecSettings::default(),
    )
    .unwrap();
    assert_eq!(value, json!({"x": 3, "y": 4}));
    assert_eq!(position, 8);
    let error = decode_all_as_type(
        &TypeRef::Index(ids[0]),
        &data,
        &registry,
        &CodecSettings::default(),
    )
    .unwrap_err();
    assert_eq!(error, CodecError::TrailingBytes { from: 8, total: 10 });
}

#[test]
fn invalid_tags() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Option<u8>>(), meta_type::<Action>()]);
    let error = decode_payload(
        &[2],
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_index(ids[0]),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::UnexpectedOptionTag {
            path: String::from("$"),
            position: 0,
            tag: 2
        }
    );
    let error = decode_payload(
        &[9],
        RegistrySource::Registry(&registry),
        None,
        &TypeSelector::by_index(ids[1]),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::UnexpectedEnumVariant {
            path: String::from("$"),
            position: 0,
            index: 9
        }
    );
    let error = decode_payload(
        &[2],
        RegistrySource::None,
        None,
        &TypeSelector::by_name("bool"),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::InvalidBool {
            path: String::from("$"),
            position: 0,
            byte: 2
        }
    );
}

#[test]
fn value_shape_mismatch() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Point>()]);
    let source = RegistrySource::Registry(&registry);
    let selector = TypeSelector::by_index(ids[0]);

    let error = encode_payload(Payload::Value(&json!([1, 2])), source, None, &selector).unwrap_err();
    assert_eq!(
        error,
        CodecError::TypeMismatch {
            path: String::from("$"),
            expected: String::from("object"),
            found: "array"
        }
    );

    let error = encode_payload(Payload::Value(&json!({"x": 1})), source, None, &selector).unwrap_err();
    assert_eq!(
        error,
        CodecError::TypeMismatch {
            path: String::from("$.y"),
            expected: String::from("value of type u32"),
            found: "nothing"
        }
    );

    let error = encode_payload(
        Payload::Value(&json!({"x": 1, "y": 2, "z": 3})),
        source,
        None,
        &selector,
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::TypeMismatch { ref path, .. } if path == "$.z"));

    let relaxed = CodecSettings {
        reject_unknown_fields: false,
        ..CodecSettings::default()
    };
    let encoded = encode_payload_with_settings(
        Payload::Value(&json!({"x": 1, "y": 2, "z": 3})),
        source,
        None,
        &selector,
        &relaxed,
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), Point { x: 1, y: 2 }.encode());
}

#[test]
fn numbers_out_of_range() {
    let error = encode_payload(
        Payload::Value(&json!(300)),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u8"),
    )
    .unwrap_err();
    assert_eq!(
        error,
        CodecError::NumberOutOfRange {
            path: String::from("$"),
            ty: "u8",
            value: String::from("300")
        }
    );
    let error = encode_payload(
        Payload::Value(&json!(-1)),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u64"),
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::NumberOutOfRange { ty: "u64", .. }));
    let error = encode_payload(
        Payload::Value(&json!(1.5)),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u64"),
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::TypeMismatch { .. }));
}

#[test]
fn numbers_from_strings() {
    let encoded = encode_payload(
        Payload::Value(&json!("1000")),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u128"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), 1000u128.encode());

    let encoded = encode_payload(
        Payload::Value(&json!("-170141183460469231731687303715884105728")),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("i128"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), i128::MIN.encode());

    let decoded = decode_payload(
        &u128::MAX.encode(),
        RegistrySource::None,
        None,
        &TypeSelector::by_name("u128"),
    )
    .unwrap();
    assert_eq!(decoded, json!(u128::MAX.to_string()));
}

#[test]
fn wide_integers() {
    let settings = CodecSettings::default();
    let u256 = TypeRef::BuiltIn(Primitive::U256);
    let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    let encoded = encode_with_type(&json!(max), &u256, &(), &settings).unwrap();
    assert_eq!(encoded, vec![0xff; 32]);
    assert_eq!(decode_all_as_type(&u256, &encoded, &(), &settings).unwrap(), json!(max));

    let encoded = encode_with_type(&json!("0x0100"), &u256, &(), &settings).unwrap();
    let mut expected = vec![0; 32];
    expected[0] = 0;
    expected[1] = 1;
    assert_eq!(encoded, expected);
    assert_eq!(decode_all_as_type(&u256, &encoded, &(), &settings).unwrap(), json!(256));

    let i256 = TypeRef::BuiltIn(Primitive::I256);
    let encoded = encode_with_type(&json!(-1), &i256, &(), &settings).unwrap();
    assert_eq!(encoded, vec![0xff; 32]);
    assert_eq!(decode_all_as_type(&i256, &encoded, &(), &settings).unwrap(), json!(-1));

    let too_big = format!("{max}0");
    let error = encode_with_type(&json!(too_big), &u256, &(), &settings).unwrap_err();
    assert!(matches!(error, CodecError::NumberOutOfRange { ty: "u256", .. }));
}

#[test]
fn char_values() {
    let settings = CodecSettings::default();
    let char_ty = TypeRef::BuiltIn(Primitive::Char);
    let encoded = encode_with_type(&json!("é"), &char_ty, &(), &settings).unwrap();
    assert_eq!(encoded, ('é' as u32).encode());
    assert_eq!(decode_all_as_type(&char_ty, &encoded, &(), &settings).unwrap(), json!("é"));

    let error = decode_all_as_type(&char_ty, &0xd800u32.encode(), &(), &settings).unwrap_err();
    assert!(matches!(error, CodecError::InvalidChar { position: 0, .. }));
}

#[test]
fn sequences_tuples_and_arrays() {
    let (registry, ids) = parsed_registry_of(vec![
        meta_type::<Vec<u16>>(),
        meta_type::<Vec<u8>>(),
        meta_type::<(u8, String)>(),
        meta_type::<[u16; 2]>(),
        meta_type::<()>(),
    ]);
    let settings = CodecSettings::default();

    let value = json!([1, 2, 3]);
    let encoded = encode_value(&value, &registry, ids[0]);
    assert_eq!(encoded, vec![1u16, 2, 3].encode());
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);

    let bytes = TypeRef::Index(ids[1]);
    let encoded = encode_with_type(&json!("hello"), &bytes, &registry, &settings).unwrap();
    assert_eq!(encoded, b"hello".to_vec().encode());
    let encoded = encode_with_type(&json!([1, 2, 3]), &bytes, &registry, &settings).unwrap();
    assert_eq!(encoded, vec![12, 1, 2, 3]);
    let encoded = encode_with_type(&json!("0x0a0b"), &bytes, &registry, &settings).unwrap();
    assert_eq!(encoded, vec![8, 10, 11]);
    assert_eq!(decode_value(&encoded, &registry, ids[1]), json!("0x0a0b"));

    let value = json!([1, "a"]);
    let encoded = encode_value(&value, &registry, ids[2]);
    assert_eq!(encoded, (1u8, "a".to_string()).encode());
    assert_eq!(decode_value(&encoded, &registry, ids[2]), value);

    let value = json!([5, 6]);
    let encoded = encode_value(&value, &registry, ids[3]);
    assert_eq!(encoded, [5u16, 6].encode());
    assert_eq!(decode_value(&encoded, &registry, ids[3]), value);
    let error = encode_with_type(&json!([5]), &TypeRef::Index(ids[3]), &registry, &settings)
        .unwrap_err();
    assert!(matches!(error, CodecError::TypeMismatch { .. }));

    assert!(encode_value(&json!(null), &registry, ids[4]).is_empty());
    assert_eq!(decode_value(&[], &registry, ids[4]), json!(null));
}

#[test]
fn bit_sequences() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Flags>()]);
    let lsb_bits = [true, false, true];
    let msb_bits = [true, true, false, false, true, false, true, false, true, true];
    let flags = Flags {
        lsb: lsb_bits.iter().copied().collect(),
        msb: msb_bits.iter().copied().collect(),
    };
    let value = json!({"lsb": lsb_bits, "msb": msb_bits});
    let encoded = encode_value(&value, &registry, ids[0]);
    assert_eq!(encoded, flags.encode());
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);
}

#[test]
fn recursive_type() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<List>()]);
    let list = List::Cons(1, Box::new(List::Cons(2, Box::new(List::Nil))));
    let value = json!({"Cons": [1, {"Cons": [2, "Nil"]}]});
    let encoded = encode_value(&value, &registry, ids[0]);
    assert_eq!(encoded, list.encode());
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);
    assert_eq!(registry.type_name(ids[0]).unwrap(), "List");
}

#[test]
fn recursion_limit() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<List>()]);
    let shallow = CodecSettings {
        max_nesting: 2,
        ..CodecSettings::default()
    };
    let value = json!({"Cons": [1, {"Cons": [2, "Nil"]}]});
    let error = encode_with_type(&value, &TypeRef::Index(ids[0]), &registry, &shallow).unwrap_err();
    assert!(matches!(error, CodecError::RecursionLimit { limit: 2, .. }));

    // list nodes consume data, so only the overall nesting matters for them
    let no_stall = CodecSettings {
        max_depth: 2,
        ..CodecSettings::default()
    };
    let encoded = encode_with_type(&value, &TypeRef::Index(ids[0]), &registry, &no_stall).unwrap();
    assert_eq!(
        decode_all_as_type(&TypeRef::Index(ids[0]), &encoded, &registry, &no_stall).unwrap(),
        value
    );

    let (registry, ids) = parsed_registry_of(vec![meta_type::<Looping>()]);
    let settings = CodecSettings::default();
    let error = decode_all_as_type(&TypeRef::Index(ids[0]), &[], &registry, &settings).unwrap_err();
    assert!(matches!(
        error,
        CodecError::RecursionLimit {
            limit: CodecSettings::DEFAULT_MAX_DEPTH,
            ..
        }
    ));
    let error =
        encode_with_type(&json!(1), &TypeRef::Index(ids[0]), &registry, &settings).unwrap_err();
    assert!(matches!(error, CodecError::RecursionLimit { .. }));
}

#[test]
fn long_recursive_list() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<List>()]);
    let mut list = List::Nil;
    let mut value = json!("Nil");
    for i in 0..400u32 {
        list = List::Cons((i % 256) as u8, Box::new(list));
        value = json!({ "Cons": [i % 256, value] });
    }
    let expected = list.encode();

    let encoded = encode_value(&value, &registry, ids[0]);
    assert!(
        encoded == expected,
        "Expected: {:?}\nReceived: {:?}",
        expected,
        encoded
    );
    assert_eq!(decode_value(&encoded, &registry, ids[0]), value);

    let settings = CodecSettings {
        max_nesting: 100,
        ..CodecSettings::default()
    };
    let error = decode_all_as_type(&TypeRef::Index(ids[0]), &expected, &registry, &settings)
        .unwrap_err();
    assert!(matches!(error, CodecError::RecursionLimit { limit: 100, .. }));
}

#[test]
fn zero_width_elements() {
    let (registry, ids) = parsed_registry_of(vec![meta_type::<Vec<()>>()]);
    let settings = CodecSettings::default();

    let few = vec![(), (), ()].encode();
    assert_eq!(decode_value(&few, &registry, ids[0]), json!([null, null, null]));
    assert_eq!(encode_value(&json!([null, null, null]), &registry, ids[0]), few);

    let data = Compact(1_000_000u32).encode();
    let error = decode_all_as_type(&TypeRef::Index(ids[0]), &data, &registry, &settings)
        .unwrap_err();
    assert_eq!(
        error,
        CodecError::TooManyElements {
            path: String::from("$"),
            position: 4,
            count: 1_000_000,
            limit: CodecSettings::DEFAULT_MAX_ZERO_WIDTH_ELEMENTS,
        }
    );

    let generous = CodecSettings {
        max_zero_width_elements: 1_000_000,
        ..CodecSettings::default()
    };
    let data = Compact(70_000u32).encode();
    let decoded =
        decode_all_as_type(&TypeRef::Index(ids[0]), &data, &registry, &generous).unwrap();
    assert!(matches!(decoded, Value::Array(ref values) if values.len() == 70_000));
}

#[test]
fn compact_lengths_of_long_sequences() {
    let (registry, ids) = parsed_registry_of(vec![
        meta_type::<Vec<u8>>(),
        meta_type::<Compact<u128>>(),
        meta_type::<Compact<u8>>(),
    ]);
    let bytes = vec![7u8; 70_000];
    let value = json!(format!("0x{}", hex::encode(&bytes)));
    let encoded = encode_with_type(
        &value,
        &TypeRef::Index(ids[0]),
        &registry,
        &CodecSettings::default(),
    )
    .unwrap();
    assert_eq!(encoded, bytes.encode());

    let big = u128::MAX - 1;
    assert_eq!(
        encode_value(&json!(big.to_string()), &registry, ids[1]),
        Compact(big).encode()
    );
    assert_eq!(encode_value(&json!(255), &registry, ids[2]), Compact(255u8).encode());
    assert_eq!(decode_value(&Compact(255u8).encode(), &registry, ids[2]), json!(255));
}

#[test]
fn nullable_option_insides() {
    let (registry, ids) = parsed_registry_of(vec![
        meta_type::<Option<()>>(),
        meta_type::<Option<Option<u8>>>(),
    ]);
    // `Some` of nullable value can not be told apart from `None` in values
    assert_eq!(decode_value(&Some(()).encode(), &registry, ids[0]), Value::Null);
    assert_eq!(encode_value(&Value::Null, &registry, ids[0]), None::<()>.encode());

    assert_eq!(decode_value(&Some(None::<u8>).encode(), &registry, ids[1]), Value::Null);
    assert_eq!(encode_value(&Value::Null, &registry, ids[1]), None::<Option<u8>>.encode());
    assert_eq!(decode_value(&Some(Some(5u8)).encode(), &registry, ids[1]), json!(5));
    assert_eq!(encode_value(&json!(5), &registry, ids[1]), Some(Some(5u8)).encode());
}

#[test]
fn names() {
    let (registry, ids) = parsed_registry_of(vec![
        meta_type::<Wrapper<u8>>(),
        meta_type::<Wrapper<String>>(),
        meta_type::<first::Same>(),
        meta_type::<second::Same>(),
        meta_type::<Option<u32>>(),
    ]);
    assert_eq!(registry.type_name(ids[0]).unwrap(), "Wrapper<u8>");
    assert_eq!(registry.type_name(ids[1]).unwrap(), "Wrapper<String>");
    assert_eq!(registry.resolve_by_name("Wrapper<u8>"), Some(ids[0]));
    assert_eq!(registry.resolve_by_name(" Wrapper<String> "), Some(ids[1]));
    assert_eq!(
        registry.resolve_by_name("gear_payload_codec::tests::Wrapper<u8>"),
        Some(ids[0])
    );
    assert_eq!(registry.resolve_by_name("Option<u32>"), Some(ids[4]));

    // short name goes to the first registered
    assert_eq!(registry.resolve_by_name("Same"), Some(ids[2]));
    assert_eq!(
        registry.resolve_by_name("gear_payload_codec::tests::second::Same"),
        Some(ids[3])
    );
    assert_eq!(registry.resolve_by_name("Missing"), None);
    assert!(registry.names().any(|(name, index)| name == "Same" && index == ids[2]));
}

#[test]
fn value_skeletons() {
    let (registry, ids) = parsed_registry_of(vec![
        meta_type::<Point>(),
        meta_type::<Action>(),
        meta_type::<List>(),
    ]);
    assert_eq!(registry.describe(ids[0]).unwrap(), json!({"x": "u32", "y": "u32"}));
    assert_eq!(
        registry.describe(ids[1]).unwrap(),
        json!({"_enum": {
            "Stop": null,
            "Move": {"x": "i32", "y": "i32"},
            "Say": "String",
            "Pair": ["u8", "u16"],
        }})
    );
    assert_eq!(
        registry.describe(ids[2]).unwrap(),
        json!({"_enum": {"Nil": null, "Cons": ["u8", "List"]}})
    );
    assert!(registry.describe(999).is_err());
}

#[test]
fn malformed_registries() {
    let (encoded, _) = registry_of(vec![meta_type::<Holder>()]);

    let error = TypeRegistry::parse(&encoded[..encoded.len() - 1]).unwrap_err();
    assert!(matches!(
        error,
        RegistryError::Malformed(MalformedRegistry::PrematureEnd { .. })
    ));

    let error = TypeRegistry::parse(&[]).unwrap_err();
    assert_eq!(
        error,
        RegistryError::Malformed(MalformedRegistry::PrematureEnd { position: 0 })
    );

    let mut with_tail = encoded.to_vec();
    with_tail.push(0);
    let error = TypeRegistry::parse(&with_tail).unwrap_err();
    assert_eq!(
        error,
        RegistryError::Malformed(MalformedRegistry::TrailingBytes { from: encoded.len() })
    );

    let error = TypeRegistry::parse(&[4, 0, 0, 0, 0xff]).unwrap_err();
    assert!(matches!(
        error,
        RegistryError::Malformed(MalformedRegistry::InvalidEncoding { .. })
    ));

    let mut portable = PortableRegistry::decode(&mut &encoded[..]).unwrap();
    portable.types.truncate(1);
    let error = TypeRegistry::parse(&portable.encode()).unwrap_err();
    assert_eq!(
        error,
        RegistryError::Malformed(MalformedRegistry::DanglingReference { id: 0, referenced: 1 })
    );

    let mut portable = PortableRegistry::decode(&mut &encoded[..]).unwrap();
    portable.types.reverse();
    let error = TypeRegistry::parse(&portable.encode()).unwrap_err();
    assert_eq!(
        error,
        RegistryError::Malformed(MalformedRegistry::IdMismatch { position: 0, id: 1 })
    );

    assert!(TypeRegistry::from_hex("0x0g").is_err());
}

fn program_metadata_bytes() -> (Vec<u8>, Vec<u32>) {
    let (reg, ids) = registry_of(vec![
        meta_type::<InitConfig>(),
        meta_type::<Action>(),
        meta_type::<Event>(),
        meta_type::<State>(),
    ]);
    let repr = ProgramMetadataRepr {
        reg,
        init: TypesRepr {
            input: Some(ids[0]),
            output: None,
        },
        handle: TypesRepr {
            input: Some(ids[1]),
            output: Some(ids[2]),
        },
        reply: TypesRepr::default(),
        others: TypesRepr::default(),
        state: Some(ids[3]),
        signal: None,
    };
    (repr.encode(), ids)
}

#[test]
fn program_metadata_kinds() {
    let (bytes, ids) = program_metadata_bytes();
    let metadata = ProgramMetadata::from_hex(&format!("0x{}", hex::encode(&bytes))).unwrap();
    assert_eq!(metadata, ProgramMetadata::from_bytes(&bytes).unwrap());
    assert_eq!(metadata.input_ty(MessageKind::Handle), Some(TypeRef::Index(ids[1])));
    assert_eq!(metadata.output_ty(MessageKind::Init), None);
    assert_eq!(metadata.state_ty(), Some(TypeRef::Index(ids[3])));
    assert_eq!(metadata.signal_ty(), None);
    assert_eq!(metadata.hash(), H256(sp_core_hashing::blake2_256(&bytes)));
    assert_eq!(metadata.hash_hex(), format!("0x{}", hex::encode(metadata.hash().0)));

    let source = RegistrySource::Bundle(&metadata);
    let encoded = encode_payload(
        Payload::Value(&json!({"Move": {"x": 3, "y": -4}})),
        source,
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), Action::Move { x: 3, y: -4 }.encode());

    let encoded = encode_payload(
        Payload::Value(&json!({"owner": ids_hex("00"), "limit": 10})),
        source,
        Some(MessageKind::Init),
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(
        encoded.into_bytes(),
        InitConfig {
            owner: [0; 32],
            limit: 10
        }
        .encode()
    );

    let decoded = decode_payload(
        &Event::Moved(1, 2).encode(),
        source,
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(decoded, json!({"Moved": [1, 2]}));
    let decoded = decode_payload(
        &Event::Stopped.encode(),
        source,
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    assert_eq!(decoded, json!("Stopped"));

    let state = State {
        position: (1, -2),
        log: vec!["a".to_string()],
    };
    let decoded = decode_state(&state.encode(), source, &TypeSelector::new()).unwrap();
    assert_eq!(decoded, json!({"position": [1, -2], "log": ["a"]}));

    // explicit selector wins over the message kind
    let encoded = encode_payload(
        Payload::Value(&json!(5)),
        source,
        Some(MessageKind::Handle),
        &TypeSelector::by_name("u16"),
    )
    .unwrap();
    assert_eq!(encoded.into_bytes(), vec![5, 0]);
}

#[test]
fn kind_without_types() {
    let (bytes, _) = program_metadata_bytes();
    let metadata = ProgramMetadata::from_bytes(&bytes).unwrap();
    let source = RegistrySource::Bundle(&metadata);

    let encoded = encode_payload(
        Payload::Value(&json!(null)),
        source,
        Some(MessageKind::Reply),
        &TypeSelector::new(),
    )
    .unwrap();
    assert!(encoded.as_bytes().is_empty());

    let error = encode_payload(
        Payload::Value(&json!(5)),
        source,
        Some(MessageKind::Reply),
        &TypeSelector::new(),
    )
    .unwrap_err();
    assert!(matches!(error, CodecError::TypeMismatch { .. }));

    let error = decode_payload(&[1], source, Some(MessageKind::Reply), &TypeSelector::new())
        .unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
}

#[test]
fn malformed_program_metadata() {
    let (reg, _) = registry_of(vec![meta_type::<Point>()]);
    let repr = ProgramMetadataRepr {
        reg,
        init: TypesRepr::default(),
        handle: TypesRepr {
            input: Some(999),
            output: None,
        },
        reply: TypesRepr::default(),
        others: TypesRepr::default(),
        state: None,
        signal: None,
    };
    let bytes = repr.encode();
    let error = ProgramMetadata::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        error,
        MetadataError::TypeRefOutOfRange { ref section, index: 999, .. } if section == "handle.input"
    ));

    let (mut bytes, _) = program_metadata_bytes();
    bytes.push(0);
    let error = ProgramMetadata::from_bytes(&bytes).unwrap_err();
    assert_eq!(error, MetadataError::TrailingBytes { from: bytes.len() - 1 });

    let error = ProgramMetadata::from_bytes(&bytes[..3]).unwrap_err();
    assert!(matches!(error, MetadataError::Undecodable { premature: true, .. }));

    assert_eq!(ProgramMetadata::from_hex("0xabc").unwrap_err(), MetadataError::InvalidHex);
}

#[test]
fn state_functions() {
    let (reg, ids) = registry_of(vec![meta_type::<u64>(), meta_type::<Point>()]);
    let mut functions = BTreeMap::new();
    functions.insert(
        String::from("point_by_id"),
        TypesRepr {
            input: Some(ids[0]),
            output: Some(ids[1]),
        },
    );
    functions.insert(
        String::from("all"),
        TypesRepr {
            input: None,
            output: Some(ids[0]),
        },
    );
    let bytes = StateMetadataRepr { functions, reg }.encode();
    let metadata = StateMetadata::from_bytes(&bytes).unwrap();
    assert_eq!(
        metadata.function_names().collect::<Vec<&str>>(),
        vec!["all", "point_by_id"]
    );

    let encoded = encode_state_argument(&metadata, "point_by_id", Payload::Value(&json!(5))).unwrap();
    assert_eq!(encoded.into_bytes(), 5u64.encode());
    let encoded = encode_state_argument(&metadata, "all", Payload::Absent).unwrap();
    assert!(encoded.as_bytes().is_empty());

    let decoded = decode_state_function_output(
        &metadata,
        "point_by_id",
        &Point { x: 7, y: 8 }.encode(),
    )
    .unwrap();
    assert_eq!(decoded, json!({"x": 7, "y": 8}));

    let error = encode_state_argument(&metadata, "missing", Payload::Absent).unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
    let error = decode_state_function_output(&metadata, "missing", &[]).unwrap_err();
    assert!(matches!(error, CodecError::UnresolvedType { .. }));
}
