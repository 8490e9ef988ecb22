//! Encode and decode `handle` messages of a toy program, the way a client
//! would do it with the program metadata at hand.
use gear_payload_codec::{
    decode_payload, encode_payload, metadata::ProgramMetadataRepr, MessageKind, Payload,
    ProgramMetadata, RegistrySource, TypeSelector, TypesRepr,
};
use parity_scale_codec::Encode;
use scale_info::{meta_type, PortableRegistry, Registry, TypeInfo};
use serde_json::json;

#[allow(dead_code)]
#[derive(TypeInfo)]
enum Action {
    Transfer { to: [u8; 32], amount: u128 },
    Burn(u128),
}

#[allow(dead_code)]
#[derive(TypeInfo)]
enum Event {
    Transferred { from: [u8; 32], to: [u8; 32], amount: u128 },
    Burned(u128),
}

fn main() {
    let mut registry = Registry::new();
    let action = registry.register_type(&meta_type::<Action>()).id;
    let event = registry.register_type(&meta_type::<Event>()).id;
    let reg = PortableRegistry::from(registry).encode();

    let metadata_bytes = ProgramMetadataRepr {
        reg,
        init: TypesRepr::default(),
        handle: TypesRepr {
            input: Some(action),
            output: Some(event),
        },
        reply: TypesRepr::default(),
        others: TypesRepr::default(),
        state: None,
        signal: None,
    }
    .encode();
    let metadata = ProgramMetadata::from_bytes(&metadata_bytes).unwrap();
    println!("metadata hash: {}", metadata.hash_hex());

    let value = json!({"Transfer": {"to": format!("0x{}", "d4".repeat(32)), "amount": "1000000000000"}});
    let encoded = encode_payload(
        Payload::Value(&value),
        RegistrySource::Bundle(&metadata),
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    println!("handle payload: {}", encoded.to_hex());

    let reply = [&[1u8][..], &1_000u128.encode()].concat();
    let decoded = decode_payload(
        &reply,
        RegistrySource::Bundle(&metadata),
        Some(MessageKind::Handle),
        &TypeSelector::new(),
    )
    .unwrap();
    println!("handle output: {decoded}");

    for index in [action, event] {
        println!(
            "{}: {}",
            metadata.registry().type_name(index).unwrap(),
            metadata.registry().describe(index).unwrap()
        );
    }
}
