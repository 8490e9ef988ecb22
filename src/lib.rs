//! This crate is a codec for Gear program payloads. It turns JSON-like values
//! into SCALE-encoded message payloads and back, using the type information
//! that programs publish along with their code.
//!
//! # Assumptions
//!
//! Payloads are [SCALE-encoded](https://docs.substrate.io/reference/scale-codec/).
//! Type information comes as SCALE-encoded `scale-info`
//! [`PortableRegistry`](scale_info::PortableRegistry), either on its own, or
//! as a part of program metadata, i.e. registry and the types indices for
//! each message kind (`init`, `handle`, `reply`, `others`) and for program
//! state.
//!
//! Decoded data blobs are expected to be decoded completely: all provided
//! `&[u8]` data must be used in decoding with no data remaining unparsed.
//!
//! # Type registry
//!
//! [`TypeRegistry`] is parsed once, checked and flattened into an arena of
//! [`TypeDescriptor`]s addressed by index. Types could be looked up by index
//! or by name. Name of a type is its last path segment with type parameters,
//! e.g. `Option<u32>` or `Action`, or the full path, e.g. `my_io::Action`.
//!
//! # Choosing the type
//!
//! Type for the payload is selected by [`TypeSelector`] (explicit index has
//! priority over the name), then by [`MessageKind`] if the program metadata
//! is available. Names unknown to the registry are searched in the built-in
//! types table ([`builtin`](crate::builtin::builtin)), so that plain numbers,
//! strings, byte blobs and ids could be processed without any registry at
//! all. Payloads with no type information whatsoever are encoded as `Bytes`.
//!
//! Payloads that are already hex strings or raw bytes are passed through as
//! is.
//!
//! # Values
//!
//! Values are [`serde_json::Value`]:
//!
//! - numbers go as JSON numbers where those fit, and as decimal strings
//!   otherwise; encoder also accepts decimal and `0x`-hex strings,
//! - byte sequences and byte arrays are `0x`-prefixed hex strings,
//! - structs with named fields are objects, structs with single unnamed field
//!   are the field value itself, structs with several unnamed fields are
//!   arrays, and structs with no fields are `null`,
//! - enum variants without payload are variant names, and variants with
//!   payload are single-key objects `{"Variant": payload}`,
//! - `Option` is either `null` or the inner value,
//! - tuples are arrays, and the empty tuple is `null`,
//! - bit sequences are arrays of bools.
//!
//! # Example
//!
//! ```
//! use gear_payload_codec::{encode_payload, Payload, RegistrySource, TypeSelector};
//! use serde_json::json;
//!
//! let encoded = encode_payload(
//!     Payload::Value(&json!(1)),
//!     RegistrySource::None,
//!     None,
//!     &TypeSelector::by_name("u32"),
//! )
//! .unwrap();
//! assert_eq!(encoded.to_hex(), "0x01000000");
//! ```
#![no_std]
#![deny(unused_crate_dependencies)]

pub mod builtin;
pub mod compacts;
pub mod decoding;
pub mod encoding;
pub mod error;
pub mod metadata;
mod naming;
pub mod payload;
mod propagated;
pub mod registry;
pub mod settings;
pub mod traits;

#[cfg(test)]
mod tests;

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[cfg(all(not(feature = "std"), not(test)))]
#[macro_use]
extern crate alloc as std;

use crate::std::vec::Vec;

pub use decoding::{decode_all_as_type, decode_as_type_at_position};
pub use encoding::encode_with_type;
pub use error::{CodecError, MalformedRegistry, MetadataError, RegistryError};
pub use metadata::{KindTypes, MessageKind, ProgramMetadata, StateMetadata, TypesRepr};
pub use payload::{
    decode_payload, decode_payload_with_settings, decode_state, decode_state_function_output,
    decode_state_function_output_with_settings, decode_state_with_settings,
    encode_payload, encode_payload_with_settings, encode_state_argument,
    encode_state_argument_with_settings, EncodedPayload, Payload, RegistrySource, TypeSelector,
};
pub use registry::{TypeDescriptor, TypeRef, TypeRegistry};
pub use settings::CodecSettings;
pub use traits::ResolveType;

/// Bytes from hex string, `0x` prefix is optional.
pub(crate) fn unhex(hex_input: &str) -> Option<Vec<u8>> {
    let hex_input_trimmed = {
        if let Some(hex_input_stripped) = hex_input.strip_prefix("0x") {
            hex_input_stripped
        } else {
            hex_input
        }
    };
    hex::decode(hex_input_trimmed).ok()
}

/// Whether the string is `0x`-prefixed hex, i.e. something already encoded.
pub(crate) fn is_hex(text: &str) -> bool {
    match text.strip_prefix("0x") {
        Some(digits) => digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}
