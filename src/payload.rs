//! Payload encoding and decoding at the program interface boundary.
//!
//! Type for a payload is chosen in the following order:
//!
//! 1. explicit type index, if given,
//! 2. type name, if given, first in registry, then among the built-in types,
//! 3. type set up in program metadata for the message kind, if the metadata
//!    and the kind are given,
//! 4. for encoding only, built-in `Bytes`.
//!
//! Before any of this, encoding lets through the payloads that already are
//! encoded: hex strings and raw bytes. Absent payload is encoded as no bytes.
use core::fmt;
use serde_json::Value;

use crate::builtin::{builtin, BYTES};
use crate::decoding::{decode_all_as_type, decode_all_with_descriptor};
use crate::encoding::{encode_with_descriptor, encode_with_type};
use crate::error::{CodecError, RegistryError};
use crate::metadata::{MessageKind, ProgramMetadata, StateMetadata};
use crate::registry::{TypeDescriptor, TypeRef, TypeRegistry};
use crate::settings::CodecSettings;
use crate::std::{
    borrow::Cow,
    string::{String, ToString},
    vec::Vec,
};
use crate::traits::ResolveType;
use crate::{is_hex, unhex};

/// Payload to be encoded.
#[derive(Clone, Copy, Debug)]
pub enum Payload<'a> {
    /// No payload at all.
    Absent,

    /// Already encoded payload, as `0x`-prefixed hex.
    Hex(&'a str),

    /// Already encoded payload.
    Bytes(&'a [u8]),

    /// Payload to be encoded with a type.
    Value(&'a Value),
}

/// Where the type information comes from.
#[derive(Clone, Copy, Debug)]
pub enum RegistrySource<'a> {
    /// Program metadata, with registry and message kinds types.
    Bundle(&'a ProgramMetadata),

    /// Already parsed registry.
    Registry(&'a TypeRegistry),

    /// Hex-encoded registry, with or without `0x` prefix.
    RawRegistry(&'a str),

    /// No type information, only built-in types could be used.
    None,
}

/// Type explicitly requested by caller. Index has priority over name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TypeSelector {
    pub index: Option<u32>,
    pub name: Option<String>,
}

impl TypeSelector {
    /// Select nothing, the type is decided by message kind or fallback.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_index(index: u32) -> Self {
        Self {
            index: Some(index),
            name: None,
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            index: None,
            name: Some(name.to_string()),
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.name.is_none()
    }
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.index, &self.name) {
            (Some(index), _) => write!(f, "type index {index}"),
            (None, Some(name)) => write!(f, "type name {name}"),
            (None, None) => write!(f, "no type selected"),
        }
    }
}

/// Encoded payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodedPayload(Vec<u8>);

impl EncodedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl AsRef<[u8]> for EncodedPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Type that was chosen for payload.
enum Target {
    Registered(TypeRef),
    BuiltIn(TypeDescriptor),
}

/// Registry source, with raw registry already parsed.
struct Prepared<'a> {
    registry: Option<Cow<'a, TypeRegistry>>,
    bundle: Option<&'a ProgramMetadata>,
}

impl<'a> Prepared<'a> {
    fn new(source: RegistrySource<'a>) -> Result<Self, CodecError> {
        let prepared = match source {
            RegistrySource::Bundle(metadata) => Self {
                registry: Some(Cow::Borrowed(metadata.registry())),
                bundle: Some(metadata),
            },
            RegistrySource::Registry(registry) => Self {
                registry: Some(Cow::Borrowed(registry)),
                bundle: None,
            },
            RegistrySource::RawRegistry(hex_registry) => Self {
                registry: Some(Cow::Owned(TypeRegistry::from_hex(hex_registry)?)),
                bundle: None,
            },
            RegistrySource::None => Self {
                registry: None,
                bundle: None,
            },
        };
        Ok(prepared)
    }

    fn resolver(&self) -> &dyn ResolveType {
        match self.registry {
            Some(ref registry) => &**registry,
            None => &(),
        }
    }

    /// Type selected explicitly, by index or by name.
    fn select(&self, selector: &TypeSelector) -> Result<Option<Target>, CodecError> {
        if let Some(index) = selector.index {
            match self.registry {
                Some(ref registry) => {
                    registry.resolve_by_index(index)?;
                }
                None => return Err(RegistryError::UnknownTypeIndex { index, len: 0 }.into()),
            }
            log::debug!("payload type selected by index {index}");
            return Ok(Some(Target::Registered(TypeRef::Index(index))));
        }
        if let Some(ref name) = selector.name {
            if let Some(index) = self
                .registry
                .as_ref()
                .and_then(|registry| registry.resolve_by_name(name))
            {
                log::debug!("payload type selected by name {name}, index {index}");
                return Ok(Some(Target::Registered(TypeRef::Index(index))));
            }
            if let Some(descriptor) = builtin(name) {
                log::debug!("payload type selected by name {name}, built-in");
                return Ok(Some(Target::BuiltIn(descriptor)));
            }
            return Err(CodecError::UnresolvedType {
                selector: selector.to_string(),
            });
        }
        Ok(None)
    }

    fn encode(&self, value: &Value, target: &Target, settings: &CodecSettings) -> Result<Vec<u8>, CodecError> {
        match target {
            Target::Registered(ty) => encode_with_type(value, ty, self.resolver(), settings),
            Target::BuiltIn(descriptor) => {
                encode_with_descriptor(value, descriptor, self.resolver(), settings)
            }
        }
    }

    fn decode(&self, data: &[u8], target: &Target, settings: &CodecSettings) -> Result<Value, CodecError> {
        match target {
            Target::Registered(ty) => decode_all_as_type(ty, data, self.resolver(), settings),
            Target::BuiltIn(descriptor) => {
                decode_all_with_descriptor(descriptor, data, self.resolver(), settings)
            }
        }
    }
}

/// Payload that still needs encoding, or is already encoded.
enum Unencoded<'p> {
    Ready(Vec<u8>),
    Value(&'p Value),
}

fn pass_through(payload: Payload) -> Result<Unencoded, CodecError> {
    match payload {
        Payload::Absent => {
            log::trace!("no payload, encoded as empty");
            Ok(Unencoded::Ready(Vec::new()))
        }
        Payload::Hex(text) => match unhex(text).filter(|_| is_hex(text)) {
            Some(bytes) => {
                log::trace!("hex payload passed through");
                Ok(Unencoded::Ready(bytes))
            }
            None => Err(CodecError::InvalidHex {
                path: String::from("$"),
            }),
        },
        Payload::Bytes(bytes) => {
            log::trace!("byte payload passed through");
            Ok(Unencoded::Ready(bytes.to_vec()))
        }
        Payload::Value(Value::String(text)) if is_hex(text) => match unhex(text) {
            Some(bytes) => {
                log::trace!("hex string value passed through");
                Ok(Unencoded::Ready(bytes))
            }
            None => Err(CodecError::InvalidHex {
                path: String::from("$"),
            }),
        },
        Payload::Value(value) => Ok(Unencoded::Value(value)),
    }
}

/// Type for payloads with no type information.
fn fallback() -> Result<Target, CodecError> {
    match builtin(BYTES) {
        Some(descriptor) => {
            log::debug!("no payload type available, encoding as {BYTES}");
            Ok(Target::BuiltIn(descriptor))
        }
        None => Err(CodecError::UnresolvedType {
            selector: BYTES.to_string(),
        }),
    }
}

/// Type for the kinds that have no type set up: accepts only the empty value.
fn unit() -> Target {
    Target::BuiltIn(TypeDescriptor::Tuple(Vec::new()))
}

/// Encode payload of a message, with default settings.
pub fn encode_payload(
    payload: Payload,
    source: RegistrySource,
    kind: Option<MessageKind>,
    selector: &TypeSelector,
) -> Result<EncodedPayload, CodecError> {
    encode_payload_with_settings(payload, source, kind, selector, &CodecSettings::default())
}

pub fn encode_payload_with_settings(
    payload: Payload,
    source: RegistrySource,
    kind: Option<MessageKind>,
    selector: &TypeSelector,
    settings: &CodecSettings,
) -> Result<EncodedPayload, CodecError> {
    let value = match pass_through(payload)? {
        Unencoded::Ready(bytes) => return Ok(EncodedPayload(bytes)),
        Unencoded::Value(value) => value,
    };
    let prepared = Prepared::new(source)?;
    let target = match prepared.select(selector)? {
        Some(target) => target,
        None => match (prepared.bundle, kind) {
            (Some(metadata), Some(kind)) => match metadata.input_ty(kind) {
                Some(ty) => {
                    log::debug!("payload type selected by message kind {}", kind.name());
                    Target::Registered(ty)
                }
                None => {
                    log::debug!("message kind {} has no input type", kind.name());
                    unit()
                }
            },
            _ => fallback()?,
        },
    };
    prepared.encode(value, &target, settings).map(EncodedPayload)
}

/// Decode payload of a message, with default settings.
///
/// All data must be used.
pub fn decode_payload(
    data: &[u8],
    source: RegistrySource,
    kind: Option<MessageKind>,
    selector: &TypeSelector,
) -> Result<Value, CodecError> {
    decode_payload_with_settings(data, source, kind, selector, &CodecSettings::default())
}

pub fn decode_payload_with_settings(
    data: &[u8],
    source: RegistrySource,
    kind: Option<MessageKind>,
    selector: &TypeSelector,
    settings: &CodecSettings,
) -> Result<Value, CodecError> {
    let prepared = Prepared::new(source)?;
    let target = match prepared.select(selector)? {
        Some(target) => target,
        None => match (prepared.bundle, kind) {
            (Some(metadata), Some(kind)) => match metadata.output_ty(kind) {
                Some(ty) => {
                    log::debug!("payload type selected by message kind {}", kind.name());
                    Target::Registered(ty)
                }
                None => {
                    return Err(CodecError::UnresolvedType {
                        selector: format!("{} output", kind.name()),
                    })
                }
            },
            _ => {
                return Err(CodecError::UnresolvedType {
                    selector: selector.to_string(),
                })
            }
        },
    };
    prepared.decode(data, &target, settings)
}

/// Decode program state, with default settings.
pub fn decode_state(
    data: &[u8],
    source: RegistrySource,
    selector: &TypeSelector,
) -> Result<Value, CodecError> {
    decode_state_with_settings(data, source, selector, &CodecSettings::default())
}

pub fn decode_state_with_settings(
    data: &[u8],
    source: RegistrySource,
    selector: &TypeSelector,
    settings: &CodecSettings,
) -> Result<Value, CodecError> {
    let prepared = Prepared::new(source)?;
    let target = match prepared.select(selector)? {
        Some(target) => target,
        None => match prepared.bundle.and_then(|metadata| metadata.state_ty()) {
            Some(ty) => {
                log::debug!("state type taken from program metadata");
                Target::Registered(ty)
            }
            None => {
                return Err(CodecError::UnresolvedType {
                    selector: String::from("state"),
                })
            }
        },
    };
    prepared.decode(data, &target, settings)
}

/// Encode argument of a state function, with default settings.
pub fn encode_state_argument(
    metadata: &StateMetadata,
    function: &str,
    payload: Payload,
) -> Result<EncodedPayload, CodecError> {
    encode_state_argument_with_settings(metadata, function, payload, &CodecSettings::default())
}

pub fn encode_state_argument_with_settings(
    metadata: &StateMetadata,
    function: &str,
    payload: Payload,
    settings: &CodecSettings,
) -> Result<EncodedPayload, CodecError> {
    let types = metadata
        .function(function)
        .ok_or_else(|| CodecError::UnresolvedType {
            selector: format!("state function {function}"),
        })?;
    let value = match pass_through(payload)? {
        Unencoded::Ready(bytes) => return Ok(EncodedPayload(bytes)),
        Unencoded::Value(value) => value,
    };
    let prepared = Prepared::new(RegistrySource::Registry(metadata.registry()))?;
    let target = match types.input {
        Some(ty) => Target::Registered(ty),
        None => fallback()?,
    };
    prepared.encode(value, &target, settings).map(EncodedPayload)
}

/// Decode output of a state function, with default settings.
pub fn decode_state_function_output(
    metadata: &StateMetadata,
    function: &str,
    data: &[u8],
) -> Result<Value, CodecError> {
    decode_state_function_output_with_settings(metadata, function, data, &CodecSettings::default())
}

pub fn decode_state_function_output_with_settings(
    metadata: &StateMetadata,
    function: &str,
    data: &[u8],
    settings: &CodecSettings,
) -> Result<Value, CodecError> {
    let ty = metadata
        .function(function)
        .and_then(|types| types.output)
        .ok_or_else(|| CodecError::UnresolvedType {
            selector: format!("state function {function} output"),
        })?;
    decode_all_as_type(&ty, data, metadata.registry(), settings)
}
