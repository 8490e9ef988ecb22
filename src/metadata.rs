//! Program metadata bundles.
//!
//! Program metadata is the registry together with the message kinds type
//! references, exactly what a Gear program publishes about its interface.
//! State metadata describes the state-reading functions of a state program.
use parity_scale_codec::{Decode, Encode};
use primitive_types::H256;
use sp_core_hashing::blake2_256;

use crate::error::MetadataError;
use crate::registry::{TypeRef, TypeRegistry};
use crate::std::{
    collections::btree_map::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
use crate::traits::TrackedInput;
use crate::unhex;

/// Message kinds, each with own pair of input and output types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageKind {
    Init,
    Handle,
    Reply,
    Others,
}

impl MessageKind {
    pub fn name(&self) -> &'static str {
        match self {
            MessageKind::Init => "init",
            MessageKind::Handle => "handle",
            MessageKind::Reply => "reply",
            MessageKind::Others => "others",
        }
    }
}

/// Input and output type indices, as they go in encoded metadata.
#[derive(Clone, Copy, Debug, Decode, Default, Encode, Eq, PartialEq)]
pub struct TypesRepr {
    pub input: Option<u32>,
    pub output: Option<u32>,
}

/// Encoded form of [`ProgramMetadata`].
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq)]
pub struct ProgramMetadataRepr {
    pub reg: Vec<u8>,
    pub init: TypesRepr,
    pub handle: TypesRepr,
    pub reply: TypesRepr,
    pub others: TypesRepr,
    pub state: Option<u32>,
    pub signal: Option<u32>,
}

/// Encoded form of [`StateMetadata`].
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq)]
pub struct StateMetadataRepr {
    pub functions: BTreeMap<String, TypesRepr>,
    pub reg: Vec<u8>,
}

/// Input and output types of a message kind or state function, checked
/// against the registry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KindTypes {
    pub input: Option<TypeRef>,
    pub output: Option<TypeRef>,
}

/// Parsed and checked program metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramMetadata {
    registry: TypeRegistry,
    init: KindTypes,
    handle: KindTypes,
    reply: KindTypes,
    others: KindTypes,
    state: Option<TypeRef>,
    signal: Option<TypeRef>,
    hash: H256,
}

impl ProgramMetadata {
    /// Parse hexadecimal metadata, with or without `0x` prefix.
    pub fn from_hex(hex_metadata: &str) -> Result<Self, MetadataError> {
        match unhex(hex_metadata) {
            Some(data) => Self::from_bytes(&data),
            None => Err(MetadataError::InvalidHex),
        }
    }

    /// Parse SCALE-encoded [`ProgramMetadataRepr`]. All input must be used.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetadataError> {
        let repr: ProgramMetadataRepr = decode_repr(data)?;
        let registry = TypeRegistry::parse(&repr.reg)?;
        let metadata = Self {
            init: check_types(&repr.init, "init", &registry)?,
            handle: check_types(&repr.handle, "handle", &registry)?,
            reply: check_types(&repr.reply, "reply", &registry)?,
            others: check_types(&repr.others, "others", &registry)?,
            state: check_index(repr.state, "state", &registry)?,
            signal: check_index(repr.signal, "signal", &registry)?,
            hash: H256(blake2_256(data)),
            registry,
        };
        log::debug!("program metadata parsed, hash {}", metadata.hash_hex());
        Ok(metadata)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn types(&self, kind: MessageKind) -> &KindTypes {
        match kind {
            MessageKind::Init => &self.init,
            MessageKind::Handle => &self.handle,
            MessageKind::Reply => &self.reply,
            MessageKind::Others => &self.others,
        }
    }

    pub fn input_ty(&self, kind: MessageKind) -> Option<TypeRef> {
        self.types(kind).input
    }

    pub fn output_ty(&self, kind: MessageKind) -> Option<TypeRef> {
        self.types(kind).output
    }

    pub fn state_ty(&self) -> Option<TypeRef> {
        self.state
    }

    pub fn signal_ty(&self) -> Option<TypeRef> {
        self.signal
    }

    /// BLAKE2b-256 hash of the encoded metadata.
    pub fn hash(&self) -> H256 {
        self.hash
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash.0))
    }
}

/// Parsed and checked state metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateMetadata {
    functions: BTreeMap<String, KindTypes>,
    registry: TypeRegistry,
}

impl StateMetadata {
    pub fn from_hex(hex_metadata: &str) -> Result<Self, MetadataError> {
        match unhex(hex_metadata) {
            Some(data) => Self::from_bytes(&data),
            None => Err(MetadataError::InvalidHex),
        }
    }

    /// Parse SCALE-encoded [`StateMetadataRepr`]. All input must be used.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetadataError> {
        let repr: StateMetadataRepr = decode_repr(data)?;
        let registry = TypeRegistry::parse(&repr.reg)?;
        let mut functions = BTreeMap::new();
        for (name, types) in repr.functions.iter() {
            functions.insert(name.to_string(), check_types(types, name, &registry)?);
        }
        log::debug!("state metadata parsed: {} functions", functions.len());
        Ok(Self {
            functions,
            registry,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn function(&self, name: &str) -> Option<&KindTypes> {
        self.functions.get(name)
    }

    /// Names of all state functions, in name order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|name| name.as_str())
    }
}

fn decode_repr<T: Decode>(data: &[u8]) -> Result<T, MetadataError> {
    let mut input = TrackedInput::new(data);
    let repr = T::decode(&mut input).map_err(|_| input.metadata_error())?;
    if input.position() != data.len() {
        return Err(MetadataError::TrailingBytes {
            from: input.position(),
        });
    }
    Ok(repr)
}

fn check_index(
    index: Option<u32>,
    section: &str,
    registry: &TypeRegistry,
) -> Result<Option<TypeRef>, MetadataError> {
    match index {
        Some(index) if index as usize >= registry.len() => Err(MetadataError::TypeRefOutOfRange {
            section: section.to_string(),
            index,
            len: registry.len(),
        }),
        Some(index) => Ok(Some(TypeRef::Index(index))),
        None => Ok(None),
    }
}

fn check_types(
    types: &TypesRepr,
    section: &str,
    registry: &TypeRegistry,
) -> Result<KindTypes, MetadataError> {
    Ok(KindTypes {
        input: check_index(types.input, &format!("{section}.input"), registry)?,
        output: check_index(types.output, &format!("{section}.output"), registry)?,
    })
}
