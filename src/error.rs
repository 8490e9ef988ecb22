//! Errors.
use crate::std::string::String;

#[cfg(feature = "std")]
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[cfg(not(feature = "std"))]
use core::fmt::{Display, Formatter, Result as FmtResult};

/// Errors in type registry parsing and lookup.
#[derive(Debug, Eq, PartialEq)]
pub enum RegistryError {
    Malformed(MalformedRegistry),
    UnknownTypeIndex { index: u32, len: usize },
}

impl RegistryError {
    fn error_text(&self) -> String {
        match &self {
            RegistryError::Malformed(malformed) => format!("Malformed type registry. {malformed}"),
            RegistryError::UnknownTypeIndex { index, len } => format!("Type index {index} is outside of the type registry with {len} entries."),
        }
    }
}

/// Reasons for the type registry bytes to be rejected.
#[derive(Debug, Eq, PartialEq)]
pub enum MalformedRegistry {
    DanglingReference { id: u32, referenced: u32 },
    IdMismatch { position: usize, id: u32 },
    InvalidEncoding { position: usize, reason: String },
    NotBitOrderType { id: u32 },
    NotBitStoreType { id: u32 },
    PrematureEnd { position: usize },
    TrailingBytes { from: usize },
}

impl MalformedRegistry {
    fn error_text(&self) -> String {
        match &self {
            MalformedRegistry::DanglingReference { id, referenced } => format!("Type {id} refers to type {referenced} that is not in the registry."),
            MalformedRegistry::IdMismatch { position, id } => format!("Registry entry at position {position} declares id {id}."),
            MalformedRegistry::InvalidEncoding { position, reason } => format!("Unexpected data at position {position}: {reason}."),
            MalformedRegistry::NotBitOrderType { id } => format!("BitVec type {id} has unexpected BitOrder type."),
            MalformedRegistry::NotBitStoreType { id } => format!("BitVec type {id} has unexpected BitStore type."),
            MalformedRegistry::PrematureEnd { position } => format!("Registry data ended unexpectedly at position {position}."),
            MalformedRegistry::TrailingBytes { from } => format!("Some data (input positions [{from}..]) remained unused after registry decoding."),
        }
    }
}

/// Errors in program and state metadata parsing.
#[derive(Debug, Eq, PartialEq)]
pub enum MetadataError {
    InvalidHex,
    Registry(RegistryError),
    TrailingBytes { from: usize },
    TypeRefOutOfRange { section: String, index: u32, len: usize },
    Undecodable { position: usize, premature: bool },
}

impl MetadataError {
    fn error_text(&self) -> String {
        match &self {
            MetadataError::InvalidHex => String::from("Metadata is not a valid hexadecimal string."),
            MetadataError::Registry(registry_error) => format!("{registry_error}"),
            MetadataError::TrailingBytes { from } => format!("Some metadata (input positions [{from}..]) remained unused after decoding."),
            MetadataError::TypeRefOutOfRange { section, index, len } => format!("Metadata section `{section}` refers to type {index}, registry has {len} entries."),
            MetadataError::Undecodable { position, premature: true } => format!("Metadata ended unexpectedly at position {position}."),
            MetadataError::Undecodable { position, premature: false } => format!("Unable to decode metadata, unexpected data at position {position}."),
        }
    }
}

/// Errors in payload encoding and decoding.
///
/// `path` fields point at the value being processed, starting with `$` for
/// the top level value, e.g. `$.owner[2]::Some`.
#[derive(Debug, Eq, PartialEq)]
pub enum CodecError {
    InvalidBool { path: String, position: usize, byte: u8 },
    InvalidChar { path: String, position: usize },
    InvalidHex { path: String },
    InvalidUtf8 { path: String, position: usize },
    Metadata(MetadataError),
    NoCompact { path: String, position: usize },
    NumberOutOfRange { path: String, ty: &'static str, value: String },
    RecursionLimit { path: String, limit: usize },
    Registry(RegistryError),
    TooManyElements { path: String, position: usize, count: usize, limit: usize },
    TrailingBytes { from: usize, total: usize },
    Truncated { path: String, position: usize, needed: usize, available: usize },
    TypeMismatch { path: String, expected: String, found: &'static str },
    UnexpectedCompactInsides { path: String },
    UnexpectedEnumVariant { path: String, position: usize, index: u8 },
    UnexpectedOptionTag { path: String, position: usize, tag: u8 },
    UnresolvedType { selector: String },
}

impl CodecError {
    fn error_text(&self) -> String {
        match &self {
            CodecError::InvalidBool { path, position, byte } => format!("Value at {path}: byte {byte} at position {position} is not a bool."),
            CodecError::InvalidChar { path, position } => format!("Value at {path}: data at position {position} is not a valid char."),
            CodecError::InvalidHex { path } => format!("Value at {path} is not a valid hexadecimal string."),
            CodecError::InvalidUtf8 { path, position } => format!("Value at {path}: string starting at position {position} is not valid utf8."),
            CodecError::Metadata(metadata_error) => format!("{metadata_error}"),
            CodecError::NoCompact { path, position } => format!("Value at {path}: expected compact starting at position {position}, not found one."),
            CodecError::NumberOutOfRange { path, ty, value } => format!("Value at {path}: number {value} does not fit into {ty}."),
            CodecError::RecursionLimit { path, limit } => format!("Value at {path}: type nesting exceeds the limit of {limit}."),
            CodecError::Registry(registry_error) => format!("{registry_error}"),
            CodecError::TooManyElements { path, position, count, limit } => format!("Value at {path}: {count} elements taking no data starting at position {position}, at most {limit} allowed."),
            CodecError::TrailingBytes { from, total } => format!("Some data (input positions [{from}..{total}]) remained unused after decoding."),
            CodecError::Truncated { path, position, needed, available } => format!("Value at {path}: data ended at position {position}, {needed} byte(s) needed, {available} available."),
            CodecError::TypeMismatch { path, expected, found } => format!("Value at {path}: expected {expected}, found {found}."),
            CodecError::UnexpectedCompactInsides { path } => format!("Value at {path}: compact type has unexpected type inside compact."),
            CodecError::UnexpectedEnumVariant { path, position, index } => format!("Value at {path}: encountered unexpected enum variant {index} at position {position}."),
            CodecError::UnexpectedOptionTag { path, position, tag } => format!("Value at {path}: option tag {tag} at position {position} is neither 0 nor 1."),
            CodecError::UnresolvedType { selector } => format!("Unable to resolve type {selector}."),
        }
    }
}

/// Implement [`Display`] and `Error` (`std` only).
macro_rules! impl_display_and_error {
    ($($ty: ty), *) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                    write!(f, "{}", self.error_text())
                }
            }

            #[cfg(feature = "std")]
            impl Error for $ty {
                fn source(&self) -> Option<&(dyn Error + 'static)> {
                    None
                }
            }
        )*
    }
}

impl_display_and_error!(CodecError, MalformedRegistry, MetadataError, RegistryError);

impl From<MalformedRegistry> for RegistryError {
    fn from(malformed: MalformedRegistry) -> Self {
        RegistryError::Malformed(malformed)
    }
}

impl From<RegistryError> for MetadataError {
    fn from(registry_error: RegistryError) -> Self {
        MetadataError::Registry(registry_error)
    }
}

impl From<RegistryError> for CodecError {
    fn from(registry_error: RegistryError) -> Self {
        CodecError::Registry(registry_error)
    }
}

impl From<MetadataError> for CodecError {
    fn from(metadata_error: MetadataError) -> Self {
        CodecError::Metadata(metadata_error)
    }
}
