//! Built-in codecs, addressable by name when no registry has the type.
//!
//! Allows simple payloads (numbers, text, byte blobs, ids) to be processed
//! with no program-specific registry at all.
use crate::registry::{Primitive, TypeDescriptor, TypeRef};
use crate::std::vec::Vec;

/// Name of the built-in type used for payloads that come with no type
/// information whatsoever.
pub const BYTES: &str = "Bytes";

/// All names recognized by [`builtin`].
pub const BUILTIN_NAMES: &[&str] = &[
    "bool",
    "char",
    "str",
    "String",
    "Text",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "u256",
    "i8",
    "i16",
    "i32",
    "i64",
    "i128",
    "i256",
    "Compact<u8>",
    "Compact<u16>",
    "Compact<u32>",
    "Compact<u64>",
    "Compact<u128>",
    "Bytes",
    "Vec<u8>",
    "H256",
    "[u8;32]",
    "[u8; 32]",
    "ActorId",
    "ProgramId",
    "MessageId",
    "CodeId",
    "()",
    "Null",
];

/// Length of Gear ids and hashes.
const ID_LEN: u32 = 32;

/// Built-in descriptor for `name`, if there is one.
pub fn builtin(name: &str) -> Option<TypeDescriptor> {
    let descriptor = match name.trim() {
        "bool" => TypeDescriptor::Primitive(Primitive::Bool),
        "char" => TypeDescriptor::Primitive(Primitive::Char),
        "str" | "String" | "Text" => TypeDescriptor::Primitive(Primitive::Str),
        "u8" => TypeDescriptor::Primitive(Primitive::U8),
        "u16" => TypeDescriptor::Primitive(Primitive::U16),
        "u32" => TypeDescriptor::Primitive(Primitive::U32),
        "u64" => TypeDescriptor::Primitive(Primitive::U64),
        "u128" => TypeDescriptor::Primitive(Primitive::U128),
        "u256" => TypeDescriptor::Primitive(Primitive::U256),
        "i8" => TypeDescriptor::Primitive(Primitive::I8),
        "i16" => TypeDescriptor::Primitive(Primitive::I16),
        "i32" => TypeDescriptor::Primitive(Primitive::I32),
        "i64" => TypeDescriptor::Primitive(Primitive::I64),
        "i128" => TypeDescriptor::Primitive(Primitive::I128),
        "i256" => TypeDescriptor::Primitive(Primitive::I256),
        "Compact<u8>" => TypeDescriptor::Compact(TypeRef::BuiltIn(Primitive::U8)),
        "Compact<u16>" => TypeDescriptor::Compact(TypeRef::BuiltIn(Primitive::U16)),
        "Compact<u32>" => TypeDescriptor::Compact(TypeRef::BuiltIn(Primitive::U32)),
        "Compact<u64>" => TypeDescriptor::Compact(TypeRef::BuiltIn(Primitive::U64)),
        "Compact<u128>" => TypeDescriptor::Compact(TypeRef::BuiltIn(Primitive::U128)),
        "Bytes" | "Vec<u8>" => TypeDescriptor::Sequence(TypeRef::BuiltIn(Primitive::U8)),
        "H256" | "[u8;32]" | "[u8; 32]" | "ActorId" | "ProgramId" | "MessageId" | "CodeId" => {
            TypeDescriptor::FixedArray {
                element: TypeRef::BuiltIn(Primitive::U8),
                len: ID_LEN,
            }
        }
        "()" | "Null" => TypeDescriptor::Tuple(Vec::new()),
        _ => return None,
    };
    Some(descriptor)
}
