//! Type registry resolver.
//!
//! Type registry arrives as SCALE-encoded [`PortableRegistry`], i.e. the
//! types database that `scale-info` produces for a compiled program. It gets
//! checked and flattened once into an arena of [`TypeDescriptor`]s addressed
//! by index. Descriptors refer to each other only by index, therefore
//! mutually recursive types (a list node referring to itself, for example)
//! need no special treatment here.
//!
//! Registry is immutable after construction and could be shared freely
//! between concurrent readers.
use parity_scale_codec::Decode;
use scale_info::{
    form::PortableForm, Field, PortableRegistry, Type, TypeDef, TypeDefPrimitive, Variant,
};
use serde_json::Value;

use crate::error::{MalformedRegistry, RegistryError};
use crate::naming::{describe, display_name, name_table};
use crate::std::{borrow::ToOwned, collections::btree_map::BTreeMap, string::String, vec::Vec};
use crate::traits::TrackedInput;
use crate::unhex;

/// Primitive kinds, as in [`TypeDefPrimitive`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Primitive {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
}

impl Primitive {
    /// Rust name of the primitive.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Str => "str",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::U256 => "u256",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::I256 => "i256",
        }
    }
}

impl From<&TypeDefPrimitive> for Primitive {
    fn from(primitive: &TypeDefPrimitive) -> Self {
        match primitive {
            TypeDefPrimitive::Bool => Primitive::Bool,
            TypeDefPrimitive::Char => Primitive::Char,
            TypeDefPrimitive::Str => Primitive::Str,
            TypeDefPrimitive::U8 => Primitive::U8,
            TypeDefPrimitive::U16 => Primitive::U16,
            TypeDefPrimitive::U32 => Primitive::U32,
            TypeDefPrimitive::U64 => Primitive::U64,
            TypeDefPrimitive::U128 => Primitive::U128,
            TypeDefPrimitive::U256 => Primitive::U256,
            TypeDefPrimitive::I8 => Primitive::I8,
            TypeDefPrimitive::I16 => Primitive::I16,
            TypeDefPrimitive::I32 => Primitive::I32,
            TypeDefPrimitive::I64 => Primitive::I64,
            TypeDefPrimitive::I128 => Primitive::I128,
            TypeDefPrimitive::I256 => Primitive::I256,
        }
    }
}

/// Reference to a type from within a descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeRef {
    /// Index in the same registry.
    Index(u32),

    /// Primitive that needs no registry entry.
    BuiltIn(Primitive),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantDescriptor {
    pub name: String,

    /// Index byte that goes into the encoded data.
    pub index: u8,

    /// Variant payload. Empty for unit variants.
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitStore {
    U8,
    U16,
    U32,
    U64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BitOrder {
    Lsb0,
    Msb0,
}

/// Type description sufficient to encode or decode the data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Struct(Vec<FieldDescriptor>),
    Enum(Vec<VariantDescriptor>),
    Sequence(TypeRef),
    FixedArray { element: TypeRef, len: u32 },
    Tuple(Vec<TypeRef>),
    Option(TypeRef),
    Compact(TypeRef),
    BitSequence { store: BitStore, order: BitOrder },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub ty: Option<TypeRef>,
}

/// Registry entry: descriptor with the identifying information that came
/// along in the registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryEntry {
    pub path: Vec<String>,
    pub type_params: Vec<TypeParam>,
    pub docs: Vec<String>,
    pub descriptor: TypeDescriptor,
}

/// Addressable table of type descriptors: index → descriptor, name → index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeRegistry {
    entries: Vec<RegistryEntry>,
    names: BTreeMap<String, u32>,
}

impl TypeRegistry {
    /// Parse SCALE-encoded [`PortableRegistry`].
    ///
    /// All input must be used.
    pub fn parse(data: &[u8]) -> Result<Self, RegistryError> {
        let mut input = TrackedInput::new(data);
        let portable =
            PortableRegistry::decode(&mut input).map_err(|e| input.registry_error(e))?;
        if input.position() != data.len() {
            return Err(MalformedRegistry::TrailingBytes {
                from: input.position(),
            }
            .into());
        }
        Self::from_portable(&portable)
    }

    /// Parse hexadecimal registry, with or without `0x` prefix.
    pub fn from_hex(hex_registry: &str) -> Result<Self, RegistryError> {
        match unhex(hex_registry) {
            Some(data) => Self::parse(&data),
            None => Err(MalformedRegistry::InvalidEncoding {
                position: 0,
                reason: String::from("not a hexadecimal string"),
            }
            .into()),
        }
    }

    /// Check and flatten already decoded [`PortableRegistry`].
    pub fn from_portable(portable: &PortableRegistry) -> Result<Self, RegistryError> {
        for (position, portable_ty) in portable.types.iter().enumerate() {
            if portable_ty.id as usize != position {
                return Err(MalformedRegistry::IdMismatch {
                    position,
                    id: portable_ty.id,
                }
                .into());
            }
        }
        let mut entries: Vec<RegistryEntry> = Vec::with_capacity(portable.types.len());
        for portable_ty in portable.types.iter() {
            entries.push(convert_ty(portable_ty.id, &portable_ty.ty, portable)?);
        }
        let names = name_table(&entries);
        log::debug!(
            "type registry parsed: {} types, {} names",
            entries.len(),
            names.len()
        );
        Ok(Self { entries, names })
    }

    /// Number of types in registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry entry at `index`.
    pub fn entry(&self, index: u32) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .get(index as usize)
            .ok_or(RegistryError::UnknownTypeIndex {
                index,
                len: self.entries.len(),
            })
    }

    /// Descriptor at `index`.
    pub fn resolve_by_index(&self, index: u32) -> Result<&TypeDescriptor, RegistryError> {
        self.entry(index).map(|entry| &entry.descriptor)
    }

    /// Index of the type with given name, if there is one.
    ///
    /// Both the short display name (`Name<Params>`) and the path-qualified
    /// name (`crate::module::Name<Params>`) are accepted.
    pub fn resolve_by_name(&self, name: &str) -> Option<u32> {
        self.names.get(name.trim()).copied()
    }

    /// Human-readable name of the type at `index`.
    pub fn type_name(&self, index: u32) -> Result<String, RegistryError> {
        self.entry(index)?;
        Ok(display_name(&self.entries, index))
    }

    /// All registered names with corresponding indices, in name order.
    pub fn names(&self) -> impl Iterator<Item = (&str, u32)> {
        self.names.iter().map(|(name, index)| (name.as_str(), *index))
    }

    /// Skeleton of the value expected for type at `index`, useful to show
    /// what the payload should look like.
    pub fn describe(&self, index: u32) -> Result<Value, RegistryError> {
        self.entry(index)?;
        Ok(describe(&self.entries, index))
    }

    pub(crate) fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }
}

fn check_ref(id: u32, referenced: u32, portable: &PortableRegistry) -> Result<TypeRef, RegistryError> {
    if (referenced as usize) < portable.types.len() {
        Ok(TypeRef::Index(referenced))
    } else {
        Err(MalformedRegistry::DanglingReference { id, referenced }.into())
    }
}

fn convert_fields(
    id: u32,
    fields: &[Field<PortableForm>],
    portable: &PortableRegistry,
) -> Result<Vec<FieldDescriptor>, RegistryError> {
    let mut out = Vec::with_capacity(fields.len());
    for field in fields.iter() {
        out.push(FieldDescriptor {
            name: field.name.to_owned(),
            type_name: field.type_name.to_owned(),
            ty: check_ref(id, field.ty.id, portable)?,
        })
    }
    Ok(out)
}

fn convert_ty(
    id: u32,
    ty: &Type<PortableForm>,
    portable: &PortableRegistry,
) -> Result<RegistryEntry, RegistryError> {
    let descriptor = match &ty.type_def {
        TypeDef::Composite(x) => TypeDescriptor::Struct(convert_fields(id, &x.fields, portable)?),
        TypeDef::Variant(x) => match option_inner(ty, &x.variants) {
            Some(inner_id) => TypeDescriptor::Option(check_ref(id, inner_id, portable)?),
            None => {
                let mut variants = Vec::with_capacity(x.variants.len());
                for variant in x.variants.iter() {
                    variants.push(VariantDescriptor {
                        name: variant.name.to_owned(),
                        index: variant.index,
                        fields: convert_fields(id, &variant.fields, portable)?,
                    })
                }
                TypeDescriptor::Enum(variants)
            }
        },
        TypeDef::Sequence(x) => TypeDescriptor::Sequence(check_ref(id, x.type_param.id, portable)?),
        TypeDef::Array(x) => TypeDescriptor::FixedArray {
            element: check_ref(id, x.type_param.id, portable)?,
            len: x.len,
        },
        TypeDef::Tuple(x) => {
            let mut elements = Vec::with_capacity(x.fields.len());
            for element in x.fields.iter() {
                elements.push(check_ref(id, element.id, portable)?)
            }
            TypeDescriptor::Tuple(elements)
        }
        TypeDef::Primitive(x) => TypeDescriptor::Primitive(Primitive::from(x)),
        TypeDef::Compact(x) => TypeDescriptor::Compact(check_ref(id, x.type_param.id, portable)?),
        TypeDef::BitSequence(x) => {
            check_ref(id, x.bit_store_type.id, portable)?;
            check_ref(id, x.bit_order_type.id, portable)?;
            let store = match portable.resolve(x.bit_store_type.id).map(|a| &a.type_def) {
                Some(TypeDef::Primitive(TypeDefPrimitive::U8)) => BitStore::U8,
                Some(TypeDef::Primitive(TypeDefPrimitive::U16)) => BitStore::U16,
                Some(TypeDef::Primitive(TypeDefPrimitive::U32)) => BitStore::U32,
                Some(TypeDef::Primitive(TypeDefPrimitive::U64)) => BitStore::U64,
                _ => return Err(MalformedRegistry::NotBitStoreType { id }.into()),
            };
            let order = match portable
                .resolve(x.bit_order_type.id)
                .and_then(|a| a.path.ident())
            {
                Some(ident) if ident == "Lsb0" => BitOrder::Lsb0,
                Some(ident) if ident == "Msb0" => BitOrder::Msb0,
                _ => return Err(MalformedRegistry::NotBitOrderType { id }.into()),
            };
            TypeDescriptor::BitSequence { store, order }
        }
    };
    let mut type_params = Vec::with_capacity(ty.type_params.len());
    for param in ty.type_params.iter() {
        let param_ty = match &param.ty {
            Some(symbol) => Some(check_ref(id, symbol.id, portable)?),
            None => None,
        };
        type_params.push(TypeParam {
            name: param.name.to_owned(),
            ty: param_ty,
        })
    }
    Ok(RegistryEntry {
        path: ty.path.segments.to_owned(),
        type_params,
        docs: ty.docs.to_owned(),
        descriptor,
    })
}

/// Inner type id, if the type is a regular `Option<T>`: path ident `Option`,
/// single type parameter, and exactly two variants `None` (index 0, no
/// fields) and `Some` (index 1, single field).
fn option_inner(ty: &Type<PortableForm>, variants: &[Variant<PortableForm>]) -> Option<u32> {
    if ty.path.ident().as_deref() != Some("Option") || ty.type_params.len() != 1 || variants.len() != 2 {
        return None;
    }
    let mut has_none = false;
    let mut some_inner = None;
    for variant in variants.iter() {
        if variant.index == 0 && variant.name == "None" && variant.fields.is_empty() {
            has_none = true
        }
        if variant.index == 1 && variant.name == "Some" && variant.fields.len() == 1 {
            some_inner = Some(variant.fields[0].ty.id)
        }
    }
    if has_none {
        some_inner
    } else {
        None
    }
}
