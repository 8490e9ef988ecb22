//! Human-readable type names and value skeletons for registry entries.
use serde_json::{Map, Value};

use crate::registry::{BitOrder, BitStore, RegistryEntry, TypeDescriptor, TypeRef};
use crate::std::{
    collections::btree_map::{BTreeMap, Entry},
    string::{String, ToString},
    vec::Vec,
};

/// Type parameters nesting beyond this is not spelled out in names.
const NAME_DEPTH_LIMIT: usize = 16;

/// Display name of type `index`, `Ident<Params>` for types with path.
pub(crate) fn display_name(entries: &[RegistryEntry], index: u32) -> String {
    index_name(entries, index, false, 0)
}

/// Names lookup table. Every type with non-empty path gets its display name
/// and its path-qualified name registered. Display name collisions are
/// resolved in favor of the lowest index.
pub(crate) fn name_table(entries: &[RegistryEntry]) -> BTreeMap<String, u32> {
    let mut names = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.path.is_empty() {
            continue;
        }
        let index = index as u32;
        let full_name = index_name(entries, index, true, 0);
        let short_name = index_name(entries, index, false, 0);
        for name in [full_name, short_name] {
            match names.entry(name) {
                Entry::Vacant(vacant) => {
                    vacant.insert(index);
                }
                Entry::Occupied(occupied) => {
                    if *occupied.get() != index {
                        log::trace!(
                            "type name {} of type {index} is already taken by type {}",
                            occupied.key(),
                            occupied.get()
                        );
                    }
                }
            }
        }
    }
    names
}

fn index_name(entries: &[RegistryEntry], index: u32, qualified: bool, depth: usize) -> String {
    let entry = match entries.get(index as usize) {
        Some(a) => a,
        None => return format!("#{index}"),
    };
    if depth > NAME_DEPTH_LIMIT {
        return String::from("..");
    }
    if entry.path.is_empty() {
        return descriptor_name(entries, index, &entry.descriptor, depth);
    }
    let mut name = if qualified {
        entry.path.join("::")
    } else {
        entry.path[entry.path.len() - 1].to_string()
    };
    let params: Vec<String> = entry
        .type_params
        .iter()
        .filter_map(|param| param.ty.as_ref())
        .map(|ty| ref_name(entries, ty, depth + 1))
        .collect();
    if !params.is_empty() {
        name.push('<');
        name.push_str(&params.join(", "));
        name.push('>');
    }
    name
}

fn ref_name(entries: &[RegistryEntry], ty: &TypeRef, depth: usize) -> String {
    match ty {
        TypeRef::Index(index) => index_name(entries, *index, false, depth),
        TypeRef::BuiltIn(primitive) => primitive_name(primitive.name()),
    }
}

fn primitive_name(name: &'static str) -> String {
    match name {
        "str" => String::from("String"),
        a => a.to_string(),
    }
}

fn descriptor_name(
    entries: &[RegistryEntry],
    index: u32,
    descriptor: &TypeDescriptor,
    depth: usize,
) -> String {
    match descriptor {
        TypeDescriptor::Primitive(primitive) => primitive_name(primitive.name()),
        TypeDescriptor::Sequence(element) => {
            format!("Vec<{}>", ref_name(entries, element, depth + 1))
        }
        TypeDescriptor::FixedArray { element, len } => {
            format!("[{}; {len}]", ref_name(entries, element, depth + 1))
        }
        TypeDescriptor::Tuple(elements) => {
            let names: Vec<String> = elements
                .iter()
                .map(|element| ref_name(entries, element, depth + 1))
                .collect();
            format!("({})", names.join(", "))
        }
        TypeDescriptor::Option(inner) => {
            format!("Option<{}>", ref_name(entries, inner, depth + 1))
        }
        TypeDescriptor::Compact(inner) => {
            format!("Compact<{}>", ref_name(entries, inner, depth + 1))
        }
        TypeDescriptor::BitSequence { store, order } => {
            format!("BitVec<{}, {}>", store_name(store), order_name(order))
        }
        TypeDescriptor::Struct(_) | TypeDescriptor::Enum(_) => format!("#{index}"),
    }
}

fn store_name(store: &BitStore) -> &'static str {
    match store {
        BitStore::U8 => "u8",
        BitStore::U16 => "u16",
        BitStore::U32 => "u32",
        BitStore::U64 => "u64",
    }
}

fn order_name(order: &BitOrder) -> &'static str {
    match order {
        BitOrder::Lsb0 => "Lsb0",
        BitOrder::Msb0 => "Msb0",
    }
}

/// Skeleton of the value for type `index`.
///
/// Primitives are represented by their names, composites are spelled out.
/// Type that is already being described higher up is represented by its
/// name, so that recursive types produce finite skeletons.
pub(crate) fn describe(entries: &[RegistryEntry], index: u32) -> Value {
    let mut stack = Vec::new();
    describe_index(entries, index, &mut stack)
}

fn describe_ref(entries: &[RegistryEntry], ty: &TypeRef, stack: &mut Vec<u32>) -> Value {
    match ty {
        TypeRef::Index(index) => describe_index(entries, *index, stack),
        TypeRef::BuiltIn(primitive) => Value::String(primitive_name(primitive.name())),
    }
}

fn describe_index(entries: &[RegistryEntry], index: u32, stack: &mut Vec<u32>) -> Value {
    let entry = match entries.get(index as usize) {
        Some(a) => a,
        None => return Value::String(format!("#{index}")),
    };
    if stack.contains(&index) {
        return Value::String(display_name(entries, index));
    }
    stack.push(index);
    let out = match &entry.descriptor {
        TypeDescriptor::Primitive(primitive) => Value::String(primitive_name(primitive.name())),
        TypeDescriptor::Struct(fields) => {
            describe_fields(entries, fields.iter().map(|f| (&f.name, &f.ty)), stack)
        }
        TypeDescriptor::Enum(variants) => {
            let mut map = Map::new();
            for variant in variants.iter() {
                let payload = if variant.fields.is_empty() {
                    Value::Null
                } else {
                    describe_fields(entries, variant.fields.iter().map(|f| (&f.name, &f.ty)), stack)
                };
                map.insert(variant.name.to_string(), payload);
            }
            let mut outer = Map::new();
            outer.insert(String::from("_enum"), Value::Object(map));
            Value::Object(outer)
        }
        TypeDescriptor::Sequence(element) => {
            Value::Array(vec![describe_ref(entries, element, stack)])
        }
        TypeDescriptor::FixedArray { element, len } => {
            let mut map = Map::new();
            map.insert(String::from("_array"), describe_ref(entries, element, stack));
            map.insert(String::from("_len"), Value::from(*len));
            Value::Object(map)
        }
        TypeDescriptor::Tuple(elements) => {
            if elements.is_empty() {
                Value::Null
            } else {
                Value::Array(
                    elements
                        .iter()
                        .map(|element| describe_ref(entries, element, stack))
                        .collect(),
                )
            }
        }
        TypeDescriptor::Option(inner) => {
            let mut map = Map::new();
            map.insert(String::from("_option"), describe_ref(entries, inner, stack));
            Value::Object(map)
        }
        TypeDescriptor::Compact(_) | TypeDescriptor::BitSequence { .. } => {
            Value::String(display_name(entries, index))
        }
    };
    stack.pop();
    out
}

fn describe_fields<'a, I>(entries: &[RegistryEntry], fields: I, stack: &mut Vec<u32>) -> Value
where
    I: ExactSizeIterator<Item = (&'a Option<String>, &'a TypeRef)>,
{
    let fields: Vec<(&Option<String>, &TypeRef)> = fields.collect();
    match fields.as_slice() {
        [] => Value::Null,
        [(None, ty)] => describe_ref(entries, ty, stack),
        [(Some(_), _), ..] => {
            let mut map = Map::new();
            for (name, ty) in fields.iter() {
                let name = name.as_deref().unwrap_or_default().to_string();
                map.insert(name, describe_ref(entries, ty, stack));
            }
            Value::Object(map)
        }
        _ => Value::Array(
            fields
                .iter()
                .map(|(_, ty)| describe_ref(entries, ty, stack))
                .collect(),
        ),
    }
}
