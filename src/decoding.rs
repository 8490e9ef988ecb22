//! Decode SCALE data into JSON values using type descriptors.
//!
//! Data is addressed by `position` on a slice that is never modified.
//! Decoded value shapes mirror the ones accepted by the encoder.
use bitvec::prelude::{BitVec, Lsb0, Msb0};
use num_bigint::{BigInt, BigUint};
use parity_scale_codec::{Compact, Decode, HasCompact};
use serde_json::{Map, Value};

use crate::compacts::{get_compact, CompactError};
use crate::error::CodecError;
use crate::propagated::{PathSegment, Propagated};
use crate::registry::{
    BitOrder, BitStore, FieldDescriptor, Primitive, TypeDescriptor, TypeRef, VariantDescriptor,
};
use crate::settings::CodecSettings;
use crate::std::{string::ToString, vec::Vec};
use crate::traits::{resolve_ref, ResolveType};

/// Decode value of type `ty` starting at `position`, and move `position`
/// past it.
///
/// Data past the decoded value is not checked.
pub fn decode_as_type_at_position<R>(
    ty: &TypeRef,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut propagated = Propagated::new(settings);
    decode_ref(ty, data, position, resolver, &mut propagated)
}

/// Decode value of type `ty` that takes exactly all of `data`.
pub fn decode_all_as_type<R>(
    ty: &TypeRef,
    data: &[u8],
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut position = 0;
    let value = decode_as_type_at_position(ty, data, &mut position, resolver, settings)?;
    check_all_used(position, data)?;
    Ok(value)
}

/// Same as [`decode_as_type_at_position`], for a descriptor that is not
/// necessarily in the registry.
pub fn decode_with_descriptor_at_position<R>(
    descriptor: &TypeDescriptor,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut propagated = Propagated::new(settings);
    propagated.descend(*position)?;
    decode_descriptor(descriptor, data, position, resolver, &mut propagated)
}

/// Same as [`decode_all_as_type`], for a descriptor that is not necessarily
/// in the registry.
pub fn decode_all_with_descriptor<R>(
    descriptor: &TypeDescriptor,
    data: &[u8],
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut position = 0;
    let value =
        decode_with_descriptor_at_position(descriptor, data, &mut position, resolver, settings)?;
    check_all_used(position, data)?;
    Ok(value)
}

fn check_all_used(position: usize, data: &[u8]) -> Result<(), CodecError> {
    if position != data.len() {
        Err(CodecError::TrailingBytes {
            from: position,
            total: data.len(),
        })
    } else {
        Ok(())
    }
}

fn decode_ref<R>(
    ty: &TypeRef,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    propagated.descend(*position)?;
    let descriptor = resolve_ref(ty, resolver)?;
    let value = decode_descriptor(&descriptor, data, position, resolver, propagated)?;
    propagated.ascend();
    Ok(value)
}

fn decode_descriptor<R>(
    descriptor: &TypeDescriptor,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    match descriptor {
        TypeDescriptor::Primitive(primitive) => decode_primitive(primitive, data, position, propagated),
        TypeDescriptor::Struct(fields) => decode_fields(fields, data, position, resolver, propagated),
        TypeDescriptor::Enum(variants) => decode_variant(variants, data, position, resolver, propagated),
        TypeDescriptor::Sequence(element) => {
            let number_of_elements = compact_at::<u32>(data, position, propagated)? as usize;
            if is_byte(element, resolver) {
                let bytes = read_slice(data, position, number_of_elements, propagated)?;
                Ok(Value::String(format!("0x{}", hex::encode(bytes))))
            } else {
                decode_elements(element, number_of_elements, data, position, resolver, propagated)
            }
        }
        TypeDescriptor::FixedArray { element, len } => {
            let len = *len as usize;
            if is_byte(element, resolver) {
                let bytes = read_slice(data, position, len, propagated)?;
                Ok(Value::String(format!("0x{}", hex::encode(bytes))))
            } else {
                decode_elements(element, len, data, position, resolver, propagated)
            }
        }
        TypeDescriptor::Tuple(elements) => {
            if elements.is_empty() {
                return Ok(Value::Null);
            }
            let mut values = Vec::new();
            for (i, element) in elements.iter().enumerate() {
                propagated.enter(PathSegment::Position(i));
                values.push(decode_ref(element, data, position, resolver, propagated)?);
                propagated.leave();
            }
            Ok(Value::Array(values))
        }
        TypeDescriptor::Option(inner) => {
            let tag_position = *position;
            match read_slice(data, position, 1, propagated)?[0] {
                0 => Ok(Value::Null),
                1 => decode_ref(inner, data, position, resolver, propagated),
                tag => Err(CodecError::UnexpectedOptionTag {
                    path: propagated.path(),
                    position: tag_position,
                    tag,
                }),
            }
        }
        TypeDescriptor::Compact(inner) => decode_compact(inner, data, position, resolver, propagated),
        TypeDescriptor::BitSequence { store, order } => {
            decode_bits(store, order, data, position, propagated)
        }
    }
}

/// Cut `len` bytes at `position` and move `position` past them.
fn read_slice<'a>(
    data: &'a [u8],
    position: &mut usize,
    len: usize,
    propagated: &Propagated,
) -> Result<&'a [u8], CodecError> {
    let available = data.len().saturating_sub(*position);
    if available < len {
        return Err(propagated.truncated(*position, len, available));
    }
    let slice = &data[*position..*position + len];
    *position += len;
    Ok(slice)
}

fn compact_at<T>(data: &[u8], position: &mut usize, propagated: &Propagated) -> Result<T, CodecError>
where
    T: HasCompact,
    Compact<T>: Decode,
{
    let start = *position;
    get_compact::<T>(data, position).map_err(|e| match e {
        CompactError::Truncated { needed, available } => {
            propagated.truncated(start, needed, available)
        }
        CompactError::NotCompact => CodecError::NoCompact {
            path: propagated.path(),
            position: start,
        },
    })
}

fn decode_elements<R>(
    element: &TypeRef,
    number_of_elements: usize,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    // element count comes from the data, it is not trusted for allocation
    let start = *position;
    let mut values = Vec::new();
    for i in 0..number_of_elements {
        propagated.enter(PathSegment::Position(i));
        values.push(decode_ref(element, data, position, resolver, propagated)?);
        propagated.leave();
        // all elements are of the same type, so the first one tells the width
        if i == 0
            && *position == start
            && number_of_elements > propagated.settings.max_zero_width_elements
        {
            return Err(CodecError::TooManyElements {
                path: propagated.path(),
                position: start,
                count: number_of_elements,
                limit: propagated.settings.max_zero_width_elements,
            });
        }
    }
    Ok(Value::Array(values))
}

fn decode_fields<R>(
    fields: &[FieldDescriptor],
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    match fields {
        [] => Ok(Value::Null),
        [single] if single.name.is_none() => decode_ref(&single.ty, data, position, resolver, propagated),
        [first, ..] if first.name.is_some() => {
            let mut map = Map::new();
            for field in fields.iter() {
                let name = field.name.as_deref().unwrap_or_default().to_string();
                propagated.enter(PathSegment::Field(name.to_string()));
                let value = decode_ref(&field.ty, data, position, resolver, propagated)?;
                propagated.leave();
                map.insert(name, value);
            }
            Ok(Value::Object(map))
        }
        _ => {
            let mut values = Vec::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                propagated.enter(PathSegment::Position(i));
                values.push(decode_ref(&field.ty, data, position, resolver, propagated)?);
                propagated.leave();
            }
            Ok(Value::Array(values))
        }
    }
}

fn decode_variant<R>(
    variants: &[VariantDescriptor],
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    let index_position = *position;
    let index = read_slice(data, position, 1, propagated)?[0];
    let variant = match variants.iter().find(|variant| variant.index == index) {
        Some(a) => a,
        None => {
            return Err(CodecError::UnexpectedEnumVariant {
                path: propagated.path(),
                position: index_position,
                index,
            })
        }
    };
    if variant.fields.is_empty() {
        return Ok(Value::String(variant.name.to_string()));
    }
    propagated.enter(PathSegment::Variant(variant.name.to_string()));
    let payload = decode_fields(&variant.fields, data, position, resolver, propagated)?;
    propagated.leave();
    let mut map = Map::new();
    map.insert(variant.name.to_string(), payload);
    Ok(Value::Object(map))
}

fn decode_compact<R>(
    inner: &TypeRef,
    data: &[u8],
    position: &mut usize,
    resolver: &R,
    propagated: &mut Propagated,
) -> Result<Value, CodecError>
where
    R: ResolveType + ?Sized,
{
    propagated.descend(*position)?;
    let descriptor = resolve_ref(inner, resolver)?;
    let value = match descriptor.as_ref() {
        TypeDescriptor::Primitive(primitive) => match primitive {
            Primitive::U8 => Value::from(compact_at::<u8>(data, position, propagated)?),
            Primitive::U16 => Value::from(compact_at::<u16>(data, position, propagated)?),
            Primitive::U32 => Value::from(compact_at::<u32>(data, position, propagated)?),
            Primitive::U64 => Value::from(compact_at::<u64>(data, position, propagated)?),
            Primitive::U128 => u128_value(compact_at::<u128>(data, position, propagated)?),
            _ => {
                return Err(CodecError::UnexpectedCompactInsides {
                    path: propagated.path(),
                })
            }
        },
        TypeDescriptor::Struct(fields) if fields.len() == 1 => {
            let inner_value = decode_compact(&fields[0].ty, data, position, resolver, propagated)?;
            match fields[0].name {
                Some(ref name) => {
                    let mut map = Map::new();
                    map.insert(name.to_string(), inner_value);
                    Value::Object(map)
                }
                None => inner_value,
            }
        }
        _ => {
            return Err(CodecError::UnexpectedCompactInsides {
                path: propagated.path(),
            })
        }
    };
    propagated.ascend();
    Ok(value)
}

/// Fits into JSON number or goes as decimal string.
fn u128_value(number: u128) -> Value {
    match u64::try_from(number) {
        Ok(a) => Value::from(a),
        Err(_) => Value::String(number.to_string()),
    }
}

fn i128_value(number: i128) -> Value {
    match i64::try_from(number) {
        Ok(a) => Value::from(a),
        Err(_) => Value::String(number.to_string()),
    }
}

macro_rules! decode_le {
    ($ty: ty, $data: expr, $position: expr, $propagated: expr) => {{
        let mut buffer = [0u8; core::mem::size_of::<$ty>()];
        buffer.copy_from_slice(read_slice(
            $data,
            $position,
            core::mem::size_of::<$ty>(),
            $propagated,
        )?);
        <$ty>::from_le_bytes(buffer)
    }};
}

fn decode_primitive(
    primitive: &Primitive,
    data: &[u8],
    position: &mut usize,
    propagated: &Propagated,
) -> Result<Value, CodecError> {
    let value = match primitive {
        Primitive::Bool => {
            let bool_position = *position;
            match read_slice(data, position, 1, propagated)?[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                byte => {
                    return Err(CodecError::InvalidBool {
                        path: propagated.path(),
                        position: bool_position,
                        byte,
                    })
                }
            }
        }
        Primitive::Char => {
            let char_position = *position;
            let code = decode_le!(u32, data, position, propagated);
            match char::from_u32(code) {
                Some(ch) => Value::String(ch.to_string()),
                None => {
                    return Err(CodecError::InvalidChar {
                        path: propagated.path(),
                        position: char_position,
                    })
                }
            }
        }
        Primitive::Str => {
            let start = *position;
            let len = compact_at::<u32>(data, position, propagated)? as usize;
            let bytes = read_slice(data, position, len, propagated)?;
            match core::str::from_utf8(bytes) {
                Ok(text) => Value::String(text.to_string()),
                Err(_) => {
                    return Err(CodecError::InvalidUtf8 {
                        path: propagated.path(),
                        position: start,
                    })
                }
            }
        }
        Primitive::U8 => Value::from(decode_le!(u8, data, position, propagated)),
        Primitive::U16 => Value::from(decode_le!(u16, data, position, propagated)),
        Primitive::U32 => Value::from(decode_le!(u32, data, position, propagated)),
        Primitive::U64 => Value::from(decode_le!(u64, data, position, propagated)),
        Primitive::U128 => u128_value(decode_le!(u128, data, position, propagated)),
        Primitive::U256 => {
            let bytes = read_slice(data, position, 32, propagated)?;
            if bytes[8..].iter().all(|b| *b == 0) {
                let mut low = [0u8; 8];
                low.copy_from_slice(&bytes[..8]);
                Value::from(u64::from_le_bytes(low))
            } else {
                Value::String(BigUint::from_bytes_le(bytes).to_string())
            }
        }
        Primitive::I8 => Value::from(decode_le!(i8, data, position, propagated)),
        Primitive::I16 => Value::from(decode_le!(i16, data, position, propagated)),
        Primitive::I32 => Value::from(decode_le!(i32, data, position, propagated)),
        Primitive::I64 => Value::from(decode_le!(i64, data, position, propagated)),
        Primitive::I128 => i128_value(decode_le!(i128, data, position, propagated)),
        Primitive::I256 => {
            let bytes = read_slice(data, position, 32, propagated)?;
            let big = BigInt::from_signed_bytes_le(bytes);
            match i64::try_from(&big) {
                Ok(a) => Value::from(a),
                Err(_) => Value::String(big.to_string()),
            }
        }
    };
    Ok(value)
}

fn is_byte<R>(ty: &TypeRef, resolver: &R) -> bool
where
    R: ResolveType + ?Sized,
{
    match ty {
        TypeRef::BuiltIn(primitive) => *primitive == Primitive::U8,
        TypeRef::Index(index) => matches!(
            resolver.resolve_ty(*index),
            Ok(TypeDescriptor::Primitive(Primitive::U8))
        ),
    }
}

macro_rules! decode_bitvec {
    ($bits_data: expr, $store: expr, $order: expr, $(($store_variant: ident, $order_variant: ident, $store_ty: ty, $order_ty: ty)),*) => {
        match ($store, $order) {
            $(
                (BitStore::$store_variant, BitOrder::$order_variant) => {
                    <BitVec<$store_ty, $order_ty>>::decode(&mut &$bits_data[..])
                        .map(|bits| bits.iter().by_vals().map(Value::Bool).collect::<Vec<Value>>())
                }
            )*
        }
    }
}

fn decode_bits(
    store: &BitStore,
    order: &BitOrder,
    data: &[u8],
    position: &mut usize,
    propagated: &Propagated,
) -> Result<Value, CodecError> {
    let start = *position;
    let bit_length = compact_at::<u32>(data, position, propagated)? as usize;
    let store_bits = match store {
        BitStore::U8 => 8,
        BitStore::U16 => 16,
        BitStore::U32 => 32,
        BitStore::U64 => 64,
    };
    let byte_length = (bit_length + store_bits - 1) / store_bits * (store_bits / 8);
    read_slice(data, position, byte_length, propagated)?;
    let bits_data = &data[start..*position];
    let bits = decode_bitvec!(
        bits_data,
        store,
        order,
        (U8, Lsb0, u8, Lsb0),
        (U8, Msb0, u8, Msb0),
        (U16, Lsb0, u16, Lsb0),
        (U16, Msb0, u16, Msb0),
        (U32, Lsb0, u32, Lsb0),
        (U32, Msb0, u32, Msb0),
        (U64, Lsb0, u64, Lsb0),
        (U64, Msb0, u64, Msb0)
    )
    .map_err(|_| CodecError::NoCompact {
        path: propagated.path(),
        position: start,
    })?;
    Ok(Value::Array(bits))
}
