//! Encode JSON values into SCALE using type descriptors.
//!
//! Encoding walks the descriptor and the value side by side. Value shape
//! must match the descriptor, see crate docs for the accepted forms.
use bitvec::prelude::{BitVec, Lsb0, Msb0};
use num_bigint::{BigInt, BigUint, Sign};
use parity_scale_codec::Encode;
use serde_json::{Map, Number, Value};

use crate::compacts::put_compact;
use crate::error::CodecError;
use crate::propagated::{PathSegment, Propagated};
use crate::registry::{
    BitOrder, BitStore, FieldDescriptor, Primitive, TypeDescriptor, TypeRef, VariantDescriptor,
};
use crate::settings::CodecSettings;
use crate::std::{
    string::{String, ToString},
    vec::Vec,
};
use crate::traits::{resolve_ref, ResolveType};
use crate::unhex;

/// Encode `value` as type `ty`.
pub fn encode_with_type<R>(
    value: &Value,
    ty: &TypeRef,
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Vec<u8>, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut out = Vec::new();
    let mut propagated = Propagated::new(settings);
    encode_ref(value, ty, resolver, &mut out, &mut propagated)?;
    Ok(out)
}

/// Encode `value` with a descriptor that is not necessarily in the
/// registry, such as a built-in one.
pub fn encode_with_descriptor<R>(
    value: &Value,
    descriptor: &TypeDescriptor,
    resolver: &R,
    settings: &CodecSettings,
) -> Result<Vec<u8>, CodecError>
where
    R: ResolveType + ?Sized,
{
    let mut out = Vec::new();
    let mut propagated = Propagated::new(settings);
    propagated.descend(out.len())?;
    encode_descriptor(value, descriptor, resolver, &mut out, &mut propagated)?;
    Ok(out)
}

fn encode_ref<R>(
    value: &Value,
    ty: &TypeRef,
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    propagated.descend(out.len())?;
    let descriptor = resolve_ref(ty, resolver)?;
    encode_descriptor(value, &descriptor, resolver, out, propagated)?;
    propagated.ascend();
    Ok(())
}

fn encode_descriptor<R>(
    value: &Value,
    descriptor: &TypeDescriptor,
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    match descriptor {
        TypeDescriptor::Primitive(primitive) => encode_primitive(value, primitive, out, propagated),
        TypeDescriptor::Struct(fields) => encode_fields(value, fields, resolver, out, propagated),
        TypeDescriptor::Enum(variants) => encode_variant(value, variants, resolver, out, propagated),
        TypeDescriptor::Sequence(element) => {
            if is_byte(element, resolver) {
                if let Some(bytes) = byte_string(value, true, propagated)? {
                    put_compact(bytes.len() as u32, out);
                    out.extend_from_slice(&bytes);
                    return Ok(());
                }
            }
            match value {
                Value::Array(elements) => {
                    put_compact(elements.len() as u32, out);
                    encode_elements(elements, element, resolver, out, propagated)
                }
                _ => Err(propagated.mismatch("array", value)),
            }
        }
        TypeDescriptor::FixedArray { element, len } => {
            let len = *len as usize;
            if is_byte(element, resolver) {
                if let Some(bytes) = byte_string(value, false, propagated)? {
                    if bytes.len() != len {
                        return Err(propagated.mismatch(&format!("{len} bytes"), value));
                    }
                    out.extend_from_slice(&bytes);
                    return Ok(());
                }
            }
            match value {
                Value::Array(elements) if elements.len() == len => {
                    encode_elements(elements, element, resolver, out, propagated)
                }
                _ => Err(propagated.mismatch(&format!("array of {len} elements"), value)),
            }
        }
        TypeDescriptor::Tuple(elements) => match value {
            Value::Null if elements.is_empty() => Ok(()),
            Value::Array(values) if values.len() == elements.len() => {
                for (i, (value, element)) in values.iter().zip(elements.iter()).enumerate() {
                    propagated.enter(PathSegment::Position(i));
                    encode_ref(value, element, resolver, out, propagated)?;
                    propagated.leave();
                }
                Ok(())
            }
            _ => Err(propagated.mismatch(&format!("tuple of {} elements", elements.len()), value)),
        },
        TypeDescriptor::Option(inner) => match value {
            Value::Null => {
                out.push(0);
                Ok(())
            }
            _ => {
                out.push(1);
                encode_ref(value, inner, resolver, out, propagated)
            }
        },
        TypeDescriptor::Compact(inner) => encode_compact(value, inner, resolver, out, propagated),
        TypeDescriptor::BitSequence { store, order } => {
            encode_bits(value, store, order, out, propagated)
        }
    }
}

fn encode_elements<R>(
    values: &[Value],
    element: &TypeRef,
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    for (i, value) in values.iter().enumerate() {
        propagated.enter(PathSegment::Position(i));
        encode_ref(value, element, resolver, out, propagated)?;
        propagated.leave();
    }
    Ok(())
}

/// Fields of a struct or of an enum variant.
///
/// Named fields come as an object, single unnamed field comes as is, several
/// unnamed fields come as an array.
fn encode_fields<R>(
    value: &Value,
    fields: &[FieldDescriptor],
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    match fields {
        [] => match value {
            Value::Null => Ok(()),
            Value::Array(a) if a.is_empty() => Ok(()),
            Value::Object(a) if a.is_empty() => Ok(()),
            _ => Err(propagated.mismatch("null", value)),
        },
        [single] if single.name.is_none() => encode_ref(value, &single.ty, resolver, out, propagated),
        [first, ..] if first.name.is_some() => match value {
            Value::Object(map) => encode_named_fields(map, fields, resolver, out, propagated),
            _ => Err(propagated.mismatch("object", value)),
        },
        _ => match value {
            Value::Array(values) if values.len() == fields.len() => {
                for (i, (value, field)) in values.iter().zip(fields.iter()).enumerate() {
                    propagated.enter(PathSegment::Position(i));
                    encode_ref(value, &field.ty, resolver, out, propagated)?;
                    propagated.leave();
                }
                Ok(())
            }
            _ => Err(propagated.mismatch(&format!("array of {} elements", fields.len()), value)),
        },
    }
}

fn encode_named_fields<R>(
    map: &Map<String, Value>,
    fields: &[FieldDescriptor],
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    if propagated.settings.reject_unknown_fields {
        for (key, value) in map.iter() {
            if !fields.iter().any(|field| field.name.as_deref() == Some(key.as_str())) {
                propagated.enter(PathSegment::Field(key.to_string()));
                return Err(propagated.mismatch("no value, struct has no such field", value));
            }
        }
    }
    for field in fields.iter() {
        let name = field.name.as_deref().unwrap_or_default();
        propagated.enter(PathSegment::Field(name.to_string()));
        match map.get(name) {
            Some(value) => encode_ref(value, &field.ty, resolver, out, propagated)?,
            None => {
                return Err(CodecError::TypeMismatch {
                    path: propagated.path(),
                    expected: field_expectation(field),
                    found: "nothing",
                })
            }
        }
        propagated.leave();
    }
    Ok(())
}

fn field_expectation(field: &FieldDescriptor) -> String {
    match field.type_name {
        Some(ref type_name) => format!("value of type {type_name}"),
        None => String::from("value"),
    }
}

/// Enum variant comes either as a variant name, or as a single-key object
/// `{"Name": payload}`.
fn encode_variant<R>(
    value: &Value,
    variants: &[VariantDescriptor],
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    let (name, payload) = match value {
        Value::String(name) => (name.as_str(), &Value::Null),
        Value::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((name, payload)) => (name.as_str(), payload),
            None => return Err(propagated.mismatch("enum variant", value)),
        },
        _ => return Err(propagated.mismatch("enum variant", value)),
    };
    let variant = match variants.iter().find(|variant| variant.name == name) {
        Some(a) => a,
        None => {
            let names: Vec<&str> = variants.iter().map(|variant| variant.name.as_str()).collect();
            return Err(CodecError::TypeMismatch {
                path: propagated.path(),
                expected: format!("one of variants [{}]", names.join(", ")),
                found: "unknown variant",
            });
        }
    };
    out.push(variant.index);
    propagated.enter(PathSegment::Variant(variant.name.to_string()));
    encode_fields(payload, &variant.fields, resolver, out, propagated)?;
    propagated.leave();
    Ok(())
}

/// Compact is allowed for unsigned integers and for single-field structs
/// with compactable field.
fn encode_compact<R>(
    value: &Value,
    inner: &TypeRef,
    resolver: &R,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError>
where
    R: ResolveType + ?Sized,
{
    propagated.descend(out.len())?;
    let descriptor = resolve_ref(inner, resolver)?;
    match descriptor.as_ref() {
        TypeDescriptor::Primitive(primitive) => match primitive {
            Primitive::U8 => put_compact(unsigned(value, u8::MAX as u128, "u8", propagated)? as u8, out),
            Primitive::U16 => put_compact(unsigned(value, u16::MAX as u128, "u16", propagated)? as u16, out),
            Primitive::U32 => put_compact(unsigned(value, u32::MAX as u128, "u32", propagated)? as u32, out),
            Primitive::U64 => put_compact(unsigned(value, u64::MAX as u128, "u64", propagated)? as u64, out),
            Primitive::U128 => put_compact(unsigned(value, u128::MAX, "u128", propagated)?, out),
            _ => {
                return Err(CodecError::UnexpectedCompactInsides {
                    path: propagated.path(),
                })
            }
        },
        TypeDescriptor::Struct(fields) if fields.len() == 1 => match fields[0].name {
            Some(ref name) => match value {
                Value::Object(map) if map.len() == 1 && map.contains_key(name) => {
                    propagated.enter(PathSegment::Field(name.to_string()));
                    encode_compact(&map[name], &fields[0].ty, resolver, out, propagated)?;
                    propagated.leave();
                }
                _ => return Err(propagated.mismatch(&format!("object with field {name}"), value)),
            },
            None => encode_compact(value, &fields[0].ty, resolver, out, propagated)?,
        },
        _ => {
            return Err(CodecError::UnexpectedCompactInsides {
                path: propagated.path(),
            })
        }
    }
    propagated.ascend();
    Ok(())
}

fn encode_primitive(
    value: &Value,
    primitive: &Primitive,
    out: &mut Vec<u8>,
    propagated: &Propagated,
) -> Result<(), CodecError> {
    match primitive {
        Primitive::Bool => match value {
            Value::Bool(b) => b.encode_to(out),
            _ => return Err(propagated.mismatch("bool", value)),
        },
        Primitive::Char => {
            let mut chars = match value {
                Value::String(text) => text.chars(),
                _ => return Err(propagated.mismatch("char", value)),
            };
            match (chars.next(), chars.next()) {
                (Some(ch), None) => (ch as u32).encode_to(out),
                _ => return Err(propagated.mismatch("single character", value)),
            }
        }
        Primitive::Str => match value {
            Value::String(text) => text.encode_to(out),
            _ => return Err(propagated.mismatch("string", value)),
        },
        Primitive::U8 => (unsigned(value, u8::MAX as u128, "u8", propagated)? as u8).encode_to(out),
        Primitive::U16 => (unsigned(value, u16::MAX as u128, "u16", propagated)? as u16).encode_to(out),
        Primitive::U32 => (unsigned(value, u32::MAX as u128, "u32", propagated)? as u32).encode_to(out),
        Primitive::U64 => (unsigned(value, u64::MAX as u128, "u64", propagated)? as u64).encode_to(out),
        Primitive::U128 => unsigned(value, u128::MAX, "u128", propagated)?.encode_to(out),
        Primitive::U256 => {
            let big = big_unsigned(value, "u256", propagated)?;
            let mut bytes = big.to_bytes_le();
            if bytes.len() > 32 {
                return Err(out_of_range(value, "u256", propagated));
            }
            bytes.resize(32, 0);
            out.extend_from_slice(&bytes);
        }
        Primitive::I8 => (signed(value, i8::MIN as i128, i8::MAX as i128, "i8", propagated)? as i8).encode_to(out),
        Primitive::I16 => (signed(value, i16::MIN as i128, i16::MAX as i128, "i16", propagated)? as i16).encode_to(out),
        Primitive::I32 => (signed(value, i32::MIN as i128, i32::MAX as i128, "i32", propagated)? as i32).encode_to(out),
        Primitive::I64 => (signed(value, i64::MIN as i128, i64::MAX as i128, "i64", propagated)? as i64).encode_to(out),
        Primitive::I128 => signed(value, i128::MIN, i128::MAX, "i128", propagated)?.encode_to(out),
        Primitive::I256 => {
            let big = big_signed(value, "i256", propagated)?;
            let mut bytes = big.to_signed_bytes_le();
            if bytes.len() > 32 {
                return Err(out_of_range(value, "i256", propagated));
            }
            let filler = if big.sign() == Sign::Minus { 0xff } else { 0 };
            bytes.resize(32, filler);
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

fn out_of_range(value: &Value, ty: &'static str, propagated: &Propagated) -> CodecError {
    let value = match value {
        Value::String(text) => text.to_string(),
        a => a.to_string(),
    };
    CodecError::NumberOutOfRange {
        path: propagated.path(),
        ty,
        value,
    }
}

/// Number from text: decimal, or big endian hexadecimal with `0x` prefix.
fn parse_big_unsigned(text: &str) -> Option<BigUint> {
    let text = text.trim();
    match text.strip_prefix("0x") {
        Some(hex_digits) if !hex_digits.is_empty() => BigUint::parse_bytes(hex_digits.as_bytes(), 16),
        Some(_) => None,
        None if text.bytes().all(|b| b.is_ascii_digit()) && !text.is_empty() => {
            BigUint::parse_bytes(text.as_bytes(), 10)
        }
        None => None,
    }
}

fn parse_big_signed(text: &str) -> Option<BigInt> {
    let text = text.trim();
    match text.strip_prefix('-') {
        Some(magnitude) => parse_big_unsigned(magnitude)
            .filter(|_| !magnitude.starts_with("0x"))
            .map(|magnitude| BigInt::from_biguint(Sign::Minus, magnitude)),
        None => parse_big_unsigned(text).map(BigInt::from),
    }
}

fn big_unsigned(value: &Value, ty: &'static str, propagated: &Propagated) -> Result<BigUint, CodecError> {
    match value {
        Value::Number(number) => match number.as_u64() {
            Some(a) => Ok(BigUint::from(a)),
            None => Err(number_error(number, value, ty, propagated)),
        },
        Value::String(text) => match parse_big_unsigned(text) {
            Some(a) => Ok(a),
            None => match parse_big_signed(text) {
                Some(_) => Err(out_of_range(value, ty, propagated)),
                None => Err(propagated.mismatch(ty, value)),
            },
        },
        _ => Err(propagated.mismatch(ty, value)),
    }
}

fn big_signed(value: &Value, ty: &'static str, propagated: &Propagated) -> Result<BigInt, CodecError> {
    match value {
        Value::Number(number) => match (number.as_i64(), number.as_u64()) {
            (Some(a), _) => Ok(BigInt::from(a)),
            (None, Some(a)) => Ok(BigInt::from(a)),
            (None, None) => Err(propagated.mismatch(ty, value)),
        },
        Value::String(text) => match parse_big_signed(text) {
            Some(a) => Ok(a),
            None => Err(propagated.mismatch(ty, value)),
        },
        _ => Err(propagated.mismatch(ty, value)),
    }
}

/// Non-integer numbers are a mismatch, negative integers are out of range.
fn number_error(number: &Number, value: &Value, ty: &'static str, propagated: &Propagated) -> CodecError {
    if number.as_i64().is_some() {
        out_of_range(value, ty, propagated)
    } else {
        propagated.mismatch(ty, value)
    }
}

fn unsigned(value: &Value, max: u128, ty: &'static str, propagated: &Propagated) -> Result<u128, CodecError> {
    let number = match value {
        Value::Number(number) => match number.as_u64() {
            Some(a) => a as u128,
            None => return Err(number_error(number, value, ty, propagated)),
        },
        _ => {
            let big = big_unsigned(value, ty, propagated)?;
            match big_to_u128(&big) {
                Some(a) => a,
                None => return Err(out_of_range(value, ty, propagated)),
            }
        }
    };
    if number > max {
        Err(out_of_range(value, ty, propagated))
    } else {
        Ok(number)
    }
}

fn signed(value: &Value, min: i128, max: i128, ty: &'static str, propagated: &Propagated) -> Result<i128, CodecError> {
    let big = big_signed(value, ty, propagated)?;
    match big_to_i128(&big) {
        Some(number) if number >= min && number <= max => Ok(number),
        _ => Err(out_of_range(value, ty, propagated)),
    }
}

fn big_to_u128(big: &BigUint) -> Option<u128> {
    let bytes = big.to_bytes_le();
    if bytes.len() > 16 {
        return None;
    }
    let mut buffer = [0u8; 16];
    buffer[..bytes.len()].copy_from_slice(&bytes);
    Some(u128::from_le_bytes(buffer))
}

fn big_to_i128(big: &BigInt) -> Option<i128> {
    let bytes = big.to_signed_bytes_le();
    if bytes.len() > 16 {
        return None;
    }
    let filler = if big.sign() == Sign::Minus { 0xff } else { 0 };
    let mut buffer = [filler; 16];
    buffer[..bytes.len()].copy_from_slice(&bytes);
    Some(i128::from_le_bytes(buffer))
}

/// Whether `ty` is `u8`, so the sequence of it could come as hex.
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

/// Bytes given as a string: `0x`-prefixed hex, or, if `text_allowed`, plain
/// text taken as utf8 bytes. `None` if the value is not a string at all.
fn byte_string(
    value: &Value,
    text_allowed: bool,
    propagated: &Propagated,
) -> Result<Option<Vec<u8>>, CodecError> {
    match value {
        Value::String(text) if text.starts_with("0x") => match unhex(text) {
            Some(bytes) => Ok(Some(bytes)),
            None => Err(CodecError::InvalidHex {
                path: propagated.path(),
            }),
        },
        Value::String(text) if text_allowed => Ok(Some(text.as_bytes().to_vec())),
        _ => Ok(None),
    }
}

macro_rules! encode_bitvec {
    ($bits: expr, $out: expr, $store: expr, $order: expr, $(($store_variant: ident, $order_variant: ident, $store_ty: ty, $order_ty: ty)),*) => {
        match ($store, $order) {
            $(
                (BitStore::$store_variant, BitOrder::$order_variant) => {
                    $bits.iter().copied().collect::<BitVec<$store_ty, $order_ty>>().encode_to($out)
                }
            )*
        }
    }
}

fn encode_bits(
    value: &Value,
    store: &BitStore,
    order: &BitOrder,
    out: &mut Vec<u8>,
    propagated: &mut Propagated,
) -> Result<(), CodecError> {
    let values = match value {
        Value::Array(values) => values,
        _ => return Err(propagated.mismatch("array of bools", value)),
    };
    let mut bits: Vec<bool> = Vec::with_capacity(values.len());
    for (i, bit) in values.iter().enumerate() {
        match bit {
            Value::Bool(b) => bits.push(*b),
            _ => {
                propagated.enter(PathSegment::Position(i));
                return Err(propagated.mismatch("bool", bit));
            }
        }
    }
    encode_bitvec!(
        bits,
        out,
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
    );
    Ok(())
}
