//! [`Compact`] search and processing.
//!
//! Compact integers are the SCALE variable-length integers: two lowest bits of
//! the first byte select the length class. Actual encoding and decoding is
//! done by [`parity_scale_codec`], here the compact is only located and cut
//! from the data.
use parity_scale_codec::{Compact, Decode, Encode, HasCompact};

use crate::std::vec::Vec;

/// Failure to get a compact from data.
#[derive(Debug, Eq, PartialEq)]
pub enum CompactError {
    /// Data ended before the compact did.
    Truncated { needed: usize, available: usize },

    /// Data at the position is not a canonical compact for the target type.
    NotCompact,
}

/// Length, in bytes, of the compact starting with `first_byte`.
pub fn compact_length(first_byte: u8) -> usize {
    match first_byte & 0b11 {
        0b00 => 1,
        0b01 => 2,
        0b10 => 4,
        _ => (first_byte >> 2) as usize + 5,
    }
}

/// Compact found in data.
pub struct FoundCompact<T: HasCompact> {
    /// Compact found and decoded.
    pub compact: T,

    /// Position of first data element after the compact part.
    pub start_next_unit: usize,
}

/// Find compact starting at `position`. Does not modify the input.
pub fn find_compact<T>(data: &[u8], position: usize) -> Result<FoundCompact<T>, CompactError>
where
    T: HasCompact,
    Compact<T>: Decode,
{
    let available = data.len().saturating_sub(position);
    let first_byte = match data.get(position) {
        Some(a) => *a,
        None => {
            return Err(CompactError::Truncated {
                needed: 1,
                available,
            })
        }
    };
    let length = compact_length(first_byte);
    match data.get(position..position + length) {
        Some(mut slice) => {
            let compact =
                <Compact<T>>::decode(&mut slice).map_err(|_| CompactError::NotCompact)?;
            Ok(FoundCompact {
                compact: compact.0,
                start_next_unit: position + length,
            })
        }
        None => Err(CompactError::Truncated {
            needed: length,
            available,
        }),
    }
}

/// Find compact at `position` and move `position` past it.
pub(crate) fn get_compact<T>(data: &[u8], position: &mut usize) -> Result<T, CompactError>
where
    T: HasCompact,
    Compact<T>: Decode,
{
    let found_compact = find_compact::<T>(data, *position)?;
    *position = found_compact.start_next_unit;
    Ok(found_compact.compact)
}

/// Append compact encoding of `value` to `out`.
///
/// Compact encoding depends only on the value, not on the integer width.
pub(crate) fn put_compact<T: Into<u128>>(value: T, out: &mut Vec<u8>) {
    Compact::<u128>(value.into()).encode_to(out)
}
