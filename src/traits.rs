//! Seams between the codec and the type tables and buffers it works with.
use parity_scale_codec::{Error as ScaleError, Input};

use crate::error::{MalformedRegistry, MetadataError, RegistryError};
use crate::registry::{TypeDescriptor, TypeRef, TypeRegistry};
use crate::std::{borrow::Cow, string::ToString};

/// Anything that can look up a [`TypeDescriptor`] by its registry index.
///
/// Codec walks the descriptors only through this trait, so that payloads
/// built exclusively from built-in types could be processed with no registry
/// at all (`()` resolver).
pub trait ResolveType {
    fn resolve_ty(&self, index: u32) -> Result<&TypeDescriptor, RegistryError>;
}

impl ResolveType for TypeRegistry {
    fn resolve_ty(&self, index: u32) -> Result<&TypeDescriptor, RegistryError> {
        self.resolve_by_index(index)
    }
}

impl ResolveType for () {
    fn resolve_ty(&self, index: u32) -> Result<&TypeDescriptor, RegistryError> {
        Err(RegistryError::UnknownTypeIndex { index, len: 0 })
    }
}

impl<R: ResolveType + ?Sized> ResolveType for &R {
    fn resolve_ty(&self, index: u32) -> Result<&TypeDescriptor, RegistryError> {
        (**self).resolve_ty(index)
    }
}

/// Descriptor behind a [`TypeRef`]. Built-in primitives need no lookup.
pub(crate) fn resolve_ref<'r, R>(
    ty: &TypeRef,
    resolver: &'r R,
) -> Result<Cow<'r, TypeDescriptor>, RegistryError>
where
    R: ResolveType + ?Sized,
{
    match ty {
        TypeRef::Index(index) => resolver.resolve_ty(*index).map(Cow::Borrowed),
        TypeRef::BuiltIn(primitive) => Ok(Cow::Owned(TypeDescriptor::Primitive(*primitive))),
    }
}

/// [`Input`] over a byte slice that remembers how far the decoding went and
/// whether it failed because the data ran out.
pub(crate) struct TrackedInput<'a> {
    data: &'a [u8],
    position: usize,
    exhausted: bool,
}

impl<'a> TrackedInput<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            exhausted: false,
        }
    }

    /// Number of bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn registry_error(&self, scale_error: ScaleError) -> MalformedRegistry {
        if self.exhausted {
            MalformedRegistry::PrematureEnd {
                position: self.position,
            }
        } else {
            MalformedRegistry::InvalidEncoding {
                position: self.position,
                reason: scale_error.to_string(),
            }
        }
    }

    pub(crate) fn metadata_error(&self) -> MetadataError {
        MetadataError::Undecodable {
            position: self.position,
            premature: self.exhausted,
        }
    }
}

impl Input for TrackedInput<'_> {
    // Unknown length makes the decoder try to read, so that a short input
    // is always noticed as such.
    fn remaining_len(&mut self) -> Result<Option<usize>, ScaleError> {
        Ok(None)
    }

    fn read(&mut self, into: &mut [u8]) -> Result<(), ScaleError> {
        match self.data.get(self.position..self.position + into.len()) {
            Some(slice) => {
                into.copy_from_slice(slice);
                self.position += into.len();
                Ok(())
            }
            None => {
                self.exhausted = true;
                Err("Not enough data to fill buffer".into())
            }
        }
    }
}
