//! Codec configuration.

/// Settings applied to every encoding and decoding call.
///
/// Settings are not checked against the registry in any way, these are
/// caller preferences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CodecSettings {
    /// Maximum number of nested type descents in a row that process no data.
    ///
    /// Reached by the types that refer to themselves without consuming any
    /// data on the way, e.g. `struct A(Box<A>)`.
    pub max_depth: usize,

    /// Maximum number of nested type descents overall.
    ///
    /// Guards the call stack against deeply nested data, e.g. long recursive
    /// lists, which are valid but nest one descent per node.
    pub max_nesting: usize,

    /// Maximum number of elements in a sequence or an array of a type that
    /// takes no bytes at all, e.g. `Vec<()>`.
    ///
    /// Element count of such sequence is not bounded by the data length.
    pub max_zero_width_elements: usize,

    /// Reject objects that have keys not matching any struct field.
    pub reject_unknown_fields: bool,
}

impl CodecSettings {
    pub const DEFAULT_MAX_DEPTH: usize = 256;
    pub const DEFAULT_MAX_NESTING: usize = 1024;
    pub const DEFAULT_MAX_ZERO_WIDTH_ELEMENTS: usize = 65536;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_nesting: Self::DEFAULT_MAX_NESTING,
            max_zero_width_elements: Self::DEFAULT_MAX_ZERO_WIDTH_ELEMENTS,
            reject_unknown_fields: true,
        }
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self::new()
    }
}
