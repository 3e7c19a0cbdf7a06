//! Byte order conversion of value fields.
//!
//! Values are swapped in place, one unit at a time,
//! where the unit width is given by the value representation
//! (see [`VR::value_width`](crate::VR::value_width)).

use byteordered::Endianness;

/// The byte order of the running platform.
pub const NATIVE_ENDIANNESS: Endianness = if cfg!(target_endian = "little") {
    Endianness::Little
} else {
    Endianness::Big
};

/// Reverse the bytes of every `width`-sized unit in `buf`.
///
/// Trailing bytes which do not fill a complete unit are left untouched.
/// Widths of 0 or 1 leave the buffer as is.
pub fn swap_bytes(buf: &mut [u8], width: usize) {
    if width <= 1 {
        return;
    }
    for unit in buf.chunks_exact_mut(width) {
        unit.reverse();
    }
}

/// Convert `buf` from `old_order` to `new_order`
/// if the two byte orders differ.
pub fn swap_if_necessary(new_order: Endianness, old_order: Endianness, buf: &mut [u8], width: usize) {
    if new_order != old_order {
        swap_bytes(buf, width);
    }
}
