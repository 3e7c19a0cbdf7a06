//! Value access by value representation.
//!
//! Each accessor is legal only for the value representations
//! holding values of its type,
//! and fails with [`IllegalCall`](crate::Error::IllegalCall) otherwise.
//! Binary values are exchanged in native byte order.

use super::DicomElement;
use crate::error::{IllegalCallSnafu, InvalidValueSnafu, Result};
use crate::object::DicomObject;
use byteordered::byteorder::{ByteOrder, NativeEndian};
use dicom_stream_core::swap::NATIVE_ENDIANNESS;
use dicom_stream_core::{Tag, VR};
use itertools::Itertools;
use snafu::{ensure, OptionExt};
use std::str::FromStr;

/// The value multiplicity of the element.
pub(crate) fn vm(elem: &mut DicomElement) -> Result<u32> {
    if elem.len_field() == 0 {
        return Ok(0);
    }
    let vr = elem.vr();
    match vr {
        vr if vr.is_multi_valued_string() => {
            let value = elem.get_value(NATIVE_ENDIANNESS)?;
            let value = trim_padding(value, vr);
            if value.is_empty() {
                Ok(0)
            } else {
                Ok(value.iter().filter(|b| **b == b'\\').count() as u32 + 1)
            }
        }
        vr if vr.is_string() => Ok(1),
        VR::AT => Ok(elem.len_field() / 4),
        VR::US | VR::SS | VR::UL | VR::SL | VR::FL | VR::FD | VR::SV | VR::UV => {
            Ok(elem.len_field() / vr.value_width() as u32)
        }
        _ => Ok(1),
    }
}

fn trim_padding(value: &[u8], vr: VR) -> &[u8] {
    let end = value
        .iter()
        .rposition(|b| *b != b'\0' && (vr == VR::UI || *b != b' '))
        .map_or(0, |p| p + 1);
    &value[..end]
}

fn normalize(value: &str, vr: VR) -> &str {
    let value = value.trim_end_matches(['\0', ' ']);
    match vr {
        // leading spaces are significant in text
        VR::LT | VR::ST | VR::UT | VR::UR => value,
        _ => value.trim_start_matches(' '),
    }
}

fn not_supported() -> IllegalCallSnafu<&'static str> {
    IllegalCallSnafu {
        reason: "operation not supported by this value representation",
    }
}

macro_rules! numeric_access {
    (
        $ty:ty, $width:expr, [$($vr:ident),+],
        $read_into:ident, $write_into:ident,
        $get_all:ident, $get_one:ident, $put_all:ident, $put_one:ident
    ) => {
        #[doc = concat!("All `", stringify!($ty), "` values of the element.")]
        pub fn $get_all(&mut self) -> Result<Vec<$ty>> {
            ensure!(matches!(self.vr(), $(VR::$vr)|+), not_supported());
            let bytes = self.get_value(NATIVE_ENDIANNESS)?;
            let mut values = vec![<$ty>::default(); bytes.len() / $width];
            NativeEndian::$read_into(&bytes[..values.len() * $width], &mut values);
            Ok(values)
        }

        #[doc = concat!("The `", stringify!($ty), "` value at the given position.")]
        pub fn $get_one(&mut self, pos: usize) -> Result<$ty> {
            self.$get_all()?
                .get(pos)
                .copied()
                .context(IllegalCallSnafu {
                    reason: "value position out of range",
                })
        }

        #[doc = concat!("Replace the value with the given `", stringify!($ty), "` values.")]
        pub fn $put_all(&mut self, values: &[$ty]) -> Result<()> {
            ensure!(matches!(self.vr(), $(VR::$vr)|+), not_supported());
            let mut bytes = vec![0; values.len() * $width];
            NativeEndian::$write_into(values, &mut bytes);
            self.put_value(&bytes)
        }

        #[doc = concat!("Replace the `", stringify!($ty), "` value at the given position,")]
        /// or append it if the position is the current number of values.
        pub fn $put_one(&mut self, value: $ty, pos: u32) -> Result<()> {
            ensure!(matches!(self.vr(), $(VR::$vr)|+), not_supported());
            let position = pos.checked_mul($width).context(IllegalCallSnafu {
                reason: "value position out of range",
            })?;
            self.change_value(&value.to_ne_bytes(), position)
        }
    };
}

impl DicomElement {
    numeric_access!(
        u16, 2, [US, OW], read_u16_into, write_u16_into,
        get_u16_array, get_u16, put_u16_array, put_u16
    );
    numeric_access!(
        i16, 2, [SS], read_i16_into, write_i16_into,
        get_i16_array, get_i16, put_i16_array, put_i16
    );
    numeric_access!(
        u32, 4, [UL, OL], read_u32_into, write_u32_into,
        get_u32_array, get_u32, put_u32_array, put_u32
    );
    numeric_access!(
        i32, 4, [SL], read_i32_into, write_i32_into,
        get_i32_array, get_i32, put_i32_array, put_i32
    );
    numeric_access!(
        u64, 8, [UV, OV], read_u64_into, write_u64_into,
        get_u64_array, get_u64, put_u64_array, put_u64
    );
    numeric_access!(
        i64, 8, [SV], read_i64_into, write_i64_into,
        get_i64_array, get_i64, put_i64_array, put_i64
    );
    numeric_access!(
        f32, 4, [FL, OF], read_f32_into, write_f32_into,
        get_f32_array, get_f32, put_f32_array, put_f32
    );
    numeric_access!(
        f64, 8, [FD, OD], read_f64_into, write_f64_into,
        get_f64_array, get_f64, put_f64_array, put_f64
    );

    /// The bytes of an `OB` or `UN` value.
    pub fn get_u8_array(&mut self) -> Result<&[u8]> {
        ensure!(matches!(self.vr(), VR::OB | VR::UN), not_supported());
        self.get_value(NATIVE_ENDIANNESS)
    }

    /// The byte at the given position of an `OB` or `UN` value.
    pub fn get_u8(&mut self, pos: usize) -> Result<u8> {
        self.get_u8_array()?
            .get(pos)
            .copied()
            .context(IllegalCallSnafu {
                reason: "value position out of range",
            })
    }

    /// Replace an `OB` or `UN` value.
    pub fn put_u8_array(&mut self, values: &[u8]) -> Result<()> {
        ensure!(matches!(self.vr(), VR::OB | VR::UN), not_supported());
        self.put_value(values)
    }

    /// Replace the byte at the given position of an `OB` or `UN` value,
    /// or append it.
    pub fn put_u8(&mut self, value: u8, pos: u32) -> Result<()> {
        ensure!(matches!(self.vr(), VR::OB | VR::UN), not_supported());
        self.change_value(&[value], pos)
    }

    /// Replace an `OB` or `UN` value with `n` zeroed bytes,
    /// to be filled in place.
    pub fn create_u8_array(&mut self, n: u32) -> Result<&mut [u8]> {
        ensure!(matches!(self.vr(), VR::OB | VR::UN), not_supported());
        self.create_empty_value(n)?;
        Ok(match self.value.as_mut() {
            Some(value) => &mut value[..n as usize],
            None => &mut [],
        })
    }

    /// The attribute tags of an `AT` value.
    pub fn get_tags(&mut self) -> Result<Vec<Tag>> {
        ensure!(self.vr() == VR::AT, not_supported());
        let bytes = self.get_value(NATIVE_ENDIANNESS)?;
        let mut words = vec![0u16; bytes.len() / 4 * 2];
        NativeEndian::read_u16_into(&bytes[..words.len() * 2], &mut words);
        Ok(words.chunks_exact(2).map(|w| Tag(w[0], w[1])).collect())
    }

    /// The attribute tag at the given position of an `AT` value.
    pub fn get_tag(&mut self, pos: usize) -> Result<Tag> {
        self.get_tags()?
            .get(pos)
            .copied()
            .context(IllegalCallSnafu {
                reason: "value position out of range",
            })
    }

    /// Replace an `AT` value.
    pub fn put_tags(&mut self, tags: &[Tag]) -> Result<()> {
        ensure!(self.vr() == VR::AT, not_supported());
        let words: Vec<u16> = tags.iter().flat_map(|t| [t.0, t.1]).collect();
        let mut bytes = vec![0; words.len() * 2];
        NativeEndian::write_u16_into(&words, &mut bytes);
        self.put_value(&bytes)
    }

    /// Replace the attribute tag at the given position of an `AT` value,
    /// or append it.
    pub fn put_tag(&mut self, tag: Tag, pos: u32) -> Result<()> {
        ensure!(self.vr() == VR::AT, not_supported());
        let position = pos.checked_mul(4).context(IllegalCallSnafu {
            reason: "value position out of range",
        })?;
        let mut bytes = [0; 4];
        NativeEndian::write_u16_into(&[tag.0, tag.1], &mut bytes);
        self.change_value(&bytes, position)
    }

    /// The value at the given position, as text.
    ///
    /// Character strings with multiple values are split at each backslash.
    /// Binary values are formatted one unit at a time,
    /// in hexadecimal for `OB`, `OW` and `UN`.
    /// With `normalize`, padding and insignificant spaces are removed.
    pub fn get_string(&mut self, pos: usize, normalize: bool) -> Result<String> {
        self.components(normalize)?
            .into_iter()
            .nth(pos)
            .context(IllegalCallSnafu {
                reason: "value position out of range",
            })
    }

    /// All values as text, separated by backslashes.
    pub fn get_string_array(&mut self, normalize: bool) -> Result<String> {
        let vr = self.vr();
        if vr.is_string() {
            let value = self.get_value(NATIVE_ENDIANNESS)?;
            let text = String::from_utf8_lossy(value);
            if !normalize {
                return Ok(text.into_owned());
            }
            if !vr.is_multi_valued_string() {
                return Ok(self::normalize(&text, vr).to_string());
            }
            return Ok(text.split('\\').map(|v| self::normalize(v, vr)).join("\\"));
        }
        Ok(self.components(normalize)?.join("\\"))
    }

    fn components(&mut self, normalize: bool) -> Result<Vec<String>> {
        let vr = self.vr();
        if self.len_field() == 0 {
            return Ok(Vec::new());
        }
        let values = match vr {
            vr if vr.is_string() => {
                let value = self.get_value(NATIVE_ENDIANNESS)?;
                let text = String::from_utf8_lossy(value);
                let parts: Vec<&str> = if vr.is_multi_valued_string() {
                    text.split('\\').collect()
                } else {
                    vec![text.as_ref()]
                };
                parts
                    .into_iter()
                    .map(|v| {
                        if normalize {
                            self::normalize(v, vr).to_string()
                        } else {
                            v.to_string()
                        }
                    })
                    .collect()
            }
            VR::OB | VR::UN => self
                .get_value(NATIVE_ENDIANNESS)?
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect(),
            VR::OW => to_strings(self.get_u16_array()?, |v| format!("{:04x}", v)),
            VR::US => to_strings(self.get_u16_array()?, |v| v.to_string()),
            VR::SS => to_strings(self.get_i16_array()?, |v| v.to_string()),
            VR::UL | VR::OL => to_strings(self.get_u32_array()?, |v| v.to_string()),
            VR::SL => to_strings(self.get_i32_array()?, |v| v.to_string()),
            VR::UV | VR::OV => to_strings(self.get_u64_array()?, |v| v.to_string()),
            VR::SV => to_strings(self.get_i64_array()?, |v| v.to_string()),
            VR::FL | VR::OF => to_strings(self.get_f32_array()?, |v| v.to_string()),
            VR::FD | VR::OD => to_strings(self.get_f64_array()?, |v| v.to_string()),
            VR::AT => to_strings(self.get_tags()?, |t| {
                format!("({:04x},{:04x})", t.group(), t.element())
            }),
            _ => return not_supported().fail(),
        };
        Ok(values)
    }

    /// Replace the value with the one given as text,
    /// in the form produced by [`get_string_array`](DicomElement::get_string_array).
    ///
    /// Character strings are padded to an even length
    /// with the padding byte of their value representation.
    pub fn put_string(&mut self, value: &str) -> Result<()> {
        let vr = self.vr();
        if vr.is_string() {
            let mut bytes = value.as_bytes().to_vec();
            if bytes.len() % 2 == 1 {
                bytes.push(vr.padding_byte());
            }
            return self.put_value(&bytes);
        }
        let tag = self.tag();
        match vr {
            VR::OB | VR::UN => {
                let values = parse_with(tag, value, |s| u8::from_str_radix(s, 16).ok())?;
                self.put_u8_array(&values)
            }
            VR::OW => {
                let values = parse_with(tag, value, |s| u16::from_str_radix(s, 16).ok())?;
                self.put_u16_array(&values)
            }
            VR::US => self.put_u16_array(&parse(tag, value)?),
            VR::SS => self.put_i16_array(&parse(tag, value)?),
            VR::UL | VR::OL => self.put_u32_array(&parse(tag, value)?),
            VR::SL => self.put_i32_array(&parse(tag, value)?),
            VR::UV | VR::OV => self.put_u64_array(&parse(tag, value)?),
            VR::SV => self.put_i64_array(&parse(tag, value)?),
            VR::FL | VR::OF => self.put_f32_array(&parse(tag, value)?),
            VR::FD | VR::OD => self.put_f64_array(&parse(tag, value)?),
            VR::AT => self.put_tags(&parse_with(tag, value, parse_tag)?),
            _ => not_supported().fail(),
        }
    }
}

fn to_strings<T>(values: Vec<T>, f: impl Fn(T) -> String) -> Vec<String> {
    values.into_iter().map(f).collect()
}

fn parse<T: FromStr>(tag: Tag, value: &str) -> Result<Vec<T>> {
    parse_with(tag, value, |s| s.parse().ok())
}

fn parse_with<T>(tag: Tag, value: &str, f: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split('\\')
        .map(|s| {
            f(s.trim()).context(InvalidValueSnafu {
                tag,
                value: s.to_string(),
            })
        })
        .collect()
}

/// Parse a tag as `(gggg,eeee)`, `gggg,eeee` or `ggggeeee`.
fn parse_tag(s: &str) -> Option<Tag> {
    let s = s.trim_start_matches('(').trim_end_matches(')');
    let (group, element) = match s.split_once(',') {
        Some(parts) => parts,
        None if s.len() == 8 => s.split_at(4),
        None => return None,
    };
    Some(Tag(
        u16::from_str_radix(group.trim(), 16).ok()?,
        u16::from_str_radix(element.trim(), 16).ok()?,
    ))
}
