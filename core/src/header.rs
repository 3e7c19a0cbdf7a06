//! This module contains an assortment of types required for interpreting
//! DICOM data element headers:
//! the attribute tag, the value representation,
//! the value length and the element header itself.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Trait for any DICOM entity (element or item) which may have a length.
pub trait HasLength {
    /// Retrieve the value data's length as specified by the data element or
    /// item, in bytes.
    ///
    /// It is named `length` to make it distinct from the conventional method
    /// signature `len(&self) -> usize` for the number of elements of a
    /// collection.
    ///
    /// According to the standard, the concrete value size may be undefined,
    /// which can be the case for sequence elements or specific primitive
    /// values.
    fn length(&self) -> Length;

    /// Check whether the value is empty (0 length).
    fn is_empty(&self) -> bool {
        self.length() == Length(0)
    }
}

/// A trait for a data type containing a DICOM header.
#[allow(clippy::len_without_is_empty)]
pub trait Header: HasLength {
    /// Retrieve the element's tag as a `(group, element)` tuple.
    fn tag(&self) -> Tag;

    /// Check whether this is the header of an item.
    fn is_item(&self) -> bool {
        self.tag() == Tag::ITEM
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag::ITEM_DELIMITER
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag::SEQUENCE_DELIMITER
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DataElementHeader {
    /// DICOM tag
    pub tag: Tag,
    /// Value Representation
    pub vr: VR,
    /// Element length
    pub len: Length,
}

impl HasLength for DataElementHeader {
    #[inline]
    fn length(&self) -> Length {
        self.len
    }
}

impl Header for DataElementHeader {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    /// This is just a trivial constructor.
    #[inline]
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }

    /// Retrieve the element's value representation, which can be unknown.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }
}

macro_rules! value_representations {
    ($($(#[$doc:meta])* $vr:ident,)*) => {
        /// An enum type for a DICOM value representation.
        #[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
        pub enum VR {
            $($(#[$doc])* $vr,)*
        }

        impl VR {
            /// Every value representation, in alphabetical order.
            pub const ALL: &'static [VR] = &[$(VR::$vr,)*];

            /// Retrieve a string representation of this VR.
            pub fn to_string(self) -> &'static str {
                match self {
                    $(VR::$vr => stringify!($vr),)*
                }
            }
        }

        /// Obtain the value representation corresponding to the given string.
        /// The string should hold exactly two alphabetic characters
        /// in upper case, otherwise no match is made.
        impl FromStr for VR {
            type Err = &'static str;

            fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
                match string {
                    $(stringify!($vr) => Ok(VR::$vr),)*
                    _ => Err("no such value representation"),
                }
            }
        }
    };
}

value_representations! {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Locator
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

impl VR {
    /// Obtain the value representation from the two bytes
    /// of an explicit VR element header.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        std::str::from_utf8(&chars).ok()?.parse().ok()
    }

    /// The two upper case characters written in explicit VR headers.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// The size in bytes of a single value unit of this representation.
    ///
    /// Byte order conversions swap the value field in units of this width.
    /// Textual and byte oriented representations have a width of 1,
    /// while sequences have none.
    pub fn value_width(self) -> usize {
        use VR::*;
        match self {
            US | SS | OW | AT => 2,
            UL | SL | FL | OF | OL => 4,
            FD | OD | SV | UV | OV => 8,
            SQ => 0,
            _ => 1,
        }
    }

    /// Whether values of this representation are character strings.
    pub fn is_string(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// Whether values of this representation are character strings
    /// in which the backslash separates multiple values.
    pub fn is_multi_valued_string(self) -> bool {
        self.is_string() && !matches!(self, VR::LT | VR::ST | VR::UR | VR::UT)
    }

    /// The byte used to pad values of this representation to an even length.
    pub fn padding_byte(self) -> u8 {
        match self {
            VR::UI => b'\0',
            vr if vr.is_string() => b' ',
            _ => b'\0',
        }
    }

    /// Whether this representation is encoded in explicit VR transfer syntaxes
    /// with two reserved bytes and a 32-bit value length field,
    /// as described in PS3.5 7.1.2.
    pub fn uses_extended_length(self) -> bool {
        use VR::*;
        matches!(
            self,
            OB | OD | OF | OL | OV | OW | SQ | SV | UC | UN | UR | UT | UV
        )
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// The data type for DICOM data element tags.
///
/// Printed as `(GGGG,EEEE)` in upper case hexadecimal.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Item (FFFE,E000)
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    /// Item Delimitation Item (FFFE,E00D)
    pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
    /// Sequence Delimitation Item (FFFE,E0DD)
    pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
    /// Pixel Data (7FE0,0010)
    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
    /// Transfer Syntax UID (0002,0010)
    pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
    /// Digital Signatures Sequence (FFFA,FFFA)
    pub const DIGITAL_SIGNATURES_SEQUENCE: Tag = Tag(0xFFFA, 0xFFFA);
    /// MAC Parameters Sequence (4FFE,0001)
    pub const MAC_PARAMETERS_SEQUENCE: Tag = Tag(0x4FFE, 0x0001);
    /// Data Set Trailing Padding (FFFC,FFFC)
    pub const DATA_SET_TRAILING_PADDING: Tag = Tag(0xFFFC, 0xFFFC);

    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether this is a group length tag `(gggg,0000)`.
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0x0000
    }

    /// Whether this tag belongs to a private group (odd group number).
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 == 1
    }

    /// Whether an attribute with this tag is included
    /// in the byte stream covered by a digital signature.
    ///
    /// Group lengths, data set trailing padding
    /// and the digital signature attributes themselves are excluded.
    pub fn is_signable(self) -> bool {
        !(self.is_group_length()
            || self == Tag::DIGITAL_SIGNATURES_SEQUENCE
            || self == Tag::MAC_PARAMETERS_SEQUENCE
            || self == Tag::DATA_SET_TRAILING_PADDING)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

/// A type for representing data set content length, in bytes.
/// An internal value of `0xFFFF_FFFF` represents an undefined
/// (unspecified) length, which would have to be determined
/// with a traversal based on the content's encoding.
///
/// This also means that numeric comparisons
/// do not function the same way as primitive number types:
///
/// Two length of undefined length are not equal.
///
/// ```
/// # use dicom_stream_core::Length;
/// assert_ne!(Length::UNDEFINED, Length::UNDEFINED);
/// ```
///
/// Comparing between at least one undefined length is always `false`.
///
/// ```
/// # use dicom_stream_core::Length;
/// assert!(Length::defined(16) < Length::defined(64));
/// assert!(!(Length::UNDEFINED < Length::defined(64)));
/// assert!(!(Length::UNDEFINED > Length::defined(64)));
/// ```
#[derive(Clone, Copy)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Create a new length value with the given number of bytes.
    ///
    /// # Panic
    ///
    /// This function will panic if `len` represents an undefined length.
    #[inline]
    pub fn defined(len: u32) -> Self {
        assert_ne!(len, UNDEFINED_LEN);
        Length(len)
    }

    /// Check whether this length is undefined (unknown).
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined (not undefined).
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if available.
    /// Returns `None` if it represents an undefined length.
    #[inline]
    pub fn get(self) -> Option<u32> {
        match self.0 {
            UNDEFINED_LEN => None,
            v => Some(v),
        }
    }
}

impl PartialEq<Length> for Length {
    fn eq(&self, rhs: &Length) -> bool {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => false,
            (l1, l2) => l1 == l2,
        }
    }
}

impl PartialOrd<Length> for Length {
    fn partial_cmp(&self, rhs: &Length) -> Option<Ordering> {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => None,
            (l1, l2) => Some(l1.cmp(&l2)),
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("Length(Undefined)"),
            l => f.debug_tuple("Length").field(&l).finish(),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("U/L"),
            l => write!(f, "{}", &l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_from_u16_pair() {
        let t = Tag::from((0x0010u16, 0x0020u16));
        assert_eq!(0x0010u16, t.group());
        assert_eq!(0x0020u16, t.element());
    }

    #[test]
    fn tag_display() {
        assert_eq!(Tag(0x7FE0, 0x0010).to_string(), "(7FE0,0010)");
        assert_eq!(format!("{:?}", Tag(0x0008, 0x0016)), "Tag(0x0008, 0x0016)");
    }

    #[test]
    fn signable_tags() {
        assert!(Tag(0x0010, 0x0010).is_signable());
        assert!(!Tag(0x0010, 0x0000).is_signable());
        assert!(!Tag::DIGITAL_SIGNATURES_SEQUENCE.is_signable());
        assert!(!Tag::MAC_PARAMETERS_SEQUENCE.is_signable());
        assert!(!Tag::DATA_SET_TRAILING_PADDING.is_signable());
    }

    #[test]
    fn vr_value_widths() {
        assert_eq!(VR::OB.value_width(), 1);
        assert_eq!(VR::LO.value_width(), 1);
        assert_eq!(VR::OW.value_width(), 2);
        assert_eq!(VR::AT.value_width(), 2);
        assert_eq!(VR::UL.value_width(), 4);
        assert_eq!(VR::OF.value_width(), 4);
        assert_eq!(VR::FD.value_width(), 8);
        assert_eq!(VR::UV.value_width(), 8);
        assert_eq!(VR::SQ.value_width(), 0);
    }

    #[test]
    fn vr_extended_length() {
        for vr in [
            VR::OB, VR::OD, VR::OF, VR::OL, VR::OV, VR::OW, VR::SQ, VR::SV, VR::UC, VR::UN,
            VR::UR, VR::UT, VR::UV,
        ] {
            assert!(vr.uses_extended_length(), "{} should use a 32-bit length", vr);
        }
        for vr in [VR::AE, VR::CS, VR::FD, VR::LT, VR::PN, VR::UI, VR::US] {
            assert!(!vr.uses_extended_length(), "{} should use a 16-bit length", vr);
        }
    }

    #[test]
    fn vr_strings() {
        assert!(VR::PN.is_string());
        assert!(VR::PN.is_multi_valued_string());
        assert!(VR::LT.is_string());
        assert!(!VR::LT.is_multi_valued_string());
        assert!(!VR::OB.is_string());
        assert_eq!(VR::UI.padding_byte(), b'\0');
        assert_eq!(VR::CS.padding_byte(), b' ');
        assert_eq!(VR::OB.padding_byte(), b'\0');
    }

    #[test]
    fn vr_from_binary() {
        assert_eq!(VR::from_binary(*b"OW"), Some(VR::OW));
        assert_eq!(VR::from_binary(*b"xy"), None);
        assert_eq!(VR::SV.to_bytes(), *b"SV");
        for vr in VR::ALL {
            assert_eq!(VR::from_binary(vr.to_bytes()), Some(*vr));
        }
        assert_eq!(VR::ALL.len(), 34);
    }

    #[test]
    fn undefined_length() {
        assert!(Length::UNDEFINED.is_undefined());
        assert_eq!(Length::UNDEFINED.get(), None);
        assert_ne!(Length::UNDEFINED, Length(0xFFFF_FFFF));
        assert_eq!(Length(12).get(), Some(12));
        assert_eq!(Length::UNDEFINED.to_string(), "U/L");
    }
}
