//! Module containing the DICOM Transfer Syntax data structure and related methods.
//!
//! A [`TransferSyntax`] describes how data elements are laid out on the wire:
//! the byte order of multi-byte values and whether the value representation
//! is written explicitly in each header.
//! The global [`TransferSyntaxRegistry`] maps transfer syntax UIDs
//! to the specifiers known to this crate.

pub mod entries;

use crate::decode::{
    DecodeFrom, ExplicitVRBigEndianDecoder, ExplicitVRLittleEndianDecoder,
    ImplicitVRLittleEndianDecoder,
};
use crate::encode::{
    EncodeTo, ExplicitVRBigEndianEncoder, ExplicitVRLittleEndianEncoder,
    ImplicitVRLittleEndianEncoder,
};
use dicom_stream_core::dictionary::DataDictionary;
use dicom_stream_core::VR;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

pub use byteordered::Endianness;

/// A decoder with its type erased.
pub type DynDecoder<'s, S> = Box<dyn DecodeFrom<S> + 's>;

/// An encoder with its type erased.
pub type DynEncoder<'w, W> = Box<dyn EncodeTo<W> + 'w>;

/// A DICOM transfer syntax specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of data.
    byte_order: Endianness,
    /// Whether the transfer syntax mandates an explicit value representation,
    /// or the VR is implicit.
    explicit_vr: bool,
    /// The transfer syntax' requirements and implemented capabilities.
    codec: Codec,
}

/// A description of the encoding and decoding requirements
/// of a transfer syntax beyond the element headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// No codec is given, nor is it required.
    None,
    /// The pixel data is encapsulated in fragments.
    /// Data sets can still be parsed and the fragments fetched as they are.
    EncapsulatedPixelData,
    /// Custom encoding and decoding of the entire data set is required, but
    /// not supported. This is the case of
    /// _Deflated Explicit VR Little Endian_, for example.
    Unsupported,
}

/// Trait for containers of transfer syntax specifiers.
pub trait TransferSyntaxIndex {
    /// Obtain a DICOM transfer syntax by its respective UID.
    ///
    /// Implementations of this method should be robust to the possible
    /// presence of trailing null characters (`\0`) or spaces in `uid`.
    fn get(&self, uid: &str) -> Option<&TransferSyntax>;
}

impl<T: ?Sized> TransferSyntaxIndex for &T
where
    T: TransferSyntaxIndex,
{
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        (**self).get(uid)
    }
}

impl TransferSyntax {
    /// Create a new transfer syntax specifier.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        explicit_vr: bool,
        codec: Codec,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            explicit_vr,
            codec,
        }
    }

    /// Create a new descriptor
    /// for a transfer syntax in explicit VR little endian.
    pub const fn new_ele(uid: &'static str, name: &'static str, codec: Codec) -> Self {
        TransferSyntax::new(uid, name, Endianness::Little, true, codec)
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain this transfer syntax' expected endianness.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    /// Check whether this transfer syntax specifier provides
    /// explicit value representations in element headers.
    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Obtain a reference to the underlying codec specifier.
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Check whether this transfer syntax encapsulates its pixel data.
    pub fn is_encapsulated_pixel_data(&self) -> bool {
        matches!(self.codec, Codec::EncapsulatedPixelData)
    }

    /// Check whether data sets in this transfer syntax
    /// can be read and written by this crate.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.codec, Codec::Unsupported)
    }

    /// The size of an element header with the given VR
    /// when written in this transfer syntax.
    pub fn header_size(&self, vr: VR) -> usize {
        if self.explicit_vr && vr.uses_extended_length() {
            12
        } else {
            8
        }
    }

    /// Retrieve the appropriate data element decoder for this transfer syntax.
    /// Can yield none if decoding is not supported.
    ///
    /// The resulting decoder uses the built-in data dictionary
    /// to resolve implicit value representations.
    pub fn decoder_for<'s, S>(&self) -> Option<DynDecoder<'s, S>>
    where
        S: ?Sized + Read,
    {
        self.decoder_with_dict(ImplicitVRLittleEndianDecoder::default())
    }

    /// Retrieve the appropriate data element decoder for this transfer syntax,
    /// using the given data dictionary for implicit VR resolution.
    /// Can yield none if decoding is not supported.
    pub fn decoder_with_dict<'s, S, D>(
        &self,
        implicit: ImplicitVRLittleEndianDecoder<D>,
    ) -> Option<DynDecoder<'s, S>>
    where
        S: ?Sized + Read,
        D: DataDictionary + 's,
    {
        if self.is_unsupported() {
            return None;
        }
        match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => Some(Box::new(implicit)),
            (Endianness::Little, true) => Some(Box::new(ExplicitVRLittleEndianDecoder::new())),
            (Endianness::Big, true) => Some(Box::new(ExplicitVRBigEndianDecoder::new())),
            _ => None,
        }
    }

    /// Retrieve the appropriate data element encoder for this transfer syntax.
    /// Can yield none if encoding is not supported.
    pub fn encoder_for<'w, W>(&self) -> Option<DynEncoder<'w, W>>
    where
        W: ?Sized + Write,
    {
        if self.is_unsupported() {
            return None;
        }
        match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => Some(Box::new(ImplicitVRLittleEndianEncoder)),
            (Endianness::Little, true) => Some(Box::new(ExplicitVRLittleEndianEncoder::new())),
            (Endianness::Big, true) => Some(Box::new(ExplicitVRBigEndianEncoder::new())),
            _ => None,
        }
    }
}

/// Data type for the registry of DICOM transfer syntaxes known to this crate.
pub struct TransferSyntaxRegistry {
    m: HashMap<&'static str, TransferSyntax>,
}

impl fmt::Debug for TransferSyntaxRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries: HashMap<&str, &str> =
            self.m.iter().map(|(uid, ts)| (*uid, ts.name())).collect();
        f.debug_struct("TransferSyntaxRegistry")
            .field("m", &entries)
            .finish()
    }
}

static REGISTRY: Lazy<TransferSyntaxRegistry> = Lazy::new(|| TransferSyntaxRegistry {
    m: entries::ALL.iter().map(|ts| (ts.uid(), *ts)).collect(),
});

impl TransferSyntaxRegistry {
    /// Retrieve the global transfer syntax registry.
    pub fn global() -> &'static TransferSyntaxRegistry {
        &REGISTRY
    }

    /// Obtain a transfer syntax by its UID,
    /// ignoring trailing padding.
    pub fn get<U: AsRef<str>>(&self, uid: U) -> Option<&TransferSyntax> {
        let uid = uid.as_ref().trim_end_matches(|c: char| c == '\0' || c == ' ');
        self.m.get(uid)
    }

    /// Iterate over all registered transfer syntaxes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TransferSyntax> {
        self.m.values()
    }
}

impl TransferSyntaxIndex for TransferSyntaxRegistry {
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        TransferSyntaxRegistry::get(self, uid)
    }
}

/// Retrieve the default transfer syntax,
/// _Implicit VR Little Endian_.
pub fn default() -> TransferSyntax {
    entries::IMPLICIT_VR_LITTLE_ENDIAN
}

#[cfg(test)]
mod tests {
    use super::entries;
    use crate::decode::DecodeFrom;
    use crate::encode::EncodeTo;
    use super::{Codec, Endianness, TransferSyntaxRegistry};
    use dicom_stream_core::header::DataElementHeader;
    use dicom_stream_core::{Length, Tag, VR};

    #[test]
    fn can_find_base_transfer_syntaxes() {
        let registry = TransferSyntaxRegistry::global();

        let ts = registry.get("1.2.840.10008.1.2").unwrap();
        assert_eq!(ts.endianness(), Endianness::Little);
        assert!(!ts.is_explicit_vr());

        let ts = registry.get("1.2.840.10008.1.2.1\0").unwrap();
        assert_eq!(ts.uid(), entries::EXPLICIT_VR_LITTLE_ENDIAN.uid());
        assert!(ts.is_explicit_vr());

        let ts = registry.get("1.2.840.10008.1.2.2 ").unwrap();
        assert_eq!(ts.endianness(), Endianness::Big);

        assert!(registry.get("1.2.3.4").is_none());
    }

    #[test]
    fn encapsulated_transfer_syntaxes_are_explicit_le() {
        let ts = TransferSyntaxRegistry::global()
            .get("1.2.840.10008.1.2.4.50")
            .unwrap();
        assert_eq!(ts.codec(), &Codec::EncapsulatedPixelData);
        assert!(ts.is_explicit_vr());
        assert_eq!(ts.endianness(), Endianness::Little);
        assert!(ts.decoder_for::<dyn std::io::Read>().is_some());
    }

    #[test]
    fn deflated_is_unsupported() {
        let ts = entries::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN;
        assert!(ts.is_unsupported());
        assert!(ts.decoder_for::<dyn std::io::Read>().is_none());
        assert!(ts.encoder_for::<Vec<u8>>().is_none());
    }

    #[test]
    fn header_sizes() {
        let ts = entries::EXPLICIT_VR_LITTLE_ENDIAN;
        assert_eq!(ts.header_size(VR::OB), 12);
        assert_eq!(ts.header_size(VR::US), 8);
        let ts = entries::IMPLICIT_VR_LITTLE_ENDIAN;
        assert_eq!(ts.header_size(VR::OB), 8);
    }

    #[test]
    fn encoder_and_decoder_agree() {
        for ts in TransferSyntaxRegistry::global().iter() {
            let Some(encoder) = ts.encoder_for::<Vec<u8>>() else {
                continue;
            };
            let header = DataElementHeader::new(Tag(0x0010, 0x0020), VR::LO, Length(6));
            let mut out = Vec::new();
            let decoder = ts.decoder_for::<&[u8]>().unwrap();
            let written = encoder.encode_element_header(&mut out, header).unwrap();
            assert_eq!(written, out.len());
            assert_eq!(written, ts.header_size(VR::LO));

            let mut source: &[u8] = &out;
            let (decoded, read) = decoder.decode_header(&mut source).unwrap();
            assert_eq!(read, written);
            assert_eq!(decoded.tag, header.tag);
            assert_eq!(decoded.len, header.len);
            assert_eq!(decoded.vr(), VR::LO);
        }
    }
}
