//! Implicit VR Little Endian syntax transfer implementation

use crate::decode::{read_tag, Decode, ReadHeaderTagSnafu, ReadLengthSnafu, Result};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dicom_stream_core::dictionary::{BuiltinDataDictionary, DataDictionary, DataDictionaryEntry};
use dicom_stream_core::header::{DataElementHeader, Length};
use dicom_stream_core::{Tag, VR};
use snafu::ResultExt;
use std::fmt;
use std::io::Read;

/// A data element decoder for the Implicit VR Little Endian transfer syntax.
/// This type contains a reference to an attribute dictionary for resolving
/// value representations.
#[derive(Clone)]
pub struct ImplicitVRLittleEndianDecoder<D = BuiltinDataDictionary> {
    dict: D,
}

impl<D> fmt::Debug for ImplicitVRLittleEndianDecoder<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ImplicitVRLittleEndianDecoder")
            .field("dict", &"«omitted»")
            .finish()
    }
}

impl ImplicitVRLittleEndianDecoder<BuiltinDataDictionary> {
    /// Retrieve this decoder using the built-in data dictionary.
    pub fn new() -> Self {
        ImplicitVRLittleEndianDecoder {
            dict: BuiltinDataDictionary,
        }
    }
}

impl Default for ImplicitVRLittleEndianDecoder<BuiltinDataDictionary> {
    fn default() -> Self {
        ImplicitVRLittleEndianDecoder::new()
    }
}

impl<D> ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    /// Retrieve this decoder using a custom data dictionary.
    pub fn with_dict(dictionary: D) -> Self {
        ImplicitVRLittleEndianDecoder { dict: dictionary }
    }

    fn resolve_vr(&self, tag: Tag) -> VR {
        // In Implicit VR Little Endian,
        // the VR of OW must be used for Pixel Data (7FE0,0010)
        // and Overlay Data (60xx,3000).
        if tag == Tag::PIXEL_DATA || (tag.0 >> 8 == 0x60 && tag.1 == 0x3000) {
            return VR::OW;
        }
        if tag.0 == 0xFFFE {
            return VR::UN;
        }
        self.dict
            .by_tag(tag)
            .map(|entry| entry.vr())
            .unwrap_or(VR::UN)
    }
}

impl<D> Decode for ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadHeaderTagSnafu)?;
        let tag = Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        );

        source.read_exact(&mut buf).context(ReadLengthSnafu)?;
        let len = LittleEndian::read_u32(&buf);

        let vr = self.resolve_vr(tag);
        Ok((DataElementHeader::new(tag, vr, Length(len)), 8))
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        read_tag::<LittleEndian, S>(source)
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dicom_stream_core::dictionary::StubDataDictionary;
    use dicom_stream_core::header::{HasLength, Header, Length};
    use dicom_stream_core::{Tag, VR};
    use std::io::{Cursor, Seek, SeekFrom};

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x10, 0x00, 0x10, 0x00,     // (0010,0010) Patient Name
            0x08, 0x00, 0x00, 0x00, // Length: 8
                b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        0x11, 0x00, 0x10, 0x10,     // (0011,1010) private, unknown
            0x02, 0x00, 0x00, 0x00, // Length: 2
                0xAB, 0xCD,
        0xE0, 0x7F, 0x10, 0x00,     // (7FE0,0010) Pixel Data
            0x04, 0x00, 0x00, 0x00, // Length: 4
                0x01, 0x02, 0x03, 0x04,
        0x00, 0x60, 0x00, 0x30,     // (6000,3000) Overlay Data
            0x00, 0x00, 0x00, 0x00, // Length: 0
    ];

    #[test]
    fn decode_data_elements() {
        let dec = ImplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0010, 0x0010));
        assert_eq!(elem.vr(), VR::PN);
        assert_eq!(elem.length(), Length(8));
        assert_eq!(bytes_read, 8);
        cursor.seek(SeekFrom::Current(8)).unwrap();

        let (elem, _) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0011, 0x1010));
        assert_eq!(elem.vr(), VR::UN);
        cursor.seek(SeekFrom::Current(2)).unwrap();

        let (elem, _) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag::PIXEL_DATA);
        assert_eq!(elem.vr(), VR::OW);
        assert_eq!(elem.length(), Length(4));
        cursor.seek(SeekFrom::Current(4)).unwrap();

        let (elem, _) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x6000, 0x3000));
        assert_eq!(elem.vr(), VR::OW);
        assert!(elem.is_empty());
    }

    #[test]
    fn unknown_attributes_fall_back_to_un() {
        let dec = ImplicitVRLittleEndianDecoder::with_dict(StubDataDictionary);
        let mut source: &[u8] = &[0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00];
        let (elem, _) = dec.decode_header(&mut source).unwrap();
        assert_eq!(elem.vr(), VR::UN);
    }
}
