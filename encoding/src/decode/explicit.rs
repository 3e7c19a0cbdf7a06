//! Explicit VR transfer syntax implementation, in either byte order.

use crate::decode::{
    read_tag, Decode, ReadHeaderTagSnafu, ReadItemLengthSnafu, ReadLengthSnafu,
    ReadReservedSnafu, ReadVrSnafu, Result,
};
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use dicom_stream_core::header::{DataElementHeader, Length};
use dicom_stream_core::{Tag, VR};
use snafu::ResultExt;
use std::fmt;
use std::io::Read;
use std::marker::PhantomData;

/// A data element decoder for explicit VR transfer syntaxes,
/// reading numbers in the byte order `B`.
pub struct ExplicitVRDecoder<B> {
    order: PhantomData<B>,
}

/// A data element decoder for the Explicit VR Little Endian transfer syntax.
pub type ExplicitVRLittleEndianDecoder = ExplicitVRDecoder<LittleEndian>;

/// A data element decoder for the Explicit VR Big Endian transfer syntax.
pub type ExplicitVRBigEndianDecoder = ExplicitVRDecoder<BigEndian>;

impl<B> ExplicitVRDecoder<B> {
    /// Create the decoder.
    pub const fn new() -> Self {
        ExplicitVRDecoder { order: PhantomData }
    }
}

impl<B> Default for ExplicitVRDecoder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for ExplicitVRDecoder<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for ExplicitVRDecoder<B> {}

impl<B> fmt::Debug for ExplicitVRDecoder<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ExplicitVRDecoder")
    }
}

impl<B> Decode for ExplicitVRDecoder<B>
where
    B: ByteOrder,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadHeaderTagSnafu)?;
        let tag = Tag(B::read_u16(&buf[0..2]), B::read_u16(&buf[2..4]));

        if tag.group() == 0xFFFE {
            // items and delimiters have no VR nor reserved bytes
            source.read_exact(&mut buf).context(ReadItemLengthSnafu)?;
            let len = Length(B::read_u32(&buf));
            return Ok((DataElementHeader::new(tag, VR::UN, len), 8));
        }

        source.read_exact(&mut buf[0..2]).context(ReadVrSnafu)?;
        let vr = VR::from_binary([buf[0], buf[1]]).unwrap_or(VR::UN);

        if vr.uses_extended_length() {
            source
                .read_exact(&mut buf[0..2])
                .context(ReadReservedSnafu)?;
            source.read_exact(&mut buf).context(ReadLengthSnafu)?;
            let len = Length(B::read_u32(&buf));
            Ok((DataElementHeader::new(tag, vr, len), 12))
        } else {
            source.read_exact(&mut buf[0..2]).context(ReadLengthSnafu)?;
            let len = Length(u32::from(B::read_u16(&buf[0..2])));
            Ok((DataElementHeader::new(tag, vr, len), 8))
        }
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        read_tag::<B, S>(source)
    }
}

#[cfg(test)]
mod tests {
    use super::{ExplicitVRBigEndianDecoder, ExplicitVRLittleEndianDecoder};
    use crate::decode::Decode;
    use dicom_stream_core::header::{HasLength, Header, Length};
    use dicom_stream_core::{Tag, VR};
    use std::io::{Cursor, Read, Seek, SeekFrom};

    #[rustfmt::skip]
    const RAW_LE: &[u8] = &[
        0x02, 0x00, 0x02, 0x00,     // (0002,0002) Media Storage SOP Class UID
            b'U', b'I',             // VR: UI
            0x1A, 0x00,             // Length: 26 bytes
                b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
                b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'1',
                0x00,               // padding
        0x09, 0x00, 0x10, 0x10,     // (0009,1010) private, UN
            b'U', b'N',             // VR: UN
            0x00, 0x00,             // Reserved
            0x02, 0x00, 0x00, 0x00, // Length: 2 bytes
                0x12, 0x34,
        0xFE, 0xFF, 0x00, 0xE0,     // (FFFE,E000) Item
            0xFF, 0xFF, 0xFF, 0xFF, // Length: undefined
    ];

    #[rustfmt::skip]
    const RAW_BE: &[u8] = &[
        0x00, 0x08, 0x00, 0x60,     // (0008,0060) Modality
            b'C', b'S',             // VR: CS
            0x00, 0x02,             // Length: 2 bytes
                b'M', b'R',
        0x7F, 0xE0, 0x00, 0x10,     // (7FE0,0010) Pixel Data
            b'O', b'W',             // VR: OW
            0x00, 0x00,             // Reserved
            0x00, 0x00, 0x00, 0x04, // Length: 4 bytes
                0x12, 0x34, 0x56, 0x78,
        0xFF, 0xFE, 0xE0, 0xDD,     // (FFFE,E0DD) Sequence Delimitation Item
            0x00, 0x00, 0x00, 0x00, // Length: 0
    ];

    #[test]
    fn decode_little_endian_headers() {
        let dec = ExplicitVRLittleEndianDecoder::new();
        let mut cursor = Cursor::new(RAW_LE);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0002, 0x0002));
        assert_eq!(elem.vr(), VR::UI);
        assert_eq!(elem.length(), Length(26));
        assert_eq!(bytes_read, 8);
        // the decoder leaves the value to the caller
        let mut buffer = [0u8; 13];
        cursor.read_exact(&mut buffer).unwrap();
        assert_eq!(&buffer, b"1.2.840.10008");
        assert_eq!(cursor.seek(SeekFrom::Current(13)).unwrap(), 34);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0009, 0x1010));
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(elem.length(), Length(2));
        assert_eq!(bytes_read, 12);
        assert_eq!(cursor.seek(SeekFrom::Current(2)).unwrap(), 48);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert!(elem.is_item());
        assert!(elem.length().is_undefined());
        assert_eq!(bytes_read, 8);
    }

    #[test]
    fn decode_big_endian_headers() {
        let dec = ExplicitVRBigEndianDecoder::new();
        let mut cursor = Cursor::new(RAW_BE);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag(0x0008, 0x0060));
        assert_eq!(elem.vr(), VR::CS);
        assert_eq!(elem.length(), Length(2));
        assert_eq!(bytes_read, 8);
        assert_eq!(cursor.seek(SeekFrom::Current(2)).unwrap(), 10);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert_eq!(elem.tag(), Tag::PIXEL_DATA);
        assert_eq!(elem.vr(), VR::OW);
        assert_eq!(elem.length(), Length(4));
        assert_eq!(bytes_read, 12);
        assert_eq!(cursor.seek(SeekFrom::Current(4)).unwrap(), 26);

        let (elem, bytes_read) = dec.decode_header(&mut cursor).unwrap();
        assert!(elem.is_sequence_delimiter());
        assert_eq!(elem.length(), Length(0));
        assert_eq!(bytes_read, 8);
    }

    #[test]
    fn unknown_vr_reads_as_un() {
        #[rustfmt::skip]
        let mut source: &[u8] = &[
            0x09, 0x00, 0x20, 0x10, b'x', b'y', 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
        ];
        let (elem, bytes_read) = ExplicitVRLittleEndianDecoder::new()
            .decode_header(&mut source)
            .unwrap();
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(elem.length(), Length(4));
        assert_eq!(bytes_read, 12);
    }

    #[test]
    fn decode_tag() {
        let mut source: &[u8] = &[0x10, 0x00, 0x20, 0x00];
        let tag = ExplicitVRLittleEndianDecoder::new()
            .decode_tag(&mut source)
            .unwrap();
        assert_eq!(tag, Tag(0x0010, 0x0020));

        let mut source: &[u8] = &[0x00, 0x10, 0x00, 0x20];
        let tag = ExplicitVRBigEndianDecoder::new()
            .decode_tag(&mut source)
            .unwrap();
        assert_eq!(tag, Tag(0x0010, 0x0020));
    }
}
