//! Explicit VR transfer syntax implementation, in either byte order.

use crate::encode::{short_length, write_structure, write_tag, Encode, Result, WriteHeaderSnafu};
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use dicom_stream_core::header::{DataElementHeader, HasLength, Header};
use dicom_stream_core::Tag;
use snafu::ResultExt;
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;

/// An encoder for explicit VR transfer syntaxes,
/// writing numbers in the byte order `B`.
pub struct ExplicitVREncoder<B> {
    order: PhantomData<B>,
}

/// A concrete encoder for the transfer syntax ExplicitVRLittleEndian
pub type ExplicitVRLittleEndianEncoder = ExplicitVREncoder<LittleEndian>;

/// A concrete encoder for the transfer syntax ExplicitVRBigEndian
pub type ExplicitVRBigEndianEncoder = ExplicitVREncoder<BigEndian>;

impl<B> ExplicitVREncoder<B> {
    /// Create the encoder.
    pub const fn new() -> Self {
        ExplicitVREncoder { order: PhantomData }
    }
}

impl<B> Default for ExplicitVREncoder<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for ExplicitVREncoder<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for ExplicitVREncoder<B> {}

impl<B> fmt::Debug for ExplicitVREncoder<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("ExplicitVREncoder")
    }
}

impl<B> Encode for ExplicitVREncoder<B>
where
    B: ByteOrder,
{
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        write_tag::<B, W>(to, tag)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        let mut buf = [0u8; 12];
        B::write_u16(&mut buf[0..2], de.tag().group());
        B::write_u16(&mut buf[2..4], de.tag().element());
        buf[4..6].copy_from_slice(&de.vr().to_bytes());
        let size = if de.vr().uses_extended_length() {
            // PS3.5 7.1.2: two reserved bytes set to 0000H,
            // then a 32-bit value length
            B::write_u32(&mut buf[8..12], de.length().0);
            12
        } else {
            B::write_u16(&mut buf[6..8], short_length(&de)?);
            8
        };
        to.write_all(&buf[..size]).context(WriteHeaderSnafu)?;
        Ok(size)
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        write_structure::<B, W>(to, Tag::ITEM, len)
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_structure::<B, W>(to, Tag::ITEM_DELIMITER, 0)
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_structure::<B, W>(to, Tag::SEQUENCE_DELIMITER, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::{ExplicitVRBigEndianEncoder, ExplicitVRLittleEndianEncoder};
    use crate::encode::{Encode, Error};
    use dicom_stream_core::header::{DataElementHeader, Length};
    use dicom_stream_core::{Tag, VR};

    type Result = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn encode_little_endian_headers() -> Result {
        let mut out = Vec::new();
        let enc = ExplicitVRLittleEndianEncoder::new();

        let de = DataElementHeader::new(Tag(0x0002, 0x0002), VR::UI, Length(26));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 8);
        let de = DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OW, Length(0x0010_0000));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 12);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x02, 0x00, 0x02, 0x00,     // (0002,0002)
                b'U', b'I',             // VR: UI
                0x1A, 0x00,             // Length: 26 bytes
            0xE0, 0x7F, 0x10, 0x00,     // (7FE0,0010)
                b'O', b'W',             // VR: OW
                0x00, 0x00,             // Reserved
                0x00, 0x00, 0x10, 0x00, // Length: 1 MiB
        ];
        assert_eq!(&out[..], expected);
        Ok(())
    }

    #[test]
    fn encode_big_endian_headers() -> Result {
        let mut out = Vec::new();
        let enc = ExplicitVRBigEndianEncoder::new();

        let de = DataElementHeader::new(Tag(0x0028, 0x0010), VR::US, Length(2));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 8);
        let de = DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OW, Length(0x0102_0304));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 12);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x00, 0x28, 0x00, 0x10,     // (0028,0010)
                b'U', b'S',             // VR: US
                0x00, 0x02,             // Length: 2 bytes
            0x7F, 0xE0, 0x00, 0x10,     // (7FE0,0010)
                b'O', b'W',             // VR: OW
                0x00, 0x00,             // Reserved
                0x01, 0x02, 0x03, 0x04, // Length
        ];
        assert_eq!(&out[..], expected);
        Ok(())
    }

    #[test]
    fn encode_delimiters() -> Result {
        let mut out = Vec::new();
        let enc = ExplicitVRLittleEndianEncoder::new();
        enc.encode_item_header(&mut out, 0xFFFF_FFFF)?;
        enc.encode_item_delimiter(&mut out)?;
        enc.encode_sequence_delimiter(&mut out)?;

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(&out[..], expected);

        let mut out = Vec::new();
        ExplicitVRBigEndianEncoder::new().encode_item_header(&mut out, 16)?;
        assert_eq!(&out[..], &[0xFF, 0xFE, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x10]);
        Ok(())
    }

    #[test]
    fn short_length_overflow_is_an_error() {
        let enc = ExplicitVRLittleEndianEncoder::new();
        let de = DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(0x1_0000));
        let mut out = Vec::new();
        let result = enc.encode_element_header(&mut out, de);
        assert!(matches!(result, Err(Error::LengthOverflow { .. })));
        assert!(out.is_empty());
    }
}
