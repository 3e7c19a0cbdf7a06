//! Implicit VR Little Endian syntax transfer implementation

use crate::encode::{write_structure, write_tag, Encode, Result, WriteHeaderSnafu};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dicom_stream_core::header::{DataElementHeader, HasLength, Header};
use dicom_stream_core::Tag;
use snafu::ResultExt;
use std::io::Write;

/// A concrete encoder for the transfer syntax ImplicitVRLittleEndian
#[derive(Debug, Default, Clone, Copy)]
pub struct ImplicitVRLittleEndianEncoder;

impl Encode for ImplicitVRLittleEndianEncoder {
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        write_tag::<LittleEndian, W>(to, tag)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        // the VR is left for the reader's dictionary to resolve
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], de.tag().group());
        LittleEndian::write_u16(&mut buf[2..4], de.tag().element());
        LittleEndian::write_u32(&mut buf[4..8], de.length().0);
        to.write_all(&buf).context(WriteHeaderSnafu)?;
        Ok(8)
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        write_structure::<LittleEndian, W>(to, Tag::ITEM, len)
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_structure::<LittleEndian, W>(to, Tag::ITEM_DELIMITER, 0)
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        write_structure::<LittleEndian, W>(to, Tag::SEQUENCE_DELIMITER, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVRLittleEndianEncoder;
    use crate::encode::Encode;
    use dicom_stream_core::header::{DataElementHeader, Length};
    use dicom_stream_core::{Tag, VR};

    type Result = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn encode_data_elements() -> Result {
        let mut out = Vec::new();
        let enc = ImplicitVRLittleEndianEncoder;

        // the VR is never written, not even for extended length VRs
        let de = DataElementHeader::new(Tag(0x0008, 0x0016), VR::UI, Length(26));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 8);
        let de = DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length(0x0001_0000));
        assert_eq!(enc.encode_element_header(&mut out, de)?, 8);

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x08, 0x00, 0x16, 0x00,     // (0008,0016)
                0x1A, 0x00, 0x00, 0x00, // Length: 26 bytes
            0xE0, 0x7F, 0x10, 0x00,     // (7FE0,0010)
                0x00, 0x00, 0x01, 0x00, // Length: 64 KiB
        ];
        assert_eq!(&out[..], expected);
        Ok(())
    }
}
