//! This module contains all DICOM data element header encoding logic.
//!
//! Encoders are only concerned with the header portion of an element
//! (tag, value representation and value length)
//! and the structural items of sequences.
//! Value fields are written as raw bytes by their owners,
//! already in the byte order of the target transfer syntax.

use byteordered::byteorder::ByteOrder;
use dicom_stream_core::{DataElementHeader, Tag, VR};
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

pub mod explicit;
pub mod implicit_le;

pub use self::explicit::{
    ExplicitVRBigEndianEncoder, ExplicitVREncoder, ExplicitVRLittleEndianEncoder,
};
pub use self::implicit_le::ImplicitVRLittleEndianEncoder;

/// Module-level error type:
/// for errors which may occur while encoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to write tag"))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write element header"))]
    WriteHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item header"))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write item delimiter"))]
    WriteItemDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write sequence delimiter"))]
    WriteSequenceDelimiter {
        backtrace: Backtrace,
        source: io::Error,
    },
    /// The value length does not fit in the 16-bit length field
    /// reserved for this value representation.
    #[snafu(display("Value length {} of {} element {} does not fit in 16 bits", len, vr, tag))]
    LengthOverflow {
        tag: Tag,
        vr: VR,
        len: u32,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type trait for a data element header encoder.
pub trait Encode {
    /// Encode and write an element tag.
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write;

    /// Encode and write a data element header to the given destination.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write;

    /// Encode and write a DICOM sequence item header to the given destination.
    /* Although item element headers are always a tag and length sequence regardless of TS,
    the encoding of the length is unknown at this level. So no default impl. */
    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence item delimiter to the given destination.
    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence delimiter to the given destination.
    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;
}

impl<T: ?Sized> Encode for &T
where
    T: Encode,
{
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        (**self).encode_tag(to, tag)
    }

    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        (**self).encode_element_header(to, de)
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        (**self).encode_item_header(to, len)
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        (**self).encode_item_delimiter(to)
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        (**self).encode_sequence_delimiter(to)
    }
}

/// Type trait for a data element encoder to a single known writer type `W`.
///
/// Unlike [`Encode`], this trait is object safe.
pub trait EncodeTo<W: ?Sized> {
    /// Encode and write an element tag.
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()>;

    /// Encode and write a data element header to the given destination.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize>;

    /// Encode and write a DICOM sequence item header to the given destination.
    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()>;

    /// Encode and write a DICOM sequence item delimiter to the given destination.
    fn encode_item_delimiter(&self, to: &mut W) -> Result<()>;

    /// Encode and write a DICOM sequence delimiter to the given destination.
    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()>;
}

impl<T, W: ?Sized> EncodeTo<W> for T
where
    T: Encode,
    W: Write,
{
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()> {
        Encode::encode_tag(self, to, tag)
    }

    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize> {
        Encode::encode_element_header(self, to, de)
    }

    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()> {
        Encode::encode_item_header(self, to, len)
    }

    fn encode_item_delimiter(&self, to: &mut W) -> Result<()> {
        Encode::encode_item_delimiter(self, to)
    }

    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()> {
        Encode::encode_sequence_delimiter(self, to)
    }
}

/// Check that a value length fits in the 16-bit length field
/// of an explicit VR header.
pub(crate) fn short_length(de: &DataElementHeader) -> Result<u16> {
    ensure!(
        de.len.0 <= u32::from(u16::MAX),
        LengthOverflowSnafu {
            tag: de.tag,
            vr: de.vr,
            len: de.len.0,
        }
    );
    Ok(de.len.0 as u16)
}

/// Write a tag in the byte order `B`.
pub(crate) fn write_tag<B, W>(mut to: W, tag: Tag) -> Result<()>
where
    B: ByteOrder,
    W: Write,
{
    let mut buf = [0u8; 4];
    B::write_u16(&mut buf[0..2], tag.group());
    B::write_u16(&mut buf[2..4], tag.element());
    to.write_all(&buf).context(WriteTagSnafu)
}

/// Write an item header or delimiter in the byte order `B`.
/// These never carry a VR, whatever the transfer syntax.
pub(crate) fn write_structure<B, W>(mut to: W, tag: Tag, len: u32) -> Result<()>
where
    B: ByteOrder,
    W: Write,
{
    let mut buf = [0u8; 8];
    B::write_u16(&mut buf[0..2], tag.group());
    B::write_u16(&mut buf[2..4], tag.element());
    B::write_u32(&mut buf[4..8], len);
    let written = to.write_all(&buf);
    match tag {
        Tag::ITEM => written.context(WriteItemHeaderSnafu),
        Tag::ITEM_DELIMITER => written.context(WriteItemDelimiterSnafu),
        _ => written.context(WriteSequenceDelimiterSnafu),
    }
}
