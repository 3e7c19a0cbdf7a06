//! This module contains all DICOM data element header decoding logic.

use byteordered::byteorder::ByteOrder;
use dicom_stream_core::header::DataElementHeader;
use dicom_stream_core::Tag;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Read};

pub mod explicit;
pub mod implicit_le;

pub use self::explicit::{
    ExplicitVRBigEndianDecoder, ExplicitVRDecoder, ExplicitVRLittleEndianDecoder,
};
pub use self::implicit_le::ImplicitVRLittleEndianDecoder;

/// Module-level error type:
/// for errors which may occur while decoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to read the beginning (tag) of the header"))]
    ReadHeaderTag {
        backtrace: Option<Backtrace>,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's item length field"))]
    ReadItemLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's tag field"))]
    ReadTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's reserved bytes"))]
    ReadReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's element length field"))]
    ReadLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's value representation"))]
    ReadVr {
        backtrace: Backtrace,
        source: io::Error,
    },
}

impl Error {
    /// Whether the source ran out of data
    /// while reading the tag at the start of a header,
    /// which usually means that the data set is over.
    pub fn is_end_of_input(&self) -> bool {
        matches!(
            self,
            Error::ReadHeaderTag { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/** Type trait for reading and decoding DICOM data element headers.
 *
 * The specific behaviour of decoding, even when abstracted from the original source,
 * may depend on the transfer syntax.
 */
pub trait Decode {
    /** Fetch and decode the next data element header from the given source.
     * This method returns only the header of the element. At the end of this operation, the source
     * will be pointing at the element's value data, which should be read or skipped as necessary.
     *
     * Decoding an item or sequence delimiter is considered valid, and so should be properly handled
     * by the decoder. The value representation in this case should be `UN`.
     *
     * Returns the expected header and the exact number of bytes read from the source.
     */
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read;
}

impl<T: ?Sized> Decode for &T
where
    T: Decode,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        (**self).decode_header(source)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        (**self).decode_tag(source)
    }
}

/** Type trait for reading and decoding DICOM data element headers
 * from a specific source reader type.
 *
 * Unlike [`Decode`], this trait is object safe.
 */
pub trait DecodeFrom<S: ?Sized + Read> {
    /** Fetch and decode the next data element header from the given source.
     * This method returns only the header of the element. At the end of this operation, the source
     * will be pointing at the element's value data, which should be read or skipped as necessary.
     *
     * Returns the expected header and the exact number of bytes read from the source.
     */
    fn decode_header(&self, source: &mut S) -> Result<(DataElementHeader, usize)>;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag(&self, source: &mut S) -> Result<Tag>;
}

impl<S: ?Sized, T> DecodeFrom<S> for T
where
    S: Read,
    T: Decode,
{
    #[inline]
    fn decode_header(&self, source: &mut S) -> Result<(DataElementHeader, usize)> {
        Decode::decode_header(self, source)
    }

    #[inline]
    fn decode_tag(&self, source: &mut S) -> Result<Tag> {
        Decode::decode_tag(self, source)
    }
}

/// Read a tag in the byte order `B`.
pub(crate) fn read_tag<B, S>(source: &mut S) -> Result<Tag>
where
    B: ByteOrder,
    S: ?Sized + Read,
{
    let mut buf = [0u8; 4];
    source.read_exact(&mut buf).context(ReadTagSnafu)?;
    Ok(Tag(B::read_u16(&buf[0..2]), B::read_u16(&buf[2..4])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_decode_from<T: ?Sized + DecodeFrom<dyn Read>>(_decoder: &T) {}

    #[test]
    fn decoders_can_be_type_erased() {
        let decoder = ExplicitVRLittleEndianDecoder::new();
        is_decode_from(&decoder);
        let erased: Box<dyn DecodeFrom<dyn Read>> = Box::new(decoder);
        is_decode_from(&*erased);
    }

    #[test]
    fn clean_end_of_input_is_recognized() {
        let mut source: &[u8] = &[];
        let err = Decode::decode_header(&ExplicitVRLittleEndianDecoder::new(), &mut source)
            .unwrap_err();
        assert!(err.is_end_of_input());

        let mut source: &[u8] = &[0x08, 0x00, 0x16, 0x00, b'U'];
        let err = Decode::decode_header(&ExplicitVRLittleEndianDecoder::new(), &mut source)
            .unwrap_err();
        assert!(!err.is_end_of_input());
    }
}
