//! Error types of the element engine.

use dicom_stream_core::Tag;
use snafu::{Backtrace, Snafu};
use std::collections::TryReserveError;
use std::io;

/// The main error type of the element engine.
///
/// Transfers which cannot progress right now are not errors:
/// see [`TransferStatus::Suspended`](crate::TransferStatus::Suspended).
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The operation is not allowed in the object's current state,
    /// for its value representation,
    /// or with the given parameters.
    #[snafu(display("Illegal call: {}", reason))]
    IllegalCall {
        reason: &'static str,
        backtrace: Backtrace,
    },
    /// The input stream was already exhausted when a value was expected.
    #[snafu(display("End of stream"))]
    EndOfStream { backtrace: Backtrace },
    /// The input stream ended before the whole value of an element was read.
    #[snafu(display("Premature end of stream while reading the value of {}", tag))]
    PrematureEnd { tag: Tag, backtrace: Backtrace },
    /// The declared value length of an element
    /// is larger than the bytes remaining in the stream.
    #[snafu(display(
        "Value of {} is larger ({} bytes) than the remaining bytes in the stream ({})",
        tag,
        length,
        available
    ))]
    ValueLargerThanStream {
        tag: Tag,
        length: u32,
        available: u64,
        backtrace: Backtrace,
    },
    /// A value field could not be allocated.
    #[snafu(display("Could not allocate {} bytes for the value of {}", length, tag))]
    MemoryExhausted {
        tag: Tag,
        length: u32,
        source: TryReserveError,
        backtrace: Backtrace,
    },
    /// A partial value was requested from an offset outside of the value.
    #[snafu(display("Offset {} is out of the value's bounds ({} bytes)", offset, length))]
    InvalidOffset {
        offset: u32,
        length: u32,
        backtrace: Backtrace,
    },
    /// A partial value request goes past the end of the value.
    #[snafu(display(
        "Requested {} bytes from offset {}, but the value is only {} bytes long",
        count,
        offset,
        length
    ))]
    TooManyBytesRequested {
        offset: u32,
        count: usize,
        length: u32,
        backtrace: Backtrace,
    },
    /// The value field is inconsistent with its value representation.
    #[snafu(display("Corrupted value of {}: {}", tag, reason))]
    CorruptedData {
        tag: Tag,
        reason: &'static str,
        backtrace: Backtrace,
    },
    /// A textual value could not be converted to the element's representation.
    #[snafu(display("Invalid value `{}` for {}", value, tag))]
    InvalidValue {
        tag: Tag,
        value: String,
        backtrace: Backtrace,
    },
    /// Reading from an input stream failed.
    #[snafu(display("Could not read value of {}", tag))]
    ReadValue {
        tag: Tag,
        source: io::Error,
        backtrace: Backtrace,
    },
    /// Writing to an output stream failed.
    #[snafu(display("Could not write {}", tag))]
    WriteValue {
        tag: Tag,
        source: io::Error,
        backtrace: Backtrace,
    },
    /// The deferred value source could not be opened.
    #[snafu(display("Could not open the deferred value source of {}", tag))]
    OpenSource {
        tag: Tag,
        source: io::Error,
        backtrace: Backtrace,
    },
    /// The element header could not be encoded.
    #[snafu(display("Could not encode the header of {}", tag))]
    EncodeHeader {
        tag: Tag,
        #[snafu(backtrace)]
        source: dicom_stream_encoding::encode::Error,
    },
    /// The transfer syntax does not allow writing element headers.
    #[snafu(display("Unsupported transfer syntax {}", uid))]
    UnsupportedTransferSyntax {
        uid: &'static str,
        backtrace: Backtrace,
    },
}

impl Error {
    /// Whether this error describes input data
    /// which ends before the declared length of a value,
    /// either while reading or while deferring it.
    pub fn is_invalid_stream(&self) -> bool {
        matches!(
            self,
            Error::PrematureEnd { .. } | Error::ValueLargerThanStream { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
