#![allow(clippy::derive_partial_eq_without_eq)]
//! This crate contains the element engine:
//! DICOM data elements which move their values in and out of byte streams
//! one step at a time.
//!
//! A transfer is driven from the outside.
//! The caller decodes an element header,
//! creates a [`DicomElement`] from it,
//! starts a pass with [`transfer_init`](DicomObject::transfer_init),
//! and calls [`read`](DicomObject::read) or [`write`](DicomObject::write)
//! until the element reports [`TransferStatus::Complete`].
//! A [`TransferStatus::Suspended`] outcome is not an error:
//! the stream could not move more data at that time,
//! and the same call should be repeated once it can.
//!
//! Large values read from a seekable stream are not loaded.
//! The element keeps a [`DeferredValue`](source::DeferredValue)
//! instead, from which the value is loaded on first access,
//! read piecewise with [`DicomElement::get_partial_value`],
//! or written through a [`WriteCache`].
//!
//! # Example
//!
//! ```
//! use dicom_stream_core::{DataElementHeader, Length, Tag, VR};
//! use dicom_stream_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
//! use dicom_stream_object::stream::{BufferInputStream, BufferOutputStream};
//! use dicom_stream_object::{DicomElement, DicomObject, TransferStatus};
//! # fn main() -> Result<(), dicom_stream_object::Error> {
//! let ts = EXPLICIT_VR_LITTLE_ENDIAN;
//! let header = DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(8));
//! let mut elem = DicomElement::with_header(header);
//!
//! let mut input = BufferInputStream::new();
//! input.push(b"Doe^");
//! elem.transfer_init();
//! assert_eq!(elem.read(&mut input, &ts, 4096)?, TransferStatus::Suspended);
//! input.push(b"John");
//! assert_eq!(elem.read(&mut input, &ts, 4096)?, TransferStatus::Complete);
//! elem.transfer_end();
//! assert_eq!(elem.get_string(0, true)?, "Doe^John");
//!
//! let mut output = BufferOutputStream::new(1024);
//! elem.transfer_init();
//! assert_eq!(elem.write(&mut output, &ts, None)?, TransferStatus::Complete);
//! elem.transfer_end();
//! assert_eq!(output.data().len(), 16);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod element;
pub mod error;
pub mod object;
pub mod policy;
pub mod print;
pub mod source;
pub mod stream;

pub use crate::cache::{FileCache, WriteCache};
pub use crate::element::DicomElement;
pub use crate::error::{Error, Result};
pub use crate::object::{DicomObject, ObjectState, TransferState, TransferStatus};
pub use crate::policy::{CodecPolicy, MAX_READ_LENGTH, TAG_INFO_LENGTH};
pub use crate::print::{PrintOptions, XmlOptions};

// re-export the crates this one builds upon
pub use dicom_stream_core;
pub use dicom_stream_encoding;
