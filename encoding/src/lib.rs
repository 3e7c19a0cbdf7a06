//! DICOM encoding and decoding primitives.
//!
//! This crate provides the element header codecs of the streaming DICOM
//! element engine, in each of the three base transfer syntaxes.
//! It also hosts the concept of [transfer syntax specifier],
//! which can be used to produce DICOM encoders and decoders at run-time.
//!
//! For the time being, all APIs are based on synchronous I/O.
//!
//! [transfer syntax specifier]: ./transfer_syntax/index.html

pub mod decode;
pub mod encode;
pub mod transfer_syntax;

pub use byteordered;
pub use decode::Decode;
pub use encode::Encode;
pub use transfer_syntax::{Codec, TransferSyntax, TransferSyntaxIndex, TransferSyntaxRegistry};
