#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of the streaming DICOM element engine,
//! containing the basic concepts and data structures
//! shared by the encoding and object crates.
//!
//! The current structure of this crate is as follows:
//!
//! - [`header`] comprises various data types for DICOM element header,
//!   including common definitions for DICOM tags and value representations.
//! - [`swap`] converts value fields between byte orders.
//! - [`dictionary`] describes common behavior of DICOM data dictionaries,
//!   which translate attribute names and/or tags to a dictionary entry
//!   containing relevant information about the attribute.

pub mod dictionary;
pub mod header;
pub mod swap;

pub use dictionary::DataDictionary;
pub use header::{DataElementHeader, Length, Tag, VR};
pub use swap::NATIVE_ENDIANNESS;

// re-export crates that are part of the public API
pub use byteordered;
