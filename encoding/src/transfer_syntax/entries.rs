//! A list of compiled transfer syntax specifiers.
//!
//! - **Fully implemented** means that data sets in the transfer syntax
//!   can be read and written element by element.
//! - **Stub descriptors** serve to provide information about
//!   the transfer syntax.
//!   Encapsulated stubs can still be read and written,
//!   but the pixel data fragments are kept in their compressed form.

use super::{Codec, TransferSyntax as Ts};
use byteordered::Endianness;

// -- the three base transfer syntaxes, fully supported --

/// **Fully implemented:** Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
    Codec::None,
);

/// **Fully implemented:** Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Codec::None,
);

/// **Fully implemented:** Explicit VR Big Endian
pub const EXPLICIT_VR_BIG_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
    Codec::None,
);

// -- stubs --

/// **Stub descriptor:** Deflated Explicit VR Little Endian
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Codec::Unsupported,
);

/// **Stub descriptor:** RLE Lossless
pub const RLE_LOSSLESS: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.5",
    "RLE Lossless",
    Codec::EncapsulatedPixelData,
);

/// **Stub descriptor:** JPEG Baseline (Process 1)
pub const JPEG_BASELINE: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.4.50",
    "JPEG Baseline (Process 1)",
    Codec::EncapsulatedPixelData,
);

/// **Stub descriptor:** JPEG Lossless, Non-Hierarchical, First-Order Prediction
pub const JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
    Codec::EncapsulatedPixelData,
);

/// **Stub descriptor:** JPEG 2000 Image Compression (Lossless Only)
pub const JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 Image Compression (Lossless Only)",
    Codec::EncapsulatedPixelData,
);

/// **Stub descriptor:** JPEG 2000 Image Compression
pub const JPEG_2000_IMAGE_COMPRESSION: Ts = Ts::new_ele(
    "1.2.840.10008.1.2.4.91",
    "JPEG 2000 Image Compression",
    Codec::EncapsulatedPixelData,
);

/// All transfer syntaxes listed in this module.
pub(crate) const ALL: &[Ts] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    RLE_LOSSLESS,
    JPEG_BASELINE,
    JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION,
    JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY,
    JPEG_2000_IMAGE_COMPRESSION,
];
