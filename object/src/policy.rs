//! Codec policy options,
//! consulted at the decision points of reading, writing and parsing.

/// The default threshold above which values of seekable streams
/// are not read immediately but deferred to their first access.
pub const MAX_READ_LENGTH: u32 = 4096;

/// The size of the largest element header (tag, VR, reserved bytes, length).
pub const TAG_INFO_LENGTH: usize = 12;

/// Options which govern how element values are decoded.
///
/// The policy is passed explicitly to every entry point that needs it.
/// Elements keep a copy for the value loads they perform on their own
/// (see [`DicomElement::with_policy`](crate::DicomElement::with_policy)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct CodecPolicy {
    /// Keep odd value lengths as declared.
    /// When disabled, odd lengths are extended by one byte before reading,
    /// so that the following byte of the stream is consumed as padding.
    pub accept_odd_length: bool,
    /// Fix up data while it is read,
    /// such as extending odd lengths with a zero padding byte.
    pub auto_correct: bool,
    /// Parse `UN` elements of undefined length
    /// as Implicit VR Little Endian sequences (CP-246).
    pub cp246: bool,
    /// Write digital signature data in the format of old toolkits,
    /// in which `UN` elements of undefined length keep their VR.
    pub old_signature_format: bool,
    /// Detect the transfer syntax of a data set from its first element,
    /// overriding the one declared in the file meta group.
    pub auto_detect_dataset_ts: bool,
    /// The value length threshold for deferring values of seekable streams.
    pub max_read_length: u32,
}

impl Default for CodecPolicy {
    fn default() -> Self {
        CodecPolicy {
            accept_odd_length: true,
            auto_correct: true,
            cp246: true,
            old_signature_format: false,
            auto_detect_dataset_ts: false,
            max_read_length: MAX_READ_LENGTH,
        }
    }
}

impl CodecPolicy {
    /// Set whether odd value lengths are accepted as is.
    pub fn accept_odd_length(mut self, value: bool) -> Self {
        self.accept_odd_length = value;
        self
    }

    /// Set whether input data is corrected while being read.
    pub fn auto_correct(mut self, value: bool) -> Self {
        self.auto_correct = value;
        self
    }

    /// Set whether `UN` elements of undefined length are parsed as sequences.
    pub fn cp246(mut self, value: bool) -> Self {
        self.cp246 = value;
        self
    }

    /// Set whether the old digital signature format is produced.
    pub fn old_signature_format(mut self, value: bool) -> Self {
        self.old_signature_format = value;
        self
    }

    /// Set whether the data set transfer syntax is detected automatically.
    pub fn auto_detect_dataset_ts(mut self, value: bool) -> Self {
        self.auto_detect_dataset_ts = value;
        self
    }

    /// Set the value length threshold for deferred loading.
    pub fn max_read_length(mut self, value: u32) -> Self {
        self.max_read_length = value;
        self
    }
}
