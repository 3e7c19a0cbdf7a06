//! The common contract of DICOM objects taking part in a transfer.
//!
//! Every object carries an [`ObjectState`]:
//! its header and the progress of the read or write pass it is engaged in.
//! A pass starts with [`transfer_init`](DicomObject::transfer_init),
//! moves the object from [`TransferState::Init`] through
//! [`TransferState::InWork`] to [`TransferState::Ready`]
//! over as many `read` or `write` calls as the streams require,
//! and ends with [`transfer_end`](DicomObject::transfer_end).

use crate::cache::WriteCache;
use crate::error::{
    EncodeHeaderSnafu, IllegalCallSnafu, Result, UnsupportedTransferSyntaxSnafu, WriteValueSnafu,
};
use crate::print::{PrintOptions, XmlOptions};
use crate::stream::{InputStream, OutputStream};
use dicom_stream_core::dictionary::DynDataDictionary;
use dicom_stream_core::header::{DataElementHeader, HasLength, Header};
use dicom_stream_core::{Length, Tag, VR};
use dicom_stream_encoding::encode::EncodeTo;
use dicom_stream_encoding::TransferSyntax;
use snafu::{ensure, OptionExt, ResultExt};
use std::fmt;
use std::io;

/// The progress of an object in a read or write pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Not engaged in a transfer.
    #[default]
    NotInitialized,
    /// A transfer was initialized, but nothing was moved yet.
    Init,
    /// The transfer is under way.
    InWork,
    /// The transfer is complete.
    Ready,
}

/// The outcome of a successful read or write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// The object is completely transferred.
    Complete,
    /// The stream cannot take or provide more data at this time.
    /// The call should be repeated once it can.
    Suspended,
}

impl TransferStatus {
    /// Whether the transfer is complete.
    pub fn is_complete(self) -> bool {
        self == TransferStatus::Complete
    }
}

/// The state shared by all DICOM objects:
/// the element header and the transfer progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    header: DataElementHeader,
    transfer_state: TransferState,
    transferred_bytes: u32,
}

impl ObjectState {
    /// Create the state of an object with the given header,
    /// not engaged in a transfer.
    pub fn new(header: DataElementHeader) -> Self {
        ObjectState {
            header,
            transfer_state: TransferState::NotInitialized,
            transferred_bytes: 0,
        }
    }

    /// The object's header.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// The object's tag.
    pub fn tag(&self) -> Tag {
        self.header.tag()
    }

    /// The object's value representation.
    pub fn vr(&self) -> VR {
        self.header.vr()
    }

    /// Override the value representation.
    pub fn set_vr(&mut self, vr: VR) {
        self.header.vr = vr;
    }

    /// The stored value length.
    pub fn length(&self) -> Length {
        self.header.length()
    }

    /// Replace the stored value length.
    pub fn set_length(&mut self, len: u32) {
        self.header.len = Length(len);
    }

    /// The current transfer state.
    pub fn transfer_state(&self) -> TransferState {
        self.transfer_state
    }

    /// Move to another transfer state.
    pub fn set_transfer_state(&mut self, state: TransferState) {
        self.transfer_state = state;
    }

    /// The number of value bytes moved in the current pass.
    pub fn transferred_bytes(&self) -> u32 {
        self.transferred_bytes
    }

    /// Replace the number of value bytes moved in the current pass.
    pub fn set_transferred_bytes(&mut self, n: u32) {
        self.transferred_bytes = n;
    }

    /// Account for more value bytes moved.
    pub fn add_transferred_bytes(&mut self, n: u32) {
        self.transferred_bytes = self.transferred_bytes.saturating_add(n);
    }

    /// Begin a new transfer pass.
    pub fn transfer_init(&mut self) {
        self.transfer_state = TransferState::Init;
        self.transferred_bytes = 0;
    }

    /// Leave the current transfer pass.
    pub fn transfer_end(&mut self) {
        self.transfer_state = TransferState::NotInitialized;
    }
}

/// The interface common to all DICOM objects
/// which can be read from and written to streams.
pub trait DicomObject: fmt::Debug {
    /// The object's base state.
    fn object_state(&self) -> &ObjectState;

    /// The object's base state, mutably.
    fn object_state_mut(&mut self) -> &mut ObjectState;

    /// The object's tag.
    fn tag(&self) -> Tag {
        self.object_state().tag()
    }

    /// The object's value representation.
    fn vr(&self) -> VR {
        self.object_state().vr()
    }

    /// Override the value representation,
    /// for attributes whose representation depends on the data set.
    fn set_vr(&mut self, vr: VR) {
        self.object_state_mut().set_vr(vr)
    }

    /// The value length as stored in the object.
    fn length_field(&self) -> Length {
        self.object_state().length()
    }

    /// The current transfer state.
    fn transfer_state(&self) -> TransferState {
        self.object_state().transfer_state()
    }

    /// The number of value bytes moved in the current pass.
    fn transferred_bytes(&self) -> u32 {
        self.object_state().transferred_bytes()
    }

    /// Begin a new read or write pass.
    fn transfer_init(&mut self) {
        self.object_state_mut().transfer_init()
    }

    /// Leave the current read or write pass.
    fn transfer_end(&mut self) {
        self.object_state_mut().transfer_end()
    }

    /// The kind of object, for matching on it without downcasting.
    fn ident(&self) -> VR;

    /// Whether the object holds a value rather than other objects.
    fn is_leaf(&self) -> bool;

    /// The value multiplicity.
    fn vm(&mut self) -> Result<u32>;

    /// The value length when written in the given transfer syntax.
    fn length(&self, ts: &TransferSyntax) -> u32;

    /// The full length of the object (header and value)
    /// when written in the given transfer syntax.
    fn calc_element_length(&self, ts: &TransferSyntax) -> u32 {
        let header_size = self.tag_and_length_size(ts) as u32;
        self.length(ts).saturating_add(header_size)
    }

    /// Whether the object can be written in `new_ts`
    /// after having been read in `old_ts`.
    fn can_write_ts(&self, new_ts: &TransferSyntax, old_ts: &TransferSyntax) -> bool;

    /// Read the object's value from the stream,
    /// which is positioned right after the object's header.
    ///
    /// Values longer than `max_read_length` are deferred
    /// if the stream supports it.
    fn read(
        &mut self,
        stream: &mut dyn InputStream,
        ts: &TransferSyntax,
        max_read_length: u32,
    ) -> Result<TransferStatus>;

    /// Write the object (header and value) to the stream.
    ///
    /// Deferred values are written through the given write cache,
    /// or through a transient one.
    fn write(
        &mut self,
        stream: &mut dyn OutputStream,
        ts: &TransferSyntax,
        cache: Option<&mut WriteCache>,
    ) -> Result<TransferStatus>;

    /// Write the object in the form used to create and verify digital signatures.
    fn write_signature_format(
        &mut self,
        stream: &mut dyn OutputStream,
        ts: &TransferSyntax,
        cache: Option<&mut WriteCache>,
    ) -> Result<TransferStatus> {
        self.write(stream, ts, cache)
    }

    /// Remove the object's value.
    fn clear(&mut self) -> Result<()>;

    /// Check the consistency of the object,
    /// fixing what can be fixed if `autocorrect` is set.
    fn verify(&mut self, autocorrect: bool) -> Result<()>;

    /// Load deferred values into memory.
    fn load_all_data_into_memory(&mut self) -> Result<()>;

    /// Look for a nested object with the given tag.
    fn search(&self, _tag: Tag) -> Option<&dyn DicomObject> {
        None
    }

    /// Print the object in the info line format,
    /// at the given nesting level.
    fn print(
        &mut self,
        out: &mut dyn io::Write,
        options: &PrintOptions,
        level: usize,
        dict: &DynDataDictionary,
    ) -> io::Result<()>;

    /// Write the object in XML.
    fn write_xml(
        &mut self,
        out: &mut dyn io::Write,
        options: &XmlOptions,
        dict: &DynDataDictionary,
    ) -> io::Result<()>;

    /// The size of the object's header in the given transfer syntax.
    fn tag_and_length_size(&self, ts: &TransferSyntax) -> usize {
        ts.header_size(self.vr())
    }

    /// Write the object's header with its current length
    /// to the stream, which must have room for it.
    /// Returns the number of bytes written.
    fn write_tag_and_length(
        &self,
        stream: &mut dyn OutputStream,
        ts: &TransferSyntax,
    ) -> Result<usize> {
        let tag = self.tag();
        stream.status().context(WriteValueSnafu { tag })?;
        let encoder = ts
            .encoder_for::<Vec<u8>>()
            .context(UnsupportedTransferSyntaxSnafu { uid: ts.uid() })?;
        let header = DataElementHeader::new(tag, self.vr(), self.length_field());
        let mut buf = Vec::with_capacity(crate::policy::TAG_INFO_LENGTH);
        let size = encoder
            .encode_element_header(&mut buf, header)
            .context(EncodeHeaderSnafu { tag })?;
        let written = stream.write(&buf[..size]).context(WriteValueSnafu { tag })?;
        ensure!(
            written == size,
            IllegalCallSnafu {
                reason: "no room in the stream for the element header"
            }
        );
        Ok(written)
    }

    /// Whether the object is included in digital signatures.
    fn is_signable(&self) -> bool {
        self.tag().is_signable()
    }

    /// Whether the object contains values of unknown representation.
    fn contains_unknown_vr(&self) -> bool {
        self.vr() == VR::UN
    }

    /// Whether the object's value contains characters
    /// outside of the default character repertoire.
    fn contains_extended_characters(&mut self) -> bool {
        false
    }

    /// Whether the object's value depends on the Specific Character Set.
    fn is_affected_by_specific_character_set(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectState, TransferState};
    use dicom_stream_core::header::DataElementHeader;
    use dicom_stream_core::{Length, Tag, VR};

    #[test]
    fn transfer_state_cycle() {
        let mut state = ObjectState::new(DataElementHeader::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            Length(8),
        ));
        assert_eq!(state.transfer_state(), TransferState::NotInitialized);
        state.add_transferred_bytes(4);
        state.transfer_init();
        assert_eq!(state.transfer_state(), TransferState::Init);
        assert_eq!(state.transferred_bytes(), 0);
        state.set_transfer_state(TransferState::InWork);
        state.add_transferred_bytes(8);
        state.transfer_end();
        assert_eq!(state.transfer_state(), TransferState::NotInitialized);
        assert_eq!(state.transferred_bytes(), 8);
    }
}
