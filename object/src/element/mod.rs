//! The DICOM data element and its value engine.
//!
//! A [`DicomElement`] holds its value in one of two forms,
//! possibly both at once:
//!
//! - an owned value buffer, in the byte order recorded by the element;
//! - a [`DeferredValue`], from which the value can be read again
//!   at any time, for values left in their backing store.
//!
//! Values are moved in and out of streams through the resumable
//! [`read`](DicomObject::read) and [`write`](DicomObject::write)
//! operations, and can be accessed piecewise
//! with [`get_partial_value`](DicomElement::get_partial_value)
//! without loading them entirely.

use crate::cache::WriteCache;
use crate::error::{
    CorruptedDataSnafu, EndOfStreamSnafu, IllegalCallSnafu, MemoryExhaustedSnafu, OpenSourceSnafu,
    PrematureEndSnafu, ReadValueSnafu, Result, ValueLargerThanStreamSnafu, WriteValueSnafu,
};
use crate::object::{DicomObject, ObjectState, TransferState, TransferStatus};
use crate::policy::{CodecPolicy, TAG_INFO_LENGTH};
use crate::print::{self, PrintOptions, XmlOptions};
use crate::source::{DeferredValue, LoadValue};
use crate::stream::{InputStream, OutputStream};
use byteordered::Endianness;
use dicom_stream_core::dictionary::DynDataDictionary;
use dicom_stream_core::header::DataElementHeader;
use dicom_stream_core::swap::{swap_bytes, swap_if_necessary, NATIVE_ENDIANNESS};
use dicom_stream_core::{Length, Tag, VR};
use dicom_stream_encoding::TransferSyntax;
use snafu::{ensure, OptionExt, ResultExt};
use std::io;
use tracing::{debug, error, warn};

mod access;
mod partial;

/// A DICOM data element with a primitive value.
#[derive(Debug)]
pub struct DicomElement {
    state: ObjectState,
    /// byte order of the value buffer
    byte_order: Endianness,
    value: Option<Vec<u8>>,
    deferred: Option<DeferredValue>,
    policy: CodecPolicy,
}

impl DicomElement {
    /// Create an empty element.
    pub fn new<T: Into<Tag>>(tag: T, vr: VR) -> Self {
        Self::with_header(DataElementHeader::new(tag, vr, Length(0)))
    }

    /// Create an element with the given header,
    /// such as one just decoded from a stream, before reading its value.
    pub fn with_header(header: DataElementHeader) -> Self {
        Self::with_policy(header, CodecPolicy::default())
    }

    /// Create an element with the given header,
    /// which reads and loads its value according to the given policy.
    pub fn with_policy(header: DataElementHeader, policy: CodecPolicy) -> Self {
        DicomElement {
            state: ObjectState::new(header),
            byte_order: NATIVE_ENDIANNESS,
            value: None,
            deferred: None,
            policy,
        }
    }

    /// The codec policy of this element.
    pub fn policy(&self) -> CodecPolicy {
        self.policy
    }

    /// Replace the codec policy of this element.
    pub fn set_policy(&mut self, policy: CodecPolicy) {
        self.policy = policy;
    }

    /// The byte order of the value buffer.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Whether the value is held in memory.
    pub fn value_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// The deferred value source, if any.
    pub fn deferred(&self) -> Option<&DeferredValue> {
        self.deferred.as_ref()
    }

    #[inline]
    fn len_field(&self) -> u32 {
        self.state.length().0
    }

    /// Remove the value and its deferred source.
    pub fn clear(&mut self) {
        self.value = None;
        self.deferred = None;
        self.state.set_length(0);
    }

    /// Allocate a zeroed value field for the current length.
    /// Odd lengths receive one more byte for padding.
    fn new_value_field(&mut self) -> Result<Vec<u8>> {
        let len = self.len_field();
        let mut size = len as usize;
        if len % 2 == 1 {
            size += 1;
            if !self.policy.accept_odd_length {
                self.state.set_length(len + 1);
            }
        }
        let mut value = Vec::new();
        value
            .try_reserve_exact(size)
            .context(MemoryExhaustedSnafu {
                tag: self.tag(),
                length: len,
            })?;
        value.resize(size, 0);
        Ok(value)
    }

    fn post_load_value(&mut self) {
        let len = self.len_field();
        if self.policy.auto_correct && len % 2 == 1 {
            // the value field already holds a zeroed padding byte
            self.state.set_length(len + 1);
        }
    }

    /// Replace the value with a zeroed one of the given length,
    /// in native byte order.
    pub fn create_empty_value(&mut self, length: u32) -> Result<()> {
        self.fill_value(length, |_| {})
    }

    /// Replace the value with a copy of `raw`, which is in native byte order.
    ///
    /// Odd lengths are extended with a zero padding byte.
    pub fn put_value(&mut self, raw: &[u8]) -> Result<()> {
        ensure!(
            raw.len() < Length::UNDEFINED.0 as usize,
            IllegalCallSnafu {
                reason: "value too long"
            }
        );
        self.fill_value(raw.len() as u32, |value| {
            value[..raw.len()].copy_from_slice(raw)
        })
    }

    fn fill_value(&mut self, length: u32, fill: impl FnOnce(&mut [u8])) -> Result<()> {
        self.value = None;
        self.deferred = None;
        self.byte_order = NATIVE_ENDIANNESS;
        self.state.set_length(length);
        if length == 0 {
            return Ok(());
        }
        match self.new_value_field() {
            Ok(mut value) => {
                if self.len_field() % 2 == 1 {
                    self.state.set_length(length + 1);
                }
                fill(&mut value);
                self.value = Some(value);
                Ok(())
            }
            Err(e) => {
                self.state.set_length(0);
                Err(e)
            }
        }
    }

    /// Change part of the value, or append to it.
    ///
    /// With `position` equal to the current length, `raw` is appended.
    /// Otherwise the bytes at `position` are overwritten.
    /// Both the position and the current length must be multiples
    /// of the length of `raw`.
    /// The value is converted to native byte order before the change,
    /// and `raw` must be in native byte order as well.
    ///
    /// Padding bytes are part of the stored length,
    /// so they count towards alignment and can be overwritten.
    pub fn change_value(&mut self, raw: &[u8], position: u32) -> Result<()> {
        let num = u32::try_from(raw.len()).unwrap_or(u32::MAX);
        let len = self.len_field();
        ensure!(
            num != 0 && position % num == 0 && len % num == 0 && position <= len,
            IllegalCallSnafu {
                reason: "value change is misaligned or out of range"
            }
        );
        if position == len && len == 0 {
            return self.put_value(raw);
        }
        self.load_value()?;
        let tag = self.tag();
        let width = self.vr().value_width();
        let mut value = self.value.take().context(IllegalCallSnafu {
            reason: "no value available",
        })?;
        swap_if_necessary(
            NATIVE_ENDIANNESS,
            self.byte_order,
            &mut value[..len as usize],
            width,
        );
        self.byte_order = NATIVE_ENDIANNESS;
        // the value no longer matches its backing store
        self.deferred = None;

        if position == len {
            let new_len = len.checked_add(num).filter(|l| *l < Length::UNDEFINED.0);
            let new_len = match new_len {
                Some(l) => l,
                None => {
                    self.value = Some(value);
                    return IllegalCallSnafu {
                        reason: "value too long",
                    }
                    .fail();
                }
            };
            let size = new_len as usize + (new_len % 2) as usize;
            value.truncate(len as usize);
            if let Err(source) = value.try_reserve_exact(size - value.len()) {
                self.value = Some(value);
                return Err(source).context(MemoryExhaustedSnafu {
                    tag,
                    length: new_len,
                });
            }
            value.extend_from_slice(raw);
            value.resize(size, 0);
            self.state.set_length(size as u32);
        } else {
            let start = position as usize;
            value[start..start + raw.len()].copy_from_slice(raw);
        }
        self.value = Some(value);
        Ok(())
    }

    /// Take the value out of the element.
    ///
    /// With `copy`, the value is loaded if necessary
    /// and a copy is returned, leaving the element as it was.
    /// Otherwise the element gives up its value and becomes empty.
    /// The bytes are in the byte order of the element
    /// (see [`byte_order`](DicomElement::byte_order)).
    pub fn detach_value_field(&mut self, copy: bool) -> Result<Vec<u8>> {
        let len = self.len_field() as usize;
        if len == 0 {
            return Ok(Vec::new());
        }
        self.load_value()?;
        if copy {
            Ok(self
                .value
                .as_ref()
                .map(|v| v[..len].to_vec())
                .unwrap_or_default())
        } else {
            let mut value = self.value.take().unwrap_or_default();
            value.truncate(len);
            self.deferred = None;
            self.state.set_length(0);
            Ok(value)
        }
    }

    /// Free the value buffer if the value can be read again
    /// from its deferred source.
    pub fn compact(&mut self) {
        if self.deferred.is_some() && self.value.is_some() {
            debug!("compacting value of {}", self.tag());
            self.value = None;
            self.state.set_transferred_bytes(0);
        }
    }

    /// Replace the value with one kept in an external store,
    /// such as a temporary file, holding `length` bytes in `byte_order`.
    ///
    /// The length must be even.
    pub fn create_value_from_temp_file(
        &mut self,
        loader: Box<dyn LoadValue>,
        length: u32,
        byte_order: Endianness,
    ) -> Result<()> {
        ensure!(
            length % 2 == 0 && length != Length::UNDEFINED.0,
            IllegalCallSnafu {
                reason: "value length must be even"
            }
        );
        self.value = None;
        self.deferred = Some(DeferredValue::new(loader, byte_order));
        self.byte_order = byte_order;
        self.state.set_length(length);
        Ok(())
    }

    /// Reverse the bytes of every `width`-sized unit of the value,
    /// loading it if necessary.
    pub fn swap_value_field(&mut self, width: usize) -> Result<()> {
        let len = self.len_field() as usize;
        if len == 0 {
            return Ok(());
        }
        ensure!(
            width == 0 || len % width == 0,
            CorruptedDataSnafu {
                tag: self.tag(),
                reason: "value length is not a multiple of the value width",
            }
        );
        self.load_value()?;
        if let Some(value) = self.value.as_mut() {
            swap_bytes(&mut value[..len], width);
        }
        Ok(())
    }

    /// Obtain the value in the given byte order,
    /// loading it from its deferred source if necessary.
    ///
    /// The value buffer is converted in place,
    /// so that it keeps the byte order last asked for.
    pub fn get_value(&mut self, byte_order: Endianness) -> Result<&[u8]> {
        let len = self.len_field() as usize;
        if len == 0 {
            return Ok(&[]);
        }
        self.load_value()?;
        let width = self.vr().value_width();
        let current = self.byte_order;
        match self.value.as_mut() {
            Some(value) => {
                swap_if_necessary(byte_order, current, &mut value[..len], width);
                self.byte_order = byte_order;
                Ok(&value[..len])
            }
            None => IllegalCallSnafu {
                reason: "no value available",
            }
            .fail(),
        }
    }

    /// Load the value from its deferred source,
    /// unless it is already in memory.
    pub fn load_value(&mut self) -> Result<()> {
        if self.len_field() == 0 || self.value.is_some() {
            return Ok(());
        }
        let tag = self.tag();
        let deferred = self.deferred.as_ref().context(IllegalCallSnafu {
            reason: "no value available",
        })?;
        let byte_order = deferred.byte_order();
        let mut stream = deferred.create().context(OpenSourceSnafu { tag })?;
        debug!("loading deferred value of {}", tag);
        self.state.set_transferred_bytes(0);
        let status = self.load_from(&mut *stream)?;
        self.byte_order = byte_order;
        ensure!(status.is_complete(), PrematureEndSnafu { tag });
        Ok(())
    }

    /// Read the rest of the value from the stream, as far as it goes.
    fn load_from(&mut self, stream: &mut dyn InputStream) -> Result<TransferStatus> {
        if self.len_field() == 0 {
            return Ok(TransferStatus::Complete);
        }
        let tag = self.tag();
        stream.status().context(ReadValueSnafu { tag })?;
        ensure!(!stream.eos(), EndOfStreamSnafu);

        let mut value = match self.value.take() {
            Some(value) => value,
            None => self.new_value_field()?,
        };
        let len = self.len_field();
        let start = self.state.transferred_bytes() as usize;
        let result = stream.read(&mut value[start..len as usize]);
        self.value = Some(value);
        let n = result.context(ReadValueSnafu { tag })?;
        self.state.add_transferred_bytes(n as u32);

        if self.state.transferred_bytes() == len {
            self.post_load_value();
            Ok(TransferStatus::Complete)
        } else if stream.eos() {
            PrematureEndSnafu { tag }.fail()
        } else {
            Ok(TransferStatus::Suspended)
        }
    }

    /// Replace this element with a copy of another element
    /// of the same kind.
    pub fn copy_from(&mut self, other: &DicomElement) -> Result<()> {
        ensure!(
            self.ident() == other.ident(),
            IllegalCallSnafu {
                reason: "cannot copy from an element of another kind"
            }
        );
        *self = other.clone();
        Ok(())
    }

    /// The value as printed in info lines.
    pub fn printed_value(&mut self) -> String {
        if self.len_field() == 0 {
            return "(no value available)".to_string();
        }
        if self.value.is_none() && self.deferred.is_some() {
            return "(not loaded)".to_string();
        }
        let vr = self.vr();
        match self.get_string_array(true) {
            Ok(text) if vr.is_string() => format!("[{}]", text),
            Ok(text) => text,
            Err(_) => "(no value available)".to_string(),
        }
    }

    /// The value multiplicity as printed in info lines,
    /// without loading deferred values.
    pub fn printed_vm(&mut self) -> u32 {
        if self.value.is_none() && self.vr().is_string() {
            // counting string values would load them
            return u32::from(self.len_field() > 0);
        }
        self.vm().unwrap_or(0)
    }
}

impl Clone for DicomElement {
    fn clone(&self) -> Self {
        let mut state = self.state.clone();
        let value = self.value.as_ref().map(|v| {
            let len = state.length().0 as usize;
            let mut copy = v[..len].to_vec();
            if len % 2 == 1 {
                copy.push(0);
                state.set_length(len as u32 + 1);
            }
            copy
        });
        DicomElement {
            state,
            byte_order: self.byte_order,
            value,
            deferred: self.deferred.clone(),
            policy: self.policy,
        }
    }
}

impl DicomObject for DicomElement {
    fn object_state(&self) -> &ObjectState {
        &self.state
    }

    fn object_state_mut(&mut self) -> &mut ObjectState {
        &mut self.state
    }

    fn ident(&self) -> VR {
        self.vr()
    }

    fn is_leaf(&self) -> bool {
        true
    }

    fn vm(&mut self) -> Result<u32> {
        access::vm(self)
    }

    fn length(&self, _ts: &TransferSyntax) -> u32 {
        self.len_field()
    }

    fn can_write_ts(&self, new_ts: &TransferSyntax, _old_ts: &TransferSyntax) -> bool {
        !new_ts.is_unsupported()
    }

    fn read(
        &mut self,
        stream: &mut dyn InputStream,
        ts: &TransferSyntax,
        max_read_length: u32,
    ) -> Result<TransferStatus> {
        match self.state.transfer_state() {
            TransferState::NotInitialized => {
                return IllegalCallSnafu {
                    reason: "read outside of a transfer",
                }
                .fail()
            }
            TransferState::Ready => return Ok(TransferStatus::Complete),
            TransferState::Init | TransferState::InWork => {}
        }
        ensure!(
            self.length_field().is_defined(),
            IllegalCallSnafu {
                reason: "element value of undefined length"
            }
        );
        let tag = self.tag();
        self.byte_order = ts.endianness();

        if self.state.transfer_state() == TransferState::Init && self.len_field() == 0 {
            self.value = None;
            self.deferred = None;
            self.state.set_transfer_state(TransferState::Ready);
            return Ok(TransferStatus::Complete);
        }

        stream.status().context(ReadValueSnafu { tag })?;
        ensure!(!stream.eos(), EndOfStreamSnafu);

        if self.state.transfer_state() == TransferState::Init {
            let len = self.len_field();
            self.deferred = None;
            if len > max_read_length {
                if let Some(loader) = stream.new_factory() {
                    let skipped = stream.skip(u64::from(len)).context(ReadValueSnafu { tag })?;
                    if skipped < u64::from(len) {
                        error!(
                            "{} larger ({}) than remaining bytes in file ({})",
                            tag, len, skipped
                        );
                        return ValueLargerThanStreamSnafu {
                            tag,
                            length: len,
                            available: skipped,
                        }
                        .fail();
                    }
                    debug!("deferring value of {} ({} bytes)", tag, len);
                    self.deferred = Some(DeferredValue::new(loader, ts.endianness()));
                }
            }
            self.value = None;
            self.state.set_transfer_state(TransferState::InWork);
        }

        if self.deferred.is_some() {
            self.state.set_transfer_state(TransferState::Ready);
            return Ok(TransferStatus::Complete);
        }
        match self.load_from(stream)? {
            TransferStatus::Complete => {
                self.state.set_transfer_state(TransferState::Ready);
                Ok(TransferStatus::Complete)
            }
            TransferStatus::Suspended => Ok(TransferStatus::Suspended),
        }
    }

    fn write(
        &mut self,
        stream: &mut dyn OutputStream,
        ts: &TransferSyntax,
        cache: Option<&mut WriteCache>,
    ) -> Result<TransferStatus> {
        match self.state.transfer_state() {
            TransferState::NotInitialized => {
                return IllegalCallSnafu {
                    reason: "write outside of a transfer",
                }
                .fail()
            }
            TransferState::Ready => return Ok(TransferStatus::Complete),
            TransferState::Init | TransferState::InWork => {}
        }
        ensure!(
            self.length_field().is_defined(),
            IllegalCallSnafu {
                reason: "element value of undefined length"
            }
        );
        let tag = self.tag();
        stream.status().context(WriteValueSnafu { tag })?;
        let byte_order = ts.endianness();

        let mut transient_cache;
        let cache = match cache {
            Some(cache) => cache,
            None => {
                transient_cache = WriteCache::new();
                &mut transient_cache
            }
        };

        // check that the value can be reached at all
        let mut access = Ok(false);
        if self.len_field() > 0 {
            if self.value.is_some() {
                self.get_value(byte_order)?;
                access = Ok(true);
            } else if let Some(id) = self.deferred.as_ref().map(DeferredValue::id) {
                cache.init(
                    id,
                    self.len_field(),
                    self.state.transferred_bytes(),
                    byte_order,
                );
                access = cache
                    .fill_buffer(self)
                    .map(|_| !cache.buffer_is_empty());
            }
        }

        if self.state.transfer_state() == TransferState::Init {
            let avail = stream.avail();
            if avail < TAG_INFO_LENGTH as u64 && avail < self.tag_and_length_size(ts) as u64 {
                return Ok(TransferStatus::Suspended);
            }
            if !matches!(access, Ok(true)) && self.len_field() > 0 {
                match &access {
                    Err(e) => warn!("value of {} is not accessible ({}), writing it empty", tag, e),
                    Ok(_) => warn!("value of {} is not accessible, writing it empty", tag),
                }
                self.state.set_length(0);
            }
            self.write_tag_and_length(stream, ts)?;
            self.state.set_transfer_state(TransferState::InWork);
            self.state.set_transferred_bytes(0);
        }

        let len = self.len_field();
        if self.state.transferred_bytes() == len {
            self.state.set_transfer_state(TransferState::Ready);
            return Ok(TransferStatus::Complete);
        }
        match access {
            Ok(true) => {}
            Ok(false) => {
                return IllegalCallSnafu {
                    reason: "no value available",
                }
                .fail()
            }
            Err(e) => return Err(e),
        }

        if let Some(value) = &self.value {
            let start = self.state.transferred_bytes() as usize;
            let n = stream
                .write(&value[start..len as usize])
                .context(WriteValueSnafu { tag })?;
            self.state.add_transferred_bytes(n as u32);
            stream.status().context(WriteValueSnafu { tag })?;
        } else {
            loop {
                cache.fill_buffer(self)?;
                let buffered = cache.content_length();
                let n = cache.write_buffer(stream).context(WriteValueSnafu { tag })?;
                self.state.add_transferred_bytes(n as u32);
                stream.status().context(WriteValueSnafu { tag })?;
                if buffered == 0 || n < buffered || self.state.transferred_bytes() == len {
                    break;
                }
            }
        }

        if self.state.transferred_bytes() == len {
            self.state.set_transfer_state(TransferState::Ready);
            Ok(TransferStatus::Complete)
        } else {
            Ok(TransferStatus::Suspended)
        }
    }

    fn clear(&mut self) -> Result<()> {
        DicomElement::clear(self);
        Ok(())
    }

    fn verify(&mut self, autocorrect: bool) -> Result<()> {
        let tag = self.tag();
        let len = self.len_field();
        ensure!(
            self.length_field().is_defined(),
            CorruptedDataSnafu {
                tag,
                reason: "element value of undefined length",
            }
        );
        if len == 0 {
            return Ok(());
        }
        ensure!(
            self.value.is_some() || self.deferred.is_some(),
            CorruptedDataSnafu {
                tag,
                reason: "no value available",
            }
        );
        if let Some(value) = &self.value {
            ensure!(
                value.len() >= len as usize,
                CorruptedDataSnafu {
                    tag,
                    reason: "value field shorter than its length",
                }
            );
        }
        if len % 2 == 1 {
            if autocorrect && self.value.is_some() {
                warn!("correcting odd value length of {}", tag);
                // the value field already holds a zeroed padding byte
                self.state.set_length(len + 1);
            } else {
                return CorruptedDataSnafu {
                    tag,
                    reason: "odd value length",
                }
                .fail();
            }
        }
        let width = self.vr().value_width();
        ensure!(
            width <= 1 || self.len_field() as usize % width == 0,
            CorruptedDataSnafu {
                tag,
                reason: "value length is not a multiple of the value width",
            }
        );
        Ok(())
    }

    fn load_all_data_into_memory(&mut self) -> Result<()> {
        self.load_value()
    }

    fn print(
        &mut self,
        out: &mut dyn io::Write,
        options: &PrintOptions,
        level: usize,
        dict: &DynDataDictionary,
    ) -> io::Result<()> {
        let value = self.printed_value();
        let vm = self.printed_vm();
        let line = print::InfoLine {
            tag: self.tag(),
            vr: Some(self.vr()),
            name: print::tag_name(dict, self.tag()),
            value: Some(value.as_str()),
            length: self.length_field(),
            vm,
            level,
            options: *options,
        };
        print::print_info_line(out, &line)
    }

    fn write_xml(
        &mut self,
        out: &mut dyn io::Write,
        options: &XmlOptions,
        dict: &DynDataDictionary,
    ) -> io::Result<()> {
        let loaded = self.value.is_some() || self.len_field() == 0;
        let value = if loaded {
            self.get_string_array(false).ok()
        } else {
            None
        };
        let vm = self.printed_vm();
        let element = print::XmlElement {
            tag: self.tag(),
            vr: self.vr(),
            vm,
            length: self.length_field(),
            name: print::tag_name(dict, self.tag()),
            loaded,
            value: value.as_deref(),
            options: *options,
        };
        writeln!(out, "{}", element)
    }

    fn contains_extended_characters(&mut self) -> bool {
        if !self.vr().is_string() {
            return false;
        }
        match self.get_value(NATIVE_ENDIANNESS) {
            Ok(value) => value.iter().any(|b| *b >= 0x80),
            Err(_) => false,
        }
    }

    fn is_affected_by_specific_character_set(&self) -> bool {
        matches!(
            self.vr(),
            VR::LO | VR::LT | VR::PN | VR::SH | VR::ST | VR::UC | VR::UT
        )
    }
}
