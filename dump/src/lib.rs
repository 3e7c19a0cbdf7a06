#![allow(clippy::derive_partial_eq_without_eq)]
//! DICOM data dumping library
//!
//! This is a helper library
//! for dumping the contents of DICOM files in a human readable way,
//! one info line per element.
//! Files are never loaded as a whole:
//! the dump walks the byte stream element by element,
//! and values larger than the configured maximum read length
//! stay in the file and are printed as `(not loaded)`.
//!
//! # Examples
//!
//! A quick and easy way to dump the contents of a DICOM file
//! is via [`dump_file`]
//! (or [`dump_file_to`] to print to an arbitrary writer).
//!
//! ```no_run
//! use dicom_stream_dump::dump_file;
//!
//! dump_file("path/to/file.dcm")?;
//! # Result::<(), Box<dyn std::error::Error>>::Ok(())
//! ```
//!
//! See the [`DumpOptions`] builder for additional dumping options.
//!
//! ```no_run
//! use dicom_stream_dump::{ColorMode, DumpOptions};
//!
//! let mut options = DumpOptions::new();
//! options
//!     // print a tree of attribute names
//!     .tree(true)
//!     // never cut long values
//!     .no_limit(true)
//!     .color_mode(ColorMode::Never)
//!     .dump_file("path/to/file2.dcm")?;
//! # Result::<(), Box<dyn std::error::Error>>::Ok(())
//! ```
use dicom_stream_core::dictionary::BuiltinDataDictionary;
use dicom_stream_core::header::{DataElementHeader, HasLength};
use dicom_stream_core::{Length, Tag, VR};
use dicom_stream_encoding::decode::{self, DecodeFrom};
use dicom_stream_encoding::transfer_syntax::entries::{
    EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
};
use dicom_stream_encoding::{TransferSyntax, TransferSyntaxRegistry};
use dicom_stream_object::print::{tag_name, InfoLine, PrintOptions};
use dicom_stream_object::stream::{FileInputStream, InputStream, StreamReader};
use dicom_stream_object::{CodecPolicy, DicomElement, DicomObject};
use owo_colors::*;
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::fmt::{self, Display, Formatter};
use std::io::{self, stdout, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// The size of the file preamble, including the `DICM` magic code.
const PREAMBLE_LENGTH: usize = 132;

/// An error which may occur while dumping a DICOM file.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not open file '{}'", path.display()))]
    OpenFile {
        path: PathBuf,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Could not read the file preamble"))]
    ReadPreamble {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Could not return to a marked stream position"))]
    Rewind {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Could not decode element header at position {}", position))]
    DecodeHeader {
        position: u64,
        source: decode::Error,
    },
    #[snafu(display("Could not read element {}", tag))]
    ReadElement {
        tag: Tag,
        source: dicom_stream_object::Error,
    },
    #[snafu(display("Element {} ended before its value was complete", tag))]
    IncompleteElement { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Unknown transfer syntax '{}'", uid))]
    UnknownTransferSyntax { uid: String, backtrace: Backtrace },
    #[snafu(display("Unsupported transfer syntax {} ({})", uid, name))]
    UnsupportedTransferSyntax {
        uid: &'static str,
        name: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not print the dump"))]
    Print {
        backtrace: Backtrace,
        source: io::Error,
    },
}

impl Error {
    /// Whether the output was closed before the dump was complete,
    /// as happens when piping into `head`.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Print { source, .. } if source.kind() == io::ErrorKind::BrokenPipe)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Options and flags to configure how to dump a DICOM file.
///
/// This is a builder which exposes the various options available
/// for printing the contents of the DICOM file in a readable way.
///
/// Once set up,
/// the [`dump_file`] or [`dump_file_to`] methods can be used
/// to dump a file on disk.
/// [`dump_stream_to`] works on any input stream,
/// such as an in-memory buffer.
///
/// [`dump_file`]: DumpOptions::dump_file
/// [`dump_file_to`]: DumpOptions::dump_file_to
/// [`dump_stream_to`]: DumpOptions::dump_stream_to
///
/// # Example
///
/// ```no_run
/// use dicom_stream_dump::{ColorMode, DumpOptions};
/// use dicom_stream_object::CodecPolicy;
///
/// let mut options = DumpOptions::new();
/// options
///     // no limit for long values
///     .no_limit(true)
///     // leave values over 64 KiB in the file
///     .policy(CodecPolicy::default().max_read_length(64 * 1024))
///     // never print colored output
///     .color_mode(ColorMode::Never)
///     // dump to stdout
///     .dump_file("/path_to_file")?;
/// # Result::<(), Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct DumpOptions {
    /// whether to produce colored output
    pub color: ColorMode,
    /// print a tree of attribute names instead of tags
    pub tree: bool,
    /// never cut long values
    pub no_limit: bool,
    /// read the input as a bare data set,
    /// without preamble and file meta group
    pub no_meta: bool,
    /// the transfer syntax UID of the data set,
    /// overriding the one declared in the file meta group
    pub transfer_syntax: Option<String>,
    /// load all values regardless of their length
    pub load_all: bool,
    /// the codec policy used to read elements
    pub policy: CodecPolicy,
}

impl DumpOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the output color mode.
    pub fn color_mode(&mut self, color: ColorMode) -> &mut Self {
        self.color = color;
        self
    }

    /// Set whether to print a tree of attribute names.
    pub fn tree(&mut self, tree: bool) -> &mut Self {
        self.tree = tree;
        self
    }

    /// Set whether to remove the maximum length restriction
    /// for printed values.
    pub fn no_limit(&mut self, no_limit: bool) -> &mut Self {
        self.no_limit = no_limit;
        self
    }

    /// Set whether the input is a bare data set
    /// without preamble and file meta group.
    pub fn no_meta(&mut self, no_meta: bool) -> &mut Self {
        self.no_meta = no_meta;
        self
    }

    /// Read the data set in the transfer syntax with the given UID.
    pub fn transfer_syntax(&mut self, uid: impl Into<String>) -> &mut Self {
        self.transfer_syntax = Some(uid.into());
        self
    }

    /// Set whether to load all values,
    /// ignoring the maximum read length of the policy.
    pub fn load_all(&mut self, load_all: bool) -> &mut Self {
        self.load_all = load_all;
        self
    }

    /// Set the codec policy.
    pub fn policy(&mut self, policy: CodecPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    /// Dump the contents of a DICOM file to standard output.
    pub fn dump_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.dump_file_impl(stdout(), path.as_ref(), true)
    }

    /// Dump the contents of a DICOM file to the given writer.
    pub fn dump_file_to(&self, to: impl Write, path: impl AsRef<Path>) -> Result<()> {
        self.dump_file_impl(to, path.as_ref(), false)
    }

    /// Dump the contents of a DICOM input stream to the given writer.
    pub fn dump_stream_to(&self, mut to: impl Write, stream: &mut dyn InputStream) -> Result<()> {
        self.apply_color_mode(false);
        DumpWalker::new(&mut to, self).dump(stream)
    }

    fn dump_file_impl(&self, mut to: impl Write, path: &Path, to_stdout: bool) -> Result<()> {
        self.apply_color_mode(to_stdout);
        let mut stream = FileInputStream::open(path).context(OpenFileSnafu { path })?;
        DumpWalker::new(&mut to, self).dump(&mut stream)
    }

    fn apply_color_mode(&self, to_stdout: bool) {
        match (self.color, to_stdout) {
            (ColorMode::Never, _) => owo_colors::set_override(false),
            (ColorMode::Always, _) => owo_colors::set_override(true),
            (ColorMode::Auto, false) => owo_colors::set_override(false),
            (ColorMode::Auto, true) => owo_colors::unset_override(),
        }
    }

    fn print_options(&self) -> PrintOptions {
        PrintOptions::default()
            .tree(self.tree)
            .shorten_long_values(!self.no_limit)
    }
}

/// Enumeration of output coloring modes.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ColorMode {
    /// Produce colored output if supported by the destination
    /// (namely, if the destination is a terminal).
    /// When calling [`dump_file_to`](DumpOptions::dump_file_to)
    /// or [`dump_stream_to`](DumpOptions::dump_stream_to),
    /// the output will not be colored.
    ///
    /// This is the default behavior.
    #[default]
    Auto,
    /// Never produce colored output.
    Never,
    /// Always produce colored output.
    Always,
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Never => f.write_str("never"),
            ColorMode::Auto => f.write_str("auto"),
            ColorMode::Always => f.write_str("always"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = ColorModeError;
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "never" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            _ => Err(ColorModeError),
        }
    }
}

/// The error raised when providing an invalid color mode.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ColorModeError;

impl Display for ColorModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid color mode")
    }
}

impl std::error::Error for ColorModeError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DumpValue<T>
where
    T: ToString,
{
    TagNum(T),
    Alias(T),
    Num(T),
    Str(T),
    Nothing(T),
}

impl<T> fmt::Display for DumpValue<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DumpValue::TagNum(v) => {
                write!(f, "{}", v.if_supports_color(Stream::Stdout, |v| v.dimmed()))
            }
            DumpValue::Alias(v) => {
                write!(f, "{}", v.if_supports_color(Stream::Stdout, |v| v.bold()))
            }
            DumpValue::Num(v) => {
                write!(f, "{}", v.if_supports_color(Stream::Stdout, |v| v.cyan()))
            }
            DumpValue::Str(v) => {
                write!(f, "{}", v.if_supports_color(Stream::Stdout, |v| v.yellow()))
            }
            DumpValue::Nothing(v) => {
                write!(f, "{}", v.if_supports_color(Stream::Stdout, |v| v.italic()))
            }
        }
    }
}

/// Dump the contents of a DICOM file to stdout.
///
/// This is equivalent to `DumpOptions::new().dump_file(path)`.
pub fn dump_file(path: impl AsRef<Path>) -> Result<()> {
    DumpOptions::new().dump_file(path)
}

/// Dump the contents of a DICOM file to the given writer.
///
/// This is equivalent to `DumpOptions::new().dump_file_to(to, path)`.
pub fn dump_file_to(to: impl Write, path: impl AsRef<Path>) -> Result<()> {
    DumpOptions::new().dump_file_to(to, path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Sequence,
    Item,
    PixelSequence,
}

/// A sequence or item still open at the current stream position.
#[derive(Debug, Clone, Copy)]
struct Container {
    kind: ContainerKind,
    /// stream position right after the container,
    /// none for undefined length
    end: Option<u64>,
    /// the transfer syntax of the container's contents
    ts: TransferSyntax,
}

/// Walks a DICOM byte stream element by element,
/// printing one info line per element and structure boundary.
///
/// Nothing but the element being printed is held in memory.
#[derive(Debug)]
pub struct DumpWalker<'a, W: ?Sized> {
    to: &'a mut W,
    options: &'a DumpOptions,
    stack: Vec<Container>,
}

impl<'a, W> DumpWalker<'a, W>
where
    W: ?Sized + Write,
{
    /// Create a walker printing to the given writer.
    pub fn new(to: &'a mut W, options: &'a DumpOptions) -> Self {
        DumpWalker {
            to,
            options,
            stack: Vec::new(),
        }
    }

    /// Dump the stream to the end:
    /// the file meta group, if present, and the data set.
    pub fn dump(&mut self, stream: &mut dyn InputStream) -> Result<()> {
        let mut declared_ts = None;
        if !self.options.no_meta {
            if read_preamble(stream)? {
                writeln!(self.to, "# Dicom-File-Format").context(PrintSnafu)?;
                writeln!(self.to).context(PrintSnafu)?;
                writeln!(self.to, "# Dicom-Meta-Information-Header").context(PrintSnafu)?;
                writeln!(
                    self.to,
                    "# Used TransferSyntax: {}",
                    EXPLICIT_VR_LITTLE_ENDIAN.name()
                )
                .context(PrintSnafu)?;
                declared_ts = self.dump_meta_group(stream)?;
                writeln!(self.to).context(PrintSnafu)?;
            } else {
                debug!("No DICM magic code, reading a bare data set");
            }
        }

        let ts = self.data_set_ts(stream, declared_ts.as_deref())?;
        writeln!(self.to, "# Dicom-Data-Set").context(PrintSnafu)?;
        writeln!(self.to, "# Used TransferSyntax: {}", ts.name()).context(PrintSnafu)?;
        self.dump_data_set(stream, ts)
    }

    /// Print the elements of group 0002,
    /// returning the declared transfer syntax UID.
    fn dump_meta_group(&mut self, stream: &mut dyn InputStream) -> Result<Option<String>> {
        let ts = EXPLICIT_VR_LITTLE_ENDIAN;
        let mut uid = None;
        while !stream.eos() {
            stream.mark();
            let header = decode_header(stream, &ts)?;
            if header.tag.group() != 0x0002 {
                stream.putback().context(RewindSnafu)?;
                break;
            }
            let mut elem = self.read_element(stream, header, &ts)?;
            if header.tag == Tag::TRANSFER_SYNTAX_UID {
                uid = elem.get_string(0, true).ok();
            }
            self.print_element(&mut elem, 1)?;
        }
        Ok(uid)
    }

    fn data_set_ts(
        &self,
        stream: &mut dyn InputStream,
        declared: Option<&str>,
    ) -> Result<TransferSyntax> {
        let ts = match self.options.transfer_syntax.as_deref().or(declared) {
            Some(uid) => {
                let uid = uid.trim_end_matches(|c: char| c == '\0' || c == ' ');
                *TransferSyntaxRegistry::global()
                    .get(uid)
                    .context(UnknownTransferSyntaxSnafu { uid })?
            }
            None => IMPLICIT_VR_LITTLE_ENDIAN,
        };
        let ts = if self.options.policy.auto_detect_dataset_ts {
            detect_transfer_syntax(stream, ts)?
        } else {
            ts
        };
        ensure!(
            !ts.is_unsupported(),
            UnsupportedTransferSyntaxSnafu {
                uid: ts.uid(),
                name: ts.name(),
            }
        );
        Ok(ts)
    }

    fn dump_data_set(&mut self, stream: &mut dyn InputStream, ts: TransferSyntax) -> Result<()> {
        loop {
            self.close_finished(stream.tell())?;
            if stream.eos() {
                break;
            }
            let current_ts = self.stack.last().map_or(ts, |c| c.ts);
            let header = decode_header(stream, &current_ts)?;
            let level = self.stack.len() + 1;
            let defined = header.length().is_defined();

            match header.tag {
                Tag::ITEM => {
                    if self.current_kind() == Some(ContainerKind::PixelSequence) {
                        // a fragment of encapsulated pixel data
                        let fragment = DataElementHeader::new(Tag::ITEM, VR::OB, header.len);
                        let mut elem = self.read_element(stream, fragment, &current_ts)?;
                        self.print_element(&mut elem, level)?;
                        continue;
                    }
                    if self.current_kind() != Some(ContainerKind::Sequence) {
                        warn!("Item outside of a sequence at position {}", stream.tell());
                    }
                    let text = if defined {
                        "(Item with explicit length)"
                    } else {
                        "(Item with undefined length)"
                    };
                    self.print_structure(header.tag, None, text, header.len, 1, level)?;
                    self.open(ContainerKind::Item, stream.tell(), header.len, current_ts);
                }
                Tag::ITEM_DELIMITER => {
                    self.close(ContainerKind::Item, header.tag, "(ItemDelimitationItem)")?
                }
                Tag::SEQUENCE_DELIMITER => self.close(
                    ContainerKind::Sequence,
                    header.tag,
                    "(SequenceDelimitationItem)",
                )?,
                Tag::PIXEL_DATA if !defined => {
                    self.print_structure(
                        header.tag,
                        Some(header.vr),
                        "(PixelSequence)",
                        header.len,
                        1,
                        level,
                    )?;
                    self.open(
                        ContainerKind::PixelSequence,
                        stream.tell(),
                        header.len,
                        current_ts,
                    );
                }
                _ if header.vr == VR::SQ || (header.vr == VR::UN && !defined) => {
                    // undefined length UN is a sequence in implicit VR little endian
                    let inner_ts = if header.vr == VR::UN && self.options.policy.cp246 {
                        IMPLICIT_VR_LITTLE_ENDIAN
                    } else {
                        current_ts
                    };
                    let text = if defined {
                        "(Sequence with explicit length)"
                    } else {
                        "(Sequence with undefined length)"
                    };
                    self.print_structure(header.tag, Some(header.vr), text, header.len, 1, level)?;
                    self.open(ContainerKind::Sequence, stream.tell(), header.len, inner_ts);
                }
                _ => {
                    let mut elem = self.read_element(stream, header, &current_ts)?;
                    self.print_element(&mut elem, level)?;
                }
            }
        }
        if !self.stack.is_empty() {
            warn!(
                "Data set ended inside of {} open sequences or items",
                self.stack.len()
            );
        }
        Ok(())
    }

    fn current_kind(&self) -> Option<ContainerKind> {
        self.stack.last().map(|c| c.kind)
    }

    fn open(&mut self, kind: ContainerKind, position: u64, len: Length, ts: TransferSyntax) {
        self.stack.push(Container {
            kind,
            end: len.get().map(|len| position + u64::from(len)),
            ts,
        });
    }

    /// Close the containers of defined length which end at the position,
    /// printing the delimiters a re-encoding with undefined length would use.
    fn close_finished(&mut self, position: u64) -> Result<()> {
        while let Some(container) = self.stack.last() {
            match container.end {
                Some(end) if end <= position => {}
                _ => break,
            }
            let kind = container.kind;
            self.stack.pop();
            let level = self.stack.len() + 1;
            match kind {
                ContainerKind::Item => self.print_structure(
                    Tag::ITEM_DELIMITER,
                    None,
                    "(ItemDelimitationItem for re-encoding)",
                    Length(0),
                    0,
                    level,
                )?,
                ContainerKind::Sequence | ContainerKind::PixelSequence => self.print_structure(
                    Tag::SEQUENCE_DELIMITER,
                    None,
                    "(SequenceDelimitationItem for re-encod.)",
                    Length(0),
                    0,
                    level,
                )?,
            }
        }
        Ok(())
    }

    /// Close the innermost container on an explicit delimiter.
    fn close(&mut self, kind: ContainerKind, tag: Tag, text: &str) -> Result<()> {
        let matches = match (kind, self.current_kind()) {
            (ContainerKind::Item, Some(ContainerKind::Item)) => true,
            (
                ContainerKind::Sequence,
                Some(ContainerKind::Sequence) | Some(ContainerKind::PixelSequence),
            ) => true,
            _ => false,
        };
        if matches {
            self.stack.pop();
        } else {
            warn!("Unexpected delimiter {}", tag);
        }
        let level = self.stack.len() + 1;
        self.print_structure(tag, None, text, Length(0), 0, level)
    }

    fn read_element(
        &self,
        stream: &mut dyn InputStream,
        header: DataElementHeader,
        ts: &TransferSyntax,
    ) -> Result<DicomElement> {
        let max_read_length = if self.options.load_all {
            u32::MAX
        } else {
            self.options.policy.max_read_length
        };
        let mut elem = DicomElement::with_policy(header, self.options.policy);
        elem.transfer_init();
        let status = elem
            .read(stream, ts, max_read_length)
            .context(ReadElementSnafu { tag: header.tag })?;
        ensure!(
            status.is_complete(),
            IncompleteElementSnafu { tag: header.tag }
        );
        elem.transfer_end();
        Ok(elem)
    }

    fn print_element(&mut self, elem: &mut DicomElement, level: usize) -> Result<()> {
        let value = elem.printed_value();
        let vm = elem.printed_vm();
        let shade: fn(String) -> DumpValue<String> = if value.starts_with('(') {
            DumpValue::Nothing
        } else if elem.vr().is_string() {
            DumpValue::Str
        } else {
            DumpValue::Num
        };
        let line = InfoLine {
            tag: elem.tag(),
            vr: Some(elem.vr()),
            name: tag_name(&BuiltinDataDictionary, elem.tag()),
            value: Some(value.as_str()),
            length: elem.length_field(),
            vm,
            level,
            options: self.options.print_options(),
        };
        self.write_line(&line, shade)
    }

    fn print_structure(
        &mut self,
        tag: Tag,
        vr: Option<VR>,
        text: &str,
        length: Length,
        vm: u32,
        level: usize,
    ) -> Result<()> {
        let line = InfoLine {
            tag,
            vr,
            name: tag_name(&BuiltinDataDictionary, tag),
            value: Some(text),
            length,
            vm,
            level,
            options: self.options.print_options(),
        };
        self.write_line(&line, DumpValue::Nothing)
    }

    fn write_line(
        &mut self,
        line: &InfoLine,
        shade: fn(String) -> DumpValue<String>,
    ) -> Result<()> {
        let (start, value, end) = line.parts();
        writeln!(
            self.to,
            "{}{}{}",
            DumpValue::TagNum(start),
            shade(value),
            DumpValue::Alias(end)
        )
        .context(PrintSnafu)
    }
}

/// Read the preamble and the `DICM` magic code,
/// or return to the start of the stream if there is none.
fn read_preamble(stream: &mut dyn InputStream) -> Result<bool> {
    stream.mark();
    let mut preamble = [0u8; PREAMBLE_LENGTH];
    let mut filled = 0;
    while filled < PREAMBLE_LENGTH {
        let n = stream
            .read(&mut preamble[filled..])
            .context(ReadPreambleSnafu)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == PREAMBLE_LENGTH && &preamble[128..] == b"DICM" {
        return Ok(true);
    }
    stream.putback().context(RewindSnafu)?;
    Ok(false)
}

fn decode_header(stream: &mut dyn InputStream, ts: &TransferSyntax) -> Result<DataElementHeader> {
    let position = stream.tell();
    let decoder = ts
        .decoder_for::<dyn Read>()
        .context(UnsupportedTransferSyntaxSnafu {
            uid: ts.uid(),
            name: ts.name(),
        })?;
    let mut reader = StreamReader::new(stream);
    let (header, _) = decoder
        .decode_header(&mut reader)
        .context(DecodeHeaderSnafu { position })?;
    Ok(header)
}

/// Guess the transfer syntax of a data set from its first element header.
///
/// A valid VR right after the tag means explicit VR,
/// and a group number which only makes sense when read in big endian
/// means big endian.
fn detect_transfer_syntax(
    stream: &mut dyn InputStream,
    declared: TransferSyntax,
) -> Result<TransferSyntax> {
    if stream.avail() < 6 {
        return Ok(declared);
    }
    stream.mark();
    let mut start = [0u8; 6];
    let mut filled = 0;
    while filled < start.len() {
        let n = stream.read(&mut start[filled..]).context(ReadPreambleSnafu)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    stream.putback().context(RewindSnafu)?;
    if filled < start.len() {
        return Ok(declared);
    }

    let explicit = VR::from_binary([start[4], start[5]]).is_some();
    let group_le = u16::from_le_bytes([start[0], start[1]]);
    let group_be = u16::from_be_bytes([start[0], start[1]]);
    let big_endian = group_le > 0x00FF && group_be <= 0x00FF;

    let detected = match (explicit, big_endian) {
        (true, true) => EXPLICIT_VR_BIG_ENDIAN,
        (true, false)
            if declared.is_explicit_vr() && declared.uid() != EXPLICIT_VR_BIG_ENDIAN.uid() =>
        {
            declared
        }
        (true, false) => EXPLICIT_VR_LITTLE_ENDIAN,
        (false, _) => IMPLICIT_VR_LITTLE_ENDIAN,
    };
    if detected.uid() != declared.uid() {
        warn!(
            "Data set looks like {} rather than {}, reading it as such",
            detected.name(),
            declared.name()
        );
    }
    Ok(detected)
}
