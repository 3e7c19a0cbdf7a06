//! Human readable renditions of DICOM objects:
//! the info line format of data set dumps, and XML.

use dicom_stream_core::dictionary::{DataDictionary, DynDataDictionary};
use dicom_stream_core::{Length, Tag, VR};
use std::fmt;
use std::io;

/// The width of the value column in info lines.
pub const PRINT_VALUE_LENGTH: usize = 40;

/// The maximum length of a printed value when long values are shortened.
pub const PRINT_LINE_LENGTH: usize = 70;

/// Options for printing objects as info lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct PrintOptions {
    /// Print a tree structure with attribute names
    /// instead of tags and value representations.
    pub tree: bool,
    /// Cut values longer than [`PRINT_LINE_LENGTH`].
    pub shorten_long_values: bool,
    /// The object is the last one on its nesting level.
    pub last_entry: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            tree: false,
            shorten_long_values: true,
            last_entry: false,
        }
    }
}

impl PrintOptions {
    /// Print a tree structure.
    pub fn tree(mut self, value: bool) -> Self {
        self.tree = value;
        self
    }

    /// Cut long values.
    pub fn shorten_long_values(mut self, value: bool) -> Self {
        self.shorten_long_values = value;
        self
    }

    /// Mark the object as the last one on its nesting level.
    pub fn last_entry(mut self, value: bool) -> Self {
        self.last_entry = value;
        self
    }
}

/// Options for writing objects in XML.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct XmlOptions {
    /// Leave out the `name` attribute.
    pub omit_name: bool,
}

impl XmlOptions {
    /// Leave out attribute names.
    pub fn omit_name(mut self, value: bool) -> Self {
        self.omit_name = value;
        self
    }
}

/// The name of the attribute with the given tag,
/// as printed in info lines.
pub fn tag_name(dict: &DynDataDictionary, tag: Tag) -> &'static str {
    if let Some(entry) = dict.by_tag(tag) {
        return entry.alias;
    }
    if tag.is_group_length() {
        "GenericGroupLength"
    } else if tag.is_private() && (0x0010..=0x00FF).contains(&tag.element()) {
        "PrivateCreator"
    } else {
        "Unknown Tag & Data"
    }
}

/// Write the indentation of the given nesting level.
///
/// Levels start at 1 for the top level of a data set.
pub fn print_nesting_level(
    out: &mut dyn io::Write,
    options: &PrintOptions,
    level: usize,
) -> io::Result<()> {
    write!(out, "{}", NestingLevel { options, level })
}

struct NestingLevel<'a> {
    options: &'a PrintOptions,
    level: usize,
}

impl fmt::Display for NestingLevel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.options.tree {
            for _ in 1..self.level {
                f.write_str("  ")?;
            }
        } else if self.options.last_entry {
            for _ in 2..self.level {
                f.write_str("| ")?;
            }
            if self.level > 0 {
                f.write_str("+ ")?;
            }
        } else {
            for _ in 1..self.level {
                f.write_str("| ")?;
            }
        }
        Ok(())
    }
}

/// One line of a data set dump.
///
/// ```text
/// (0010,0010) PN [Doe^John]                               #   8, 1 PatientName
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InfoLine<'a> {
    /// the object's tag
    pub tag: Tag,
    /// the object's value representation,
    /// none for items and delimiters
    pub vr: Option<VR>,
    /// the attribute name
    pub name: &'a str,
    /// the value as text, if any
    pub value: Option<&'a str>,
    /// the value length
    pub length: Length,
    /// the value multiplicity
    pub vm: u32,
    /// the nesting level
    pub level: usize,
    /// the print options
    pub options: PrintOptions,
}

impl InfoLine<'_> {
    /// The line in three parts:
    /// the line start with the tag, the value, and the line end.
    ///
    /// The value part is padded to the width of the value column.
    pub fn parts(&self) -> (String, String, String) {
        let mut start = NestingLevel {
            options: &self.options,
            level: self.level,
        }
        .to_string();
        if self.options.tree {
            start.push_str(self.name);
            start.push(' ');
            let pad = 35 - self.name.len() as isize - 2 * self.level as isize;
            if pad > 0 {
                start.push_str(&" ".repeat(pad as usize));
            }
        } else {
            start.push_str(&format!(
                "({:04x},{:04x}) {} ",
                self.tag.group(),
                self.tag.element(),
                self.vr.map_or("na", |vr| vr.to_string())
            ));
        }

        let info = self.value.unwrap_or("");
        let mut printed = info.chars().count();
        let mut value = if self.options.shorten_long_values && printed > PRINT_LINE_LENGTH {
            printed = PRINT_LINE_LENGTH;
            let mut cut: String = info.chars().take(PRINT_LINE_LENGTH - 3).collect();
            cut.push_str("...");
            cut
        } else {
            info.to_string()
        };

        if self.options.tree {
            return (start, value, String::new());
        }
        if printed < PRINT_VALUE_LENGTH {
            value.push_str(&" ".repeat(PRINT_VALUE_LENGTH - printed));
        }
        let length = if self.length.is_undefined() {
            "u/l".to_string()
        } else {
            format!("{:>3}", self.length.0)
        };
        let end = format!(" # {},{:>2} {}", length, self.vm, self.name);
        (start, value, end)
    }
}

impl fmt::Display for InfoLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, value, end) = self.parts();
        write!(f, "{}{}{}", start, value, end)
    }
}

/// Write an info line, followed by a line break.
pub fn print_info_line(out: &mut dyn io::Write, line: &InfoLine) -> io::Result<()> {
    writeln!(out, "{}", line)
}

/// An element in XML.
#[derive(Debug, Clone, Copy)]
pub struct XmlElement<'a> {
    /// the element's tag
    pub tag: Tag,
    /// the element's value representation
    pub vr: VR,
    /// the value multiplicity
    pub vm: u32,
    /// the value length
    pub length: Length,
    /// the attribute name
    pub name: &'a str,
    /// whether the value is in memory
    pub loaded: bool,
    /// the value as text
    pub value: Option<&'a str>,
    /// the XML options
    pub options: XmlOptions,
}

impl fmt::Display for XmlElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<element tag=\"{:04x},{:04x}\" vr=\"{}\" vm=\"{}\" len=\"{}\"",
            self.tag.group(),
            self.tag.element(),
            self.vr,
            self.vm,
            self.length.0
        )?;
        if !self.options.omit_name {
            write!(f, " name=\"{}\"", Escaped(self.name))?;
        }
        if !self.loaded {
            return f.write_str(" loaded=\"no\"></element>");
        }
        write!(f, ">{}</element>", Escaped(self.value.unwrap_or("")))
    }
}

/// Text with XML markup characters escaped.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&apos;")?,
                c => fmt::Write::write_char(f, c)?,
            }
        }
        Ok(())
    }
}
