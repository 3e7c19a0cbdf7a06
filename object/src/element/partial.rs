//! Partial access to element values, loaded or not.

use super::DicomElement;
use crate::cache::FileCache;
use crate::error::{
    IllegalCallSnafu, InvalidOffsetSnafu, OpenSourceSnafu, PrematureEndSnafu, ReadValueSnafu,
    Result, TooManyBytesRequestedSnafu,
};
use crate::object::DicomObject;
use crate::stream::InputStream;
use byteordered::Endianness;
use dicom_stream_core::swap::swap_bytes;
use dicom_stream_core::Tag;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::trace;

/// Room for the value units cut by the bounds of a partial read.
const SWAP_BUFFER_SIZE: usize = 16;

impl DicomElement {
    /// Copy `target.len()` bytes of the value, starting at `offset`,
    /// into `target`, in the given byte order.
    ///
    /// Deferred values are read from their backing store
    /// without being loaded into the element.
    /// A file cache, when given, keeps the backing stream open
    /// so that a later read further ahead continues from it.
    pub fn get_partial_value(
        &mut self,
        target: &mut [u8],
        offset: u32,
        file_cache: Option<&mut FileCache>,
        byte_order: Endianness,
    ) -> Result<()> {
        let count = target.len();
        if count == 0 {
            return Ok(());
        }
        let length = self.len_field();
        ensure!(offset < length, InvalidOffsetSnafu { offset, length });
        ensure!(
            u64::from(offset) + count as u64 <= u64::from(length),
            TooManyBytesRequestedSnafu {
                offset,
                count,
                length,
            }
        );

        if self.value.is_some() {
            let value = self.get_value(byte_order)?;
            let start = offset as usize;
            target.copy_from_slice(&value[start..start + count]);
            return Ok(());
        }

        let tag = self.tag();
        let vr_width = self.vr().value_width();
        let deferred = self.deferred.as_ref().context(IllegalCallSnafu {
            reason: "no value available",
        })?;
        let width = if deferred.byte_order() != byte_order && vr_width > 1 {
            vr_width
        } else {
            1
        };
        let head_skip = offset as usize % width;
        let start = u64::from(offset) - head_skip as u64;

        let mut local;
        let stream: &mut dyn InputStream = match file_cache {
            Some(cache) => {
                let id = deferred.id();
                let reusable = cache.is_user(id)
                    && cache
                        .tell()
                        .map_or(false, |pos| pos.saturating_sub(cache.offset()) <= start);
                if !reusable {
                    let stream = deferred.create().context(OpenSourceSnafu { tag })?;
                    cache.init(id, stream);
                } else {
                    trace!("reusing cached stream of {}", tag);
                }
                let base = cache.offset();
                let stream = cache.stream_mut().context(IllegalCallSnafu {
                    reason: "file cache holds no stream",
                })?;
                seek_forward(stream, base + start, tag)?;
                stream
            }
            None => {
                local = deferred.create().context(OpenSourceSnafu { tag })?;
                let base = local.tell();
                seek_forward(&mut *local, base + start, tag)?;
                &mut *local
            }
        };

        let mut swap_buffer = [0u8; SWAP_BUFFER_SIZE];
        let mut done = 0;
        let mut position = start;

        // unit cut at the start
        if head_skip > 0 {
            let unit_len = unit_length(length, position, width);
            let n = (unit_len - head_skip).min(count);
            read_unit(stream, &mut swap_buffer[..unit_len], width, n == count, tag)?;
            target[..n].copy_from_slice(&swap_buffer[head_skip..head_skip + n]);
            done = n;
            position += unit_len as u64;
        }

        let bulk = (count - done) / width * width;
        if bulk > 0 {
            let part = &mut target[done..done + bulk];
            read_exact(stream, part, tag)?;
            if width > 1 {
                swap_bytes(part, width);
            }
            done += bulk;
            position += bulk as u64;
        }

        // unit cut at the end
        let rest = count - done;
        if rest > 0 {
            let unit_len = unit_length(length, position, width);
            read_unit(stream, &mut swap_buffer[..unit_len], width, true, tag)?;
            target[done..].copy_from_slice(&swap_buffer[..rest]);
        }
        Ok(())
    }
}

/// The length of the value unit starting at `position`,
/// shorter than `width` only at the end of a value
/// whose length is not a multiple of its width.
fn unit_length(length: u32, position: u64, width: usize) -> usize {
    (u64::from(length) - position).min(width as u64) as usize
}

/// Read one value unit and swap it if it is complete.
///
/// With `rewind`, the stream is moved back to the start of the unit,
/// where a following partial read of the same value may begin.
fn read_unit(
    stream: &mut dyn InputStream,
    unit: &mut [u8],
    width: usize,
    rewind: bool,
    tag: Tag,
) -> Result<()> {
    if rewind {
        stream.mark();
    }
    read_exact(stream, unit, tag)?;
    if unit.len() == width {
        swap_bytes(unit, width);
    }
    if rewind {
        stream.putback().context(ReadValueSnafu { tag })?;
    }
    Ok(())
}

/// Move the stream forward to the given absolute position.
fn seek_forward(stream: &mut dyn InputStream, position: u64, tag: Tag) -> Result<()> {
    let current = stream.tell();
    if position <= current {
        return Ok(());
    }
    let n = position - current;
    let skipped = stream.skip(n).context(ReadValueSnafu { tag })?;
    ensure!(skipped == n, PrematureEndSnafu { tag });
    Ok(())
}

fn read_exact(stream: &mut dyn InputStream, buf: &mut [u8], tag: Tag) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).context(ReadValueSnafu { tag })?;
        ensure!(n > 0, PrematureEndSnafu { tag });
        filled += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cache::FileCache;
    use crate::element::DicomElement;
    use crate::error::Error;
    use crate::object::DicomObject;
    use crate::stream::{BufferInputStream, FileInputStream};
    use byteordered::Endianness;
    use dicom_stream_core::header::DataElementHeader;
    use dicom_stream_core::{Length, Tag, VR};
    use dicom_stream_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
    use std::io::Write;

    fn deferred_element(vr: VR, value: &[u8]) -> (tempfile::NamedTempFile, DicomElement) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xAA; 6]).unwrap();
        file.write_all(value).unwrap();
        // the next element
        file.write_all(&[0xEE, 0xFF]).unwrap();
        file.flush().unwrap();

        let header = DataElementHeader::new(Tag(0x7FE0, 0x0010), vr, Length(value.len() as u32));
        let mut elem = DicomElement::with_header(header);
        let mut stream = FileInputStream::open_at(file.path(), 6).unwrap();
        elem.transfer_init();
        elem.read(&mut stream, &EXPLICIT_VR_LITTLE_ENDIAN, 4).unwrap();
        assert!(!elem.value_loaded());
        (file, elem)
    }

    #[test]
    fn bounds_are_checked() {
        let mut elem = DicomElement::new(Tag(0x0009, 0x1010), VR::OB);
        elem.put_value(&[1, 2, 3, 4]).unwrap();
        let mut buf = [0; 2];
        let err = elem
            .get_partial_value(&mut buf, 4, None, Endianness::Little)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOffset { .. }));
        let err = elem
            .get_partial_value(&mut buf, 3, None, Endianness::Little)
            .unwrap_err();
        assert!(matches!(err, Error::TooManyBytesRequested { .. }));
        elem.get_partial_value(&mut buf, 2, None, Endianness::Little)
            .unwrap();
        assert_eq!(buf, [3, 4]);
    }

    #[test]
    fn deferred_value_with_swapping() {
        let value: Vec<u8> = (0..16).collect();
        let (_file, mut elem) = deferred_element(VR::OW, &value);

        let mut buf = [0; 5];
        elem.get_partial_value(&mut buf, 3, None, Endianness::Big)
            .unwrap();
        // units (2,3) (4,5) (6,7) swapped, starting from the second byte
        assert_eq!(buf, [2, 5, 4, 7, 6]);

        elem.get_partial_value(&mut buf, 0, None, Endianness::Little)
            .unwrap();
        assert_eq!(buf, [0, 1, 2, 3, 4]);
        assert!(!elem.value_loaded());
    }

    #[test]
    fn file_cache_is_reused_moving_forward() {
        let value: Vec<u8> = (0..64).collect();
        let (_file, mut elem) = deferred_element(VR::OB, &value);
        let mut cache = FileCache::new();

        let mut buf = [0; 8];
        elem.get_partial_value(&mut buf, 0, Some(&mut cache), Endianness::Little)
            .unwrap();
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(cache.offset(), 6);

        elem.get_partial_value(&mut buf, 32, Some(&mut cache), Endianness::Little)
            .unwrap();
        assert_eq!(buf[0], 32);
        assert_eq!(cache.tell(), Some(6 + 40));

        // going backwards reopens the stream
        elem.get_partial_value(&mut buf, 8, Some(&mut cache), Endianness::Little)
            .unwrap();
        assert_eq!(buf[0], 8);
        assert_eq!(cache.tell(), Some(6 + 16));
    }

    #[test]
    fn trailing_partial_unit_stays_within_the_value() {
        let value = [1, 2, 3, 4, 5, 6];
        let (_file, mut elem) = deferred_element(VR::OL, &value);
        let mut loaded = elem.clone();
        let whole = loaded.get_value(Endianness::Big).unwrap().to_vec();
        // the incomplete unit at the end is left as is
        assert_eq!(whole, [4, 3, 2, 1, 5, 6]);

        let mut buf = [0; 1];
        elem.get_partial_value(&mut buf, 5, None, Endianness::Big)
            .unwrap();
        assert_eq!(buf, [6]);

        for offset in 0..6_u32 {
            for count in 1..=(6 - offset as usize) {
                let mut buf = vec![0; count];
                elem.get_partial_value(&mut buf, offset, None, Endianness::Big)
                    .unwrap();
                let start = offset as usize;
                assert_eq!(buf, &whole[start..start + count], "{}+{}", offset, count);
            }
        }
        assert!(!elem.value_loaded());
    }

    #[test]
    fn file_cache_stays_on_a_partly_read_unit() {
        let value: Vec<u8> = (0..16).collect();
        let (_file, mut elem) = deferred_element(VR::OW, &value);
        let mut cache = FileCache::new();

        let mut buf = [0; 1];
        elem.get_partial_value(&mut buf, 3, Some(&mut cache), Endianness::Big)
            .unwrap();
        assert_eq!(buf, [2]);
        // back at the start of unit (2,3)
        assert_eq!(cache.tell(), Some(6 + 2));

        // the same unit is read again from the cached stream
        elem.get_partial_value(&mut buf, 2, Some(&mut cache), Endianness::Big)
            .unwrap();
        assert_eq!(buf, [3]);
        assert_eq!(cache.tell(), Some(6 + 2));

        let mut buf = [0; 3];
        elem.get_partial_value(&mut buf, 4, Some(&mut cache), Endianness::Big)
            .unwrap();
        assert_eq!(buf, [5, 4, 7]);
        assert_eq!(cache.tell(), Some(6 + 6));
    }

    #[test]
    fn no_value_available() {
        let header = DataElementHeader::new(Tag(0x0009, 0x1010), VR::OB, Length(4));
        let mut elem = DicomElement::with_header(header);
        let mut buf = [0; 2];
        let err = elem
            .get_partial_value(&mut buf, 0, None, Endianness::Little)
            .unwrap_err();
        assert!(matches!(err, Error::IllegalCall { .. }));

        let mut input = BufferInputStream::from_bytes(vec![1, 2, 3, 4]);
        elem.transfer_init();
        // buffer streams never defer
        elem.read(&mut input, &EXPLICIT_VR_LITTLE_ENDIAN, 0).unwrap();
        elem.get_partial_value(&mut buf, 0, None, Endianness::Little)
            .unwrap();
        assert_eq!(buf, [1, 2]);
    }
}
