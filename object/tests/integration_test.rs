use dicom_stream_core::swap::swap_bytes;
use dicom_stream_core::{DataElementHeader, Length, Tag, VR};
use dicom_stream_encoding::byteordered::Endianness;
use dicom_stream_encoding::decode::DecodeFrom;
use dicom_stream_encoding::encode::EncodeTo;
use dicom_stream_encoding::transfer_syntax::entries::{
    EXPLICIT_VR_BIG_ENDIAN, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
};
use dicom_stream_encoding::TransferSyntax;
use dicom_stream_object::stream::{
    BufferInputStream, BufferOutputStream, FileInputStream, InputStream, StreamReader,
    WriterOutputStream,
};
use dicom_stream_object::{DicomElement, DicomObject, Error, TransferStatus, WriteCache};
use std::io::{Read, Write};

fn encode_header(ts: &TransferSyntax, header: DataElementHeader) -> Vec<u8> {
    let encoder = ts.encoder_for::<Vec<u8>>().unwrap();
    let mut buf = Vec::new();
    encoder.encode_element_header(&mut buf, header).unwrap();
    buf
}

/// Decode the next header and read the element's value to completion.
fn read_element(
    stream: &mut dyn InputStream,
    ts: &TransferSyntax,
    max_read_length: u32,
) -> DicomElement {
    let (header, _) = {
        let decoder = ts.decoder_for::<dyn Read>().unwrap();
        let mut reader = StreamReader::new(&mut *stream);
        decoder.decode_header(&mut reader).unwrap()
    };
    let mut elem = DicomElement::with_header(header);
    elem.transfer_init();
    let status = elem.read(stream, ts, max_read_length).unwrap();
    assert_eq!(status, TransferStatus::Complete);
    elem.transfer_end();
    elem
}

/// Write an element with the value `value` (in little endian) to a temporary file,
/// followed by a trailing element.
fn file_with_element(vr: VR, value: &[u8]) -> (tempfile::NamedTempFile, usize) {
    file_with_element_in(EXPLICIT_VR_LITTLE_ENDIAN, vr, value)
}

/// Write an element in the given transfer syntax,
/// with `value` taken as already encoded in its byte order.
fn file_with_element_in(
    ts: TransferSyntax,
    vr: VR,
    value: &[u8],
) -> (tempfile::NamedTempFile, usize) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let header = encode_header(
        &ts,
        DataElementHeader::new(Tag(0x7FE0, 0x0010), vr, Length(value.len() as u32)),
    );
    file.write_all(&header).unwrap();
    file.write_all(value).unwrap();
    let trailer = encode_header(
        &ts,
        DataElementHeader::new(Tag(0xFFFC, 0xFFFC), VR::OB, Length(2)),
    );
    file.write_all(&trailer).unwrap();
    file.write_all(&[0, 0]).unwrap();
    file.flush().unwrap();
    (file, header.len())
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn large_value_is_deferred_and_read_in_part() {
    let value = pattern(4_000_000);
    let (file, header_len) = file_with_element(VR::OW, &value);

    let mut stream = FileInputStream::open(file.path()).unwrap();
    let mut elem = read_element(&mut stream, &EXPLICIT_VR_LITTLE_ENDIAN, 4096);
    assert!(!elem.value_loaded());
    assert!(elem.deferred().is_some());
    assert_eq!(elem.length_field(), Length(4_000_000));
    // the stream moved past the value, onto the next element
    assert_eq!(stream.tell(), (header_len + value.len()) as u64);
    let next = read_element(&mut stream, &EXPLICIT_VR_LITTLE_ENDIAN, 4096);
    assert_eq!(next.tag(), Tag(0xFFFC, 0xFFFC));
    assert!(stream.eos());

    let mut buf = [0; 10];
    elem.get_partial_value(&mut buf, 1_000_001, None, Endianness::Little)
        .unwrap();
    assert_eq!(&buf[..], &value[1_000_001..1_000_011]);

    // in the other byte order, every word is swapped
    let mut expected = value[1_000_000..1_000_012].to_vec();
    swap_bytes(&mut expected, 2);
    elem.get_partial_value(&mut buf, 1_000_001, None, Endianness::Big)
        .unwrap();
    assert_eq!(&buf[..], &expected[1..11]);
    assert!(!elem.value_loaded());

    // loading on demand
    let loaded = elem.get_value(Endianness::Little).unwrap();
    assert_eq!(loaded.len(), value.len());
    assert_eq!(&loaded[..16], &value[..16]);
    assert!(elem.value_loaded());

    // compacting twice is the same as compacting once
    elem.compact();
    assert!(!elem.value_loaded());
    elem.compact();
    assert!(!elem.value_loaded());
    elem.get_partial_value(&mut buf, 1_000_001, None, Endianness::Little)
        .unwrap();
    assert_eq!(&buf[..], &value[1_000_001..1_000_011]);
}

#[test]
fn partial_values_match_whole_values() {
    let cases = [(VR::OB, 1), (VR::OW, 2), (VR::OL, 4), (VR::OD, 8)];
    for ts in [EXPLICIT_VR_LITTLE_ENDIAN, EXPLICIT_VR_BIG_ENDIAN] {
        for (vr, width) in cases {
            let value = pattern(64);
            let (file, _) = file_with_element_in(ts, vr, &value);
            let mut stream = FileInputStream::open(file.path()).unwrap();
            let mut deferred = read_element(&mut stream, &ts, 16);
            assert!(!deferred.value_loaded());
            assert_eq!(deferred.deferred().unwrap().byte_order(), ts.endianness());

            for order in [Endianness::Little, Endianness::Big] {
                let mut loaded = deferred.clone();
                let whole = loaded.get_value(order).unwrap().to_vec();
                assert_eq!(whole.len(), 64);
                for offset in [0_u32, 1, 3, 7, 8, 13, 63] {
                    for count in [1_usize, 2, 5, 9, 16] {
                        if offset as usize + count > 64 {
                            continue;
                        }
                        let range = offset as usize..offset as usize + count;
                        let mut from_memory = vec![0; count];
                        loaded
                            .get_partial_value(&mut from_memory, offset, None, order)
                            .unwrap();
                        assert_eq!(&from_memory[..], &whole[range.clone()], "{} in memory", vr);

                        let mut from_file = vec![0; count];
                        deferred
                            .get_partial_value(&mut from_file, offset, None, order)
                            .unwrap();
                        assert_eq!(
                            &from_file[..],
                            &whole[range],
                            "{} (width {}) at {}+{} in {:?} from {}",
                            vr,
                            width,
                            offset,
                            count,
                            order,
                            ts.name()
                        );
                    }
                }
            }
            assert!(!deferred.value_loaded());
        }
    }
}

#[test]
fn element_is_written_through_a_small_output_buffer() {
    let value = pattern(1000);
    let mut elem = DicomElement::new(Tag(0x7FE0, 0x0010), VR::OB);
    elem.put_u8_array(&value).unwrap();

    let mut output = BufferOutputStream::new(100);
    let mut written = Vec::new();
    let mut calls = 0;
    elem.transfer_init();
    loop {
        let status = elem
            .write(&mut output, &EXPLICIT_VR_LITTLE_ENDIAN, None)
            .unwrap();
        calls += 1;
        written.extend(output.take_data());
        if status == TransferStatus::Complete {
            break;
        }
        assert!(calls < 100, "no progress");
    }
    elem.transfer_end();

    assert_eq!(calls, 11);
    assert_eq!(written.len(), 12 + 1000);
    assert_eq!(&written[..4], &[0xE0, 0x7F, 0x10, 0x00]);
    assert_eq!(&written[4..6], b"OB");
    assert_eq!(&written[8..12], &1000_u32.to_le_bytes());
    assert_eq!(&written[12..], &value[..]);
}

#[test]
fn deferred_value_is_written_without_loading() {
    let value = pattern(10_000);
    let (file, _) = file_with_element(VR::OW, &value);
    let mut stream = FileInputStream::open(file.path()).unwrap();
    let mut elem = read_element(&mut stream, &EXPLICIT_VR_LITTLE_ENDIAN, 4096);
    assert!(!elem.value_loaded());

    let mut expected = encode_header(
        &EXPLICIT_VR_BIG_ENDIAN,
        DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OW, Length(10_000)),
    );
    let mut swapped = value.clone();
    swap_bytes(&mut swapped, 2);
    expected.extend_from_slice(&swapped);

    // with a shared cache, and with a transient cache on each call
    for shared in [true, false] {
        let mut cache = WriteCache::with_capacity(256);
        let mut output = BufferOutputStream::new(100);
        let mut written = Vec::new();
        elem.transfer_init();
        loop {
            let cache = if shared { Some(&mut cache) } else { None };
            let status = elem
                .write(&mut output, &EXPLICIT_VR_BIG_ENDIAN, cache)
                .unwrap();
            written.extend(output.take_data());
            if status.is_complete() {
                break;
            }
        }
        elem.transfer_end();
        assert_eq!(written.len(), expected.len());
        assert!(written == expected, "written bytes differ (shared cache: {})", shared);
        assert!(!elem.value_loaded());
    }
}

#[test]
fn elements_survive_a_round_trip() {
    for ts in [
        IMPLICIT_VR_LITTLE_ENDIAN,
        EXPLICIT_VR_LITTLE_ENDIAN,
        EXPLICIT_VR_BIG_ENDIAN,
    ] {
        let mut name = DicomElement::new(Tag(0x0010, 0x0010), VR::PN);
        name.put_string("Doe^John").unwrap();
        let mut rows = DicomElement::new(Tag(0x0028, 0x0010), VR::US);
        rows.put_u16_array(&[512, 256]).unwrap();
        let mut slope = DicomElement::new(Tag(0x0040, 0x9225), VR::FD);
        slope.put_f64_array(&[0.25]).unwrap();

        let mut output = WriterOutputStream::new(Vec::new());
        for elem in [&mut name, &mut rows, &mut slope] {
            elem.transfer_init();
            assert!(elem.write(&mut output, &ts, None).unwrap().is_complete());
            elem.transfer_end();
        }
        let bytes = output.into_inner().unwrap();
        assert_eq!(bytes.len(), 3 * 8 + 8 + 4 + 8, "{}", ts.name());

        let mut input = BufferInputStream::from_bytes(bytes);
        let mut name = read_element(&mut input, &ts, 4096);
        let mut rows = read_element(&mut input, &ts, 4096);
        let mut slope = read_element(&mut input, &ts, 4096);
        assert!(input.eos());

        assert_eq!(name.vr(), VR::PN);
        assert_eq!(name.get_string(0, true).unwrap(), "Doe^John");
        assert_eq!(rows.get_u16_array().unwrap(), vec![512, 256]);
        assert_eq!(rows.vm().unwrap(), 2);
        assert_eq!(slope.get_f64(0).unwrap(), 0.25);
    }
}

#[test]
fn element_arrives_in_chunks() {
    let ts = EXPLICIT_VR_LITTLE_ENDIAN;
    let value = pattern(300);
    let mut bytes = encode_header(
        &ts,
        DataElementHeader::new(Tag(0x0009, 0x1010), VR::OB, Length(300)),
    );
    bytes.extend_from_slice(&value);

    let mut input = BufferInputStream::new();
    input.push(&bytes[..12]);
    let (header, _) = {
        let decoder = ts.decoder_for::<dyn Read>().unwrap();
        let mut reader = StreamReader::new(&mut input);
        decoder.decode_header(&mut reader).unwrap()
    };
    let mut elem = DicomElement::with_header(header);
    elem.transfer_init();

    let mut suspensions = 0;
    for chunk in bytes[12..].chunks(64) {
        input.push(chunk);
        match elem.read(&mut input, &ts, 4096).unwrap() {
            TransferStatus::Suspended => suspensions += 1,
            TransferStatus::Complete => break,
        }
    }
    assert_eq!(suspensions, 4);
    assert_eq!(elem.transferred_bytes(), 300);
    assert_eq!(elem.get_u8_array().unwrap(), &value[..]);
    // further calls after completion change nothing
    assert!(elem.read(&mut input, &ts, 4096).unwrap().is_complete());
}

#[test]
fn declared_length_beyond_the_file() {
    let ts = EXPLICIT_VR_LITTLE_ENDIAN;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&encode_header(
        &ts,
        DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length(10_000)),
    ))
    .unwrap();
    file.write_all(&pattern(5_000)).unwrap();
    file.flush().unwrap();

    let mut stream = FileInputStream::open(file.path()).unwrap();
    let (header, _) = {
        let decoder = ts.decoder_for::<dyn Read>().unwrap();
        let mut reader = StreamReader::new(&mut stream);
        decoder.decode_header(&mut reader).unwrap()
    };

    // deferred: the skip falls short
    let mut elem = DicomElement::with_header(header);
    elem.transfer_init();
    let err = elem.read(&mut stream, &ts, 4096).unwrap_err();
    assert!(err.is_invalid_stream());
    assert!(matches!(
        err,
        Error::ValueLargerThanStream {
            length: 10_000,
            available: 5_000,
            ..
        }
    ));

    // loaded: the stream ends early
    let mut stream = FileInputStream::open_at(file.path(), 12).unwrap();
    let mut elem = DicomElement::with_header(header);
    elem.transfer_init();
    let err = elem.read(&mut stream, &ts, u32::MAX).unwrap_err();
    assert!(err.is_invalid_stream());
    assert!(matches!(err, Error::PrematureEnd { .. }));
}
