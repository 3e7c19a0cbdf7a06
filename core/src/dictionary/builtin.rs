//! A compact built-in dictionary of frequently used attributes.
//!
//! It covers the file meta group, the common patient, study, series and
//! image attributes, pixel data, and the structural items of sequences.
//! Attributes outside of this set resolve to no entry,
//! save for group lengths and private creators,
//! which are recognized generically.

use super::{DataDictionary, DataDictionaryEntryRef};
use crate::header::{Tag, VR};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

macro_rules! entries {
    ($(($g:expr, $e:expr, $alias:expr, $vr:ident)),* $(,)?) => {
        &[$(DataDictionaryEntryRef { tag: Tag($g, $e), alias: $alias, vr: VR::$vr }),*]
    };
}

/// Entries whose group is of the form `(ggxx,eeee)`
/// are recorded with the low byte of the group zeroed out.
static ENTRIES: &[DataDictionaryEntryRef<'static>] = entries![
    (0x0002, 0x0000, "FileMetaInformationGroupLength", UL),
    (0x0002, 0x0001, "FileMetaInformationVersion", OB),
    (0x0002, 0x0002, "MediaStorageSOPClassUID", UI),
    (0x0002, 0x0003, "MediaStorageSOPInstanceUID", UI),
    (0x0002, 0x0010, "TransferSyntaxUID", UI),
    (0x0002, 0x0012, "ImplementationClassUID", UI),
    (0x0002, 0x0013, "ImplementationVersionName", SH),
    (0x0002, 0x0016, "SourceApplicationEntityTitle", AE),
    (0x0008, 0x0005, "SpecificCharacterSet", CS),
    (0x0008, 0x0008, "ImageType", CS),
    (0x0008, 0x0012, "InstanceCreationDate", DA),
    (0x0008, 0x0013, "InstanceCreationTime", TM),
    (0x0008, 0x0016, "SOPClassUID", UI),
    (0x0008, 0x0018, "SOPInstanceUID", UI),
    (0x0008, 0x0020, "StudyDate", DA),
    (0x0008, 0x0021, "SeriesDate", DA),
    (0x0008, 0x0022, "AcquisitionDate", DA),
    (0x0008, 0x0023, "ContentDate", DA),
    (0x0008, 0x0030, "StudyTime", TM),
    (0x0008, 0x0031, "SeriesTime", TM),
    (0x0008, 0x0033, "ContentTime", TM),
    (0x0008, 0x0050, "AccessionNumber", SH),
    (0x0008, 0x0060, "Modality", CS),
    (0x0008, 0x0064, "ConversionType", CS),
    (0x0008, 0x0070, "Manufacturer", LO),
    (0x0008, 0x0080, "InstitutionName", LO),
    (0x0008, 0x0090, "ReferringPhysicianName", PN),
    (0x0008, 0x1030, "StudyDescription", LO),
    (0x0008, 0x103E, "SeriesDescription", LO),
    (0x0008, 0x1090, "ManufacturerModelName", LO),
    (0x0008, 0x1140, "ReferencedImageSequence", SQ),
    (0x0008, 0x1150, "ReferencedSOPClassUID", UI),
    (0x0008, 0x1155, "ReferencedSOPInstanceUID", UI),
    (0x0010, 0x0010, "PatientName", PN),
    (0x0010, 0x0020, "PatientID", LO),
    (0x0010, 0x0030, "PatientBirthDate", DA),
    (0x0010, 0x0040, "PatientSex", CS),
    (0x0010, 0x1010, "PatientAge", AS),
    (0x0010, 0x1020, "PatientSize", DS),
    (0x0010, 0x1030, "PatientWeight", DS),
    (0x0010, 0x4000, "PatientComments", LT),
    (0x0018, 0x0015, "BodyPartExamined", CS),
    (0x0018, 0x0050, "SliceThickness", DS),
    (0x0018, 0x0088, "SpacingBetweenSlices", DS),
    (0x0018, 0x1030, "ProtocolName", LO),
    (0x0018, 0x5100, "PatientPosition", CS),
    (0x0018, 0x6016, "RegionFlags", UL),
    (0x0018, 0x6020, "ReferencePixelX0", SL),
    (0x0020, 0x000D, "StudyInstanceUID", UI),
    (0x0020, 0x000E, "SeriesInstanceUID", UI),
    (0x0020, 0x0010, "StudyID", SH),
    (0x0020, 0x0011, "SeriesNumber", IS),
    (0x0020, 0x0012, "AcquisitionNumber", IS),
    (0x0020, 0x0013, "InstanceNumber", IS),
    (0x0020, 0x0020, "PatientOrientation", CS),
    (0x0020, 0x0032, "ImagePositionPatient", DS),
    (0x0020, 0x0037, "ImageOrientationPatient", DS),
    (0x0020, 0x0052, "FrameOfReferenceUID", UI),
    (0x0020, 0x1041, "SliceLocation", DS),
    (0x0028, 0x0002, "SamplesPerPixel", US),
    (0x0028, 0x0004, "PhotometricInterpretation", CS),
    (0x0028, 0x0006, "PlanarConfiguration", US),
    (0x0028, 0x0008, "NumberOfFrames", IS),
    (0x0028, 0x0010, "Rows", US),
    (0x0028, 0x0011, "Columns", US),
    (0x0028, 0x0030, "PixelSpacing", DS),
    (0x0028, 0x0100, "BitsAllocated", US),
    (0x0028, 0x0101, "BitsStored", US),
    (0x0028, 0x0102, "HighBit", US),
    (0x0028, 0x0103, "PixelRepresentation", US),
    (0x0028, 0x1050, "WindowCenter", DS),
    (0x0028, 0x1051, "WindowWidth", DS),
    (0x0028, 0x1052, "RescaleIntercept", DS),
    (0x0028, 0x1053, "RescaleSlope", DS),
    (0x0028, 0x1054, "RescaleType", LO),
    (0x0028, 0x3002, "LUTDescriptor", US),
    (0x0028, 0x3006, "LUTData", OW),
    (0x0028, 0x3010, "VOILUTSequence", SQ),
    (0x0040, 0x0275, "RequestAttributesSequence", SQ),
    (0x0040, 0x9210, "LUTLabel", SH),
    (0x0040, 0x9225, "RealWorldValueSlope", FD),
    (0x0040, 0xA730, "ContentSequence", SQ),
    (0x0072, 0x0026, "SelectorAttribute", AT),
    (0x4FFE, 0x0001, "MACParametersSequence", SQ),
    (0x6000, 0x0010, "OverlayRows", US),
    (0x6000, 0x0011, "OverlayColumns", US),
    (0x6000, 0x3000, "OverlayData", OW),
    (0x7FE0, 0x0008, "FloatPixelData", OF),
    (0x7FE0, 0x0009, "DoubleFloatPixelData", OD),
    (0x7FE0, 0x0010, "PixelData", OW),
    (0xFFFA, 0xFFFA, "DigitalSignaturesSequence", SQ),
    (0xFFFC, 0xFFFC, "DataSetTrailingPadding", OB),
    (0xFFFE, 0xE000, "Item", UN),
    (0xFFFE, 0xE00D, "ItemDelimitationItem", UN),
    (0xFFFE, 0xE0DD, "SequenceDelimitationItem", UN),
];

/// Generic Group Length dictionary entry.
static GROUP_LENGTH_ENTRY: DataDictionaryEntryRef<'static> = DataDictionaryEntryRef {
    tag: Tag(0x0000, 0x0000),
    alias: "GenericGroupLength",
    vr: VR::UL,
};

/// Generic Private Creator dictionary entry.
static PRIVATE_CREATOR_ENTRY: DataDictionaryEntryRef<'static> = DataDictionaryEntryRef {
    tag: Tag(0x0009, 0x0010),
    alias: "PrivateCreator",
    vr: VR::LO,
};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

#[derive(Debug)]
struct Registry {
    by_name: HashMap<&'static str, &'static DataDictionaryEntryRef<'static>>,
    by_tag: HashMap<Tag, &'static DataDictionaryEntryRef<'static>>,
    /// repeating elements of the form (ggxx, eeee). The `xx` portion is zeroed.
    repeating_ggxx: HashSet<Tag>,
}

impl Registry {
    fn build() -> Self {
        let mut registry = Registry {
            by_name: HashMap::with_capacity(ENTRIES.len()),
            by_tag: HashMap::with_capacity(ENTRIES.len()),
            repeating_ggxx: HashSet::new(),
        };
        for entry in ENTRIES {
            registry.by_name.insert(entry.alias, entry);
            registry.by_tag.insert(entry.tag, entry);
            if entry.tag.group() & 0xFF00 == 0x6000 {
                registry.repeating_ggxx.insert(entry.tag);
            }
        }
        registry.by_name.insert(GROUP_LENGTH_ENTRY.alias, &GROUP_LENGTH_ENTRY);
        registry
    }
}

/// The built-in data element dictionary.
///
/// The dictionary index is initialized upon first use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuiltinDataDictionary;

impl BuiltinDataDictionary {
    fn indexed_tag(tag: Tag) -> Option<&'static DataDictionaryEntryRef<'static>> {
        let r = &*REGISTRY;
        if let Some(entry) = r.by_tag.get(&tag).copied() {
            return Some(entry);
        }
        // repeating groups only span even group numbers
        let group_trimmed = Tag(tag.0 & 0xFF00, tag.1);
        if !tag.is_private() && r.repeating_ggxx.contains(&group_trimmed) {
            return r.by_tag.get(&group_trimmed).copied();
        }
        if tag.is_private() && (0x0010..=0x00FF).contains(&tag.1) {
            return Some(&PRIVATE_CREATOR_ENTRY);
        }
        if tag.is_group_length() {
            return Some(&GROUP_LENGTH_ENTRY);
        }
        None
    }
}

impl DataDictionary for BuiltinDataDictionary {
    type Entry = DataDictionaryEntryRef<'static>;

    fn by_name(&self, name: &str) -> Option<&Self::Entry> {
        REGISTRY.by_name.get(name).copied()
    }

    fn by_tag(&self, tag: Tag) -> Option<&Self::Entry> {
        BuiltinDataDictionary::indexed_tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::BuiltinDataDictionary;
    use crate::dictionary::{DataDictionary, DataDictionaryEntry};
    use crate::header::{Tag, VR};

    #[test]
    fn can_look_up_by_tag() {
        let dict = BuiltinDataDictionary;
        let entry = dict.by_tag(Tag(0x0010, 0x0010)).unwrap();
        assert_eq!(entry.alias(), "PatientName");
        assert_eq!(entry.vr(), VR::PN);

        let entry = dict.by_tag(Tag(0x7FE0, 0x0010)).unwrap();
        assert_eq!(entry.alias(), "PixelData");
    }

    #[test]
    fn can_look_up_by_name() {
        let dict = BuiltinDataDictionary;
        let entry = dict.by_name("TransferSyntaxUID").unwrap();
        assert_eq!(entry.tag(), Tag(0x0002, 0x0010));
        assert_eq!(entry.vr(), VR::UI);
        assert!(dict.by_name("NoSuchAttribute").is_none());
    }

    #[test]
    fn resolves_repeating_groups() {
        let dict = BuiltinDataDictionary;
        let entry = dict.by_tag(Tag(0x6002, 0x3000)).unwrap();
        assert_eq!(entry.alias(), "OverlayData");
        assert_eq!(entry.vr(), VR::OW);
    }

    #[test]
    fn resolves_generic_entries() {
        let dict = BuiltinDataDictionary;
        assert_eq!(
            dict.by_tag(Tag(0x0028, 0x0000)).unwrap().alias(),
            "GenericGroupLength"
        );
        assert_eq!(
            dict.by_tag(Tag(0x0009, 0x0010)).unwrap().alias(),
            "PrivateCreator"
        );
        assert!(dict.by_tag(Tag(0x0009, 0x1010)).is_none());
        assert!(dict.by_tag(Tag(0x0011, 0x1011)).is_none());
    }
}
