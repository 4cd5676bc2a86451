//! Records and root aggregates describing classifier corpora.
//!
//! Serde attributes pin the on-disk document shape: every key is optional on
//! read (missing fields take their defaults), unknown keys are ignored, and
//! all keys are emitted on write.

use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::DomainError;
use crate::domain::range::BoundedRange;

/// One annotated byte range within a firmware image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SectionDoc", into = "SectionDoc")]
pub struct FirmwareSection {
    pub bounds: BoundedRange,
    pub filetype: String,
}

impl FirmwareSection {
    pub fn new(bounds: BoundedRange, filetype: impl Into<String>) -> Self {
        Self {
            bounds,
            filetype: filetype.into(),
        }
    }
}

/// Document form of a section; conversion validates the bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SectionDoc {
    #[serde(rename = "Start", default)]
    start: u64,
    #[serde(rename = "End", default)]
    end: u64,
    #[serde(rename = "Filetype", default)]
    filetype: String,
}

impl TryFrom<SectionDoc> for FirmwareSection {
    type Error = DomainError;

    fn try_from(doc: SectionDoc) -> Result<Self, Self::Error> {
        Ok(Self {
            bounds: BoundedRange::new(doc.start, doc.end)?,
            filetype: doc.filetype,
        })
    }
}

impl From<FirmwareSection> for SectionDoc {
    fn from(section: FirmwareSection) -> Self {
        Self {
            start: section.bounds.start(),
            end: section.bounds.end(),
            filetype: section.filetype,
        }
    }
}

/// One firmware image plus its section annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firmware {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Filename", default)]
    pub filename: String,
    #[serde(rename = "Sections", default)]
    pub sections: Vec<FirmwareSection>,
}

impl Firmware {
    /// Build an entry for a firmware image on disk. The user-facing name
    /// starts out as the file's base name.
    pub fn from_path(path: &Path) -> Self {
        let filename = path.display().to_string();
        Self {
            name: base_name(&filename),
            filename,
            sections: Vec::new(),
        }
    }

    /// Final path component of `filename`; the identity of this entry within
    /// its corpus.
    pub fn base_name(&self) -> String {
        base_name(&self.filename)
    }

    pub fn push_section(&mut self, section: FirmwareSection) {
        self.sections.push(section);
    }
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// A labelled example file; serializes as a bare path string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingFile {
    pub filename: String,
}

impl TrainingFile {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// A named category of training files plus where its learned classification
/// data is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Filetype File", default)]
    pub filetype_file: String,
    /// Whether training overwrites the existing classification file. Some
    /// classifiers ignore this.
    #[serde(rename = "Ignore Existing", default)]
    pub ignore_existing: bool,
    #[serde(rename = "Files", default)]
    pub files: Vec<TrainingFile>,
}

impl FileType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn push_file(&mut self, file: TrainingFile) {
        self.files.push(file);
    }
}

/// Root aggregate for the test corpus: annotated firmware images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCorpus {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Firmware Definitions", default)]
    pub firmware: Vec<Firmware>,
}

impl TestCorpus {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            firmware: Vec::new(),
        }
    }

    pub fn push_firmware(&mut self, firmware: Firmware) {
        self.firmware.push(firmware);
    }
}

/// Root aggregate for the training corpus: labelled example files grouped by
/// file type.
///
/// The legacy document keys the filetype list by name; in memory the list
/// stays ordered, and on load entries are taken in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingCorpus {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "n Value", default = "default_n_value")]
    pub n_value: u32,
    #[serde(
        rename = "Filetype Definitions",
        default,
        serialize_with = "filetypes_to_map",
        deserialize_with = "filetypes_from_map"
    )]
    pub filetypes: Vec<FileType>,
}

fn default_n_value() -> u32 {
    1
}

impl Default for TrainingCorpus {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            n_value: default_n_value(),
            filetypes: Vec::new(),
        }
    }
}

impl TrainingCorpus {
    pub fn new(name: impl Into<String>, description: impl Into<String>, n_value: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            n_value,
            filetypes: Vec::new(),
        }
    }

    pub fn push_filetype(&mut self, filetype: FileType) {
        self.filetypes.push(filetype);
    }
}

fn filetypes_to_map<S>(filetypes: &[FileType], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(filetypes.len()))?;
    for filetype in filetypes {
        map.serialize_entry(&filetype.name, filetype)?;
    }
    map.end()
}

fn filetypes_from_map<'de, D>(deserializer: D) -> Result<Vec<FileType>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FiletypeMapVisitor;

    impl<'de> Visitor<'de> for FiletypeMapVisitor {
        type Value = Vec<FileType>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a map of filetype definitions keyed by name")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut filetypes = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, mut filetype)) = access.next_entry::<String, FileType>()? {
                // An explicit "Name" wins; the map key covers entries without one.
                if filetype.name.is_empty() {
                    filetype.name = key;
                }
                filetypes.push(filetype);
            }
            Ok(filetypes)
        }
    }

    deserializer.deserialize_map(FiletypeMapVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn empty_document_yields_defaults() {
        let test: TestCorpus = serde_json::from_value(json!({})).unwrap();
        assert_eq!(test, TestCorpus::default());

        let training: TrainingCorpus = serde_json::from_value(json!({})).unwrap();
        assert_eq!(training.name, "");
        assert_eq!(training.description, "");
        assert_eq!(training.n_value, 1);
        assert!(training.filetypes.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let corpus: TestCorpus = serde_json::from_value(json!({
            "Name": "fw",
            "Comment": "not part of the format",
        }))
        .unwrap();
        assert_eq!(corpus.name, "fw");
    }

    #[test]
    fn section_document_shape() {
        let section = FirmwareSection::new(BoundedRange::new(0, 100).unwrap(), "elf");
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            json!({"Start": 0, "End": 100, "Filetype": "elf"})
        );
    }

    #[test]
    fn section_with_missing_keys_defaults() {
        let section: FirmwareSection = serde_json::from_value(json!({})).unwrap();
        assert_eq!(section.bounds, BoundedRange::default());
        assert_eq!(section.filetype, "");
    }

    #[test]
    fn inverted_section_bounds_fail_to_load() {
        let result: Result<FirmwareSection, _> =
            serde_json::from_value(json!({"Start": 9, "End": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn training_file_is_a_bare_string() {
        let file: TrainingFile = serde_json::from_value(json!("/data/a.elf")).unwrap();
        assert_eq!(file.filename, "/data/a.elf");
        assert_eq!(serde_json::to_value(&file).unwrap(), json!("/data/a.elf"));
    }

    #[test]
    fn filetype_name_falls_back_to_map_key() {
        let corpus: TrainingCorpus = serde_json::from_value(json!({
            "Filetype Definitions": {
                "elf": {"Filetype File": "elf.dat"},
                "jpeg": {"Name": "jpg", "Filetype File": "jpg.dat"},
            }
        }))
        .unwrap();
        let names: Vec<_> = corpus
            .filetypes
            .iter()
            .map(|filetype| filetype.name.as_str())
            .collect();
        assert!(names.contains(&"elf"));
        assert!(names.contains(&"jpg"));
    }

    #[test]
    fn firmware_base_name_is_final_path_component() {
        let firmware = Firmware::from_path(Path::new("/x/boot.bin"));
        assert_eq!(firmware.base_name(), "boot.bin");
        assert_eq!(firmware.name, "boot.bin");
        assert_eq!(firmware.filename, "/x/boot.bin");
    }

    #[test]
    fn aggregates_round_trip() {
        let mut test = TestCorpus::new("Fw1", "images");
        let mut firmware = Firmware::from_path(Path::new("/x/boot.bin"));
        firmware.push_section(FirmwareSection::new(BoundedRange::new(0, 100).unwrap(), "elf"));
        test.push_firmware(firmware);

        let reloaded: TestCorpus =
            serde_json::from_value(serde_json::to_value(&test).unwrap()).unwrap();
        assert_eq!(reloaded, test);

        let mut training = TrainingCorpus::new("Tr1", "examples", 3);
        let mut elf = FileType::named("elf");
        elf.filetype_file = "elf.dat".into();
        elf.ignore_existing = true;
        elf.push_file(TrainingFile::new("/data/a.elf"));
        training.push_filetype(elf);
        training.push_filetype(FileType::named("jpeg"));

        let reloaded: TrainingCorpus =
            serde_json::from_value(serde_json::to_value(&training).unwrap()).unwrap();
        assert_eq!(reloaded, training);
    }
}
