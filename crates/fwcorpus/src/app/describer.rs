//! Corpus describers: the controllers behind the two interactive editors.
//!
//! Each describer pairs the corpus-level fields with an [`EditingSession`]
//! over the aggregate's entries and turns raw user input (paths, endpoint
//! text) into validated entities. File selection is delegated to a
//! [`FilePrompt`] collaborator so no widget toolkit leaks in here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::app::session::{EditingSession, Keyed, ParentEntity, SessionError};
use crate::domain::model::{
    FileType, Firmware, FirmwareSection, TestCorpus, TrainingCorpus, TrainingFile,
};
use crate::domain::range::BoundedRange;
use crate::infra::store::{self, StoreOptions};

/// Collaborator that asks the user to pick files. Cancellation is reported as
/// `None` and turns the calling operation into a no-op.
pub trait FilePrompt {
    /// Pick an existing file to open.
    fn choose_open(&mut self) -> Option<PathBuf>;
    /// Pick a destination to save to.
    fn choose_save(&mut self) -> Option<PathBuf>;
}

impl Keyed for Firmware {
    type Key = String;

    fn key(&self) -> String {
        self.base_name()
    }
}

impl ParentEntity for Firmware {
    type Child = FirmwareSection;

    fn children(&self) -> &[FirmwareSection] {
        &self.sections
    }

    fn replace_children(&mut self, children: Vec<FirmwareSection>) {
        self.sections = children;
    }
}

impl Keyed for FirmwareSection {
    type Key = BoundedRange;

    fn key(&self) -> BoundedRange {
        self.bounds
    }
}

impl Keyed for FileType {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

impl ParentEntity for FileType {
    type Child = TrainingFile;

    fn children(&self) -> &[TrainingFile] {
        &self.files
    }

    fn replace_children(&mut self, children: Vec<TrainingFile>) {
        self.files = children;
    }
}

impl Keyed for TrainingFile {
    type Key = String;

    fn key(&self) -> String {
        self.filename.clone()
    }
}

/// Controller for editing a [`TestCorpus`] description.
#[derive(Debug, Clone, Default)]
pub struct TestCorpusDescriber {
    pub name: String,
    pub description: String,
    session: EditingSession<Firmware>,
}

impl TestCorpusDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_corpus(corpus: TestCorpus) -> Self {
        Self {
            name: corpus.name,
            description: corpus.description,
            session: EditingSession::load(corpus.firmware),
        }
    }

    pub fn session(&self) -> &EditingSession<Firmware> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditingSession<Firmware> {
        &mut self.session
    }

    /// Add a firmware entry keyed by the path's base name.
    pub fn add_firmware_from(&mut self, path: &Path) -> Result<String, SessionError> {
        if path.as_os_str().is_empty() {
            return Err(SessionError::MalformedInput {
                reason: "empty firmware path".into(),
            });
        }
        self.session.add_parent(Firmware::from_path(path))
    }

    pub fn add_firmware_via(
        &mut self,
        prompt: &mut dyn FilePrompt,
    ) -> Result<Option<String>, SessionError> {
        match prompt.choose_open() {
            Some(path) => self.add_firmware_from(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Add a section under the selected firmware from raw endpoint input.
    pub fn add_section(&mut self, start: &str, end: &str) -> Result<BoundedRange, SessionError> {
        let bounds = parse_bounds(start, end)?;
        self.session
            .add_child(FirmwareSection::new(bounds, String::new()))
    }

    /// Rebuild the aggregate, committing in-progress edits first.
    pub fn to_corpus(&mut self) -> Result<TestCorpus, SessionError> {
        self.session.commit()?;
        Ok(TestCorpus {
            name: self.name.clone(),
            description: self.description.clone(),
            firmware: self.session.parents().cloned().collect(),
        })
    }

    pub fn write_out(&mut self, path: &Path, options: &StoreOptions) -> Result<()> {
        let corpus = self
            .to_corpus()
            .context("failed to commit pending edits")?;
        store::write_out(&corpus, path, options)?;
        info!(path = %path.display(), firmware = corpus.firmware.len(), "wrote test corpus");
        Ok(())
    }

    /// Save through the prompt collaborator; `Ok(None)` means cancelled.
    pub fn save_via(
        &mut self,
        prompt: &mut dyn FilePrompt,
        options: &StoreOptions,
    ) -> Result<Option<PathBuf>> {
        match prompt.choose_save() {
            Some(path) => {
                self.write_out(&path, options)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

/// Controller for editing a [`TrainingCorpus`] description.
#[derive(Debug, Clone)]
pub struct TrainingCorpusDescriber {
    pub name: String,
    pub description: String,
    pub n_value: u32,
    session: EditingSession<FileType>,
}

impl Default for TrainingCorpusDescriber {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            n_value: 1,
            session: EditingSession::new(),
        }
    }
}

impl TrainingCorpusDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_corpus(corpus: TrainingCorpus) -> Self {
        Self {
            name: corpus.name,
            description: corpus.description,
            n_value: corpus.n_value,
            session: EditingSession::load(corpus.filetypes),
        }
    }

    pub fn session(&self) -> &EditingSession<FileType> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditingSession<FileType> {
        &mut self.session
    }

    pub fn set_n_value(&mut self, value: &str) -> Result<(), SessionError> {
        self.n_value = value.trim().parse().map_err(|_| SessionError::MalformedInput {
            reason: format!("'{value}' is not a valid n value"),
        })?;
        Ok(())
    }

    pub fn add_filetype(&mut self, name: &str) -> Result<String, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::MalformedInput {
                reason: "empty filetype name".into(),
            });
        }
        self.session.add_parent(FileType::named(name))
    }

    pub fn add_training_file_from(&mut self, path: &Path) -> Result<String, SessionError> {
        if path.as_os_str().is_empty() {
            return Err(SessionError::MalformedInput {
                reason: "empty training file path".into(),
            });
        }
        self.session
            .add_child(TrainingFile::new(path.display().to_string()))
    }

    pub fn add_training_file_via(
        &mut self,
        prompt: &mut dyn FilePrompt,
    ) -> Result<Option<String>, SessionError> {
        match prompt.choose_open() {
            Some(path) => self.add_training_file_from(&path).map(Some),
            None => Ok(None),
        }
    }

    pub fn to_corpus(&mut self) -> Result<TrainingCorpus, SessionError> {
        self.session.commit()?;
        Ok(TrainingCorpus {
            name: self.name.clone(),
            description: self.description.clone(),
            n_value: self.n_value,
            filetypes: self.session.parents().cloned().collect(),
        })
    }

    pub fn write_out(&mut self, path: &Path, options: &StoreOptions) -> Result<()> {
        let corpus = self
            .to_corpus()
            .context("failed to commit pending edits")?;
        store::write_out(&corpus, path, options)?;
        info!(path = %path.display(), filetypes = corpus.filetypes.len(), "wrote training corpus");
        Ok(())
    }

    pub fn save_via(
        &mut self,
        prompt: &mut dyn FilePrompt,
        options: &StoreOptions,
    ) -> Result<Option<PathBuf>> {
        match prompt.choose_save() {
            Some(path) => {
                self.write_out(&path, options)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

fn parse_bounds(start: &str, end: &str) -> Result<BoundedRange, SessionError> {
    let start = parse_endpoint(start)?;
    let end = parse_endpoint(end)?;
    BoundedRange::new(start, end).map_err(|err| SessionError::MalformedInput {
        reason: err.to_string(),
    })
}

fn parse_endpoint(value: &str) -> Result<u64, SessionError> {
    value.trim().parse().map_err(|_| SessionError::MalformedInput {
        reason: format!("'{value}' is not a byte offset"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPrompt {
        open: Option<PathBuf>,
        save: Option<PathBuf>,
    }

    impl FilePrompt for FixedPrompt {
        fn choose_open(&mut self) -> Option<PathBuf> {
            self.open.clone()
        }

        fn choose_save(&mut self) -> Option<PathBuf> {
            self.save.clone()
        }
    }

    #[test]
    fn non_numeric_endpoints_are_rejected() {
        let mut describer = TestCorpusDescriber::new();
        describer
            .add_firmware_from(Path::new("/x/boot.bin"))
            .unwrap();
        describer
            .session_mut()
            .select_parent(Some("boot.bin".into()))
            .unwrap();

        let result = describer.add_section("ten", "100");
        assert!(matches!(result, Err(SessionError::MalformedInput { .. })));

        let result = describer.add_section("100", "10");
        assert!(matches!(result, Err(SessionError::MalformedInput { .. })));
    }

    #[test]
    fn cancelled_prompt_is_a_no_op() {
        let mut describer = TestCorpusDescriber::new();
        let mut prompt = FixedPrompt {
            open: None,
            save: None,
        };
        assert_eq!(describer.add_firmware_via(&mut prompt).unwrap(), None);
        assert_eq!(describer.session().parent_keys().count(), 0);
    }

    #[test]
    fn prompt_adds_firmware_by_base_name() {
        let mut describer = TestCorpusDescriber::new();
        let mut prompt = FixedPrompt {
            open: Some(PathBuf::from("/images/router.bin")),
            save: None,
        };
        let key = describer.add_firmware_via(&mut prompt).unwrap();
        assert_eq!(key.as_deref(), Some("router.bin"));
    }

    #[test]
    fn n_value_parsing() {
        let mut describer = TrainingCorpusDescriber::new();
        assert_eq!(describer.n_value, 1);
        describer.set_n_value("4").unwrap();
        assert_eq!(describer.n_value, 4);
        assert!(matches!(
            describer.set_n_value("four"),
            Err(SessionError::MalformedInput { .. })
        ));
        assert_eq!(describer.n_value, 4, "failed parse must not clobber");
    }

    #[test]
    fn training_files_attach_to_selected_filetype() {
        let mut describer = TrainingCorpusDescriber::new();
        describer.add_filetype("elf").unwrap();
        describer
            .session_mut()
            .select_parent(Some("elf".into()))
            .unwrap();
        describer
            .add_training_file_from(Path::new("/data/a.elf"))
            .unwrap();

        let corpus = describer.to_corpus().unwrap();
        assert_eq!(corpus.filetypes.len(), 1);
        assert_eq!(corpus.filetypes[0].files.len(), 1);
        assert_eq!(corpus.filetypes[0].files[0].filename, "/data/a.elf");
    }

    #[test]
    fn blank_filetype_name_is_rejected() {
        let mut describer = TrainingCorpusDescriber::new();
        assert!(matches!(
            describer.add_filetype("   "),
            Err(SessionError::MalformedInput { .. })
        ));
    }
}
