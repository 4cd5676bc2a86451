//! Line-driven editors for the two corpus kinds.
//!
//! The shell is the display surface the describers expect: it lists entry
//! keys, reports selection changes, and forwards field edits. Rejections
//! (identity conflicts, malformed input, store failures) are printed and
//! never fatal.

use std::path::{Path, PathBuf};

use anyhow::Result;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::app::describer::{TestCorpusDescriber, TrainingCorpusDescriber};
use crate::app::session::SessionError;
use crate::domain::range::BoundedRange;
use crate::infra::config::Config;
use crate::infra::store::{self, StoreOptions};

enum Flow {
    Continue,
    Quit,
}

/// Run the test-corpus editor, hydrating from `file` when given.
pub fn run_test_editor(file: Option<PathBuf>, config: &Config) -> Result<()> {
    let describer = match &file {
        Some(path) => TestCorpusDescriber::from_corpus(store::load(path)?),
        None => TestCorpusDescriber::new(),
    };
    let mut shell = TestShell {
        describer,
        dest: file,
        options: StoreOptions::from_config(config),
    };
    run_loop("test corpus", |line| shell.dispatch(line))
}

/// Run the training-corpus editor, hydrating from `file` when given.
pub fn run_training_editor(file: Option<PathBuf>, config: &Config) -> Result<()> {
    let describer = match &file {
        Some(path) => TrainingCorpusDescriber::from_corpus(store::load(path)?),
        None => TrainingCorpusDescriber::new(),
    };
    let mut shell = TrainingShell {
        describer,
        dest: file,
        options: StoreOptions::from_config(config),
    };
    run_loop("training corpus", |line| shell.dispatch(line))
}

fn run_loop(label: &str, mut dispatch: impl FnMut(&str) -> Result<Flow>) -> Result<()> {
    let mut editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(format!("fwcorpus {label}")),
        DefaultPromptSegment::Empty,
    );
    println!("editing {label}; type 'help' for commands");
    loop {
        match editor.read_line(&prompt)? {
            Signal::Success(line) => {
                if let Flow::Quit = dispatch(&line)? {
                    break;
                }
            }
            Signal::CtrlC => continue,
            Signal::CtrlD => break,
        }
    }
    Ok(())
}

fn report<T>(result: Result<T, SessionError>) {
    if let Err(err) = result {
        println!("rejected: {err}");
    }
}

fn save_to(dest: Option<PathBuf>, write: impl FnOnce(&Path) -> Result<()>) -> Option<PathBuf> {
    let Some(dest) = dest else {
        println!("no destination yet; use 'save <path>'");
        return None;
    };
    match write(&dest) {
        Ok(()) => {
            println!("wrote {}", dest.display());
            Some(dest)
        }
        Err(err) => {
            println!("save failed: {err:#}");
            None
        }
    }
}

struct TestShell {
    describer: TestCorpusDescriber,
    dest: Option<PathBuf>,
    options: StoreOptions,
}

impl TestShell {
    fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => return Ok(Flow::Quit),
            ["help"] => print_test_help(),
            ["ls"] => {
                let selected = self.describer.session().selected_parent().cloned();
                for key in self.describer.session().parent_keys() {
                    let marker = if Some(key) == selected.as_ref() { "*" } else { " " };
                    println!("{marker} {key}");
                }
            }
            ["add", path] => report(self.describer.add_firmware_from(Path::new(path))),
            ["rm", key] => {
                if self
                    .describer
                    .session_mut()
                    .remove_parent(&key.to_string())
                    .is_none()
                {
                    println!("no firmware '{key}'");
                }
            }
            ["sel", "-"] => report(self.describer.session_mut().select_parent(None)),
            ["sel", key] => report(
                self.describer
                    .session_mut()
                    .select_parent(Some(key.to_string())),
            ),
            ["sections"] => {
                let selected = self.describer.session().selected_child().copied();
                for key in self.describer.session().child_keys() {
                    let marker = if Some(*key) == selected { "*" } else { " " };
                    println!(
                        "{marker} {}..{} ({} bytes)",
                        key.start(),
                        key.end(),
                        key.len()
                    );
                }
            }
            ["sec", "add", start, end] => report(self.describer.add_section(start, end)),
            ["sec", "rm", bounds] => match bounds.parse::<BoundedRange>() {
                Ok(bounds) => {
                    if self
                        .describer
                        .session_mut()
                        .remove_child(&bounds)
                        .is_none()
                    {
                        println!("no section {bounds}");
                    }
                }
                Err(err) => println!("rejected: {err}"),
            },
            ["sec", "sel", "-"] => report(self.describer.session_mut().select_child(None)),
            ["sec", "sel", bounds] => match bounds.parse::<BoundedRange>() {
                Ok(bounds) => report(self.describer.session_mut().select_child(Some(bounds))),
                Err(err) => println!("rejected: {err}"),
            },
            ["set", "corpus", rest @ ..] => self.describer.name = rest.join(" "),
            ["set", "desc", rest @ ..] => self.describer.description = rest.join(" "),
            ["set", "name", rest @ ..] => {
                match self.describer.session_mut().parent_draft_mut() {
                    Some(firmware) => firmware.name = rest.join(" "),
                    None => println!("select a firmware first"),
                }
            }
            ["set", "file", path] => match self.describer.session_mut().parent_draft_mut() {
                Some(firmware) => firmware.filename = (*path).to_string(),
                None => println!("select a firmware first"),
            },
            ["set", "filetype", rest @ ..] => {
                match self.describer.session_mut().child_draft_mut() {
                    Some(section) => section.filetype = rest.join(" "),
                    None => println!("select a section first"),
                }
            }
            ["show"] => self.show(),
            ["save"] => self.save(None),
            ["save", path] => self.save(Some(PathBuf::from(path))),
            _ => println!("unrecognized command; try 'help'"),
        }
        Ok(Flow::Continue)
    }

    fn show(&self) {
        println!(
            "corpus '{}' ({}): {} firmware image(s)",
            self.describer.name,
            self.describer.description,
            self.describer.session().parent_keys().count()
        );
        if let Some(firmware) = self.describer.session().parent_draft() {
            println!("  firmware '{}' at {}", firmware.name, firmware.filename);
        }
        if let Some(section) = self.describer.session().child_draft() {
            println!("  section {} -> '{}'", section.bounds, section.filetype);
        }
    }

    fn save(&mut self, path: Option<PathBuf>) {
        let dest = path.or_else(|| self.dest.clone());
        let describer = &mut self.describer;
        let options = &self.options;
        if let Some(dest) = save_to(dest, |dest| describer.write_out(dest, options)) {
            self.dest = Some(dest);
        }
    }
}

struct TrainingShell {
    describer: TrainingCorpusDescriber,
    dest: Option<PathBuf>,
    options: StoreOptions,
}

impl TrainingShell {
    fn dispatch(&mut self, line: &str) -> Result<Flow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => return Ok(Flow::Quit),
            ["help"] => print_training_help(),
            ["ls"] => {
                let selected = self.describer.session().selected_parent().cloned();
                for key in self.describer.session().parent_keys() {
                    let marker = if Some(key) == selected.as_ref() { "*" } else { " " };
                    println!("{marker} {key}");
                }
            }
            ["add", name] => report(self.describer.add_filetype(name)),
            ["rm", key] => {
                if self
                    .describer
                    .session_mut()
                    .remove_parent(&key.to_string())
                    .is_none()
                {
                    println!("no filetype '{key}'");
                }
            }
            ["sel", "-"] => report(self.describer.session_mut().select_parent(None)),
            ["sel", key] => report(
                self.describer
                    .session_mut()
                    .select_parent(Some(key.to_string())),
            ),
            ["files"] => {
                let selected = self.describer.session().selected_child().cloned();
                for key in self.describer.session().child_keys() {
                    let marker = if Some(key) == selected.as_ref() { "*" } else { " " };
                    println!("{marker} {key}");
                }
            }
            ["file", "add", path] => {
                report(self.describer.add_training_file_from(Path::new(path)));
            }
            ["file", "rm", path] => {
                if self
                    .describer
                    .session_mut()
                    .remove_child(&path.to_string())
                    .is_none()
                {
                    println!("no training file '{path}'");
                }
            }
            ["file", "sel", "-"] => report(self.describer.session_mut().select_child(None)),
            ["file", "sel", path] => report(
                self.describer
                    .session_mut()
                    .select_child(Some(path.to_string())),
            ),
            ["set", "corpus", rest @ ..] => self.describer.name = rest.join(" "),
            ["set", "desc", rest @ ..] => self.describer.description = rest.join(" "),
            ["set", "n", value] => report(self.describer.set_n_value(value)),
            ["set", "name", name] => match self.describer.session_mut().parent_draft_mut() {
                Some(filetype) => filetype.name = (*name).to_string(),
                None => println!("select a filetype first"),
            },
            ["set", "store", path] => match self.describer.session_mut().parent_draft_mut() {
                Some(filetype) => filetype.filetype_file = (*path).to_string(),
                None => println!("select a filetype first"),
            },
            ["set", "ignore", value] => match self.describer.session_mut().parent_draft_mut() {
                Some(filetype) => match value.parse::<bool>() {
                    Ok(flag) => filetype.ignore_existing = flag,
                    Err(_) => println!("rejected: expected 'true' or 'false'"),
                },
                None => println!("select a filetype first"),
            },
            ["show"] => self.show(),
            ["save"] => self.save(None),
            ["save", path] => self.save(Some(PathBuf::from(path))),
            _ => println!("unrecognized command; try 'help'"),
        }
        Ok(Flow::Continue)
    }

    fn show(&self) {
        println!(
            "corpus '{}' ({}), n = {}: {} filetype(s)",
            self.describer.name,
            self.describer.description,
            self.describer.n_value,
            self.describer.session().parent_keys().count()
        );
        if let Some(filetype) = self.describer.session().parent_draft() {
            println!(
                "  filetype '{}' -> {} (ignore existing: {})",
                filetype.name, filetype.filetype_file, filetype.ignore_existing
            );
        }
        if let Some(file) = self.describer.session().child_draft() {
            println!("  training file {}", file.filename);
        }
    }

    fn save(&mut self, path: Option<PathBuf>) {
        let dest = path.or_else(|| self.dest.clone());
        let describer = &mut self.describer;
        let options = &self.options;
        if let Some(dest) = save_to(dest, |dest| describer.write_out(dest, options)) {
            self.dest = Some(dest);
        }
    }
}

fn print_test_help() {
    println!(
        "\
commands:
  ls                      list firmware entries ('*' marks the selection)
  add <path>              add a firmware image, keyed by its base name
  rm <key>                remove a firmware entry
  sel <key>|-             select a firmware (or clear the selection)
  sections                list sections of the selected firmware
  sec add <start> <end>   add a section by byte offsets
  sec rm <start..end>     remove a section
  sec sel <start..end>|-  select a section
  set corpus <text>       set the corpus name
  set desc <text>         set the corpus description
  set name <text>         set the selected firmware's display name
  set file <path>         set the selected firmware's image path
  set filetype <text>     set the selected section's filetype label
  show                    show the corpus and current drafts
  save [path]             commit edits and write the document
  quit                    leave the editor"
    );
}

fn print_training_help() {
    println!(
        "\
commands:
  ls                      list filetype entries ('*' marks the selection)
  add <name>              add a filetype
  rm <key>                remove a filetype
  sel <key>|-             select a filetype (or clear the selection)
  files                   list training files of the selected filetype
  file add <path>         add a training file
  file rm <path>          remove a training file
  file sel <path>|-       select a training file
  set corpus <text>       set the corpus name
  set desc <text>         set the corpus description
  set n <value>           set the corpus n value
  set name <text>         rename the selected filetype
  set store <path>        set where classification data is stored
  set ignore true|false   toggle overwriting existing classification data
  show                    show the corpus and current drafts
  save [path]             commit edits and write the document
  quit                    leave the editor"
    );
}
