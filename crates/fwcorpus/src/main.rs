use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use fwcorpus::domain::model::{TestCorpus, TrainingCorpus};
use fwcorpus::infra::config::Config;
use fwcorpus::infra::store;
use fwcorpus::ui::shell;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Describe the training and test corpora of a firmware file-type classifier",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Edit a test corpus description interactively
    Test { file: Option<PathBuf> },
    /// Edit a training corpus description interactively
    Training { file: Option<PathBuf> },
    /// Print a summary of a corpus document
    Inspect {
        file: PathBuf,
        /// Treat the document as a training corpus
        #[arg(long)]
        training: bool,
    },
}

fn main() -> Result<()> {
    fwcorpus::init();
    let cli = Cli::parse();
    let config = Config::load()?;
    match cli.command {
        Command::Test { file } => shell::run_test_editor(file, &config),
        Command::Training { file } => shell::run_training_editor(file, &config),
        Command::Inspect { file, training } => inspect(&file, training),
    }
}

fn inspect(file: &Path, training: bool) -> Result<()> {
    if training {
        let corpus: TrainingCorpus = store::load(file)?;
        println!(
            "training corpus '{}' (n = {}): {} filetype(s)",
            corpus.name,
            corpus.n_value,
            corpus.filetypes.len()
        );
        for filetype in &corpus.filetypes {
            println!(
                "  {}: {} file(s), classification data in '{}'",
                filetype.name,
                filetype.files.len(),
                filetype.filetype_file
            );
        }
    } else {
        let corpus: TestCorpus = store::load(file)?;
        println!(
            "test corpus '{}': {} firmware image(s)",
            corpus.name,
            corpus.firmware.len()
        );
        for firmware in &corpus.firmware {
            println!(
                "  {} ({}): {} section(s)",
                firmware.base_name(),
                firmware.filename,
                firmware.sections.len()
            );
        }
    }
    Ok(())
}
