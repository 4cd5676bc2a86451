use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run formatting, lints, and the test suite
    Ci,
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Ci => run_ci()?,
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
    }
    Ok(())
}

fn run_ci() -> Result<()> {
    run("cargo", &["fmt", "--all", "--", "--check"])?;
    run("cargo", &["clippy", "--workspace", "--", "-D", "warnings"])?;
    run("cargo", &["test", "--workspace"])
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut args = vec!["nextest".to_string(), "run".to_string()];
    if let Some(profile) = profile {
        args.push("--profile".into());
        args.push(profile);
    }
    if release {
        args.push("--release".into());
    }
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run("cargo", &args)
}

fn run(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program).args(args).status()?;
    if !status.success() {
        anyhow::bail!("{program} {} failed", args.join(" "));
    }
    Ok(())
}
