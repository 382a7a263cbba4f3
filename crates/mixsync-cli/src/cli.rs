use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mixsync_project::Profile;

#[derive(Parser)]
#[command(
    name = "mixsync",
    about = "MixSync: project state, encrypted metadata and code analysis",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a fresh base64 key for MIXSYNC_KEY
    Keygen,
    /// List the files of a project directory
    Tree(TreeArgs),
    /// Print a file's content, decrypting protected files
    Cat(FileArgs),
    /// Run the code-change analyzers over a file
    Lint(LintArgs),
    /// Select a file and print the open-file prompt
    Inspect(FileArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct FileArgs {
    pub dir: PathBuf,
    /// Path inside the project, with or without the root folder name
    pub path: String,
}

#[derive(Args)]
pub struct LintArgs {
    #[command(flatten)]
    pub file: FileArgs,
    /// Run every built-in analyzer, ignoring plugins.json
    #[arg(long)]
    pub all: bool,
    /// Apply a plugin preset first: analytic, creative or agile
    #[arg(long)]
    pub profile: Option<Profile>,
}
