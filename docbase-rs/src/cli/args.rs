//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docbase")]
#[command(author, version, about = "A CLI for schema-aware Markdown documentation workspaces", long_about = None)]
pub struct Cli {
    /// Path to the workspace root (overrides DOCBASE_ROOT and config)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output as JSON (default)
    #[arg(long, global = true, conflicts_with_all = ["yaml", "toml"])]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true, conflicts_with_all = ["json", "toml"])]
    pub yaml: bool,

    /// Output as TOML
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml"])]
    pub toml: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else {
            OutputFormat::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the workspace tree
    Tree(TreeArgs),

    /// Show a directory with its metadata, documents and relation options
    Dir(DirArgs),

    /// Read a document
    Get(GetArgs),

    /// Create a draft document in a directory
    Create(CreateArgs),

    /// Update a document's front matter and/or body
    Update(UpdateArgs),

    /// Delete a document
    Delete(DeleteArgs),

    /// Move a document
    Move(MoveArgs),

    /// Move a document into its directory's archive
    Archive(PathArgs),

    /// Move an archived document back out of the archive
    Restore(PathArgs),

    /// Resolve a document's relation fields
    Relations(PathArgs),

    /// Check documents against their directory schemas
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Print document paths only, one per line
    #[arg(long)]
    pub paths: bool,
}

#[derive(Parser, Debug)]
pub struct DirArgs {
    /// Directory path (defaults to the workspace root)
    pub path: Option<String>,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Path to the document
    pub path: String,

    /// Print only the body, as raw text
    #[arg(long, conflicts_with = "front_matter_only")]
    pub body_only: bool,

    /// Print only the front matter
    #[arg(long)]
    pub front_matter_only: bool,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Directory to create the document in
    pub dir: String,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Path to the document
    pub path: String,

    /// Set a front matter key (KEY=VALUE, VALUE parsed as JSON when possible; repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Remove a front matter key (repeatable)
    #[arg(long = "remove", value_name = "KEY")]
    pub remove: Vec<String>,

    /// Front matter patch as a JSON object (null removes a key)
    #[arg(long)]
    pub patch: Option<String>,

    /// Replace the body with this text
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Replace the body with the contents of a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Path to the document to delete
    pub path: String,

    /// Show what would be deleted without making changes
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct MoveArgs {
    /// Current path
    pub from: String,

    /// New path
    pub to: String,

    /// Show what would be moved without making changes
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug)]
pub struct PathArgs {
    /// Path to the document
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CheckFormat {
    #[default]
    Json,
    Text,
    Github,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Only check specific issue type (repeatable)
    #[arg(long)]
    pub only: Vec<String>,

    /// Skip specific issue type (repeatable)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Check only documents matching pattern
    #[arg(long)]
    pub glob: Option<String>,

    /// Exit non-zero only if one of these types is found (repeatable)
    #[arg(long)]
    pub fail_on: Vec<String>,

    /// Also check archived documents
    #[arg(long)]
    pub include_archived: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = CheckFormat::Json)]
    pub format: CheckFormat,
}
