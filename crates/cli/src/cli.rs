use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{expand_command, lockfile_command, projects_command, resolve_command};

/// Resolve JavaScript and TypeScript imports to Bazel targets
#[derive(Parser, Debug)]
#[command(name = "gazelle-js")]
#[command(version, about, long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the imports of every rule in a rules manifest
    #[command(visible_alias = "r")]
    Resolve {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Rules manifest JSON produced by the indexer
        #[arg(long)]
        rules: PathBuf,

        /// Settings file (defaults to .gazelle-js.json found from the root upwards)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,

        /// Cache parsed lockfiles in this directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print the tsconfig path candidates of an import
    #[command(visible_alias = "e")]
    Expand {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Settings file (defaults to .gazelle-js.json found from the root upwards)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// The importing file
        from_file: PathBuf,

        /// The import as written
        import: String,
    },
    /// Print the dependencies of each project of a pnpm lockfile
    Lockfile {
        /// Path to the pnpm-lock.yaml
        path: PathBuf,
    },
    /// List the pnpm projects of a workspace
    Projects {
        /// Workspace root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Settings file (defaults to .gazelle-js.json found from the root upwards)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the projects as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Resolve {
                root,
                rules,
                config,
                json,
                cache_dir,
            } => resolve_command(root.as_deref(), &rules, config.as_deref(), json, cache_dir),
            Commands::Expand {
                root,
                config,
                from_file,
                import,
            } => expand_command(root.as_deref(), config.as_deref(), &from_file, &import),
            Commands::Lockfile { path } => lockfile_command(&path),
            Commands::Projects { root, config, json } => {
                projects_command(root.as_deref(), config.as_deref(), json)
            }
        }
    }
}
