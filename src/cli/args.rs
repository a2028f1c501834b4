use clap::{ArgAction, Parser, Subcommand};

use crate::models::ProjectId;

#[derive(Debug, Parser)]
#[command(name = "nix-go", about = "Named nix-shell environments", version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List existing projects/environments
    #[command(visible_aliases = ["ls", "l"])]
    List,

    /// Create a new project/environment
    New {
        /// Project name
        name: String,
        /// Working directory for the project shell
        #[arg(long)]
        path: Option<String>,
    },

    /// List packages in a project/environment
    #[command(visible_alias = "lp")]
    ListPackages {
        #[arg(long, value_parser = clap::value_parser!(ProjectId).range(0..))]
        id: Option<ProjectId>,
        /// Project name (when --id is not given)
        project: Option<String>,
    },

    /// Add packages to a project/environment
    #[command(visible_alias = "ap")]
    AddPackage {
        #[arg(long, value_parser = clap::value_parser!(ProjectId).range(0..))]
        id: Option<ProjectId>,
        /// Project name (when --id is not given) followed by package names
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Remove packages from a project/environment
    #[command(visible_alias = "rp")]
    RemovePackage {
        #[arg(long, value_parser = clap::value_parser!(ProjectId).range(0..))]
        id: Option<ProjectId>,
        /// Project name (when --id is not given) followed by package names
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Delete a project/environment
    #[command(visible_aliases = ["del", "remove", "rm"])]
    Delete {
        #[arg(long, value_parser = clap::value_parser!(ProjectId).range(0..))]
        id: Option<ProjectId>,
        /// Project name (when --id is not given)
        project: Option<String>,
    },

    /// Start a project/environment shell
    #[command(visible_aliases = ["run", "go"])]
    Shell {
        /// Project name
        name: String,
    },

    /// Rename a project/environment or change its path
    #[command(visible_alias = "e")]
    Edit {
        #[arg(long, value_parser = clap::value_parser!(ProjectId).range(0..))]
        id: Option<ProjectId>,
        /// Project name (when --id is not given)
        project: Option<String>,
        /// New name
        #[arg(long = "name")]
        rename: Option<String>,
        /// New working directory; an empty value clears it
        #[arg(long)]
        path: Option<String>,
    },
}
