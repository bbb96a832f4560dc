use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file overriding the default project layout
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the objects of a level as JSON
    Dump {
        /// Level directory (the one holding script.c)
        #[arg(long)]
        level: PathBuf,
        /// Only this area; all areas when omitted
        #[arg(long)]
        area: Option<i32>,
        /// Project root used when headers are not found above the level
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// List every behavior the project declares
    Behaviors {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// List every model id the project defines, or only those a level can use
    Models {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Level directory; limits the list to its loaded models and actor bins
        #[arg(long)]
        level: Option<PathBuf>,
    },
    /// Write edited objects (as printed by `dump`) back into the C sources
    Apply {
        #[arg(long)]
        objects: PathBuf,
    },
}
