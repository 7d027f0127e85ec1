mod cfg;
mod cli;

pub use cfg::{Config, Target};
pub use cli::{Cli, Error as CliError};
use once_cell::sync::Lazy;

pub static ARGS: Lazy<cli::Cli> = Lazy::new(cli::Cli::parse);
