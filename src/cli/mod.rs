pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, OutputFormatArg, QueryArgs, RepositoryArgs, TargetArg};
pub use output::{OutputFormat, OutputFormatter};
