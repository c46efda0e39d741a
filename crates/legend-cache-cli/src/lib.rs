pub mod commands;
pub mod error;
pub mod output;

pub use commands::{ConfigCommand, SimulateCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_optional, format_percent, format_size};
