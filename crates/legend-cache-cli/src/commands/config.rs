use std::path::Path;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use legend_cache::config::Config;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_optional, format_size};

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Parser)]
pub enum ConfigSubcommand {
    #[clap(about = "Show the effective configuration")]
    Show,

    #[clap(about = "List the locations searched for a config file")]
    Paths,

    #[clap(about = "Print the default configuration as TOML")]
    Template,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            ConfigSubcommand::Show => Self::show(config_path, format),
            ConfigSubcommand::Paths => Self::paths(format),
            ConfigSubcommand::Template => Self::template(),
        }
    }

    fn show(config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let config = Config::load(config_path)?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            OutputFormat::Table => {
                match config_path {
                    Some(path) => println!("Configuration from: {}", path.display()),
                    None => println!("Configuration: (default search paths)"),
                }
                println!("==============================\n");

                for (section, rows) in config_sections(&config) {
                    println!("[{section}]");
                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(["Setting", "Value"]);
                    for (key, value) in rows {
                        table.add_row([key, value.as_str()]);
                    }
                    println!("{table}\n");
                }
            }
        }

        Ok(())
    }

    fn paths(format: OutputFormat) -> CliResult<()> {
        let paths = Config::default_paths();

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = paths
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "path": p.display().to_string(),
                            "exists": p.exists(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Path", "Exists"]);
                for path in &paths {
                    table.add_row([
                        path.display().to_string(),
                        if path.exists() { "yes" } else { "no" }.to_string(),
                    ]);
                }
                println!("{table}");
            }
        }

        Ok(())
    }

    fn template() -> CliResult<()> {
        print!("{}", toml::to_string_pretty(&Config::default())?);
        Ok(())
    }
}

/// Settings grouped by config section, in display order
pub fn config_sections(config: &Config) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
    vec![
        (
            "Tiers",
            vec![
                (
                    "hot_retention_units",
                    config.tiers.hot_retention_units.to_string(),
                ),
                (
                    "warm_retention_units",
                    config.tiers.warm_retention_units.to_string(),
                ),
                (
                    "hot_capacity_entries",
                    format_optional(config.tiers.hot_capacity_entries),
                ),
                (
                    "hot_capacity_bytes",
                    format_optional(config.tiers.hot_capacity_bytes.map(format_size)),
                ),
                (
                    "warm_promotion_hits",
                    format_optional(config.tiers.warm_promotion_hits),
                ),
            ],
        ),
        (
            "Access Window",
            vec![("size", config.access_window.size.to_string())],
        ),
        (
            "Compression",
            vec![
                (
                    "voice_max_length",
                    config.compression.voice_max_length.to_string(),
                ),
                (
                    "summary_max_length",
                    format_optional(config.compression.summary_max_length),
                ),
                (
                    "max_relationships",
                    format_optional(config.compression.max_relationships),
                ),
            ],
        ),
        (
            "Memory Budget",
            vec![(
                "limit_bytes",
                format!(
                    "{} ({})",
                    config.memory_budget.limit_bytes,
                    format_size(config.memory_budget.limit_bytes)
                ),
            )],
        ),
    ]
}
