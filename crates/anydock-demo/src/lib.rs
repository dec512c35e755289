#![forbid(unsafe_code)]

//! Command-line walkthrough of the AnyDock tree.

pub mod error;
pub mod script;

use std::io::Write;

use anydock::DockConfig;
use anydock_core::{LogConfig, LogFormat};
use clap::{Parser, ValueEnum};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Plain,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Plain => Self::Plain,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "anydock-demo",
    about = "Replay a scripted drag session against a sample dock layout",
    version
)]
pub struct Cli {
    /// Print the final tree as a JSON snapshot.
    #[arg(long)]
    pub json: bool,

    #[arg(long = "log-format", value_enum, default_value = "plain")]
    pub log_format: LogFormatArg,

    /// Edge drop band as a fraction of the target extent (overrides ANYDOCK_EDGE_BAND).
    #[arg(long = "edge-band")]
    pub edge_band: Option<f64>,
}

impl Cli {
    /// Environment config with command-line overrides applied.
    #[must_use]
    pub fn dock_config(&self, base: DockConfig) -> DockConfig {
        match self.edge_band {
            Some(band) => base.with_edge_band(band),
            None => base,
        }
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    anydock_core::logging::init(&LogConfig::default().with_format(cli.log_format.into()))?;
    let stdout = std::io::stdout();
    run(&cli, DockConfig::from_env(), &mut stdout.lock())
}

pub fn run(cli: &Cli, base: DockConfig, out: &mut impl Write) -> Result<()> {
    let config = cli.dock_config(base);
    tracing::debug!(message = "demo.config", edge_band = config.edge_band);
    let tree = script::run_script(config, out)?;
    if cli.json {
        writeln!(out, "{}", tree.to_snapshot().to_json()?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anydock::{DockTree, DockTreeSnapshot};

    #[test]
    fn edge_band_flag_overrides_environment() {
        let cli = Cli::parse_from(["anydock-demo", "--edge-band", "0.1"]);
        let base = DockConfig::default().with_edge_band(0.4);
        assert_eq!(cli.dock_config(base).edge_band, 0.1);

        let cli = Cli::parse_from(["anydock-demo"]);
        assert_eq!(cli.dock_config(base).edge_band, 0.4);
        assert_eq!(cli.log_format, LogFormatArg::Plain);
    }

    #[test]
    fn out_of_range_edge_band_is_clamped() {
        let cli = Cli::parse_from(["anydock-demo", "--edge-band", "3"]);
        assert_eq!(cli.dock_config(DockConfig::default()).edge_band, 0.45);
    }

    #[test]
    fn json_flag_appends_a_restorable_snapshot() {
        let cli = Cli::parse_from(["anydock-demo", "--json", "--log-format", "json"]);
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Json);

        let mut out = Vec::new();
        run(&cli, DockConfig::default(), &mut out).expect("demo runs");
        let text = String::from_utf8(out).expect("utf8");
        let start = text.find("\n{").expect("snapshot follows the dumps");
        let json = &text[start + 1..];
        let snapshot = DockTreeSnapshot::from_json(json).expect("parse snapshot");
        let restored = DockTree::from_snapshot(snapshot).expect("restore");
        assert_eq!(restored.item_count(), 4);
    }
}
