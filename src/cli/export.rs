//! Export CLI commands

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::export::{export_month_csv, export_month_json, export_month_yaml};
use crate::storage::Storage;

use super::resolve_month;

/// Export subcommands
#[derive(Subcommand)]
pub enum ExportCommands {
    /// A month's transactions as CSV
    Csv {
        #[arg(short, long)]
        month: Option<String>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// A month report as JSON
    Json {
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// A month report as YAML
    Yaml {
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn open_output(path: Option<&Path>) -> BudgetResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                BudgetError::Export(format!("Failed to create {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Handle an export command
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> BudgetResult<()> {
    let (month, output) = match &cmd {
        ExportCommands::Csv { month, output }
        | ExportCommands::Json { month, output }
        | ExportCommands::Yaml { month, output } => (month.as_deref(), output.as_deref()),
    };

    let month = resolve_month(storage, settings, month)?;
    let mut writer = open_output(output)?;

    match cmd {
        ExportCommands::Csv { .. } => {
            export_month_csv(storage, month.id, &mut writer)?;
        }
        ExportCommands::Json { .. } => {
            export_month_json(storage, settings, month.id, &mut writer)?;
        }
        ExportCommands::Yaml { .. } => {
            export_month_yaml(storage, settings, month.id, &mut writer)?;
        }
    }

    writer
        .flush()
        .map_err(|e| BudgetError::Export(e.to_string()))?;

    if let Some(path) = output {
        eprintln!("Exported {} to {}", month.name, path.display());
    }

    Ok(())
}
