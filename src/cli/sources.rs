//! CLI command for listing catalog products

use super::{Cli, CliError, OutputFormat};
use crate::identifier::Mirror;
use crate::registry::{ArchiveCatalog, CatalogEntry};
use crate::ProductKind;
use clap::Args;
use serde_json::json;

/// Sources subcommand
#[derive(Debug, Args)]
pub struct SourcesCommand {
    #[command(subcommand)]
    action: SourcesAction,
}

/// Sources actions
#[derive(Debug, clap::Subcommand)]
enum SourcesAction {
    /// List catalog entries available on a mirror
    List {
        /// Only this product kind
        kind: Option<ProductKind>,

        /// Archive mirror: cddis, ign or whu
        #[arg(long, default_value = "cddis")]
        mirror: Mirror,
    },
}

impl SourcesCommand {
    /// Execute the sources command
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        match &self.action {
            SourcesAction::List { kind, mirror } => {
                let catalog = ArchiveCatalog::embedded(*mirror)?;
                let entries: Vec<&CatalogEntry> = catalog
                    .entries()
                    .iter()
                    .filter(|e| kind.map_or(true, |k| e.kind() == k))
                    .collect();
                print_entries(&catalog, &entries, cli.output_format)
            }
        }
    }
}

fn provider_list(entry: &CatalogEntry) -> String {
    entry
        .providers()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn print_entries(
    catalog: &ArchiveCatalog,
    entries: &[&CatalogEntry],
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "kind": e.kind(),
                        "variant": e.variant(),
                        "default": e.is_default(),
                        "providers": e.providers(),
                        "union_of": e.union_of(),
                        "base": catalog.base_template(e),
                        "long": e.long_template(),
                        "short": e.short_template(),
                        "local": e.local_template(),
                        "description": e.description(),
                    })
                })
                .collect();
            let output = json!({
                "mirror": catalog.mirror(),
                "host": catalog.host(),
                "schema_version": catalog.schema_version(),
                "entries": rows,
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| CliError::Io(format!("Failed to serialize catalog: {e}")))?;
            println!("{text}");
        }
        OutputFormat::Human => {
            println!(
                "{} catalog entries on {} ({}):\n",
                entries.len(),
                catalog.mirror(),
                catalog.host()
            );
            for entry in entries {
                let default = if entry.is_default() { "*" } else { " " };
                println!(
                    "{:<18} {:<9}{} {:<40} {}",
                    entry.kind().as_str(),
                    entry.variant(),
                    default,
                    provider_list(entry),
                    entry.description()
                );
            }
        }
    }
    Ok(())
}
