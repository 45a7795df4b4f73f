//! `resolve` command: show where a product would be fetched from

use super::{Cli, CliError, OutputFormat};
use crate::downloader::ProductRequest;
use crate::identifier::{Mirror, ProviderId, StationCode};
use crate::registry::ArchiveCatalog;
use crate::resolver;
use crate::time::{CalendarDate, Epoch};
use crate::{NamingPreference, ProductKind};
use chrono::{Datelike, NaiveDate};
use clap::Args;
use serde_json::json;

/// Resolve arguments
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Product kind (obs, nav, sp3, clk, eop, obx, dsb, osb, ion, roti, ztd, snx, atx)
    pub kind: ProductKind,

    /// Provider code (e.g. igs, cod_m, gfz_r)
    #[arg(long)]
    pub provider: String,

    /// Date as YYYY-MM-DD or YYYY-DDD
    #[arg(long)]
    pub date: String,

    /// Hour of day for sub-daily variants
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour: u32,

    /// Minute of hour for high-rate observations
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..60))]
    pub minute: u32,

    /// Station code for station-based products; omit for the bulk pattern
    #[arg(long)]
    pub station: Option<String>,

    /// Catalog variant (e.g. hourly, mixed3, ultra)
    #[arg(long)]
    pub variant: Option<String>,

    /// Naming conventions: long, short or both
    #[arg(long, default_value = "both")]
    pub naming: NamingPreference,

    /// Archive mirror: cddis, ign or whu
    #[arg(long, default_value = "cddis")]
    pub mirror: Mirror,
}

/// Parse `YYYY-MM-DD` or `YYYY-DDD`
pub fn parse_date(input: &str) -> Result<Epoch, CliError> {
    let input = input.trim();
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%j"))
        .map_err(|e| CliError::InvalidArgument(format!("Invalid date '{input}': {e}")))?;
    let calendar = CalendarDate::ymd(date.year(), date.month(), date.day())
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    Ok(calendar.to_epoch())
}

impl ResolveArgs {
    /// Build the request described by the arguments
    pub fn request(&self) -> Result<ProductRequest, CliError> {
        let epoch = parse_date(&self.date)?
            .add_seconds(f64::from(self.hour * 3600 + self.minute * 60));
        let mut request = ProductRequest::new(self.kind, epoch, ProviderId::parse(&self.provider)?)
            .with_naming(self.naming);
        if let Some(station) = &self.station {
            request = request.with_station(StationCode::parse(station)?);
        }
        if let Some(variant) = &self.variant {
            request = request.with_sampling_tag(variant.clone());
        }
        Ok(request)
    }

    /// Print the candidate list
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let catalog = ArchiveCatalog::embedded(self.mirror)?;
        let request = self.request()?;
        let candidates = resolver::resolve(&request, &catalog)?;
        let local = resolver::local_name(&request, &catalog)?;

        match cli.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "request": request,
                    "mirror": self.mirror,
                    "local_name": local,
                    "candidates": candidates,
                    "urls": candidates.iter().flat_map(|c| c.urls()).collect::<Vec<_>>(),
                });
                let text = serde_json::to_string_pretty(&output)
                    .map_err(|e| CliError::Io(format!("Failed to serialize candidates: {e}")))?;
                println!("{text}");
            }
            OutputFormat::Human => {
                println!("{} -> {}", request.label(), local);
                for candidate in &candidates {
                    for url in candidate.urls() {
                        let bulk = if candidate.bulk { " (bulk)" } else { "" };
                        println!("  [{} {}]{} {}", candidate.provider, candidate.naming_tag, bulk, url);
                    }
                }
            }
        }
        Ok(())
    }
}
