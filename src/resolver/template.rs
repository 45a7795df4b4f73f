//! Filename and path template rendering
//!
//! Templates embed date, station and provider fields in braces, e.g.
//! `{ssss}{DDD}0.{YY}d` or `/gnss/products/{WWWW}`. All date fields are
//! fixed width; remote names depend on it.

use super::ResolveError;
use crate::identifier::{ProviderId, StationCode};
use crate::registry::Anchor;
use crate::time::{self, Epoch};

/// Rendered in place of a station field when no station is given
pub const STATION_WILDCARD: &str = "*";

/// Values substituted into templates
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFields {
    year: i32,
    doy: u32,
    month: u32,
    hour: u32,
    minute: u32,
    week: i32,
    day_of_week: u32,
    station: Option<StationCode>,
    provider: ProviderId,
}

impl TemplateFields {
    /// Derive every field from `epoch`, shifted to the anchor date first
    pub fn new(
        epoch: &Epoch,
        anchor: Anchor,
        station: Option<&StationCode>,
        provider: ProviderId,
    ) -> Self {
        let anchored = match anchor {
            Anchor::Epoch => *epoch,
            Anchor::WeekStart => epoch.start_of_gps_week(),
        };
        let (year, doy) = anchored.day_of_year();
        let gps = anchored.to_gps_time();
        let date = anchored.to_calendar_date();

        Self {
            year,
            doy,
            month: date.month,
            hour: anchored.hour(),
            minute: anchored.minute(),
            week: gps.week,
            day_of_week: gps.day_of_week,
            station: station.cloned(),
            provider,
        }
    }

    fn value(&self, field: &str) -> Option<String> {
        let station = |upper: bool| match &self.station {
            Some(s) if upper => s.upper(),
            Some(s) => s.lower().to_string(),
            None => STATION_WILDCARD.to_string(),
        };
        let center = self.provider.center().code();

        let value = match field {
            "YYYY" => time::format_year4(self.year),
            "YY" => time::format_year2(self.year),
            "DDD" => time::format_day_of_year(self.doy),
            "MM" => format!("{:02}", self.month),
            "HH" => format!("{:02}", self.hour),
            "MI" => format!("{:02}", self.minute),
            "h" => time::hour_letter(self.hour).to_string(),
            "WWWW" => time::format_gps_week(self.week),
            "D" => self.day_of_week.to_string(),
            "SSSS" => station(true),
            "ssss" => station(false),
            "CCC" => center.to_ascii_uppercase(),
            "ccc" => center.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// A rendered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Rendered text
    pub text: String,
    /// Byte offset of the first station field in `text`
    pub station_at: Option<usize>,
}

impl Rendered {
    /// Whether a station field rendered as the wildcard
    pub fn has_station_wildcard(&self, fields: &TemplateFields) -> bool {
        self.station_at.is_some() && fields.station.is_none()
    }

    /// Offset of the station code in names matching this pattern, when every
    /// character before it is fixed text
    pub fn fixed_station_offset(&self) -> Option<usize> {
        let at = self.station_at?;
        (!self.text[..at].contains('*')).then_some(at)
    }
}

/// Substitute every `{FIELD}` in `template`
pub fn render(template: &str, fields: &TemplateFields) -> Result<Rendered, ResolveError> {
    let mut text = String::with_capacity(template.len() + 16);
    let mut station_at = None;
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ResolveError::Template(format!("unclosed field in '{template}'"))
        })?;
        let name = &after[..close];
        let value = fields.value(name).ok_or_else(|| {
            ResolveError::Template(format!("unknown field {{{name}}} in '{template}'"))
        })?;
        if station_at.is_none() && name.eq_ignore_ascii_case("ssss") {
            station_at = Some(text.len());
        }
        text.push_str(&value);
        rest = &after[close + 1..];
    }
    text.push_str(rest);

    Ok(Rendered { text, station_at })
}
