//! Terminal styles for the rideboard CLI.
//!
//! Renderers ask for styles by meaning (a badge for an entry type, the style of a
//! notification severity), never by color. `console` drops the escape codes on its
//! own when stdout is not a terminal, so piped output stays plain.

use console::Style;
use once_cell::sync::Lazy;
use rideboardapp::model::EntryType;
use rideboardapp::notify::Severity;

pub struct Theme {
    pub title: Style,
    pub muted: Style,
    pub faint: Style,
    pub route: Style,
    pub time: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    offering: Style,
    seeking: Style,
    split: Style,
    flight: Style,
    unknown: Style,
}

pub static THEME: Lazy<Theme> = Lazy::new(|| {
    let muted = Style::new().color256(245);
    Theme {
        title: Style::new().bold(),
        faint: Style::new().color256(240),
        route: Style::new().bold(),
        time: muted.clone().italic(),
        success: Style::new().green(),
        warning: Style::new().yellow().bold(),
        error: Style::new().red().bold(),
        info: muted.clone(),
        muted,
        offering: Style::new().black().on_green(),
        seeking: Style::new().black().on_yellow(),
        split: Style::new().black().on_cyan(),
        flight: Style::new().white().on_blue(),
        unknown: Style::new().black().on_white(),
    }
});

impl Theme {
    pub fn badge(&self, kind: EntryType) -> &Style {
        match kind {
            EntryType::OfferingRide => &self.offering,
            EntryType::SeekingRide => &self.seeking,
            EntryType::RideshareSplit => &self.split,
            EntryType::FlightInfo => &self.flight,
            EntryType::Unknown => &self.unknown,
        }
    }

    pub fn severity(&self, severity: Severity) -> &Style {
        match severity {
            Severity::Info => &self.info,
            Severity::Success => &self.success,
            Severity::Warning => &self.warning,
            Severity::Error => &self.error,
        }
    }
}
