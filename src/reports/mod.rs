//! Read-mostly planning views built on the backend's reporting endpoints.

pub mod current_intakes;
pub mod delivery_overview;
pub mod intake_sections;
pub mod professor_picker;
pub mod program_delivery;

use chrono::NaiveDate;
use reqwest::Url;

pub use current_intakes::CurrentIntakesView;
pub use delivery_overview::DeliveryOverview;
pub use intake_sections::IntakeSections;
pub use professor_picker::ProfessorPicker;
pub use program_delivery::ProgramDelivery;

/// `2024-09-01` (or a full timestamp) as `Sep 1, 2024`; anything
/// unparseable is shown as-is.
pub fn format_date(raw: &str) -> String {
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Console link to an intake's sections narrowed to one program.
pub fn program_link(intake_id: i64, program: &str) -> String {
    let path = format!("/current-intakes/sections/{}", intake_id);
    match Url::parse(&format!("http://console{}", path)) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("program", program);
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => path,
            }
        }
        Err(_) => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dates_and_keeps_unparseable_input() {
        assert_eq!(format_date("2024-09-01"), "Sep 1, 2024");
        assert_eq!(format_date("2025-01-15T08:00:00Z"), "Jan 15, 2025");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn program_link_encodes_the_name() {
        assert_eq!(program_link(4, "BBA"), "/current-intakes/sections/4?program=BBA");
        assert_eq!(
            program_link(4, "Law & Politics"),
            "/current-intakes/sections/4?program=Law+%26+Politics"
        );
    }
}
