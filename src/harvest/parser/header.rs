use crate::harvest::parser::{select_all, text_lines};
use scraper::Html;

/// Location and date from the event header page (`naslov.htm`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHeader {
    pub location: Option<String>,
    pub date: Option<String>,
}

impl EventHeader {
    /// Parses the header cell
    ///
    /// The first line reads `"<title> - <location>"`, the second line holds the
    /// date as `DD.MM.YYYY`.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let Some(cell) = select_all(document.root_element(), "td.tur_main_naslov")
            .into_iter()
            .next()
        else {
            return Self::default();
        };

        let lines = text_lines(cell);
        let location = lines.first().and_then(|title| location_from_title(title));
        let date = lines.get(1).cloned();

        Self { location, date }
    }
}

/// Takes the part after the last dash, preferring a spaced dash
fn location_from_title(title: &str) -> Option<String> {
    let location = [" - ", " -", "-"]
        .iter()
        .find_map(|separator| title.rsplit_once(*separator))
        .map(|(_, location)| location.trim())?;

    if location.is_empty() {
        None
    } else {
        Some(location.to_string())
    }
}
