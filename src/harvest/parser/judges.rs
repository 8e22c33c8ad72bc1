use crate::harvest::parser::{direct_cells, flat_text, given_name_first, has_class, select_all};
use crate::model::Judge;
use scraper::{ElementRef, Html};

/// One judge of the panel together with the categories they judge
#[derive(Debug, Clone, PartialEq, Eq)]
struct PanelEntry {
    judge: Judge,
    categories: Vec<String>,
}

/// Judge panel of a competition (`turnir_naslov.htm`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgePanel {
    entries: Vec<PanelEntry>,
}

impl JudgePanel {
    /// Parses the panel table
    ///
    /// A judge's row carries the letter (`td.tur_slovo`) and
    /// `"Lastname Firstname / Country"` (`td.tur_polje`); the `"Dance-Class"`
    /// categories they judge (`td.tur_kategorija`) follow on the same and the
    /// next rows.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let Some(table) = find_panel_table(&document) else {
            return Self::default();
        };

        let mut entries: Vec<PanelEntry> = Vec::new();
        for row in select_all(table, "tr") {
            let cells = direct_cells(row);
            if cells.len() < 2 {
                continue;
            }

            if let Some(letter_cell) = cells.iter().find(|cell| has_class(cell, "tur_slovo")) {
                if let Some(letter) = flat_text(*letter_cell).chars().next() {
                    let (name, country) = cells
                        .iter()
                        .find(|cell| has_class(cell, "tur_polje"))
                        .map(|cell| split_name_country(&flat_text(*cell)))
                        .unwrap_or_default();

                    entries.push(PanelEntry {
                        judge: Judge {
                            letter,
                            name,
                            country,
                        },
                        categories: Vec::new(),
                    });
                }
            }

            if let Some(entry) = entries.last_mut() {
                entry.categories.extend(
                    cells
                        .iter()
                        .filter(|cell| has_class(cell, "tur_kategorija"))
                        .map(|cell| flat_text(*cell))
                        .filter(|category| !category.is_empty()),
                );
            }
        }

        Self { entries }
    }

    /// Number of judges on the whole panel
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Judges of one dance and class, ordered and unique by letter
    pub fn for_category(&self, dance: &str, class_name: &str) -> Vec<Judge> {
        let key = format!("{}-{}", dance, class_name);

        let mut judges: Vec<Judge> = self
            .entries
            .iter()
            .filter(|entry| entry.categories.iter().any(|c| c.contains(&key)))
            .map(|entry| entry.judge.clone())
            .collect();

        judges.sort_by_key(|judge| judge.letter);
        judges.dedup_by_key(|judge| judge.letter);
        judges
    }
}

/// The `table.tur_main` that has a "Judges" label cell
fn find_panel_table(document: &Html) -> Option<ElementRef<'_>> {
    select_all(document.root_element(), "table.tur_main")
        .into_iter()
        .find(|table| {
            select_all(*table, "td.tur_labela")
                .into_iter()
                .any(|label| flat_text(label).contains("Judges"))
        })
}

/// `"Muller Hans / Germany"` becomes `("Hans Muller", "Germany")`
fn split_name_country(raw: &str) -> (String, String) {
    match raw.split_once('/') {
        Some((name, country)) => (given_name_first(name), country.trim().to_string()),
        None => (given_name_first(raw), String::new()),
    }
}
