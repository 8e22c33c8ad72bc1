use crate::harvest::parser::{direct_cells, flat_text, given_name_first, select_all};
use scraper::Html;
use std::collections::HashMap;

/// Maps start numbers to competitor names from a result list (`rez_{round}.htm`)
///
/// Names are printed as `"LAST First - LAST First"` and returned as
/// `"First LAST & First LAST"`.
pub fn parse_competitor_names(html: &str) -> HashMap<String, String> {
    let document = Html::parse_document(html);
    let Some(table) = select_all(document.root_element(), "table.entrylist_table")
        .into_iter()
        .next()
    else {
        return HashMap::new();
    };

    let mut names = HashMap::new();
    for row in select_all(table, "tr").into_iter().skip(1) {
        let cells = direct_cells(row);
        if cells.len() < 3 {
            continue;
        }

        let start_number = flat_text(cells[1]);
        if !is_start_number(&start_number) {
            continue;
        }

        let competitor = cells.iter().find(|cell| {
            cell.value()
                .classes()
                .any(|class| class.contains("competitor"))
        });

        if let Some(cell) = competitor {
            let name = format_couple_name(&flat_text(*cell));
            if !name.is_empty() {
                names.insert(start_number, name);
            }
        }
    }

    names
}

/// Start numbers are plain digit strings
pub(crate) fn is_start_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn format_couple_name(raw: &str) -> String {
    if !raw.contains(" - ") {
        return raw.trim().to_string();
    }

    raw.split(" - ")
        .map(given_name_first)
        .collect::<Vec<_>>()
        .join(" & ")
}
