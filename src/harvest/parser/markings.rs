use crate::harvest::parser::competitors::is_start_number;
use crate::harvest::parser::{direct_cells, flat_text, text_lines};
use crate::model::{CategoryCode, CategoryScore, Couple, Heat};
use scraper::ElementRef;
use std::collections::BTreeMap;

/// Rows with fewer cells are headers, separators or footers
const MIN_ROW_CELLS: usize = 7;

/// Standard rows carry an observer column only when all eleven columns are present
const STANDARD_FULL_ROW: usize = 11;

/// Parses a category cell: the first line is the aggregated score, the second
/// line the `|`-separated judge scores
///
/// Scores are kept verbatim, decimal commas included. A blank cell yields an
/// empty aggregated score and no judge scores.
pub fn parse_score_cell(cell: ElementRef<'_>, category: CategoryCode) -> CategoryScore {
    let lines = text_lines(cell);

    let aggregated = lines.first().cloned().unwrap_or_default();
    let judge_scores = lines
        .get(1)
        .map(|scores| {
            scores
                .split('|')
                .map(str::trim)
                .filter(|score| !score.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    CategoryScore {
        name: category.long_name().to_string(),
        aggregated,
        judge_scores,
    }
}

/// Reads the five category cells starting at `first`
///
/// Cells at or beyond `end` belong to the trailing columns and are never read
/// as scores, so a category missing from the row is omitted.
fn read_categories(
    cells: &[ElementRef<'_>],
    first: usize,
    end: usize,
) -> BTreeMap<CategoryCode, CategoryScore> {
    CategoryCode::ALL
        .iter()
        .enumerate()
        .filter_map(|(offset, code)| {
            let index = first + offset;
            (index < end).then(|| (*code, parse_score_cell(cells[index], *code)))
        })
        .collect()
}

fn text_at(cells: &[ElementRef<'_>], index: usize) -> String {
    cells.get(index).map(|cell| flat_text(*cell)).unwrap_or_default()
}

/// Extracts the couples of a standard table
///
/// Columns: Stn, Position, Teor, BBW, BBM, LF, DF, MI, Obs, Sum, Total.
pub fn extract_standard(rows: &[ElementRef<'_>]) -> Vec<Couple> {
    let mut couples = Vec::new();

    for row in rows {
        let cells = direct_cells(*row);
        if cells.len() < MIN_ROW_CELLS {
            continue;
        }

        let start_number = text_at(&cells, 0);
        if !is_start_number(&start_number) {
            continue;
        }

        let sum_index = cells.len() - 2;
        let observer = if cells.len() >= STANDARD_FULL_ROW {
            text_at(&cells, 8)
        } else {
            String::new()
        };

        couples.push(Couple {
            start_number,
            position: text_at(&cells, 1),
            teor: text_at(&cells, 2),
            competitor_names: String::new(),
            categories: read_categories(&cells, 3, sum_index),
            sum: text_at(&cells, sum_index),
            total: text_at(&cells, cells.len() - 1),
            observer,
        });
    }

    couples
}

/// Values a slow row shares with the fast row below it
#[derive(Debug, Clone)]
struct SharedCells {
    start_number: String,
    position: String,
    teor: String,
    total: String,
}

/// Extracts the slow and fast couples of a slow/fast table
///
/// A slow row holds Stn, Position, Teor, Type, BBW..MI, Obs, Sum, Total where
/// Stn, Position, Teor and Total span two rows. The fast row below it only holds
/// Type, BBW..MI, Obs, Sum.
pub fn extract_slow_fast(rows: &[ElementRef<'_>]) -> (Vec<Couple>, Vec<Couple>) {
    let mut slow = Vec::new();
    let mut fast = Vec::new();
    let mut shared: Option<SharedCells> = None;

    for row in rows {
        let cells = direct_cells(*row);
        if cells.len() < MIN_ROW_CELLS {
            continue;
        }

        let texts: Vec<String> = cells.iter().map(|cell| flat_text(*cell)).collect();
        let type_index = texts
            .iter()
            .position(|text| text == Heat::Slow.row_label() || text == Heat::Fast.row_label());

        match type_index {
            Some(index) if texts[index] == Heat::Slow.row_label() => {
                shared = shared_cells(&cells);
                let Some(shared) = &shared else {
                    continue;
                };

                let sum_index = cells.len() - 2;
                let observer_index = index + 1 + CategoryCode::ALL.len();
                slow.push(Couple {
                    start_number: shared.start_number.clone(),
                    position: shared.position.clone(),
                    teor: shared.teor.clone(),
                    competitor_names: String::new(),
                    categories: read_categories(&cells, index + 1, sum_index),
                    sum: texts[sum_index].clone(),
                    total: shared.total.clone(),
                    observer: if observer_index < sum_index {
                        texts[observer_index].clone()
                    } else {
                        String::new()
                    },
                });
            }
            Some(0) => {
                let Some(shared) = shared.take() else {
                    continue;
                };

                let sum_index = cells.len() - 1;
                let observer_index = 1 + CategoryCode::ALL.len();
                fast.push(Couple {
                    start_number: shared.start_number,
                    position: shared.position,
                    teor: shared.teor,
                    competitor_names: String::new(),
                    categories: read_categories(&cells, 1, sum_index),
                    sum: texts[sum_index].clone(),
                    total: shared.total,
                    observer: if observer_index < sum_index {
                        texts[observer_index].clone()
                    } else {
                        String::new()
                    },
                });
            }
            _ => {}
        }
    }

    (slow, fast)
}

/// Reads the `rowspan="2"` cells of a slow row
fn shared_cells(cells: &[ElementRef<'_>]) -> Option<SharedCells> {
    let spanning: Vec<String> = cells
        .iter()
        .filter(|cell| cell.value().attr("rowspan").map(str::trim) == Some("2"))
        .map(|cell| flat_text(*cell))
        .collect();

    if spanning.len() < 3 || !is_start_number(&spanning[0]) {
        return None;
    }

    Some(SharedCells {
        start_number: spanning[0].clone(),
        position: spanning[1].clone(),
        teor: spanning[2].clone(),
        total: if spanning.len() >= 4 {
            spanning[spanning.len() - 1].clone()
        } else {
            String::new()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::parser::select_all;
    use scraper::Html;

    fn rows_of(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_parse_score_cell() {
        let document = rows_of("<table><tr><td>3,75<br>3,75|5,25 | 5,25</td></tr></table>");
        let cell = select_all(document.root_element(), "td")[0];
        let score = parse_score_cell(cell, CategoryCode::Bbw);

        assert_eq!(score.name, "Boogie Woogie Basics - Woman");
        assert_eq!(score.aggregated, "3,75");
        assert_eq!(score.judge_scores, vec!["3,75", "5,25", "5,25"]);
    }

    #[test]
    fn test_blank_score_cell() {
        let document = rows_of("<table><tr><td>&nbsp;</td></tr></table>");
        let cell = select_all(document.root_element(), "td")[0];
        let score = parse_score_cell(cell, CategoryCode::Mi);

        assert_eq!(score.aggregated, "");
        assert!(score.judge_scores.is_empty());
    }

    #[test]
    fn test_extract_standard_fixture() {
        let document = rows_of(include_str!("../../../tests/fixtures/ocj_2010.htm"));
        let rows = select_all(document.root_element(), "tr");
        let couples = extract_standard(&rows);

        assert_eq!(couples.len(), 3);
        let first = &couples[0];
        assert_eq!(first.start_number, "112");
        assert_eq!(first.position, "1");
        assert_eq!(first.teor, "60,00");
        assert_eq!(first.categories.len(), 5);
        assert_eq!(first.categories[&CategoryCode::Bbw].aggregated, "3,75");
        assert_eq!(
            first.categories[&CategoryCode::Bbw].judge_scores,
            vec!["3,75", "5,25", "2,25"]
        );
        assert_eq!(first.observer, "");
        assert_eq!(first.sum, "65,00");
        assert_eq!(first.total, "65,00");

        assert_eq!(couples[2].observer, "-2");
    }

    #[test]
    fn test_standard_row_without_observer_column() {
        let document = rows_of(
            "<table><tr><td>7</td><td>1</td><td>10</td><td>1<br>1|1</td><td>2<br>2|2</td>\
             <td>3<br>3|3</td><td>4<br>4|4</td><td>5<br>5|5</td><td>15</td><td>25</td></tr></table>",
        );
        let rows = select_all(document.root_element(), "tr");
        let couples = extract_standard(&rows);

        assert_eq!(couples.len(), 1);
        assert_eq!(couples[0].categories.len(), 5);
        assert_eq!(couples[0].observer, "");
        assert_eq!(couples[0].sum, "15");
        assert_eq!(couples[0].total, "25");
    }

    #[test]
    fn test_extract_slow_fast_fixture() {
        let document = rows_of(include_str!("../../../tests/fixtures/ocj_slow_fast.htm"));
        let rows = select_all(document.root_element(), "tr");
        let (slow, fast) = extract_slow_fast(&rows);

        assert_eq!(slow.len(), 2);
        assert_eq!(fast.len(), 2);

        assert_eq!(slow[0].start_number, "201");
        assert_eq!(slow[0].sum, "30,50");
        assert_eq!(slow[0].total, "62,00");
        assert_eq!(slow[0].categories[&CategoryCode::Lf].aggregated, "6,25");

        assert_eq!(fast[0].start_number, "201");
        assert_eq!(fast[0].position, "1");
        assert_eq!(fast[0].teor, "55,00");
        assert_eq!(fast[0].sum, "31,50");
        assert_eq!(fast[0].total, "62,00");
        assert_eq!(fast[0].categories[&CategoryCode::Mi].judge_scores.len(), 3);

        assert_eq!(fast[1].start_number, "205");
        assert_eq!(fast[1].observer, "-1");
    }
}
