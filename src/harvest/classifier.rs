//! Round classifier
//!
//! Decides whether a parsed record passes the run's filter. All set predicates
//! must match; unset predicates match anything.

use crate::model::{CompetitionRecord, Filter, RoundKind};

/// Returns true if the record passes every predicate of the filter
pub fn accept(record: &CompetitionRecord, filter: &Filter) -> bool {
    let info = &record.competition_info;

    let dance_ok = filter
        .dance
        .as_deref()
        .map_or(true, |term| matches_term(filter, term, &info.dance));

    let class_ok = filter
        .class_name
        .as_deref()
        .map_or(true, |term| matches_term(filter, term, &info.class_name));

    let round_ok = filter
        .round
        .as_deref()
        .map_or(true, |term| matches_round(term, &info.round));

    let year_ok = record
        .year()
        .map_or(false, |year| filter.years.contains(year));

    dance_ok && class_ok && round_ok && year_ok
}

/// Case-insensitive substring match, or an alias expansion that matches
fn matches_term(filter: &Filter, term: &str, field: &str) -> bool {
    let field = field.to_lowercase();
    if field.contains(&term.trim().to_lowercase()) {
        return true;
    }

    filter.expansions(term).map_or(false, |expansions| {
        expansions
            .iter()
            .any(|expansion| field.contains(&expansion.to_lowercase()))
    })
}

/// Known round names compare by kind, so `Final` does not match `Semi Final`.
/// A label with a qualifier (`Final - Slow`, `Final Acrobatics`) is judged by
/// the round name it starts with. Everything else is a case-insensitive
/// substring match.
fn matches_round(term: &str, round: &str) -> bool {
    match (RoundKind::recognize(term), leading_round_kind(round)) {
        (Some(kind), Some(label_kind)) => label_kind == kind,
        _ => round.to_lowercase().contains(&term.trim().to_lowercase()),
    }
}

/// Kind of the longest run of leading words that is a known round name
fn leading_round_kind(label: &str) -> Option<RoundKind> {
    let words: Vec<&str> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    (1..=words.len())
        .rev()
        .find_map(|len| RoundKind::recognize(&words[..len].join(" ")))
}
