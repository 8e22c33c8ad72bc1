//! Data model for extracted competition results
//!
//! # Components
//!
//! - `CompetitionRecord`: one round's metadata, judge panel and couples, as written to JSON
//! - `RoundKind`: recognized round labels (Final, Semi Final, ...)
//! - `Filter` / `YearRange`: predicates a record must satisfy to be kept

mod filter;
mod record;
mod round;

// Re-export main types
pub use filter::{default_aliases, Filter, YearRange};
pub use record::{
    year_of_date, CategoryCode, CategoryScore, CompetitionInfo, CompetitionRecord, Couple, Heat,
    Judge,
};
pub use round::RoundKind;
