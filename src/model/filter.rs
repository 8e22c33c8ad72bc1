use crate::config::FilterConfig;
use crate::ConfigError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Inclusive range of competition years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Creates a range, rejecting reversed bounds
    pub fn new(start: i32, end: i32) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::InvalidYears(format!(
                "start year {} is after end year {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering one year
    pub fn single(year: i32) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    /// Returns true if the year lies within the range
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Iterates the years of the range in ascending order
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Number of years covered
    pub fn year_count(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

impl FromStr for YearRange {
    type Err = ConfigError;

    /// Parses `2025` or `2022-2025`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_year = |text: &str| {
            text.trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidYears(format!("'{}' is not a year", s.trim())))
        };

        match s.split_once('-') {
            Some((start, end)) => Self::new(parse_year(start)?, parse_year(end)?),
            None => Ok(Self::single(parse_year(s)?)),
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Abbreviations understood by the dance and class filters out of the box
pub fn default_aliases() -> BTreeMap<String, Vec<String>> {
    let mut aliases = BTreeMap::new();
    aliases.insert("bw".to_string(), vec!["boogie woogie".to_string()]);
    aliases.insert(
        "rr".to_string(),
        vec![
            "rock'n'roll".to_string(),
            "rock 'n' roll".to_string(),
            "rock and roll".to_string(),
        ],
    );
    aliases
}

/// Record filter applied before a round is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub dance: Option<String>,
    pub class_name: Option<String>,
    pub round: Option<String>,
    pub years: YearRange,
    aliases: BTreeMap<String, Vec<String>>,
}

impl Filter {
    /// Creates a filter that only restricts the year
    pub fn new(years: YearRange) -> Self {
        Self {
            dance: None,
            class_name: None,
            round: None,
            years,
            aliases: default_aliases(),
        }
    }

    pub fn with_dance(mut self, dance: impl Into<String>) -> Self {
        self.dance = non_empty(dance.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = non_empty(class_name.into());
        self
    }

    pub fn with_round(mut self, round: impl Into<String>) -> Self {
        self.round = non_empty(round.into());
        self
    }

    /// Adds or replaces an abbreviation
    pub fn with_alias(mut self, abbreviation: &str, expansions: &[&str]) -> Self {
        self.aliases.insert(
            abbreviation.trim().to_lowercase(),
            expansions.iter().map(|e| e.trim().to_lowercase()).collect(),
        );
        self
    }

    /// Builds the filter from the `[filter]` configuration section
    ///
    /// Configured aliases extend the defaults and replace entries with the same key.
    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let years = config
            .years
            .as_deref()
            .ok_or_else(|| {
                ConfigError::InvalidYears("a year or year range is required".to_string())
            })?
            .parse::<YearRange>()?;

        let mut filter = Self::new(years);
        if let Some(dance) = &config.dance {
            filter = filter.with_dance(dance.as_str());
        }
        if let Some(class_name) = &config.class_name {
            filter = filter.with_class(class_name.as_str());
        }
        if let Some(round) = &config.round {
            filter = filter.with_round(round.as_str());
        }
        for (abbreviation, expansions) in &config.aliases {
            let expansions: Vec<&str> = expansions.iter().map(String::as_str).collect();
            filter = filter.with_alias(abbreviation, &expansions);
        }

        Ok(filter)
    }

    /// Expansions registered for an abbreviation (case-insensitive lookup)
    pub fn expansions(&self, term: &str) -> Option<&[String]> {
        self.aliases
            .get(&term.trim().to_lowercase())
            .map(Vec::as_slice)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(any)".to_string());
        write!(
            f,
            "years {}, dance {}, class {}, round {}",
            self.years,
            show(&self.dance),
            show(&self.class_name),
            show(&self.round)
        )
    }
}
