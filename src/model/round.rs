use std::fmt;

/// Kind of round a result page belongs to
///
/// The page only carries a free-text label; this enum recognizes the labels
/// the results software prints and keeps everything else as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundKind {
    FirstRound,
    SecondRound,
    HopeRound,
    QuarterFinal,
    SemiFinal,
    Final,
    Other,
}

impl RoundKind {
    /// Classifies a round label, falling back to `Other`
    pub fn from_label(label: &str) -> Self {
        Self::recognize(label).unwrap_or(Self::Other)
    }

    /// Classifies a round label, returning None for unknown labels
    ///
    /// Matching ignores case, spaces and punctuation, so `Semi Final`,
    /// `semi-final` and `SemiFinal` are the same round.
    pub fn recognize(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "1stround" | "firstround" | "round1" => Some(Self::FirstRound),
            "2ndround" | "secondround" | "round2" => Some(Self::SecondRound),
            "hoperound" | "redance" => Some(Self::HopeRound),
            "quarterfinal" => Some(Self::QuarterFinal),
            "semifinal" => Some(Self::SemiFinal),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FirstRound => "1st Round",
            Self::SecondRound => "2nd Round",
            Self::HopeRound => "Hope Round",
            Self::QuarterFinal => "Quarter Final",
            Self::SemiFinal => "Semi Final",
            Self::Final => "Final",
            Self::Other => "Other",
        };
        f.write_str(label)
    }
}
