use crate::model::CompetitionRecord;
use crate::output::OutputError;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest sanitized file name component
const MAX_COMPONENT_LEN: usize = 100;

/// Writes records as pretty-printed JSON files into one directory
///
/// File names are derived from the record alone, so writing the same record
/// again overwrites the earlier file.
#[derive(Debug, Clone)]
pub struct JsonWriter {
    dir: PathBuf,
}

impl JsonWriter {
    /// Creates the writer, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, OutputError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| OutputError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one record and returns its path
    pub fn write(&self, record: &CompetitionRecord) -> Result<PathBuf, OutputError> {
        let path = self.dir.join(file_name(record));
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// `results_{location}_{date}_{dance}_{class}_{round}[_{heat}].json`
pub fn file_name(record: &CompetitionRecord) -> String {
    let info = &record.competition_info;
    let mut parts = vec![
        "results".to_string(),
        sanitize_component(&info.location),
        format_date_for_filename(&info.date),
        sanitize_component(&info.dance),
        sanitize_component(&info.class_name),
        sanitize_component(&info.round),
    ];
    if let Some(heat) = info.heat {
        parts.push(heat.to_string());
    }
    format!("{}.json", parts.join("_"))
}

/// Makes a text safe for one file name component
///
/// Spaces and path separators become dashes, anything other than letters,
/// digits, `_` and `-` is dropped, runs of dashes collapse.
pub fn sanitize_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = match c {
            ' ' | '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '_' || c == '-' => c,
            _ => continue,
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed: String = out
        .trim_matches(|c| c == '-' || c == '_')
        .chars()
        .take(MAX_COMPONENT_LEN)
        .collect();

    if trimmed.is_empty() {
        "Unknown".to_string()
    } else {
        trimmed
    }
}

/// `DD.MM.YYYY` becomes `DD-MM-YY`; other dates are sanitized as text
pub fn format_date_for_filename(date: &str) -> String {
    let parts: Vec<&str> = date
        .trim()
        .split(|c| c == '.' || c == '-' || c == '/')
        .collect();

    let numeric = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());

    match parts.as_slice() {
        [day, month, year]
            if numeric(day)
                && numeric(month)
                && numeric(year)
                && day.len() <= 2
                && month.len() <= 2
                && (year.len() == 4 || year.len() == 2) =>
        {
            format!(
                "{:0>2}-{:0>2}-{}",
                day,
                month,
                &year[year.len() - 2..]
            )
        }
        _ => sanitize_component(date),
    }
}
