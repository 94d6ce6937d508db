use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::path::Path;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

/// First of the accepted layouts that parses: ISO, US slash, day-first dash.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Spreadsheet serial day number (1900 date system).
pub fn excel_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    (date - epoch).num_days() as f64
}

/// Keeps digits, `.` and `-`, then parses. `"1,250.5 kg"` reads as 1250.5.
pub fn sanitize_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn validate_extension(path: &Path, allowed: &[String]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        bail!(
            "unsupported file type '{}' for {}; allowed: {}",
            ext,
            path.display(),
            allowed.join(", ")
        );
    }
    Ok(())
}
