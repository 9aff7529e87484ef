use crate::models::Priority;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

#[derive(Debug, PartialEq)]
pub struct ParsedTitle {
    pub title: String,
    pub priority: Option<Priority>,
}

/// Extract a `!low` / `!med` / `!high` quick-add token from the title
/// field. The first valid token wins; all tokens are stripped from the
/// returned title and runs of whitespace are collapsed.
pub fn parse_title_input(input: &str) -> ParsedTitle {
    let priority_re = Regex::new(r"!(low|med|medium|high)\b\s*").unwrap();

    let mut priority = None;

    // Priority
    for caps in priority_re.captures_iter(input) {
        if let Some(priority_match) = caps.get(1) {
            if priority.is_none() {
                priority = match priority_match.as_str() {
                    "low" => Some(Priority::Low),
                    "med" | "medium" => Some(Priority::Medium),
                    "high" => Some(Priority::High),
                    _ => None,
                };
            }
        }
    }

    let title = priority_re.replace_all(input, "").to_string();

    let title = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&title, " ")
        .trim()
        .to_string();

    ParsedTitle { title, priority }
}

/// Strict "HH:MM" parse for the due-time field. Blank input is a valid
/// "no time" answer; anything else must be a real wall-clock time.
pub fn parse_due_time(input: &str) -> Result<Option<NaiveTime>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let time_re = Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap();
    let caps = time_re
        .captures(input)
        .ok_or_else(|| format!("expected HH:MM, got '{}'", input))?;

    let hours: u32 = caps[1].parse().map_err(|_| "bad hours".to_string())?;
    let minutes: u32 = caps[2].parse().map_err(|_| "bad minutes".to_string())?;

    NaiveTime::from_hms_opt(hours, minutes, 0)
        .map(Some)
        .ok_or_else(|| format!("'{}' is not a valid time of day", input))
}

/// "YYYY-MM-DD" parse for the due-date field; blank means no due date.
pub fn parse_due_date(input: &str) -> Result<Option<NaiveDate>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("expected YYYY-MM-DD, got '{}'", input))
}
