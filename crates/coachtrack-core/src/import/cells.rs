//! Parsers for individual cells of the tracking export.
//!
//! None of these fail: a cell that cannot be read yields `None`.

use super::ImportPeriod;

/// Month names recognised in the diet-end column, in match order.
const MONTH_NAMES: [(&str, u32); 2] = [("July", 7), ("June", 6)];

const PLACEHOLDERS: [&str; 2] = ["-", "--"];

/// Start weight and start date read from the combined start cell.
#[derive(Debug, Clone, PartialEq)]
pub enum StartCell {
    /// `"82.8(27-05)"`: weight with a day-month tag
    Tagged { weight: f64, date: String },
    /// An ISO date; the weight lives in the first daily column
    Dated { date: String },
    /// Empty or unrecognised
    Missing,
}

/// Leading decimal number of a cell (`"72.5kg"` → 72.5).
///
/// Accepts an optional sign, digits with at most one decimal point, and an
/// optional exponent. Leading whitespace is skipped.
pub fn leading_number(cell: &str) -> Option<f64> {
    let s = cell.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    // Exponent only counts when digits follow it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A daily weight reading: positive and finite, placeholders and blanks
/// are absent.
pub fn weight_reading(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || PLACEHOLDERS.contains(&cell) {
        return None;
    }
    leading_number(cell).filter(|w| *w > 0.0)
}

/// Parse the combined start cell.
///
/// In the tagged form the tag's second pair is written as the month and the
/// first as the day: `"82.8(27-05)"` becomes `<year>-05-27`.
pub fn parse_start_cell(cell: &str, period: &ImportPeriod) -> StartCell {
    let cell = cell.trim();

    if cell.contains('(') {
        return parse_tagged_start(cell, period.year).unwrap_or(StartCell::Missing);
    }

    if cell.contains(&format!("{}-", period.year)) {
        return StartCell::Dated {
            date: cell.to_string(),
        };
    }

    StartCell::Missing
}

fn parse_tagged_start(cell: &str, year: i32) -> Option<StartCell> {
    let (weight_part, rest) = cell.split_once('(')?;
    let tag = rest.strip_suffix(')')?;

    if weight_part.is_empty() || !weight_part.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let tag_bytes = tag.as_bytes();
    let well_formed = tag_bytes.len() == 5
        && tag_bytes[2] == b'-'
        && tag_bytes[..2].iter().all(u8::is_ascii_digit)
        && tag_bytes[3..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return None;
    }

    let weight = leading_number(weight_part)?;
    let (first, second) = tag.split_once('-')?;
    Some(StartCell::Tagged {
        weight,
        date: format!("{}-{}-{}", year, second, first),
    })
}

/// Diet end date from the diet-end cell, as `YYYY-MM-DD`.
///
/// Only `July` and `June` are recognised, by substring; the first run of
/// digits is the day. A bare integer is a day of the period month. Anything
/// else, including impossible dates, yields `None`.
pub fn diet_end_date(cell: &str, period: &ImportPeriod) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    if let Some((_, month)) = MONTH_NAMES.iter().find(|(name, _)| cell.contains(name)) {
        let day = first_digit_run(cell)?;
        return period.date_in_month(*month, day);
    }

    let day = cell.parse::<u32>().ok()?;
    period.date_in_month(period.month, day)
}

fn first_digit_run(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let run: String = s[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    run.parse().ok()
}

/// Synthesized email: lowercase name, whitespace runs become dots.
pub fn imported_email(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{}@imported.com", slug)
}

/// Placeholder goal weight for imported clients, corrected by the coach later.
pub fn estimated_goal_weight(start_weight: f64) -> f64 {
    if start_weight > 0.0 {
        (start_weight - 10.0).max(start_weight * 0.9)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june() -> ImportPeriod {
        ImportPeriod::default()
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("82.8"), Some(82.8));
        assert_eq!(leading_number(" 72.5kg"), Some(72.5));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("-3"), Some(-3.0));
        assert_eq!(leading_number("1e2x"), Some(100.0));
        assert_eq!(leading_number("7e"), Some(7.0));
        assert_eq!(leading_number("--"), None);
        assert_eq!(leading_number("abc"), None);
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_weight_reading() {
        assert_eq!(weight_reading("71.4"), Some(71.4));
        assert_eq!(weight_reading(" 70 "), Some(70.0));
        assert_eq!(weight_reading("-"), None);
        assert_eq!(weight_reading("--"), None);
        assert_eq!(weight_reading(""), None);
        assert_eq!(weight_reading("absent"), None);
        assert_eq!(weight_reading("0"), None);
    }

    #[test]
    fn test_tagged_start_cell_swaps_into_month_day() {
        assert_eq!(
            parse_start_cell("82.8(27-05)", &june()),
            StartCell::Tagged {
                weight: 82.8,
                date: "2025-05-27".into()
            }
        );
    }

    #[test]
    fn test_malformed_tagged_start_cell() {
        assert_eq!(parse_start_cell("82.8(27-5)", &june()), StartCell::Missing);
        assert_eq!(parse_start_cell("82.8 (27-05)", &june()), StartCell::Missing);
        assert_eq!(parse_start_cell("(27-05)", &june()), StartCell::Missing);
        assert_eq!(parse_start_cell("82.8(27-05", &june()), StartCell::Missing);
    }

    #[test]
    fn test_dated_start_cell() {
        assert_eq!(
            parse_start_cell("2025-06-18", &june()),
            StartCell::Dated {
                date: "2025-06-18".into()
            }
        );
        assert_eq!(parse_start_cell("2024-06-18", &june()), StartCell::Missing);
        assert_eq!(parse_start_cell("", &june()), StartCell::Missing);
    }

    #[test]
    fn test_diet_end_date() {
        assert_eq!(diet_end_date("15 July", &june()), Some("2025-07-15".into()));
        assert_eq!(diet_end_date("June 3", &june()), Some("2025-06-03".into()));
        assert_eq!(diet_end_date("20", &june()), Some("2025-06-20".into()));
        assert_eq!(diet_end_date(" 7 ", &june()), Some("2025-06-07".into()));
        assert_eq!(diet_end_date("", &june()), None);
        assert_eq!(diet_end_date("soon", &june()), None);
        assert_eq!(diet_end_date("July", &june()), None);
        assert_eq!(diet_end_date("31", &june()), None);
        assert_eq!(diet_end_date("15 july", &june()), None);
        assert_eq!(diet_end_date("Maybe 20", &june()), None);
        assert_eq!(diet_end_date("5 August", &june()), None);
        assert_eq!(diet_end_date("February 3", &june()), None);
    }

    #[test]
    fn test_imported_email() {
        assert_eq!(imported_email("Priya  Sharma"), "priya.sharma@imported.com");
        assert_eq!(imported_email("Bob"), "bob@imported.com");
    }

    #[test]
    fn test_estimated_goal_weight() {
        // 10% of start outweighs the flat 10 kg below 100 kg
        assert!((estimated_goal_weight(82.8) - 74.52).abs() < 1e-9);
        assert_eq!(estimated_goal_weight(120.0), 110.0);
        assert_eq!(estimated_goal_weight(0.0), 0.0);
    }
}
