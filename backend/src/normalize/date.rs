//! Date and time normalization.
//!
//! Every transform describes its date handling as a [`DateRecipe`]: an
//! ordered list of [`DateStrategy`]s tried until one succeeds, plus the
//! two-digit-year rule the transform uses. Successful results are always
//! `YYYY-MM-DD`. Month names are resolved with a fixed Spanish table, never
//! through the process locale.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Spanish month names and abbreviations.
pub const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("ene", "01"),
    ("enero", "01"),
    ("feb", "02"),
    ("febrero", "02"),
    ("mar", "03"),
    ("marzo", "03"),
    ("abr", "04"),
    ("abril", "04"),
    ("may", "05"),
    ("mayo", "05"),
    ("jun", "06"),
    ("junio", "06"),
    ("jul", "07"),
    ("julio", "07"),
    ("ago", "08"),
    ("agosto", "08"),
    ("sep", "09"),
    ("septiembre", "09"),
    ("oct", "10"),
    ("octubre", "10"),
    ("nov", "11"),
    ("noviembre", "11"),
    ("dic", "12"),
    ("diciembre", "12"),
];

/// `"01 abr 2025"`, `"1-abril-25"`, `"01/abr/2025"`, anywhere in the text.
static LOOSE_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[\s\-/]?([a-z]+)[\s\-/]?(\d{2,4})").expect("valid month-name pattern")
});

/// `"01 abril 2025"` at the start of the text, whitespace separated.
static SPACED_MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})\s+([a-z]{3,9})\s+(\d{4})").expect("valid month-name pattern")
});

static PART_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-/\s]").expect("valid separator pattern"));

/// Layouts tried by the flexible parser before numeric splitting.
const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%b %d %Y",
    "%B %d, %Y", "%b %d, %Y",
];

/// Resolve a Spanish month token (exact, lowercase) to its two-digit number.
pub fn month_number(token: &str) -> Option<&'static str> {
    let lower = token.to_lowercase();
    SPANISH_MONTHS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, number)| *number)
}

/// Expansion rule for two-digit years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CenturyPolicy {
    /// `25` → `2025`, `87` → `2087`.
    AlwaysTwentyFirst,
    /// `25` → `2025`, `87` → `1987` (pivot at 50).
    Pivot50,
}

impl CenturyPolicy {
    /// Expand a year token. Tokens that are not two digits are returned as-is.
    pub fn expand(&self, year: &str) -> String {
        if year.len() != 2 {
            return year.to_string();
        }
        match self {
            CenturyPolicy::AlwaysTwentyFirst => format!("20{}", year),
            CenturyPolicy::Pivot50 => match year.parse::<u32>() {
                Ok(yy) if yy < 50 => format!("20{}", year),
                Ok(_) => format!("19{}", year),
                Err(_) => year.to_string(),
            },
        }
    }
}

/// How the month-name extraction matches its month token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonthPattern {
    /// Search anywhere, exact table lookup, unknown months do not match.
    Loose,
    /// Anchored, whitespace separated, four-digit year, lookup on the first
    /// three letters with a fallback month for unknown names.
    Spaced { fallback_month: &'static str },
}

/// One way of recognizing a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateStrategy {
    /// General parse of ISO and numeric `d/m/y` style dates.
    Flexible { dayfirst: bool },
    /// Day, Spanish month name, year.
    MonthName { pattern: MonthPattern },
    /// Exactly three `[-/\s]`-separated parts read as day, month, year
    /// (month may be a name), validated strictly.
    DayMonthYear,
    /// Explicit chrono layouts, in order.
    Formats { formats: &'static [&'static str] },
}

/// Pre-processing and strategies of one transform's date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRecipe {
    pub strategies: &'static [DateStrategy],
    pub century: CenturyPolicy,
    /// Strip surrounding single quotes before parsing.
    pub strip_quotes: bool,
    /// Lowercase before parsing.
    pub lowercase: bool,
}

impl DateRecipe {
    /// Try every strategy in order; `None` when all fail.
    pub fn parse(&self, raw: &str) -> Option<String> {
        let mut text = raw.trim().to_string();
        if self.strip_quotes {
            text = text.trim_matches('\'').trim().to_string();
        }
        if self.lowercase {
            text = text.to_lowercase();
        }
        if text.is_empty() {
            return None;
        }

        self.strategies.iter().find_map(|strategy| match strategy {
            DateStrategy::Flexible { dayfirst } => parse_flexible(&text, *dayfirst, self.century),
            DateStrategy::MonthName { pattern } => parse_month_name(&text, *pattern, self.century),
            DateStrategy::DayMonthYear => parse_day_month_year(&text, self.century),
            DateStrategy::Formats { formats } => parse_with_formats(&text, formats),
        })
    }

    /// Normalize to `YYYY-MM-DD`, returning the input unchanged on failure.
    pub fn normalize(&self, raw: &str) -> String {
        self.parse(raw).unwrap_or_else(|| raw.to_string())
    }
}

/// Generic day-first normalizer: flexible parse, then Spanish month names,
/// then a list of explicit layouts; the original string on failure.
pub fn normalize_date(raw: &str, dayfirst: bool) -> String {
    const STRATEGIES_DAYFIRST: &[DateStrategy] = &[
        DateStrategy::Flexible { dayfirst: true },
        DateStrategy::MonthName { pattern: MonthPattern::Loose },
        DateStrategy::Formats { formats: &["%d %b %Y", "%d/%m/%Y", "%Y-%m-%d"] },
    ];
    const STRATEGIES_MONTHFIRST: &[DateStrategy] = &[
        DateStrategy::Flexible { dayfirst: false },
        DateStrategy::MonthName { pattern: MonthPattern::Loose },
        DateStrategy::Formats { formats: &["%d %b %Y", "%m/%d/%Y", "%Y-%m-%d"] },
    ];

    let recipe = DateRecipe {
        strategies: if dayfirst { STRATEGIES_DAYFIRST } else { STRATEGIES_MONTHFIRST },
        century: CenturyPolicy::AlwaysTwentyFirst,
        strip_quotes: false,
        lowercase: true,
    };
    recipe.normalize(raw)
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse with a chrono layout, requiring `%Y` to have matched four digits.
pub fn parse_date_strict(text: &str, fmt: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, fmt).ok()?;
    if fmt.contains("%Y") && !(1000..=9999).contains(&date.year()) {
        return None;
    }
    Some(date)
}

fn parse_with_formats(text: &str, formats: &[&str]) -> Option<String> {
    formats
        .iter()
        .find_map(|fmt| parse_date_strict(text, fmt))
        .map(iso)
}

fn parse_flexible(text: &str, dayfirst: bool, century: CenturyPolicy) -> Option<String> {
    if let Some(dt) = FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .filter(|dt| (1000..=9999).contains(&dt.year()))
    {
        return Some(iso(dt.date()));
    }
    if let Some(date) = parse_with_formats(text, FLEXIBLE_DATE_FORMATS) {
        return Some(date);
    }

    // "01/04/2025 10:30" → date part only
    let mut tokens = text.split_whitespace();
    let date_part = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(date), None, None) => date,
        (Some(date), Some(time), None) if time.contains(':') => date,
        _ => return None,
    };

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }

    if parts[0].len() == 4 {
        return build_date(parts[0], parts[1], parts[2]);
    }
    if parts[2].len() != 4 && parts[2].len() != 2 {
        return None;
    }

    let year = century.expand(parts[2]);
    let (first, second) = if dayfirst { (parts[0], parts[1]) } else { (parts[1], parts[0]) };
    // first = day, second = month; swap when the preferred reading is impossible
    build_date(&year, second, first).or_else(|| build_date(&year, first, second))
}

fn build_date(year: &str, month: &str, day: &str) -> Option<String> {
    let y = year.parse::<i32>().ok()?;
    let m = month.parse::<u32>().ok()?;
    let d = day.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(y, m, d).map(iso)
}

fn parse_month_name(text: &str, pattern: MonthPattern, century: CenturyPolicy) -> Option<String> {
    match pattern {
        MonthPattern::Loose => {
            let caps = LOOSE_MONTH_NAME.captures(text)?;
            let month = month_number(&caps[2])?;
            let day = format!("{:0>2}", &caps[1]);
            let year = century.expand(&caps[3]);
            Some(format!("{}-{}-{}", year, month, day))
        }
        MonthPattern::Spaced { fallback_month } => {
            let caps = SPACED_MONTH_NAME.captures(text)?;
            let prefix: String = caps[2].to_lowercase().chars().take(3).collect();
            let month = month_number(&prefix).unwrap_or(fallback_month);
            let day = format!("{:0>2}", &caps[1]);
            Some(format!("{}-{}-{}", &caps[3], month, day))
        }
    }
}

fn parse_day_month_year(text: &str, century: CenturyPolicy) -> Option<String> {
    let parts: Vec<&str> = PART_SEPARATOR.split(text).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let month = month_number(month)
        .map(str::to_string)
        .unwrap_or_else(|| month.to_string());
    let day = format!("{:0>2}", day);
    let month = format!("{:0>2}", month);
    let year = century.expand(year);

    if year.len() != 4 {
        return None;
    }
    // strict validation of the assembled date
    NaiveDate::parse_from_str(&format!("{}-{}-{}", year, month, day), "%Y-%m-%d").ok()?;
    Some(format!("{}-{}-{}", year, month, day))
}

/// `HH:MM:SS` → `HH:MM`. `None` when the value is not a full clock time.
pub fn reformat_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S")
        .ok()
        .map(|t| t.format("%H:%M").to_string())
}

/// Validate an `HH:MM` clock value, treating `24:00` as midnight.
pub fn normalize_clock(raw: &str) -> Option<String> {
    if raw == "24:00" {
        return Some("00:00".to_string());
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .map(|_| raw.to_string())
}

/// Validate an `"HH:MM - HH:MM"` range, rewriting `24:00` to `00:00`.
pub fn normalize_time_range(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw.trim().split(" - ").collect();
    let [start, end] = parts.as_slice() else {
        return None;
    };
    let start = normalize_clock(start)?;
    let end = normalize_clock(end)?;
    Some(format!("{} - {}", start, end))
}
