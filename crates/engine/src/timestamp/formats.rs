//! Candidate timestamp formats.
//!
//! Each format pairs a regex (matched at the start of the line, after any
//! level token) with a parser that turns the matched text into a UTC instant.
//! Text without an explicit offset is read as UTC.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::model::FileDates;

const FRACTION: &str = r"(?:[.,][0-9]{1,6})?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// `2026-02-05T10:00:00.123Z`, offset and fraction optional
    IsoT,
    /// `2026-02-05 10:00:00,123 +0100`, offset and fraction optional
    IsoSpace,
    /// `2026-02-05` followed by a separator
    IsoDate,
    /// `05/02/2026 10:00:00`
    SlashDayFirst,
    /// `02/05/2026 10:00:00`
    SlashMonthFirst,
    /// `05.02.2026 10:00:00`
    DotDayFirst,
    /// `5-Feb-2026 10:00:00`
    DayMonthNameYear,
    /// `Feb 5, 2026 10:00:00`
    MonthNameDayYear,
    /// `Feb  5 10:00:00`, year taken from the file dates
    Syslog,
    /// Ten-digit Unix seconds
    EpochSeconds,
    /// Thirteen-digit Unix milliseconds
    EpochMillis,
    /// `10:00:00.123`, date taken from the file dates
    TimeOnly,
}

impl FormatKind {
    /// Detection order. Earlier formats win ties.
    pub const ALL: [FormatKind; 12] = [
        FormatKind::IsoT,
        FormatKind::IsoSpace,
        FormatKind::IsoDate,
        FormatKind::SlashDayFirst,
        FormatKind::SlashMonthFirst,
        FormatKind::DotDayFirst,
        FormatKind::DayMonthNameYear,
        FormatKind::MonthNameDayYear,
        FormatKind::Syslog,
        FormatKind::EpochSeconds,
        FormatKind::EpochMillis,
        FormatKind::TimeOnly,
    ];

    /// Human-readable pattern name.
    pub fn pattern(&self) -> &'static str {
        match self {
            FormatKind::IsoT => "yyyy-MM-ddTHH:mm:ss.SSS",
            FormatKind::IsoSpace => "yyyy-MM-dd HH:mm:ss.SSS",
            FormatKind::IsoDate => "yyyy-MM-dd",
            FormatKind::SlashDayFirst => "dd/MM/yyyy HH:mm:ss",
            FormatKind::SlashMonthFirst => "MM/dd/yyyy HH:mm:ss",
            FormatKind::DotDayFirst => "dd.MM.yyyy HH:mm:ss",
            FormatKind::DayMonthNameYear => "dd-MMM-yyyy HH:mm:ss",
            FormatKind::MonthNameDayYear => "MMM dd, yyyy HH:mm:ss",
            FormatKind::Syslog => "MMM dd HH:mm:ss",
            FormatKind::EpochSeconds => "epoch_s",
            FormatKind::EpochMillis => "epoch_ms",
            FormatKind::TimeOnly => "HH:mm:ss.SSS",
        }
    }

    /// Regex source, unanchored. Callers check the match position.
    pub(crate) fn regex(&self) -> Cow<'static, str> {
        match self {
            FormatKind::IsoT => Cow::Owned(format!(
                r"[0-9]{{4}}-[0-9]{{2}}-[0-9]{{2}}T[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}(?:Z|[+-][0-9]{{2}}:?[0-9]{{2}})?"
            )),
            FormatKind::IsoSpace => Cow::Owned(format!(
                r"[0-9]{{4}}-[0-9]{{2}}-[0-9]{{2}}\s+[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}(?:\s*[+-][0-9]{{2}}:?[0-9]{{2}})?"
            )),
            FormatKind::IsoDate => Cow::Borrowed(r"[0-9]{4}-[0-9]{2}-[0-9]{2}"),
            FormatKind::SlashDayFirst | FormatKind::SlashMonthFirst => Cow::Owned(format!(
                r"[0-9]{{2}}/[0-9]{{2}}/[0-9]{{4}}\s+[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}"
            )),
            FormatKind::DotDayFirst => Cow::Owned(format!(
                r"[0-9]{{2}}\.[0-9]{{2}}\.[0-9]{{4}}\s+[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}"
            )),
            FormatKind::DayMonthNameYear => Cow::Owned(format!(
                r"[0-9]{{1,2}}-[A-Za-z]{{3}}-[0-9]{{4}}\s+[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}"
            )),
            FormatKind::MonthNameDayYear => Cow::Owned(format!(
                r"[A-Za-z]{{3}}\s+[0-9]{{1,2}},?\s+[0-9]{{4}}\s+[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}"
            )),
            FormatKind::Syslog => Cow::Borrowed(r"[A-Za-z]{3}\s+[0-9]{1,2}\s+[0-9]{2}:[0-9]{2}:[0-9]{2}"),
            FormatKind::EpochSeconds => Cow::Borrowed(r"[0-9]{10}\b"),
            FormatKind::EpochMillis => Cow::Borrowed(r"[0-9]{13}\b"),
            FormatKind::TimeOnly => Cow::Owned(format!(r"[0-9]{{2}}:[0-9]{{2}}:[0-9]{{2}}{FRACTION}")),
        }
    }

    /// Checks what follows a match ending at `end`. Only the bare date format
    /// needs a separator after it.
    pub(crate) fn accepts_boundary(&self, line: &str, end: usize) -> bool {
        match self {
            FormatKind::IsoDate => match line[end..].chars().next() {
                None => true,
                Some(c) => c.is_whitespace() || matches!(c, ',' | ']' | '[' | '|'),
            },
            _ => true,
        }
    }

    /// Parse text matched by this format.
    pub fn parse(&self, raw: &str, dates: &FileDates) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        match self {
            FormatKind::IsoT | FormatKind::IsoSpace => parse_iso(raw),
            FormatKind::IsoDate => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc()),
            FormatKind::SlashDayFirst => parse_naive(raw, "%d/%m/%Y %H:%M:%S%.f"),
            FormatKind::SlashMonthFirst => parse_naive(raw, "%m/%d/%Y %H:%M:%S%.f"),
            FormatKind::DotDayFirst => parse_naive(raw, "%d.%m.%Y %H:%M:%S%.f"),
            FormatKind::DayMonthNameYear => parse_naive(raw, "%d-%b-%Y %H:%M:%S%.f"),
            FormatKind::MonthNameDayYear => parse_naive(raw, "%b %d, %Y %H:%M:%S%.f")
                .or_else(|| parse_naive(raw, "%b %d %Y %H:%M:%S%.f")),
            FormatKind::Syslog => parse_syslog(raw, dates),
            FormatKind::EpochSeconds => raw
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .filter(in_epoch_window),
            FormatKind::EpochMillis => raw
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .filter(in_epoch_window),
            FormatKind::TimeOnly => parse_time_only(raw, dates),
        }
    }
}

/// ISO-8601 with `T` or whitespace between date and time, optional fraction
/// (`.` or `,`), optional `Z` or numeric offset.
pub(crate) fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_fraction(raw.trim());
    let s = normalized.as_ref();
    let base = if s.as_bytes().get(10) == Some(&b'T') {
        "%Y-%m-%dT%H:%M:%S%.f"
    } else {
        "%Y-%m-%d %H:%M:%S%.f"
    };

    if let Ok(dt) = DateTime::parse_from_str(s, &format!("{base} %z")) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_naive(s.strip_suffix('Z').unwrap_or(s), base)
}

fn parse_naive(raw: &str, fmt: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_fraction(raw);
    NaiveDateTime::parse_from_str(&normalized, fmt)
        .ok()
        .map(|n| n.and_utc())
}

fn parse_syslog(raw: &str, dates: &FileDates) -> Option<DateTime<Utc>> {
    let mut parts = raw.split_whitespace();
    let month = month_number(parts.next()?)?;
    let day: u32 = parts.next()?.parse().ok()?;
    let time = NaiveTime::parse_from_str(parts.next()?, "%H:%M:%S").ok()?;

    let mut years = vec![dates.created_at.year()];
    if dates.modified_at.year() != dates.created_at.year() {
        years.push(dates.modified_at.year());
    }

    let mut best: Option<(f64, DateTime<Utc>)> = None;
    for year in years {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        let candidate = date.and_time(time).and_utc();
        let score = dates.score(candidate);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, instant)| instant)
}

fn parse_time_only(raw: &str, dates: &FileDates) -> Option<DateTime<Utc>> {
    let normalized = normalize_fraction(raw);
    let time = NaiveTime::parse_from_str(&normalized, "%H:%M:%S%.f").ok()?;

    let on_created = dates.created_at.date_naive().and_time(time).and_utc();
    if on_created > dates.modified_at + Duration::days(1) {
        return Some(dates.modified_at.date_naive().and_time(time).and_utc());
    }
    Some(on_created)
}

fn in_epoch_window(instant: &DateTime<Utc>) -> bool {
    (2000..=2100).contains(&instant.year())
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun",
        "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let key = name.get(..3)?.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == key).map(|i| i as u32 + 1)
}

/// Rewrite a decimal comma in the seconds field (`10:00:00,123`) to a dot.
/// Commas elsewhere (`Feb 5, 2026`) are left alone.
fn normalize_fraction(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let comma = (3..bytes.len().saturating_sub(1)).find(|&i| {
        bytes[i] == b','
            && bytes[i - 3] == b':'
            && bytes[i - 2].is_ascii_digit()
            && bytes[i - 1].is_ascii_digit()
            && bytes[i + 1].is_ascii_digit()
    });

    match comma {
        Some(i) => Cow::Owned(format!("{}.{}", &raw[..i], &raw[i + 1..])),
        None => Cow::Borrowed(raw),
    }
}
