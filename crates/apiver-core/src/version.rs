//! API version value type, parsing, and formatting
//!
//! An [`ApiVersion`] identifies one revision of a service contract. It is a
//! combination of an optional calendar group (e.g. `2018-04-01`), an optional
//! `major.minor` pair, and an optional status label (e.g. `beta`). Accepted
//! text forms:
//!
//! - `1` (major only)
//! - `1.0` (major.minor)
//! - `1.0-rc1` (major.minor-status)
//! - `2018-04-01` (calendar group only)
//! - `2018-04-01-1.0` (group plus major.minor)
//!
//! Values are immutable, compared by value, and totally ordered: group first,
//! then major, then minor (an absent minor compares as `0` when a major is
//! present), then status. An unlabeled version sorts after any labeled one
//! with the same numbers, so `1.0-beta < 1.0`.

use chrono::NaiveDate;
use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// An API version: optional calendar group, optional major/minor numbers,
/// and an optional status label.
///
/// At least one component is always present; the constructors make an
/// all-absent value unrepresentable.
#[derive(Debug, Clone)]
pub struct ApiVersion {
    group: Option<NaiveDate>,
    major: Option<u64>,
    minor: Option<u64>,
    status: Option<String>,
}

impl ApiVersion {
    /// Create a `major.minor` version.
    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            group: None,
            major: Some(major),
            minor: Some(minor),
            status: None,
        }
    }

    /// Create a version with only a major number.
    pub fn from_major(major: u64) -> Self {
        Self {
            group: None,
            major: Some(major),
            minor: None,
            status: None,
        }
    }

    /// Create a calendar-group version, e.g. `2018-04-01`.
    pub fn from_group(group: NaiveDate) -> Self {
        Self {
            group: Some(group),
            major: None,
            minor: None,
            status: None,
        }
    }

    /// Attach a calendar group to this version.
    pub fn with_group(mut self, group: NaiveDate) -> Self {
        self.group = Some(group);
        self
    }

    /// Attach a status label, e.g. `beta` or `rc1`.
    ///
    /// Labels must start with an ASCII letter and contain only ASCII letters
    /// and digits; anything else is rejected.
    pub fn with_status(mut self, status: impl Into<String>) -> Result<Self, VersionParseError> {
        let status = status.into();
        if !is_valid_status(&status) {
            return Err(VersionParseError::InvalidStatus(status));
        }
        self.status = Some(status);
        Ok(self)
    }

    /// The calendar group, if any.
    pub fn group(&self) -> Option<NaiveDate> {
        self.group
    }

    /// The major version number, if any.
    pub fn major(&self) -> Option<u64> {
        self.major
    }

    /// The minor version number, if any.
    pub fn minor(&self) -> Option<u64> {
        self.minor
    }

    /// The status label, if any. Comparison is case-insensitive.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether this version carries a status label (is a pre-release).
    pub fn is_prerelease(&self) -> bool {
        self.status.is_some()
    }

    /// Format using a pattern string.
    ///
    /// Recognized tokens, replaced in place:
    ///
    /// - `V` — major only (`1`)
    /// - `VV` — major.minor with minor defaulted to zero (`1.0`)
    /// - `VVV` — canonical: major, minor when declared, `-status` when
    ///   present (`1.0-beta`); round-trips through [`FromStr`] for any
    ///   version without a group
    /// - `G` — the calendar group as `yyyy-MM-dd`
    ///
    /// Tokens whose component is absent expand to the empty string.
    pub fn format_with(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 8);
        let mut chars = pattern.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                'V' => {
                    let mut run = 1;
                    while chars.peek() == Some(&'V') {
                        chars.next();
                        run += 1;
                    }
                    self.push_numeric(&mut out, run);
                }
                'G' => {
                    while chars.peek() == Some(&'G') {
                        chars.next();
                    }
                    if let Some(group) = self.group {
                        out.push_str(&group.format("%Y-%m-%d").to_string());
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    fn push_numeric(&self, out: &mut String, run: usize) {
        let Some(major) = self.major else { return };
        match run {
            1 => out.push_str(&major.to_string()),
            2 => {
                out.push_str(&major.to_string());
                out.push('.');
                out.push_str(&self.minor.unwrap_or(0).to_string());
            }
            _ => {
                out.push_str(&major.to_string());
                if let Some(minor) = self.minor {
                    out.push('.');
                    out.push_str(&minor.to_string());
                }
                if let Some(status) = &self.status {
                    out.push('-');
                    out.push_str(status);
                }
            }
        }
    }

    // Absent minor counts as zero once a major number is declared, so that
    // `1` and `1.0` denote the same contract revision.
    fn minor_normalized(&self) -> Option<u64> {
        if self.major.is_some() {
            Some(self.minor.unwrap_or(0))
        } else {
            self.minor
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group) = self.group {
            write!(f, "{}", group.format("%Y-%m-%d"))?;
            if self.major.is_some() {
                f.write_str("-")?;
            }
        }
        f.write_str(&self.format_with("VVV"))
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ApiVersion {}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group
            .cmp(&other.group)
            .then_with(|| self.major.cmp(&other.major))
            .then_with(|| self.minor_normalized().cmp(&other.minor_normalized()))
            .then_with(|| cmp_status(self.status.as_deref(), other.status.as_deref()))
    }
}

impl Hash for ApiVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.group.hash(state);
        self.major.hash(state);
        self.minor_normalized().hash(state);
        match &self.status {
            None => state.write_u8(0),
            Some(status) => {
                state.write_u8(1);
                for b in status.bytes() {
                    state.write_u8(b.to_ascii_lowercase());
                }
            }
        }
    }
}

// An unlabeled (final) version ranks after any labeled one with the same
// numbers; labels compare lexically, case-insensitively.
fn cmp_status(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}

fn is_valid_status(status: &str) -> bool {
    let mut bytes = status.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric())
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (group, rest) = split_group(text)?;
        if rest.is_empty() {
            // Group-only form; split_group never strips a date unless one
            // was actually present.
            return Ok(Self {
                group,
                major: None,
                minor: None,
                status: None,
            });
        }

        let (numeric, status) = match rest.split_once('-') {
            Some((numeric, status)) => {
                if !is_valid_status(status) {
                    return Err(VersionParseError::InvalidStatus(status.to_string()));
                }
                (numeric, Some(status.to_string()))
            }
            None => (rest, None),
        };

        let mut parts = numeric.split('.');
        let major = parse_number(parts.next().unwrap_or_default())?;
        let minor = match parts.next() {
            Some(part) => Some(parse_number(part)?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(VersionParseError::InvalidFormat(text.to_string()));
        }

        Ok(Self {
            group,
            major: Some(major),
            minor,
            status,
        })
    }
}

fn parse_number(text: &str) -> Result<u64, VersionParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidNumber(text.to_string()));
    }
    text.parse()
        .map_err(|_| VersionParseError::InvalidNumber(text.to_string()))
}

// A leading `yyyy-MM-dd` is a calendar group. When followed by more text it
// must be separated by `-` or `.` from the numeric part.
fn split_group(text: &str) -> Result<(Option<NaiveDate>, &str), VersionParseError> {
    let bytes = text.as_bytes();
    let looks_like_date = bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit);
    if !looks_like_date {
        return Ok((None, text));
    }

    let group = NaiveDate::parse_from_str(&text[..10], "%Y-%m-%d")
        .map_err(|_| VersionParseError::InvalidGroup(text[..10].to_string()))?;
    let rest = &text[10..];
    if rest.is_empty() {
        return Ok((Some(group), rest));
    }
    match rest.as_bytes()[0] {
        b'-' | b'.' => Ok((Some(group), &rest[1..])),
        _ => Err(VersionParseError::InvalidFormat(text.to_string())),
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Error produced when version text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// Empty (or all-whitespace) version text.
    #[error("empty version text")]
    Empty,
    /// The overall shape did not match any accepted form.
    #[error("invalid version format: {0:?}")]
    InvalidFormat(String),
    /// A numeric component was missing or not a non-negative integer.
    #[error("invalid number in version: {0:?}")]
    InvalidNumber(String),
    /// A status label contained characters outside `[A-Za-z][A-Za-z0-9]*`.
    #[error("invalid status label: {0:?}")]
    InvalidStatus(String),
    /// A calendar group was not a real date.
    #[error("invalid group date: {0:?}")]
    InvalidGroup(String),
}
