use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Locale identifiers for source and target content
///
/// A locale is an ISO 639 language code with an optional region, written
/// `fr`, `fr-CA` or `fr_CA`. Language codes are validated with `isolang`
/// and kept in the form they were given (2 or 3 letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocaleId {
    language: String,
    region: Option<String>,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Resolve a 2- or 3-letter code to an isolang language
fn lookup_language(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => {
            let part2t = bibliographic_to_terminology(code).unwrap_or(code);
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

impl LocaleId {
    /// Parse a locale string such as `en`, `en-US`, `pt_br`
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("Empty locale identifier"));
        }

        let mut parts = trimmed.split(['-', '_']);
        let language = parts.next().unwrap_or_default().to_lowercase();
        if language == "und" || lookup_language(&language).is_none() {
            return Err(anyhow!("Invalid language code in locale: {}", value));
        }

        let region = match parts.next() {
            Some(r) if r.len() == 2 && r.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(r.to_uppercase())
            }
            Some(r) if r.len() == 3 && r.chars().all(|c| c.is_ascii_digit()) => Some(r.to_string()),
            Some(r) => return Err(anyhow!("Invalid region '{}' in locale: {}", r, value)),
            None => None,
        };
        if parts.next().is_some() {
            return Err(anyhow!("Unsupported locale variant: {}", value));
        }

        Ok(Self { language, region })
    }

    /// Language part, lowercase
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Region part, uppercase
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// English name of the language
    pub fn language_name(&self) -> String {
        lookup_language(&self.language)
            .map(|l| l.to_name().to_string())
            .unwrap_or_else(|| self.language.clone())
    }

    /// True when both locales name the same language, ignoring regions and
    /// 2/3-letter spelling differences
    pub fn same_language(&self, other: &LocaleId) -> bool {
        match (lookup_language(&self.language), lookup_language(&other.language)) {
            (Some(a), Some(b)) => a == b,
            _ => self.language == other.language,
        }
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => write!(f, "{}", self.language),
        }
    }
}

impl FromStr for LocaleId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LocaleId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LocaleId> for String {
    fn from(locale: LocaleId) -> Self {
        locale.to_string()
    }
}
