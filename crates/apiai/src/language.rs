//! Languages served by the conversational agent

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Supported agent language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    /// English
    #[default]
    English,
    /// Russian
    Russian,
    /// German
    German,
    /// Portuguese
    Portuguese,
    /// Portuguese (Brazil)
    PortugueseBrazil,
    /// Spanish
    Spanish,
    /// French
    French,
    /// Italian
    Italian,
    /// Japanese
    Japanese,
    /// Korean
    Korean,
    /// Chinese (China)
    ChineseChina,
    /// Chinese (Hong Kong)
    ChineseHongKong,
    /// Chinese (Taiwan)
    ChineseTaiwan,
}

impl Language {
    /// Every supported language
    pub const ALL: [Self; 13] = [
        Self::English,
        Self::Russian,
        Self::German,
        Self::Portuguese,
        Self::PortugueseBrazil,
        Self::Spanish,
        Self::French,
        Self::Italian,
        Self::Japanese,
        Self::Korean,
        Self::ChineseChina,
        Self::ChineseHongKong,
        Self::ChineseTaiwan,
    ];

    /// Canonical tag sent on the wire
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Russian => "ru",
            Self::German => "de",
            Self::Portuguese => "pt",
            Self::PortugueseBrazil => "pt-BR",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::Italian => "it",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::ChineseChina => "zh-CN",
            Self::ChineseHongKong => "zh-HK",
            Self::ChineseTaiwan => "zh-TW",
        }
    }

    /// Look up a tag, ignoring case and accepting `_` as separator
    #[must_use]
    pub fn lookup(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(&normalized))
    }
}

/// Check a tag against the registry
///
/// Returns whether the tag is supported and, if so, its canonical form.
#[must_use]
pub fn is_supported(tag: &str) -> (bool, Option<&'static str>) {
    match Language::lookup(tag) {
        Some(lang) => (true, Some(lang.tag())),
        None => (false, None),
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| ClientError::UnsupportedLanguage(s.to_string()))
    }
}

impl TryFrom<String> for Language {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.tag().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Language::lookup("EN"), Some(Language::English));
        assert_eq!(Language::lookup("pt-br"), Some(Language::PortugueseBrazil));
        assert_eq!(Language::lookup("zh_tw"), Some(Language::ChineseTaiwan));
    }

    #[test]
    fn is_supported_returns_canonical_tag() {
        assert_eq!(is_supported("zh-cn"), (true, Some("zh-CN")));
        assert_eq!(is_supported("klingon"), (false, None));
    }

    #[test]
    fn every_language_roundtrips_through_its_tag() {
        for lang in Language::ALL {
            assert_eq!(lang.tag().parse::<Language>().unwrap(), lang);
        }
    }

    #[test]
    fn unknown_tag_fails_to_parse() {
        let err = "xx".parse::<Language>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedLanguage(tag) if tag == "xx"));
    }

    #[test]
    fn serializes_as_tag() {
        let json = serde_json::to_string(&Language::PortugueseBrazil).unwrap();
        assert_eq!(json, "\"pt-BR\"");
        let lang: Language = serde_json::from_str("\"de\"").unwrap();
        assert_eq!(lang, Language::German);
    }
}
