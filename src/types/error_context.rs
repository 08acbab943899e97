//! Contents of an error document

use std::fmt;

/// Language tag of an error message, e.g. `en-US`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    pub country: Option<String>,
}

impl Locale {
    /// Parse `lang`, `lang-CC` or `lang_CC`; `None` for an empty tag
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let mut parts = tag.splitn(2, ['-', '_']);
        let language = parts.next()?.to_ascii_lowercase();
        let country = parts
            .next()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_ascii_uppercase());
        Some(Self { language, country })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}-{}", self.language, country),
            None => f.write_str(&self.language),
        }
    }
}

/// Flat description of a service-side error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub content_type: String,
    pub message: Option<String>,
    pub error_code: Option<String>,
    pub locale: Option<Locale>,
    pub inner_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse() {
        let locale = Locale::parse("en-us").unwrap();
        assert_eq!(locale.language, "en");
        assert_eq!(locale.country.as_deref(), Some("US"));
        assert_eq!(locale.to_string(), "en-US");
        assert_eq!(Locale::parse("de").unwrap().country, None);
        assert!(Locale::parse("").is_none());
    }
}
