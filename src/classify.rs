use serde::Serialize;

use crate::sitemap::SitemapEntry;

/// Closed set of page types, serialized with the site's display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageType {
    #[serde(rename = "Hoofdpagina")]
    Hoofdpagina,
    #[serde(rename = "Vocabularium")]
    Vocabularium,
    #[serde(rename = "Applicatieprofiel")]
    Applicatieprofiel,
    #[serde(rename = "Codelijst")]
    Codelijst,
    #[serde(rename = "Waarde van een codelijst")]
    WaardeVanCodelijst,
    #[serde(rename = "Data dumps")]
    DataDumps,
    #[serde(rename = "Namespace met alle vocabularia en applicatieprofielen")]
    NamespaceOverzicht,
    #[serde(rename = "Standaardenregister")]
    Standaardenregister,
    #[serde(rename = "Status in standaardenregister")]
    StatusInStandaardenregister,
    #[serde(rename = "Pagina of document")]
    PaginaOfDocument,
}

/// Page document as published to the search index, derived
/// deterministically from one sitemap entry.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub keywords: Vec<String>,
    pub priority: f32,
    pub lastmod: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
}

/// Pure URL classification against one base domain. No I/O.
pub struct UrlClassifier {
    base: String,
}

impl UrlClassifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Path-pattern rules first, then whole-site landmark pages as exact
    /// overrides that always win.
    pub fn classify(&self, url: &str) -> PageType {
        let provisional = if url.contains("/standaarden/") {
            PageType::StatusInStandaardenregister
        } else if url.contains("/applicatieprofiel/") {
            PageType::Applicatieprofiel
        } else if url.contains("/ns/") {
            PageType::Vocabularium
        } else if url.contains("/conceptscheme/") {
            PageType::Codelijst
        } else if url.contains("/concept/") {
            PageType::WaardeVanCodelijst
        } else {
            PageType::PaginaOfDocument
        };

        if url == format!("{}/", self.base) {
            PageType::Hoofdpagina
        } else if url == format!("{}/dumps", self.base) {
            PageType::DataDumps
        } else if url == format!("{}/ns", self.base) {
            PageType::NamespaceOverzicht
        } else if url == format!("{}/standaarden", self.base) {
            PageType::Standaardenregister
        } else {
            provisional
        }
    }

    /// Path segments after the domain. The bare root and the namespace
    /// root get fixed keyword sets so they remain findable.
    pub fn keywords_for(&self, url: &str) -> Vec<String> {
        if url == format!("{}/", self.base) {
            return vec!["data".into(), "vlaanderen".into(), "be".into()];
        }
        let path = url
            .strip_prefix(&format!("{}/", self.base))
            .unwrap_or(url)
            .trim_end_matches('/');
        let mut keywords: Vec<String> = path.split('/').map(|s| s.to_string()).collect();
        if url == format!("{}/ns", self.base) {
            keywords.push("vocabularium".into());
            keywords.push("applicatieprofiel".into());
        }
        keywords
    }

    pub fn page_record(&self, entry: &SitemapEntry) -> PageRecord {
        PageRecord {
            url: entry.loc.clone(),
            keywords: self.keywords_for(&entry.loc),
            priority: entry.priority,
            lastmod: entry.lastmod.clone(),
            page_type: self.classify(&entry.loc),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> UrlClassifier {
        UrlClassifier::new("https://data.vlaanderen.be")
    }

    #[test]
    fn landmark_pages_override_patterns() {
        let c = classifier();
        assert_eq!(c.classify("https://data.vlaanderen.be/"), PageType::Hoofdpagina);
        assert_eq!(c.classify("https://data.vlaanderen.be/dumps"), PageType::DataDumps);
        assert_eq!(c.classify("https://data.vlaanderen.be/ns"), PageType::NamespaceOverzicht);
        assert_eq!(
            c.classify("https://data.vlaanderen.be/standaarden"),
            PageType::Standaardenregister
        );
    }

    #[test]
    fn path_patterns_in_order() {
        let c = classifier();
        assert_eq!(
            c.classify("https://data.vlaanderen.be/ns/adres"),
            PageType::Vocabularium
        );
        assert_eq!(
            c.classify("https://data.vlaanderen.be/ns/adres/applicatieprofiel/gebouw"),
            PageType::Applicatieprofiel
        );
        assert_eq!(
            c.classify("https://data.vlaanderen.be/standaarden/erkende-standaard"),
            PageType::StatusInStandaardenregister
        );
        assert_eq!(
            c.classify("https://data.vlaanderen.be/conceptscheme/status"),
            PageType::Codelijst
        );
        assert_eq!(
            c.classify("https://data.vlaanderen.be/concept/status/kandidaat"),
            PageType::WaardeVanCodelijst
        );
        assert_eq!(
            c.classify("https://data.vlaanderen.be/media/logo.png"),
            PageType::PaginaOfDocument
        );
    }

    #[test]
    fn keywords_are_path_segments() {
        let c = classifier();
        assert_eq!(
            c.keywords_for("https://data.vlaanderen.be/ns/adres"),
            vec!["ns", "adres"]
        );
    }

    #[test]
    fn root_keywords_are_fixed() {
        let c = classifier();
        assert_eq!(
            c.keywords_for("https://data.vlaanderen.be/"),
            vec!["data", "vlaanderen", "be"]
        );
    }

    #[test]
    fn namespace_root_gets_extra_tags() {
        let c = classifier();
        assert_eq!(
            c.keywords_for("https://data.vlaanderen.be/ns"),
            vec!["ns", "vocabularium", "applicatieprofiel"]
        );
    }

    #[test]
    fn page_type_serializes_to_display_label() {
        let json = serde_json::to_string(&PageType::WaardeVanCodelijst).unwrap();
        assert_eq!(json, "\"Waarde van een codelijst\"");
        let json = serde_json::to_string(&PageType::PaginaOfDocument).unwrap();
        assert_eq!(json, "\"Pagina of document\"");
    }
}
