use std::fmt;
use std::io::Write;
use std::path::Path;

use quick_xml::escape::escape;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{IndexerError, Result};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<url>` element of the sitemap schema. Unique by `loc` within a
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// Closed `<changefreq>` set of the sitemap schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(ChangeFreq::Always),
            "hourly" => Ok(ChangeFreq::Hourly),
            "daily" => Ok(ChangeFreq::Daily),
            "weekly" => Ok(ChangeFreq::Weekly),
            "monthly" => Ok(ChangeFreq::Monthly),
            "yearly" => Ok(ChangeFreq::Yearly),
            "never" => Ok(ChangeFreq::Never),
            other => Err(IndexerError::Parse(format!(
                "unknown changefreq value: {other}"
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load the sitemap at `path`. Io if the file is absent or unreadable,
/// Parse on malformed XML or an incomplete `<url>` element.
pub fn load(path: &Path) -> Result<Vec<SitemapEntry>> {
    let xml = std::fs::read_to_string(path).map_err(|source| IndexerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_urlset(&xml)
}

/// Parse a urlset document into entries, in document order.
pub fn parse_urlset(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut in_url = false;
    let mut field: Option<Field> = None;
    let mut partial = Partial::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                b"url" => {
                    in_url = true;
                    partial = Partial::default();
                }
                b"loc" if in_url => field = Some(Field::Loc),
                b"lastmod" if in_url => field = Some(Field::Lastmod),
                b"changefreq" if in_url => field = Some(Field::Changefreq),
                b"priority" if in_url => field = Some(Field::Priority),
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) => {
                if let Some(f) = field {
                    let text = e
                        .unescape()
                        .map_err(|e| IndexerError::Parse(e.to_string()))?
                        .to_string();
                    partial.set(f, text);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                b"url" => {
                    entries.push(partial.finish(entries.len())?);
                    partial = Partial::default();
                    in_url = false;
                }
                b"loc" | b"lastmod" | b"changefreq" | b"priority" => field = None,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(IndexerError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

#[derive(Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

#[derive(Default)]
struct Partial {
    loc: Option<String>,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

impl Partial {
    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::Loc => self.loc = Some(text),
            Field::Lastmod => self.lastmod = Some(text),
            Field::Changefreq => self.changefreq = Some(text),
            Field::Priority => self.priority = Some(text),
        }
    }

    fn finish(self, index: usize) -> Result<SitemapEntry> {
        let missing =
            |name: &str| IndexerError::Parse(format!("url element {index} is missing <{name}>"));
        let loc = self.loc.ok_or_else(|| missing("loc"))?;
        let lastmod = self.lastmod.ok_or_else(|| missing("lastmod"))?;
        let changefreq = ChangeFreq::parse(&self.changefreq.ok_or_else(|| missing("changefreq"))?)?;
        let priority = self
            .priority
            .ok_or_else(|| missing("priority"))?
            .parse::<f32>()
            .map_err(|e| IndexerError::Parse(format!("bad priority for {loc}: {e}")))?;
        Ok(SitemapEntry {
            loc,
            lastmod,
            changefreq,
            priority,
        })
    }
}

/// Serialize entries into the fixed urlset schema.
pub fn to_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(entries.len() * 160 + 128);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(entry.loc.as_str())));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            escape(entry.lastmod.as_str())
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.changefreq
        ));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Write entries to `path`, fully replacing prior content. The new document
/// is staged in a temp file next to the destination and renamed into place,
/// so a failure partway leaves the previous file intact.
pub fn save(path: &Path, entries: &[SitemapEntry]) -> Result<()> {
    let io_err = |source| IndexerError::Io {
        path: path.to_path_buf(),
        source,
    };

    let xml = to_xml(entries);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(xml.as_bytes()).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    info!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loc: &str) -> SitemapEntry {
        SitemapEntry {
            loc: loc.to_string(),
            lastmod: "2019-03-01".to_string(),
            changefreq: ChangeFreq::Monthly,
            priority: 0.5,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        let entries = vec![
            entry("https://data.vlaanderen.be/"),
            entry("https://data.vlaanderen.be/ns/adres?a=1&b=2"),
        ];

        save(&path, &entries).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");

        save(&path, &[entry("https://data.vlaanderen.be/a")]).unwrap();
        save(&path, &[entry("https://data.vlaanderen.be/b")]).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].loc, "https://data.vlaanderen.be/b");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, IndexerError::Io { .. }));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = parse_urlset("<urlset><url><loc>x</url>").unwrap_err();
        assert!(matches!(err, IndexerError::Parse(_)));
    }

    #[test]
    fn incomplete_url_element_is_parse_error() {
        let xml = "<urlset><url><loc>https://x</loc><lastmod>2019-01-01</lastmod>\
                   <changefreq>monthly</changefreq></url></urlset>";
        let err = parse_urlset(xml).unwrap_err();
        assert!(matches!(err, IndexerError::Parse(_)));
    }

    #[test]
    fn unknown_changefreq_is_parse_error() {
        let xml = "<urlset><url><loc>https://x</loc><lastmod>2019-01-01</lastmod>\
                   <changefreq>sometimes</changefreq><priority>0.5</priority></url></urlset>";
        let err = parse_urlset(xml).unwrap_err();
        assert!(matches!(err, IndexerError::Parse(_)));
    }
}
