//! EPUB text extractor.
//!
//! Content documents are read from the zip container in fixed-width batches.
//! Entries within a batch are decompressed and stripped concurrently; results
//! are appended in enumeration order before the next batch starts.

use super::{ExtractError, ExtractResult, Extractor, ProgressSink};
use crate::options::EpubOptions;
use quarry_config::ReadingOrder;
use quarry_core::{MediaType, Request};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Separator placed between content documents.
const ENTRY_SEPARATOR: &str = "\n\n";

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Invalid regex"));
static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("Invalid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Extractor for EPUB containers.
pub struct EpubExtractor {
    options: EpubOptions,
}

impl EpubExtractor {
    pub fn new(options: EpubOptions) -> Self {
        Self { options }
    }

    /// Select content documents in output order.
    fn content_entries(
        &self,
        archive: &mut Archive<'_>,
        package_path: &str,
    ) -> ExtractResult<Vec<String>> {
        let names = entry_names(archive)?;
        match self.options.reading_order {
            ReadingOrder::Archive => Ok(names.into_iter().filter(|n| is_html_entry(n)).collect()),
            ReadingOrder::Spine => {
                let package = read_entry_text(archive, package_path)
                    .map_err(|e| match e {
                        ExtractError::Zip(ZipError::FileNotFound) => {
                            ExtractError::InvalidContainer(format!(
                                "Missing package document {}",
                                package_path
                            ))
                        }
                        other => other,
                    })?;
                let present: HashSet<&str> = names.iter().map(String::as_str).collect();
                let entries: Vec<String> = spine_hrefs(&package)?
                    .into_iter()
                    .map(|href| resolve_href(package_path, &href))
                    .filter(|path| present.contains(path.as_str()))
                    .collect();
                Ok(entries)
            }
        }
    }
}

impl Default for EpubExtractor {
    fn default() -> Self {
        Self::new(EpubOptions::default())
    }
}

impl Extractor for EpubExtractor {
    fn media_type(&self) -> MediaType {
        MediaType::Epub
    }

    fn extract(&self, request: Request, progress: &mut ProgressSink) -> ExtractResult<String> {
        let buffer = request.into_buffer();
        let mut archive = ZipArchive::new(Cursor::new(buffer.as_slice()))?;

        let container = match read_entry_text(&mut archive, CONTAINER_PATH) {
            Ok(text) => text,
            Err(ExtractError::Zip(ZipError::FileNotFound)) => {
                return Err(ExtractError::InvalidContainer(
                    "Missing container.xml".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };
        let package_path = rootfile_path(&container)?.ok_or_else(|| {
            ExtractError::InvalidContainer("Cannot find OPF file path".to_string())
        })?;
        debug!("EPUB package document at {}", package_path);

        let entries = self.content_entries(&mut archive, &package_path)?;
        let total = entries.len();
        let width = self.options.batch_width.max(1);
        debug!(
            "Extracting {} content documents in batches of {}",
            total, width
        );

        let mut texts = Vec::new();
        let mut processed = 0;
        for batch in entries.chunks(width) {
            let results: Vec<ExtractResult<String>> = batch
                .par_iter()
                .map(|name| {
                    let mut archive = archive.clone();
                    read_entry_text(&mut archive, name).map(|html| html_to_text(&html))
                })
                .collect();

            for text in results {
                let text = text?;
                if !text.is_empty() {
                    texts.push(text);
                }
            }

            processed += batch.len();
            progress.report_ratio(processed, total)?;
        }

        Ok(texts.join(ENTRY_SEPARATOR))
    }
}

/// Strip style and script blocks and all tags, collapsing whitespace.
pub fn html_to_text(html: &str) -> String {
    let text = STYLE_BLOCK.replace_all(html, "");
    let text = SCRIPT_BLOCK.replace_all(&text, "");
    let text = TAG.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

fn is_html_entry(name: &str) -> bool {
    name.ends_with(".html") || name.ends_with(".xhtml")
}

/// Names of all file entries, in archive order.
fn entry_names(archive: &mut Archive<'_>) -> ExtractResult<Vec<String>> {
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        if !file.is_dir() {
            names.push(file.name().to_string());
        }
    }
    Ok(names)
}

fn read_entry_text(archive: &mut Archive<'_>, name: &str) -> ExtractResult<String> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The `full-path` of the first `rootfile` in `container.xml`.
///
/// A blank path counts as missing.
fn rootfile_path(container: &str) -> ExtractResult<Option<String>> {
    let mut reader = Reader::from_str(container);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                let path = attribute(&e, b"full-path")?;
                return Ok(path.filter(|p| !p.trim().is_empty()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Manifest hrefs listed by the spine, in reading order.
fn spine_hrefs(package: &str) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_str(package);
    let mut manifest: HashMap<String, (String, Option<String>)> = HashMap::new();
    let mut spine: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attribute(&e, b"id")?, attribute(&e, b"href")?)
                    {
                        let media_type = attribute(&e, b"media-type")?;
                        manifest.insert(id, (href, media_type));
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref")? {
                        spine.push(idref);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let mut hrefs = Vec::with_capacity(spine.len());
    for idref in spine {
        match manifest.get(&idref) {
            Some((href, media_type)) if is_html_item(href, media_type.as_deref()) => {
                hrefs.push(href.clone());
            }
            Some(_) => {}
            None => warn!("Spine references unknown manifest item {}", idref),
        }
    }
    Ok(hrefs)
}

fn is_html_item(href: &str, media_type: Option<&str>) -> bool {
    matches!(media_type, Some("application/xhtml+xml") | Some("text/html"))
        || is_html_entry(href)
        || href.ends_with(".htm")
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> ExtractResult<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?;
    match attr {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Resolve an href relative to the directory of the package document.
fn resolve_href(package_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut segments: Vec<&str> = match package_path.rfind('/') {
        Some(idx) => package_path[..idx].split('/').collect(),
        None => Vec::new(),
    };
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}


#[cfg(test)]
mod tests {
    use super::fixtures::{epub_with, zip_with, CONTAINER_XML};
    use super::*;
    use crate::extract::testing::{fractions, sink};

    fn extract_with(options: EpubOptions, bytes: Vec<u8>) -> (ExtractResult<String>, Vec<f64>) {
        let (mut progress, mut rx) = sink();
        let result =
            EpubExtractor::new(options).extract(Request::Epub { buffer: bytes }, &mut progress);
        (result, fractions(&mut rx))
    }

    fn extract(bytes: Vec<u8>) -> (ExtractResult<String>, Vec<f64>) {
        extract_with(EpubOptions::default(), bytes)
    }

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><style type="text/css">p { color: red; }</style>
            <SCRIPT>alert("x")</SCRIPT></head>
            <body><h1>Title</h1><p>Some   <em>styled</em>
            text.</p></body></html>"#;
        assert_eq!(html_to_text(html), "Title Some styled text.");
        assert_eq!(html_to_text("<script>x</script>"), "");
        assert_eq!(html_to_text("<style>\n.a{}\n</style>  "), "");
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let bytes = epub_with(&[
            ("OEBPS/a.xhtml", "<p>A</p>"),
            ("OEBPS/b.xhtml", "<script>x</script>"),
        ]);
        let (result, progress) = extract(bytes);
        assert_eq!(result.unwrap(), "A");
        assert_eq!(progress, vec![1.0]);
    }

    #[test]
    fn test_entries_keep_archive_order_across_batches() {
        let names: Vec<String> = (0..12).map(|i| format!("OEBPS/ch{:02}.html", i)).collect();
        let bodies: Vec<String> = (0..12).map(|i| format!("<p>chapter {}</p>", i)).collect();
        let documents: Vec<(&str, &str)> = names
            .iter()
            .zip(bodies.iter())
            .map(|(n, b)| (n.as_str(), b.as_str()))
            .collect();

        let (result, progress) = extract(epub_with(&documents));
        let expected: Vec<String> = (0..12).map(|i| format!("chapter {}", i)).collect();
        assert_eq!(result.unwrap(), expected.join("\n\n"));
        // 12 entries in batches of 5
        assert_eq!(progress, vec![5.0 / 12.0, 10.0 / 12.0, 1.0]);
    }

    #[test]
    fn test_non_html_entries_are_ignored() {
        let bytes = epub_with(&[
            ("OEBPS/content.opf", "<package/>"),
            ("OEBPS/style.css", "p { color: red }"),
            ("OEBPS/page.xhtml", "<body>Only this</body>"),
        ]);
        assert_eq!(extract(bytes).0.unwrap(), "Only this");
    }

    #[test]
    fn test_no_content_documents_is_empty() {
        let (result, progress) = extract(epub_with(&[]));
        assert_eq!(result.unwrap(), "");
        assert!(progress.is_empty());
    }

    #[test]
    fn test_missing_container() {
        let bytes = zip_with(&[("OEBPS/a.xhtml", "<p>A</p>")]);
        let err = extract(bytes).0.unwrap_err();
        assert_eq!(err.to_string(), "Invalid EPUB: Missing container.xml");
    }

    #[test]
    fn test_missing_full_path() {
        let bytes = zip_with(&[(
            "META-INF/container.xml",
            "<container><rootfiles><rootfile media-type=\"x\"/></rootfiles></container>",
        )]);
        let err = extract(bytes).0.unwrap_err();
        assert_eq!(err.to_string(), "Invalid EPUB: Cannot find OPF file path");
    }

    #[test]
    fn test_blank_full_path() {
        for container in [
            "<container><rootfiles><rootfile full-path=\"\"/></rootfiles></container>",
            "<container><rootfiles><rootfile full-path=\"  \"/></rootfiles></container>",
        ] {
            let bytes = zip_with(&[
                ("META-INF/container.xml", container),
                ("a.xhtml", "<p>A</p>"),
            ]);
            let err = extract(bytes).0.unwrap_err();
            assert_eq!(err.to_string(), "Invalid EPUB: Cannot find OPF file path");
        }
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract(b"plain bytes".to_vec()).0.unwrap_err();
        assert!(matches!(err, ExtractError::Zip(_)));
    }

    #[test]
    fn test_spine_order() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c1" href="text/one.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="text/two.htm" media-type="text/html"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="c2"/>
    <itemref idref="c1"/>
    <itemref idref="missing"/>
  </spine>
</package>"#;
        let bytes = zip_with(&[
            ("META-INF/container.xml", CONTAINER_XML),
            ("OEBPS/content.opf", opf),
            ("OEBPS/nav.xhtml", "<nav>Contents</nav>"),
            ("OEBPS/text/one.xhtml", "<p>One</p>"),
            ("OEBPS/text/two.htm", "<p>Two</p>"),
        ]);

        let spine = EpubOptions {
            reading_order: ReadingOrder::Spine,
            ..EpubOptions::default()
        };
        assert_eq!(extract_with(spine, bytes.clone()).0.unwrap(), "Two\n\nOne");
        // Archive order takes every .xhtml entry, including navigation
        assert_eq!(extract(bytes).0.unwrap(), "Contents\n\nOne");
    }

    #[test]
    fn test_spine_order_missing_package() {
        let bytes = zip_with(&[("META-INF/container.xml", CONTAINER_XML)]);
        let spine = EpubOptions {
            reading_order: ReadingOrder::Spine,
            ..EpubOptions::default()
        };
        let err = extract_with(spine, bytes).0.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidContainer(_)));
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS/content.opf", "ch1.xhtml"), "OEBPS/ch1.xhtml");
        assert_eq!(resolve_href("content.opf", "text/ch1.xhtml"), "text/ch1.xhtml");
        assert_eq!(
            resolve_href("OPS/pkg/content.opf", "../text/./ch1.xhtml#start"),
            "OPS/text/ch1.xhtml"
        );
    }
}
