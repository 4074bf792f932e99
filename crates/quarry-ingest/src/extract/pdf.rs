//! PDF text extractor.

use super::{ExtractResult, Extractor, ProgressSink};
use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};
use quarry_core::{MediaType, Request};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Separator placed between pages.
const PAGE_SEPARATOR: &str = "\n\n";

/// Extractor for PDF documents, one page at a time.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfExtractor {
    fn media_type(&self) -> MediaType {
        MediaType::Pdf
    }

    fn extract(&self, request: Request, progress: &mut ProgressSink) -> ExtractResult<String> {
        let buffer = request.into_buffer();
        let doc = Document::load_mem(&buffer)?;
        drop(buffer);

        let pages = doc.get_pages();
        let total = pages.len();
        debug!("Extracting text from {} PDF pages", total);

        let mut page_texts = Vec::with_capacity(total);
        for (i, page_id) in pages.values().enumerate() {
            page_texts.push(page_text(&doc, *page_id)?);
            progress.report_ratio(i + 1, total)?;
        }

        Ok(page_texts.join(PAGE_SEPARATOR))
    }
}

/// The text items of one page joined with single spaces.
///
/// Every text-showing operator (`Tj`, `TJ`, `'`, `"`) is one item, decoded
/// with the encoding of the font selected at that point.
fn page_text(doc: &Document, page_id: ObjectId) -> lopdf::Result<String> {
    let encodings: BTreeMap<Vec<u8>, Encoding> = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                warn!("Skipping font {}: {}", String::from_utf8_lossy(&name), e);
                None
            }
        })
        .collect();

    let data = doc.get_page_content(page_id)?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }
    let content = Content::decode(&data)?;

    let mut items = Vec::new();
    let mut encoding = None;
    for operation in &content.operations {
        let operands = match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name));
                continue;
            }
            "Tj" | "TJ" | "'" => &operation.operands[..],
            "\"" => operation.operands.last().map(std::slice::from_ref).unwrap_or(&[]),
            _ => continue,
        };

        let Some(encoding) = encoding else {
            debug!("Skipping text shown without a known font");
            continue;
        };
        let mut item = String::new();
        collect_item(&mut item, encoding, operands)?;
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    Ok(items.join(" "))
}

/// Append the strings of one text-showing operator.
///
/// Large negative kerning inside a `TJ` array stands for a word gap.
fn collect_item(item: &mut String, encoding: &Encoding, operands: &[Object]) -> lopdf::Result<()> {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => item.push_str(&Document::decode_text(encoding, bytes)?),
            Object::Array(parts) => collect_item(item, encoding, parts)?,
            Object::Integer(adjust) if *adjust < -100 => item.push(' '),
            Object::Real(adjust) if *adjust < -100.0 => item.push(' '),
            _ => {}
        }
    }
    Ok(())
}
