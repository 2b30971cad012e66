//! Parsed PDF documents backed by `lopdf`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::debug;

use crate::error::{LinkCatError, Result};
use crate::pdf::PdfDocument;

/// A parsed PDF plus the name of the source it came from.
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    document: Document,
    source_name: String,
    load_time: Duration,
}

impl LopdfDocument {
    /// Parse a PDF from memory.
    ///
    /// `source_name` identifies the bytes in errors and logs ("upload", or the
    /// URL an asset was fetched from).
    ///
    /// # Errors
    ///
    /// Returns [`LinkCatError::EncryptedDocument`] for password protected
    /// files and [`LinkCatError::MalformedDocument`] for anything else that
    /// does not parse.
    pub fn load_mem(bytes: &[u8], source_name: impl Into<String>) -> Result<Self> {
        let source_name = source_name.into();
        let start = Instant::now();

        let document = Document::load_mem(bytes).map_err(|e| {
            let err_msg = e.to_string();
            if err_msg.contains("encrypt") || err_msg.contains("password") {
                LinkCatError::encrypted_document(source_name.clone())
            } else {
                LinkCatError::malformed_document(source_name.clone(), err_msg)
            }
        })?;

        if document.catalog().is_err() {
            return Err(LinkCatError::malformed_document(
                source_name,
                "document has no catalog",
            ));
        }

        Ok(Self {
            document,
            source_name,
            load_time: start.elapsed(),
        })
    }

    /// Name of the source these bytes came from.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Time spent parsing.
    pub fn load_time(&self) -> Duration {
        self.load_time
    }

    /// Give up the wrapper and return the underlying document.
    pub fn into_inner(self) -> Document {
        self.document
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or_else(|| {
                LinkCatError::malformed_document(
                    self.source_name.clone(),
                    format!("page {page} does not exist"),
                )
            })
    }

    /// Resolve the `URI` of a link annotation's `/URI` action, if it has one.
    fn link_uri(&self, annot: &Dictionary) -> Option<String> {
        let action = annot.get(b"A").ok()?;
        let (_, action) = self.document.dereference(action).ok()?;
        let action = action.as_dict().ok()?;

        let kind = action.get(b"S").and_then(Object::as_name).ok()?;
        if kind != b"URI" {
            return None;
        }

        let uri = action.get(b"URI").ok()?;
        let (_, uri) = self.document.dereference(uri).ok()?;
        let uri = decode_pdf_string(uri.as_str().ok()?);

        (!uri.is_empty()).then_some(uri)
    }

    /// Text encodings of the fonts a page can select with `Tf`, by resource
    /// name.
    ///
    /// Fonts whose encoding cannot be resolved are left out; only the strings
    /// drawn with them are lost.
    fn page_encodings(&self, page_id: ObjectId) -> BTreeMap<Vec<u8>, Encoding<'_>> {
        let fonts = match self.document.get_page_fonts(page_id) {
            Ok(fonts) => fonts,
            Err(e) => {
                debug!("{}: cannot read page fonts: {}", self.source_name, e);
                return BTreeMap::new();
            }
        };

        fonts
            .into_iter()
            .filter_map(|(name, font)| match font.get_font_encoding(&self.document) {
                Ok(encoding) => Some((name, encoding)),
                Err(e) => {
                    debug!(
                        "{}: skipping font {}: {}",
                        self.source_name,
                        String::from_utf8_lossy(&name),
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let page_id = self.page_id(page)?;
        let content = self
            .document
            .get_and_decode_page_content(page_id)
            .map_err(|e| {
                LinkCatError::malformed_document(
                    self.source_name.clone(),
                    format!("cannot extract text from page {page}: {e}"),
                )
            })?;

        let encodings = self.page_encodings(page_id);
        let mut text = String::new();
        let mut encoding = None;

        for operation in &content.operations {
            let operands = &operation.operands;
            match operation.operator.as_str() {
                "Tf" => {
                    encoding = operands
                        .first()
                        .and_then(|name| name.as_name().ok())
                        .and_then(|name| encodings.get(name));
                }
                "Tj" | "TJ" => {
                    if let Some(shown) = operands.first() {
                        show_text(&mut text, encoding, shown);
                    }
                }
                // `'` and `"` move to the next line before showing their string.
                "'" => {
                    break_line(&mut text);
                    if let Some(shown) = operands.first() {
                        show_text(&mut text, encoding, shown);
                    }
                }
                "\"" => {
                    break_line(&mut text);
                    if let Some(shown) = operands.get(2) {
                        show_text(&mut text, encoding, shown);
                    }
                }
                "BT" | "ET" | "Td" | "TD" | "T*" | "Tm" => break_line(&mut text),
                _ => {}
            }
        }

        Ok(text)
    }

    fn page_link_annotations(&self, page: u32) -> Result<Vec<String>> {
        let page_id = self.page_id(page)?;
        let page_dict = self.document.get_dictionary(page_id).map_err(|e| {
            LinkCatError::malformed_document(self.source_name.clone(), e.to_string())
        })?;

        let Ok(annots) = page_dict.get(b"Annots") else {
            return Ok(Vec::new());
        };

        // Annots may be inline or an indirect array.
        let annots = match self.document.dereference(annots) {
            Ok((_, Object::Array(annots))) => annots,
            _ => return Ok(Vec::new()),
        };

        let mut uris = Vec::new();
        for annot in annots {
            let Ok((_, annot)) = self.document.dereference(annot) else {
                continue;
            };
            let Ok(annot) = annot.as_dict() else {
                continue;
            };

            let is_link = annot
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|subtype| subtype == b"Link");

            if is_link && let Some(uri) = self.link_uri(annot) {
                uris.push(uri);
            }
        }

        Ok(uris)
    }
}

/// Start a new line unless the text is empty or already ends one.
fn break_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Append the operand of a text-showing operator.
///
/// Strings drawn with a font of unknown encoding are dropped. In a `TJ`
/// array, a displacement wider than a tenth of an em becomes a space.
fn show_text(text: &mut String, encoding: Option<&Encoding<'_>>, operand: &Object) {
    match operand {
        Object::String(bytes, _) => {
            if let Some(shown) = encoding.and_then(|enc| Document::decode_text(enc, bytes).ok()) {
                text.push_str(&shown);
            }
        }
        Object::Array(items) => {
            for item in items {
                match item {
                    Object::String(..) => show_text(text, encoding, item),
                    _ if item.as_float().is_ok_and(|offset| offset < -100.0) => text.push(' '),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a BOM, otherwise bytes
/// are taken as (lossy) UTF-8.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
