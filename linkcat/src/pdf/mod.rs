//! PDF capability layer.
//!
//! The pipeline never touches a PDF library directly. It talks to two small
//! traits:
//! - [`PdfDocument`]: page count, page text and link annotations
//! - [`PdfWriter`]: page-for-page concatenation into one output
//!
//! Both are implemented over `lopdf` by [`LopdfDocument`] and [`LopdfWriter`].
//!
//! # Examples
//!
//! ```no_run
//! use linkcat::pdf::{LopdfDocument, LopdfWriter, PdfDocument, PdfWriter};
//!
//! # fn example(a: &[u8], b: &[u8]) -> linkcat::Result<()> {
//! let first = LopdfDocument::load_mem(a, "a.pdf")?;
//! println!("{} pages", first.page_count());
//!
//! let mut writer = LopdfWriter::new();
//! writer.append_pages_from(first)?;
//! writer.append_pages_from(LopdfDocument::load_mem(b, "b.pdf")?)?;
//! let merged: Vec<u8> = writer.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod writer;

#[cfg(any(test, feature = "test-util"))]
pub mod test_pdf;

pub use document::LopdfDocument;
pub use writer::LopdfWriter;

use crate::error::Result;

/// Read access to a parsed PDF.
///
/// Page numbers are 1-based and follow document order.
pub trait PdfDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text rendered on the given page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// URIs of the clickable link annotations on the given page.
    ///
    /// Annotations without a URI, or with an empty one, are omitted.
    fn page_link_annotations(&self, page: u32) -> Result<Vec<String>>;
}

/// Concatenates the pages of several documents into one.
pub trait PdfWriter {
    /// Document type this writer accepts.
    type Document: PdfDocument;

    /// Append every page of `doc`, in order, after the pages already written.
    ///
    /// Returns the number of pages appended.
    fn append_pages_from(&mut self, doc: Self::Document) -> Result<usize>;

    /// Number of pages written so far.
    fn page_count(&self) -> usize;

    /// Serialize the concatenated document.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}
