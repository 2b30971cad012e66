//! In-memory PDF fixtures for tests.
//!
//! Compiled for this crate's unit tests and, behind the `test-util` feature,
//! for downstream test suites.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// How a page's lines are laid out in its content stream.
#[derive(Debug, Default, Clone, Copy)]
enum LineLayout {
    /// One `BT`/`ET` block per line.
    #[default]
    Blocks,
    /// One block; lines separated by `Td`.
    Moved,
    /// One block; lines after the first shown with `'`.
    Quoted,
}

#[derive(Debug, Default)]
struct PageSpec {
    lines: Vec<String>,
    links: Vec<String>,
    layout: LineLayout,
}

/// Builds small but valid PDFs with text lines and `/Link` annotations.
#[derive(Debug, Default)]
pub struct TestPdf {
    pages: Vec<PageSpec>,
    unused_cid_font: bool,
}

impl TestPdf {
    /// Start an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` pages without content.
    pub fn blank_pages(mut self, count: usize) -> Self {
        self.pages
            .extend((0..count).map(|_| PageSpec::default()));
        self
    }

    /// Append a page drawing each line as text.
    pub fn text_page(self, lines: &[&str]) -> Self {
        self.linked_page(lines, &[])
    }

    /// Append a page with text lines and one `/Link` annotation per URI.
    pub fn linked_page(mut self, lines: &[&str], links: &[&str]) -> Self {
        self.pages.push(PageSpec {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            links: links.iter().map(|link| link.to_string()).collect(),
            layout: LineLayout::Blocks,
        });
        self
    }

    /// Append a page drawing all lines in one text object, moving down with
    /// `Td` between them.
    pub fn text_block_page(mut self, lines: &[&str]) -> Self {
        self.pages.push(PageSpec {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            layout: LineLayout::Moved,
            ..PageSpec::default()
        });
        self
    }

    /// Append a page drawing all lines in one text object, showing every line
    /// after the first with the `'` operator.
    pub fn quoted_text_page(mut self, lines: &[&str]) -> Self {
        self.pages.push(PageSpec {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            layout: LineLayout::Quoted,
            ..PageSpec::default()
        });
        self
    }

    /// Also list an `Identity-H` Type0 font without a `ToUnicode` map in the
    /// shared resources. No page draws with it.
    pub fn with_unused_cid_font(mut self) -> Self {
        self.unused_cid_font = true;
        self
    }

    /// Serialize the document.
    ///
    /// # Panics
    ///
    /// Panics if lopdf fails to encode or save the document.
    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let mut fonts = dictionary! { "F1" => font_id };
        if self.unused_cid_font {
            let cid_font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "NotoSansCJK",
                "Encoding" => "Identity-H",
            });
            fonts.set("F2", cid_font_id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let mut kids: Vec<Object> = Vec::new();
        for page in &self.pages {
            let operations = page_operations(page);
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));

            let annots: Vec<Object> = page
                .links
                .iter()
                .map(|uri| {
                    doc.add_object(dictionary! {
                        "Type" => "Annot",
                        "Subtype" => "Link",
                        "Rect" => vec![72.into(), 700.into(), 300.into(), 720.into()],
                        "A" => dictionary! {
                            "S" => "URI",
                            "URI" => Object::string_literal(uri.as_str()),
                        },
                    })
                    .into()
                })
                .collect();

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            };
            if !annots.is_empty() {
                page_dict.set("Annots", annots);
            }

            kids.push(doc.add_object(page_dict).into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

fn page_operations(page: &PageSpec) -> Vec<Operation> {
    let show = |line: &String| vec![Object::string_literal(line.as_str())];
    let mut operations = Vec::new();

    match page.layout {
        LineLayout::Blocks => {
            for (idx, line) in page.lines.iter().enumerate() {
                let y = 750 - 20 * idx as i64;
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), y.into()]));
                operations.push(Operation::new("Tj", show(line)));
                operations.push(Operation::new("ET", vec![]));
            }
        }
        LineLayout::Moved | LineLayout::Quoted => {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("TL", vec![14.into()]));
            operations.push(Operation::new("Td", vec![72.into(), 750.into()]));
            for (idx, line) in page.lines.iter().enumerate() {
                match page.layout {
                    _ if idx == 0 => operations.push(Operation::new("Tj", show(line))),
                    LineLayout::Quoted => operations.push(Operation::new("'", show(line))),
                    _ => {
                        operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
                        operations.push(Operation::new("Tj", show(line)));
                    }
                }
            }
            operations.push(Operation::new("ET", vec![]));
        }
    }

    operations
}
