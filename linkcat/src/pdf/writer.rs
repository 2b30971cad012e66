//! Page-for-page concatenation backed by `lopdf`.

use lopdf::{Document, Object, ObjectId};

use crate::error::{LinkCatError, Result};
use crate::pdf::{LopdfDocument, PdfWriter};

/// Concatenates `lopdf` documents in append order.
///
/// The first appended document becomes the base. Every following document is
/// renumbered above the base's highest object id and its objects are moved
/// across without its catalog. Its root page tree node becomes the last kid
/// of the base's root page tree node.
#[derive(Debug, Default)]
pub struct LopdfWriter {
    merged: Option<Document>,
    skip_compression: bool,
}

impl LopdfWriter {
    /// Create a writer that compresses streams on [`PdfWriter::finish`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer that leaves streams uncompressed.
    pub fn without_compression() -> Self {
        Self {
            merged: None,
            skip_compression: true,
        }
    }

    /// Ids of a document's catalog and of its root page tree node.
    fn page_tree_root(doc: &Document) -> Result<(ObjectId, ObjectId)> {
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|e| LinkCatError::merge_failed(format!("Failed to get catalog: {e}")))?;

        let pages_id = doc
            .get_dictionary(catalog_id)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|e| {
                LinkCatError::merge_failed(format!("Failed to get pages reference: {e}"))
            })?;

        Ok((catalog_id, pages_id))
    }

    /// Hang an appended page tree under the merged document's root page tree
    /// node, as its last kid.
    ///
    /// The subtree keeps its own node, so attributes its pages inherit from it
    /// (`Resources`, `MediaBox`, ...) still apply.
    fn graft_page_tree(
        merged: &mut Document,
        subtree_id: ObjectId,
        page_count: usize,
    ) -> Result<()> {
        let (_, root_id) = Self::page_tree_root(merged)?;

        let subtree = merged
            .get_object_mut(subtree_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| LinkCatError::merge_failed(format!("Failed to get pages object: {e}")))?;
        subtree.set("Parent", root_id);

        let root = merged
            .get_object_mut(root_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| LinkCatError::merge_failed(format!("Failed to get pages object: {e}")))?;

        let kids = root
            .get_mut(b"Kids")
            .and_then(Object::as_array_mut)
            .map_err(|_| LinkCatError::merge_failed("Pages dictionary missing Kids array"))?;
        kids.push(Object::Reference(subtree_id));

        let current_count = root.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        root.set("Count", Object::Integer(current_count + page_count as i64));

        Ok(())
    }
}

impl PdfWriter for LopdfWriter {
    type Document = LopdfDocument;

    fn append_pages_from(&mut self, doc: LopdfDocument) -> Result<usize> {
        let mut doc = doc.into_inner();

        let Some(merged) = self.merged.as_mut() else {
            let page_count = doc.get_pages().len();
            self.merged = Some(doc);
            return Ok(page_count);
        };

        // Avoid object id collisions by renumbering the incoming document
        doc.renumber_objects_with(merged.max_id + 1);
        merged.max_id = doc.max_id;

        let page_count = doc.get_pages().len();
        let (catalog_id, pages_id) = Self::page_tree_root(&doc)?;

        // Only the base document's catalog survives.
        doc.objects.remove(&catalog_id);
        merged.objects.extend(doc.objects);
        Self::graft_page_tree(merged, pages_id, page_count)?;

        Ok(page_count)
    }

    fn page_count(&self) -> usize {
        self.merged
            .as_ref()
            .map_or(0, |merged| merged.get_pages().len())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut merged = self.merged.ok_or(LinkCatError::NoAssetsToMerge)?;

        // Drop what only the removed catalogs referenced (outlines, names, ...).
        merged.prune_objects();
        if !self.skip_compression {
            merged.compress();
        }
        merged.renumber_objects();

        let mut buffer = Vec::new();
        merged
            .save_to(&mut buffer)
            .map_err(|e| LinkCatError::merge_failed(format!("Failed to serialize PDF: {e}")))?;

        Ok(buffer)
    }
}
