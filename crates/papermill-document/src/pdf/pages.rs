// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-level PDF operations — page counting, range extraction, and merging
// of existing PDF documents using the `lopdf` crate.

use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::{debug, info, instrument, warn};

use papermill_core::error::{PapermillError, Result};
use papermill_core::types::PageRange;

/// PDF version written for documents assembled here.
const OUTPUT_PDF_VERSION: &str = "1.5";

/// An opened PDF exposing page-level operations.
///
/// Wraps `lopdf::Document`.  Extraction and merging copy pages (and the
/// resources they reference) into a freshly-built document, so the source
/// is never mutated.
pub struct PdfPages {
    document: Document,
}

impl PdfPages {
    /// Parse a PDF from uploaded bytes.
    ///
    /// A document that cannot be parsed — truncated upload, not actually a
    /// PDF, or encrypted — is a caller problem, reported as `Pdf`.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| PapermillError::Pdf(format!("cannot parse document: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF parsed");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Extract an inclusive 1-indexed page range into a new standalone PDF.
    ///
    /// The range must already be well-formed (parse-time check); whether it
    /// fits this document is checked here and reported as `OutOfRange`.
    #[instrument(skip(self), fields(start = range.start, end = range.end))]
    pub fn extract_range(&self, range: PageRange) -> Result<Vec<u8>> {
        range.validate_against(self.page_count())?;

        let pages = self.document.get_pages();
        let mut assembled = empty_document();

        for page_number in range.start..=range.end {
            let page_id = *pages.get(&page_number).ok_or_else(|| {
                PapermillError::Pdf(format!("page {page_number} missing from page tree"))
            })?;
            copy_page(&self.document, &mut assembled, page_id)?;
        }

        info!(pages = range.len(), "page range extracted");
        serialize(assembled)
    }

    /// Merge this document with further PDFs, in the order supplied.
    ///
    /// The result contains this document's pages first, then each additional
    /// document's pages in their own order.
    #[instrument(skip_all, fields(additional = others.len()))]
    pub fn merge(&self, others: &[&[u8]]) -> Result<Vec<u8>> {
        let mut assembled = empty_document();

        append_all_pages(&self.document, &mut assembled)?;

        for (index, bytes) in others.iter().enumerate() {
            let other = Document::load_mem(bytes).map_err(|err| {
                PapermillError::Pdf(format!("cannot parse document #{}: {err}", index + 2))
            })?;
            append_all_pages(&other, &mut assembled)?;
        }

        info!(
            total_pages = assembled.get_pages().len(),
            "documents merged"
        );
        serialize(assembled)
    }
}

/// A fresh document with an empty page tree wired into its catalog, ready
/// to receive copied pages.
fn empty_document() -> Document {
    let mut doc = Document::with_version(OUTPUT_PDF_VERSION);

    let tree_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Count" => 0,
        "Kids" => Object::Array(Vec::new()),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => tree_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Serialise an assembled document to bytes.
fn serialize(mut document: Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| PapermillError::Pdf(format!("cannot serialise document: {err}")))?;
    Ok(output)
}

/// Copy every page of `source` into `target`, in page order.
fn append_all_pages(source: &Document, target: &mut Document) -> Result<()> {
    let pages = source.get_pages();
    let mut numbers: Vec<u32> = pages.keys().copied().collect();
    numbers.sort_unstable();

    for number in numbers {
        copy_page(source, target, pages[&number])?;
    }
    Ok(())
}

/// Copy one page object (with everything it references) from `source` into
/// `target` and hang it off the target's page tree as the last page.
fn copy_page(source: &Document, target: &mut Document, page_id: ObjectId) -> Result<()> {
    let page_object = source
        .get_object(page_id)
        .map_err(|err| PapermillError::Pdf(format!("cannot read page {page_id:?}: {err}")))?;

    let copied = copy_object(source, target, page_object)?;
    let copied_id = target.add_object(copied);

    let tree_id = page_tree_id(target)?;

    // Register the page under /Kids and bump /Count.
    if let Ok(Object::Dictionary(tree)) = target.get_object_mut(tree_id) {
        if let Ok(Object::Array(kids)) = tree.get_mut(b"Kids") {
            kids.push(Object::Reference(copied_id));
        }
        if let Ok(Object::Integer(count)) = tree.get_mut(b"Count") {
            *count += 1;
        }
    }

    // Point the copied page back at the target's tree.
    if let Ok(Object::Dictionary(page)) = target.get_object_mut(copied_id) {
        page.set("Parent", Object::Reference(tree_id));
    }

    Ok(())
}

/// Resolve the /Pages node of the target's catalog.
fn page_tree_id(target: &Document) -> Result<ObjectId> {
    let catalog = target
        .catalog()
        .map_err(|err| PapermillError::Pdf(format!("document has no catalog: {err}")))?;

    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        Ok(_) => Err(PapermillError::Pdf("/Pages is not a reference".into())),
        Err(err) => Err(PapermillError::Pdf(format!("catalog has no /Pages: {err}"))),
    }
}

/// Recursively copy an object graph from `source` into `target`.
///
/// References are resolved in the source and re-created in the target.  The
/// /Parent key is skipped — following it would loop back up the page tree;
/// `copy_page` re-points it at the target's tree instead.
fn copy_object(source: &Document, target: &mut Document, object: &Object) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut copied = lopdf::Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                copied.set(key.clone(), copy_object(source, target, value)?);
            }
            Ok(Object::Dictionary(copied))
        }
        Object::Array(items) => {
            let mut copied = Vec::with_capacity(items.len());
            for item in items {
                copied.push(copy_object(source, target, item)?);
            }
            Ok(Object::Array(copied))
        }
        Object::Stream(stream) => {
            let mut dict = lopdf::Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                dict.set(key.clone(), copy_object(source, target, value)?);
            }
            Ok(Object::Stream(lopdf::Stream::new(dict, stream.content.clone())))
        }
        Object::Reference(id) => match source.get_object(*id) {
            Ok(referenced) => {
                let copied = copy_object(source, target, referenced)?;
                Ok(Object::Reference(target.add_object(copied)))
            }
            Err(err) => {
                // A dangling reference in the source; drop it rather than
                // failing the whole copy.
                warn!(?id, %err, "unresolvable reference replaced with null");
                Ok(Object::Null)
            }
        },
        other => Ok(other.clone()),
    }
}
