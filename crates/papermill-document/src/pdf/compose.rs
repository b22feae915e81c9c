// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compose uploaded raster images into a single PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: pages are `PdfPage` structs holding
// `Vec<Op>` operation lists, serialised via `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument};

use papermill_core::error::{PapermillError, Result};

/// A4 portrait page, in millimetres.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

/// Whitespace kept around each placed image.
const MARGIN_MM: f32 = 15.0;

/// Nominal print resolution used to size images on the page.
const PLACEMENT_DPI: f32 = 150.0;

/// Builds one fixed-layout document from a batch of images.
///
/// Each image becomes one page, in upload order.  Images are normalised to
/// RGB and scaled to fit the page margins without upscaling, preserving
/// aspect ratio.
pub struct PdfComposer {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfComposer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Decode and place every image; any undecodable member fails the whole
    /// batch rather than silently dropping a page.
    #[instrument(skip_all, fields(image_count = images.len()))]
    pub fn compose(&self, images: &[Vec<u8>]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(PapermillError::InvalidInput(
                "at least one image is required".into(),
            ));
        }

        info!(images = images.len(), title = %self.title, "composing image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(images.len());

        for (index, bytes) in images.iter().enumerate() {
            let decoded = image::load_from_memory(bytes).map_err(|err| {
                PapermillError::Image(format!("cannot decode image #{}: {err}", index + 1))
            })?;

            let width = decoded.width() as usize;
            let height = decoded.height() as usize;

            // Normalise the colour model: printpdf wants plain RGB8.
            let rgb = decoded.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width,
                height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            pages.push(place_on_page(xobject_id, width, height));
            debug!(page = index + 1, width, height, "image placed");
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(output_bytes = output.len(), "image PDF serialised");
        Ok(output)
    }
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new("Papermill Document")
    }
}

/// Build a page with the image centred inside the margins, scaled to fit
/// while preserving aspect ratio (never upscaled).
fn place_on_page(xobject_id: XObjectId, width: usize, height: usize) -> PdfPage {
    let usable_w_pt = Mm(PAGE_WIDTH_MM - 2.0 * MARGIN_MM).into_pt().0;
    let usable_h_pt = Mm(PAGE_HEIGHT_MM - 2.0 * MARGIN_MM).into_pt().0;

    // Native image size at the placement DPI.
    let img_w_pt = width as f32 / PLACEMENT_DPI * 72.0;
    let img_h_pt = height as f32 / PLACEMENT_DPI * 72.0;

    let scale = (usable_w_pt / img_w_pt)
        .min(usable_h_pt / img_h_pt)
        .min(1.0);

    let margin_pt = Mm(MARGIN_MM).into_pt().0;
    let x_offset = margin_pt + (usable_w_pt - img_w_pt * scale) / 2.0;
    let y_offset = margin_pt + (usable_h_pt - img_h_pt * scale) / 2.0;

    let ops = vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(x_offset)),
            translate_y: Some(Pt(y_offset)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(PLACEMENT_DPI),
            rotate: None,
        },
    }];

    PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
}
