//! Input side of an inversion run: page geometry and rasterization.
//!
//! Page boxes are read with `lopdf` (resolving inherited attributes the
//! way the page tree allows), pixels come from the `hayro` renderer.

use crate::error::{InvertError, Result};
use crate::pixels::PixelBuffer;
use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;
use std::sync::Arc;

/// PDF user space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// US Letter, used when a page tree declares no MediaBox at all.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Guards against cycles in malformed `/Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// Visible size of a page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions of this rect rendered at `dpi`.
    pub fn pixels_at(&self, dpi: f32) -> (u32, u32) {
        let scale = dpi / POINTS_PER_INCH;
        let w = (self.width * scale).round() as u32;
        let h = (self.height * scale).round() as u32;
        (w.max(1), h.max(1))
    }
}

/// Anything that can hand out pages as pixels.
///
/// Indices are 0-based and always below `page_count()`.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_rect(&self, index: usize) -> Result<PageRect>;

    /// Render one page at `dpi` into an RGB buffer.
    fn rasterize(&self, index: usize, dpi: f32) -> Result<PixelBuffer>;
}

/// A PDF loaded from disk or memory.
pub struct PdfSource {
    rects: Vec<PageRect>,
    pdf: Pdf,
}

impl PdfSource {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| InvertError::DocumentOpen(format!("{:?}: {}", path, e)))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let rects = {
            let doc = Document::load_mem(&bytes)
                .map_err(|e| InvertError::DocumentOpen(e.to_string()))?;
            doc.get_pages()
                .values()
                .map(|&page_id| page_rect(&doc, page_id))
                .collect::<Vec<_>>()
        }; // doc is dropped here

        let pdf = Pdf::new(Arc::new(bytes))
            .map_err(|e| InvertError::DocumentOpen(format!("{:?}", e)))?;

        let rendered_pages = pdf.pages().len();
        if rendered_pages != rects.len() {
            return Err(InvertError::DocumentOpen(format!(
                "Page tree mismatch: {} pages declared, {} renderable",
                rects.len(),
                rendered_pages
            )));
        }

        Ok(Self { rects, pdf })
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.rects.len()
    }

    fn page_rect(&self, index: usize) -> Result<PageRect> {
        self.rects.get(index).copied().ok_or(InvertError::Rasterization {
            page: index + 1,
            message: "No such page".to_string(),
        })
    }

    fn rasterize(&self, index: usize, dpi: f32) -> Result<PixelBuffer> {
        let raster_error = |message: String| InvertError::Rasterization {
            page: index + 1,
            message,
        };

        let page = self
            .pdf
            .pages()
            .get(index)
            .ok_or_else(|| raster_error("No such page".to_string()))?;

        let scale = dpi / POINTS_PER_INCH;
        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };

        let pixmap = hayro::render(page, &InterpreterSettings::default(), &render_settings);
        let png = pixmap.take_png();

        let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .map_err(|e| raster_error(format!("Failed to decode rendered page: {}", e)))?;

        Ok(PixelBuffer::from_image(&img))
    }
}

/// Resolve a reference to get the actual object
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        _ => Some(obj),
    }
}

/// Look up a page attribute, walking up `/Parent` for inheritable keys.
fn inherited_attribute<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }

        current = match current.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => match doc.get_object(*parent_id) {
                Ok(Object::Dictionary(parent)) => parent,
                _ => return None,
            },
            _ => return None,
        };
    }

    None
}

/// Parse a `[llx lly urx ury]` rectangle into (width, height).
fn parse_box(obj: &Object, doc: &Document) -> Option<(f32, f32)> {
    let arr = match obj {
        Object::Array(arr) if arr.len() >= 4 => arr,
        _ => return None,
    };

    let get_num = |obj: &Object| -> Option<f32> {
        match resolve(doc, obj)? {
            Object::Integer(n) => Some(*n as f32),
            Object::Real(n) => Some(*n),
            _ => None,
        }
    };

    let x0 = get_num(&arr[0])?;
    let y0 = get_num(&arr[1])?;
    let x1 = get_num(&arr[2])?;
    let y1 = get_num(&arr[3])?;

    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    if width > 0.0 && height > 0.0 {
        Some((width, height))
    } else {
        None
    }
}

/// Visible rect of a page: CropBox, else MediaBox, swapped for quarter turns.
pub(crate) fn page_rect(doc: &Document, page_id: ObjectId) -> PageRect {
    let page = match doc.get_object(page_id) {
        Ok(Object::Dictionary(d)) => d,
        _ => return PageRect::new(DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1),
    };

    let (width, height) = [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .into_iter()
        .find_map(|key| inherited_attribute(doc, page, key).and_then(|b| parse_box(b, doc)))
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let rotate = inherited_attribute(doc, page, b"Rotate")
        .and_then(|r| match r {
            Object::Integer(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(0);

    if rotate.rem_euclid(180) == 90 {
        PageRect::new(height, width)
    } else {
        PageRect::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_page(page_entries: Dictionary, parent_entries: Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page = page_entries;
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        let page_id = doc.add_object(Object::Dictionary(page));

        let mut pages = parent_entries;
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages.set("Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        (doc, page_id)
    }

    #[test]
    fn test_media_box_on_page() {
        let (doc, page_id) = doc_with_page(
            dictionary! { "MediaBox" => vec![0.into(), 0.into(), 200.into(), 300.into()] },
            Dictionary::new(),
        );
        assert_eq!(page_rect(&doc, page_id), PageRect::new(200.0, 300.0));
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let (doc, page_id) = doc_with_page(
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "CropBox" => vec![10.into(), 20.into(), 110.into(), 70.into()],
            },
            Dictionary::new(),
        );
        assert_eq!(page_rect(&doc, page_id), PageRect::new(100.0, 50.0));
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let (doc, page_id) = doc_with_page(
            Dictionary::new(),
            dictionary! { "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()] },
        );
        assert_eq!(page_rect(&doc, page_id), PageRect::new(595.0, 842.0));
    }

    #[test]
    fn test_quarter_rotation_swaps_dimensions() {
        let (doc, page_id) = doc_with_page(
            dictionary! {
                "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
                "Rotate" => 270,
            },
            Dictionary::new(),
        );
        assert_eq!(page_rect(&doc, page_id), PageRect::new(100.0, 200.0));
    }

    #[test]
    fn test_missing_box_falls_back_to_letter() {
        let (doc, page_id) = doc_with_page(Dictionary::new(), Dictionary::new());
        assert_eq!(page_rect(&doc, page_id), PageRect::new(612.0, 792.0));
    }

    #[test]
    fn test_pixels_at_100_dpi() {
        let rect = PageRect::new(72.0, 144.0);
        assert_eq!(rect.pixels_at(100.0), (100, 200));
    }

    #[test]
    fn test_garbage_is_not_a_pdf() {
        let err = PdfSource::from_bytes(b"definitely not a pdf".to_vec())
            .err()
            .expect("garbage must not open");
        assert!(matches!(err, InvertError::DocumentOpen(_)));
    }
}
