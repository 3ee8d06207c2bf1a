//! Output side of an inversion run: a fresh PDF of full-page images.

use crate::error::{InvertError, Result};
use crate::pixels::PixelBuffer;
use crate::source::PageRect;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resource name every page uses for its single image.
const PAGE_IMAGE_NAME: &str = "Im0";

/// A PDF being assembled one image page at a time.
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    compress_streams: bool,
}

impl OutputDocument {
    pub fn new(compress_streams: bool) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            compress_streams,
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page of `rect` size with `pixels` stretched over all of it.
    pub fn add_image_page(&mut self, rect: PageRect, pixels: &PixelBuffer) -> Result<()> {
        let image = self.encode_image_stream(pixels)?;
        let image_id = self.doc.add_object(Object::Stream(image));

        let mut xobjects = Dictionary::new();
        xobjects.set(PAGE_IMAGE_NAME, Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        // Image space is the unit square; scale it up to the page.
        let content = format!(
            "q\n{} 0 0 {} 0 0 cm\n/{} Do\nQ\n",
            rect.width, rect.height, PAGE_IMAGE_NAME
        );
        let content_id = self.doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.into_bytes(),
        )));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(rect.width),
                Object::Real(rect.height),
            ]),
        );
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));

        let page_id = self.doc.add_object(Object::Dictionary(page));
        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Build an RGB image XObject, Flate-compressed when requested.
    fn encode_image_stream(&self, pixels: &PixelBuffer) -> Result<Stream> {
        let rgb_data = pixels.rgb_bytes();

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(pixels.width() as i64));
        dict.set("Height", Object::Integer(pixels.height() as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));

        if !self.compress_streams {
            return Ok(Stream::new(dict, rgb_data).with_compression(false));
        }

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
        encoder
            .write_all(&rgb_data)
            .map_err(|e| InvertError::Image(format!("Failed to compress image data: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| InvertError::Image(format!("Failed to finish compression: {}", e)))?;

        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        dict.set("Length", Object::Integer(compressed.len() as i64));

        Ok(Stream::new(dict, compressed).with_compression(false))
    }

    /// Close the page tree and catalog, returning the finished document.
    fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(self.kids));
        pages.set("Count", Object::Integer(count));
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        if self.compress_streams {
            self.doc.compress();
        }

        self.doc
    }

    /// Write the document to `path`.
    ///
    /// The bytes go to a sibling `.part` file first and are renamed into
    /// place, so `path` never holds a truncated document.
    pub fn save(self, path: &Path) -> Result<()> {
        let bytes = self.save_to_bytes()?;
        let partial = partial_path(path);

        let written = fs::write(&partial, &bytes).and_then(|()| fs::rename(&partial, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(InvertError::Save(format!("{:?}: {}", path, e)));
        }
        Ok(())
    }

    /// Serialize the document into memory.
    pub fn save_to_bytes(self) -> Result<Vec<u8>> {
        let mut doc = self.finish();
        let mut output_bytes = Vec::new();
        doc.save_to(&mut output_bytes)
            .map_err(|e| InvertError::Save(e.to_string()))?;
        Ok(output_bytes)
    }
}

/// `out.pdf` -> `out.pdf.part`, next to the final file.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_image(doc: &Document) -> Stream {
        doc.objects
            .values()
            .find_map(|obj| match obj {
                Object::Stream(s) if s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice()) => {
                    Some(s.clone())
                }
                _ => None,
            })
            .expect("output has an image")
    }

    #[test]
    fn test_pages_keep_rect_size() {
        let mut out = OutputDocument::new(true);
        let pixels = PixelBuffer::filled(10, 20, 3, 0).unwrap();
        out.add_image_page(PageRect::new(72.0, 144.0), &pixels).unwrap();
        out.add_image_page(PageRect::new(300.5, 400.25), &pixels).unwrap();
        assert_eq!(out.page_count(), 2);

        let bytes = out.save_to_bytes().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let sizes: Vec<(f32, f32)> = pages
            .values()
            .map(|&id| {
                let page = doc.get_dictionary(id).unwrap();
                let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
                (mb[2].as_float().unwrap(), mb[3].as_float().unwrap())
            })
            .collect();
        assert_eq!(sizes, vec![(72.0, 144.0), (300.5, 400.25)]);
    }

    #[test]
    fn test_image_data_survives_compression() {
        let mut out = OutputDocument::new(true);
        let pixels = PixelBuffer::new(2, 1, 3, vec![0, 0, 0, 255, 255, 255]).unwrap();
        out.add_image_page(PageRect::new(10.0, 10.0), &pixels).unwrap();

        let doc = Document::load_mem(&out.save_to_bytes().unwrap()).unwrap();
        let image = first_image(&doc);
        assert_eq!(
            image.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
            b"FlateDecode"
        );
        assert_eq!(image.decompressed_content().unwrap(), vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_uncompressed_output_stores_raw_samples() {
        let mut out = OutputDocument::new(false);
        let pixels = PixelBuffer::filled(3, 3, 3, 255).unwrap();
        out.add_image_page(PageRect::new(10.0, 10.0), &pixels).unwrap();

        let doc = Document::load_mem(&out.save_to_bytes().unwrap()).unwrap();
        let image = first_image(&doc);
        assert!(image.dict.get(b"Filter").is_err());
        assert_eq!(image.content, vec![255; 27]);
    }

    #[test]
    fn test_save_writes_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        let mut out = OutputDocument::new(true);
        out.add_image_page(PageRect::new(10.0, 10.0), &PixelBuffer::filled(2, 2, 3, 0).unwrap())
            .unwrap();
        out.save(&path).unwrap();

        assert_eq!(Document::load(&path).unwrap().get_pages().len(), 1);
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_failed_save_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail after the bytes are written.
        let path = dir.path().join("taken.pdf");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let err = OutputDocument::new(true).save(&path).unwrap_err();

        assert!(matches!(err, InvertError::Save(_)));
        assert!(path.is_dir());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_empty_document_is_still_valid() {
        let out = OutputDocument::new(true);
        let doc = Document::load_mem(&out.save_to_bytes().unwrap()).unwrap();
        assert!(doc.get_pages().is_empty());
    }
}
