//! PDF Inverter Library
//!
//! Core logic for producing black/white inverted copies of PDFs. Shared
//! between the CLI, the desktop GUI and the WASM bindings.
//!
//! Every page is rasterized, pure white pixels become black and all other
//! pixels become white, and the result is embedded as a full-page image
//! into a brand new document.

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub mod error;
pub mod pixels;
pub mod source;
pub mod writer;

#[cfg(not(target_arch = "wasm32"))]
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod shell;
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use error::{InvertError, Result};
pub use pixels::PixelBuffer;
pub use source::{PageRect, PageSource, PdfSource};
pub use writer::OutputDocument;

/// Options for PDF inversion
#[derive(Debug, Clone)]
pub struct InvertOptions {
    /// Resolution pages are rasterized at
    pub dpi: f32,
    /// Compress PDF streams (reduces file size)
    pub compress_streams: bool,
}

impl Default for InvertOptions {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            compress_streams: true,
        }
    }
}

impl InvertOptions {
    fn validate(&self) -> Result<()> {
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(InvertError::InvalidDpi(self.dpi));
        }
        Ok(())
    }
}

/// One page finished. `current` counts from 1 up to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
}

/// Result of PDF inversion
#[derive(Debug, Clone, PartialEq)]
pub struct InvertResult {
    pub page_count: usize,
    pub page_sizes: Vec<PageRect>,
}

/// Rasterize, invert and re-embed every page of `source`, in page order.
///
/// `on_progress` is called once per page after it has been added to the
/// output. The first failing page aborts the run.
pub fn invert_document<S: PageSource + ?Sized>(
    source: &S,
    options: &InvertOptions,
    mut on_progress: impl FnMut(ProgressEvent),
) -> Result<(OutputDocument, InvertResult)> {
    options.validate()?;

    let total = source.page_count();
    let mut output = OutputDocument::new(options.compress_streams);
    let mut page_sizes = Vec::with_capacity(total);

    for index in 0..total {
        let rect = source.page_rect(index)?;
        let mut pixels = source.rasterize(index, options.dpi)?;

        log::debug!(
            "[Invert] Page {}/{}: {:.1}x{:.1} pt rendered to {}x{} px",
            index + 1,
            total,
            rect.width,
            rect.height,
            pixels.width(),
            pixels.height()
        );

        pixels.invert_binary();
        output.add_image_page(rect, &pixels)?;
        page_sizes.push(rect);

        on_progress(ProgressEvent {
            current: index + 1,
            total,
        });
    }

    let result = InvertResult {
        page_count: output.page_count(),
        page_sizes,
    };
    Ok((output, result))
}

/// Invert PDF from bytes and return inverted PDF bytes
pub fn invert_pdf_bytes(
    input_bytes: &[u8],
    options: &InvertOptions,
) -> Result<(Vec<u8>, InvertResult)> {
    options.validate()?;

    let source = PdfSource::from_bytes(input_bytes.to_vec())?;
    let (output, result) = invert_document(&source, options, |_| {})?;
    let output_bytes = output.save_to_bytes()?;

    Ok((output_bytes, result))
}

#[cfg(not(target_arch = "wasm32"))]
pub mod file_ops {
    use super::*;
    use std::path::Path;

    /// Invert PDF from file path to file path
    ///
    /// Nothing is written to `output_path` unless every page succeeded.
    pub fn invert_pdf_file(
        input_path: &Path,
        output_path: &Path,
        options: &InvertOptions,
        on_progress: impl FnMut(ProgressEvent),
    ) -> Result<InvertResult> {
        options.validate()?;

        let source = PdfSource::open(input_path)?;
        log::info!(
            "[Invert] {:?}: {} pages at {} DPI",
            input_path,
            source.page_count(),
            options.dpi
        );

        let (output, result) = invert_document(&source, options, on_progress)?;
        output.save(output_path)?;

        Ok(result)
    }
}
