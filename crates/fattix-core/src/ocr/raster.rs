//! Page rasterization from the embedded scan images of a PDF.
//!
//! Scanned invoices carry each page as a single image XObject; rendering
//! a page means locating that image, decoding it, and upscaling it for
//! recognition. Vector-only pages cannot be rasterized this way and are
//! reported as a rendering failure.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::trace;

use super::{MIN_RENDER_SCALE, PageRasterizer};
use crate::error::OcrError;

/// Rasterizer backed by the page's embedded scan image.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedImageRasterizer;

impl PageRasterizer for EmbeddedImageRasterizer {
    fn render(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<DynamicImage, OcrError> {
        let document =
            Document::load_mem(pdf).map_err(|e| OcrError::DocumentLoad(e.to_string()))?;
        let pages = document.get_pages();
        let page_id = *pages
            .get(&page_number)
            .ok_or(OcrError::InvalidPage(page_number))?;

        let image = page_image(&document, page_id)?.ok_or_else(|| {
            OcrError::Raster(format!("no embedded scan image on page {page_number}"))
        })?;

        Ok(upscale(&image, scale))
    }
}

/// First decodable image XObject among the page's resources.
fn page_image(document: &Document, page_id: ObjectId) -> Result<Option<DynamicImage>, OcrError> {
    let Some(resources) = page_resources(document, page_id) else {
        return Ok(None);
    };

    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(None);
    };
    let Ok((_, Object::Dictionary(xobjects))) = document.dereference(xobjects) else {
        return Ok(None);
    };

    for (_name, entry) in xobjects.iter() {
        if let Ok((_, object)) = document.dereference(entry) {
            if let Some(image) = decode_image_object(document, object) {
                return Ok(Some(image));
            }
        }
    }
    Ok(None)
}

/// Resources dictionary for a page, following parent inheritance.
fn page_resources(document: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let node = document.get_object(node_id).ok()?;
    let Object::Dictionary(dict) = node else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(resources))) = document.dereference(resources) {
            return Some(resources.clone());
        }
    }

    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
        return page_resources(document, *parent_id);
    }
    None
}

fn decode_image_object(document: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;

    let subtype = dict.get(b"Subtype").ok()?;
    if subtype.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(entries) => entries.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG scan, stream content is the compressed image itself
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("unsupported image filter on scan object");
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(entries) => entries.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    raw_image(&data, width, height, color_space)
}

fn raw_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    match color_space {
        b"DeviceRGB" | b"RGB" => {
            let expected = (width * height * 3) as usize;
            if data.len() < expected {
                return None;
            }
            RgbImage::from_raw(width, height, data[..expected].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" => {
            let expected = (width * height) as usize;
            if data.len() < expected {
                return None;
            }
            GrayImage::from_raw(width, height, data[..expected].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => None,
    }
}

/// Upscale by `scale` (never below the recognition minimum).
fn upscale(image: &DynamicImage, scale: f32) -> DynamicImage {
    let scale = scale.max(MIN_RENDER_SCALE);
    let (width, height) = image.dimensions();
    let width = ((width as f32) * scale).round().max(1.0) as u32;
    let height = ((height as f32) * scale).round().max(1.0) as u32;
    DynamicImage::ImageRgba8(imageops::resize(image, width, height, FilterType::Lanczos3))
}
