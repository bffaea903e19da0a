//! Page rasterization (spec §4.A `render_page`).
//!
//! Scanned bank statements are, in practice, a single full-page image
//! XObject per page; this module finds it, decodes it, and re-encodes it
//! as PNG so the vision client always receives one wire format regardless
//! of the PDF's original image encoding. Digitally generated pages with no
//! image XObject fall back to a blank canvas sized to the page's media box
//! — adequate for a page-1 logo crop (the only other `render_page` caller),
//! which simply yields a low-confidence vision result and falls through to
//! the product/keyword steps of §4.B.

use image::{DynamicImage, ImageOutputFormat, RgbImage};

use super::container::Container;
use super::object::{Dict, Object};
use crate::error::Result;

const POINTS_PER_INCH: f32 = 72.0;

pub fn page_dimensions(page: &Dict) -> (f32, f32) {
    if let Some(Object::Array(arr)) = page.get("MediaBox") {
        if arr.len() == 4 {
            let vals: Vec<f32> = arr.iter().map(|o| o.as_f64().unwrap_or(0.0) as f32).collect();
            return (vals[2] - vals[0], vals[3] - vals[1]);
        }
    }
    (612.0, 792.0) // US Letter default
}

/// Render a page to PNG bytes at the requested DPI.
pub fn render_page(container: &Container, page: &Dict, dpi: f32) -> Result<Vec<u8>> {
    if let Some(raw) = largest_image_xobject(container, page)? {
        if let Ok(decoded) = image::load_from_memory(&raw) {
            return encode_png(&decoded);
        }
    }
    let (w_pt, h_pt) = page_dimensions(page);
    let w = ((w_pt / POINTS_PER_INCH) * dpi).round().max(1.0) as u32;
    let h = ((h_pt / POINTS_PER_INCH) * dpi).round().max(1.0) as u32;
    let blank = RgbImage::from_pixel(w, h, image::Rgb([255, 255, 255]));
    encode_png(&DynamicImage::ImageRgb8(blank))
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), ImageOutputFormat::Png)
        .map_err(|e| crate::error::Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    Ok(out)
}

/// Find the image XObject with the largest declared pixel area among the
/// page's resources, decode its raw stream, and return it (still in its
/// original JPEG/PNG-style encoding — `image::load_from_memory` sniffs the
/// format from the magic bytes).
fn largest_image_xobject(container: &Container, page: &Dict) -> Result<Option<Vec<u8>>> {
    let resources = match container.resolve_dict_entry(page, "Resources")? {
        Some(obj) => obj,
        None => return Ok(None),
    };
    let resources = match resources.as_dict() {
        Some(d) => d,
        None => return Ok(None),
    };
    let xobjects = match container.resolve_dict_entry(resources, "XObject")? {
        Some(obj) => obj,
        None => return Ok(None),
    };
    let xobjects = match xobjects.as_dict() {
        Some(d) => d.clone(),
        None => return Ok(None),
    };

    let mut best: Option<(i64, Vec<u8>)> = None;
    for (_, obj_ref) in xobjects.iter() {
        let resolved = container.resolve(obj_ref)?;
        let (dict, raw) = match resolved.as_stream() {
            Some(v) => v,
            None => continue,
        };
        if dict.get("Subtype").and_then(|o| o.as_name()) != Some("Image") {
            continue;
        }
        let width = dict.get("Width").and_then(|o| o.as_f64()).unwrap_or(0.0) as i64;
        let height = dict.get("Height").and_then(|o| o.as_f64()).unwrap_or(0.0) as i64;
        let area = width * height;
        let is_dct = matches!(
            dict.get("Filter"),
            Some(Object::Name(n)) if n == "DCTDecode"
        );
        let bytes = if is_dct {
            raw.to_vec()
        } else {
            container.stream_data(dict, raw).unwrap_or_default()
        };
        if bytes.is_empty() {
            continue;
        }
        if best.as_ref().map(|(a, _)| area > *a).unwrap_or(true) {
            best = Some((area, bytes));
        }
    }
    Ok(best.map(|(_, bytes)| bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_dimensions_are_us_letter() {
        let dict = Dict::new();
        assert_eq!(page_dimensions(&dict), (612.0, 792.0));
    }

    #[test]
    fn reads_mediabox_dimensions() {
        let mut dict = Dict::new();
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Int(0),
                Object::Int(0),
                Object::Int(595),
                Object::Int(842),
            ]),
        );
        assert_eq!(page_dimensions(&dict), (595.0, 842.0));
    }
}
