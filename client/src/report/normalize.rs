use crate::upload::ObjectUrl;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, Rgba, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Image reference has been revoked")]
    Revoked,
    #[error("Could not decode image: {0}")]
    Decode(ImageError),
    #[error("Could not encode image: {0}")]
    Encode(ImageError),
}

// The two shapes an image reaches the report in.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Reference(&'a ObjectUrl),
    Raster(&'a [u8]),
}

#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    pub edge: u32,
    pub quality: u8,
}

// Baseline JPEG on a square white canvas, ready to be embedded as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddableImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn normalize(source: ImageSource<'_>, canvas: Canvas) -> Result<EmbeddableImage, NormalizeError> {
    match source {
        ImageSource::Reference(url) => {
            let bytes = url.resolve().ok_or(NormalizeError::Revoked)?;
            redraw(&bytes, canvas)
        }
        ImageSource::Raster(bytes) => redraw(bytes, canvas),
    }
}

// Decode, fit inside the canvas keeping aspect ratio, flatten alpha onto white,
// re-encode.
fn redraw(bytes: &[u8], canvas: Canvas) -> Result<EmbeddableImage, NormalizeError> {
    let decoded = image::load_from_memory(bytes).map_err(NormalizeError::Decode)?;
    let edge = canvas.edge.max(1);
    let fitted = decoded.resize(edge, edge, FilterType::Triangle).to_rgba8();

    let mut surface = RgbaImage::from_pixel(edge, edge, Rgba([255, 255, 255, 255]));
    let x = (edge - fitted.width().min(edge)) / 2;
    let y = (edge - fitted.height().min(edge)) / 2;
    imageops::overlay(&mut surface, &fitted, x as i64, y as i64);
    let rgb = DynamicImage::ImageRgba8(surface).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, canvas.quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(NormalizeError::Encode)?;

    Ok(EmbeddableImage {
        jpeg,
        width: edge,
        height: edge,
    })
}
