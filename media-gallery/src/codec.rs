//! Image decoding and re-encoding.
//!
//! Decoding sniffs the container format from the leading bytes. Encoding
//! keeps JPEG as JPEG and GIF as GIF; every other tag is written as PNG so
//! that an image which decoded successfully can always be written back.

use crate::error::CodecError;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Seek, Write};

/// Detected format of a decoded image, e.g. `jpeg`, `png`, `gif`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatTag(String);

impl FormatTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().to_ascii_lowercase())
    }

    pub fn from_format(format: ImageFormat) -> Self {
        let tag = match format {
            ImageFormat::Jpeg => "jpeg".to_string(),
            ImageFormat::Png => "png".to_string(),
            ImageFormat::Gif => "gif".to_string(),
            ImageFormat::WebP => "webp".to_string(),
            ImageFormat::Bmp => "bmp".to_string(),
            other => format!("{:?}", other).to_ascii_lowercase(),
        };
        Self(tag)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Output format used when re-encoding an image carrying this tag
    pub fn output_format(&self) -> ImageFormat {
        match self.0.as_str() {
            "jpeg" | "pjpeg" => ImageFormat::Jpeg,
            "gif" => ImageFormat::Gif,
            _ => ImageFormat::Png,
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image held in memory together with the format it was decoded from
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: FormatTag,
}

/// Decodes an arbitrary byte stream into an image and its format tag
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, CodecError> {
    let format = image::guess_format(bytes)
        .map_err(|e| CodecError::Decode(format!("Unknown image format: {}", e)))?;

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CodecError::Decode(format!("Failed to decode image: {}", e)))?;

    log::debug!(
        "Decoded {:?} image {}x{}",
        format,
        image.width(),
        image.height()
    );

    Ok(DecodedImage {
        image,
        format: FormatTag::from_format(format),
    })
}

/// Writes `image` into `sink` using the output format derived from `tag`
pub fn encode<W: Write + Seek>(
    image: &DynamicImage,
    tag: &FormatTag,
    sink: &mut W,
) -> Result<(), CodecError> {
    let format = tag.output_format();

    // JPEG has no alpha channel and GIF frames are RGBA
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(sink, format),
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(sink, format),
        _ => image.write_to(sink, format),
    };

    result.map_err(|e| CodecError::Encode(format!("Failed to write {:?}: {}", format, e)))
}

/// Convenience wrapper around [`encode`] returning the encoded bytes
pub fn encode_to_vec(image: &DynamicImage, tag: &FormatTag) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Cursor::new(Vec::new());
    encode(image, tag, &mut buffer)?;
    Ok(buffer.into_inner())
}
