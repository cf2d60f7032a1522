//! Photo compression before upload
//!
//! Photos are decoded, scaled down proportionally to a maximum width and
//! re-encoded as JPEG data URLs. Compression is best-effort: anything that
//! cannot be decoded is passed through unchanged.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType};
use rdc_common::config::ImageConfig;
use rdc_common::ImagePayload;

/// Compression settings for one call site
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    pub max_width: u32,
    /// 0.0..=1.0, mapped onto JPEG quality 1..=100
    pub quality: f32,
}

impl EncodeOptions {
    pub fn new(max_width: u32, quality: f32) -> Self {
        Self { max_width, quality }
    }

    /// Settings for photos attached to a new listing
    pub fn for_create(config: &ImageConfig) -> Self {
        Self::new(config.max_width, config.create_quality)
    }

    /// Settings for photos added while editing a listing
    pub fn for_edit(config: &ImageConfig) -> Self {
        Self::new(config.max_width, config.edit_quality)
    }

    fn jpeg_quality(self) -> u8 {
        let q = if self.quality.is_finite() {
            self.quality.clamp(0.0, 1.0)
        } else {
            0.7
        };
        ((q * 100.0).round() as u8).max(1)
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::for_create(&ImageConfig::default())
    }
}

/// Wrap raw file bytes as a data URL, sniffing the MIME type from content
pub fn payload_from_bytes(bytes: &[u8]) -> ImagePayload {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    ImagePayload::from_bytes(mime, bytes)
}

/// Target size for a downscale; never upscales
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round() as u32;
    (max_width, scaled.max(1))
}

/// Compress a photo, returning the original payload if it cannot be decoded
///
/// Decoding runs on the blocking pool; callers await the finished payload.
pub async fn encode(original: ImagePayload, options: EncodeOptions) -> ImagePayload {
    let fallback = original.clone();
    match tokio::task::spawn_blocking(move || encode_blocking(&original, options)).await {
        Ok(Some(compressed)) => compressed,
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!(error = %e, "Image compression task failed, keeping original");
            fallback
        }
    }
}

/// Compress raw file bytes (convenience for file uploads)
pub async fn encode_bytes(bytes: &[u8], options: EncodeOptions) -> ImagePayload {
    encode(payload_from_bytes(bytes), options).await
}

fn encode_blocking(original: &ImagePayload, options: EncodeOptions) -> Option<ImagePayload> {
    let bytes = original.decode()?;

    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(error = %e, "Could not decode image, keeping original");
            return None;
        }
    };

    let (width, height) = scaled_dimensions(decoded.width(), decoded.height(), options.max_width);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, options.jpeg_quality());
        if let Err(e) = encoder.encode(rgb.as_bytes(), width, height, ExtendedColorType::Rgb8) {
            tracing::debug!(error = %e, "JPEG encode failed, keeping original");
            return None;
        }
    }

    tracing::debug!(
        from_bytes = bytes.len(),
        to_bytes = out.len(),
        width,
        height,
        "Compressed image"
    );

    Some(ImagePayload::from_bytes("image/jpeg", &out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn dimensions(payload: &ImagePayload) -> (u32, u32) {
        let img = image::load_from_memory(&payload.decode().unwrap()).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(1600, 900, 800), (800, 450));
        assert_eq!(scaled_dimensions(801, 3, 800), (800, 3));
        assert_eq!(scaled_dimensions(640, 480, 800), (640, 480));
        assert_eq!(scaled_dimensions(4000, 1, 800), (800, 1));
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(EncodeOptions::new(800, 0.7).jpeg_quality(), 70);
        assert_eq!(EncodeOptions::new(800, 0.0).jpeg_quality(), 1);
        assert_eq!(EncodeOptions::new(800, 3.0).jpeg_quality(), 100);
    }

    #[test]
    fn test_payload_from_bytes_sniffs_png() {
        let payload = payload_from_bytes(&png_bytes(2, 2));
        assert_eq!(payload.mime_type(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_encode_downscales_wide_images() {
        let compressed = encode_bytes(&png_bytes(1600, 900), EncodeOptions::new(800, 0.7)).await;

        assert_eq!(compressed.mime_type(), Some("image/jpeg"));
        assert_eq!(dimensions(&compressed), (800, 450));
    }

    #[tokio::test]
    async fn test_encode_never_upscales() {
        let compressed = encode_bytes(&png_bytes(320, 200), EncodeOptions::new(800, 0.6)).await;

        assert_eq!(compressed.mime_type(), Some("image/jpeg"));
        assert_eq!(dimensions(&compressed), (320, 200));
    }

    #[tokio::test]
    async fn test_corrupt_input_returns_original() {
        let original = ImagePayload::from_bytes("image/jpeg", b"definitely not a jpeg");
        let result = encode(original.clone(), EncodeOptions::default()).await;
        assert_eq!(result, original);
    }

    #[tokio::test]
    async fn test_plain_url_passes_through() {
        let original = ImagePayload::new("https://picsum.photos/800/600");
        assert_eq!(encode(original.clone(), EncodeOptions::default()).await, original);
    }
}
