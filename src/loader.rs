//! Image loading: turns encoded source buffers into RGBA bitmaps.
//!
//! Decoding is all-or-nothing. Every buffer is decoded on the tokio blocking
//! pool and the results are joined with `try_join_all`, so the first failure
//! short-circuits the join and the bitmaps decoded so far are dropped.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::try_join_all;
use image::RgbaImage;
use log::{debug, warn};
use std::sync::Arc;

/// An encoded image handed over by the collaborator.
///
/// The byte buffer is shared read-only; cloning a `SourceImage` never copies
/// the encoded data.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Build a source from a base64 payload or a `data:image/...;base64,` URL.
    ///
    /// `index` is the slot this image will occupy in the collage and is only
    /// used to report a malformed payload.
    pub fn from_base64(index: usize, payload: &str) -> Result<Self> {
        let trimmed = payload.trim();
        let encoded = match trimmed.strip_prefix("data:") {
            Some(rest) => rest
                .split_once("base64,")
                .map(|(_, data)| data)
                .ok_or_else(|| Error::ImageDecodeError {
                    index,
                    reason: "data URL is not base64 encoded".into(),
                })?,
            None => trimmed,
        };
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::ImageDecodeError {
                index,
                reason: format!("invalid base64 payload: {}", e),
            })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SourceImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

/// A decoded bitmap, index-aligned with the input sequence.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub index: usize,
    pub bitmap: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// Decode a single source image synchronously.
pub fn decode_image(index: usize, source: &SourceImage) -> Result<DecodedImage> {
    if source.is_empty() {
        return Err(Error::ImageDecodeError {
            index,
            reason: "empty buffer".into(),
        });
    }

    let bitmap = image::load_from_memory(source.as_bytes())
        .map_err(|e| Error::ImageDecodeError {
            index,
            reason: e.to_string(),
        })?
        .to_rgba8();

    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(Error::ImageDecodeError {
            index,
            reason: "image has no pixels".into(),
        });
    }

    debug!(
        "decoded image {} ({}x{}, {} bytes)",
        index,
        bitmap.width(),
        bitmap.height(),
        source.len()
    );
    Ok(DecodedImage { index, bitmap })
}

/// Decode every source in parallel and join the results.
///
/// Must be called from within a tokio runtime. Returns the bitmaps in input
/// order, or the first `ImageDecodeError` observed.
pub async fn load_images(sources: &[SourceImage]) -> Result<Vec<DecodedImage>> {
    let tasks = sources.iter().cloned().enumerate().map(|(index, source)| async move {
        tokio::task::spawn_blocking(move || decode_image(index, &source))
            .await
            .map_err(|e| Error::ImageDecodeError {
                index,
                reason: format!("decode task failed: {}", e),
            })?
    });

    try_join_all(tasks).await.map_err(|e| {
        warn!("image load aborted: {}", e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decode_image_reads_dimensions() {
        let src = SourceImage::from(png_bytes(12, 7, [1, 2, 3, 255]));
        let decoded = decode_image(0, &src).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
        assert_eq!(decoded.bitmap.get_pixel(3, 3), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn decode_image_rejects_garbage_and_empty() {
        let err = decode_image(5, &SourceImage::from(b"not an image".to_vec())).unwrap_err();
        assert_eq!(err.image_index(), Some(5));
        let err = decode_image(1, &SourceImage::from(Vec::new())).unwrap_err();
        assert_eq!(err.image_index(), Some(1));
    }

    #[test]
    fn from_base64_accepts_plain_and_data_url() {
        let bytes = png_bytes(2, 2, [9, 9, 9, 255]);
        let b64 = STANDARD.encode(&bytes);

        let plain = SourceImage::from_base64(0, &b64).unwrap();
        assert_eq!(plain.as_bytes(), &bytes[..]);

        let url = format!("data:image/png;base64,{}", b64);
        let from_url = SourceImage::from_base64(0, &url).unwrap();
        assert_eq!(from_url.as_bytes(), &bytes[..]);

        let err = SourceImage::from_base64(3, "data:image/png,raw").unwrap_err();
        assert_eq!(err.image_index(), Some(3));
        let err = SourceImage::from_base64(4, "%%%").unwrap_err();
        assert_eq!(err.image_index(), Some(4));
    }

    #[tokio::test]
    async fn load_images_preserves_order() {
        let sources: Vec<SourceImage> = (0..4u8)
            .map(|i| SourceImage::from(png_bytes(4 + i as u32, 4, [i, 0, 0, 255])))
            .collect();
        let decoded = load_images(&sources).await.unwrap();
        assert_eq!(decoded.len(), 4);
        for (i, d) in decoded.iter().enumerate() {
            assert_eq!(d.index, i);
            assert_eq!(d.width(), 4 + i as u32);
        }
    }

    #[tokio::test]
    async fn load_images_fails_fast_with_index() {
        let mut sources: Vec<SourceImage> = (0..4)
            .map(|_| SourceImage::from(png_bytes(4, 4, [0, 0, 0, 255])))
            .collect();
        sources[2] = SourceImage::from(b"broken".to_vec());
        let err = load_images(&sources).await.unwrap_err();
        assert_eq!(err.image_index(), Some(2));
    }
}
