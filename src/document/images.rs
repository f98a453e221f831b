//! Image fetching and sizing
//!
//! Images are fetched through the [`ImageFetcher`] port so conversions can
//! run without network access in tests. Fetched bytes are decoded, fitted
//! into the configured bounding box and re-encoded as PNG for embedding.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::{GenericImageView, ImageFormat};
use log::debug;
use reqwest::Client;

use crate::error::ImageError;

/// Source of raw image bytes for a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError>;
}

/// Fetches `http(s)` URLs with reqwest and decodes base64 `data:` URLs inline
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpImageFetcher { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ImageError::UnsupportedScheme(scheme));
        }

        debug!("Fetching image {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Payload of a `data:<mime>;base64,<data>` URL
pub(crate) fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let rest = url.strip_prefix("data:").ok_or(ImageError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::InvalidDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(ImageError::InvalidDataUrl);
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ImageError::InvalidDataUrl)
}

/// Scale `width`×`height` down into the box, keeping the aspect ratio.
///
/// Images already inside the box keep their size. Neither side drops below 1.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width.max(1), height.max(1));
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    )
    .min(1.0);

    let fitted_width = ((width as f64 * scale).round() as u32).max(1);
    let fitted_height = ((height as f64 * scale).round() as u32).max(1);
    (fitted_width, fitted_height)
}

/// An image ready for embedding
#[derive(Debug, Clone)]
pub(crate) struct PreparedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode fetched bytes, compute the display size and re-encode as PNG
pub(crate) fn prepare(
    data: &[u8],
    max_width: u32,
    max_height: u32,
) -> Result<PreparedImage, ImageError> {
    let decoded = image::load_from_memory(data)?;
    let (natural_width, natural_height) = decoded.dimensions();
    let (width, height) = fit_within(natural_width, natural_height, max_width, max_height);

    let mut png = Vec::new();
    decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(PreparedImage { png, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut data = Vec::new();
        buffer
            .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
            .unwrap();
        data
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(1200, 400, 600, 400), (600, 200));
        assert_eq!(fit_within(300, 800, 600, 400), (150, 400));
        assert_eq!(fit_within(100, 50, 600, 400), (100, 50));
        assert_eq!(fit_within(10000, 1, 600, 400), (600, 1));
        assert_eq!(fit_within(0, 0, 600, 400), (1, 1));
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(
            decode_data_url("data:image/png;base64,aGVsbG8=").unwrap(),
            b"hello".to_vec()
        );
        assert!(decode_data_url("data:image/png,hello").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
    }

    #[test]
    fn test_prepare_scales_and_reencodes() {
        let prepared = prepare(&png_bytes(1200, 600), 600, 400).unwrap();
        assert_eq!((prepared.width, prepared.height), (600, 300));
        assert!(prepared.png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        assert!(matches!(
            prepare(b"not an image", 600, 400),
            Err(ImageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_fetcher_rejects_other_schemes() {
        let fetcher = HttpImageFetcher::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            fetcher.fetch("ftp://example.com/a.png").await,
            Err(ImageError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        let data = fetcher.fetch("data:text/plain;base64,aGk=").await.unwrap();
        assert_eq!(data, b"hi".to_vec());
    }
}
