use std::path::Path;

use async_trait::async_trait;
use image::imageops::FilterType;

use crate::bot::error::Error;
use crate::services::impersonation::detector::PhotoSimilarity;

/// Default photo comparison: 8x8 average hash over the luma channel, with
/// similarity derived from the Hamming distance. Good enough to catch a
/// copied avatar; anything fancier can be swapped in behind the trait.
pub struct AverageHashSimilarity;

#[async_trait]
impl PhotoSimilarity for AverageHashSimilarity {
    async fn compare(&self, a: &Path, b: &Path) -> Result<f32, Error> {
        let a = a.to_owned();
        let b = b.to_owned();

        // Image decode is CPU-bound; keep it off the event tasks
        tokio::task::spawn_blocking(move || {
            let hash_a = average_hash(&a)?;
            let hash_b = average_hash(&b)?;
            let distance = (hash_a ^ hash_b).count_ones();
            Ok(1.0 - distance as f32 / 64.0)
        })
        .await
        .map_err(|e| Error::custom(format!("photo hash task failed: {}", e)))?
    }
}

fn average_hash(path: &Path) -> Result<u64, Error> {
    // Avatars arrive with arbitrary extensions; sniff the real format
    let reader = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;

    let gray = reader
        .decode()?
        .resize_exact(8, 8, FilterType::Triangle)
        .to_luma8();

    let total: u32 = gray.pixels().map(|p| p.0[0] as u32).sum();
    let mean = total / 64;

    let mut hash = 0u64;
    for (i, pixel) in gray.pixels().enumerate() {
        if pixel.0[0] as u32 >= mean {
            hash |= 1 << i;
        }
    }

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{ImageBuffer, Luma};

    use super::*;

    fn write_image(name: &str, f: impl Fn(u32, u32) -> u8) -> PathBuf {
        let path = std::env::temp_dir().join(format!("warden-photo-test-{}.png", name));
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_fn(64, 64, |x, y| Luma([f(x, y)]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn identical_images_score_one() {
        let a = write_image("grad-a", |x, y| ((x * 2 + y) % 256) as u8);
        let b = write_image("grad-b", |x, y| ((x * 2 + y) % 256) as u8);

        let similarity = AverageHashSimilarity.compare(&a, &b).await.unwrap();
        assert!((similarity - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn inverted_images_score_low() {
        let a = write_image("half-a", |x, _| if x < 32 { 0 } else { 255 });
        let b = write_image("half-b", |x, _| if x < 32 { 255 } else { 0 });

        let similarity = AverageHashSimilarity.compare(&a, &b).await.unwrap();
        assert!(similarity < 0.2, "similarity was {}", similarity);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let a = write_image("exists", |_, _| 128);
        let missing = std::env::temp_dir().join("warden-photo-test-missing.png");

        assert!(AverageHashSimilarity.compare(&a, &missing).await.is_err());
    }
}
