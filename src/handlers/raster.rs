//! # Raster Image Handler
//!
//! Ricodifica PNG/JPEG con il crate `image`: decodifica e riscrittura eliminano
//! i metadata non essenziali (EXIF, chunk testuali), mantenendo formato
//! (dall'estensione) e color mode originali. Qualità fissa: 80.

use crate::error::{EngineError, EngineResult};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::io::Reader as ImageReader;
use image::{ImageEncoder, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Quality factor used for lossy re-encoding
pub const QUALITY: u8 = 80;

/// Re-encode a raster image from `input` into `output`
pub async fn optimize(input: &Path, output: &Path) -> EngineResult<String> {
    let (input, output): (PathBuf, PathBuf) = (input.to_path_buf(), output.to_path_buf());

    tokio::task::spawn_blocking(move || reencode(&input, &output))
        .await
        .map_err(|e| EngineError::Format(format!("Image worker failed: {e}")))??;

    Ok("Optimized".to_string())
}

fn reencode(input: &Path, output: &Path) -> EngineResult<()> {
    let format = ImageFormat::from_path(input)?;
    let img = ImageReader::open(input)?.with_guessed_format()?.decode()?;
    let (width, height, color) = (img.width(), img.height(), img.color());
    debug!(
        "Re-encoding {} as {:?} ({}x{}, {:?})",
        input.display(),
        format,
        width,
        height,
        color
    );

    let mut writer = BufWriter::new(File::create(output)?);
    match format {
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut writer, QUALITY)
                .write_image(img.as_bytes(), width, height, color)?;
        }
        ImageFormat::Png => {
            PngEncoder::new_with_quality(&mut writer, CompressionType::Best, FilterType::Adaptive)
                .write_image(img.as_bytes(), width, height, color)?;
        }
        other => {
            return Err(EngineError::Format(format!(
                "Unsupported image format {:?}: {}",
                other,
                input.display()
            )));
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, ImageBuffer, Rgb, Rgba};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_png_keeps_dimensions_and_mode() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.png");
        let output = temp_dir.path().join("out.png");
        ImageBuffer::from_fn(16, 8, |x, y| Rgba([x as u8 * 10, y as u8 * 20, 128, 200]))
            .save(&input)
            .unwrap();

        let message = optimize(&input, &output).await.unwrap();
        assert_eq!(message, "Optimized");

        let reloaded = image::open(&output).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (16, 8));
        assert_eq!(reloaded.color(), ColorType::Rgba8);
    }

    #[tokio::test]
    async fn test_jpeg_round_trips_as_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("photo.JPG");
        let output = temp_dir.path().join("photo.out.jpg");
        let buffer = ImageBuffer::from_fn(20, 20, |x, _| Rgb([x as u8 * 12, 40, 90]));
        buffer.save_with_format(&input, ImageFormat::Jpeg).unwrap();

        optimize(&input, &output).await.unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_unreadable_image_is_a_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.png");
        let output = temp_dir.path().join("broken.out.png");
        std::fs::write(&input, b"definitely not a png").unwrap();

        let err = optimize(&input, &output).await.unwrap_err();
        assert!(matches!(err, EngineError::Format(_)), "got {err}");
    }
}
