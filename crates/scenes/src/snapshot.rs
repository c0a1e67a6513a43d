//! PNG output of a [`Raster`].
//!
//! This module is feature-gated behind `png` (default on) so that embedders
//! can depend on the `scenes` crate without pulling in the `image` crate.
//! The pixel conversion itself lives in [`crate::raster`] (always available).

use std::path::Path;
use warpfield_core::error::EngineError;

use crate::raster::Raster;

/// Writes the raster as an RGBA PNG.
///
/// Returns `EngineError::InvalidDimensions` if the raster dimensions overflow
/// `u32`, or `EngineError::Io` on write failure.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), EngineError> {
    let w = u32::try_from(raster.width()).map_err(|_| EngineError::InvalidDimensions)?;
    let h = u32::try_from(raster.height()).map_err(|_| EngineError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, raster.to_rgba8())
        .ok_or_else(|| EngineError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| EngineError::Io(e.to_string()))?;
    tracing::debug!(path = %path.display(), width = w, height = h, "snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use warpfield_core::color::Srgb;
    use warpfield_core::render::{DrawCommand, Layer, Paint, Shape, Surface};

    #[test]
    fn write_png_round_trip() {
        let mut raster = Raster::new(16, 12, Srgb::BLACK).unwrap();
        raster.draw(&DrawCommand {
            layer: Layer::Entities,
            paint: Paint::new(Srgb::from_u8(255, 0, 0), 1.0),
            shape: Shape::Circle {
                center: DVec2::new(8.0, 6.0),
                radius: 2.0,
            },
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        write_png(&raster, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 12);
        assert_eq!(img.get_pixel(8, 6).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn write_png_to_missing_directory_is_io_error() {
        let raster = Raster::new(4, 4, Srgb::BLACK).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/frame.png");
        assert!(matches!(write_png(&raster, &path), Err(EngineError::Io(_))));
    }
}
