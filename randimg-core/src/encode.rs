// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! PNG output

use crate::{buffer::RandomBuffer, Error, Result, IMG_DIM};
use image::{ImageFormat, RgbImage};
use std::path::Path;
use tracing::info;

/// View the buffer as an RGB image, row `r` becoming image line `y = r`
pub fn to_rgb_image(buffer: &RandomBuffer) -> Result<RgbImage> {
    RgbImage::from_raw(IMG_DIM as u32, IMG_DIM as u32, buffer.as_flat().to_vec())
        .ok_or_else(|| Error::Image("buffer does not match image dimensions".to_string()))
}

/// Encode the buffer as a PNG file at `path`
pub fn write_png(buffer: &RandomBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let image = to_rgb_image(buffer)?;
    image.save_with_format(path, ImageFormat::Png)?;

    info!("Wrote {}x{} image to {}", IMG_DIM, IMG_DIM, path.display());
    Ok(())
}
