//! An image-backed texture mapping

use std::path::Path;

use glam::Vec3A;

use super::{map_to_uv, Mapping, TextureInput, TextureMethod};
use crate::{
    color::{Color, VecExt},
    error::{SceneError, SceneResult},
    surface::Surface,
};

/// Side of the stand-in image, in cells.
const MISSING_CELLS: u32 = 8;

/// An image-based texture, modulating the diffuse colour.
#[derive(Debug)]
pub struct ImageMap {
    /// The image buffer used as the texture
    image: ::image::RgbImage,
    mapping: Mapping,
}

impl ImageMap {
    pub fn new(image: ::image::RgbImage, mapping: Mapping) -> Self {
        Self { image, mapping }
    }

    /// Loads the image located at `path`.
    pub fn open(path: impl AsRef<Path>, mapping: Mapping) -> SceneResult<Self> {
        let path = path.as_ref();
        let image = ::image::open(path).map_err(|source| SceneError::Image {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(image.into_rgb8(), mapping))
    }

    /// Loads the image located at `path`, falling back to a magenta and black
    /// checkerboard if it can't be read.
    pub fn open_or_missing(path: impl AsRef<Path>, mapping: Mapping) -> Self {
        Self::open(path, mapping).unwrap_or_else(|err| {
            log::warn!("{err}, using the missing texture");
            Self::new(missing_image(), mapping)
        })
    }

    /// Colour at `(u, v)`, tiling outside the unit square.
    ///
    /// `v` runs bottom to top.
    pub fn color(&self, u: f32, v: f32) -> Color {
        let u = u.rem_euclid(1.0);
        let v = 1.0 - v.rem_euclid(1.0);

        let i = (u * self.image.width() as f32) as u32;
        let j = (v * self.image.height() as f32) as u32;

        let i = i.min(self.image.width().saturating_sub(1));
        let j = j.min(self.image.height().saturating_sub(1));

        Color::from_pixel(*self.image.get_pixel(i, j))
    }
}

fn missing_image() -> ::image::RgbImage {
    ::image::RgbImage::from_fn(MISSING_CELLS, MISSING_CELLS, |x, y| {
        if (x + y) % 2 == 0 {
            ::image::Rgb([255, 0, 255])
        } else {
            ::image::Rgb([0, 0, 0])
        }
    })
}

impl TextureMethod for ImageMap {
    fn apply(&self, input: &TextureInput<'_>, norm: &mut Vec3A, surf: &mut Surface) {
        let uv = map_to_uv(&self.mapping, input.prim, input.pos, *norm, input.spaces, false);
        let color = self.color(uv.u, uv.v);
        surf.diffuse *= color;
        surf.ambient *= color;
    }
}
