// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Decoded images that feed texture array layers.

An [`Image`] is either a plain 8-bit image with 1-4 channels, or a block-compressed image
carrying its own pre-built mip chain.  Uncompressed images build their mip chain lazily
with [`Image::next_level`]; each level is computed once and cached, so a background loader
can call [`Image::precalculate_levels`] and leave the GPU thread with nothing but copies.
*/

mod compressed;

pub use compressed::CompressedLevel;

use crate::pixel_formats::CompressedFormat;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("image data is {actual} bytes, expected {expected}")]
    DataSize { expected: usize, actual: usize },
    #[error("unsupported channel count {0}")]
    Components(u32),
    #[error("zero-sized image")]
    ZeroSize,
    #[error("operation requires an uncompressed image")]
    Compressed,
    #[error("compressed image has no levels")]
    NoLevels,
    #[error("destination is {actual} bytes, expected at least {expected}")]
    Destination { expected: usize, actual: usize },
    #[error("can't decode png {0}")]
    Png(#[from] png::DecodingError),
    #[error("unsupported png layout")]
    PngLayout,
}

enum Pixels {
    Raw {
        components: u32,
        data: Vec<u8>,
    },
    Compressed {
        format: CompressedFormat,
        levels: Vec<Vec<u8>>,
    },
}

/// A decoded image.
pub struct Image {
    width: u32,
    height: u32,
    pixels: Pixels,
    next: OnceLock<Arc<Image>>,
}

impl Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Image");
        s.field("width", &self.width).field("height", &self.height);
        match &self.pixels {
            Pixels::Raw { components, data } => s
                .field("components", components)
                .field("data_len", &data.len()),
            Pixels::Compressed { format, levels } => s
                .field("format", format)
                .field("levels", &levels.len()),
        };
        s.finish()
    }
}

impl Image {
    /// Creates an uncompressed image from tightly packed rows.
    pub fn from_raw(width: u32, height: u32, components: u32, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroSize);
        }
        if !(1..=4).contains(&components) {
            return Err(Error::Components(components));
        }
        let expected = width as usize * height as usize * components as usize;
        if data.len() != expected {
            return Err(Error::DataSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Image {
            width,
            height,
            pixels: Pixels::Raw { components, data },
            next: OnceLock::new(),
        })
    }

    /**
    Creates a compressed image from its mip levels, finest first.

    Each level halves the previous one (never below 1 pixel) and must hold exactly the
    block-rounded byte size for its dimensions.
    */
    pub fn from_compressed(
        width: u32,
        height: u32,
        format: CompressedFormat,
        levels: Vec<Vec<u8>>,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::ZeroSize);
        }
        if levels.is_empty() {
            return Err(Error::NoLevels);
        }
        for (i, level) in levels.iter().enumerate() {
            let (w, h) = level_extent(width, height, i as u32);
            let expected = format.pixel_format().data_size(w, h);
            if level.len() != expected {
                return Err(Error::DataSize {
                    expected,
                    actual: level.len(),
                });
            }
        }
        Ok(Image {
            width,
            height,
            pixels: Pixels::Compressed { format, levels },
            next: OnceLock::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count.  Compressed images always report 4.
    pub fn components(&self) -> u32 {
        match &self.pixels {
            Pixels::Raw { components, .. } => *components,
            Pixels::Compressed { .. } => 4,
        }
    }

    /// Pixel bytes of an uncompressed image; empty for compressed images.
    pub fn data(&self) -> &[u8] {
        match &self.pixels {
            Pixels::Raw { data, .. } => data,
            Pixels::Compressed { .. } => &[],
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.pixels, Pixels::Compressed { .. })
    }

    pub fn compressed_format(&self) -> Option<CompressedFormat> {
        match &self.pixels {
            Pixels::Compressed { format, .. } => Some(*format),
            Pixels::Raw { .. } => None,
        }
    }

    pub fn num_compressed_levels(&self) -> u32 {
        match &self.pixels {
            Pixels::Compressed { levels, .. } => levels.len() as u32,
            Pixels::Raw { .. } => 0,
        }
    }

    /// One level of a compressed image, or `None` when out of range or uncompressed.
    pub fn compressed_level(&self, index: u32) -> Option<CompressedLevel<'_>> {
        let Pixels::Compressed { format, levels } = &self.pixels else {
            return None;
        };
        let data = levels.get(index as usize)?;
        let (width, height) = level_extent(self.width, self.height, index);
        Some(CompressedLevel::new(*format, width, height, data))
    }

    /**
    The next coarser mip level of an uncompressed image, built with a 2x2 box filter.

    The level is computed on first request and shared afterwards.  A 1x1 image
    yields another 1x1 image.
    */
    pub fn next_level(&self) -> Result<Arc<Image>, Error> {
        let Pixels::Raw { components, data } = &self.pixels else {
            return Err(Error::Compressed);
        };
        if let Some(next) = self.next.get() {
            return Ok(next.clone());
        }
        let next = Arc::new(downsample(self.width, self.height, *components, data));
        //another thread may have won the race, either result is identical
        Ok(self.next.get_or_init(|| next).clone())
    }

    /// Builds and caches the whole mip chain down to 1x1.  No-op for compressed images.
    pub fn precalculate_levels(&self) {
        if self.is_compressed() {
            return;
        }
        let mut current = match self.next_level() {
            Ok(level) => level,
            Err(_) => return,
        };
        while current.width > 1 || current.height > 1 {
            current = match current.next_level() {
                Ok(level) => level,
                Err(_) => return,
            };
        }
    }

    /// Whether [`Image::next_level`] has already been computed.
    pub fn has_cached_next_level(&self) -> bool {
        self.next.get().is_some()
    }

    /// Expands an uncompressed image to 4 channels.  Luminance replicates into RGB.
    pub fn convert_to_rgba(&self) -> Result<Image, Error> {
        let Pixels::Raw { components, data } = &self.pixels else {
            return Err(Error::Compressed);
        };
        let pixels = self.width as usize * self.height as usize;
        let mut out = Vec::with_capacity(pixels * 4);
        match components {
            1 => {
                for &l in data {
                    out.extend_from_slice(&[l, l, l, 255]);
                }
            }
            2 => {
                for la in data.chunks_exact(2) {
                    out.extend_from_slice(&[la[0], la[0], la[0], la[1]]);
                }
            }
            3 => {
                for rgb in data.chunks_exact(3) {
                    out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
                }
            }
            4 => out.extend_from_slice(data),
            other => return Err(Error::Components(*other)),
        }
        Image::from_raw(self.width, self.height, 4, out)
    }
}

/// Dimensions of mip `level` for a `width` x `height` base, never below 1.
pub(crate) fn level_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let w = width.checked_shr(level).unwrap_or(0).max(1);
    let h = height.checked_shr(level).unwrap_or(0).max(1);
    (w, h)
}

fn downsample(width: u32, height: u32, components: u32, data: &[u8]) -> Image {
    let (out_w, out_h) = level_extent(width, height, 1);
    let c = components as usize;
    let src_w = width as usize;
    let mut out = vec![0u8; out_w as usize * out_h as usize * c];
    for y in 0..out_h as usize {
        let y0 = (y * 2).min(height as usize - 1);
        let y1 = (y * 2 + 1).min(height as usize - 1);
        for x in 0..out_w as usize {
            let x0 = (x * 2).min(src_w - 1);
            let x1 = (x * 2 + 1).min(src_w - 1);
            for ch in 0..c {
                let sum = data[(y0 * src_w + x0) * c + ch] as u32
                    + data[(y0 * src_w + x1) * c + ch] as u32
                    + data[(y1 * src_w + x0) * c + ch] as u32
                    + data[(y1 * src_w + x1) * c + ch] as u32;
                out[(y * out_w as usize + x) * c + ch] = (sum / 4) as u8;
            }
        }
    }
    Image {
        width: out_w,
        height: out_h,
        pixels: Pixels::Raw {
            components,
            data: out,
        },
        next: OnceLock::new(),
    }
}
