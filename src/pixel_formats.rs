// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel format definitions for GPU texture arrays.
//!
//! Every texture array stores exactly one [`PixelFormat`] shared by all of its layers.
//! The format encodes:
//!
//! - Number of channels (alpha, luminance, luminance-alpha, RGB, RGBA)
//! - Data type per channel (8-bit unorm, 32-bit float)
//! - Whether the data is stored in 4x4 compressed blocks
//!
//! # Design Philosophy
//!
//! Pixel formats are a runtime enum rather than zero-sized types.  A texture array
//! does not know its format until its first layer has been decoded and negotiated
//! against what the GPU supports, so the format has to be a value.
//!
//! # Available Formats
//!
//! ## Uncompressed
//! - [`PixelFormat::Alpha8`], [`PixelFormat::Luminance8`] - one 8-bit channel
//! - [`PixelFormat::LuminanceAlpha8`] - two 8-bit channels
//! - [`PixelFormat::Rgb8`], [`PixelFormat::Rgba8`] - three or four 8-bit channels
//! - [`PixelFormat::R32Float`], [`PixelFormat::Rgba32Float`] - float render targets
//!
//! ## Block compressed
//! - [`PixelFormat::Dxt1`] (BC1), [`PixelFormat::Dxt3`] (BC2), [`PixelFormat::Dxt5`] (BC3)
//! - [`PixelFormat::Etc1`]
//!
//! # Examples
//!
//! ```
//! use layered_texture::pixel_formats::PixelFormat;
//!
//! assert_eq!(PixelFormat::Rgba8.data_size(4, 4), 64);
//! // 8 bytes per 4x4 block, a 5x5 image still occupies 2x2 blocks
//! assert_eq!(PixelFormat::Dxt1.data_size(5, 5), 32);
//! ```

pub(crate) mod png_support;

/// Side length in pixels of a compressed block.
pub const BLOCK_SIZE: u32 = 4;

/// The storage format of a texture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One 8-bit channel, sampled as alpha.
    Alpha8,
    /// One 8-bit channel, sampled as luminance.
    Luminance8,
    /// Two 8-bit channels, luminance then alpha.
    LuminanceAlpha8,
    /// Three 8-bit channels.
    Rgb8,
    /// Four 8-bit channels.
    Rgba8,
    /// One 32-bit float channel.
    R32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// BC1, 8 bytes per block.
    Dxt1,
    /// BC2, 16 bytes per block.
    Dxt3,
    /// BC3, 16 bytes per block.
    Dxt5,
    /// ETC1, 8 bytes per block.
    Etc1,
}

impl PixelFormat {
    /// The canonical 8-bit format for an uncompressed image with `components` channels.
    ///
    /// One channel maps to alpha when `use_alpha` is set and to luminance otherwise.
    /// Returns `None` for any channel count outside 1..=4.
    pub const fn for_components(components: u32, use_alpha: bool) -> Option<PixelFormat> {
        match components {
            1 if use_alpha => Some(PixelFormat::Alpha8),
            1 => Some(PixelFormat::Luminance8),
            2 => Some(PixelFormat::LuminanceAlpha8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub const fn is_compressed(&self) -> bool {
        matches!(
            self,
            PixelFormat::Dxt1 | PixelFormat::Dxt3 | PixelFormat::Dxt5 | PixelFormat::Etc1
        )
    }

    /// Bytes per pixel for uncompressed formats, bytes per 4x4 block for compressed ones.
    pub const fn unit_bytes(&self) -> u32 {
        match self {
            PixelFormat::Alpha8 | PixelFormat::Luminance8 => 1,
            PixelFormat::LuminanceAlpha8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::R32Float => 4,
            PixelFormat::Rgba32Float => 16,
            PixelFormat::Dxt1 | PixelFormat::Etc1 => 8,
            PixelFormat::Dxt3 | PixelFormat::Dxt5 => 16,
        }
    }

    /// Number of bytes in one row of pixels (uncompressed) or one row of blocks (compressed).
    pub const fn row_data_size(&self, width: u32) -> usize {
        if self.is_compressed() {
            width.div_ceil(BLOCK_SIZE) as usize * self.unit_bytes() as usize
        } else {
            width as usize * self.unit_bytes() as usize
        }
    }

    /// Number of rows needed to store `height` pixels.
    pub const fn rows(&self, height: u32) -> u32 {
        if self.is_compressed() {
            height.div_ceil(BLOCK_SIZE)
        } else {
            height
        }
    }

    /// Byte size of a `width` x `height` region of a single layer.
    pub const fn data_size(&self, width: u32, height: u32) -> usize {
        self.row_data_size(width) * self.rows(height) as usize
    }

    /// Whether the format has an sRGB-encoded variant on the GPU.
    pub const fn has_srgb_variant(&self) -> bool {
        matches!(
            self,
            PixelFormat::Rgba8 | PixelFormat::Dxt1 | PixelFormat::Dxt3 | PixelFormat::Dxt5
        )
    }
}

/// The native encoding of a block-compressed image as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    Dxt1,
    Dxt3,
    Dxt5,
    Etc1,
}

impl CompressedFormat {
    /// The GPU format with identical block layout.
    pub const fn pixel_format(&self) -> PixelFormat {
        match self {
            CompressedFormat::Dxt1 => PixelFormat::Dxt1,
            CompressedFormat::Dxt3 => PixelFormat::Dxt3,
            CompressedFormat::Dxt5 => PixelFormat::Dxt5,
            CompressedFormat::Etc1 => PixelFormat::Etc1,
        }
    }

    pub const fn block_bytes(&self) -> u32 {
        self.pixel_format().unit_bytes()
    }
}
