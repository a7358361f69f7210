// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Format and mip-level decisions made before a layer's first upload.

use super::Error;
use crate::images::device::DeviceProfile;
use crate::image::{self, Image};
use crate::pixel_formats::{BLOCK_SIZE, PixelFormat};
use std::ops::Deref;
use std::sync::Arc;

/// The image an upload is currently working from.
pub(super) enum WorkingImage<'a> {
    Source(&'a Image),
    Derived(Arc<Image>),
}

impl Deref for WorkingImage<'_> {
    type Target = Image;

    fn deref(&self) -> &Image {
        match self {
            WorkingImage::Source(image) => image,
            WorkingImage::Derived(image) => image,
        }
    }
}

impl WorkingImage<'_> {
    pub(super) fn next_level(&self) -> Result<WorkingImage<'static>, image::Error> {
        self.deref().next_level().map(WorkingImage::Derived)
    }
}

/// Whether an image must be expanded to RGBA before it reaches `profile`'s device.
pub(super) fn needs_rgba_expansion(components: u32, use_alpha: bool, profile: DeviceProfile) -> bool {
    profile.expand_to_rgba && ((components == 1 && !use_alpha) || components == 2)
}

/// The canonical format for an uncompressed image.
pub(super) fn canonical_format(components: u32, use_alpha: bool) -> Result<PixelFormat, Error> {
    PixelFormat::for_components(components, use_alpha).ok_or(Error::Components(components))
}

/// How a compressed image is laid into a texture array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CompressedPlan {
    pub format: PixelFormat,
    /// Every level must be expanded to RGBA on the CPU.
    pub decompress: bool,
    /// Source levels discarded before level 0.
    pub skip: u32,
    pub width: u32,
    pub height: u32,
    pub levels: u32,
}

/**
The number of finest levels to drop from a compressed image.

Never more than `levels - 1`, and never so many that the retained level 0 is smaller
than one block in either axis.
*/
pub(super) fn compressed_skip(requested: u32, levels: u32, width: u32, height: u32) -> u32 {
    let mut skip = requested.min(levels.saturating_sub(1));
    while skip > 0
        && (width.checked_shr(skip).unwrap_or(0) < BLOCK_SIZE
            || height.checked_shr(skip).unwrap_or(0) < BLOCK_SIZE)
    {
        skip -= 1;
    }
    skip
}

/// Plans a compressed upload.  `native` is the device's equivalent format, if it has one.
pub(super) fn plan_compressed(
    native: Option<PixelFormat>,
    requested_skip: u32,
    levels: u32,
    width: u32,
    height: u32,
) -> CompressedPlan {
    let (format, decompress) = match native {
        Some(format) => (format, false),
        None => (PixelFormat::Rgba8, true),
    };
    let skip = compressed_skip(requested_skip, levels, width, height);
    CompressedPlan {
        format,
        decompress,
        skip,
        width: width >> skip,
        height: height >> skip,
        levels: levels.saturating_sub(skip).max(1),
    }
}
