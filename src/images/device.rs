// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The graphics device seam.

A texture array never talks to a graphics API directly.  Every GPU-touching operation goes
through [`GraphicsDevice`], which is implemented by the backends in this crate
(a host-memory device and, with `backend_wgpu`, a wgpu device) and can be implemented by
an embedding engine.

The interface is shaped like a classic bind-to-update API: a texture object is a bare
handle, it is bound for update before uploads and unbound afterwards, and level storage
is reserved separately from filling it.
*/

use crate::bindings::sampler::TextureParameters;
use crate::imp;
use crate::pixel_formats::{CompressedFormat, PixelFormat};
use std::fmt::Debug;

/// An opaque device-side texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureObject(u64);

impl TextureObject {
    pub const fn new(raw: u64) -> Self {
        TextureObject(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Capabilities of the device that affect how images are converted before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Luminance and luminance-alpha images must be expanded to RGBA.
    pub expand_to_rgba: bool,
    /// Number of texture units that may hold a bound texture.
    pub texture_units: u32,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        DeviceProfile {
            expand_to_rgba: false,
            texture_units: 16,
        }
    }
}

/// Storage extent of one mip level across every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelExtent {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// A rectangle of one layer of one mip level.
///
/// For compressed formats `x` and `y` are block aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub layer: u32,
    pub width: u32,
    pub height: u32,
}

/**
A graphics device able to hold 2D texture arrays.

Implementations are shared between resources as `Arc<dyn GraphicsDevice>` and must guard
their own state.  Callers check [`GraphicsDevice::is_device_lost`] before issuing any other
call; implementations may reject calls made while lost.
*/
pub trait GraphicsDevice: Send + Sync + Debug {
    fn is_device_lost(&self) -> bool;

    fn profile(&self) -> DeviceProfile;

    /// The native format for `format`, or `None` when the device must receive decompressed RGBA.
    fn map_compressed_format(&self, format: CompressedFormat) -> Option<PixelFormat>;

    /// Creates a new, empty texture object.
    fn generate_texture(&self) -> Result<TextureObject, imp::Error>;

    fn delete_texture(&self, texture: TextureObject);

    /// Binds `texture` to unit 0 so subsequent calls may modify it.
    fn bind_for_update(&self, texture: TextureObject);

    /// The texture currently bound to `unit`.
    fn texture_at(&self, unit: u32) -> Option<TextureObject>;

    fn unbind(&self, unit: u32);

    /// Reserves uninitialized storage for one uncompressed level of every layer.
    fn allocate_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), imp::Error>;

    /// Writes tightly packed pixels into one rectangle of one layer.
    fn update_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), imp::Error>;

    /// Reserves uninitialized storage for one compressed level of every layer.
    fn allocate_compressed_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), imp::Error>;

    /// Writes compressed blocks into one block-aligned rectangle of one layer.
    fn update_compressed_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), imp::Error>;

    /// Reads back one whole level, every layer concatenated, into `dest`.
    fn read_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        dest: &mut [u8],
    ) -> Result<(), imp::Error>;

    /// Restricts sampling to levels `base..=max`.
    fn set_mip_range(&self, texture: TextureObject, base: u32, max: u32);

    fn apply_parameters(&self, texture: TextureObject, parameters: &TextureParameters, levels: u32);
}
