// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A [`GraphicsDevice`] backed by wgpu.

wgpu textures are immutable in shape, while the device interface reserves one level at a
time.  [`WgpuDevice`] bridges the two by recording the level-0 extent, the format and the
mip range as they arrive, and creating the `wgpu::Texture` with a full mip chain the first
time a texel is written or read.  Reserving level 0 again with the same shape keeps the
existing texture and its contents.

Formats without a wgpu equivalent are widened: RGB is stored as RGBA with opaque alpha and
narrowed again on readback.  ETC1 data is uploaded as ETC2 RGB8, which decodes it
identically.
*/

use crate::bindings::sampler::{AddressMode, FilterMode, TextureCoordinate, TextureParameters};
use crate::image::level_extent;
use crate::images::device::{DeviceProfile, GraphicsDevice, LevelExtent, Region, TextureObject};
use crate::imp::Error;
use crate::pixel_formats::{BLOCK_SIZE, CompressedFormat, PixelFormat};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_safe_mutex::Mutex;

const DEFAULT_ANISOTROPY: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    format: PixelFormat,
    srgb: bool,
    width: u32,
    height: u32,
    layers: u32,
}

#[derive(Debug, Default)]
struct Slot {
    shape: Option<Shape>,
    mip_range: (u32, u32),
    texture: Option<wgpu::Texture>,
    sampler: Option<wgpu::Sampler>,
}

impl Slot {
    fn full_mip_count(shape: &Shape) -> u32 {
        shape.width.max(shape.height).max(1).ilog2() + 1
    }

    fn mip_count(&self) -> u32 {
        match &self.shape {
            Some(shape) => (self.mip_range.1 + 1).min(Self::full_mip_count(shape)),
            None => 1,
        }
    }

    /// Mip count a texture needs to hold `level`.  Levels past the full chain don't exist.
    fn mip_count_for(&self, level: u32) -> Result<u32, Error> {
        let shape = self.shape.ok_or(Error::LevelNotAllocated(level))?;
        if level >= Self::full_mip_count(&shape) {
            return Err(Error::Region);
        }
        Ok(self.mip_count().max(level + 1))
    }

    fn forget_texture(&mut self) {
        if let Some(texture) = self.texture.take() {
            texture.destroy();
        }
    }
}

#[derive(Debug)]
struct State {
    next_id: u64,
    textures: HashMap<u64, Slot>,
    units: Vec<Option<TextureObject>>,
}

impl State {
    fn slot_mut(&mut self, texture: TextureObject) -> Result<&mut Slot, Error> {
        self.textures
            .get_mut(&texture.raw())
            .ok_or(Error::NoSuchTexture(texture.raw()))
    }
}

fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Backend(Box::new(err))
}

/// The wgpu format holding `format`, if the device has one.
fn texture_format(format: PixelFormat, srgb: bool, features: wgpu::Features) -> Result<wgpu::TextureFormat, Error> {
    use wgpu::TextureFormat as T;
    let bc = features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC);
    let etc = features.contains(wgpu::Features::TEXTURE_COMPRESSION_ETC2);
    Ok(match (format, srgb) {
        (PixelFormat::Alpha8 | PixelFormat::Luminance8, _) => T::R8Unorm,
        (PixelFormat::LuminanceAlpha8, _) => T::Rg8Unorm,
        (PixelFormat::Rgb8, _) => T::Rgba8Unorm,
        (PixelFormat::Rgba8, false) => T::Rgba8Unorm,
        (PixelFormat::Rgba8, true) => T::Rgba8UnormSrgb,
        (PixelFormat::R32Float, _) => T::R32Float,
        (PixelFormat::Rgba32Float, _) => T::Rgba32Float,
        (PixelFormat::Dxt1, false) if bc => T::Bc1RgbaUnorm,
        (PixelFormat::Dxt1, true) if bc => T::Bc1RgbaUnormSrgb,
        (PixelFormat::Dxt3, false) if bc => T::Bc2RgbaUnorm,
        (PixelFormat::Dxt3, true) if bc => T::Bc2RgbaUnormSrgb,
        (PixelFormat::Dxt5, false) if bc => T::Bc3RgbaUnorm,
        (PixelFormat::Dxt5, true) if bc => T::Bc3RgbaUnormSrgb,
        (PixelFormat::Etc1, _) if etc => T::Etc2Rgb8Unorm,
        (format, _) => return Err(Error::UnsupportedFormat(format)),
    })
}

/// Bytes per row of `width` texels as stored by wgpu.
fn stored_row_size(format: PixelFormat, width: u32) -> u32 {
    match format {
        PixelFormat::Rgb8 => width * 4,
        other => other.row_data_size(width) as u32,
    }
}

fn widen_rgb(data: &[u8]) -> Vec<u8> {
    let mut wide = Vec::with_capacity(data.len() / 3 * 4);
    for pixel in data.chunks_exact(3) {
        wide.extend_from_slice(pixel);
        wide.push(255);
    }
    wide
}

fn block_round(value: u32) -> u32 {
    value.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

fn filter(mode: FilterMode) -> (wgpu::FilterMode, wgpu::FilterMode, wgpu::FilterMode) {
    use wgpu::FilterMode::{Linear, Nearest};
    match mode {
        FilterMode::Nearest | FilterMode::NearestAnisotropic => (Nearest, Nearest, Nearest),
        FilterMode::Bilinear => (Linear, Linear, Nearest),
        FilterMode::Trilinear | FilterMode::Anisotropic | FilterMode::Default => (Linear, Linear, Linear),
    }
}

fn address(mode: AddressMode, features: wgpu::Features) -> wgpu::AddressMode {
    match mode {
        AddressMode::Wrap => wgpu::AddressMode::Repeat,
        AddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
        AddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        AddressMode::Border if features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER) => {
            wgpu::AddressMode::ClampToBorder
        }
        AddressMode::Border => wgpu::AddressMode::ClampToEdge,
    }
}

/// wgpu only offers three border colors; pick the nearest.
fn border_color(color: [f32; 4]) -> wgpu::SamplerBorderColor {
    if color[3] < 0.5 {
        wgpu::SamplerBorderColor::TransparentBlack
    } else if color[0] + color[1] + color[2] < 1.5 {
        wgpu::SamplerBorderColor::OpaqueBlack
    } else {
        wgpu::SamplerBorderColor::OpaqueWhite
    }
}

/**
A wgpu-backed graphics device.

Loss is reported by wgpu through the device-lost callback; once lost, the device stays lost.
A caller recovering from loss creates a new `WgpuDevice` and hands it to new texture arrays.
*/
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    features: wgpu::Features,
    lost: Arc<AtomicBool>,
    state: Mutex<State>,
}

impl WgpuDevice {
    /**
    Requests an adapter without a surface and opens a device on it.

    Compressed texture support and clamp-to-border addressing are enabled when the adapter
    has them.
    */
    pub async fn new_headless() -> Result<WgpuDevice, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = instance.request_adapter(&options).await.map_err(backend)?;
        let wanted = wgpu::Features::TEXTURE_COMPRESSION_BC
            | wgpu::Features::TEXTURE_COMPRESSION_ETC2
            | wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER;
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("layered_texture device"),
            required_features: adapter.features() & wanted,
            required_limits: adapter.limits(),
            ..Default::default()
        };
        let (device, queue) = adapter.request_device(&descriptor).await.map_err(backend)?;
        Ok(Self::from_device(device, queue))
    }

    /// Wraps a device opened elsewhere.
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> WgpuDevice {
        let lost = Arc::new(AtomicBool::new(false));
        let move_lost = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            move_lost.store(true, Ordering::Release);
            logwise::error_sync!(
                "wgpu device lost ({reason}): {message}",
                reason = logwise::privacy::LogIt(&reason),
                message = logwise::privacy::LogIt(&message)
            );
        });
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            logwise::error_sync!("wgpu error {err}", err = logwise::privacy::LogIt(&err));
        }));
        let units = device.limits().max_sampled_textures_per_shader_stage.max(1);
        WgpuDevice {
            features: device.features(),
            device,
            queue,
            lost,
            state: Mutex::new(State {
                next_id: 1,
                textures: HashMap::new(),
                units: vec![None; units as usize],
            }),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// A 2D-array view of `texture` restricted to its mip range, once it holds data.
    pub fn view(&self, texture: TextureObject) -> Option<wgpu::TextureView> {
        let state = self.state.lock_sync();
        let slot = state.textures.get(&texture.raw())?;
        let wgpu_texture = slot.texture.as_ref()?;
        let base = slot.mip_range.0.min(wgpu_texture.mip_level_count() - 1);
        let count = wgpu_texture.mip_level_count() - base;
        Some(wgpu_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("layered_texture view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            base_mip_level: base,
            mip_level_count: Some(count),
            ..Default::default()
        }))
    }

    /// The sampler built by the last parameter update.
    pub fn sampler(&self, texture: TextureObject) -> Option<wgpu::Sampler> {
        self.state.lock_sync().textures.get(&texture.raw())?.sampler.clone()
    }

    /// Returns the texture for `slot`, creating it from the recorded shape if needed.
    fn ensure_texture(&self, slot: &mut Slot, level: u32) -> Result<wgpu::Texture, Error> {
        let shape = slot.shape.ok_or(Error::LevelNotAllocated(level))?;
        let mip_count = slot.mip_count_for(level)?;
        if let Some(texture) = &slot.texture {
            if texture.mip_level_count() >= mip_count {
                return Ok(texture.clone());
            }
            logwise::warn_sync!(
                "recreating texture for {levels} levels, contents are discarded",
                levels = mip_count
            );
            slot.forget_texture();
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("layered_texture array"),
            size: wgpu::Extent3d {
                width: shape.width,
                height: shape.height,
                depth_or_array_layers: shape.layers,
            },
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(shape.format, shape.srgb, self.features)?,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        slot.texture = Some(texture.clone());
        Ok(texture)
    }

    fn allocate(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), Error> {
        if self.lost.load(Ordering::Acquire) {
            return Err(Error::DeviceLost);
        }
        texture_format(format, srgb, self.features)?;
        let mut state = self.state.lock_sync();
        let slot = state.slot_mut(texture)?;
        if level == 0 {
            let shape = Shape {
                format,
                srgb,
                width: extent.width,
                height: extent.height,
                layers: extent.layers,
            };
            if slot.shape != Some(shape) {
                slot.forget_texture();
                slot.shape = Some(shape);
            }
            return Ok(());
        }
        let shape = slot.shape.ok_or(Error::LevelNotAllocated(0))?;
        let (width, height) = level_extent(shape.width, shape.height, level);
        if shape.format != format
            || shape.srgb != srgb
            || extent.width != width
            || extent.height != height
            || extent.layers != shape.layers
        {
            return Err(Error::Region);
        }
        slot.mip_range.1 = slot.mip_range.1.max(level);
        Ok(())
    }

    fn write(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        if self.lost.load(Ordering::Acquire) {
            return Err(Error::DeviceLost);
        }
        let wgpu_texture = {
            let mut state = self.state.lock_sync();
            let slot = state.slot_mut(texture)?;
            let shape = slot.shape.ok_or(Error::LevelNotAllocated(level))?;
            if shape.format != format || shape.srgb != srgb {
                return Err(Error::UnsupportedFormat(format));
            }
            let (width, height) = level_extent(shape.width, shape.height, level);
            if region.layer >= shape.layers
                || region.x + region.width > width
                || region.y + region.height > height
            {
                return Err(Error::Region);
            }
            self.ensure_texture(slot, level)?
        };
        let rows = format.rows(region.height);
        let expected = format.row_data_size(region.width) * rows as usize;
        if data.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let widened;
        let bytes = if format == PixelFormat::Rgb8 {
            widened = widen_rgb(&data[..expected]);
            &widened[..]
        } else {
            &data[..expected]
        };
        let (copy_width, copy_height) = if format.is_compressed() {
            (block_round(region.width), block_round(region.height))
        } else {
            (region.width, region.height)
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &wgpu_texture,
                mip_level: level,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: region.layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stored_row_size(format, region.width)),
                rows_per_image: Some(rows),
            },
            wgpu::Extent3d {
                width: copy_width,
                height: copy_height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}

impl GraphicsDevice for WgpuDevice {
    fn is_device_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn profile(&self) -> DeviceProfile {
        DeviceProfile {
            expand_to_rgba: false,
            texture_units: self.state.lock_sync().units.len() as u32,
        }
    }

    fn map_compressed_format(&self, format: CompressedFormat) -> Option<PixelFormat> {
        let pixel_format = format.pixel_format();
        texture_format(pixel_format, false, self.features)
            .ok()
            .map(|_| pixel_format)
    }

    fn generate_texture(&self) -> Result<TextureObject, Error> {
        if self.lost.load(Ordering::Acquire) {
            return Err(Error::DeviceLost);
        }
        let mut state = self.state.lock_sync();
        let id = state.next_id;
        state.next_id += 1;
        state.textures.insert(id, Slot::default());
        Ok(TextureObject::new(id))
    }

    fn delete_texture(&self, texture: TextureObject) {
        let mut state = self.state.lock_sync();
        if let Some(mut slot) = state.textures.remove(&texture.raw()) {
            slot.forget_texture();
        }
        for unit in state.units.iter_mut() {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

    fn bind_for_update(&self, texture: TextureObject) {
        let mut state = self.state.lock_sync();
        if let Some(unit) = state.units.first_mut() {
            *unit = Some(texture);
        }
    }

    fn texture_at(&self, unit: u32) -> Option<TextureObject> {
        self.state.lock_sync().units.get(unit as usize).copied().flatten()
    }

    fn unbind(&self, unit: u32) {
        if let Some(slot) = self.state.lock_sync().units.get_mut(unit as usize) {
            *slot = None;
        }
    }

    fn allocate_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), Error> {
        self.allocate(texture, level, format, srgb, extent)
    }

    fn update_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        self.write(texture, level, format, srgb, region, data)
    }

    fn allocate_compressed_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), Error> {
        if !format.is_compressed() {
            return Err(Error::UnsupportedFormat(format));
        }
        self.allocate(texture, level, format, srgb, extent)
    }

    fn update_compressed_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        if !format.is_compressed() || region.x % BLOCK_SIZE != 0 || region.y % BLOCK_SIZE != 0 {
            return Err(Error::Region);
        }
        self.write(texture, level, format, srgb, region, data)
    }

    fn read_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        dest: &mut [u8],
    ) -> Result<(), Error> {
        if self.lost.load(Ordering::Acquire) {
            return Err(Error::DeviceLost);
        }
        let (wgpu_texture, shape) = {
            let mut state = self.state.lock_sync();
            let slot = state.slot_mut(texture)?;
            let shape = slot.shape.ok_or(Error::LevelNotAllocated(level))?;
            if shape.format != format {
                return Err(Error::UnsupportedFormat(format));
            }
            (self.ensure_texture(slot, level)?, shape)
        };
        let (width, height) = level_extent(shape.width, shape.height, level);
        let layer_size = format.data_size(width, height);
        let expected = layer_size * shape.layers as usize;
        if dest.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: dest.len(),
            });
        }
        let rows = format.rows(height);
        let stored_row = stored_row_size(format, width);
        let padded_row = stored_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("layered_texture readback"),
            size: padded_row as u64 * rows as u64 * shape.layers as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let (copy_width, copy_height) = if format.is_compressed() {
            (block_round(width), block_round(height))
        } else {
            (width, height)
        };
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("layered_texture readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &wgpu_texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(rows),
                },
            },
            wgpu::Extent3d {
                width: copy_width,
                height: copy_height,
                depth_or_array_layers: shape.layers,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = std::sync::mpsc::channel();
        buffer.map_async(wgpu::MapMode::Read, .., move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::PollType::Wait).map_err(backend)?;
        receiver.recv().map_err(backend)?.map_err(backend)?;
        {
            let mapped = buffer.get_mapped_range(..);
            let tight_row = format.row_data_size(width);
            for layer in 0..shape.layers as usize {
                for row in 0..rows as usize {
                    let src = (layer * rows as usize + row) * padded_row as usize;
                    let src = &mapped[src..src + stored_row as usize];
                    let dst = layer * layer_size + row * tight_row;
                    let dst = &mut dest[dst..dst + tight_row];
                    if format == PixelFormat::Rgb8 {
                        for (out, pixel) in dst.chunks_exact_mut(3).zip(src.chunks_exact(4)) {
                            out.copy_from_slice(&pixel[..3]);
                        }
                    } else {
                        dst.copy_from_slice(src);
                    }
                }
            }
        }
        buffer.unmap();
        Ok(())
    }

    fn set_mip_range(&self, texture: TextureObject, base: u32, max: u32) {
        let mut state = self.state.lock_sync();
        if let Ok(slot) = state.slot_mut(texture) {
            slot.mip_range = (base, max.max(base));
        }
    }

    fn apply_parameters(&self, texture: TextureObject, parameters: &TextureParameters, levels: u32) {
        let (mag_filter, min_filter, mipmap_filter) = filter(parameters.filter);
        let anisotropy_clamp = match parameters.filter {
            FilterMode::Anisotropic if parameters.anisotropy == 0 => DEFAULT_ANISOTROPY,
            FilterMode::Anisotropic => parameters.anisotropy.clamp(1, 16),
            _ => 1,
        } as u16;
        let u = address(parameters.address_mode(TextureCoordinate::U), self.features);
        let v = address(parameters.address_mode(TextureCoordinate::V), self.features);
        let w = address(parameters.address_mode(TextureCoordinate::W), self.features);
        let uses_border = [u, v, w].contains(&wgpu::AddressMode::ClampToBorder);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("layered_texture sampler"),
            address_mode_u: u,
            address_mode_v: v,
            address_mode_w: w,
            mag_filter,
            min_filter,
            mipmap_filter,
            lod_min_clamp: 0.0,
            lod_max_clamp: levels.max(1) as f32,
            compare: None,
            anisotropy_clamp,
            border_color: uses_border.then(|| border_color(parameters.border_color)),
        });
        let mut state = self.state.lock_sync();
        if let Ok(slot) = state.slot_mut(texture) {
            slot.sampler = Some(sampler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_stays_within_the_chain() {
        let mut slot = Slot {
            shape: Some(Shape {
                format: PixelFormat::Rgba8,
                srgb: false,
                width: 4,
                height: 4,
                layers: 2,
            }),
            mip_range: (0, 9),
            ..Slot::default()
        };
        assert_eq!(slot.mip_count(), 3);
        assert_eq!(slot.mip_count_for(2).unwrap(), 3);
        assert!(matches!(slot.mip_count_for(3), Err(Error::Region)));

        slot.mip_range = (0, 0);
        assert_eq!(slot.mip_count_for(1).unwrap(), 2);
        slot.shape = None;
        assert!(matches!(slot.mip_count_for(0), Err(Error::LevelNotAllocated(0))));
    }

    #[test]
    fn formats_follow_features() {
        let none = wgpu::Features::empty();
        assert_eq!(
            texture_format(PixelFormat::Rgba8, true, none).unwrap(),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            texture_format(PixelFormat::Rgb8, false, none).unwrap(),
            wgpu::TextureFormat::Rgba8Unorm
        );
        assert!(matches!(
            texture_format(PixelFormat::Dxt1, false, none),
            Err(Error::UnsupportedFormat(PixelFormat::Dxt1))
        ));
        assert_eq!(
            texture_format(PixelFormat::Dxt5, true, wgpu::Features::TEXTURE_COMPRESSION_BC).unwrap(),
            wgpu::TextureFormat::Bc3RgbaUnormSrgb
        );
        assert_eq!(
            texture_format(PixelFormat::Etc1, false, wgpu::Features::TEXTURE_COMPRESSION_ETC2).unwrap(),
            wgpu::TextureFormat::Etc2Rgb8Unorm
        );
    }

    #[test]
    fn rgb_is_widened() {
        assert_eq!(widen_rgb(&[1, 2, 3, 4, 5, 6]), vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(stored_row_size(PixelFormat::Rgb8, 5), 20);
        assert_eq!(stored_row_size(PixelFormat::Dxt1, 5), 16);
    }

    #[test]
    fn sampler_mapping() {
        assert_eq!(
            filter(FilterMode::Bilinear),
            (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest)
        );
        assert_eq!(
            address(AddressMode::Border, wgpu::Features::empty()),
            wgpu::AddressMode::ClampToEdge
        );
        assert_eq!(
            border_color([1.0, 1.0, 1.0, 1.0]),
            wgpu::SamplerBorderColor::OpaqueWhite
        );
        assert_eq!(
            border_color([0.0, 0.0, 0.0, 0.0]),
            wgpu::SamplerBorderColor::TransparentBlack
        );
    }
}
