// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A graphics device that keeps texture storage in host memory.

[`SoftwareDevice`] implements the full [`GraphicsDevice`] contract without a GPU.  It is
useful for headless tools and for tests, and it can simulate the conditions a real device
produces: device loss and reset, missing compressed format support, a profile that requires
RGBA expansion, and allocation failure.

Every call except the capability queries is recorded by name, so callers can check whether
an operation reached the device at all.
*/

use crate::bindings::sampler::TextureParameters;
use crate::images::device::{DeviceProfile, GraphicsDevice, LevelExtent, Region, TextureObject};
use crate::imp::Error;
use crate::pixel_formats::{BLOCK_SIZE, CompressedFormat, PixelFormat};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_safe_mutex::Mutex;

#[derive(Debug)]
struct LevelStorage {
    format: PixelFormat,
    srgb: bool,
    width: u32,
    height: u32,
    layers: u32,
    data: Vec<u8>,
}

impl LevelStorage {
    fn new(format: PixelFormat, srgb: bool, extent: LevelExtent) -> Self {
        let layer_size = format.data_size(extent.width, extent.height);
        LevelStorage {
            format,
            srgb,
            width: extent.width,
            height: extent.height,
            layers: extent.layers,
            data: vec![0; layer_size * extent.layers as usize],
        }
    }

    fn layer_size(&self) -> usize {
        self.format.data_size(self.width, self.height)
    }

    fn write(&mut self, format: PixelFormat, region: Region, data: &[u8]) -> Result<(), Error> {
        if format != self.format {
            return Err(Error::UnsupportedFormat(format));
        }
        if region.layer >= self.layers
            || region.x + region.width > self.width
            || region.y + region.height > self.height
        {
            return Err(Error::Region);
        }
        let (column, row) = if format.is_compressed() {
            (region.x / BLOCK_SIZE, region.y / BLOCK_SIZE)
        } else {
            (region.x, region.y)
        };
        let src_row = format.row_data_size(region.width);
        let rows = format.rows(region.height) as usize;
        if data.len() < src_row * rows {
            return Err(Error::BufferSize {
                expected: src_row * rows,
                actual: data.len(),
            });
        }
        let dst_row = format.row_data_size(self.width);
        let base = region.layer as usize * self.layer_size()
            + column as usize * format.unit_bytes() as usize;
        for r in 0..rows {
            let dst = base + (row as usize + r) * dst_row;
            self.data[dst..dst + src_row].copy_from_slice(&data[r * src_row..(r + 1) * src_row]);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TextureStorage {
    levels: Vec<Option<LevelStorage>>,
    mip_range: Option<(u32, u32)>,
    parameters: Option<TextureParameters>,
}

impl TextureStorage {
    fn level_mut(&mut self, level: u32) -> Result<&mut LevelStorage, Error> {
        self.levels
            .get_mut(level as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::LevelNotAllocated(level))
    }

    fn allocate(&mut self, level: u32, storage: LevelStorage) {
        let index = level as usize;
        if self.levels.len() <= index {
            self.levels.resize_with(index + 1, || None);
        }
        self.levels[index] = Some(storage);
    }
}

#[derive(Debug)]
struct State {
    next_id: u64,
    textures: HashMap<u64, TextureStorage>,
    units: Vec<Option<TextureObject>>,
    calls: Vec<&'static str>,
}

impl State {
    fn texture_mut(&mut self, texture: TextureObject) -> Result<&mut TextureStorage, Error> {
        self.textures
            .get_mut(&texture.raw())
            .ok_or(Error::NoSuchTexture(texture.raw()))
    }
}

/// A host-memory [`GraphicsDevice`].
#[derive(Debug)]
pub struct SoftwareDevice {
    state: Mutex<State>,
    lost: AtomicBool,
    fail_allocations: AtomicBool,
    profile: DeviceProfile,
    compressed: Vec<CompressedFormat>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// A device supporting every compressed format, without RGBA expansion.
    pub fn new() -> Self {
        let profile = DeviceProfile::default();
        SoftwareDevice {
            state: Mutex::new(State {
                next_id: 1,
                textures: HashMap::new(),
                units: vec![None; profile.texture_units as usize],
                calls: Vec::new(),
            }),
            lost: AtomicBool::new(false),
            fail_allocations: AtomicBool::new(false),
            profile,
            compressed: vec![
                CompressedFormat::Dxt1,
                CompressedFormat::Dxt3,
                CompressedFormat::Dxt5,
                CompressedFormat::Etc1,
            ],
        }
    }

    /// Restricts native compressed support to `formats`.  Others are decompressed by callers.
    pub fn with_compressed_formats(mut self, formats: &[CompressedFormat]) -> Self {
        self.compressed = formats.to_vec();
        self
    }

    pub fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.state.lock_sync().units = vec![None; profile.texture_units as usize];
        self.profile = profile;
        self
    }

    /// Makes every subsequent [`GraphicsDevice::generate_texture`] fail.
    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::Relaxed);
    }

    /// Simulates device loss.  Every texture object and binding is gone afterwards.
    pub fn lose_device(&self) {
        logwise::warn_sync!("software device lost");
        self.lost.store(true, Ordering::Relaxed);
        let mut state = self.state.lock_sync();
        state.textures.clear();
        for unit in state.units.iter_mut() {
            *unit = None;
        }
    }

    /// Makes the device usable again.  Resources must be told separately.
    pub fn restore_device(&self) {
        logwise::info_sync!("software device restored");
        self.lost.store(false, Ordering::Relaxed);
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock_sync().textures.len()
    }

    pub fn contains(&self, texture: TextureObject) -> bool {
        self.state.lock_sync().textures.contains_key(&texture.raw())
    }

    /// A copy of one level's storage, every layer concatenated.
    pub fn level_bytes(&self, texture: TextureObject, level: u32) -> Option<Vec<u8>> {
        let state = self.state.lock_sync();
        let storage = state.textures.get(&texture.raw())?;
        let level = storage.levels.get(level as usize)?.as_ref()?;
        Some(level.data.clone())
    }

    /// Format and sRGB flag a level was allocated with.
    pub fn level_format(&self, texture: TextureObject, level: u32) -> Option<(PixelFormat, bool)> {
        let state = self.state.lock_sync();
        let level = state.textures.get(&texture.raw())?.levels.get(level as usize)?.as_ref()?;
        Some((level.format, level.srgb))
    }

    pub fn mip_range(&self, texture: TextureObject) -> Option<(u32, u32)> {
        self.state.lock_sync().textures.get(&texture.raw())?.mip_range
    }

    pub fn applied_parameters(&self, texture: TextureObject) -> Option<TextureParameters> {
        self.state.lock_sync().textures.get(&texture.raw())?.parameters
    }

    /// Drains the names of the device calls made since the last call.
    pub fn take_calls(&self) -> Vec<&'static str> {
        std::mem::take(&mut self.state.lock_sync().calls)
    }

    fn record(&self, call: &'static str) {
        self.state.lock_sync().calls.push(call);
    }

    fn check_lost(&self) -> Result<(), Error> {
        if self.is_device_lost() {
            Err(Error::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn check_compressed(&self, format: PixelFormat) -> Result<(), Error> {
        if self.compressed.iter().any(|c| c.pixel_format() == format) {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat(format))
        }
    }

    fn allocate(
        &self,
        call: &'static str,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), Error> {
        self.record(call);
        self.check_lost()?;
        let mut state = self.state.lock_sync();
        state
            .texture_mut(texture)?
            .allocate(level, LevelStorage::new(format, srgb, extent));
        Ok(())
    }

    fn update(
        &self,
        call: &'static str,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        self.record(call);
        self.check_lost()?;
        let mut state = self.state.lock_sync();
        state.texture_mut(texture)?.level_mut(level)?.write(format, region, data)
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn is_device_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }

    fn profile(&self) -> DeviceProfile {
        self.profile
    }

    fn map_compressed_format(&self, format: CompressedFormat) -> Option<PixelFormat> {
        self.compressed
            .contains(&format)
            .then(|| format.pixel_format())
    }

    fn generate_texture(&self) -> Result<TextureObject, Error> {
        self.record("generate_texture");
        self.check_lost()?;
        if self.fail_allocations.load(Ordering::Relaxed) {
            return Err(Error::Allocation);
        }
        let mut state = self.state.lock_sync();
        let id = state.next_id;
        state.next_id += 1;
        state.textures.insert(id, TextureStorage::default());
        Ok(TextureObject::new(id))
    }

    fn delete_texture(&self, texture: TextureObject) {
        self.record("delete_texture");
        let mut state = self.state.lock_sync();
        state.textures.remove(&texture.raw());
        for unit in state.units.iter_mut() {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
    }

    fn bind_for_update(&self, texture: TextureObject) {
        self.record("bind_for_update");
        if let Some(unit) = self.state.lock_sync().units.first_mut() {
            *unit = Some(texture);
        }
    }

    fn texture_at(&self, unit: u32) -> Option<TextureObject> {
        self.state.lock_sync().units.get(unit as usize).copied().flatten()
    }

    fn unbind(&self, unit: u32) {
        self.record("unbind");
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
        if format.is_compressed() {
            return Err(Error::UnsupportedFormat(format));
        }
        self.allocate("allocate_level", texture, level, format, srgb, extent)
    }

    fn update_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        _srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        self.update("update_region", texture, level, format, region, data)
    }

    fn allocate_compressed_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        srgb: bool,
        extent: LevelExtent,
    ) -> Result<(), Error> {
        self.check_compressed(format)?;
        self.allocate(
            "allocate_compressed_level",
            texture,
            level,
            format,
            srgb,
            extent,
        )
    }

    fn update_compressed_region(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        _srgb: bool,
        region: Region,
        data: &[u8],
    ) -> Result<(), Error> {
        self.check_compressed(format)?;
        self.update("update_compressed_region", texture, level, format, region, data)
    }

    fn read_level(
        &self,
        texture: TextureObject,
        level: u32,
        format: PixelFormat,
        dest: &mut [u8],
    ) -> Result<(), Error> {
        self.record("read_level");
        self.check_lost()?;
        let mut state = self.state.lock_sync();
        let storage = state.texture_mut(texture)?.level_mut(level)?;
        if storage.format != format {
            return Err(Error::UnsupportedFormat(format));
        }
        let len = storage.data.len();
        if dest.len() < len {
            return Err(Error::BufferSize {
                expected: len,
                actual: dest.len(),
            });
        }
        dest[..len].copy_from_slice(&storage.data);
        Ok(())
    }

    fn set_mip_range(&self, texture: TextureObject, base: u32, max: u32) {
        self.record("set_mip_range");
        if let Ok(storage) = self.state.lock_sync().texture_mut(texture) {
            storage.mip_range = Some((base, max));
        }
    }

    fn apply_parameters(&self, texture: TextureObject, parameters: &TextureParameters, _levels: u32) {
        self.record("apply_parameters");
        if let Ok(storage) = self.state.lock_sync().texture_mut(texture) {
            storage.parameters = Some(*parameters);
        }
    }
}
