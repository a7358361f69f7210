// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
GPU-resident 2D texture arrays.

A [`TextureArray`] owns one device texture holding `layers` images of identical size and
format, each with a mip chain.  It can be filled layer by layer from decoded [`Image`]s,
rectangle by rectangle from raw bytes, or loaded from a configuration document listing one
image per layer (see [`crate::resource::load`]).

# Layer 0 sets the shape

Uploading a whole image into layer 0 decides the width, height, format and mip count of the
array and (re)allocates the device texture for every layer.  Other layers must match it.
Layer 0 must therefore be uploaded first, and re-uploading it with a different shape while
other layers hold data is rejected.

# Device loss

Every device-touching operation checks whether the device is lost first.  While it is,
uploads are recorded as pending and report success; on reset the array reloads itself
through the resource cache, or recreates an empty texture and reports
[`TextureArray::is_data_lost`].

# Example

```
use layered_texture::bindings::texture_array::{TextureArray, TextureContext};
use layered_texture::image::Image;
use layered_texture::imp::software::SoftwareDevice;
use layered_texture::resource::memory_cache::MemoryCache;
use std::sync::Arc;

let context = TextureContext::new(Arc::new(MemoryCache::new()))
    .with_graphics(Arc::new(SoftwareDevice::new()));
let mut array = TextureArray::new("terrain", context);
array.set_layers(2);
let grass = Image::from_raw(4, 4, 4, vec![0x40; 64]).unwrap();
let rock = Image::from_raw(4, 4, 4, vec![0x80; 64]).unwrap();
array.set_layer_image(0, &grass, false).unwrap();
array.set_layer_image(1, &rock, false).unwrap();
assert_eq!(array.levels(), 3);
```
*/

mod derive;
pub mod memory;
mod recovery;

pub use memory::LayerMemory;
pub use recovery::RecoveryState;

use crate::bindings::sampler::{FilterMode, TextureParameters, TextureQuality};
use crate::bindings::visible_to::TextureUsage;
use crate::image::{self, Image, level_extent};
use crate::images::device::{GraphicsDevice, LevelExtent, Region, TextureObject};
use crate::images::render_surface::{RenderSurface, RenderSurfaceQueue, UpdateMode};
use crate::imp;
use crate::pixel_formats::PixelFormat;
use crate::resource::load::{LoadSession, ParameterSetting, ParseError, TextureConfig};
use crate::resource::{AsyncLoadState, LoadableResource, ResourceCache, ResourceId, ResourceKind};
use derive::WorkingImage;
use std::io::Read;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("texture array not created")]
    NotCreated,
    #[error("no source data")]
    NoData,
    #[error("layer {layer} out of range, array has {layers}")]
    Layer { layer: u32, layers: u32 },
    #[error("mip level {level} out of range, texture has {levels}")]
    Level { level: u32, levels: u32 },
    #[error("region ({x},{y}) {width}x{height} outside level of {level_width}x{level_height}")]
    Region {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        level_width: u32,
        level_height: u32,
    },
    #[error("data is {actual} bytes, region needs {expected}")]
    DataSize { expected: usize, actual: usize },
    #[error("destination is {actual} bytes, level needs {expected}")]
    Destination { expected: usize, actual: usize },
    #[error("zero or negative texture array size")]
    ZeroSize,
    #[error("depth-stencil usage is not supported for texture arrays")]
    DepthStencil,
    #[error("number of layers must be set first")]
    NoLayers,
    #[error("layer 0 must be loaded first")]
    Layer0Missing,
    #[error("layer {layer} is {width}x{height} {format:?}, which does not match layer 0")]
    LayerMismatch {
        layer: u32,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
    #[error("layer 0 would change shape while other layers hold data")]
    Layer0Conflict,
    #[error("only layer 0 can be read back, and it returns every layer")]
    ReadLayer(u32),
    #[error("device is lost")]
    DeviceLost,
    #[error("unsupported channel count {0}")]
    Components(u32),
    #[error("texture allocation failed {0}")]
    Allocation(#[source] imp::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Image(#[from] image::Error),
    #[error("device error {0}")]
    Device(#[from] imp::Error),
}

/// The collaborators a texture array works with.
#[derive(Debug, Clone)]
pub struct TextureContext {
    graphics: Option<Arc<dyn GraphicsDevice>>,
    cache: Arc<dyn ResourceCache>,
    surfaces: Option<Arc<dyn RenderSurfaceQueue>>,
    quality: TextureQuality,
}

impl TextureContext {
    /// A headless context: loads succeed without touching any device.
    pub fn new(cache: Arc<dyn ResourceCache>) -> Self {
        TextureContext {
            graphics: None,
            cache,
            surfaces: None,
            quality: TextureQuality::default(),
        }
    }

    pub fn with_graphics(mut self, graphics: Arc<dyn GraphicsDevice>) -> Self {
        self.graphics = Some(graphics);
        self
    }

    pub fn with_surfaces(mut self, surfaces: Arc<dyn RenderSurfaceQueue>) -> Self {
        self.surfaces = Some(surfaces);
        self
    }

    pub fn with_quality(mut self, quality: TextureQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn graphics(&self) -> Option<&Arc<dyn GraphicsDevice>> {
        self.graphics.as_ref()
    }

    pub fn cache(&self) -> &Arc<dyn ResourceCache> {
        &self.cache
    }
}

/// A 2D texture array resource.
#[derive(Debug)]
pub struct TextureArray {
    id: ResourceId,
    name: String,
    context: TextureContext,
    width: u32,
    height: u32,
    format: Option<PixelFormat>,
    layers: u32,
    levels: u32,
    requested_levels: u32,
    usage: TextureUsage,
    object: Option<TextureObject>,
    render_surface: Option<Arc<RenderSurface>>,
    data_pending: bool,
    data_lost: bool,
    parameters: TextureParameters,
    async_load_state: AsyncLoadState,
    load_session: Option<LoadSession>,
    layer_memory: LayerMemory,
    memory_use: usize,
}

impl TextureArray {
    /// Bytes charged to every texture array regardless of its contents.
    pub const FIXED_MEMORY_OVERHEAD: usize = std::mem::size_of::<TextureArray>();

    /// An empty array.  `name` is the cache name used to reload after device loss; may be empty.
    pub fn new(name: impl Into<String>, context: TextureContext) -> Self {
        let mut array = TextureArray {
            id: ResourceId::next(),
            name: name.into(),
            context,
            width: 0,
            height: 0,
            format: None,
            layers: 0,
            levels: 0,
            requested_levels: 0,
            usage: TextureUsage::Static,
            object: None,
            render_surface: None,
            data_pending: false,
            data_lost: false,
            parameters: TextureParameters::default(),
            async_load_state: AsyncLoadState::Done,
            load_session: None,
            layer_memory: LayerMemory::default(),
            memory_use: 0,
        };
        array.update_memory_use();
        array
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The shared format of every layer, once sized.
    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }

    pub fn is_compressed(&self) -> bool {
        self.format.is_some_and(|f| f.is_compressed())
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Mip levels of the device texture, resolved at creation.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Requested mip levels, 0 meaning a full chain.
    pub fn requested_levels(&self) -> u32 {
        self.requested_levels
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn object(&self) -> Option<TextureObject> {
        self.object
    }

    pub fn render_surface(&self) -> Option<&Arc<RenderSurface>> {
        self.render_surface.as_ref()
    }

    /// Aggregate memory charged to this resource.
    pub fn memory_use(&self) -> usize {
        self.memory_use
    }

    pub fn layer_memory(&self) -> &LayerMemory {
        &self.layer_memory
    }

    pub fn parameters(&self) -> &TextureParameters {
        &self.parameters
    }

    /// Whether the device object was recreated empty after a reset.
    pub fn is_data_lost(&self) -> bool {
        self.data_lost
    }

    pub fn clear_data_lost(&mut self) {
        self.data_lost = false;
    }

    /// Whether an upload was skipped while the device was lost.
    pub fn is_data_pending(&self) -> bool {
        self.data_pending
    }

    pub fn recovery_state(&self) -> RecoveryState {
        RecoveryState::derive(self.device_lost(), self.data_pending)
    }

    pub fn async_load_state(&self) -> AsyncLoadState {
        self.async_load_state
    }

    pub fn set_async_load_state(&mut self, state: AsyncLoadState) {
        self.async_load_state = state;
    }

    pub fn texture_quality(&self) -> TextureQuality {
        self.context.quality
    }

    /// Changes the quality tier used by later whole-layer uploads.
    pub fn set_texture_quality(&mut self, quality: TextureQuality) {
        self.context.quality = quality;
    }

    /// Requests a mip chain length for the next creation.  0 means a full chain.
    pub fn set_num_levels(&mut self, levels: u32) {
        self.requested_levels = if self.usage == TextureUsage::DepthStencil {
            1
        } else {
            levels
        };
    }

    /**
    Replaces the sampling parameters and pushes them to the device object, if any.

    Toggling sRGB on a created array recreates the device texture empty.  Uploaded layers are
    discarded, their memory records zeroed, and the array reports its data as lost.
    */
    pub fn set_parameters(&mut self, parameters: TextureParameters) -> Result<(), Error> {
        let srgb_changed = parameters.srgb != self.parameters.srgb;
        self.parameters = parameters;
        if srgb_changed && self.object.is_some() {
            //the sRGB flag is part of the storage format
            if self.layer_memory.total() != 0 {
                logwise::warn_sync!(
                    "sRGB change discards the layers of texture array {name}",
                    name = logwise::privacy::LogIt(&self.name)
                );
                self.data_lost = true;
            }
            self.layer_memory.resize_to(self.layers);
            self.update_memory_use();
            return self.create();
        }
        self.update_parameters();
        Ok(())
    }

    /// Applies the parameter elements of a configuration document, in order.
    pub fn apply_settings(&mut self, settings: &[ParameterSetting]) -> Result<(), Error> {
        let mut parameters = self.parameters;
        for setting in settings {
            match *setting {
                ParameterSetting::Address(coordinate, mode) => {
                    parameters.set_address_mode(coordinate, mode)
                }
                ParameterSetting::Border(color) => parameters.border_color = color,
                ParameterSetting::Filter { mode, anisotropy } => {
                    parameters.filter = mode;
                    if let Some(anisotropy) = anisotropy {
                        parameters.anisotropy = anisotropy;
                    }
                }
                ParameterSetting::Mipmap(enable) => self.set_num_levels(if enable { 0 } else { 1 }),
                ParameterSetting::Quality(quality, skip) => parameters.mips_to_skip.set(quality, skip),
                ParameterSetting::Srgb(enable) => parameters.srgb = enable,
            }
        }
        self.set_parameters(parameters)
    }

    fn device_lost(&self) -> bool {
        self.context
            .graphics
            .as_ref()
            .is_some_and(|g| g.is_device_lost())
    }

    fn update_parameters(&self) {
        if let (Some(object), Some(graphics)) = (self.object, &self.context.graphics)
            && !graphics.is_device_lost()
        {
            graphics.apply_parameters(object, &self.parameters, self.levels);
        }
    }

    fn update_memory_use(&mut self) {
        debug_assert_eq!(self.layer_memory.layers(), self.layers);
        self.memory_use = self.layer_memory.aggregate(Self::FIXED_MEMORY_OVERHEAD);
        self.context
            .cache
            .set_resource_memory(self.id, ResourceKind::TextureArray, self.memory_use as u64);
    }

    fn srgb_format(&self, format: PixelFormat) -> bool {
        self.parameters.srgb && format.has_srgb_variant()
    }

    /// Width of mip `level`, or 0 past the last level.
    pub fn level_width(&self, level: u32) -> u32 {
        if level > self.levels {
            return 0;
        }
        level_extent(self.width, self.height, level).0
    }

    /// Height of mip `level`, or 0 past the last level.
    pub fn level_height(&self, level: u32) -> u32 {
        if level > self.levels {
            return 0;
        }
        level_extent(self.width, self.height, level).1
    }

    /// Bytes of a `width` x `height` region of one layer in the current format.
    pub fn data_size(&self, width: u32, height: u32) -> usize {
        self.format.map_or(0, |f| f.data_size(width, height))
    }

    /// Bytes of mip `level` across every layer.
    pub fn level_data_size(&self, level: u32) -> usize {
        self.data_size(self.level_width(level), self.level_height(level)) * self.layers as usize
    }

    /**
    Sets the shape of the array and recreates the device texture.

    `layers == 0` keeps the current layer count.  Every layer's memory record is zeroed.
    Render-target usage creates a render surface, switches to nearest filtering with a
    single mip level, and registers the array for per-frame surface updates.
    */
    pub fn set_size(
        &mut self,
        layers: u32,
        width: i32,
        height: i32,
        format: PixelFormat,
        usage: TextureUsage,
    ) -> Result<(), Error> {
        if width <= 0 || height <= 0 {
            logwise::error_sync!("zero or negative texture array size");
            return Err(Error::ZeroSize);
        }
        if usage == TextureUsage::DepthStencil {
            logwise::error_sync!("depth-stencil usage not supported for texture arrays");
            return Err(Error::DepthStencil);
        }
        if let Some(old) = self.render_surface.take() {
            old.release();
        }
        self.usage = usage;
        if usage.is_render_target() {
            self.render_surface = Some(Arc::new(RenderSurface::new(self.id)));
            self.parameters.filter = FilterMode::Nearest;
            self.requested_levels = 1;
            if let Some(surfaces) = &self.context.surfaces {
                surfaces.register(self.id);
            }
        } else if let Some(surfaces) = &self.context.surfaces {
            surfaces.unregister(self.id);
        }
        self.width = width as u32;
        self.height = height as u32;
        self.format = Some(format);
        if layers != 0 {
            self.layers = layers;
        }
        self.layer_memory.resize_to(self.layers);
        self.update_memory_use();
        self.create()
    }

    /// Releases the device texture and sets the layer count.
    pub fn set_layers(&mut self, layers: u32) {
        self.release();
        self.layers = layers;
        self.layer_memory.resize_to(layers);
        self.update_memory_use();
    }

    /**
    Creates the device texture for the current shape, releasing any previous one.

    Does nothing without a device or before the array has a size and layers.  While the
    device is lost the creation is skipped and reported as success.
    */
    pub fn create(&mut self) -> Result<(), Error> {
        self.release();
        let Some(graphics) = self.context.graphics.clone() else {
            return Ok(());
        };
        let Some(format) = self.format else {
            return Ok(());
        };
        if self.width == 0 || self.height == 0 || self.layers == 0 {
            return Ok(());
        }
        if graphics.is_device_lost() {
            logwise::warn_sync!(
                "texture array {name} creation while device is lost",
                name = logwise::privacy::LogIt(&self.name)
            );
            return Ok(());
        }
        let object = graphics.generate_texture().map_err(|err| {
            logwise::error_sync!(
                "failed to create texture array {name}: {err}",
                name = logwise::privacy::LogIt(&self.name),
                err = logwise::privacy::LogIt(&err)
            );
            Error::Allocation(err)
        })?;
        graphics.bind_for_update(object);
        if !format.is_compressed() {
            let extent = LevelExtent {
                width: self.width,
                height: self.height,
                layers: self.layers,
            };
            if let Err(err) = graphics.allocate_level(object, 0, format, self.srgb_format(format), extent) {
                logwise::error_sync!(
                    "failed to create texture array {name}: {err}",
                    name = logwise::privacy::LogIt(&self.name),
                    err = logwise::privacy::LogIt(&err)
                );
                graphics.unbind(0);
                graphics.delete_texture(object);
                return Err(Error::Allocation(err));
            }
        }
        let full_chain = self.width.max(self.height).ilog2() + 1;
        self.levels = if self.requested_levels != 0 {
            self.requested_levels.min(full_chain)
        } else {
            full_chain
        };
        graphics.set_mip_range(object, 0, self.levels - 1);
        graphics.apply_parameters(object, &self.parameters, self.levels);
        graphics.unbind(0);
        self.object = Some(object);
        logwise::trace_sync!(
            "created texture array {name} {width}x{height}x{layers} with {levels} levels",
            name = logwise::privacy::LogIt(&self.name),
            width = self.width,
            height = self.height,
            layers = self.layers,
            levels = self.levels
        );
        Ok(())
    }

    /// Releases the device texture.  Without a device the handle is kept.
    pub fn release(&mut self) {
        let Some(object) = self.object else {
            return;
        };
        let Some(graphics) = &self.context.graphics else {
            return;
        };
        if !graphics.is_device_lost() {
            for unit in 0..graphics.profile().texture_units {
                if graphics.texture_at(unit) == Some(object) {
                    graphics.unbind(unit);
                }
            }
            graphics.delete_texture(object);
        }
        if let Some(surface) = &self.render_surface {
            surface.release();
        }
        self.object = None;
    }

    /**
    Uploads one rectangle of one mip level of one layer.

    For compressed formats `x` and `y` are rounded down to the block grid and `data` holds
    whole blocks.  A rectangle covering all of level `level` of layer 0 reallocates that
    level for every layer before writing.
    */
    #[allow(clippy::too_many_arguments)]
    pub fn set_data(
        &mut self,
        layer: u32,
        level: u32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        data: &[u8],
    ) -> Result<(), Error> {
        let (Some(object), Some(graphics), Some(format)) =
            (self.object, self.context.graphics.clone(), self.format)
        else {
            logwise::error_sync!("texture array not created, can not set data");
            return Err(Error::NotCreated);
        };
        if data.is_empty() {
            logwise::error_sync!("null source for setting data");
            return Err(Error::NoData);
        }
        if layer >= self.layers {
            logwise::error_sync!("illegal layer {layer} for setting data", layer = layer);
            return Err(Error::Layer {
                layer,
                layers: self.layers,
            });
        }
        if level >= self.levels {
            logwise::error_sync!("illegal mip level {level} for setting data", level = level);
            return Err(Error::Level {
                level,
                levels: self.levels,
            });
        }
        if graphics.is_device_lost() {
            logwise::warn_sync!("texture array data assignment while device is lost");
            self.data_pending = true;
            return Ok(());
        }
        let (x, y) = if format.is_compressed() {
            (x & !3, y & !3)
        } else {
            (x, y)
        };
        let level_width = self.level_width(level);
        let level_height = self.level_height(level);
        let outside = |origin: i32, size: i32, limit: u32| {
            origin < 0 || origin.checked_add(size).is_none_or(|end| end as i64 > limit as i64)
        };
        if outside(x, width, level_width) || outside(y, height, level_height) || width <= 0 || height <= 0 {
            logwise::error_sync!("illegal dimensions for setting data");
            return Err(Error::Region {
                x,
                y,
                width,
                height,
                level_width,
                level_height,
            });
        }
        let expected = format.data_size(width as u32, height as u32);
        if data.len() < expected {
            logwise::error_sync!(
                "source has {actual} bytes, region needs {expected}",
                actual = data.len(),
                expected = expected
            );
            return Err(Error::DataSize {
                expected,
                actual: data.len(),
            });
        }

        graphics.bind_for_update(object);
        let whole_level = x == 0
            && y == 0
            && width as u32 == level_width
            && height as u32 == level_height
            && layer == 0;
        let srgb = self.srgb_format(format);
        let extent = LevelExtent {
            width: level_width,
            height: level_height,
            layers: self.layers,
        };
        let region = Region {
            x: x as u32,
            y: y as u32,
            layer,
            width: width as u32,
            height: height as u32,
        };
        let data = &data[..expected];
        let result = if !format.is_compressed() {
            let allocated = if whole_level {
                graphics.allocate_level(object, level, format, srgb, extent)
            } else {
                Ok(())
            };
            allocated.and_then(|()| graphics.update_region(object, level, format, srgb, region, data))
        } else {
            let allocated = if whole_level {
                graphics.allocate_compressed_level(object, level, format, srgb, extent)
            } else {
                Ok(())
            };
            allocated.and_then(|()| {
                graphics.update_compressed_region(object, level, format, srgb, region, data)
            })
        };
        graphics.unbind(0);
        result.map_err(|err| {
            logwise::error_sync!(
                "failed to set texture array data: {err}",
                err = logwise::privacy::LogIt(&err)
            );
            Error::Device(err)
        })
    }

    /// Checks a non-zero layer against layer 0 before uploading into it.
    fn check_layer_shape(&self, layer: u32, width: u32, height: u32, format: PixelFormat) -> Result<(), Error> {
        if self.object.is_none() {
            logwise::error_sync!("texture array layer 0 must be loaded first");
            return Err(Error::Layer0Missing);
        }
        if width != self.width || height != self.height || Some(format) != self.format {
            logwise::error_sync!(
                "texture array layer {layer} does not match size or format of layer 0",
                layer = layer
            );
            return Err(Error::LayerMismatch {
                layer,
                width,
                height,
                format,
            });
        }
        Ok(())
    }

    /// Checks a layer 0 upload against layers that already hold data.
    fn check_layer0_shape(&self, width: u32, height: u32, format: PixelFormat) -> Result<(), Error> {
        if !self.layer_memory.populated_except(0) {
            return Ok(());
        }
        if width != self.width || height != self.height || Some(format) != self.format {
            logwise::error_sync!("texture array layer 0 would change shape under populated layers");
            return Err(Error::Layer0Conflict);
        }
        logwise::warn_sync!(
            "reloading layer 0 of {name} discards the other layers",
            name = logwise::privacy::LogIt(&self.name)
        );
        Ok(())
    }

    /**
    Uploads a whole image, with its mip chain, into `layer`.

    Layer 0 decides the shape of the array; other layers must match it.  `use_alpha` maps
    single-channel images to alpha instead of luminance.  Finest levels are dropped according
    to the current quality tier.  Compressed images the device can't sample natively are
    decompressed to RGBA.
    */
    pub fn set_layer_image(&mut self, layer: u32, image: &Image, use_alpha: bool) -> Result<(), Error> {
        if self.layers == 0 {
            logwise::error_sync!("number of layers in the array must be set first");
            return Err(Error::NoLayers);
        }
        if layer >= self.layers {
            logwise::error_sync!("illegal layer {layer} for setting data", layer = layer);
            return Err(Error::Layer {
                layer,
                layers: self.layers,
            });
        }
        if self.device_lost() {
            logwise::warn_sync!(
                "texture array {name} layer upload while device is lost",
                name = logwise::privacy::LogIt(&self.name)
            );
            self.data_pending = true;
            return Ok(());
        }
        let memory = if image.is_compressed() {
            self.set_compressed_layer(layer, image)?
        } else {
            self.set_raw_layer(layer, image, use_alpha)?
        };
        self.layer_memory.record(layer, memory);
        self.update_memory_use();
        if !self.data_pending {
            self.data_lost = false;
        }
        Ok(())
    }

    fn set_raw_layer(&mut self, layer: u32, image: &Image, use_alpha: bool) -> Result<usize, Error> {
        let profile = self
            .context
            .graphics
            .as_ref()
            .map(|g| g.profile())
            .unwrap_or_default();
        let mut working = WorkingImage::Source(image);
        let mut components = image.components();
        if derive::needs_rgba_expansion(components, use_alpha, profile) {
            working = WorkingImage::Derived(Arc::new(image.convert_to_rgba()?));
            components = 4;
        }
        for _ in 0..self.parameters.mips_to_skip.skip(self.context.quality) {
            working = working.next_level()?;
        }
        let format = derive::canonical_format(components, use_alpha)?;

        if layer == 0 {
            self.check_layer0_shape(working.width(), working.height(), format)?;
            if self.is_compressed() && self.requested_levels > 1 {
                self.requested_levels = 0;
            }
            self.set_size(
                0,
                working.width() as i32,
                working.height() as i32,
                format,
                TextureUsage::Static,
            )?;
            if self.object.is_none() {
                //no device, or the device went away during creation
                return Err(Error::NotCreated);
            }
        } else {
            self.check_layer_shape(layer, working.width(), working.height(), format)?;
        }

        let mut memory = 0;
        for level in 0..self.levels {
            let (width, height) = (working.width(), working.height());
            self.set_data(layer, level, 0, 0, width as i32, height as i32, working.data())?;
            memory += width as usize * height as usize * components as usize;
            if level + 1 < self.levels {
                working = working.next_level()?;
            }
        }
        Ok(memory)
    }

    fn set_compressed_layer(&mut self, layer: u32, image: &Image) -> Result<usize, Error> {
        let Some(compressed) = image.compressed_format() else {
            return Err(Error::Image(image::Error::Compressed));
        };
        let native = self
            .context
            .graphics
            .as_ref()
            .and_then(|g| g.map_compressed_format(compressed));
        let source_levels = image.num_compressed_levels();
        let plan = derive::plan_compressed(
            native,
            self.parameters.mips_to_skip.skip(self.context.quality),
            source_levels,
            image.width(),
            image.height(),
        );
        if plan.decompress {
            logwise::info_sync!(
                "device lacks {format}, decompressing texture array {name}",
                format = logwise::privacy::LogIt(&compressed),
                name = logwise::privacy::LogIt(&self.name)
            );
        }

        if layer == 0 {
            self.check_layer0_shape(plan.width, plan.height, plan.format)?;
            self.set_num_levels(plan.levels);
            self.set_size(
                0,
                plan.width as i32,
                plan.height as i32,
                plan.format,
                TextureUsage::Static,
            )?;
            if self.object.is_none() {
                return Err(Error::NotCreated);
            }
        } else {
            self.check_layer_shape(layer, plan.width, plan.height, plan.format)?;
        }

        let mut memory = 0;
        for level in 0..self.levels.min(source_levels - plan.skip) {
            let source = image
                .compressed_level(level + plan.skip)
                .ok_or(Error::Image(image::Error::NoLevels))?;
            let (width, height) = (source.width(), source.height());
            if !plan.decompress {
                self.set_data(layer, level, 0, 0, width as i32, height as i32, source.data())?;
                memory += source.rows() as usize * source.row_size() as usize;
            } else {
                let mut rgba = vec![0; width as usize * height as usize * 4];
                source.decompress(&mut rgba)?;
                self.set_data(layer, level, 0, 0, width as i32, height as i32, &rgba)?;
                memory += rgba.len();
            }
        }
        Ok(memory)
    }

    /// Decodes a png from `source` and uploads it into `layer`.
    pub fn set_data_from_source(&mut self, layer: u32, source: &mut dyn Read) -> Result<(), Error> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).map_err(ParseError::from)?;
        let image = Image::from_png(&bytes).map_err(|err| {
            logwise::error_sync!(
                "can't decode layer {layer}: {err}",
                layer = layer,
                err = logwise::privacy::LogIt(&err)
            );
            err
        })?;
        self.set_layer_image(layer, &image, false)
    }

    /**
    Reads back mip `level` of every layer, concatenated, into `dest`.

    Only `layer == 0` is accepted since the whole array level is always returned.  Fails while
    the device is lost.
    */
    pub fn get_data(&self, layer: u32, level: u32, dest: &mut [u8]) -> Result<(), Error> {
        let (Some(object), Some(graphics), Some(format)) =
            (self.object, self.context.graphics.as_ref(), self.format)
        else {
            logwise::error_sync!("texture array not created, can not get data");
            return Err(Error::NotCreated);
        };
        if dest.is_empty() {
            logwise::error_sync!("null destination for getting data");
            return Err(Error::NoData);
        }
        if layer != 0 {
            logwise::error_sync!("only the full download of the array is supported, set layer=0");
            return Err(Error::ReadLayer(layer));
        }
        if level >= self.levels {
            logwise::error_sync!("illegal mip level {level} for getting data", level = level);
            return Err(Error::Level {
                level,
                levels: self.levels,
            });
        }
        if graphics.is_device_lost() {
            logwise::warn_sync!("getting texture data while device is lost");
            return Err(Error::DeviceLost);
        }
        let expected = self.level_data_size(level);
        if dest.len() < expected {
            logwise::error_sync!(
                "destination has {actual} bytes, level needs {expected}",
                actual = dest.len(),
                expected = expected
            );
            return Err(Error::Destination {
                expected,
                actual: dest.len(),
            });
        }
        graphics.bind_for_update(object);
        let result = graphics.read_level(object, level, format, &mut dest[..expected]);
        graphics.unbind(0);
        result.map_err(|err| {
            logwise::error_sync!(
                "failed to get texture array data: {err}",
                err = logwise::privacy::LogIt(&err)
            );
            Error::Device(err)
        })
    }

    /// Queues the render surface when it renders every frame or an update was requested.
    pub fn handle_render_surface_update(&self) {
        let Some(surface) = &self.render_surface else {
            return;
        };
        if surface.update_mode() == UpdateMode::Always || surface.is_update_queued() {
            if let Some(surfaces) = &self.context.surfaces {
                surfaces.queue_surface(surface.clone());
            }
            surface.reset_update_queued();
        }
    }

    fn check_texture_budget(&self) {
        let cache = &self.context.cache;
        let budget = cache.memory_budget(ResourceKind::TextureArray);
        if budget == 0 {
            return;
        }
        let used = cache.memory_use(ResourceKind::TextureArray);
        if used > budget {
            logwise::info_sync!(
                "texture memory {used} over budget {budget}, releasing unused materials",
                used = used,
                budget = budget
            );
            cache.release_unused(ResourceKind::Material);
        }
    }
}

impl LoadableResource for TextureArray {
    type Error = Error;

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> ResourceId {
        self.id
    }

    fn begin_load(&mut self, source: &mut dyn Read) -> Result<(), Error> {
        let Some(graphics) = &self.context.graphics else {
            return Ok(());
        };
        if graphics.is_device_lost() {
            logwise::warn_sync!(
                "texture array {name} load while device is lost",
                name = logwise::privacy::LogIt(&self.name)
            );
            self.data_pending = true;
            return Ok(());
        }
        self.context.cache.reset_dependencies(self.id);
        self.load_session = None;

        let mut text = String::new();
        source.read_to_string(&mut text).map_err(ParseError::from)?;
        let config = TextureConfig::parse(&text).map_err(|err| {
            logwise::error_sync!(
                "can't parse texture array {name}: {err}",
                name = logwise::privacy::LogIt(&self.name),
                err = logwise::privacy::LogIt(&err)
            );
            err
        })?;
        let session = LoadSession::prefetch(
            config,
            &self.name,
            self.id,
            self.context.cache.as_ref(),
            self.async_load_state == AsyncLoadState::Loading,
        );
        self.load_session = Some(session);
        Ok(())
    }

    fn end_load(&mut self) -> Result<(), Error> {
        let session = self.load_session.take();
        let Some(graphics) = self.context.graphics.clone() else {
            return Ok(());
        };
        if graphics.is_device_lost() {
            return Ok(());
        }
        let Some(session) = session else {
            logwise::warn_sync!(
                "texture array {name} finished loading without a session",
                name = logwise::privacy::LogIt(&self.name)
            );
            return Ok(());
        };
        self.check_texture_budget();

        let (config, images) = session.into_parts();
        self.apply_settings(config.settings())?;
        self.set_layers(images.len() as u32);
        for (layer, image) in images.iter().enumerate() {
            let layer = layer as u32;
            match image {
                Some(image) => {
                    if let Err(err) = self.set_layer_image(layer, image, false) {
                        logwise::error_sync!(
                            "texture array {name} layer {layer} failed: {err}",
                            name = logwise::privacy::LogIt(&self.name),
                            layer = layer,
                            err = logwise::privacy::LogIt(&err)
                        );
                    }
                }
                None => logwise::error_sync!(
                    "texture array {name} layer {layer} has no image",
                    name = logwise::privacy::LogIt(&self.name),
                    layer = layer
                ),
            }
        }
        logwise::info_sync!(
            "loaded texture array {name} with {layers} layers",
            name = logwise::privacy::LogIt(&self.name),
            layers = self.layers
        );
        Ok(())
    }
}

impl Drop for TextureArray {
    fn drop(&mut self) {
        self.release();
        if self.render_surface.is_some()
            && let Some(surfaces) = &self.context.surfaces
        {
            surfaces.unregister(self.id);
        }
        self.context
            .cache
            .set_resource_memory(self.id, ResourceKind::TextureArray, 0);
    }
}
