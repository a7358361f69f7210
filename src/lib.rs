// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! layered_texture manages GPU 2D texture arrays: many same-sized images stacked as the
layers of one texture object.

The central type is [`TextureArray`].  It owns the device-side texture object and tracks
the format, mip levels and sampling parameters that object was created with.  It also
charges its memory use against a [`resource::ResourceCache`] budget.

# Sources of texel data

| Source                      | Entry point                                   | Notes                                                    |
|-----------------------------|-----------------------------------------------|----------------------------------------------------------|
| Raw rectangles              | [`TextureArray::set_data`]                    | Any level, any layer, any sub-rectangle                  |
| Decoded images              | [`TextureArray::set_layer_image`]             | Whole layer, mip chain generated or taken from the image |
| Image streams               | [`TextureArray::set_data_from_source`]        | png only                                                 |
| XML layer lists             | [`resource::LoadableResource`]                | Two phases: `begin_load` off the render thread, then `end_load` |

# Devices

Every GPU call goes through [`images::device::GraphicsDevice`].  Two implementations ship
with the crate:

* [`imp::software::SoftwareDevice`] keeps texture storage in host memory.  It can simulate
  device loss and missing compressed-format support.
* `imp::wgpu::WgpuDevice` (feature `backend_wgpu`, on by default) drives a real GPU.

A device may be lost at any time.  Texture arrays defer uploads while the device is lost
and recover through [`resource::GpuObject::on_device_reset`].
*/

pub mod bindings;
pub mod image;
pub mod images;
pub mod imp;
pub mod pixel_formats;
pub mod resource;

pub use bindings::sampler::{AddressMode, FilterMode, TextureParameters, TextureQuality};
pub use bindings::texture_array::{Error, TextureArray, TextureContext};
pub use bindings::visible_to::TextureUsage;
pub use image::Image;
pub use pixel_formats::PixelFormat;
