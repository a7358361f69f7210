// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Usage declarations for texture arrays.
//!
//! Declaring how a texture array will be used lets the device pick storage and
//! lets the resource decide whether it needs a render-target side surface.
//!
//! # Examples
//!
//! ```
//! use layered_texture::bindings::visible_to::TextureUsage;
//!
//! assert!(TextureUsage::RenderTarget.is_render_target());
//! assert!(!TextureUsage::Static.is_render_target());
//! ```

/// Describes how a texture array will be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureUsage {
    /// Uploaded once, sampled by shaders.
    #[default]
    Static,
    /// Updated from the CPU often, sampled by shaders.
    Dynamic,
    /// Rendered into through a [`crate::images::render_surface::RenderSurface`].
    RenderTarget,
    /// Depth-stencil attachment.
    ///
    /// Texture arrays reject this usage.
    DepthStencil,
}

impl TextureUsage {
    pub const fn is_render_target(&self) -> bool {
        matches!(self, TextureUsage::RenderTarget)
    }
}
