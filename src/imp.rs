// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Graphics device backends.
//!
//! The software backend is always available.  The wgpu backend is behind `backend_wgpu`.

use crate::pixel_formats::PixelFormat;

pub mod software;

#[cfg(feature = "backend_wgpu")]
pub mod wgpu;

/// Errors reported by a [`crate::images::device::GraphicsDevice`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("device is lost")]
    DeviceLost,
    #[error("texture allocation failed")]
    Allocation,
    #[error("no such texture {0}")]
    NoSuchTexture(u64),
    #[error("level {0} has no storage")]
    LevelNotAllocated(u32),
    #[error("region lies outside the level")]
    Region,
    #[error("format {0:?} is not supported by this device")]
    UnsupportedFormat(PixelFormat),
    #[error("buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("backend error {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}
