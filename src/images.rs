// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The device side: the graphics device seam and render surfaces. */

pub mod device;
pub mod render_surface;
