// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Texture resources and the parameters they are sampled with. */

pub mod sampler;
pub mod texture_array;
pub mod visible_to;
