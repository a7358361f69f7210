// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-layer memory bookkeeping.

/// Bytes charged for each layer slot on top of the layer's pixel data.
pub const LAYER_SLOT_OVERHEAD: usize = std::mem::size_of::<usize>();

/// Byte usage of each layer, one slot per layer of the array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMemory {
    usage: Vec<usize>,
}

impl LayerMemory {
    /// Resizes to `layers` slots and zeroes every slot.
    pub fn resize_to(&mut self, layers: u32) {
        self.usage.clear();
        self.usage.resize(layers as usize, 0);
    }

    pub fn layers(&self) -> u32 {
        self.usage.len() as u32
    }

    pub fn get(&self, layer: u32) -> Option<usize> {
        self.usage.get(layer as usize).copied()
    }

    pub(crate) fn record(&mut self, layer: u32, bytes: usize) {
        if let Some(slot) = self.usage.get_mut(layer as usize) {
            *slot = bytes;
        }
    }

    /// Whether any layer other than `layer` holds data.
    pub fn populated_except(&self, layer: u32) -> bool {
        self.usage
            .iter()
            .enumerate()
            .any(|(i, bytes)| i != layer as usize && *bytes != 0)
    }

    pub fn total(&self) -> usize {
        self.usage.iter().sum()
    }

    /// `fixed` plus slot overhead plus every layer's data.
    pub fn aggregate(&self, fixed: usize) -> usize {
        fixed + LAYER_SLOT_OVERHEAD * self.usage.len() + self.total()
    }
}
