// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device loss and reset handling for texture arrays.

use super::{Error, TextureArray};
use crate::resource::GpuObject;

/// Where a texture array stands with respect to the graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    /// Device available, nothing waiting.
    Ready,
    /// The device is lost; uploads are deferred.
    Lost,
    /// An upload was deferred and will be replayed on reset.
    PendingUpload,
}

impl RecoveryState {
    pub(super) fn derive(device_lost: bool, data_pending: bool) -> Self {
        if device_lost {
            RecoveryState::Lost
        } else if data_pending {
            RecoveryState::PendingUpload
        } else {
            RecoveryState::Ready
        }
    }
}

impl GpuObject for TextureArray {
    type Error = Error;

    fn create(&mut self) -> Result<(), Error> {
        TextureArray::create(self)
    }

    fn release(&mut self) {
        TextureArray::release(self)
    }

    fn on_device_lost(&mut self) {
        logwise::info_sync!(
            "texture array {name} lost its device",
            name = logwise::privacy::LogIt(&self.name)
        );
        //the device took the object with it
        self.object = None;
        if let Some(surface) = &self.render_surface {
            surface.on_device_lost();
        }
    }

    fn on_device_reset(&mut self) {
        if self.object.is_none() || self.data_pending {
            let cache = self.context.cache.clone();
            if !self.name.is_empty() && cache.exists(&self.name) {
                logwise::info_sync!(
                    "reloading texture array {name} after reset",
                    name = logwise::privacy::LogIt(&self.name)
                );
                self.data_lost = !cache.reload_resource(&mut *self);
            }
            if self.object.is_none() {
                if let Err(err) = TextureArray::create(self) {
                    logwise::error_sync!(
                        "can't recreate texture array {name}: {err}",
                        name = logwise::privacy::LogIt(&self.name),
                        err = logwise::privacy::LogIt(&err)
                    );
                }
                self.data_lost = true;
            }
        }
        self.data_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_wins() {
        assert_eq!(RecoveryState::derive(true, true), RecoveryState::Lost);
        assert_eq!(RecoveryState::derive(false, true), RecoveryState::PendingUpload);
        assert_eq!(RecoveryState::derive(false, false), RecoveryState::Ready);
    }
}
