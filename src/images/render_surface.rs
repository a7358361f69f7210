// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Render-target side surfaces and the per-frame update queue.

A texture array created with [`crate::bindings::visible_to::TextureUsage::RenderTarget`]
owns a [`RenderSurface`] and registers itself with a [`RenderSurfaceQueue`].  Once per frame
the owner of the queue asks each registered texture to
[`handle_render_surface_update`](crate::bindings::texture_array::TextureArray::handle_render_surface_update),
which queues the surface for rendering when needed.
*/

use crate::resource::ResourceId;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use wasm_safe_mutex::Mutex;

/// When a render surface is re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Only after [`RenderSurface::queue_update`].
    #[default]
    Manual,
    /// Every frame.
    Always,
}

/// The render-target side of a texture array.
#[derive(Debug)]
pub struct RenderSurface {
    owner: ResourceId,
    update_mode: Mutex<UpdateMode>,
    update_queued: AtomicBool,
    lost: AtomicBool,
    releases: AtomicU32,
}

impl RenderSurface {
    pub(crate) fn new(owner: ResourceId) -> Self {
        RenderSurface {
            owner,
            update_mode: Mutex::new(UpdateMode::default()),
            update_queued: AtomicBool::new(false),
            lost: AtomicBool::new(false),
            releases: AtomicU32::new(0),
        }
    }

    /// The texture array this surface renders into.
    pub fn owner(&self) -> ResourceId {
        self.owner
    }

    pub fn update_mode(&self) -> UpdateMode {
        *self.update_mode.lock_sync()
    }

    pub fn set_update_mode(&self, mode: UpdateMode) {
        *self.update_mode.lock_sync() = mode;
    }

    /// Requests a re-render on the next frame.
    pub fn queue_update(&self) {
        self.update_queued.store(true, Ordering::Relaxed);
    }

    pub fn is_update_queued(&self) -> bool {
        self.update_queued.load(Ordering::Relaxed)
    }

    pub fn reset_update_queued(&self) {
        self.update_queued.store(false, Ordering::Relaxed);
    }

    pub(crate) fn on_device_lost(&self) {
        self.lost.store(true, Ordering::Relaxed);
    }

    /// Whether the device was lost since this surface last had its GPU side released.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Relaxed)
    }

    pub(crate) fn release(&self) {
        self.lost.store(false, Ordering::Relaxed);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// How many times the GPU side of this surface was released.
    pub fn release_count(&self) -> u32 {
        self.releases.load(Ordering::Relaxed)
    }
}

/// The per-frame render surface update subsystem.
pub trait RenderSurfaceQueue: Send + Sync + Debug {
    /// Subscribes a texture to per-frame surface updates.
    fn register(&self, texture: ResourceId);

    fn unregister(&self, texture: ResourceId);

    /// Schedules `surface` to be rendered this frame.
    fn queue_surface(&self, surface: Arc<RenderSurface>);
}

#[derive(Debug, Default)]
struct QueueState {
    registered: HashSet<ResourceId>,
    queued: Vec<Arc<RenderSurface>>,
}

/// A [`RenderSurfaceQueue`] that records registrations and queued surfaces.
#[derive(Debug)]
pub struct SurfaceQueue {
    state: Mutex<QueueState>,
}

impl Default for SurfaceQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceQueue {
    pub fn new() -> Self {
        SurfaceQueue {
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn is_registered(&self, texture: ResourceId) -> bool {
        self.state.lock_sync().registered.contains(&texture)
    }

    pub fn registered(&self) -> Vec<ResourceId> {
        self.state.lock_sync().registered.iter().copied().collect()
    }

    /// Drains the surfaces queued since the last call.
    pub fn take_queued(&self) -> Vec<Arc<RenderSurface>> {
        std::mem::take(&mut self.state.lock_sync().queued)
    }
}

impl RenderSurfaceQueue for SurfaceQueue {
    fn register(&self, texture: ResourceId) {
        self.state.lock_sync().registered.insert(texture);
    }

    fn unregister(&self, texture: ResourceId) {
        self.state.lock_sync().registered.remove(&texture);
    }

    fn queue_surface(&self, surface: Arc<RenderSurface>) {
        logwise::trace_sync!("queue render surface {owner}", owner = surface.owner().raw());
        self.state.lock_sync().queued.push(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_records() {
        let queue = SurfaceQueue::new();
        let id = ResourceId::next();
        queue.register(id);
        assert!(queue.is_registered(id));
        queue.queue_surface(Arc::new(RenderSurface::new(id)));
        assert_eq!(queue.take_queued().len(), 1);
        assert!(queue.take_queued().is_empty());
        queue.unregister(id);
        assert!(!queue.is_registered(id));
    }

    #[test]
    fn update_flags() {
        let surface = RenderSurface::new(ResourceId::next());
        assert_eq!(surface.update_mode(), UpdateMode::Manual);
        surface.queue_update();
        assert!(surface.is_update_queued());
        surface.reset_update_queued();
        assert!(!surface.is_update_queued());
        surface.on_device_lost();
        assert!(surface.is_lost());
        surface.release();
        assert!(!surface.is_lost());
        assert_eq!(surface.release_count(), 1);
    }
}
