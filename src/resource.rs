// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Resource plumbing shared by GPU resources.

A resource is loaded in two phases.  [`LoadableResource::begin_load`] does everything that
is safe on a background thread: parsing, resolving dependencies, decoding.
[`LoadableResource::end_load`] runs on the thread that owns the graphics device and does the
uploads.  Resources that own device objects also implement [`GpuObject`] so that they can
be told about device loss and reset.
*/

pub mod cache;
pub mod load;
pub mod memory_cache;

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};

pub use cache::{ResourceCache, ResourceKind};

/// Process-unique identity of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl ResourceId {
    pub fn next() -> Self {
        ResourceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Progress of a resource's load, as driven by whoever schedules it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsyncLoadState {
    /// Not being loaded.
    #[default]
    Done,
    /// Waiting for a background worker.
    Queued,
    /// Phase one is running on a background worker.
    Loading,
    /// Phase one succeeded; phase two has not run yet.
    Success,
    /// Phase one failed.
    Failed,
}

/// A resource with a two-phase load.
pub trait LoadableResource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resource name as known to the cache.  May be empty for unnamed resources.
    fn name(&self) -> &str;

    fn id(&self) -> ResourceId;

    /// Background-safe phase: parse `source` and prefetch dependencies.
    fn begin_load(&mut self, source: &mut dyn Read) -> Result<(), Self::Error>;

    /// Device-owning phase: upload what [`LoadableResource::begin_load`] prepared.
    fn end_load(&mut self) -> Result<(), Self::Error>;

    /// Runs both phases back to back.
    fn load(&mut self, source: &mut dyn Read) -> Result<(), Self::Error> {
        self.begin_load(source)?;
        self.end_load()
    }
}

/// An object owning state on the graphics device.
pub trait GpuObject {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create(&mut self) -> Result<(), Self::Error>;

    fn release(&mut self);

    /// The device is gone, and every object on it with it.
    fn on_device_lost(&mut self);

    /// The device is usable again.
    fn on_device_reset(&mut self);
}

/// Object-safe view of a [`LoadableResource`], used by caches to reload by name.
pub trait Reloadable {
    fn name(&self) -> &str;

    /// Reruns both load phases from `source`.  Returns whether the load succeeded.
    fn reload_from(&mut self, source: &mut dyn Read) -> bool;
}

impl<T: LoadableResource> Reloadable for T {
    fn name(&self) -> &str {
        LoadableResource::name(self)
    }

    fn reload_from(&mut self, source: &mut dyn Read) -> bool {
        match self.load(source) {
            Ok(()) => true,
            Err(err) => {
                logwise::error_sync!(
                    "reload of {name} failed: {err}",
                    name = logwise::privacy::LogIt(LoadableResource::name(self)),
                    err = logwise::privacy::LogIt(&err)
                );
                false
            }
        }
    }
}
