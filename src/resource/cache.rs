// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The resource cache seam.

use crate::image::Image;
use crate::resource::{Reloadable, ResourceId};
use std::fmt::Debug;
use std::io::Cursor;
use std::sync::Arc;

/// Kinds of resources the cache budgets separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    TextureArray,
    Material,
    Image,
}

/**
A shared cache of named resources.

The cache owns dependency bookkeeping and memory budgets.  Resources only record their
dependencies and consult budgets; they never own the cache.
*/
pub trait ResourceCache: Send + Sync + Debug {
    /// Forgets every dependency previously recorded for `resource`.
    fn reset_dependencies(&self, resource: ResourceId);

    /// Records that `resource` must be reloaded when `dependency` changes.
    fn store_dependency(&self, resource: ResourceId, dependency: &str);

    /// Decodes `name` as an image without keeping it in the cache.
    fn temp_image(&self, name: &str) -> Option<Arc<Image>>;

    fn exists(&self, name: &str) -> bool;

    /// Raw bytes of `name`.
    fn read(&self, name: &str) -> Option<Vec<u8>>;

    /// Budget in bytes for `kind`, 0 meaning unlimited.
    fn memory_budget(&self, kind: ResourceKind) -> u64;

    /// Total reported memory of every live resource of `kind`.
    fn memory_use(&self, kind: ResourceKind) -> u64;

    /// Reports the current memory of `resource`.  Reporting 0 forgets the resource.
    fn set_resource_memory(&self, resource: ResourceId, kind: ResourceKind, bytes: u64);

    /// Frees cached resources of `kind` that nothing references.
    fn release_unused(&self, kind: ResourceKind);

    /// Reloads `resource` from the bytes stored under its name.  Returns whether it succeeded.
    fn reload_resource(&self, resource: &mut dyn Reloadable) -> bool {
        let Some(bytes) = self.read(resource.name()) else {
            logwise::warn_sync!(
                "can't reload {name}, not in cache",
                name = logwise::privacy::LogIt(resource.name())
            );
            return false;
        };
        resource.reload_from(&mut Cursor::new(bytes))
    }
}
