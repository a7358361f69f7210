// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! An in-memory [`ResourceCache`].

use crate::image::Image;
use crate::resource::{ResourceCache, ResourceId, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use wasm_safe_mutex::Mutex;

#[derive(Debug, Default)]
struct CacheState {
    blobs: HashMap<String, Vec<u8>>,
    images: HashMap<String, Arc<Image>>,
    dependencies: HashMap<ResourceId, Vec<String>>,
    budgets: HashMap<ResourceKind, u64>,
    uses: HashMap<(ResourceKind, ResourceId), u64>,
    releases: HashMap<ResourceKind, u32>,
}

/**
A cache holding named byte blobs and pre-decoded images.

Blobs stand in for files: image blobs are decoded as png on request, and any blob can serve
as the source of a reload.  Memory use per kind is the sum of what live resources of that
kind report through [`ResourceCache::set_resource_memory`].
*/
#[derive(Debug)]
pub struct MemoryCache {
    state: Mutex<CacheState>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.state.lock_sync().blobs.insert(name.into(), bytes);
    }

    /// Stores an already decoded image.  Takes precedence over a blob of the same name.
    pub fn insert_image(&self, name: impl Into<String>, image: Arc<Image>) {
        self.state.lock_sync().images.insert(name.into(), image);
    }

    pub fn remove(&self, name: &str) {
        let mut state = self.state.lock_sync();
        state.blobs.remove(name);
        state.images.remove(name);
    }

    pub fn set_memory_budget(&self, kind: ResourceKind, bytes: u64) {
        self.state.lock_sync().budgets.insert(kind, bytes);
    }

    /// Dependencies recorded for `resource`, in recording order.
    pub fn dependencies(&self, resource: ResourceId) -> Vec<String> {
        self.state
            .lock_sync()
            .dependencies
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }

    /// How many times unused resources of `kind` were released.
    pub fn release_count(&self, kind: ResourceKind) -> u32 {
        self.state
            .lock_sync()
            .releases
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }
}

impl ResourceCache for MemoryCache {
    fn reset_dependencies(&self, resource: ResourceId) {
        self.state.lock_sync().dependencies.remove(&resource);
    }

    fn store_dependency(&self, resource: ResourceId, dependency: &str) {
        self.state
            .lock_sync()
            .dependencies
            .entry(resource)
            .or_default()
            .push(dependency.to_string());
    }

    fn temp_image(&self, name: &str) -> Option<Arc<Image>> {
        let bytes = {
            let state = self.state.lock_sync();
            if let Some(image) = state.images.get(name) {
                return Some(image.clone());
            }
            state.blobs.get(name)?.clone()
        };
        match Image::from_png(&bytes) {
            Ok(image) => Some(Arc::new(image)),
            Err(err) => {
                logwise::error_sync!(
                    "can't decode {name}: {err}",
                    name = logwise::privacy::LogIt(name),
                    err = logwise::privacy::LogIt(&err)
                );
                None
            }
        }
    }

    fn exists(&self, name: &str) -> bool {
        let state = self.state.lock_sync();
        state.blobs.contains_key(name) || state.images.contains_key(name)
    }

    fn read(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock_sync().blobs.get(name).cloned()
    }

    fn memory_budget(&self, kind: ResourceKind) -> u64 {
        self.state.lock_sync().budgets.get(&kind).copied().unwrap_or(0)
    }

    fn memory_use(&self, kind: ResourceKind) -> u64 {
        self.state
            .lock_sync()
            .uses
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, bytes)| *bytes)
            .sum()
    }

    fn set_resource_memory(&self, resource: ResourceId, kind: ResourceKind, bytes: u64) {
        let mut state = self.state.lock_sync();
        if bytes == 0 {
            state.uses.remove(&(kind, resource));
        } else {
            state.uses.insert((kind, resource), bytes);
        }
    }

    fn release_unused(&self, kind: ResourceKind) {
        logwise::info_sync!(
            "releasing unused {kind}",
            kind = logwise::privacy::LogIt(&kind)
        );
        *self.state.lock_sync().releases.entry(kind).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_reset() {
        let cache = MemoryCache::new();
        let id = ResourceId::next();
        cache.store_dependency(id, "a.png");
        cache.store_dependency(id, "b.png");
        assert_eq!(cache.dependencies(id), vec!["a.png", "b.png"]);
        cache.reset_dependencies(id);
        assert!(cache.dependencies(id).is_empty());
    }

    #[test]
    fn images_and_blobs() {
        let cache = MemoryCache::new();
        let image = Arc::new(Image::from_raw(1, 1, 1, vec![3]).unwrap());
        cache.insert_image("a.png", image.clone());
        cache.insert("garbage.png", b"nope".to_vec());
        assert!(Arc::ptr_eq(&cache.temp_image("a.png").unwrap(), &image));
        assert!(cache.temp_image("garbage.png").is_none());
        assert!(cache.temp_image("missing.png").is_none());
        assert!(cache.exists("garbage.png"));
        assert_eq!(cache.read("garbage.png").unwrap(), b"nope");
        assert!(cache.read("a.png").is_none());
    }

    #[test]
    fn budgets_default_to_unlimited() {
        let cache = MemoryCache::new();
        assert_eq!(cache.memory_budget(ResourceKind::TextureArray), 0);
        cache.set_memory_budget(ResourceKind::TextureArray, 100);
        assert_eq!(cache.memory_budget(ResourceKind::TextureArray), 100);
        cache.release_unused(ResourceKind::Material);
        assert_eq!(cache.release_count(ResourceKind::Material), 1);
    }

    #[test]
    fn memory_use_sums_live_resources() {
        let cache = MemoryCache::new();
        let (a, b) = (ResourceId::next(), ResourceId::next());
        cache.set_resource_memory(a, ResourceKind::TextureArray, 100);
        cache.set_resource_memory(b, ResourceKind::TextureArray, 50);
        cache.set_resource_memory(b, ResourceKind::Material, 7);
        assert_eq!(cache.memory_use(ResourceKind::TextureArray), 150);
        assert_eq!(cache.memory_use(ResourceKind::Material), 7);

        cache.set_resource_memory(a, ResourceKind::TextureArray, 20);
        assert_eq!(cache.memory_use(ResourceKind::TextureArray), 70);
        cache.set_resource_memory(b, ResourceKind::TextureArray, 0);
        assert_eq!(cache.memory_use(ResourceKind::TextureArray), 20);
    }
}
