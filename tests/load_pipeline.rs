// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use layered_texture::bindings::sampler::TextureCoordinate;
use layered_texture::bindings::texture_array::{Error, TextureArray, TextureContext};
use layered_texture::imp::software::SoftwareDevice;
use layered_texture::resource::load::{LoadSession, TextureConfig};
use layered_texture::resource::memory_cache::MemoryCache;
use layered_texture::resource::{AsyncLoadState, LoadableResource, ResourceCache, ResourceKind};
use layered_texture::{AddressMode, FilterMode, PixelFormat};
use std::sync::Arc;

fn png_rgba(width: u32, height: u32, fill: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![fill; (width * height * 4) as usize])
            .unwrap();
    }
    bytes
}

fn setup(name: &str) -> (TextureArray, Arc<SoftwareDevice>, Arc<MemoryCache>) {
    let device = Arc::new(SoftwareDevice::new());
    let cache = Arc::new(MemoryCache::new());
    let context = TextureContext::new(cache.clone()).with_graphics(device.clone());
    (TextureArray::new(name, context), device, cache)
}

const TERRAIN: &str = r#"
<texturearray>
    <address coord="u" mode="clamp"/>
    <filter mode="nearest"/>
    <layer name="grass.png"/>
    <layer name="shared/rock.png"/>
    <layer name="sand.png"/>
</texturearray>"#;

#[test]
fn loads_every_layer_in_order() {
    let (mut array, device, cache) = setup("arrays/terrain.xml");
    cache.insert("arrays/grass.png", png_rgba(8, 8, 1));
    cache.insert("shared/rock.png", png_rgba(8, 8, 2));
    cache.insert("arrays/sand.png", png_rgba(8, 8, 3));

    array.load(&mut TERRAIN.as_bytes()).unwrap();
    assert_eq!(array.layers(), 3);
    assert_eq!((array.width(), array.height(), array.levels()), (8, 8, 4));
    assert_eq!(array.format(), Some(PixelFormat::Rgba8));
    assert_eq!(
        cache.dependencies(array.id()),
        vec!["arrays/grass.png", "shared/rock.png", "arrays/sand.png"]
    );

    let parameters = array.parameters();
    assert_eq!(parameters.filter, FilterMode::Nearest);
    assert_eq!(parameters.address_mode(TextureCoordinate::U), AddressMode::Clamp);
    assert_eq!(parameters.address_mode(TextureCoordinate::V), AddressMode::Wrap);
    assert_eq!(
        device.applied_parameters(array.object().unwrap()),
        Some(*parameters)
    );

    let level0 = device.level_bytes(array.object().unwrap(), 0).unwrap();
    for (layer, chunk) in level0.chunks_exact(8 * 8 * 4).enumerate() {
        assert!(chunk.iter().all(|b| *b as usize == layer + 1));
    }
}

/// A missing image leaves its layer empty without shifting the later ones.
#[test]
fn missing_layer_keeps_its_slot() {
    let (mut array, device, cache) = setup("arrays/terrain.xml");
    cache.insert("arrays/grass.png", png_rgba(4, 4, 1));
    cache.insert("arrays/sand.png", png_rgba(4, 4, 3));

    array.load(&mut TERRAIN.as_bytes()).unwrap();
    assert_eq!(array.layers(), 3);
    assert_eq!(array.layer_memory().get(1), Some(0));
    assert!(array.layer_memory().get(2).unwrap() > 0);
    let level0 = device.level_bytes(array.object().unwrap(), 0).unwrap();
    assert!(level0[128..].iter().all(|b| *b == 3));
    //the dependency is still recorded so the array reloads when the image appears
    assert_eq!(cache.dependencies(array.id()).len(), 3);
}

/// Reloading replaces the previous dependency set.
#[test]
fn reload_resets_dependencies() {
    let (mut array, _device, cache) = setup("a.xml");
    cache.insert("one.png", png_rgba(2, 2, 1));
    cache.insert("two.png", png_rgba(2, 2, 2));
    array
        .load(&mut &br#"<texturearray><layer name="one.png"/></texturearray>"#[..])
        .unwrap();
    array
        .load(&mut &br#"<texturearray><layer name="two.png"/></texturearray>"#[..])
        .unwrap();
    assert_eq!(cache.dependencies(array.id()), vec!["two.png"]);
}

#[test]
fn settings_shape_the_texture() {
    let (mut array, device, cache) = setup("flat.xml");
    cache.insert("flat.png", png_rgba(8, 8, 5));
    let config = r#"<texturearray>
        <mipmap enable="no"/>
        <srgb enable="true"/>
        <layer name="flat.png"/>
    </texturearray>"#;
    array.load(&mut config.as_bytes()).unwrap();
    assert_eq!(array.levels(), 1);
    assert!(array.parameters().srgb);
    assert_eq!(
        device.level_format(array.object().unwrap(), 0),
        Some((PixelFormat::Rgba8, true))
    );
}

/// Both phases may run separately, the first off the rendering thread.
#[test]
fn two_phase_load() {
    let (mut array, device, cache) = setup("split.xml");
    cache.insert("only.png", png_rgba(4, 4, 7));
    array.set_async_load_state(AsyncLoadState::Loading);
    array
        .begin_load(&mut &br#"<texturearray><layer name="only.png"/></texturearray>"#[..])
        .unwrap();
    assert!(array.object().is_none());
    assert_eq!(device.live_textures(), 0);
    array.set_async_load_state(AsyncLoadState::Success);
    array.end_load().unwrap();
    array.set_async_load_state(AsyncLoadState::Done);
    assert_eq!(array.layers(), 1);
    assert!(array.object().is_some());

    //a second end_load has nothing to do
    array.end_load().unwrap();
    assert_eq!(array.layers(), 1);
}

#[test]
fn prefetch_precalculates_levels() {
    let cache = MemoryCache::new();
    cache.insert("dir/a.png", png_rgba(4, 4, 0));
    let config = TextureConfig::parse(r#"<t><layer name="a.png"/><layer name="b.png"/></t>"#).unwrap();
    let owner = layered_texture::resource::ResourceId::next();
    let session = LoadSession::prefetch(config, "dir/x.xml", owner, &cache, true);
    let images = session.images();
    assert_eq!(images.len(), 2);
    assert!(images[0].as_ref().unwrap().has_cached_next_level());
    assert!(images[1].is_none());
    assert_eq!(session.config().layers().len(), 2);
}

#[test]
fn malformed_document_fails_the_load() {
    let (mut array, _device, _cache) = setup("bad.xml");
    assert!(matches!(
        array.load(&mut &b"<texturearray><layer"[..]),
        Err(Error::Parse(_))
    ));
    assert!(matches!(
        array.load(&mut &br#"<t><border color="red"/></t>"#[..]),
        Err(Error::Parse(_))
    ));
}

/// Loading over the texture budget asks the cache to drop unused materials.
#[test]
fn budget_pressure_releases_materials() {
    let (mut array, _device, cache) = setup("budget.xml");
    cache.insert("a.png", png_rgba(2, 2, 0));
    let config = br#"<texturearray><layer name="a.png"/></texturearray>"#;

    array.load(&mut &config[..]).unwrap();
    assert_eq!(cache.release_count(ResourceKind::Material), 0);
    let used = array.memory_use() as u64;
    assert_eq!(cache.memory_use(ResourceKind::TextureArray), used);

    //exactly at the budget is not over it
    cache.set_memory_budget(ResourceKind::TextureArray, used);
    array.load(&mut &config[..]).unwrap();
    assert_eq!(cache.release_count(ResourceKind::Material), 0);

    cache.set_memory_budget(ResourceKind::TextureArray, used - 1);
    array.load(&mut &config[..]).unwrap();
    assert_eq!(cache.release_count(ResourceKind::Material), 1);
}

/// Every live array reports its memory to the cache, so one load can push the next over budget.
#[test]
fn loaded_arrays_count_against_the_budget() {
    let device = Arc::new(SoftwareDevice::new());
    let cache = Arc::new(MemoryCache::new());
    let context = || TextureContext::new(cache.clone()).with_graphics(device.clone());
    let mut first = TextureArray::new("first.xml", context());
    let mut second = TextureArray::new("second.xml", context());
    cache.insert("big.png", png_rgba(16, 16, 1));
    let config = br#"<texturearray><layer name="big.png"/></texturearray>"#;

    let empty = cache.memory_use(ResourceKind::TextureArray);
    assert_eq!(empty, (first.memory_use() + second.memory_use()) as u64);
    cache.set_memory_budget(ResourceKind::TextureArray, empty + 16);

    first.load(&mut &config[..]).unwrap();
    assert_eq!(cache.release_count(ResourceKind::Material), 0);
    assert_eq!(
        cache.memory_use(ResourceKind::TextureArray),
        (first.memory_use() + second.memory_use()) as u64
    );
    assert!(cache.memory_use(ResourceKind::TextureArray) > empty + 16);

    second.load(&mut &config[..]).unwrap();
    assert_eq!(cache.release_count(ResourceKind::Material), 1);

    drop(first);
    drop(second);
    assert_eq!(cache.memory_use(ResourceKind::TextureArray), 0);
}

#[test]
fn headless_load_parses_nothing() {
    let cache = Arc::new(MemoryCache::new());
    let mut array = TextureArray::new("headless.xml", TextureContext::new(cache.clone()));
    array.load(&mut &b"not even xml"[..]).unwrap();
    assert_eq!(array.layers(), 0);
    assert!(cache.dependencies(array.id()).is_empty());
}
