// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use layered_texture::bindings::texture_array::{Error, RecoveryState, TextureArray, TextureContext};
use layered_texture::image::Image;
use layered_texture::images::render_surface::SurfaceQueue;
use layered_texture::imp::software::SoftwareDevice;
use layered_texture::resource::memory_cache::MemoryCache;
use layered_texture::resource::{GpuObject, LoadableResource};
use layered_texture::{PixelFormat, TextureUsage};
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

/// Creation while lost is deferred; reset creates an empty texture and reports the loss.
#[test]
fn create_while_lost_then_reset() {
    let (mut array, device, _cache) = setup("");
    device.lose_device();
    array.set_size(2, 4, 4, PixelFormat::Rgba8, TextureUsage::Static).unwrap();
    assert!(array.object().is_none());
    assert_eq!(array.recovery_state(), RecoveryState::Lost);

    device.restore_device();
    array.on_device_reset();
    assert!(array.object().is_some());
    assert!(array.is_data_lost());
    assert_eq!(array.recovery_state(), RecoveryState::Ready);
    array.clear_data_lost();
    assert!(!array.is_data_lost());
}

#[test]
fn uploads_while_lost_are_pending() {
    let (mut array, device, _cache) = setup("pending");
    array.set_size(1, 4, 4, PixelFormat::Rgba8, TextureUsage::Static).unwrap();
    device.lose_device();
    device.take_calls();

    array.set_data(0, 0, 0, 0, 4, 4, &[0; 64]).unwrap();
    assert!(array.is_data_pending());
    let image = Image::from_raw(4, 4, 4, vec![0; 64]).unwrap();
    array.set_layer_image(0, &image, false).unwrap();
    assert!(device.take_calls().is_empty());

    let mut dest = vec![0; 64];
    assert!(matches!(array.get_data(0, 0, &mut dest), Err(Error::DeviceLost)));

    array.on_device_lost();
    assert!(array.object().is_none());
    device.restore_device();
    assert_eq!(array.recovery_state(), RecoveryState::PendingUpload);
    array.on_device_reset();
    assert!(!array.is_data_pending());
    assert!(array.is_data_lost());
    assert!(array.object().is_some());

    //a successful whole-layer upload clears the loss
    array.set_layer_image(0, &image, false).unwrap();
    assert!(!array.is_data_lost());
}

/// A named array reloads itself from the cache after the device comes back.
#[test]
fn reset_reloads_through_the_cache() {
    let (mut array, device, cache) = setup("arrays/terrain.xml");
    let config = r#"<texturearray><layer name="grass.png"/><layer name="rock.png"/></texturearray>"#;
    cache.insert("arrays/terrain.xml", config.as_bytes().to_vec());
    cache.insert("arrays/grass.png", png_rgba(4, 4, 0x20));
    cache.insert("arrays/rock.png", png_rgba(4, 4, 0x40));

    array.load(&mut config.as_bytes()).unwrap();
    let before = array.object().unwrap();

    device.lose_device();
    array.on_device_lost();
    assert!(array.object().is_none());
    device.restore_device();
    array.on_device_reset();

    let after = array.object().unwrap();
    assert_ne!(before, after);
    assert!(!array.is_data_lost());
    assert_eq!(array.layers(), 2);
    let mut level0 = vec![0; 128];
    array.get_data(0, 0, &mut level0).unwrap();
    assert!(level0[..64].iter().all(|b| *b == 0x20));
    assert!(level0[64..].iter().all(|b| *b == 0x40));
}

/// A cached name whose contents no longer load leaves an empty texture behind.
#[test]
fn failed_reload_reports_loss() {
    let (mut array, device, cache) = setup("broken.xml");
    array.set_size(1, 4, 4, PixelFormat::Rgba8, TextureUsage::Static).unwrap();
    cache.insert("broken.xml", b"<texturearray>".to_vec());

    device.lose_device();
    array.on_device_lost();
    device.restore_device();
    array.on_device_reset();
    assert!(array.object().is_some());
    assert!(array.is_data_lost());
}

#[test]
fn reset_without_loss_is_a_no_op() {
    let (mut array, device, _cache) = setup("steady");
    array.set_size(1, 4, 4, PixelFormat::Rgba8, TextureUsage::Static).unwrap();
    let object = array.object();
    device.take_calls();
    array.on_device_reset();
    assert_eq!(array.object(), object);
    assert!(!array.is_data_lost());
    assert!(device.take_calls().is_empty());
}

#[test]
fn loss_reaches_the_render_surface() {
    let device = Arc::new(SoftwareDevice::new());
    let context = TextureContext::new(Arc::new(MemoryCache::new()))
        .with_graphics(device.clone())
        .with_surfaces(Arc::new(SurfaceQueue::new()));
    let mut array = TextureArray::new("target", context);
    array
        .set_size(1, 8, 8, PixelFormat::Rgba8, TextureUsage::RenderTarget)
        .unwrap();
    device.lose_device();
    array.on_device_lost();
    assert!(array.render_surface().unwrap().is_lost());
}

/// Loading while lost defers everything to the reset.
#[test]
fn load_while_lost_is_pending() {
    let (mut array, device, cache) = setup("late.xml");
    device.lose_device();
    array
        .load(&mut &br#"<texturearray><layer name="a.png"/></texturearray>"#[..])
        .unwrap();
    assert!(array.is_data_pending());
    assert_eq!(array.layers(), 0);
    assert!(cache.dependencies(array.id()).is_empty());
}
