// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use layered_texture::bindings::texture_array::{Error, TextureArray, TextureContext};
use layered_texture::image::Image;
use layered_texture::imp::software::SoftwareDevice;
use layered_texture::pixel_formats::CompressedFormat;
use layered_texture::resource::memory_cache::MemoryCache;
use layered_texture::{PixelFormat, TextureQuality};
use std::sync::Arc;

fn setup(device: SoftwareDevice, quality: TextureQuality) -> (TextureArray, Arc<SoftwareDevice>) {
    let device = Arc::new(device);
    let context = TextureContext::new(Arc::new(MemoryCache::new()))
        .with_graphics(device.clone())
        .with_quality(quality);
    (TextureArray::new("compressed", context), device)
}

/// A 16x16 DXT1 image with a full chain: 16, 8, 4, 2 and 1 pixels wide.
fn dxt1_chain(fill: u8) -> Image {
    let levels = [128, 32, 8, 8, 8]
        .iter()
        .map(|len| vec![fill; *len])
        .collect();
    Image::from_compressed(16, 16, CompressedFormat::Dxt1, levels).unwrap()
}

#[test]
fn native_upload_keeps_every_level() {
    let (mut array, device) = setup(SoftwareDevice::new(), TextureQuality::High);
    array.set_layers(2);
    array.set_layer_image(0, &dxt1_chain(0), false).unwrap();
    array.set_layer_image(1, &dxt1_chain(0x11), false).unwrap();
    assert_eq!(array.format(), Some(PixelFormat::Dxt1));
    assert!(array.is_compressed());
    assert_eq!((array.width(), array.levels()), (16, 5));
    //rows times row size, with 2x2 and 1x1 still costing a whole block
    assert_eq!(array.layer_memory().get(1), Some(128 + 32 + 8 + 8 + 8));

    let level0 = device.level_bytes(array.object().unwrap(), 0).unwrap();
    assert_eq!(level0.len(), 256);
    assert!(level0[128..].iter().all(|b| *b == 0x11));
    let mut smallest = vec![0; array.level_data_size(4)];
    assert_eq!(smallest.len(), 16);
    array.get_data(0, 4, &mut smallest).unwrap();
    assert_eq!(&smallest[8..], &[0x11; 8]);
}

/// Skipping stops once the retained level would be smaller than a block.
#[test]
fn quality_skip_respects_blocks() {
    let (mut array, _device) = setup(SoftwareDevice::new(), TextureQuality::Low);
    array.set_layers(1);
    array.set_layer_image(0, &dxt1_chain(0), false).unwrap();
    assert_eq!((array.width(), array.height(), array.levels()), (4, 4, 3));
    assert_eq!(array.layer_memory().get(0), Some(24));

    let mut parameters = *array.parameters();
    parameters.mips_to_skip.set(TextureQuality::Low, 5);
    array.set_parameters(parameters).unwrap();
    array.set_layer_image(0, &dxt1_chain(0), false).unwrap();
    assert_eq!(array.width(), 4);
}

/// Without native support every level is decoded to RGBA on the way in.
#[test]
fn decompresses_when_the_device_cannot_sample() {
    let (mut array, device) = setup(
        SoftwareDevice::new().with_compressed_formats(&[CompressedFormat::Dxt5]),
        TextureQuality::High,
    );
    array.set_layers(1);
    array.set_layer_image(0, &dxt1_chain(0), false).unwrap();
    assert_eq!(array.format(), Some(PixelFormat::Rgba8));
    assert!(!array.is_compressed());
    assert_eq!(array.levels(), 5);
    assert_eq!(
        array.layer_memory().get(0),
        Some((256 + 64 + 16 + 4 + 1) * 4)
    );
    let level0 = device.level_bytes(array.object().unwrap(), 0).unwrap();
    //an all-zero block decodes to opaque black
    assert!(level0.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn compressed_layers_must_match() {
    let (mut array, _device) = setup(SoftwareDevice::new(), TextureQuality::High);
    array.set_layers(2);
    array.set_layer_image(0, &dxt1_chain(0), false).unwrap();
    let dxt5 = Image::from_compressed(16, 16, CompressedFormat::Dxt5, vec![vec![0; 256]]).unwrap();
    assert!(matches!(
        array.set_layer_image(1, &dxt5, false),
        Err(Error::LayerMismatch { format: PixelFormat::Dxt5, .. })
    ));
    let raw = Image::from_raw(16, 16, 4, vec![0; 1024]).unwrap();
    assert!(matches!(
        array.set_layer_image(1, &raw, false),
        Err(Error::LayerMismatch { format: PixelFormat::Rgba8, .. })
    ));
}

/// Replacing compressed data with an uncompressed image goes back to a full chain.
#[test]
fn uncompressed_after_compressed_gets_a_full_chain() {
    let (mut array, _device) = setup(SoftwareDevice::new(), TextureQuality::High);
    array.set_layers(1);
    let single = Image::from_compressed(8, 8, CompressedFormat::Dxt5, vec![vec![0; 64], vec![0; 16]]).unwrap();
    array.set_layer_image(0, &single, false).unwrap();
    assert_eq!((array.levels(), array.requested_levels()), (2, 2));

    let raw = Image::from_raw(8, 8, 4, vec![0; 256]).unwrap();
    array.set_layer_image(0, &raw, false).unwrap();
    assert_eq!(array.requested_levels(), 0);
    assert_eq!(array.levels(), 4);
}

#[test]
fn etc1_uploads_natively() {
    let (mut array, _device) = setup(SoftwareDevice::new(), TextureQuality::High);
    array.set_layers(1);
    let etc = Image::from_compressed(4, 4, CompressedFormat::Etc1, vec![vec![0; 8]]).unwrap();
    array.set_layer_image(0, &etc, false).unwrap();
    assert_eq!(array.format(), Some(PixelFormat::Etc1));
    assert_eq!(array.levels(), 1);
    assert_eq!(array.layer_memory().get(0), Some(8));
}
