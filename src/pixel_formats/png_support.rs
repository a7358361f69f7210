// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::image::{Error, Image};
use png::{BitDepth, ColorType, Transformations};
use std::io::Cursor;

/// Channel count of an 8-bit png colour type after palette expansion.
fn png_components(color_type: ColorType) -> Option<u32> {
    match color_type {
        ColorType::Grayscale => Some(1),
        ColorType::GrayscaleAlpha => Some(2),
        ColorType::Rgb => Some(3),
        ColorType::Rgba => Some(4),
        ColorType::Indexed => None,
    }
}

impl Image {
    /**
    Decodes a png file into an uncompressed image.

    Palettes are expanded and 16-bit channels are stripped to 8 bits, so the result
    always has 1-4 channels of 8 bits each.
    */
    pub fn from_png(bytes: &[u8]) -> Result<Image, Error> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;
        let (color_type, bit_depth) = reader.output_color_type();
        if bit_depth != BitDepth::Eight {
            return Err(Error::PngLayout);
        }
        let components = png_components(color_type).ok_or(Error::PngLayout)?;
        let size = reader.output_buffer_size().ok_or(Error::PngLayout)?;
        let mut buf = vec![0; size];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());
        let row = info.width as usize * components as usize;
        if info.line_size != row {
            //drop any per-row padding
            let packed = buf
                .chunks(info.line_size)
                .flat_map(|line| &line[..row])
                .copied()
                .collect();
            buf = packed;
        }
        Image::from_raw(info.width, info.height, components, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, color: ColorType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn load_rgba_png() {
        let pixels: Vec<u8> = (0..16).collect();
        let bytes = encode(2, 2, ColorType::Rgba, &pixels);
        let image = Image::from_png(&bytes).unwrap();
        assert_eq!((image.width(), image.height(), image.components()), (2, 2, 4));
        assert_eq!(image.data(), pixels.as_slice());
    }

    #[test]
    fn load_grayscale_png() {
        let bytes = encode(3, 1, ColorType::Grayscale, &[1, 2, 3]);
        let image = Image::from_png(&bytes).unwrap();
        assert_eq!(image.components(), 1);
        assert_eq!(image.data(), &[1, 2, 3]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(Image::from_png(b"not a png"), Err(Error::Png(_))));
    }
}
