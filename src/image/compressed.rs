// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! One mip level of a block-compressed image, and its expansion to RGBA8.

use super::Error;
use crate::pixel_formats::{BLOCK_SIZE, CompressedFormat};

/// A borrowed view of one compressed mip level.
#[derive(Debug, Clone, Copy)]
pub struct CompressedLevel<'a> {
    format: CompressedFormat,
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> CompressedLevel<'a> {
    pub(crate) fn new(format: CompressedFormat, width: u32, height: u32, data: &'a [u8]) -> Self {
        CompressedLevel {
            format,
            width,
            height,
            data,
        }
    }

    pub fn format(&self) -> CompressedFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Rows of blocks.
    pub fn rows(&self) -> u32 {
        self.height.div_ceil(BLOCK_SIZE)
    }

    /// Bytes per row of blocks.
    pub fn row_size(&self) -> u32 {
        self.width.div_ceil(BLOCK_SIZE) * self.format.block_bytes()
    }

    /// Expands this level into tightly packed RGBA8 pixels.
    ///
    /// `dest` must hold at least `width * height * 4` bytes.
    pub fn decompress(&self, dest: &mut [u8]) -> Result<(), Error> {
        let expected = self.width as usize * self.height as usize * 4;
        if dest.len() < expected {
            return Err(Error::Destination {
                expected,
                actual: dest.len(),
            });
        }
        let block_bytes = self.format.block_bytes() as usize;
        let blocks_wide = self.width.div_ceil(BLOCK_SIZE) as usize;
        let mut texels = [[0u8; 4]; 16];
        for by in 0..self.rows() as usize {
            for bx in 0..blocks_wide {
                let offset = (by * blocks_wide + bx) * block_bytes;
                let block = &self.data[offset..offset + block_bytes];
                match self.format {
                    CompressedFormat::Dxt1 => decode_color_block(block, true, &mut texels),
                    CompressedFormat::Dxt3 => {
                        decode_color_block(&block[8..], false, &mut texels);
                        decode_explicit_alpha(&block[..8], &mut texels);
                    }
                    CompressedFormat::Dxt5 => {
                        decode_color_block(&block[8..], false, &mut texels);
                        decode_interpolated_alpha(&block[..8], &mut texels);
                    }
                    CompressedFormat::Etc1 => decode_etc1(block, &mut texels),
                }
                for ty in 0..4 {
                    let y = by * 4 + ty;
                    if y >= self.height as usize {
                        break;
                    }
                    for tx in 0..4 {
                        let x = bx * 4 + tx;
                        if x >= self.width as usize {
                            break;
                        }
                        let o = (y * self.width as usize + x) * 4;
                        dest[o..o + 4].copy_from_slice(&texels[ty * 4 + tx]);
                    }
                }
            }
        }
        Ok(())
    }
}

fn rgb565(c: u16) -> [u8; 4] {
    let r = ((c >> 11) & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = (c & 0x1f) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
}

fn mix(a: [u8; 4], b: [u8; 4], wa: u32, wb: u32) -> [u8; 4] {
    let d = wa + wb;
    let m = |x: u8, y: u8| ((x as u32 * wa + y as u32 * wb) / d) as u8;
    [m(a[0], b[0]), m(a[1], b[1]), m(a[2], b[2]), 255]
}

//8-byte BC1 colour block.  `punch_through` enables the 3-colour + transparent mode.
fn decode_color_block(block: &[u8], punch_through: bool, texels: &mut [[u8; 4]; 16]) {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let p0 = rgb565(c0);
    let p1 = rgb565(c1);
    let palette = if c0 > c1 || !punch_through {
        [p0, p1, mix(p0, p1, 2, 1), mix(p0, p1, 1, 2)]
    } else {
        [p0, p1, mix(p0, p1, 1, 1), [0, 0, 0, 0]]
    };
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    for (i, texel) in texels.iter_mut().enumerate() {
        *texel = palette[((indices >> (i * 2)) & 0x3) as usize];
    }
}

fn decode_explicit_alpha(block: &[u8], texels: &mut [[u8; 4]; 16]) {
    let bits = u64::from_le_bytes(block[..8].try_into().unwrap_or([0; 8]));
    for (i, texel) in texels.iter_mut().enumerate() {
        texel[3] = ((bits >> (i * 4)) & 0xf) as u8 * 17;
    }
}

fn decode_interpolated_alpha(block: &[u8], texels: &mut [[u8; 4]; 16]) {
    let a0 = block[0] as u32;
    let a1 = block[1] as u32;
    let mut palette = [0u8; 8];
    palette[0] = a0 as u8;
    palette[1] = a1 as u8;
    if a0 > a1 {
        for i in 1..7u32 {
            palette[i as usize + 1] = (((7 - i) * a0 + i * a1) / 7) as u8;
        }
    } else {
        for i in 1..5u32 {
            palette[i as usize + 1] = (((5 - i) * a0 + i * a1) / 5) as u8;
        }
        palette[6] = 0;
        palette[7] = 255;
    }
    let mut bits = 0u64;
    for (i, byte) in block[2..8].iter().enumerate() {
        bits |= (*byte as u64) << (8 * i);
    }
    for (i, texel) in texels.iter_mut().enumerate() {
        texel[3] = palette[((bits >> (i * 3)) & 0x7) as usize];
    }
}

const ETC1_MODIFIERS: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

fn decode_etc1(block: &[u8], texels: &mut [[u8; 4]; 16]) {
    let bits = u64::from_be_bytes(block[..8].try_into().unwrap_or([0; 8]));
    let field = |shift: u32, width: u32| ((bits >> shift) & ((1 << width) - 1)) as i32;
    let flip = field(32, 1) == 1;
    let differential = field(33, 1) == 1;
    let tables = [field(37, 3) as usize, field(34, 3) as usize];

    let mut bases = [[0i32; 3]; 2];
    if differential {
        let extend5 = |v: i32| (v << 3) | (v >> 2);
        for (channel, shift) in [59u32, 51, 43].into_iter().enumerate() {
            let base = field(shift, 5);
            //3-bit two's complement delta
            let mut delta = field(shift - 3, 3);
            if delta >= 4 {
                delta -= 8;
            }
            bases[0][channel] = extend5(base);
            bases[1][channel] = extend5((base + delta) & 0x1f);
        }
    } else {
        let extend4 = |v: i32| (v << 4) | v;
        for (channel, shift) in [60u32, 52, 44].into_iter().enumerate() {
            bases[0][channel] = extend4(field(shift, 4));
            bases[1][channel] = extend4(field(shift - 4, 4));
        }
    }

    for y in 0..4 {
        for x in 0..4 {
            let sub = if flip { (y >= 2) as usize } else { (x >= 2) as usize };
            let p = (x * 4 + y) as u32;
            let msb = field(16 + p, 1);
            let lsb = field(p, 1);
            let pair = ETC1_MODIFIERS[tables[sub]];
            let modifier = match (msb, lsb) {
                (0, 0) => pair[0],
                (0, _) => pair[1],
                (_, 0) => -pair[0],
                _ => -pair[1],
            };
            let base = bases[sub];
            texels[y * 4 + x] = [
                (base[0] + modifier).clamp(0, 255) as u8,
                (base[1] + modifier).clamp(0, 255) as u8,
                (base[2] + modifier).clamp(0, 255) as u8,
                255,
            ];
        }
    }
}
