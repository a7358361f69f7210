// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Sampling and quality parameters carried by a texture array.

These are plain values.  The texture array stores a [`TextureParameters`] and hands it to the
device whenever the GPU object is (re)created or the parameters change.
*/

/// Minification/magnification filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    Bilinear,
    Trilinear,
    Anisotropic,
    NearestAnisotropic,
    ///Whatever the device considers its default, usually trilinear.
    #[default]
    Default,
}

impl FilterMode {
    /// Parses a lowercase filter name.  Unknown names map to [`FilterMode::Default`].
    pub fn from_name(name: &str) -> FilterMode {
        match name {
            "nearest" => FilterMode::Nearest,
            "bilinear" => FilterMode::Bilinear,
            "trilinear" => FilterMode::Trilinear,
            "anisotropic" => FilterMode::Anisotropic,
            "nearestanisotropic" => FilterMode::NearestAnisotropic,
            _ => FilterMode::Default,
        }
    }
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
}

impl AddressMode {
    /// Parses a lowercase address mode name.  Unknown names map to [`AddressMode::Wrap`].
    pub fn from_name(name: &str) -> AddressMode {
        match name {
            "mirror" => AddressMode::Mirror,
            "clamp" => AddressMode::Clamp,
            "border" => AddressMode::Border,
            _ => AddressMode::Wrap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureCoordinate {
    U,
    V,
    W,
}

impl TextureCoordinate {
    const fn index(&self) -> usize {
        match self {
            TextureCoordinate::U => 0,
            TextureCoordinate::V => 1,
            TextureCoordinate::W => 2,
        }
    }
}

/// Global texture quality tier, owned by whoever renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureQuality {
    Low,
    Medium,
    #[default]
    High,
}

/**
How many of the finest mip levels to discard at each quality tier.

A higher tier never skips more than a lower one; [`MipSkipTable::set`] enforces this.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipSkipTable {
    skips: [u32; 3],
}

impl Default for MipSkipTable {
    fn default() -> Self {
        MipSkipTable { skips: [2, 1, 0] }
    }
}

impl MipSkipTable {
    pub const fn new(low: u32, medium: u32, high: u32) -> Self {
        let mut table = MipSkipTable {
            skips: [low, medium, high],
        };
        table.normalize();
        table
    }

    const fn tier(quality: TextureQuality) -> usize {
        match quality {
            TextureQuality::Low => 0,
            TextureQuality::Medium => 1,
            TextureQuality::High => 2,
        }
    }

    pub const fn skip(&self, quality: TextureQuality) -> u32 {
        self.skips[Self::tier(quality)]
    }

    pub const fn set(&mut self, quality: TextureQuality, skip: u32) {
        self.skips[Self::tier(quality)] = skip;
        self.normalize();
    }

    const fn normalize(&mut self) {
        let mut i = 1;
        while i < self.skips.len() {
            if self.skips[i] > self.skips[i - 1] {
                self.skips[i] = self.skips[i - 1];
            }
            i += 1;
        }
    }
}

/// Sampling state of a texture array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParameters {
    pub filter: FilterMode,
    /// Maximum anisotropy, 0 meaning the device default.
    pub anisotropy: u32,
    address: [AddressMode; 3],
    pub border_color: [f32; 4],
    pub srgb: bool,
    pub mips_to_skip: MipSkipTable,
}

impl Default for TextureParameters {
    fn default() -> Self {
        TextureParameters {
            filter: FilterMode::Default,
            anisotropy: 0,
            address: [AddressMode::Wrap; 3],
            border_color: [0.0, 0.0, 0.0, 0.0],
            srgb: false,
            mips_to_skip: MipSkipTable::default(),
        }
    }
}

impl TextureParameters {
    pub fn address_mode(&self, coordinate: TextureCoordinate) -> AddressMode {
        self.address[coordinate.index()]
    }

    pub fn set_address_mode(&mut self, coordinate: TextureCoordinate, mode: AddressMode) {
        self.address[coordinate.index()] = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skips() {
        let table = MipSkipTable::default();
        assert_eq!(table.skip(TextureQuality::Low), 2);
        assert_eq!(table.skip(TextureQuality::Medium), 1);
        assert_eq!(table.skip(TextureQuality::High), 0);
    }

    #[test]
    fn higher_tiers_never_skip_more() {
        let mut table = MipSkipTable::default();
        table.set(TextureQuality::High, 5);
        assert_eq!(table.skip(TextureQuality::High), 1);
        table.set(TextureQuality::Low, 0);
        assert_eq!(table.skip(TextureQuality::Medium), 0);
        assert_eq!(table.skip(TextureQuality::High), 0);
        assert_eq!(MipSkipTable::new(1, 3, 3), MipSkipTable::new(1, 1, 1));
    }

    #[test]
    fn names() {
        assert_eq!(FilterMode::from_name("trilinear"), FilterMode::Trilinear);
        assert_eq!(FilterMode::from_name("bogus"), FilterMode::Default);
        assert_eq!(AddressMode::from_name("border"), AddressMode::Border);
        assert_eq!(AddressMode::from_name(""), AddressMode::Wrap);
    }
}
