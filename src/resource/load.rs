// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Texture array configuration documents and the transient state of one load.

A configuration document is XML: a root element holding `layer` elements in order, plus
optional parameter elements.

```xml
<texturearray>
    <address coord="u" mode="clamp"/>
    <filter mode="trilinear" anisotropy="4"/>
    <quality low="2" medium="1" high="0"/>
    <layer name="grass.png"/>
    <layer name="textures/rock.png"/>
</texturearray>
```

Layer names without a directory are resolved relative to the directory of the document.
*/

use crate::bindings::sampler::{AddressMode, FilterMode, TextureCoordinate, TextureQuality};
use crate::image::Image;
use crate::resource::{ResourceCache, ResourceId};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("can't read configuration {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("bad value {value:?} for {element}/@{attribute}")]
    Attribute {
        element: String,
        attribute: &'static str,
        value: String,
    },
}

/// One parameter element of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSetting {
    Address(TextureCoordinate, AddressMode),
    Border([f32; 4]),
    Filter {
        mode: FilterMode,
        anisotropy: Option<u32>,
    },
    /// Whether to build a mip chain.
    Mipmap(bool),
    Quality(TextureQuality, u32),
    Srgb(bool),
}

/// A parsed configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureConfig {
    layers: Vec<String>,
    settings: Vec<ParameterSetting>,
}

fn parse_bool(value: &str) -> bool {
    value
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 't' | 'y' | '1'))
}

fn bad(node: roxmltree::Node<'_, '_>, attribute: &'static str, value: &str) -> ParseError {
    ParseError::Attribute {
        element: node.tag_name().name().to_string(),
        attribute,
        value: value.to_string(),
    }
}

fn parse_u32(node: roxmltree::Node<'_, '_>, attribute: &'static str) -> Result<Option<u32>, ParseError> {
    match node.attribute(attribute) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| bad(node, attribute, value)),
    }
}

fn parse_color(node: roxmltree::Node<'_, '_>) -> Result<[f32; 4], ParseError> {
    let value = node.attribute("color").unwrap_or_default();
    let parts = value
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| bad(node, "color", value))?;
    match parts.as_slice() {
        [r, g, b] => Ok([*r, *g, *b, 1.0]),
        [r, g, b, a] => Ok([*r, *g, *b, *a]),
        _ => Err(bad(node, "color", value)),
    }
}

impl TextureConfig {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let document = roxmltree::Document::parse(text)?;
        let mut config = TextureConfig::default();
        for node in document.root_element().children().filter(|n| n.is_element()) {
            let lower = node.tag_name().name().to_ascii_lowercase();
            match lower.as_str() {
                "layer" => {
                    config
                        .layers
                        .push(node.attribute("name").unwrap_or_default().to_string());
                }
                "address" => {
                    let coord = node.attribute("coord").unwrap_or_default().to_ascii_lowercase();
                    let coordinate = match coord.chars().next() {
                        Some('u') => TextureCoordinate::U,
                        Some('v') => TextureCoordinate::V,
                        Some('w') => TextureCoordinate::W,
                        _ => continue,
                    };
                    let mode = node.attribute("mode").unwrap_or_default().to_ascii_lowercase();
                    config
                        .settings
                        .push(ParameterSetting::Address(coordinate, AddressMode::from_name(&mode)));
                }
                "border" => config.settings.push(ParameterSetting::Border(parse_color(node)?)),
                "filter" => {
                    let mode = node.attribute("mode").unwrap_or_default().to_ascii_lowercase();
                    config.settings.push(ParameterSetting::Filter {
                        mode: FilterMode::from_name(&mode),
                        anisotropy: parse_u32(node, "anisotropy")?,
                    });
                }
                "mipmap" => config.settings.push(ParameterSetting::Mipmap(parse_bool(
                    node.attribute("enable").unwrap_or_default(),
                ))),
                "quality" => {
                    for (attribute, quality) in [
                        ("low", TextureQuality::Low),
                        ("med", TextureQuality::Medium),
                        ("medium", TextureQuality::Medium),
                        ("high", TextureQuality::High),
                    ] {
                        if let Some(skip) = parse_u32(node, attribute)? {
                            config.settings.push(ParameterSetting::Quality(quality, skip));
                        }
                    }
                }
                "srgb" => config.settings.push(ParameterSetting::Srgb(parse_bool(
                    node.attribute("enable").unwrap_or_default(),
                ))),
                _ => {}
            }
        }
        Ok(config)
    }

    /// Layer image names in document order, unresolved.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Parameter elements in document order.
    pub fn settings(&self) -> &[ParameterSetting] {
        &self.settings
    }
}

/// Resolves `layer` against the directory of `config_name` unless it names a directory itself.
pub fn resolve_layer_path(config_name: &str, layer: &str) -> String {
    if layer.contains('/') {
        return layer.to_string();
    }
    match config_name.rfind('/') {
        Some(slash) => format!("{}{}", &config_name[..=slash], layer),
        None => layer.to_string(),
    }
}

/**
Everything one load carries from phase one to phase two.

Created by a successful parse in `begin_load` and consumed by `end_load`.
*/
#[derive(Debug)]
pub struct LoadSession {
    config: TextureConfig,
    images: Vec<Option<Arc<Image>>>,
}

impl LoadSession {
    /**
    Resolves every layer of `config` through `cache` and records the dependency edges.

    Layers that can't be resolved are kept as `None` so later layers keep their index.
    When `precalculate` is set, every resolved image builds its mip chain now.
    */
    pub fn prefetch(
        config: TextureConfig,
        config_name: &str,
        owner: ResourceId,
        cache: &dyn ResourceCache,
        precalculate: bool,
    ) -> Self {
        let images = config
            .layers()
            .iter()
            .map(|layer| {
                let path = resolve_layer_path(config_name, layer);
                let image = cache.temp_image(&path);
                if image.is_none() {
                    logwise::warn_sync!(
                        "layer image {path} could not be loaded",
                        path = logwise::privacy::LogIt(&path)
                    );
                }
                cache.store_dependency(owner, &path);
                if precalculate && let Some(image) = &image {
                    image.precalculate_levels();
                }
                image
            })
            .collect();
        LoadSession { config, images }
    }

    pub fn config(&self) -> &TextureConfig {
        &self.config
    }

    pub fn images(&self) -> &[Option<Arc<Image>>] {
        &self.images
    }

    pub(crate) fn into_parts(self) -> (TextureConfig, Vec<Option<Arc<Image>>>) {
        (self.config, self.images)
    }
}
