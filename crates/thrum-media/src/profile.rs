//! Compression parameter selection: presets, custom tuples, and the
//! size-tiered "smart" mode.

use serde::{Deserialize, Serialize};

const MB: f64 = 1024.0 * 1024.0;

/// Encoded output type. JPEG is the only one with a quality knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

/// One compression parameter tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionConfig {
    /// Byte-size target, in megabytes. Best effort: the encoder steps quality
    /// down toward it but will not discard the image to reach it.
    pub max_size_mb: f64,
    /// Neither output dimension exceeds this.
    pub max_dimension: u32,
    /// Encoder quality in `0..=1`.
    pub quality: f32,
    pub output: OutputFormat,
    /// Opaque performance hint to the encoder; not a scheduling contract.
    pub parallel_hint: bool,
    pub preserve_metadata: bool,
}

impl CompressionConfig {
    /// The byte-size target.
    pub fn target_bytes(&self) -> usize {
        (self.max_size_mb * MB) as usize
    }
}

/// Named parameter tuples for the common upload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    Avatar,
    Post,
    Thumbnail,
    HighQuality,
}

impl Preset {
    pub fn config(self) -> CompressionConfig {
        match self {
            Self::Avatar => CompressionConfig {
                max_size_mb: 0.2,
                max_dimension: 400,
                quality: 0.8,
                output: OutputFormat::Jpeg,
                parallel_hint: false,
                preserve_metadata: false,
            },
            Self::Post => CompressionConfig {
                max_size_mb: 1.0,
                max_dimension: 1920,
                quality: 0.8,
                output: OutputFormat::Jpeg,
                parallel_hint: true,
                preserve_metadata: false,
            },
            Self::Thumbnail => CompressionConfig {
                max_size_mb: 0.1,
                max_dimension: 320,
                quality: 0.7,
                output: OutputFormat::Jpeg,
                parallel_hint: false,
                preserve_metadata: false,
            },
            Self::HighQuality => CompressionConfig {
                max_size_mb: 2.0,
                max_dimension: 2560,
                quality: 0.92,
                output: OutputFormat::Jpeg,
                parallel_hint: true,
                preserve_metadata: true,
            },
        }
    }
}

/// How to choose compression parameters for a file.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionRequest {
    /// Tier purely on input size.
    Smart,
    Preset(Preset),
    Custom(CompressionConfig),
}

impl CompressionRequest {
    /// Resolve to a concrete config for an input of `input_len` bytes.
    pub fn resolve(&self, input_len: usize) -> CompressionConfig {
        match self {
            Self::Smart => smart_config(input_len),
            Self::Preset(preset) => preset.config(),
            Self::Custom(config) => config.clone(),
        }
    }
}

/// Size-tiered selection: the bigger the input, the harder we squeeze.
fn smart_config(input_len: usize) -> CompressionConfig {
    let mb = input_len as f64 / MB;
    if mb <= 1.0 {
        CompressionConfig {
            max_size_mb: 0.5,
            max_dimension: 1920,
            quality: 0.9,
            output: OutputFormat::Jpeg,
            parallel_hint: false,
            preserve_metadata: false,
        }
    } else if mb <= 5.0 {
        Preset::Post.config()
    } else if mb <= 10.0 {
        CompressionConfig {
            max_size_mb: 0.8,
            max_dimension: 1600,
            quality: 0.6,
            output: OutputFormat::Jpeg,
            parallel_hint: true,
            preserve_metadata: false,
        }
    } else {
        CompressionConfig {
            max_size_mb: 0.5,
            max_dimension: 1280,
            quality: 0.4,
            output: OutputFormat::Jpeg,
            parallel_hint: true,
            preserve_metadata: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn test_smart_tiers_by_input_size() {
        let light = CompressionRequest::Smart.resolve(MIB / 2);
        assert_eq!(light.quality, 0.9);
        assert_eq!(light.max_dimension, 1920);

        let post = CompressionRequest::Smart.resolve(3 * MIB);
        assert_eq!(post, Preset::Post.config());

        let strong = CompressionRequest::Smart.resolve(7 * MIB);
        assert_eq!(strong.max_dimension, 1600);
        assert_eq!(strong.quality, 0.6);

        let aggressive = CompressionRequest::Smart.resolve(20 * MIB);
        assert_eq!(aggressive.max_dimension, 1280);
        assert_eq!(aggressive.quality, 0.4);
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        assert_eq!(CompressionRequest::Smart.resolve(MIB).quality, 0.9);
        assert_eq!(
            CompressionRequest::Smart.resolve(5 * MIB),
            Preset::Post.config()
        );
        assert_eq!(
            CompressionRequest::Smart.resolve(10 * MIB).max_dimension,
            1600
        );
    }

    #[test]
    fn test_preset_and_custom_ignore_input_size() {
        let request = CompressionRequest::Preset(Preset::Avatar);
        assert_eq!(request.resolve(0), request.resolve(50 * MIB));

        let custom = CompressionConfig {
            max_size_mb: 3.0,
            max_dimension: 640,
            quality: 0.5,
            output: OutputFormat::Png,
            parallel_hint: false,
            preserve_metadata: true,
        };
        assert_eq!(
            CompressionRequest::Custom(custom.clone()).resolve(42),
            custom
        );
    }

    #[test]
    fn test_target_bytes() {
        assert_eq!(Preset::Post.config().target_bytes(), 1024 * 1024);
    }
}
