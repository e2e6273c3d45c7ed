//! Editor and upload limits, with pluggable persistence.

use miette::Result;
use miette::miette;
use serde::{Deserialize, Serialize};

use std::future::Future;

/// Limits applied by editing sessions and the upload pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Maximum staged images for a post editor.
    pub max_images_post: usize,
    /// Maximum staged images for a comment or reply editor.
    pub max_images_comment: usize,
    /// Per-file upload ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Whether uploads pick compression tiers from file size.
    pub smart_compression: bool,
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self> {
        loader
            .load()
            .await
            .map_err(|_| miette!("Failed to load configuration"))
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<()> {
        saver
            .save(self)
            .await
            .map_err(|_| miette!("Failed to save configuration"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_images_post: 9,
            max_images_comment: 4,
            max_upload_bytes: 5 * 1024 * 1024,
            smart_compression: true,
        }
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(
        &self,
    ) -> impl Future<
        Output = core::result::Result<Config, Box<dyn std::error::Error + Send + Sync + 'static>>,
    > + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(
        &self,
        config: &Config,
    ) -> impl Future<
        Output = core::result::Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>,
    > + Send;
}
