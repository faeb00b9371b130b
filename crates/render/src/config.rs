//! JSON configuration for the showcase hosts.
//!
//! Every field is optional; a missing file section falls back to the landing
//! page defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use showcase_assets::AssetResolver;
use showcase_motion::{
    CarouselError, DEFAULT_CYCLE_MS, DEFAULT_FADE_MS, LayoutTable, SlideCarousel,
    SlideDescriptor, ViewportLayoutController,
};
use showcase_scene::SceneAssembler;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("carousel: {0}")]
    Carousel(#[from] CarouselError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShowcaseConfig {
    /// Slide texture ids in display order.
    pub slides: SlideDescriptor,
    /// Directory that site-absolute texture ids resolve against.
    pub asset_root: PathBuf,
    pub cycle_ms: f64,
    pub fade_ms: f64,
    pub layout: LayoutTable,
    /// Fixed decoration placement; random when absent.
    pub seed: Option<u64>,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            slides: SlideDescriptor::landing_defaults(),
            asset_root: PathBuf::from("."),
            cycle_ms: DEFAULT_CYCLE_MS,
            fade_ms: DEFAULT_FADE_MS,
            layout: LayoutTable::default(),
            seed: None,
        }
    }
}

impl ShowcaseConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.carousel()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;
        tracing::info!(path = %path.display(), slides = config.slides.len(), "config loaded");
        Ok(config)
    }

    /// The file at `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn carousel(&self) -> Result<SlideCarousel, ConfigError> {
        Ok(SlideCarousel::with_timing(
            self.slides.clone(),
            self.cycle_ms,
            self.fade_ms,
        )?)
    }

    pub fn layout(&self) -> ViewportLayoutController {
        ViewportLayoutController::new(self.layout.clone())
    }

    pub fn assembler(&self) -> SceneAssembler {
        let assembler = SceneAssembler::new(self.slides.clone());
        match self.seed {
            Some(seed) => assembler.with_seed(seed),
            None => assembler,
        }
    }

    pub fn resolver(&self) -> AssetResolver {
        AssetResolver::new(&self.asset_root)
    }
}
