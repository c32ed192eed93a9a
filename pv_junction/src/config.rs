//! Scene configuration: title, timeline steps and optional geometry overrides
//!
//! Loaded from TOML. Every field has a default, so an empty file yields the
//! stock demo.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::SceneGeometry;
use crate::timeline::{Timeline, TimelineStep};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("step {index} has invalid time {time} (must be finite and >= 0)")]
    InvalidStepTime { index: usize, time: f32 },

    #[error("step {index} at {time}s comes before the previous step at {previous}s")]
    StepsOutOfOrder {
        index: usize,
        time: f32,
        previous: f32,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),
}

/// On-disk layout of a scene file
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSceneConfig {
    title: String,
    description: String,
    steps: Option<Vec<TimelineStep>>,
    geometry: SceneGeometry,
}

impl Default for RawSceneConfig {
    fn default() -> Self {
        let stock = SceneConfig::default();
        Self {
            title: stock.title,
            description: stock.description,
            steps: None,
            geometry: stock.geometry,
        }
    }
}

/// Everything needed to build an [`Animation`](crate::Animation) and its UI
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub title: String,
    pub description: String,
    pub timeline: Timeline,
    pub geometry: SceneGeometry,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "PV Principle Demo".to_string(),
            description: "Watch photons hit the PN junction, create electron–hole pairs, \
                          and flow as current under the built-in field."
                .to_string(),
            timeline: Timeline::default(),
            geometry: SceneGeometry::default(),
        }
    }
}

impl SceneConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded scene '{}' with {} timeline steps from {}",
            config.title,
            config.timeline.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate a scene; omitted `steps` keep the stock timeline
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawSceneConfig = toml::from_str(content)?;

        raw.geometry
            .validate()
            .map_err(ConfigError::InvalidGeometry)?;

        let timeline = match raw.steps {
            Some(steps) => Timeline::new(steps)?,
            None => Timeline::default(),
        };

        Ok(Self {
            title: raw.title,
            description: raw.description,
            timeline,
            geometry: raw.geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_stock_scene() {
        let config = SceneConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn shipped_scene_file_parses() {
        let config = SceneConfig::from_toml_str(include_str!("../scene.toml"))
            .expect("scene.toml must stay valid");
        assert_eq!(config.timeline, Timeline::default());
        assert_eq!(config.geometry, SceneGeometry::default());
    }

    #[test]
    fn partial_geometry_override() {
        let config = SceneConfig::from_toml_str(
            r#"
            title = "Wide cell"

            [geometry.junction]
            left = 120.0
            right = 580.0
            "#,
        )
        .expect("override");
        assert_eq!(config.title, "Wide cell");
        assert_eq!(config.geometry.junction.left, 120.0);
        assert_eq!(config.geometry.junction.n_layer_top, 193.0);
        assert_eq!(config.geometry.circuit.bulb_x, 660.0);
    }

    #[test]
    fn custom_steps_replace_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            [[steps]]
            time = 0.0
            label = "Start"
            info = "go"

            [[steps]]
            time = 1.5
            label = "End"
            info = "done"
            "#,
        )
        .expect("steps");
        assert_eq!(config.timeline.len(), 2);
        assert_eq!(config.timeline.phase_at(1.6), Some(1));
    }

    #[test]
    fn unordered_steps_are_rejected() {
        let result = SceneConfig::from_toml_str(
            r#"
            [[steps]]
            time = 3.0
            label = "B"
            info = ""

            [[steps]]
            time = 1.0
            label = "A"
            info = ""
            "#,
        );
        assert!(matches!(result, Err(ConfigError::StepsOutOfOrder { index: 1, .. })));
    }

    #[test]
    fn bad_geometry_is_rejected() {
        let result = SceneConfig::from_toml_str(
            r#"
            [geometry.junction]
            left = 600.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidGeometry(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SceneConfig::load_from_file("/definitely/not/here.toml")
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
