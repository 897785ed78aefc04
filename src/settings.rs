//! Client configuration.
//!
//! [`ClientConfig`] is plain serde data so the browser client can build it
//! directly.  Native builds layer it from defaults, an optional TOML file and
//! `ROAMER_*` environment variables (see [`ClientConfig::load`]).
//!
//! | Key                     | Default               | Description                          |
//! |-------------------------|-----------------------|--------------------------------------|
//! | `endpoint`              | `ws://localhost:8080` | Server WebSocket URL                 |
//! | `username`              | `guest`               | Display name sent with `join_game`   |
//! | `world_map_url`         | `/assets/world.png`   | Background image                     |
//! | `world_width/height`    | `2048`                | Logical world size                   |
//! | `canvas_width/height`   | `800` × `600`         | Surface size (headless)              |
//! | `repeat_interval_ms`    | `100`                 | Movement re-assertion period         |
//! | `frame_interval_ms`     | `16`                  | Render tick (headless)               |
//! | `animation_interval_ms` | `150`                 | Walk-cycle frame period              |
//! | `asset_root`            | `assets`              | Local directory URLs resolve into    |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{Size, WORLD_SIZE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub username: String,
    pub world_map_url: String,
    pub world_width: f32,
    pub world_height: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub repeat_interval_ms: u64,
    pub frame_interval_ms: u64,
    pub animation_interval_ms: u64,
    pub asset_root: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8080".into(),
            username: "guest".into(),
            world_map_url: "/assets/world.png".into(),
            world_width: WORLD_SIZE,
            world_height: WORLD_SIZE,
            canvas_width: 800.0,
            canvas_height: 600.0,
            repeat_interval_ms: 100,
            frame_interval_ms: 16,
            animation_interval_ms: 150,
            asset_root: "assets".into(),
        }
    }
}

impl ClientConfig {
    pub fn world_size(&self) -> Size {
        Size::new(self.world_width, self.world_height)
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn animation_interval(&self) -> Duration {
        Duration::from_millis(self.animation_interval_ms.max(1))
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".into()));
        }
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(ConfigError::Invalid("world size must be positive".into()));
        }
        if self.repeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "repeat_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[cfg(feature = "native")]
    #[error(transparent)]
    Source(#[from] ::config::ConfigError),
}

#[cfg(feature = "native")]
impl ClientConfig {
    /// Defaults, then `file` (TOML, optional), then `ROAMER_*` env vars.
    pub fn load(file: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let loaded: Self = builder
            .add_source(::config::Environment::with_prefix("ROAMER").try_parsing(true))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
