//! Roamer
//!
//! Client for a shared 2D world: mirrors the server's players, turns arrow
//! keys into movement intents, and draws a camera view that follows the
//! local player.
//!
//! ## Architecture
//!
//! ```text
//! InputController (input.rs) ──intents──▶ SyncSession (session.rs) ──▶ transport
//! transport ──▶ SyncSession
//!                 ├── WorldState  (world.rs)     ← patches
//!                 ├── AssetCache  (assets.rs)    ← avatar / map images
//!                 └── viewport    (viewport.rs)  ← camera rectangle
//!                        │
//!                        ▼
//!                 Renderer (render.rs) ──▶ Surface
//! ```
//!
//! The transport, image loading and timers are host capabilities: the
//! browser client in `clients/wasm`, or the native headless runtime in
//! [`headless`] (feature `native`).

// Core pipeline is always available (no native feature needed).
pub mod assets;
pub mod input;
pub mod protocol;
pub mod render;
pub mod session;
pub mod settings;
pub mod types;
pub mod viewport;
pub mod world;

// Native host modules require the `native` feature.
#[cfg(feature = "native")]
pub mod fs_assets;
#[cfg(feature = "native")]
pub mod headless;

pub use assets::{AssetCache, AssetError, Bitmap, ImageLoader};
pub use input::{InputController, MotionIntent, RepeatTimers};
pub use protocol::{ClientMessage, ServerMessage};
pub use render::{Renderer, Surface};
pub use session::{SessionState, SyncSession};
pub use settings::ClientConfig;
pub use types::{AvatarDefinition, Direction, Player, PlayerPatch, Rect, Size, Vec2};
pub use world::WorldState;

#[cfg(feature = "native")]
pub use fs_assets::{FsImageLoader, ImageInfo, LoadedAsset};
#[cfg(feature = "native")]
pub use headless::HeadlessClient;
