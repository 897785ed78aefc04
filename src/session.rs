//! `SyncSession`: the protocol state machine.
//!
//! ```text
//! Disconnected ──begin_connect──▶ Connecting ──on_open──▶ Connected (unjoined)
//!                                                             │
//!                                      join_game success ─────┤
//!                                                             ▼
//!             Ended ◀── on_close / join refused / teardown ── Joined
//! ```
//!
//! One session is built per connection and owns everything mutable: the
//! world mirror, the asset cache and its loader, the cached viewport and
//! the outbound queue.  The host feeds it events in arrival order
//! (`on_open`, `on_message`, `on_close`, `on_intent`, `on_asset_loaded`,
//! `resize`), drains [`SyncSession::drain_outbound`] into its transport and
//! renders once per tick with [`SyncSession::render_if_dirty`].

use std::collections::VecDeque;

use crate::assets::{
    avatar_frame_key, AssetCache, AssetError, Ensure, ImageLoader, WORLD_MAP_KEY,
};
use crate::input::MotionIntent;
use crate::protocol::{ClientMessage, JoinAck, ServerMessage};
use crate::render::{FrameStats, Renderer, Surface};
use crate::settings::ClientConfig;
use crate::types::{AvatarDefinition, Rect, Size};
use crate::viewport;
use crate::world::WorldState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// Transport open, join requested, no acknowledgement yet.
    Connected,
    Joined,
    /// Disconnected for good; build a new session to try again.
    Ended { reason: String },
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Joined => "joined",
            SessionState::Ended { .. } => "ended",
        }
    }
}

pub struct SyncSession<L: ImageLoader> {
    username: String,
    world_map_url: String,
    world_size: Size,
    state: SessionState,
    world: WorldState,
    assets: AssetCache<L::Bitmap>,
    loader: L,
    canvas: Size,
    viewport: Rect,
    /// Serialised messages waiting for the transport.
    outbound: VecDeque<String>,
    dirty: bool,
    animation_step: u64,
    last_error: Option<String>,
}

impl<L: ImageLoader> SyncSession<L> {
    /// Build a session and start loading the world map.
    pub fn new(config: &ClientConfig, canvas: Size, loader: L) -> Self {
        let mut session = Self {
            username: config.username.clone(),
            world_map_url: config.world_map_url.clone(),
            world_size: config.world_size(),
            state: SessionState::Disconnected,
            world: WorldState::new(),
            assets: AssetCache::new(),
            loader,
            canvas,
            viewport: Rect::new(0.0, 0.0, canvas.width, canvas.height),
            outbound: VecDeque::new(),
            dirty: true,
            animation_step: 0,
            last_error: None,
        };
        if !session.world_map_url.is_empty() {
            let url = session.world_map_url.clone();
            session.assets.ensure(WORLD_MAP_KEY, &url, &mut session.loader);
        }
        session
    }

    // -----------------------------------------------------------------------
    // Transport lifecycle
    // -----------------------------------------------------------------------

    pub fn begin_connect(&mut self) {
        if self.state == SessionState::Disconnected {
            log::info!("[session] connecting as '{}'", self.username);
            self.state = SessionState::Connecting;
        } else {
            log::debug!(
                "[session] begin_connect ignored in state {}",
                self.state.as_str()
            );
        }
    }

    /// Transport opened: ask to join.
    pub fn on_open(&mut self) {
        match self.state {
            SessionState::Disconnected | SessionState::Connecting => {
                self.queue(ClientMessage::JoinGame {
                    username: self.username.clone(),
                });
                self.state = SessionState::Connected;
            }
            _ => log::debug!("[session] on_open ignored in state {}", self.state.as_str()),
        }
    }

    /// Transport closed or failed.  Terminal for this session.
    pub fn on_close(&mut self, reason: &str) {
        if self.is_ended() {
            return;
        }
        log::warn!("[session] disconnected: {}", reason);
        self.end(reason);
    }

    /// Stop everything: no further messages, intents or asset loads.
    pub fn teardown(&mut self) {
        if !self.is_ended() {
            log::info!("[session] teardown");
            self.end("teardown");
        }
    }

    fn end(&mut self, reason: &str) {
        self.state = SessionState::Ended {
            reason: reason.to_string(),
        };
        self.outbound.clear();
        self.assets.close();
        self.dirty = true;
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Handle one text frame from the server.  Never fails: malformed and
    /// unknown messages are logged and dropped.
    pub fn on_message(&mut self, text: &str) {
        if self.is_ended() {
            return;
        }
        let msg = match ServerMessage::decode(text) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("[session] dropping message: {}", e);
                return;
            }
        };

        let joined = self.state == SessionState::Joined;
        let awaiting_ack = joined || self.state == SessionState::Connected;

        match msg {
            ServerMessage::JoinGame(ack) if awaiting_ack => self.on_join_ack(ack),
            ServerMessage::PlayerJoined { player, .. } if joined && player.id.is_empty() => {
                log::warn!("[session] ignoring player_joined without an id");
            }
            ServerMessage::PlayerJoined { player, avatar } if joined => {
                log::debug!("[session] {} joined", player.id);
                self.ensure_avatar(&avatar);
                if self.world.apply_player_joined(player, avatar) {
                    self.recompute_viewport();
                }
                self.dirty = true;
            }
            ServerMessage::PlayersMoved { players } if joined => {
                if self.world.apply_players_moved(players) {
                    self.recompute_viewport();
                }
                self.dirty = true;
            }
            ServerMessage::PlayerLeft { player_id } if joined => {
                log::debug!("[session] {} left", player_id);
                self.world.apply_player_left(&player_id);
                self.dirty = true;
            }
            ServerMessage::Unknown => log::debug!("[session] ignoring unknown action"),
            other => log::debug!(
                "[session] {} ignored in state {}",
                other.action(),
                self.state.as_str()
            ),
        }
    }

    fn on_join_ack(&mut self, ack: JoinAck) {
        let player_id = match (ack.success, ack.player_id) {
            (true, Some(id)) => id,
            (true, None) => {
                log::error!("[session] join acknowledged without a player id");
                self.last_error = Some("join acknowledged without a player id".into());
                self.end("join failed");
                return;
            }
            (false, _) => {
                let reason = ack.error.unwrap_or_else(|| "join refused".into());
                log::error!("[session] join failed: {}", reason);
                self.last_error = Some(reason);
                self.end("join failed");
                return;
            }
        };

        log::info!(
            "[session] joined as {} ({} players, {} avatars)",
            player_id,
            ack.players.len(),
            ack.avatars.len()
        );
        self.world.apply_self_join(player_id, ack.players, ack.avatars);
        self.state = SessionState::Joined;

        let avatars: Vec<AvatarDefinition> = self.world.avatars().cloned().collect();
        for avatar in &avatars {
            self.ensure_avatar(avatar);
        }
        self.recompute_viewport();
        self.dirty = true;
    }

    fn ensure_avatar(&mut self, avatar: &AvatarDefinition) {
        for (compass, index, url) in avatar.all_frames() {
            let key = avatar_frame_key(&avatar.name, compass, index);
            self.assets.ensure(&key, url, &mut self.loader);
        }
    }

    /// An image load finished.
    pub fn on_asset_loaded(&mut self, key: &str, result: Result<L::Bitmap, AssetError>) {
        // failures are logged and evicted by the cache
        if let Ok(true) = self.assets.finish(key, result) {
            self.dirty = true;
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Forward a motion intent.  Dropped unless joined.
    pub fn on_intent(&mut self, intent: MotionIntent) {
        if self.state != SessionState::Joined {
            log::trace!(
                "[session] dropping {:?} while {}",
                intent,
                self.state.as_str()
            );
            return;
        }
        let msg = match intent {
            MotionIntent::Move(direction) => ClientMessage::Move { direction },
            MotionIntent::Stop => ClientMessage::Stop,
        };
        self.queue(msg);
    }

    fn queue(&mut self, msg: ClientMessage) {
        match msg.encode() {
            Ok(text) => self.outbound.push_back(text),
            Err(e) => log::warn!("[session] failed to encode {:?}: {}", msg, e),
        }
    }

    /// Take every queued outbound frame.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.outbound.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    pub fn resize(&mut self, canvas: Size) {
        if canvas == self.canvas {
            return;
        }
        self.canvas = canvas;
        self.viewport.width = canvas.width;
        self.viewport.height = canvas.height;
        self.recompute_viewport();
        self.dirty = true;
    }

    /// Advance the walk cycle.  Only dirties the frame if someone is walking.
    pub fn advance_animation(&mut self) {
        self.animation_step = self.animation_step.wrapping_add(1);
        if self.world.any_moving() {
            self.dirty = true;
        }
    }

    fn recompute_viewport(&mut self) {
        if let Some(local) = self.world.local_player() {
            self.viewport = viewport::compute(local.position(), self.canvas, self.world_size);
        }
    }

    /// Request a redraw on the next tick.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Draw a frame if anything changed since the last one.
    pub fn render_if_dirty<S>(
        &mut self,
        renderer: &Renderer,
        surface: &mut S,
    ) -> Option<FrameStats>
    where
        S: Surface<Bitmap = L::Bitmap>,
    {
        if !self.take_dirty() {
            return None;
        }
        Some(renderer.render_frame(
            &self.world,
            &self.viewport,
            &self.assets,
            self.animation_step,
            surface,
        ))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, SessionState::Ended { .. })
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn assets(&self) -> &AssetCache<L::Bitmap> {
        &self.assets
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn animation_step(&self) -> u64 {
        self.animation_step
    }

    /// Last error reported by the server (e.g. why a join was refused).
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Re-request the world map after a failed load.
    pub fn retry_world_map(&mut self) -> Ensure {
        let url = self.world_map_url.clone();
        self.assets.ensure(WORLD_MAP_KEY, &url, &mut self.loader)
    }
}
