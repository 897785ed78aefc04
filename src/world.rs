//! `WorldState`: local mirror of the server's players and avatars.
//!
//! Lives inside the session and is only ever touched by the thread that owns
//! it.  Every operation completes before the renderer can observe the state,
//! so no partially applied patch is ever drawn.

use std::collections::HashMap;

use crate::types::{AvatarDefinition, Player, PlayerPatch};

#[derive(Debug, Default)]
pub struct WorldState {
    /// Keyed by player id.
    players: HashMap<String, Player>,
    /// Keyed by avatar name.
    avatars: HashMap<String, AvatarDefinition>,
    /// Set once our own join succeeds.
    local_id: Option<String>,
    /// Copy of our own entry, refreshed on every mutation that touches it.
    local: Option<Player>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Patches
    // ------------------------------------------------------------------

    /// Replace everything with the snapshot carried by a successful join.
    pub fn apply_self_join(
        &mut self,
        player_id: String,
        players: HashMap<String, Player>,
        avatars: HashMap<String, AvatarDefinition>,
    ) {
        self.players = players
            .into_iter()
            .map(|(id, mut p)| {
                if p.id.is_empty() {
                    p.id = id.clone();
                }
                (id, p)
            })
            .collect();
        self.avatars = avatars
            .into_iter()
            .map(|(name, mut a)| {
                if a.name.is_empty() {
                    a.name = name.clone();
                }
                (name, a)
            })
            .collect();
        self.local_id = Some(player_id);
        self.refresh_local();
    }

    /// Upsert one player and its avatar definition.
    ///
    /// Returns true if the player is the local one.  A player without an id
    /// is dropped.
    pub fn apply_player_joined(&mut self, player: Player, avatar: AvatarDefinition) -> bool {
        if player.id.is_empty() {
            log::warn!("[world] dropping player_joined without an id");
            return false;
        }
        if !avatar.name.is_empty() {
            self.avatars.insert(avatar.name.clone(), avatar);
        }
        let touched = self.is_local(&player.id);
        self.players.insert(player.id.clone(), player);
        if touched {
            self.refresh_local();
        }
        touched
    }

    /// Merge a batch of per-id patches.  Unknown ids are inserted.
    ///
    /// Returns true if the local player was among the patched ids.
    pub fn apply_players_moved(&mut self, patch: HashMap<String, PlayerPatch>) -> bool {
        let mut touched = false;
        for (id, p) in patch {
            touched |= self.is_local(&id);
            match self.players.get_mut(&id) {
                Some(existing) => p.apply_to(existing),
                None => {
                    log::debug!("[world] implicit join of {}", id);
                    let player = p.into_player(&id);
                    self.players.insert(id, player);
                }
            }
        }
        if touched {
            self.refresh_local();
        }
        touched
    }

    /// Remove a player.  No-op if the id is unknown.
    ///
    /// Returns true if the removed player was the local one.
    pub fn apply_player_left(&mut self, player_id: &str) -> bool {
        if self.players.remove(player_id).is_none() {
            return false;
        }
        let touched = self.is_local(player_id);
        if touched {
            self.refresh_local();
        }
        touched
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local.as_ref()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn avatar(&self, name: &str) -> Option<&AvatarDefinition> {
        self.avatars.get(name)
    }

    pub fn avatars(&self) -> impl Iterator<Item = &AvatarDefinition> {
        self.avatars.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn avatar_count(&self) -> usize {
        self.avatars.len()
    }

    pub fn any_moving(&self) -> bool {
        self.players.values().any(|p| p.moving)
    }

    fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }

    fn refresh_local(&mut self) {
        self.local = self
            .local_id
            .as_ref()
            .and_then(|id| self.players.get(id))
            .cloned();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
