//! Client ⇄ server wire protocol.
//!
//! This module owns **every message that crosses the transport boundary**.
//! Messages are JSON objects; the `action` field is the discriminant.
//!
//! | Direction        | `action`        | Payload                                  |
//! |------------------|-----------------|------------------------------------------|
//! | client → server  | `join_game`     | `username`                               |
//! | client → server  | `move`          | `direction`                              |
//! | client → server  | `stop`          | *(none)*                                 |
//! | server → client  | `join_game`     | `success`, `playerId?`, `players?`, `avatars?`, `error?` |
//! | server → client  | `player_joined` | `player`, `avatar`                       |
//! | server → client  | `players_moved` | `players` (id → patch)                   |
//! | server → client  | `player_left`   | `playerId`                               |
//!
//! ## Design rules
//!
//! 1. Unknown `action` values decode to [`ServerMessage::Unknown`] and are
//!    ignored by the session; they are not errors.
//! 2. Payload fields the server may omit are `#[serde(default)]`; an
//!    explicit `null` reads the same as a missing field.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::types::{AvatarDefinition, Direction, Player, PlayerPatch};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame { username: String },
    Move { direction: Direction },
    Stop,
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Reply to our `join_game` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinAck {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    pub player_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub players: HashMap<String, Player>,
    #[serde(deserialize_with = "null_as_default")]
    pub avatars: HashMap<String, AvatarDefinition>,
    pub error: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinGame(JoinAck),
    PlayerJoined {
        player: Player,
        #[serde(default)]
        avatar: AvatarDefinition,
    },
    PlayersMoved {
        #[serde(default)]
        players: HashMap<String, PlayerPatch>,
    },
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    /// Any `action` this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Discriminant as it appears on the wire (for logging).
    pub fn action(&self) -> &'static str {
        match self {
            ServerMessage::JoinGame(_) => "join_game",
            ServerMessage::PlayerJoined { .. } => "player_joined",
            ServerMessage::PlayersMoved { .. } => "players_moved",
            ServerMessage::PlayerLeft { .. } => "player_left",
            ServerMessage::Unknown => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_messages_use_action_tag() {
        let join = ClientMessage::JoinGame {
            username: "ann".into(),
        };
        assert_eq!(
            serde_json::to_value(&join).unwrap(),
            json!({"action": "join_game", "username": "ann"})
        );

        let mv = ClientMessage::Move {
            direction: Direction::Left,
        };
        assert_eq!(
            serde_json::to_value(&mv).unwrap(),
            json!({"action": "move", "direction": "left"})
        );

        assert_eq!(
            ClientMessage::Stop.encode().unwrap(),
            r#"{"action":"stop"}"#
        );
    }

    #[test]
    fn decode_join_ack_with_keyed_maps() {
        let text = json!({
            "action": "join_game",
            "success": true,
            "playerId": "p1",
            "players": {"p1": {"x": 100, "y": 100, "avatar": "a"}},
            "avatars": {"a": {"frames": {"south": ["u1"]}}}
        })
        .to_string();

        match ServerMessage::decode(&text).unwrap() {
            ServerMessage::JoinGame(ack) => {
                assert!(ack.success);
                assert_eq!(ack.player_id.as_deref(), Some("p1"));
                assert_eq!(ack.players["p1"].x, 100.0);
                assert_eq!(ack.avatars["a"].frames["south"], vec!["u1".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decode_join_failure() {
        let text = r#"{"action":"join_game","success":false,"error":"name taken"}"#;
        match ServerMessage::decode(text).unwrap() {
            ServerMessage::JoinGame(ack) => {
                assert!(!ack.success);
                assert_eq!(ack.error.as_deref(), Some("name taken"));
                assert!(ack.players.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn null_join_fields_read_as_missing() {
        let text = r#"{"action":"join_game","success":false,"error":"taken","players":null,"avatars":null,"playerId":null}"#;
        match ServerMessage::decode(text).unwrap() {
            ServerMessage::JoinGame(ack) => {
                assert!(!ack.success);
                assert!(ack.player_id.is_none());
                assert!(ack.players.is_empty());
                assert!(ack.avatars.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decode_incremental_updates() {
        let joined = json!({
            "action": "player_joined",
            "player": {"id": "p2", "username": "bob", "x": 5, "y": 6, "avatar": "b"},
            "avatar": {"name": "b", "frames": {"south": ["b0"]}}
        })
        .to_string();
        assert!(matches!(
            ServerMessage::decode(&joined).unwrap(),
            ServerMessage::PlayerJoined { ref player, .. } if player.id == "p2"
        ));

        let moved = r#"{"action":"players_moved","players":{"p2":{"x":7}}}"#;
        match ServerMessage::decode(moved).unwrap() {
            ServerMessage::PlayersMoved { players } => {
                assert_eq!(players["p2"].x, Some(7.0));
                assert_eq!(players["p2"].y, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        let left = r#"{"action":"player_left","playerId":"p2"}"#;
        assert_eq!(
            ServerMessage::decode(left).unwrap(),
            ServerMessage::PlayerLeft {
                player_id: "p2".into()
            }
        );
    }

    #[test]
    fn unknown_action_is_not_an_error() {
        let msg = ServerMessage::decode(r#"{"action":"chat","text":"hi"}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(ServerMessage::decode("not json").is_err());
        assert!(ServerMessage::decode(r#"{"action":"player_left"}"#).is_err());
    }
}
