//! Core client types shared across all modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Logical side length of the shared world, in world units.
///
/// Independent of the pixel size of the loaded world map image.
pub const WORLD_SIZE: f32 = 2048.0;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn square(side: f32) -> Self {
        Self::new(side, side)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centered on `center`.
    pub fn centered(center: Vec2, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Overlapping region of two rectangles, `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(Rect::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        ))
    }
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// One of the four movement directions.  Serialised as `"up"`, `"down"`, …
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Map a DOM `KeyboardEvent.key` value to a direction.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            "ArrowLeft" => Some(Direction::Left),
            "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Compass name of the avatar frame set drawn for this facing.
    pub fn compass(&self) -> &'static str {
        match self {
            Direction::Up => "north",
            Direction::Down => "south",
            Direction::Left => "west",
            Direction::Right => "east",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player as mirrored from the server.
///
/// Every field is defaulted so that map-keyed payloads may omit `id`; the
/// world state fills it in from the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub x: f32,
    pub y: f32,
    /// Key into the avatar definitions.
    pub avatar: String,
    #[serde(alias = "direction", skip_serializing_if = "Option::is_none")]
    pub facing: Option<Direction>,
    #[serde(alias = "isMoving")]
    pub moving: bool,
}

impl Player {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Partial player update carried by `players_moved`.
///
/// Fields left out of the payload keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(alias = "direction", skip_serializing_if = "Option::is_none")]
    pub facing: Option<Direction>,
    #[serde(alias = "isMoving", skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
}

impl PlayerPatch {
    /// Overwrite every field of `player` that this patch carries.
    pub fn apply_to(&self, player: &mut Player) {
        if let Some(username) = &self.username {
            player.username = username.clone();
        }
        if let Some(x) = self.x {
            player.x = x;
        }
        if let Some(y) = self.y {
            player.y = y;
        }
        if let Some(avatar) = &self.avatar {
            player.avatar = avatar.clone();
        }
        if let Some(facing) = self.facing {
            player.facing = Some(facing);
        }
        if let Some(moving) = self.moving {
            player.moving = moving;
        }
    }

    /// Build a fresh player for an id the client has not seen yet.
    pub fn into_player(self, id: &str) -> Player {
        let mut player = Player {
            id: id.to_string(),
            ..Default::default()
        };
        self.apply_to(&mut player);
        player
    }
}

// ---------------------------------------------------------------------------
// Avatars
// ---------------------------------------------------------------------------

/// Frame set a player's avatar is drawn from.
///
/// `frames` maps a compass direction (`south`, `north`, `east`, `west`) to an
/// ordered list of image URLs.  `frames.south[0]` is the default frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AvatarDefinition {
    pub name: String,
    pub frames: BTreeMap<String, Vec<String>>,
}

/// Compass key of the default frame list.
pub const DEFAULT_FACING: &str = "south";

impl AvatarDefinition {
    /// Frame list for `facing`, falling back to the default direction.
    pub fn frames_for(&self, facing: Option<Direction>) -> Option<(&str, &[String])> {
        let wanted = facing.map(|d| d.compass()).unwrap_or(DEFAULT_FACING);
        [wanted, DEFAULT_FACING]
            .into_iter()
            .find_map(|compass| match self.frames.get_key_value(compass) {
                Some((k, list)) if !list.is_empty() => Some((k.as_str(), list.as_slice())),
                _ => None,
            })
    }

    /// Select the frame to draw: the first frame when idle, cycling by
    /// `step` while moving.  Returns `(compass, index, url)`.
    pub fn select_frame(
        &self,
        facing: Option<Direction>,
        moving: bool,
        step: u64,
    ) -> Option<(&str, usize, &str)> {
        let (compass, list) = self.frames_for(facing)?;
        let index = if moving {
            (step % list.len() as u64) as usize
        } else {
            0
        };
        Some((compass, index, list[index].as_str()))
    }

    /// Every `(compass, index, url)` this avatar can display.
    pub fn all_frames(&self) -> impl Iterator<Item = (&str, usize, &str)> {
        self.frames.iter().flat_map(|(compass, list)| {
            list.iter()
                .enumerate()
                .map(move |(i, url)| (compass.as_str(), i, url.as_str()))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn avatar() -> AvatarDefinition {
        let mut frames = BTreeMap::new();
        frames.insert("south".into(), vec!["s0".into(), "s1".into()]);
        frames.insert("north".into(), vec!["n0".into()]);
        frames.insert("east".into(), vec![]);
        AvatarDefinition {
            name: "knight".into(),
            frames,
        }
    }

    #[test]
    fn direction_from_arrow_keys_only() {
        assert_eq!(Direction::from_key("ArrowUp"), Some(Direction::Up));
        assert_eq!(Direction::from_key("ArrowRight"), Some(Direction::Right));
        assert_eq!(Direction::from_key("w"), None);
        assert_eq!(Direction::from_key("Enter"), None);
    }

    #[test]
    fn frame_selection_falls_back_to_south() {
        let a = avatar();
        assert_eq!(a.select_frame(None, false, 0), Some(("south", 0, "s0")));
        assert_eq!(
            a.select_frame(Some(Direction::Up), false, 0),
            Some(("north", 0, "n0"))
        );
        // east exists but is empty, west is missing
        assert_eq!(
            a.select_frame(Some(Direction::Right), false, 0),
            Some(("south", 0, "s0"))
        );
        assert_eq!(
            a.select_frame(Some(Direction::Left), false, 0),
            Some(("south", 0, "s0"))
        );
    }

    #[test]
    fn moving_players_cycle_frames() {
        let a = avatar();
        assert_eq!(a.select_frame(None, true, 0).map(|f| f.2), Some("s0"));
        assert_eq!(a.select_frame(None, true, 1).map(|f| f.2), Some("s1"));
        assert_eq!(a.select_frame(None, true, 2).map(|f| f.2), Some("s0"));
        // idle players stay on the first frame
        assert_eq!(a.select_frame(None, false, 1).map(|f| f.2), Some("s0"));
    }

    #[test]
    fn avatar_without_frames_has_nothing_to_draw() {
        let a = AvatarDefinition::default();
        assert!(a.select_frame(None, false, 0).is_none());
        assert_eq!(a.all_frames().count(), 0);
    }

    #[test]
    fn patch_only_overwrites_present_fields() {
        let mut p = Player {
            id: "p1".into(),
            username: "ann".into(),
            x: 1.0,
            y: 2.0,
            avatar: "a".into(),
            facing: None,
            moving: false,
        };
        let patch = PlayerPatch {
            x: Some(10.0),
            moving: Some(true),
            ..Default::default()
        };
        patch.apply_to(&mut p);
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 2.0);
        assert_eq!(p.username, "ann");
        assert!(p.moving);
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 0.0, 5.0, 5.0)));
        let c = Rect::new(20.0, 20.0, 1.0, 1.0);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn player_wire_aliases() {
        let p: Player =
            serde_json::from_str(r#"{"x":3,"y":4,"avatar":"a","direction":"left","isMoving":true}"#)
                .unwrap();
        assert_eq!(p.facing, Some(Direction::Left));
        assert!(p.moving);
        assert!(p.id.is_empty());
    }
}
