//! Frame rendering onto an abstract 2D surface.
//!
//! The renderer owns no state between frames.  It reads the world mirror,
//! the cached viewport and the asset cache, and issues draw calls through
//! [`Surface`]: the canvas 2D context in the browser, a recording surface
//! in the headless client and in tests.

use std::marker::PhantomData;

use crate::assets::{avatar_frame_key, AssetCache, Bitmap, WORLD_MAP_KEY};
use crate::types::{Rect, Size, Vec2};
use crate::viewport;
use crate::world::WorldState;

/// Drawing backend.
pub trait Surface {
    type Bitmap: Bitmap;

    fn clear(&mut self, size: Size);

    /// Copy the `src` region of `bitmap` into `dst` (screen space).
    fn draw_image(&mut self, bitmap: &Self::Bitmap, src: Rect, dst: Rect);

    /// Draw `text` horizontally centered on `x`, baseline at `y`.
    fn draw_label(&mut self, text: &str, x: f32, y: f32);
}

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Logical world size; the world map is sampled in these units.
    pub world: Size,
    /// Gap between the top of the avatar and the label baseline.
    pub label_gap: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            world: Size::square(crate::types::WORLD_SIZE),
            label_gap: 6.0,
        }
    }
}

/// Per-frame counters, mostly for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub background: bool,
    pub avatars_drawn: usize,
    /// Players drawn without an avatar (unknown definition or image not ready).
    pub avatars_missing: usize,
    pub culled: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draw one frame.  `animation_step` selects the walk frame of moving
    /// players.
    pub fn render_frame<S: Surface>(
        &self,
        world: &WorldState,
        view: &Rect,
        assets: &AssetCache<S::Bitmap>,
        animation_step: u64,
        surface: &mut S,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        surface.clear(view.size());

        // Background: only the part of the world that overlaps the viewport.
        if let Some(map) = assets.get(WORLD_MAP_KEY) {
            let world = self.config.world;
            let world_rect = Rect::new(0.0, 0.0, world.width, world.height);
            if let Some(src) = view.intersection(&world_rect) {
                let origin = viewport::to_screen(view, src.origin());
                let dst = Rect::new(origin.x, origin.y, src.width, src.height);
                surface.draw_image(map, src, dst);
                stats.background = true;
            }
        }

        for player in world.players() {
            let frame = world.avatar(&player.avatar).and_then(|def| {
                let (compass, index, _) =
                    def.select_frame(player.facing, player.moving, animation_step)?;
                assets.get(&avatar_frame_key(&def.name, compass, index))
            });
            let size = frame.map(|b| b.size()).unwrap_or_default();

            let bounds = Rect::centered(player.position(), size);
            let label = label_bounds(player.position(), size);
            if !viewport::is_visible(view, &bounds) && !viewport::is_visible(view, &label) {
                stats.culled += 1;
                continue;
            }

            let center = viewport::to_screen(view, player.position());
            match frame {
                Some(bitmap) => {
                    surface.draw_image(
                        bitmap,
                        Rect::new(0.0, 0.0, size.width, size.height),
                        Rect::centered(center, size),
                    );
                    stats.avatars_drawn += 1;
                }
                None => stats.avatars_missing += 1,
            }
            surface.draw_label(
                &player.username,
                center.x,
                center.y - size.height / 2.0 - self.config.label_gap,
            );
        }

        stats
    }
}

/// Rough world-space extent of the label drawn above an avatar of `size`.
fn label_bounds(pos: Vec2, size: Size) -> Rect {
    Rect::new(pos.x - 64.0, pos.y - size.height / 2.0 - 32.0, 128.0, 32.0)
}

// ---------------------------------------------------------------------------
// Recording surface
// ---------------------------------------------------------------------------

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Size),
    Image { src: Rect, dst: Rect },
    Label { text: String, x: f32, y: f32 },
}

/// Surface that records draw calls instead of rasterising them.
#[derive(Debug)]
pub struct RecordingSurface<B> {
    pub ops: Vec<DrawOp>,
    _bitmap: PhantomData<B>,
}

impl<B> Default for RecordingSurface<B> {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            _bitmap: PhantomData,
        }
    }
}

impl<B> RecordingSurface<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> impl Iterator<Item = (&Rect, &Rect)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { src, dst } => Some((src, dst)),
            _ => None,
        })
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, f32, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Label { text, x, y } => Some((text.as_str(), *x, *y)),
            _ => None,
        })
    }
}

impl<B: Bitmap> Surface for RecordingSurface<B> {
    type Bitmap = B;

    fn clear(&mut self, size: Size) {
        // a frame starts from scratch
        self.ops.clear();
        self.ops.push(DrawOp::Clear(size));
    }

    fn draw_image(&mut self, _bitmap: &B, src: Rect, dst: Rect) {
        self.ops.push(DrawOp::Image { src, dst });
    }

    fn draw_label(&mut self, text: &str, x: f32, y: f32) {
        self.ops.push(DrawOp::Label {
            text: text.to_string(),
            x,
            y,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, ImageLoader};
    use crate::types::{AvatarDefinition, Direction, Player};
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, PartialEq)]
    struct Img(Size);

    impl Bitmap for Img {
        fn size(&self) -> Size {
            self.0
        }
    }

    struct NoopLoader;

    impl ImageLoader for NoopLoader {
        type Bitmap = Img;

        fn load(&mut self, _key: &str, _url: &str) {}
    }

    fn walker() -> AvatarDefinition {
        let mut frames = BTreeMap::new();
        frames.insert("south".to_string(), vec!["s0".to_string()]);
        frames.insert(
            "east".to_string(),
            vec!["e0".to_string(), "e1".to_string(), "e2".to_string()],
        );
        AvatarDefinition {
            name: "w".into(),
            frames,
        }
    }

    fn world_with(players: Vec<Player>) -> WorldState {
        let mut world = WorldState::new();
        let players: HashMap<_, _> = players.into_iter().map(|p| (p.id.clone(), p)).collect();
        let mut avatars = HashMap::new();
        avatars.insert("w".to_string(), walker());
        world.apply_self_join("p1".into(), players, avatars);
        world
    }

    fn player(id: &str, x: f32, y: f32) -> Player {
        Player {
            id: id.into(),
            username: id.into(),
            x,
            y,
            avatar: "w".into(),
            ..Default::default()
        }
    }

    fn loaded(keys: &[(&str, f32)]) -> AssetCache<Img> {
        let mut cache = AssetCache::new();
        let mut loader = NoopLoader;
        for (key, side) in keys {
            cache.ensure(key, "url", &mut loader);
            let done: Result<Img, AssetError> = Ok(Img(Size::square(*side)));
            cache.finish(key, done).unwrap();
        }
        cache
    }

    #[test]
    fn background_is_clipped_to_world() {
        let renderer = Renderer::new(RenderConfig {
            world: Size::square(500.0),
            ..Default::default()
        });
        let world = world_with(vec![player("p1", 250.0, 250.0)]);
        let assets = loaded(&[(WORLD_MAP_KEY, 500.0)]);
        // 800x600 view centered on a 500x500 world
        let view = viewport::compute(Vec2::new(250.0, 250.0), Size::new(800.0, 600.0), Size::square(500.0));
        let mut surface = RecordingSurface::new();

        let stats = renderer.render_frame(&world, &view, &assets, 0, &mut surface);
        assert!(stats.background);

        let (src, dst) = surface.images().next().unwrap();
        assert_eq!(*src, Rect::new(0.0, 0.0, 500.0, 500.0));
        assert_eq!(*dst, Rect::new(150.0, 50.0, 500.0, 500.0));
    }

    #[test]
    fn players_outside_view_are_culled() {
        let renderer = Renderer::default();
        let world = world_with(vec![player("p1", 100.0, 100.0), player("far", 1900.0, 1900.0)]);
        let key = avatar_frame_key("w", "south", 0);
        let assets = loaded(&[(key.as_str(), 32.0)]);
        let view = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut surface = RecordingSurface::new();

        let stats = renderer.render_frame(&world, &view, &assets, 0, &mut surface);
        assert_eq!(stats.avatars_drawn, 1);
        assert_eq!(stats.culled, 1);
        assert_eq!(surface.labels().map(|l| l.0).collect::<Vec<_>>(), vec!["p1"]);
    }

    #[test]
    fn moving_player_cycles_walk_frames() {
        let renderer = Renderer::default();
        let mut p = player("p1", 100.0, 100.0);
        p.facing = Some(Direction::Right);
        p.moving = true;
        let world = world_with(vec![p]);
        // only the second east frame is loaded
        let key = avatar_frame_key("w", "east", 1);
        let assets = loaded(&[(key.as_str(), 16.0)]);
        let view = Rect::new(0.0, 0.0, 800.0, 600.0);
        let mut surface = RecordingSurface::new();

        let stats = renderer.render_frame(&world, &view, &assets, 0, &mut surface);
        assert_eq!(stats.avatars_missing, 1);

        let stats = renderer.render_frame(&world, &view, &assets, 4, &mut surface);
        assert_eq!(stats.avatars_drawn, 1);
        assert_eq!(surface.images().count(), 1);
    }

    #[test]
    fn clear_starts_a_new_recording() {
        let mut surface: RecordingSurface<Img> = RecordingSurface::new();
        surface.draw_label("x", 0.0, 0.0);
        surface.clear(Size::new(10.0, 10.0));
        assert_eq!(surface.ops, vec![DrawOp::Clear(Size::new(10.0, 10.0))]);
    }
}
