//! WorldState merge tests

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use roamer::types::{Player, PlayerPatch};
    use roamer::world::WorldState;
    use std::collections::HashMap;

    fn seeded() -> WorldState {
        let mut world = WorldState::new();
        let players = ["p1", "p2", "p3"]
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    Player {
                        username: id.to_string(),
                        ..Default::default()
                    },
                )
            })
            .collect();
        world.apply_self_join("p1".into(), players, HashMap::new());
        world
    }

    fn patch(x: Option<f32>, y: Option<f32>) -> PlayerPatch {
        PlayerPatch {
            x,
            y,
            ..Default::default()
        }
    }

    proptest! {
        /// Applying a sequence of patches leaves every field at the last
        /// value any patch carried for it.
        #[test]
        fn last_writer_wins_per_field(
            updates in prop::collection::vec(
                (0usize..3, prop::option::of(-10.0f32..2058.0), prop::option::of(-10.0f32..2058.0)),
                1..40,
            )
        ) {
            let ids = ["p1", "p2", "p3"];
            let mut world = seeded();
            let mut expected: HashMap<&str, (f32, f32)> =
                ids.iter().map(|id| (*id, (0.0, 0.0))).collect();

            for (i, x, y) in updates {
                let id = ids[i];
                let mut batch = HashMap::new();
                batch.insert(id.to_string(), patch(x, y));
                world.apply_players_moved(batch);

                let e = expected.get_mut(id).unwrap();
                if let Some(x) = x { e.0 = x; }
                if let Some(y) = y { e.1 = y; }
            }

            for id in ids {
                let p = world.player(id).unwrap();
                prop_assert_eq!((p.x, p.y), expected[id]);
                prop_assert_eq!(p.username.as_str(), id);
            }
            let local = world.local_player().unwrap();
            prop_assert_eq!((local.x, local.y), expected["p1"]);
        }
    }

    #[test]
    fn rejoin_of_local_player_restores_cached_copy() {
        let mut world = seeded();
        world.apply_player_left("p1");
        let touched = world.apply_player_joined(
            Player {
                id: "p1".into(),
                x: 42.0,
                ..Default::default()
            },
            Default::default(),
        );
        assert!(touched);
        assert_eq!(world.local_player().map(|p| p.x), Some(42.0));
    }
}
