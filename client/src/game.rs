use log::{debug, error, info};
use shared::{Avatar, Player, PlayerId, ServerMessage};
use std::collections::HashMap;

/// What the caller must do after a message has been applied. Composing a
/// frame always recomputes the viewport first, so `Redraw` only differs from
/// `RecomputeAndRedraw` in when the viewport catches up: at the next draw
/// rather than immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Redraw,
    RecomputeAndRedraw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub effect: Effect,
    /// Avatars the message referenced; the loader skips ones it already has.
    pub avatars_to_load: Vec<String>,
}

impl Update {
    fn none() -> Self {
        Self {
            effect: Effect::None,
            avatars_to_load: Vec::new(),
        }
    }

    fn with(effect: Effect) -> Self {
        Self {
            effect,
            avatars_to_load: Vec::new(),
        }
    }
}

/// Client-side copy of the roster, written only by `apply`
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub players: HashMap<PlayerId, Player>,
    pub avatars: HashMap<String, Avatar>,
    pub local_player_id: Option<PlayerId>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local_player_id
            .as_ref()
            .and_then(|id| self.players.get(id))
    }

    pub fn avatar_for(&self, player: &Player) -> Option<&Avatar> {
        self.avatars.get(&player.avatar)
    }

    pub fn apply(&mut self, message: ServerMessage) -> Update {
        match message {
            ServerMessage::JoinGame {
                success: true,
                player_id,
                players,
                avatars,
                ..
            } => {
                info!(
                    "Joined game as {:?} with {} players and {} avatars",
                    player_id,
                    players.len(),
                    avatars.len()
                );

                self.players = players;
                self.avatars = avatars;
                self.local_player_id = player_id;

                Update {
                    effect: Effect::RecomputeAndRedraw,
                    avatars_to_load: self.avatars.keys().cloned().collect(),
                }
            }

            ServerMessage::JoinGame {
                success: false,
                error: reason,
                ..
            } => {
                error!(
                    "Failed to join game: {}",
                    reason.as_deref().unwrap_or("no reason given")
                );
                Update::none()
            }

            ServerMessage::PlayerJoined { player, avatar } => {
                debug!("Player {} joined with avatar {}", player.id, avatar.name);

                let avatar_name = avatar.name.clone();
                self.players.insert(player.id.clone(), player);
                self.avatars.insert(avatar_name.clone(), avatar);

                Update {
                    effect: Effect::Redraw,
                    avatars_to_load: vec![avatar_name],
                }
            }

            ServerMessage::PlayersMoved { players } => {
                self.players.extend(players);
                Update::with(Effect::RecomputeAndRedraw)
            }

            ServerMessage::PlayerLeft { player_id } => match self.players.remove(&player_id) {
                Some(_) => {
                    debug!("Player {} left", player_id);
                    Update::with(Effect::Redraw)
                }
                None => Update::none(),
            },

            ServerMessage::Unknown => {
                debug!("Ignoring message with unknown action");
                Update::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Direction;

    fn avatar(name: &str) -> Avatar {
        let mut avatar = Avatar {
            name: name.to_string(),
            ..Default::default()
        };
        avatar
            .frames
            .insert(Direction::Down, vec!["data:image/png;base64,AA==".to_string()]);
        avatar
    }

    fn joined_world() -> WorldState {
        let mut world = WorldState::new();
        let players = HashMap::from([
            ("A".to_string(), Player::new("A", 10.0, 20.0, "cat")),
            ("B".to_string(), Player::new("B", 30.0, 40.0, "dog")),
        ]);
        let avatars = HashMap::from([
            ("cat".to_string(), avatar("cat")),
            ("dog".to_string(), avatar("dog")),
        ]);
        world.apply(ServerMessage::JoinGame {
            success: true,
            player_id: Some("A".to_string()),
            players,
            avatars,
            error: None,
        });
        world
    }

    #[test]
    fn test_join_success_replaces_snapshot() {
        let mut world = WorldState::new();
        world
            .players
            .insert("stale".to_string(), Player::new("stale", 0.0, 0.0, "old"));

        let players = HashMap::from([("1".to_string(), Player::new("1", 100.0, 100.0, "cat"))]);
        let avatars = HashMap::from([("cat".to_string(), avatar("cat"))]);
        let update = world.apply(ServerMessage::JoinGame {
            success: true,
            player_id: Some("1".to_string()),
            players,
            avatars,
            error: None,
        });

        assert_eq!(update.effect, Effect::RecomputeAndRedraw);
        assert_eq!(update.avatars_to_load, vec!["cat".to_string()]);
        assert!(!world.players.contains_key("stale"));
        assert_eq!(world.local_player().map(|p| p.x), Some(100.0));
    }

    #[test]
    fn test_join_failure_changes_nothing() {
        let mut world = joined_world();
        let before = world.players.clone();

        let update = world.apply(ServerMessage::JoinGame {
            success: false,
            player_id: None,
            players: HashMap::new(),
            avatars: HashMap::new(),
            error: Some("server full".to_string()),
        });

        assert_eq!(update, Update::none());
        assert_eq!(world.players, before);
        assert_eq!(world.local_player_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_bare_join_rejection_takes_failure_path() {
        let mut world = WorldState::new();
        let message = ServerMessage::parse(r#"{"success":false,"error":"taken"}"#).unwrap();

        let update = world.apply(message);

        assert_eq!(update, Update::none());
        assert!(world.local_player_id.is_none());
        assert!(world.players.is_empty());
    }

    #[test]
    fn test_player_joined_inserts_player_and_avatar() {
        let mut world = joined_world();
        let update = world.apply(ServerMessage::PlayerJoined {
            player: Player::new("C", 5.0, 5.0, "owl"),
            avatar: avatar("owl"),
        });

        assert_eq!(update.effect, Effect::Redraw);
        assert_eq!(update.avatars_to_load, vec!["owl".to_string()]);
        assert!(world.players.contains_key("C"));
        assert!(world.avatars.contains_key("owl"));
    }

    #[test]
    fn test_player_joined_overwrites_existing_entry() {
        let mut world = joined_world();
        world.apply(ServerMessage::PlayerJoined {
            player: Player::new("B", 99.0, 99.0, "dog"),
            avatar: avatar("dog"),
        });

        assert_eq!(world.players.len(), 2);
        assert_eq!(world.players["B"].x, 99.0);
    }

    #[test]
    fn test_players_moved_merges_only_supplied_keys() {
        let mut world = joined_world();
        let untouched = world.players["A"].clone();

        let mut moved = Player::new("B", 300.0, 400.0, "dog");
        moved.facing = Direction::Left;
        moved.animation_frame = Some(2);

        let update = world.apply(ServerMessage::PlayersMoved {
            players: HashMap::from([("B".to_string(), moved.clone())]),
        });

        assert_eq!(update.effect, Effect::RecomputeAndRedraw);
        assert!(update.avatars_to_load.is_empty());
        assert_eq!(world.players.len(), 2);
        assert_eq!(world.players["A"], untouched);
        assert_eq!(world.players["B"], moved);
    }

    #[test]
    fn test_player_left_removes_entry() {
        let mut world = joined_world();
        let update = world.apply(ServerMessage::PlayerLeft {
            player_id: "B".to_string(),
        });

        assert_eq!(update.effect, Effect::Redraw);
        assert!(!world.players.contains_key("B"));
        assert!(world.avatars.contains_key("dog"));
    }

    #[test]
    fn test_player_left_unknown_id_is_noop() {
        let mut world = joined_world();
        let before = world.players.clone();

        let update = world.apply(ServerMessage::PlayerLeft {
            player_id: "nobody".to_string(),
        });

        assert_eq!(update.effect, Effect::None);
        assert_eq!(world.players, before);
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut world = joined_world();
        let update = world.apply(ServerMessage::Unknown);
        assert_eq!(update.effect, Effect::None);
        assert_eq!(world.players.len(), 2);
    }

    #[test]
    fn test_local_player_absent_before_join() {
        let world = WorldState::new();
        assert!(world.local_player().is_none());
    }
}
