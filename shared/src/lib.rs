use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Edge length of the square world, in world pixels.
pub const WORLD_SIZE: f32 = 2048.0;
/// Players further than this outside the canvas are not drawn.
pub const CULL_MARGIN: f32 = 64.0;
/// Display name sent with the automatic join request.
pub const DEFAULT_USERNAME: &str = "Player";

pub type PlayerId = String;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Reads a facing name as sent by the server. Both screen directions
    /// and compass points are accepted, case-insensitively.
    pub fn from_facing(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "up" | "north" => Some(Direction::Up),
            "down" | "south" => Some(Direction::Down),
            "left" | "west" => Some(Direction::Left),
            "right" | "east" => Some(Direction::Right),
            _ => None,
        }
    }
}

// An unrecognised facing falls back to the default instead of failing the
// whole message the player arrived in.
fn deserialize_facing<'de, D>(deserializer: D) -> Result<Direction, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(Direction::from_facing)
        .unwrap_or_default())
}

// Frame lists keyed by a direction we cannot read are dropped.
fn deserialize_frames<'de, D>(deserializer: D) -> Result<HashMap<Direction, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Vec<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, frames)| Direction::from_facing(&name).map(|d| (d, frames)))
        .collect())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    #[serde(default, alias = "direction", deserialize_with = "deserialize_facing")]
    pub facing: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_frame: Option<usize>,
    #[serde(default)]
    pub username: String,
    pub avatar: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, x: f32, y: f32, avatar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            facing: Direction::default(),
            animation_frame: None,
            username: String::new(),
            avatar: avatar.into(),
        }
    }

    /// Frame index to draw, falling back to the first frame.
    pub fn frame_index(&self) -> usize {
        self.animation_frame.unwrap_or(0)
    }
}

/// A named sprite set; each direction holds image data URLs in animation order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Avatar {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_frames")]
    pub frames: HashMap<Direction, Vec<String>>,
}

impl Avatar {
    pub fn frames(&self, direction: Direction) -> &[String] {
        self.frames
            .get(&direction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Commands sent from the client to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame { username: String },
    Move { direction: Direction },
    Stop,
}

/// Messages pushed by the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinGame {
        success: bool,
        #[serde(default, rename = "playerId", skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
        #[serde(default)]
        players: HashMap<PlayerId, Player>,
        #[serde(default)]
        avatars: HashMap<String, Avatar>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    PlayerJoined {
        player: Player,
        avatar: Avatar,
    },
    PlayersMoved {
        players: HashMap<PlayerId, Player>,
    },
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parses one inbound text frame. A rejected join may arrive as a bare
    /// `{"success": false, "error": ...}` without an `action` tag.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;

        if value.get("action").is_none() && value.get("success") == Some(&Value::Bool(false)) {
            return Ok(ServerMessage::JoinGame {
                success: false,
                player_id: None,
                players: HashMap::new(),
                avatars: HashMap::new(),
                error: value.get("error").and_then(Value::as_str).map(str::to_string),
            });
        }

        serde_json::from_value(value)
    }
}
