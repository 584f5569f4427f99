//! Avatar frame and background decoding with a per-avatar texture cache

use base64::Engine;
use log::{debug, warn};
use macroquad::math::{vec2, Vec2};
use macroquad::texture::{Image, Texture2D};
use shared::{Avatar, Direction};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("not a data url")]
    NotDataUrl,
    #[error("data url is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Image(String),
}

/// Cache address of one animation frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub avatar: String,
    pub direction: Direction,
    pub index: usize,
}

pub struct DecodeJob {
    pub key: FrameKey,
    pub data_url: String,
}

/// Decode completions delivered back to the UI thread
pub enum AssetEvent {
    FrameDecoded {
        key: FrameKey,
        result: Result<Image, AssetError>,
    },
    BackgroundDecoded(Result<Image, AssetError>),
}

/// Anything that can be drawn as a sprite
pub trait Drawable: Clone {
    fn size(&self) -> Vec2;
}

impl Drawable for Texture2D {
    fn size(&self) -> Vec2 {
        vec2(self.width(), self.height())
    }
}

/// Accepts decode work; completion is reported out of band.
pub trait FrameDecoder {
    fn submit(&self, job: DecodeJob);
}

/// Decodes on the tokio blocking pool and reports through a channel
#[derive(Clone)]
pub struct ThreadedDecoder {
    runtime: Handle,
    events: UnboundedSender<AssetEvent>,
}

impl ThreadedDecoder {
    pub fn new(runtime: Handle, events: UnboundedSender<AssetEvent>) -> Self {
        Self { runtime, events }
    }

    pub fn load_background(&self, path: PathBuf) {
        let events = self.events.clone();
        self.runtime.spawn_blocking(move || {
            let result = std::fs::read(&path)
                .map_err(|source| AssetError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|bytes| decode_image(&bytes));
            let _ = events.send(AssetEvent::BackgroundDecoded(result));
        });
    }
}

impl FrameDecoder for ThreadedDecoder {
    fn submit(&self, job: DecodeJob) {
        let events = self.events.clone();
        self.runtime.spawn_blocking(move || {
            let result = decode_data_url(&job.data_url).and_then(|bytes| decode_image(&bytes));
            // The receiver only goes away when the window is closing.
            let _ = events.send(AssetEvent::FrameDecoded {
                key: job.key,
                result,
            });
        });
    }
}

/// Extracts the payload of a `data:<mime>;base64,<payload>` url
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let rest = url.strip_prefix("data:").ok_or(AssetError::NotDataUrl)?;
    let (meta, payload) = rest.split_once(',').ok_or(AssetError::NotDataUrl)?;

    if !meta.ends_with(";base64") {
        return Err(AssetError::NotBase64);
    }

    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

fn decode_image(bytes: &[u8]) -> Result<Image, AssetError> {
    Image::from_file_with_format(bytes, None).map_err(|e| AssetError::Image(e.to_string()))
}

/// Per-avatar frame cache. An avatar is requested at most once; frames
/// appear individually as their decodes finish.
pub struct AssetLoader<H, D> {
    decoder: D,
    requested: HashSet<String>,
    frames: HashMap<String, HashMap<(Direction, usize), H>>,
    background: Option<H>,
}

impl<H: Drawable, D: FrameDecoder> AssetLoader<H, D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            requested: HashSet::new(),
            frames: HashMap::new(),
            background: None,
        }
    }

    /// Queues a decode for every frame of `avatar`; returns how many were queued.
    pub fn load(&mut self, avatar: &Avatar) -> usize {
        if !self.requested.insert(avatar.name.clone()) {
            return 0;
        }

        let mut queued = 0;
        for direction in Direction::ALL {
            for (index, data_url) in avatar.frames(direction).iter().enumerate() {
                self.decoder.submit(DecodeJob {
                    key: FrameKey {
                        avatar: avatar.name.clone(),
                        direction,
                        index,
                    },
                    data_url: data_url.clone(),
                });
                queued += 1;
            }
        }

        debug!("Queued {} frames for avatar {}", queued, avatar.name);
        queued
    }

    pub fn is_requested(&self, avatar: &str) -> bool {
        self.requested.contains(avatar)
    }

    pub fn insert_frame(&mut self, key: FrameKey, handle: H) {
        self.frames
            .entry(key.avatar)
            .or_default()
            .insert((key.direction, key.index), handle);
    }

    pub fn frame(&self, avatar: &str, direction: Direction, index: usize) -> Option<&H> {
        self.frames.get(avatar)?.get(&(direction, index))
    }

    pub fn set_background(&mut self, handle: H) {
        self.background = Some(handle);
    }

    pub fn background(&self) -> Option<&H> {
        self.background.as_ref()
    }
}

/// Logs a failed decode; the frame simply never becomes drawable.
pub fn report_failure(key: &FrameKey, err: &AssetError) {
    warn!(
        "Failed to decode frame {} of {}/{:?}: {}",
        key.index, key.avatar, key.direction, err
    );
}
