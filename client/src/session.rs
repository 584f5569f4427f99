//! The client session: owns all state and reduces every inbound event

use crate::assets::{report_failure, AssetEvent, AssetLoader, FrameDecoder, ThreadedDecoder};
use crate::game::{Effect, WorldState};
use crate::input::InputManager;
use crate::network::{Connection, NetworkEvent};
use crate::rendering::{compose_frame, Frame};
use crate::viewport::Viewport;
use log::{debug, error, info, warn};
use macroquad::prelude::*;
use shared::{ClientMessage, Direction};

/// Everything the session reacts to
pub enum ClientEvent {
    Network(NetworkEvent),
    Asset(AssetEvent),
    KeyDown(Direction),
    KeyUp(Direction),
    Resized(Vec2),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    pub world_size: f32,
}

pub struct Session<D: FrameDecoder = ThreadedDecoder> {
    config: SessionConfig,
    connection: Connection,
    world: WorldState,
    viewport: Viewport,
    input: InputManager,
    assets: AssetLoader<Texture2D, D>,
    canvas: Vec2,
    dirty: bool,
    joined_sent: bool,
}

impl<D: FrameDecoder> Session<D> {
    pub fn new(config: SessionConfig, connection: Connection, decoder: D, canvas: Vec2) -> Self {
        Self {
            config,
            connection,
            world: WorldState::new(),
            viewport: Viewport::new(),
            input: InputManager::new(),
            assets: AssetLoader::new(decoder),
            canvas,
            dirty: true,
            joined_sent: false,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn assets(&self) -> &AssetLoader<Texture2D, D> {
        &self.assets
    }

    pub fn canvas(&self) -> Vec2 {
        self.canvas
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Network(event) => self.handle_network(event),
            ClientEvent::Asset(event) => self.handle_asset(event),
            ClientEvent::KeyDown(direction) => {
                let command = self.input.key_down(direction);
                self.send_command(command);
            }
            ClientEvent::KeyUp(direction) => {
                let command = self.input.key_up(direction);
                self.send_command(command);
            }
            ClientEvent::Resized(canvas) => {
                debug!("Canvas resized to {}x{}", canvas.x, canvas.y);
                self.canvas = canvas;
                self.recompute_viewport();
                self.dirty = true;
            }
        }
    }

    fn handle_network(&mut self, event: NetworkEvent) {
        self.connection.observe(&event);

        match event {
            NetworkEvent::Opened => {
                if !self.joined_sent {
                    self.joined_sent = true;
                    let join = ClientMessage::JoinGame {
                        username: self.config.username.clone(),
                    };
                    if let Err(e) = self.connection.send(&join) {
                        error!("Failed to send join request: {}", e);
                    }
                }
            }
            NetworkEvent::Message(message) => {
                let update = self.world.apply(message);

                for name in &update.avatars_to_load {
                    if let Some(avatar) = self.world.avatars.get(name) {
                        self.assets.load(avatar);
                    }
                }

                match update.effect {
                    Effect::None => {}
                    Effect::Redraw => self.dirty = true,
                    Effect::RecomputeAndRedraw => {
                        self.recompute_viewport();
                        self.dirty = true;
                    }
                }
            }
            NetworkEvent::Closed => info!("Disconnected from server"),
            NetworkEvent::Error(reason) => error!("Connection error: {}", reason),
        }
    }

    fn handle_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::FrameDecoded { key, result } => match result {
                Ok(image) => {
                    let texture = Texture2D::from_image(&image);
                    texture.set_filter(FilterMode::Nearest);
                    self.assets.insert_frame(key, texture);
                    self.dirty = true;
                }
                Err(e) => report_failure(&key, &e),
            },
            AssetEvent::BackgroundDecoded(result) => match result {
                Ok(image) => {
                    info!("Background loaded ({}x{})", image.width, image.height);
                    self.assets.set_background(Texture2D::from_image(&image));
                    self.dirty = true;
                }
                Err(e) => error!("Failed to load background: {}", e),
            },
        }
    }

    // Commands are dropped while the connection is not open.
    fn send_command(&self, command: Option<ClientMessage>) {
        let Some(command) = command else {
            return;
        };
        if !self.connection.is_ready() {
            debug!("Not connected, dropping {:?}", command);
            return;
        }
        debug!(
            "Sending {:?} (moving {:?})",
            command,
            self.input.last_sent()
        );
        if let Err(e) = self.connection.send(&command) {
            warn!("Failed to send {:?}: {}", command, e);
        }
    }

    fn recompute_viewport(&mut self) {
        if let Some(local) = self.world.local_player() {
            let focus = vec2(local.x, local.y);
            self.viewport
                .recompute(focus, self.canvas, self.config.world_size);
        }
    }

    /// Composes a new frame if anything changed since the last one. The
    /// viewport is recomputed before every composition, so a roster-only
    /// redraw still follows the local player.
    pub fn take_frame(&mut self) -> Option<Frame<Texture2D>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        self.recompute_viewport();

        Some(compose_frame(
            &self.world,
            &self.viewport,
            self.canvas,
            self.config.world_size,
            &self.assets,
        ))
    }

    pub fn shutdown(&mut self) {
        self.connection.disconnect();
    }
}
