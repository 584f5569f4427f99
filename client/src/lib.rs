//! # World Map Client Library
//!
//! This library provides the client side of the multiplayer world map. It keeps
//! a websocket open to the server, mirrors the server's roster of players and
//! avatars, renders the part of the world around the local player, and turns
//! arrow keys into movement commands.
//!
//! ## Architecture Overview
//!
//! The server is the only source of truth. The client never moves a player on
//! its own: it sends `move`/`stop` commands and waits for the server to push
//! new positions back. There is no prediction, interpolation or reconnect.
//!
//! All state lives in one [`session::Session`] owned by the UI thread. Work
//! done elsewhere (socket I/O, image decoding on the tokio runtime) comes back
//! as events that the session reduces one at a time, so every mutation of the
//! world is atomic with respect to drawing.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - Websocket connection to one endpoint
//! - JSON encoding of outgoing commands, parsing of incoming messages
//! - Malformed messages are logged and dropped without closing the socket
//!
//! ### Game Module (`game`)
//! The world state reducer:
//! - `join_game` replaces the snapshot, `player_joined` inserts
//! - `players_moved` merges, `player_left` removes
//!
//! ### Assets Module (`assets`)
//! - Data-url frame decoding on the blocking pool
//! - Per-avatar texture cache, loaded once per avatar
//!
//! ### Viewport Module (`viewport`)
//! Clamped camera rectangle centred on the local player.
//!
//! ### Rendering Module (`rendering`)
//! - Composes a draw list on state changes
//! - Culls off-screen players and skips frames that are not decoded yet
//! - Outlined name labels
//!
//! ### Input Module (`input`)
//! Held-key tracking; the last pressed arrow wins.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::assets::ThreadedDecoder;
//! use client::network::Connection;
//! use client::session::{ClientEvent, Session, SessionConfig};
//! use macroquad::math::vec2;
//! use tokio::sync::mpsc::unbounded_channel;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let (network_tx, mut network_rx) = unbounded_channel();
//! let (asset_tx, _asset_rx) = unbounded_channel();
//!
//! let connection = Connection::connect(runtime.handle(), "ws://127.0.0.1:8080", network_tx);
//! let decoder = ThreadedDecoder::new(runtime.handle().clone(), asset_tx);
//! let config = SessionConfig { username: "Player".into(), world_size: 2048.0 };
//! let mut session = Session::new(config, connection, decoder, vec2(800.0, 600.0));
//!
//! while let Ok(event) = network_rx.try_recv() {
//!     session.handle(ClientEvent::Network(event));
//! }
//! ```

pub mod assets;
pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod session;
pub mod viewport;
