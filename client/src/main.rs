use clap::Parser;
use client::assets::ThreadedDecoder;
use client::input::{InputManager, KeyTransition};
use client::network::Connection;
use client::rendering::Renderer;
use client::session::{ClientEvent, Session, SessionConfig};
use log::{error, info};
use macroquad::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Websocket URL of the game server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,

    /// Display name sent when joining
    #[arg(short = 'u', long, default_value = shared::DEFAULT_USERNAME)]
    username: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: i32,

    /// Edge length of the square world in pixels
    #[arg(long, default_value_t = shared::WORLD_SIZE)]
    world_size: f32,

    /// Background image covering the whole world
    #[arg(short = 'b', long, default_value = "assets/background.png")]
    background: PathBuf,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "World Map".to_owned(),
        window_width: args.width,
        window_height: args.height,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(Args::parse()).await {
        error!("Client stopped: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: arrow keys to move");

    let (network_tx, mut network_rx) = unbounded_channel();
    let (asset_tx, mut asset_rx) = unbounded_channel();

    let connection = Connection::connect(runtime.handle(), &args.server, network_tx);
    let decoder = ThreadedDecoder::new(runtime.handle().clone(), asset_tx);
    decoder.load_background(args.background.clone());

    let config = SessionConfig {
        username: args.username,
        world_size: args.world_size,
    };
    let mut session = Session::new(
        config,
        connection,
        decoder,
        vec2(screen_width(), screen_height()),
    );
    let mut renderer = Renderer::new();

    prevent_quit();

    loop {
        if is_quit_requested() {
            info!("Window closed");
            session.shutdown();
            break;
        }

        while let Ok(event) = network_rx.try_recv() {
            session.handle(ClientEvent::Network(event));
        }
        while let Ok(event) = asset_rx.try_recv() {
            session.handle(ClientEvent::Asset(event));
        }

        for transition in InputManager::poll_transitions() {
            session.handle(match transition {
                KeyTransition::Pressed(direction) => ClientEvent::KeyDown(direction),
                KeyTransition::Released(direction) => ClientEvent::KeyUp(direction),
            });
        }

        let canvas = vec2(screen_width(), screen_height());
        if canvas != session.canvas() {
            session.handle(ClientEvent::Resized(canvas));
        }

        if let Some(frame) = session.take_frame() {
            renderer.set_frame(frame);
        }
        renderer.present();

        next_frame().await;
    }

    // Give the writer task a moment to flush the close frame.
    runtime.shutdown_timeout(Duration::from_millis(200));
    Ok(())
}
