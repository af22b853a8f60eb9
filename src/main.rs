//! Territory Pong entry point
//!
//! `relay` serves the broadcast hub; `simulate` plays a headless match,
//! optionally mirroring it to a relay.

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use territory_pong::net::{Relay, RelayLink};
use territory_pong::renderer::RecordingSink;
use territory_pong::sim::{Game, GameConfig, PlayerSide, RunOutcome, Runner};
use territory_pong::{GameError, Result, Settings};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the broadcast relay
    Relay {
        /// Listen port (defaults to WS_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Play a headless match until game over
    Simulate {
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long)]
        seed: Option<u64>,
        /// Give up after this many frames
        #[arg(long)]
        max_frames: Option<u64>,
        /// Relay URL to mirror events to (defaults to WS_ADDRESS when WS_ENABLED)
        #[arg(long)]
        relay: Option<String>,
        /// Tick at display cadence instead of as fast as possible
        #[arg(long)]
        realtime: bool,
        /// Randomize each ball's initial vertical direction
        #[arg(long)]
        randomize_direction: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.app_env.default_log_level()),
    )
    .init();
    log::info!("Territory Pong ({}) starting...", settings.app_env);
    if let (Some(version), Some(commit)) = (&settings.version, &settings.commit) {
        log::info!("version {version} ({commit})");
    }

    let result = match cli.command {
        Command::Relay { port } => run_relay(port.unwrap_or(settings.ws_port)),
        Command::Simulate {
            width,
            height,
            seed,
            max_frames,
            relay,
            realtime,
            randomize_direction,
        } => {
            let config = GameConfig {
                seed,
                randomize_direction,
                ..GameConfig::default()
            };
            let relay = relay.or_else(|| settings.ws_enabled.then(|| settings.ws_address.clone()));
            simulate(&settings, config, (width, height), relay, realtime, max_frames)
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run_relay(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| GameError::Transport(e.to_string()))?;
    runtime.block_on(Relay::new().serve(port))
}

fn simulate(
    settings: &Settings,
    config: GameConfig,
    (width, height): (u32, u32),
    relay: Option<String>,
    realtime: bool,
    max_frames: Option<u64>,
) -> Result<()> {
    let sink = RecordingSink::new(width, height);
    let mut builder = Game::builder()
        .config(config)
        .render_sink(sink)
        .gamepad_enabled(settings.gamepad_enabled);
    if let Some(url) = relay {
        log::info!("mirroring events to {url}");
        builder = builder.link(RelayLink::connect(url)?);
    }
    let mut game = builder.build()?;

    // Events published before the socket opens are dropped
    let deadline = Instant::now() + Duration::from_secs(2);
    while game.has_link() && !game.is_linked() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }

    game.start();
    let mut runner = Runner::new().realtime(realtime);
    if let Some(max) = max_frames {
        runner = runner.max_ticks(max);
    }
    let outcome = runner.run(&mut game)?;

    match outcome {
        RunOutcome::GameOver(winner) => log::info!("game {} over: {winner} wins", game.id()),
        RunOutcome::Stopped => log::info!("game {} stopped", game.id()),
        RunOutcome::TickLimit => log::info!("game {} hit the frame limit", game.id()),
    }
    let grid = game.grid();
    log::info!(
        "territory: dark {} cells, light {} cells",
        grid.count(PlayerSide::Dark),
        grid.count(PlayerSide::Light)
    );

    game.destroy();
    Ok(())
}
