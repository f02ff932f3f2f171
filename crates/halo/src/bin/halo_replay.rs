//! # HALO Replay
//!
//! Headless run of the engine against synthetic landmarks.
//!
//! Text given on the command line is committed from a separate input thread,
//! one phrase per second, through the engine's commit queue. The main thread
//! is the frame driver: it measures `dt`, ticks the shared engine and logs
//! statistics once per second.
//!
//! ```bash
//! RUST_LOG=debug halo_replay --config halo.toml --seconds 10 "hello world" "second phrase"
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use halo::{FrameClock, LandmarkSource, SyntheticLandmarks};
use halo_core::{Engine, HaloConfig, HaloResult, LiveSettings, SharedEngine};

/// Target frame rate of the driver loop.
const DEFAULT_FPS: u32 = 60;
/// Default run length.
const DEFAULT_SECONDS: u64 = 10;
/// Delay between committed phrases.
const COMMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Parsed command line.
struct Args {
    config: Option<String>,
    seconds: u64,
    fps: u32,
    phrases: Vec<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        seconds: DEFAULT_SECONDS,
        fps: DEFAULT_FPS,
        phrases: Vec::new(),
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?),
            "--seconds" => {
                let value = iter.next().ok_or("--seconds needs a number")?;
                args.seconds = value.parse().map_err(|_| format!("bad --seconds {value:?}"))?;
            }
            "--fps" => {
                let value = iter.next().ok_or("--fps needs a number")?;
                args.fps = value
                    .parse::<u32>()
                    .map_err(|_| format!("bad --fps {value:?}"))?
                    .max(1);
            }
            _ => args.phrases.push(arg),
        }
    }
    if args.phrases.is_empty() {
        args.phrases = vec!["hello".into(), "words orbit the head".into(), "veil".into()];
    }
    Ok(args)
}

fn build_engine(config_path: Option<&str>) -> HaloResult<Engine> {
    let config = match config_path {
        Some(path) => HaloConfig::load(path)?,
        None => HaloConfig::default(),
    };
    let live = Arc::new(LiveSettings::new(&config.live));
    Engine::new(config, live)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,halo_core=info".into()),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("halo_replay: {message}");
            eprintln!("usage: halo_replay [--config PATH] [--seconds N] [--fps N] [PHRASE ...]");
            return ExitCode::FAILURE;
        }
    };

    let engine = match build_engine(args.config.as_deref()) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(error = %err, "cannot start engine");
            return ExitCode::FAILURE;
        }
    };
    let shared = SharedEngine::new(engine);

    // === INPUT THREAD ===
    let sender = shared.commit_sender();
    let phrases = args.phrases;
    let input = thread::spawn(move || {
        for phrase in phrases {
            if let Err(err) = sender.commit_text(phrase.as_str()) {
                tracing::warn!(error = %err, phrase = %phrase, "commit not queued");
            }
            thread::sleep(COMMIT_INTERVAL);
        }
    });

    // === FRAME LOOP ===
    let mut source = SyntheticLandmarks::default();
    let mut clock = FrameClock::new();
    let budget = Duration::from_secs(1) / args.fps;
    let total_frames = args.seconds * u64::from(args.fps);
    let mut glyphs_this_second = 0usize;
    let mut frames_this_second = 0u32;

    tracing::info!(seconds = args.seconds, fps = args.fps, "replay started");
    for _ in 0..total_frames {
        let dt = clock.tick();
        let frame = source.frame_at(clock.elapsed().as_secs_f64());
        let stats = shared.tick(&frame, dt);

        glyphs_this_second += stats.glyphs;
        frames_this_second += 1;
        if frames_this_second == args.fps {
            tracing::info!(
                frame = stats.frame,
                orbit = stats.orbit,
                veil = stats.veil,
                avg_glyphs = glyphs_this_second / frames_this_second as usize,
                face = stats.face_present,
                pushed = stats.orbit_pushed + stats.veil_pushed,
                "frame stats"
            );
            glyphs_this_second = 0;
            frames_this_second = 0;
        }
        clock.pace(budget);
    }

    if input.join().is_err() {
        tracing::warn!("input thread panicked");
    }
    let engine = shared.lock();
    tracing::info!(
        frames = clock.frames(),
        particles = engine.store().len(),
        sim_seconds = engine.clock(),
        "replay finished"
    );
    ExitCode::SUCCESS
}
