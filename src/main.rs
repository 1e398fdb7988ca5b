//! Tweenscript player: runs a script and steps its timeline frame by frame,
//! printing a summary of what would be drawn.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use tweenscript::render::{BoxGlyphs, TraceRenderer};
use tweenscript::{PlaybackConfig, Player};

#[derive(Parser)]
#[command(name = "tweenscript", version, about = "Play a tweenscript animation")]
struct Cli {
    /// Script to play.
    script: PathBuf,

    /// How many seconds of the timeline to play.
    #[arg(long, default_value_t = 5.0)]
    seconds: f64,

    /// Override the configured frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Config file; defaults to ~/.tweenscript/config.yaml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pace frames in wall-clock time instead of stepping as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Print a frame summary every N frames.
    #[arg(long, default_value_t = 30)]
    every: u64,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PlaybackConfig::from_path(path)?,
        None => PlaybackConfig::load().unwrap_or_default(),
    };
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }

    let source = std::fs::read_to_string(&cli.script)
        .map_err(|e| format!("cannot read {}: {e}", cli.script.display()))?;

    let frame_time = config.frame_time();
    let mut player = Player::load(&source, config, Arc::new(BoxGlyphs));
    for diagnostic in player.diagnostics() {
        eprintln!("{}: {diagnostic}", cli.script.display());
    }
    for line in player.runtime().output() {
        println!("{line}");
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

    let frames = (cli.seconds / frame_time).ceil().max(0.0) as u64;
    let every = cli.every.max(1);
    let mut renderer = TraceRenderer::new();
    let mut printed = player.runtime().output().len();
    let started = Instant::now();

    for frame in 0..=frames {
        if stop.load(Ordering::SeqCst) {
            log::info!("interrupted at frame {frame}");
            break;
        }
        if frame > 0 {
            player.update(frame_time);
        }

        let output = player.runtime().output();
        for line in &output[printed..] {
            println!("{line}");
        }
        printed = output.len();

        if frame % every == 0 || frame == frames {
            renderer.clear();
            player.render(&mut renderer);
            println!(
                "t={:7.3}s  shapes={:3}  vertices={:5}  pending={}",
                player.scene().current_time(),
                renderer.calls.len(),
                renderer.vertex_count(),
                player.scene().pending()
            );
        }

        if cli.realtime {
            let due = Duration::from_secs_f64(frame_time * (frame + 1) as f64);
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
        }
    }

    let failures = player.scene().failures();
    if failures > 0 {
        log::warn!("{failures} scheduled actions failed");
    }
    Ok(())
}
