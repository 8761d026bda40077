//! CueForge Demo
//!
//! Mounts banks from disk and plays a short scene against the simulated
//! backend:
//!   cueforge-demo --banks-dir demos/banks --frames 120 --seed 7

mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cf_core::Position;
use cf_event::{AnchorRef, BankLoad, EventManager, ManagerConfig, SimBackend, SimProbe, TrackedAnchor};
use clap::Parser;

use crate::loader::FileBankSource;

/// Frames advanced per simulated tick
const FRAMES_PER_TICK: u32 = 1;

#[derive(Parser)]
#[command(name = "cueforge-demo", about = "Play a sample scene through the CueForge event system")]
struct Cli {
    /// Directory holding `<bank>.json` / `<bank>.yaml` files
    #[arg(long, default_value = "demos/banks")]
    banks_dir: PathBuf,

    /// Bank to mount (repeatable)
    #[arg(long = "bank", default_values_t = [String::from("weapons"), String::from("loops")])]
    banks: Vec<String>,

    /// Ticks to simulate
    #[arg(long, default_value_t = 90)]
    frames: u32,

    /// Variant-selection seed
    #[arg(long)]
    seed: Option<u64>,

    /// Manager config (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ManagerConfig {
            log_missing_events: true,
            ..Default::default()
        },
    };
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    let backend = SimBackend::new()
        .with_clip_length("hum.wav", 40)
        .with_clip_length("theme_a.ogg", 30)
        .with_clip_length("theme_b.ogg", 30);
    let probe = backend.probe();
    let source = FileBankSource::new(&cli.banks_dir);
    log::info!("Reading banks from {}", source.dir().display());

    let mut manager = EventManager::new(config, Box::new(backend), Box::new(source));

    for bank in &cli.banks {
        if let BankLoad::Unavailable { reason } = manager.mount_bank(bank) {
            log::error!("Bank '{}' unavailable: {}", bank, reason);
        }
    }
    manager.log_bank_ref_counts();

    run_scene(&mut manager, &probe, cli.frames);

    for bank in &cli.banks {
        manager.unmount_bank(bank);
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ManagerConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let config = if is_json {
        ManagerConfig::from_json_str(&text)
    } else {
        ManagerConfig::from_yaml_str(&text)
    };
    config.with_context(|| format!("parsing {}", path.display()))
}

fn run_scene(manager: &mut EventManager, probe: &SimProbe, frames: u32) {
    let ship = TrackedAnchor::new(Position::new(0.0, 0.0, -10.0));
    let turret = TrackedAnchor::new(Position::new(4.0, 0.0, -6.0));
    let ship_ref: AnchorRef = ship.clone();
    let turret_ref: AnchorRef = turret.clone();

    manager.play_music("MUSIC:THEME_A");
    manager.queue_music("MUSIC:THEME_B");

    let mut played = 0;
    let mut silent = 0;
    let mut count = |handle: Option<_>| match handle {
        Some(_) => played += 1,
        None => silent += 1,
    };

    count(manager.play("LASER:SHOT", Some(&ship_ref)));
    // No UNKNOWN:SHOT anywhere; generalizes to SHOT
    count(manager.play("UNKNOWN:SHOT", Some(&turret_ref)));
    count(manager.play("LOOP", Some(&ship_ref)));
    count(manager.play("DIE_RELEASE_LOOP", Some(&turret_ref)));
    count(manager.play("STATIC_SHOT", Some(&turret_ref)));
    count(manager.play("NOT_IN_ANY_BANK", None));

    let mut reaped = 0;
    for frame in 0..frames {
        ship.set_position(Position::new(0.0, 0.0, -10.0 + frame as f32 * 0.1));

        if frame == frames / 3 {
            log::info!("Frame {}: turret destroyed", frame);
            turret.despawn();
        }
        if frame == frames / 2 {
            log::info!("Frame {}: ship despawned", frame);
            ship.despawn();
        }
        if frame % 15 == 0 {
            count(manager.play("LASER:SHOT", Some(&ship_ref)));
        }

        probe.advance(FRAMES_PER_TICK);
        let report = manager.tick();
        reaped += report.reaped;
        if report.music_advanced {
            if let Some(track) = manager.music().current() {
                log::info!("Frame {}: music now '{}'", frame, track.event_name);
            }
        }
    }

    println!("Requests played:    {}", played);
    println!("Requests silent:    {}", silent);
    println!("Voices created:     {}", probe.created_count());
    println!("Voices reaped:      {}", reaped);
    println!("Voices still live:  {}", manager.active_voice_count());
    match manager.music().current() {
        Some(track) => println!("Music:              {}", track.event_name),
        None => println!("Music:              (none)"),
    }
}
