//! saavy-mono - play the mono synth from the computer keyboard
//!
//! Run with: cargo run --bin saavy-mono -- --log-file saavy.log

mod app;
mod keymap;
mod ui;

use std::{
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use saavy_mono::{
    io::output::{output_device_names, AudioOutput},
    EngineConfig,
};
use ratatui::DefaultTerminal;
use tracing_subscriber::EnvFilter;

use app::{App, Device};

#[derive(Parser, Debug)]
#[command(name = "saavy-mono", version, about = "Monophonic saw -> lowpass -> ADSR synth")]
struct Args {
    /// Engine config (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device, matched as a case-insensitive substring
    #[arg(short, long)]
    device: Option<String>,

    /// Write logs here (the terminal belongs to the UI). Filter with RUST_LOG.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Auto-release after this many ms when the terminal cannot report key releases
    #[arg(long, default_value_t = 250)]
    gate_ms: u64,

    /// Octave of the bottom keyboard row (3 puts `z` on C3)
    #[arg(long, default_value_t = 3)]
    octave: u8,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    if args.list_devices {
        for name in output_device_names().wrap_err("failed to enumerate output devices")? {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).wrap_err("failed to load config")?,
        None => EngineConfig::default(),
    };
    if args.device.is_some() {
        config.device = args.device.clone();
    }

    let (output, controller, telemetry) =
        AudioOutput::open(&config).wrap_err("failed to open audio output")?;
    let device = Device {
        name: output.device_name().to_string(),
        sample_rate: output.sample_rate(),
        channels: output.channels(),
    };

    let key_releases = supports_keyboard_enhancement().unwrap_or(false);
    tracing::info!(key_releases, octave = args.octave, "starting ui");

    let mut app = App::new(
        controller,
        telemetry,
        device,
        args.octave,
        Duration::from_millis(args.gate_ms),
        key_releases,
    );

    let mut terminal = ratatui::init();
    let res = run_ui(&mut terminal, &mut app, key_releases);
    ratatui::restore();

    // Let the release tail of all-notes-off play out before the stream drops.
    std::thread::sleep(Duration::from_secs_f32(app.release()));
    drop(output);
    res
}

/// Everything between `ratatui::init` and `ratatui::restore`. Errors come
/// back to the caller so the terminal is restored either way.
fn run_ui(terminal: &mut DefaultTerminal, app: &mut App, key_releases: bool) -> EyreResult<()> {
    if key_releases {
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let res = app.run(terminal);

    if key_releases {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    res
}

fn init_logging(path: &Path) -> EyreResult<()> {
    let file = std::fs::File::create(path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
