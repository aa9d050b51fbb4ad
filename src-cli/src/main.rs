//! Matrixviz - terminal LED matrix spectrum visualizer
//!
//! Draws the spectrum into the terminal, one character cell per LED.
//! Logs go to stderr; redirect them (`2>matrixviz.log`) to keep the
//! matrix clean.

mod keyboard;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossterm::terminal;
use matrixviz_core::{
    apply_preset, list_input_devices, AudioCapture, AudioSource, Engine, Settings,
    SyntheticSource, ThemeRegistry, VisualizerRegistry, PRESET_NAMES, VISUALIZER_NAMES,
};
use matrixviz_display::TerminalDisplay;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "matrixviz=info,matrixviz_core=info,matrixviz_dsp=info,matrixviz_render=info";

const DEMO_SAMPLE_RATE: f32 = 48_000.0;
const DEMO_TONES: [(f32, f32); 4] = [(82.0, 0.6), (440.0, 0.3), (1760.0, 0.15), (7040.0, 0.05)];

#[derive(Parser, Debug)]
#[command(name = "matrixviz", version, about = "Audio spectrum visualizer for LED matrix panels")]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Genre preset applied on top of the loaded settings
    #[arg(long)]
    preset: Option<String>,

    #[arg(long)]
    theme: Option<String>,

    /// bars, life or blank
    #[arg(long)]
    visualizer: Option<String>,

    /// Input device name (case-insensitive substring)
    #[arg(long)]
    device: Option<String>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Render generated tones instead of capturing audio
    #[arg(long)]
    demo: bool,

    #[arg(long)]
    list_themes: bool,

    #[arg(long)]
    list_devices: bool,

    #[arg(long)]
    list_presets: bool,

    /// Persist the effective settings before starting
    #[arg(long)]
    save: bool,
}

/// Raw mode for the lifetime of the guard
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable terminal raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("Failed to restore terminal mode: {}", e);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Stored settings with the preset and command-line overrides applied
fn effective_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(args.settings.as_deref());

    if let Some(name) = &args.preset {
        apply_preset(&mut settings, name)?;
    }
    if let Some(theme) = &args.theme {
        settings.color.theme = theme.clone();
    }
    if let Some(visualizer) = &args.visualizer {
        settings.render.visualizer = visualizer.clone();
    }
    if let Some(device) = &args.device {
        settings.audio.device = device.clone();
    }
    if let Some(width) = args.width {
        settings.render.width = width;
    }
    if let Some(height) = args.height {
        settings.render.height = height;
    }

    settings
        .validate()
        .map_err(|e| anyhow!("Invalid settings: {}", e))?;
    Ok(settings)
}

fn run(settings: Settings, args: &Args) -> Result<()> {
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut source: Box<dyn AudioSource> = if args.demo {
        info!("Demo mode: {} generated tones", DEMO_TONES.len());
        Box::new(SyntheticSource::new(DEMO_SAMPLE_RATE, DEMO_TONES.to_vec()))
    } else {
        let capture = AudioCapture::open(&settings.audio, event_tx.clone())
            .context("Failed to open audio input")?;
        info!(
            "Capturing from {} ({} channel(s))",
            capture.device_name(),
            capture.channels()
        );
        Box::new(capture)
    };

    let (width, height) = (settings.render.width, settings.render.height);
    let mut engine = Engine::new(
        settings,
        VisualizerRegistry::default(),
        source.sample_rate(),
        width,
        height,
    )
    .context("Failed to start visualizer")?;
    if let Some(path) = &args.settings {
        engine = engine.with_settings_path(path);
    }

    // Raw mode must outlive the display so the screen is restored first
    let _raw = RawMode::enable()?;
    let mut display =
        TerminalDisplay::open(width, height).context("Failed to open terminal display")?;

    let input = keyboard::spawn(command_tx, event_rx, Arc::clone(&shutdown))
        .context("Failed to start input thread")?;

    let result = engine.run(
        &mut display,
        source.as_mut(),
        &command_rx,
        &event_tx,
        &shutdown,
    );

    shutdown.store(true, Ordering::Relaxed);
    if input.join().is_err() {
        error!("Input thread panicked");
    }

    result.context("Visualizer stopped with an error")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    if args.list_themes {
        for name in ThemeRegistry::builtin().names() {
            println!("{}", name);
        }
        return Ok(());
    }
    if args.list_presets {
        for name in PRESET_NAMES {
            println!("{}", name);
        }
        return Ok(());
    }
    if args.list_devices {
        for name in list_input_devices().context("Failed to enumerate input devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = effective_settings(&args)?;
    if !VISUALIZER_NAMES.contains(&settings.render.visualizer.as_str()) {
        return Err(anyhow!(
            "Unknown visualizer '{}' (available: {})",
            settings.render.visualizer,
            VISUALIZER_NAMES.join(", ")
        ));
    }

    if args.save {
        let path = settings
            .save(args.settings.as_deref())
            .context("Failed to save settings")?;
        info!("Settings written to {}", path.display());
    }

    run(settings, &args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_settings() -> String {
        std::env::temp_dir()
            .join(format!("matrixviz-cli-test-{}", std::process::id()))
            .join("settings.json")
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "matrixviz",
            "--theme",
            "fire",
            "--width",
            "32",
            "--demo",
            "--list-themes",
        ])
        .unwrap();

        assert_eq!(args.theme.as_deref(), Some("fire"));
        assert_eq!(args.width, Some(32));
        assert!(args.demo);
        assert!(args.list_themes);
        assert!(!args.save);
    }

    #[test]
    fn test_overrides_applied() {
        let path = missing_settings();
        let args = Args::try_parse_from([
            "matrixviz",
            "--settings",
            path.as_str(),
            "--theme",
            "sunset",
            "--visualizer",
            "life",
            "--height",
            "16",
        ])
        .unwrap();

        let settings = effective_settings(&args).unwrap();
        assert_eq!(settings.color.theme, "sunset");
        assert_eq!(settings.render.visualizer, "life");
        assert_eq!(settings.render.height, 16);
        assert_eq!(settings.render.width, Settings::default().render.width);
    }

    #[test]
    fn test_preset_then_theme_override() {
        let path = missing_settings();
        let args = Args::try_parse_from([
            "matrixviz",
            "--settings",
            path.as_str(),
            "--preset",
            "edm",
            "--theme",
            "ocean",
        ])
        .unwrap();

        let settings = effective_settings(&args).unwrap();
        assert_eq!(settings.color.theme, "ocean");
        assert!(!settings.frequency.zoom_mode);
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let path = missing_settings();
        let args = Args::try_parse_from(["matrixviz", "--settings", path.as_str(), "--preset", "polka"])
            .unwrap();
        assert!(effective_settings(&args).is_err());
    }

    #[test]
    fn test_zero_width_rejected() {
        let path = missing_settings();
        let args = Args::try_parse_from(["matrixviz", "--settings", path.as_str(), "--width", "0"])
            .unwrap();
        assert!(effective_settings(&args).is_err());
    }
}
