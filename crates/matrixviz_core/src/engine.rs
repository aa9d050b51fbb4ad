//! Engine (Orchestrator)
//!
//! Owns the settings, the active visualizer and the spectrum pipelines.
//! `run` is the render loop: drain commands, render the newest audio block,
//! present, sleep. Every way out of the loop leaves the display blank.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use matrixviz_display::{Canvas, MatrixDisplay};
use matrixviz_render::{LayerFrame, LayerStack, LayerState, RenderError, ThemeRegistry};
use tracing::{debug, error, info, warn};

use crate::audio::AudioSource;
use crate::config::Settings;
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::pipeline::{LayerPipelines, SpectrumPipeline};
use crate::visualizer::{Visualizer, VisualizerRegistry};

/// Energy boost factor applied per boost up/down command
pub const BOOST_STEP: f32 = 1.25;

/// Wait between polls when no new audio block is ready
const IDLE_POLL: Duration = Duration::from_millis(1);

fn flip(flag: &mut bool) -> bool {
    *flag = !*flag;
    *flag
}

fn build_layers(settings: &Settings, themes: &ThemeRegistry) -> EngineResult<LayerStack> {
    let layers = settings
        .layers
        .iter()
        .map(|layer| {
            let theme = themes.create(&layer.theme, settings.color.brightness)?;
            Ok(LayerState {
                name: layer.name.clone(),
                theme,
                bars: layer.bars,
                gradient: layer.gradient,
                overflow: layer.overflow,
                peaks: layer.peaks,
                visible: layer.visible,
                energy_boost: layer.energy_boost,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;
    Ok(LayerStack::new(layers))
}

pub struct Engine {
    settings: Settings,
    registry: VisualizerRegistry,
    visualizer: Visualizer,
    pipeline: SpectrumPipeline,
    layer_pipelines: LayerPipelines,
    layers: LayerStack,
    sample_rate: f32,
    width: usize,
    height: usize,
    /// Save target; `None` uses the platform default
    settings_path: Option<PathBuf>,
}

impl Engine {
    /// Validate `settings` and build the configured visualizer for a
    /// `width` x `height` matrix fed at `sample_rate`
    pub fn new(
        settings: Settings,
        registry: VisualizerRegistry,
        sample_rate: f32,
        width: usize,
        height: usize,
    ) -> EngineResult<Self> {
        settings.validate().map_err(EngineError::InvalidSettings)?;
        if width == 0 || height == 0 {
            return Err(matrixviz_display::DisplayError::InvalidDimensions { width, height }.into());
        }

        let visualizer = registry.create(&settings.render.visualizer, &settings, width, height)?;
        let pipeline = SpectrumPipeline::from_settings(&settings, sample_rate, width)?;
        let layer_pipelines = LayerPipelines::from_settings(&settings, sample_rate, width)?;
        let layers = build_layers(&settings, registry.themes())?;

        let (lo, hi) = settings.frequency.active_range();
        info!(
            "Engine ready: {} at {}x{}, {} bars over {:.0}-{:.0} Hz, {} layer(s)",
            visualizer.name(),
            width,
            height,
            pipeline.bins().len(),
            lo,
            hi,
            layers.len()
        );

        Ok(Self {
            settings,
            registry,
            visualizer,
            pipeline,
            layer_pipelines,
            layers,
            sample_rate,
            width,
            height,
            settings_path: None,
        })
    }

    /// Save settings to `path` instead of the platform default
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn pipeline(&self) -> &SpectrumPipeline {
        &self.pipeline
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Apply one command. Failures come back as `Event::Error`.
    pub fn apply(&mut self, command: Command) -> Option<Event> {
        debug!("Applying {:?}", command);
        match self.try_apply(command) {
            Ok(event) => event,
            Err(e) => {
                warn!("Command {:?} failed: {}", command, e);
                Some(Event::error(e))
            }
        }
    }

    fn try_apply(&mut self, command: Command) -> EngineResult<Option<Event>> {
        let event = match command {
            Command::NextTheme => self.cycle_theme(1)?,
            Command::PrevTheme => self.cycle_theme(-1)?,

            Command::ToggleGradient => Event::mode("gradient", flip(&mut self.settings.render.gradient)),
            Command::ToggleOverflow => Event::mode("overflow", flip(&mut self.settings.overflow.enabled)),
            Command::ToggleBars => Event::mode("bars", flip(&mut self.settings.render.bars)),
            Command::ToggleFull => Event::mode("full", flip(&mut self.settings.render.full)),
            Command::ToggleDebug => Event::mode("debug", flip(&mut self.settings.render.debug)),
            Command::ToggleShadow => Event::mode("shadow", flip(&mut self.settings.shadow.enabled)),
            Command::TogglePeaks => Event::mode("peaks", flip(&mut self.settings.peak.enabled)),
            Command::ToggleLayers => Event::mode("multi_layer", flip(&mut self.settings.render.multi_layer)),

            Command::CyclePeakColor => {
                let peak = &mut self.settings.peak;
                peak.color_mode = peak.color_mode.next();
                Event::PeakColorChanged {
                    mode: peak.color_mode.name().to_string(),
                }
            }

            Command::NextZoom => self.cycle_zoom(1)?,
            Command::PrevZoom => self.cycle_zoom(-1)?,

            Command::SelectLayer(index) => {
                self.layers.select(index)?;
                self.layer_event()?
            }
            Command::ToggleLayerVisible => {
                self.layers.toggle_visible(self.layers.selected())?;
                self.layer_event()?
            }
            Command::LayerForward => {
                self.layers.bring_forward(self.layers.selected())?;
                self.layer_event()?
            }
            Command::LayerBackward => {
                self.layers.send_backward(self.layers.selected())?;
                self.layer_event()?
            }
            Command::LayerBoostUp => {
                self.layers.scale_boost(self.layers.selected(), BOOST_STEP)?;
                self.layer_event()?
            }
            Command::LayerBoostDown => {
                self.layers.scale_boost(self.layers.selected(), 1.0 / BOOST_STEP)?;
                self.layer_event()?
            }

            Command::ResetScaling => {
                self.pipeline.reset_scaling();
                self.layer_pipelines.reset_scaling();
                info!("Scaling history reset");
                Event::ScalingReset
            }

            Command::SaveSettings => {
                let path = self.save_settings()?;
                Event::SettingsSaved {
                    path: path.display().to_string(),
                }
            }

            Command::Quit => return Ok(None),
        };

        self.sync_render_options();
        Ok(Some(event))
    }

    fn sync_render_options(&mut self) {
        let options = self.settings.render_options();
        if let Some(renderer) = self.visualizer.as_bars_mut() {
            *renderer.options_mut() = options;
        }
    }

    fn cycle_theme(&mut self, step: isize) -> EngineResult<Event> {
        let themes = self.registry.themes();
        let name = themes
            .cycle(&self.settings.color.theme, step)
            .ok_or(RenderError::ThemeNotSet)?;
        let theme = themes.create(name, self.settings.color.brightness)?;
        if let Some(renderer) = self.visualizer.as_bars_mut() {
            renderer.set_theme(theme);
        }
        self.settings.color.theme = name.to_string();
        info!("Theme changed to '{}'", name);
        Ok(Event::ThemeChanged {
            name: name.to_string(),
        })
    }

    fn cycle_zoom(&mut self, step: isize) -> EngineResult<Event> {
        let (min_freq, max_freq) = self
            .settings
            .frequency
            .cycle_zoom(step)
            .ok_or_else(|| EngineError::InvalidSettings("no zoom presets configured".to_string()))?;
        let binner = self.settings.binner_config(self.sample_rate, self.width);
        self.pipeline.rebuild_bins(&binner)?;
        Ok(Event::ZoomChanged { min_freq, max_freq })
    }

    fn layer_event(&self) -> EngineResult<Event> {
        let index = self.layers.selected();
        let count = self.layers.len();
        let layer = self
            .layers
            .layer(index)
            .ok_or(RenderError::LayerOutOfRange { index, count })?;
        Ok(Event::LayerChanged {
            index,
            name: layer.name.clone(),
            visible: layer.visible,
            z_index: self.layers.z_index(index).unwrap_or(index),
            energy_boost: layer.energy_boost,
        })
    }

    /// Copy live layer state back into the settings and write them out
    pub fn save_settings(&mut self) -> EngineResult<PathBuf> {
        for (saved, live) in self.settings.layers.iter_mut().zip(self.layers.layers()) {
            saved.visible = live.visible;
            saved.energy_boost = live.energy_boost;
        }
        self.settings.render.visualizer = self.visualizer.name().to_string();
        self.settings.save(self.settings_path.as_deref())
    }

    /// Draw one frame from `block` onto `canvas`
    pub fn render_frame<C: Canvas + ?Sized>(&mut self, canvas: &mut C, block: &[f32]) -> EngineResult<()> {
        let Self {
            visualizer,
            pipeline,
            layer_pipelines,
            layers,
            ..
        } = self;

        match visualizer {
            Visualizer::Bars(renderer) => {
                if renderer.options().multi_layer && !layer_pipelines.is_empty() {
                    layer_pipelines.process_all(block)?;
                    let frames: Vec<LayerFrame<'_>> = layer_pipelines
                        .iter()
                        .map(|p| LayerFrame {
                            bars: p.smoothed(),
                            peaks: p.peaks(),
                        })
                        .collect();
                    renderer.draw_layers(canvas, layers, &frames)?;
                } else {
                    let frame = pipeline.process(block)?;
                    renderer.draw(canvas, frame.smoothed, Some(frame.peaks))?;
                }
            }
            other => other.draw_idle(canvas),
        }
        Ok(())
    }

    /// Render loop. Returns when `Quit` arrives or `shutdown` is set; the
    /// display is cleared and presented on every exit path.
    pub fn run<D, S>(
        &mut self,
        display: &mut D,
        source: &mut S,
        commands: &Receiver<Command>,
        events: &Sender<Event>,
        shutdown: &AtomicBool,
    ) -> EngineResult<()>
    where
        D: MatrixDisplay + ?Sized,
        S: AudioSource + ?Sized,
    {
        info!(
            "Render loop started ({} visualizer, {:.1} ms frames)",
            self.visualizer.name(),
            self.settings.audio.frame_interval * 1000.0
        );

        let result = self.run_loop(display, source, commands, events, shutdown);

        display.clear();
        let cleared = display.present();

        match &result {
            Ok(()) => info!("Render loop stopped"),
            Err(e) => {
                error!("Render loop failed: {}", e);
                let _ = events.try_send(Event::error(e));
            }
        }
        result?;
        cleared?;
        Ok(())
    }

    fn run_loop<D, S>(
        &mut self,
        display: &mut D,
        source: &mut S,
        commands: &Receiver<Command>,
        events: &Sender<Event>,
        shutdown: &AtomicBool,
    ) -> EngineResult<()>
    where
        D: MatrixDisplay + ?Sized,
        S: AudioSource + ?Sized,
    {
        let interval = Duration::from_secs_f32(self.settings.audio.frame_interval);
        let mut block = vec![0.0; self.settings.audio.block_size];

        while !shutdown.load(Ordering::Relaxed) {
            loop {
                match commands.try_recv() {
                    Ok(Command::Quit) => {
                        info!("Quit requested");
                        return Ok(());
                    }
                    Ok(command) => {
                        if let Some(event) = self.apply(command) {
                            let _ = events.try_send(event);
                        }
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if self.visualizer.needs_audio() {
                if !source.read_latest(&mut block) {
                    thread::sleep(IDLE_POLL);
                    continue;
                }
                self.render_frame(display, &block)?;
            } else {
                self.visualizer.draw_idle(display);
            }

            display.present()?;
            thread::sleep(interval);
        }

        info!("Shutdown requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SyntheticSource;
    use matrixviz_display::FrameBuffer;

    const RATE: f32 = 48_000.0;

    fn engine_with(settings: Settings) -> Engine {
        Engine::new(settings, VisualizerRegistry::default(), RATE, 16, 8).unwrap()
    }

    fn engine() -> Engine {
        engine_with(Settings::default())
    }

    fn bars_options(engine: &Engine) -> matrixviz_render::RenderOptions {
        engine.visualizer().as_bars().unwrap().options().clone()
    }

    fn feed(engine: &mut Engine, fb: &mut FrameBuffer, frames: usize) {
        let mut source = SyntheticSource::new(RATE, vec![(300.0, 0.6), (2000.0, 0.4)]);
        let mut block = vec![0.0; 512];
        for _ in 0..frames {
            source.read_latest(&mut block);
            engine.render_frame(fb, &block).unwrap();
        }
    }

    #[test]
    fn test_new_validates() {
        let mut settings = Settings::default();
        settings.smoothing.fall = 2.0;
        let result = Engine::new(settings, VisualizerRegistry::default(), RATE, 16, 8);
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));

        let result = Engine::new(Settings::default(), VisualizerRegistry::default(), RATE, 0, 8);
        assert!(matches!(result, Err(EngineError::Display(_))));
    }

    #[test]
    fn test_new_unknown_visualizer() {
        let mut settings = Settings::default();
        settings.render.visualizer = "plasma".to_string();
        let result = Engine::new(settings, VisualizerRegistry::default(), RATE, 16, 8);
        assert!(matches!(result, Err(EngineError::UnknownVisualizer { .. })));
    }

    #[test]
    fn test_render_frame_draws_bars() {
        let mut e = engine();
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 40);
        assert!(fb.lit_pixels() > 0);
        assert_eq!(e.pipeline().bins().len(), 16);
    }

    #[test]
    fn test_toggle_updates_renderer_and_settings() {
        let mut e = engine();
        assert!(bars_options(&e).overflow);

        let event = e.apply(Command::ToggleOverflow);
        assert_eq!(event, Some(Event::mode("overflow", false)));
        assert!(!bars_options(&e).overflow);
        assert!(!e.settings().overflow.enabled);

        assert_eq!(e.apply(Command::TogglePeaks), Some(Event::mode("peaks", true)));
        assert!(bars_options(&e).peaks);
        assert_eq!(e.apply(Command::ToggleShadow), Some(Event::mode("shadow", true)));
        assert!(bars_options(&e).shadow);
    }

    #[test]
    fn test_theme_cycle() {
        let mut e = engine();
        assert_eq!(
            e.apply(Command::NextTheme),
            Some(Event::ThemeChanged {
                name: "forest".to_string()
            })
        );
        let renderer = e.visualizer().as_bars().unwrap();
        assert_eq!(renderer.theme().unwrap().name(), "forest");

        e.apply(Command::PrevTheme);
        e.apply(Command::PrevTheme);
        assert_eq!(e.settings().color.theme, "fire");
    }

    #[test]
    fn test_peak_color_cycle() {
        let mut e = engine();
        assert_eq!(
            e.apply(Command::CyclePeakColor),
            Some(Event::PeakColorChanged {
                mode: "peak".to_string()
            })
        );
        assert_eq!(
            bars_options(&e).peak_color,
            matrixviz_render::PeakColorMode::Peak
        );
    }

    #[test]
    fn test_zoom_rebuilds_bins() {
        let mut e = engine();
        assert_eq!(
            e.apply(Command::NextZoom),
            Some(Event::ZoomChanged {
                min_freq: 40.0,
                max_freq: 2000.0
            })
        );
        assert!((e.pipeline().bins().edges()[0] - 40.0).abs() < 1e-3);

        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 5);
    }

    #[test]
    fn test_layer_commands() {
        let mut e = engine();
        match e.apply(Command::SelectLayer(1)) {
            Some(Event::LayerChanged { index, name, z_index, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "mids");
                assert_eq!(z_index, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }

        match e.apply(Command::LayerForward) {
            Some(Event::LayerChanged { z_index, .. }) => assert_eq!(z_index, 2),
            other => panic!("unexpected event {:?}", other),
        }

        match e.apply(Command::LayerBoostUp) {
            Some(Event::LayerChanged { energy_boost, .. }) => assert_eq!(energy_boost, BOOST_STEP),
            other => panic!("unexpected event {:?}", other),
        }

        match e.apply(Command::ToggleLayerVisible) {
            Some(Event::LayerChanged { visible, .. }) => assert!(!visible),
            other => panic!("unexpected event {:?}", other),
        }

        assert!(matches!(e.apply(Command::SelectLayer(7)), Some(Event::Error { .. })));
        assert_eq!(e.layers().selected(), 1);
    }

    #[test]
    fn test_multi_layer_render() {
        let mut e = engine();
        e.apply(Command::ToggleLayers);
        assert!(bars_options(&e).multi_layer);

        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 40);
        assert!(fb.lit_pixels() > 0);
    }

    #[test]
    fn test_reset_scaling() {
        let mut e = engine();
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 40);
        assert!(e.pipeline().current_scale() > e.settings().scaling.min_scale);

        assert_eq!(e.apply(Command::ResetScaling), Some(Event::ScalingReset));
        assert_eq!(e.pipeline().current_scale(), e.settings().scaling.min_scale);
    }

    #[test]
    fn test_save_settings_command() {
        let dir = std::env::temp_dir().join(format!("matrixviz-engine-{}", std::process::id()));
        let path = dir.join("settings.json");
        let mut e = engine().with_settings_path(&path);

        e.apply(Command::NextTheme);
        e.apply(Command::SelectLayer(2));
        e.apply(Command::ToggleLayerVisible);
        match e.apply(Command::SaveSettings) {
            Some(Event::SettingsSaved { path: saved }) => assert!(saved.ends_with("settings.json")),
            other => panic!("unexpected event {:?}", other),
        }

        let loaded = Settings::load(Some(path.as_path()));
        assert_eq!(loaded.color.theme, "forest");
        assert!(!loaded.layers[2].visible);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_quit_clears_display() {
        let mut e = engine();
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 20);
        fb.present().unwrap();

        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (evt_tx, evt_rx) = crossbeam_channel::unbounded();
        cmd_tx.send(Command::ToggleGradient).unwrap();
        cmd_tx.send(Command::Quit).unwrap();

        let mut source = SyntheticSource::silent(RATE);
        let shutdown = AtomicBool::new(false);
        e.run(&mut fb, &mut source, &cmd_rx, &evt_tx, &shutdown).unwrap();

        assert_eq!(evt_rx.try_recv().unwrap(), Event::mode("gradient", false));
        for y in 0..8 {
            for x in 0..16 {
                assert_eq!(fb.presented_pixel(x, y), Some(matrixviz_display::Rgb::BLACK));
            }
        }
    }

    #[test]
    fn test_shutdown_flag_stops_loop() {
        let mut e = engine();
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        let (_cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (evt_tx, _evt_rx) = crossbeam_channel::unbounded();
        let mut source = SyntheticSource::silent(RATE);
        let shutdown = AtomicBool::new(true);

        e.run(&mut fb, &mut source, &cmd_rx, &evt_tx, &shutdown).unwrap();
        assert_eq!(fb.frames_presented(), 1);
    }

    #[test]
    fn test_run_renders_until_quit() {
        let mut e = engine();
        let mut fb = FrameBuffer::new(16, 8).unwrap();
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (evt_tx, _evt_rx) = crossbeam_channel::unbounded();
        let mut source = SyntheticSource::new(RATE, vec![(500.0, 0.5)]);
        let shutdown = AtomicBool::new(false);

        let quitter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            cmd_tx.send(Command::Quit).unwrap();
        });
        e.run(&mut fb, &mut source, &cmd_rx, &evt_tx, &shutdown).unwrap();
        quitter.join().unwrap();

        assert!(fb.frames_presented() > 2);
        assert_eq!(fb.lit_pixels(), 0);
    }

    #[test]
    fn test_life_runs_without_audio() {
        let mut settings = Settings::default();
        settings.render.visualizer = "life".to_string();
        let mut e = engine_with(settings);
        assert_eq!(e.visualizer().name(), "life");

        let mut fb = FrameBuffer::new(16, 8).unwrap();
        feed(&mut e, &mut fb, 1);
        assert!(fb.lit_pixels() > 0);
        assert!(matches!(
            e.apply(Command::ToggleBars),
            Some(Event::ModeChanged { .. })
        ));
    }
}
