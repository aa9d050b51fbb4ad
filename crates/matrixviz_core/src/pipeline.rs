//! Spectrum Pipeline
//!
//! Binner, extractor and scaler wired together: one block of samples in,
//! one scaled frame of bar heights out.

use matrixviz_dsp::{
    AdaptiveScaler, BinnerConfig, FrequencyBinSet, ScaledFrame, ScalerConfig, SpectralExtractor,
};
use tracing::info;

use crate::config::Settings;
use crate::error::{EngineError, EngineResult};

/// Bins, extractor and scaling state for one frequency range
#[derive(Debug)]
pub struct SpectrumPipeline {
    bins: FrequencyBinSet,
    extractor: SpectralExtractor,
    scaler: AdaptiveScaler,
    raw: Vec<f32>,
}

impl SpectrumPipeline {
    pub fn new(
        binner: &BinnerConfig,
        block_size: usize,
        noise_floor: f32,
        scaler: ScalerConfig,
    ) -> EngineResult<Self> {
        scaler.validate().map_err(EngineError::InvalidSettings)?;
        let bins = FrequencyBinSet::build(binner)?;
        let extractor = SpectralExtractor::new(block_size, binner.fft_size, noise_floor)?;
        let scaler = AdaptiveScaler::new(scaler, bins.len());
        let raw = vec![0.0; bins.len()];
        Ok(Self {
            bins,
            extractor,
            scaler,
            raw,
        })
    }

    /// Main spectrum pipeline described by `settings`
    pub fn from_settings(settings: &Settings, sample_rate: f32, bin_count: usize) -> EngineResult<Self> {
        Self::new(
            &settings.binner_config(sample_rate, bin_count),
            settings.audio.block_size,
            settings.sensitivity.noise_floor,
            settings.scaler_config(),
        )
    }

    /// Extract and scale one block
    pub fn process(&mut self, block: &[f32]) -> EngineResult<ScaledFrame<'_>> {
        self.extractor.extract(block, &self.bins, &mut self.raw)?;
        Ok(self.scaler.process(&self.raw))
    }

    /// Replace the bin layout (zoom change). Scaling state resets when the
    /// bin count changes.
    pub fn rebuild_bins(&mut self, binner: &BinnerConfig) -> EngineResult<()> {
        let bins = FrequencyBinSet::build(binner)?;
        info!(
            "Rebuilt {} bins over {:.0}-{:.0} Hz ({} empty)",
            bins.len(),
            binner.min_freq,
            binner.max_freq,
            bins.empty_count()
        );
        self.raw.resize(bins.len(), 0.0);
        self.bins = bins;
        Ok(())
    }

    pub fn bins(&self) -> &FrequencyBinSet {
        &self.bins
    }

    /// Raw (unscaled) bar values of the last processed block
    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    /// Smoothed bars of the last processed block
    pub fn smoothed(&self) -> &[f32] {
        self.scaler.state().smoothed()
    }

    pub fn peaks(&self) -> &[f32] {
        self.scaler.state().peaks()
    }

    pub fn current_scale(&self) -> f32 {
        self.scaler.current_scale()
    }

    pub fn reset_scaling(&mut self) {
        self.scaler.reset();
    }

    pub fn set_noise_floor(&mut self, noise_floor: f32) {
        self.extractor.set_noise_floor(noise_floor);
    }

    pub fn set_scaler_config(&mut self, config: ScalerConfig) {
        self.scaler.set_config(config);
    }
}

/// One pipeline per configured layer
#[derive(Debug, Default)]
pub struct LayerPipelines {
    pipelines: Vec<SpectrumPipeline>,
}

impl LayerPipelines {
    pub fn from_settings(settings: &Settings, sample_rate: f32, bin_count: usize) -> EngineResult<Self> {
        let pipelines = settings
            .layers
            .iter()
            .map(|layer| {
                SpectrumPipeline::new(
                    &settings.layer_binner_config(layer, sample_rate, bin_count),
                    settings.audio.block_size,
                    settings.sensitivity.noise_floor,
                    settings.scaler_config(),
                )
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self { pipelines })
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SpectrumPipeline> {
        self.pipelines.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpectrumPipeline> {
        self.pipelines.iter()
    }

    /// Run every layer on the same block
    pub fn process_all(&mut self, block: &[f32]) -> EngineResult<()> {
        for pipeline in &mut self.pipelines {
            pipeline.process(block)?;
        }
        Ok(())
    }

    pub fn reset_scaling(&mut self) {
        self.pipelines.iter_mut().for_each(SpectrumPipeline::reset_scaling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioSource, SyntheticSource};

    const RATE: f32 = 48_000.0;

    fn pipeline(settings: &Settings) -> SpectrumPipeline {
        SpectrumPipeline::from_settings(settings, RATE, 32).unwrap()
    }

    fn block(source: &mut SyntheticSource, size: usize) -> Vec<f32> {
        let mut out = vec![0.0; size];
        source.read_latest(&mut out);
        out
    }

    #[test]
    fn test_sine_lights_its_bin() {
        let settings = Settings::default();
        let mut p = pipeline(&settings);
        let mut source = SyntheticSource::new(RATE, vec![(1000.0, 0.8)]);

        for _ in 0..50 {
            let samples = block(&mut source, 512);
            p.process(&samples).unwrap();
        }

        let loudest = p
            .raw()
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        let bin = p
            .bins()
            .bin_of_index((1000.0 * 8192.0 / RATE).round() as usize)
            .unwrap();
        assert!(loudest.0.abs_diff(bin) <= 1, "loudest {} expected {}", loudest.0, bin);
        assert!(p.smoothed().iter().any(|&v| v > 0.1));
    }

    #[test]
    fn test_silence_stays_dark() {
        let settings = Settings::default();
        let mut p = pipeline(&settings);
        let mut source = SyntheticSource::silent(RATE);
        for _ in 0..20 {
            let samples = block(&mut source, 512);
            let frame = p.process(&samples).unwrap();
            assert!(frame.smoothed.iter().all(|&v| v == 0.0));
        }
        assert_eq!(p.current_scale(), settings.scaling.min_scale);
    }

    fn narrow_bins(sample_rate: f32, low_weight: f32, high_weight: f32) -> BinnerConfig {
        BinnerConfig {
            sample_rate,
            fft_size: 4096,
            min_freq: 100.0,
            max_freq: 8000.0,
            bin_count: 8,
            low_weight,
            high_weight,
            ..BinnerConfig::default()
        }
    }

    #[test]
    fn test_silence_for_full_window_fades_to_zero() {
        let scaler = ScalerConfig {
            window_seconds: 0.05,
            frame_interval: 0.005,
            silence_threshold: 0.01,
            ..ScalerConfig::default()
        };
        let window = scaler.window_len();
        assert_eq!(window, 10);
        let min_scale = scaler.min_scale;

        let mut p = SpectrumPipeline::new(&narrow_bins(48_000.0, 0.55, 10.0), 1024, 0.3, scaler)
            .unwrap();
        let mut source = SyntheticSource::silent(48_000.0);
        for _ in 0..window {
            let samples = block(&mut source, 1024);
            let frame = p.process(&samples).unwrap();
            assert!(frame.silence_faded);
            assert_eq!(frame.smoothed.len(), 8);
            assert!(frame.smoothed.iter().all(|v| v.abs() < 1e-6), "{:?}", frame.smoothed);
        }
        assert_eq!(p.current_scale(), min_scale);
    }

    #[test]
    fn test_1khz_sine_at_44k1_lands_in_its_bin() {
        let rate = 44_100.0;
        let mut p = SpectrumPipeline::new(&narrow_bins(rate, 1.0, 1.0), 1024, 0.0, ScalerConfig::default())
            .unwrap();
        let mut source = SyntheticSource::new(rate, vec![(1000.0, 0.8)]);
        let samples = block(&mut source, 1024);
        p.process(&samples).unwrap();

        let edges = p.bins().edges();
        let target = (0..p.bins().len())
            .find(|&i| edges[i] <= 1000.0 && 1000.0 < edges[i + 1])
            .unwrap();
        let raw = p.raw();
        let (loudest, &max) = raw
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();

        assert_eq!(loudest, target);
        for neighbour in [target - 1, target + 1] {
            assert!(
                raw[neighbour] < max * 0.1,
                "bin {} = {} (peak {})",
                neighbour,
                raw[neighbour],
                max
            );
        }
    }

    #[test]
    fn test_silence_threshold_fades() {
        let mut settings = Settings::default();
        settings.sensitivity.silence_threshold = 1e6;
        let mut p = pipeline(&settings);
        let mut source = SyntheticSource::new(RATE, vec![(440.0, 0.01)]);
        let samples = block(&mut source, 512);
        let frame = p.process(&samples).unwrap();
        assert!(frame.silence_faded);
    }

    #[test]
    fn test_wrong_block_size_rejected() {
        let mut p = pipeline(&Settings::default());
        assert!(p.process(&[0.0; 100]).is_err());
    }

    #[test]
    fn test_rebuild_bins_changes_range() {
        let mut settings = Settings::default();
        let mut p = pipeline(&settings);
        let before = p.bins().edges().to_vec();

        settings.frequency.cycle_zoom(1);
        p.rebuild_bins(&settings.binner_config(RATE, 32)).unwrap();
        assert_ne!(p.bins().edges(), before.as_slice());
        assert!((p.bins().edges()[0] - 40.0).abs() < 1e-3);
        assert_eq!(p.bins().len(), 32);

        let frame = p.process(&[0.0; 512]).unwrap();
        assert_eq!(frame.smoothed.len(), 32);
    }

    #[test]
    fn test_layer_pipelines_follow_layers() {
        let settings = Settings::default();
        let mut layers = LayerPipelines::from_settings(&settings, RATE, 16).unwrap();
        assert_eq!(layers.len(), 3);

        let mut source = SyntheticSource::new(RATE, vec![(100.0, 0.9)]);
        for _ in 0..30 {
            let samples = block(&mut source, 512);
            layers.process_all(&samples).unwrap();
        }

        let energy: Vec<f32> = layers.iter().map(|p| p.raw().iter().sum()).collect();
        // A 100 Hz tone lands in the bass layer only
        assert!(energy[0] > energy[1] && energy[0] > energy[2], "{:?}", energy);
        for p in layers.iter() {
            assert_eq!(p.smoothed().len(), 16);
            assert_eq!(p.peaks().len(), 16);
        }
    }
}
