//! Audio Capture
//!
//! A cpal input stream feeds one channel of the device into fixed-size
//! blocks. Completed blocks are published to a [`LatestBlock`] slot: the
//! render loop always sees the newest block and older ones are simply
//! overwritten, so a slow frame never builds up a backlog.
//!
//! ```text
//! cpal callback ──interleaved──▶ BlockAssembler ──block──▶ LatestBlock ──▶ render loop
//! ```

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;

/// Something the render loop can pull sample blocks from
pub trait AudioSource {
    fn sample_rate(&self) -> f32;

    /// Copy the newest unread block into `out`. Returns false when no new
    /// block has arrived since the last call.
    fn read_latest(&mut self, out: &mut [f32]) -> bool;
}

/// Single-slot mailbox holding the most recent block
#[derive(Debug)]
pub struct LatestBlock {
    block: Mutex<Vec<f32>>,
    fresh: AtomicBool,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl LatestBlock {
    pub fn new(block_size: usize) -> Self {
        Self {
            block: Mutex::new(vec![0.0; block_size]),
            fresh: AtomicBool::new(false),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block.lock().len()
    }

    /// Replace the stored block. Never blocks: if the reader holds the slot
    /// the block is dropped.
    pub fn publish(&self, samples: &[f32]) {
        match self.block.try_lock() {
            Some(mut slot) => {
                let n = slot.len().min(samples.len());
                slot[..n].copy_from_slice(&samples[..n]);
                drop(slot);
                self.fresh.store(true, Ordering::Release);
                self.published.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Copy the stored block into `out` if it has not been read yet
    pub fn take(&self, out: &mut [f32]) -> bool {
        if !self.fresh.swap(false, Ordering::Acquire) {
            return false;
        }
        let slot = self.block.lock();
        let n = slot.len().min(out.len());
        out[..n].copy_from_slice(&slot[..n]);
        true
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Gathers one channel of interleaved frames into fixed-size blocks
struct BlockAssembler {
    staging: Vec<f32>,
    filled: usize,
    channel: usize,
    channels: usize,
    slot: Arc<LatestBlock>,
}

impl BlockAssembler {
    fn new(block_size: usize, channel: usize, channels: usize, slot: Arc<LatestBlock>) -> Self {
        Self {
            staging: vec![0.0; block_size],
            filled: 0,
            channel,
            channels: channels.max(1),
            slot,
        }
    }

    // Runs on the audio thread: no allocation
    fn push_interleaved<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        for frame in data.chunks(self.channels) {
            if let Some(&sample) = frame.get(self.channel) {
                self.staging[self.filled] = sample.to_sample::<f32>();
                self.filled += 1;
                if self.filled == self.staging.len() {
                    self.slot.publish(&self.staging);
                    self.filled = 0;
                }
            }
        }
    }
}

/// Names of every input device on the default host
pub fn list_input_devices() -> EngineResult<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| EngineError::ConfigError(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Find an input device by case-insensitive substring; "default" picks the
/// host default
fn find_input_device(name: &str) -> EngineResult<cpal::Device> {
    let host = cpal::default_host();

    if name.trim().is_empty() || name.eq_ignore_ascii_case("default") {
        return host.default_input_device().ok_or(EngineError::NoDevicesFound);
    }

    let wanted = name.to_lowercase();
    let mut available = Vec::new();
    let devices = host
        .input_devices()
        .map_err(|e| EngineError::ConfigError(e.to_string()))?;
    for device in devices {
        if let Ok(device_name) = device.name() {
            if device_name.to_lowercase().contains(&wanted) {
                return Ok(device);
            }
            available.push(device_name);
        }
    }

    if available.is_empty() {
        return Err(EngineError::NoDevicesFound);
    }
    Err(EngineError::DeviceNotFound {
        name: name.to_string(),
        available: available.join(", "),
    })
}

/// A running capture stream
pub struct AudioCapture {
    stream: Stream,
    slot: Arc<LatestBlock>,
    sample_rate: f32,
    device_name: String,
    channels: u16,
}

impl AudioCapture {
    /// Open and start capturing from the configured device
    pub fn open(settings: &AudioSettings, events: Sender<Event>) -> EngineResult<Self> {
        let device = find_input_device(&settings.device)?;
        let device_name = device.name().unwrap_or_else(|_| settings.device.clone());

        let supported = device
            .default_input_config()
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels;
        let sample_rate = config.sample_rate.0 as f32;

        if settings.channel >= channels as usize {
            return Err(EngineError::ConfigError(format!(
                "Channel {} requested but '{}' has {} channel(s)",
                settings.channel, device_name, channels
            )));
        }

        info!(
            "Opening '{}' ({} Hz, {} ch, {:?}), analysing channel {}",
            device_name, sample_rate, channels, sample_format, settings.channel
        );

        let slot = Arc::new(LatestBlock::new(settings.block_size));
        let assembler = BlockAssembler::new(
            settings.block_size,
            settings.channel,
            channels as usize,
            Arc::clone(&slot),
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, assembler, events),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, assembler, events),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, assembler, events),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, assembler, events),
            other => Err(EngineError::ConfigError(format!(
                "Unsupported sample format {:?}",
                other
            ))),
        }?;

        stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        Ok(Self {
            stream,
            slot,
            sample_rate,
            device_name,
            channels,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Blocks published and dropped so far
    pub fn block_stats(&self) -> (u64, u64) {
        (self.slot.published(), self.slot.dropped())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut assembler: BlockAssembler,
    events: Sender<Event>,
) -> EngineResult<Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                assembler.push_interleaved(data);
            },
            move |err| {
                error!("Audio input stream error: {}", err);
                let _ = events.try_send(Event::error(err));
            },
            None,
        )
        .map_err(|e| EngineError::StreamBuildError(e.to_string()))
}

impl AudioSource for AudioCapture {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn read_latest(&mut self, out: &mut [f32]) -> bool {
        self.slot.take(out)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause input stream: {}", e);
        }
        let (published, dropped) = self.block_stats();
        info!(
            "Closed '{}' ({} blocks, {} dropped)",
            self.device_name, published, dropped
        );
    }
}

/// Sum of sine tones, generated on demand with continuous phase
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    sample_rate: f32,
    /// (frequency Hz, amplitude) pairs
    tones: Vec<(f32, f32)>,
    phases: Vec<f32>,
}

impl SyntheticSource {
    pub fn new(sample_rate: f32, tones: Vec<(f32, f32)>) -> Self {
        let phases = vec![0.0; tones.len()];
        debug!("Synthetic source at {} Hz with {} tone(s)", sample_rate, tones.len());
        Self {
            sample_rate,
            tones,
            phases,
        }
    }

    pub fn silent(sample_rate: f32) -> Self {
        Self::new(sample_rate, Vec::new())
    }

    pub fn tones(&self) -> &[(f32, f32)] {
        &self.tones
    }

    pub fn set_tones(&mut self, tones: Vec<(f32, f32)>) {
        self.phases = vec![0.0; tones.len()];
        self.tones = tones;
    }
}

impl AudioSource for SyntheticSource {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn read_latest(&mut self, out: &mut [f32]) -> bool {
        out.iter_mut().for_each(|s| *s = 0.0);
        for (&(freq, amp), phase) in self.tones.iter().zip(self.phases.iter_mut()) {
            let step = TAU * freq / self.sample_rate;
            for s in out.iter_mut() {
                *s += amp * phase.sin();
                *phase = (*phase + step) % TAU;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_block_take_once() {
        let slot = LatestBlock::new(4);
        let mut out = [0.0; 4];
        assert!(!slot.take(&mut out));

        slot.publish(&[1.0, 2.0, 3.0, 4.0]);
        assert!(slot.take(&mut out));
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
        assert!(!slot.take(&mut out));
        assert_eq!(slot.published(), 1);
    }

    #[test]
    fn test_latest_block_newest_wins() {
        let slot = LatestBlock::new(2);
        slot.publish(&[1.0, 1.0]);
        slot.publish(&[2.0, 2.0]);
        slot.publish(&[3.0, 3.0]);

        let mut out = [0.0; 2];
        assert!(slot.take(&mut out));
        assert_eq!(out, [3.0, 3.0]);
        assert!(!slot.take(&mut out));
    }

    #[test]
    fn test_assembler_deinterleaves_channel() {
        let slot = Arc::new(LatestBlock::new(3));
        let mut assembler = BlockAssembler::new(3, 1, 2, Arc::clone(&slot));

        // Stereo frames (L, R): right channel is 10, 20, 30, 40
        assembler.push_interleaved(&[1.0f32, 10.0, 2.0, 20.0]);
        let mut out = [0.0; 3];
        assert!(!slot.take(&mut out));

        assembler.push_interleaved(&[3.0f32, 30.0, 4.0, 40.0]);
        assert!(slot.take(&mut out));
        assert_eq!(out, [10.0, 20.0, 30.0]);
        assert_eq!(assembler.filled, 1);
    }

    #[test]
    fn test_assembler_converts_integer_samples() {
        let slot = Arc::new(LatestBlock::new(2));
        let mut assembler = BlockAssembler::new(2, 0, 1, Arc::clone(&slot));
        assembler.push_interleaved(&[0i16, i16::MIN]);

        let mut out = [1.0; 2];
        assert!(slot.take(&mut out));
        assert_eq!(out, [0.0, -1.0]);
    }

    #[test]
    fn test_synthetic_source_amplitude_and_continuity() {
        let mut source = SyntheticSource::new(48_000.0, vec![(1000.0, 0.5)]);
        let mut a = vec![0.0; 480];
        let mut b = vec![0.0; 480];
        assert!(source.read_latest(&mut a));
        assert!(source.read_latest(&mut b));

        let peak = a.iter().chain(&b).fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= 0.5 + 1e-4 && peak > 0.49, "peak {}", peak);

        // 480 samples is exactly 10 cycles, so the second block repeats the first
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_silent_source() {
        let mut source = SyntheticSource::silent(44_100.0);
        let mut out = vec![1.0; 64];
        assert!(source.read_latest(&mut out));
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(source.sample_rate(), 44_100.0);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_open_default_device() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let capture = AudioCapture::open(&AudioSettings::default(), tx).unwrap();
        assert!(capture.sample_rate() > 0.0);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_missing_device_lists_inputs() {
        let settings = AudioSettings {
            device: "no-such-device-xyz".to_string(),
            ..AudioSettings::default()
        };
        let (tx, _rx) = crossbeam_channel::unbounded();
        match AudioCapture::open(&settings, tx) {
            Err(EngineError::DeviceNotFound { name, .. }) => assert_eq!(name, "no-such-device-xyz"),
            Err(EngineError::NoDevicesFound) => {}
            other => panic!("unexpected result {:?}", other.err()),
        }
    }
}
