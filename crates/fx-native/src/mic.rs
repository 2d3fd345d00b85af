// ---------------- Native microphone (cpal) ----------------

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use fx_core::audio::{AnalyserConfig, SpectrumAnalyser};
use fx_core::{DeviceError, FrequencySource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mono samples captured since the last read, shared with the input callback.
type Pending = Arc<Mutex<Vec<f32>>>;

/// Default input device analysed with [`SpectrumAnalyser`].
///
/// The stream stays open for as long as this value lives.
pub struct MicSource {
    analyser: SpectrumAnalyser,
    pending: Pending,
    scratch: Vec<f32>,
    ended: Arc<AtomicBool>,
    _stream: cpal::Stream,
}

impl MicSource {
    pub fn open(fft_size: usize) -> Result<Self, DeviceError> {
        let analyser = SpectrumAnalyser::new(AnalyserConfig::with_fft_size(fft_size))
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| DeviceError::Unavailable("no default input device".into()))?;
        let config = device
            .default_input_config()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        let name = device.name().unwrap_or_else(|_| "unknown".into());
        log::info!(
            "[mic] {name}: {} Hz, {} ch, {:?}",
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        // keep a few windows of slack between reads
        let capacity = fft_size * 4;
        let pending: Pending = Arc::new(Mutex::new(Vec::with_capacity(capacity)));
        let ended = Arc::new(AtomicBool::new(false));
        let channels = config.channels() as usize;
        let stream_config: cpal::StreamConfig = config.clone().into();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(
                &device,
                &stream_config,
                channels,
                capacity,
                Arc::clone(&pending),
                Arc::clone(&ended),
            ),
            cpal::SampleFormat::I16 => build_stream::<i16>(
                &device,
                &stream_config,
                channels,
                capacity,
                Arc::clone(&pending),
                Arc::clone(&ended),
            ),
            cpal::SampleFormat::U16 => build_stream::<u16>(
                &device,
                &stream_config,
                channels,
                capacity,
                Arc::clone(&pending),
                Arc::clone(&ended),
            ),
            other => {
                return Err(DeviceError::Unavailable(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        stream
            .play()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

        Ok(Self {
            analyser,
            pending,
            scratch: Vec::with_capacity(capacity),
            ended,
            _stream: stream,
        })
    }
}

impl FrequencySource for MicSource {
    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn read(&mut self, bins: &mut [f32]) -> Result<(), DeviceError> {
        if self.ended.load(Ordering::Relaxed) {
            return Err(DeviceError::Disconnected);
        }
        self.scratch.clear();
        match self.pending.lock() {
            Ok(mut pending) => self.scratch.append(&mut pending),
            Err(_) => return Err(DeviceError::Disconnected),
        }
        self.analyser.push_samples(&self.scratch);
        self.analyser.analyse(bins);
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    capacity: usize,
    pending: Pending,
    ended: Arc<AtomicBool>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let Ok(mut buffer) = pending.lock() else {
                return;
            };
            buffer.extend(data.chunks(channels).map(|frame| {
                frame.iter().map(|s| f32::from_sample(*s)).sum::<f32>() / frame.len() as f32
            }));
            let excess = buffer.len().saturating_sub(capacity);
            if excess > 0 {
                buffer.drain(..excess);
            }
        },
        move |err| {
            log::warn!("[mic] input stream error: {err}");
            if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                ended.store(true, Ordering::Relaxed);
            }
        },
        None,
    )
}
