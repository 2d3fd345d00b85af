use fx_core::{DeviceError, FrequencySource};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Microphone routed into an `AnalyserNode`.
///
/// Dropping it stops the capture track and closes the audio context.
pub struct AnalyserSource {
    ctx: web::AudioContext,
    analyser: web::AnalyserNode,
    track: web::MediaStreamTrack,
    bytes: Vec<u8>,
}

impl FrequencySource for AnalyserSource {
    fn bin_count(&self) -> usize {
        self.bytes.len()
    }

    fn read(&mut self, bins: &mut [f32]) -> Result<(), DeviceError> {
        if self.track.ready_state() == web::MediaStreamTrackState::Ended {
            return Err(DeviceError::Disconnected);
        }
        self.analyser.get_byte_frequency_data(&mut self.bytes);
        for (out, b) in bins.iter_mut().zip(&self.bytes) {
            *out = *b as f32 / 255.0;
        }
        Ok(())
    }
}

impl Drop for AnalyserSource {
    fn drop(&mut self) {
        self.track.stop();
        let _ = self.ctx.close();
        log::info!("[audio] microphone released");
    }
}

fn describe(e: JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{e:?}"))
}

/// Ask for the microphone and wire it to an analyser of `fft_size`.
pub async fn open_microphone(fft_size: u32) -> Result<AnalyserSource, DeviceError> {
    let window = web::window().ok_or_else(|| DeviceError::Unavailable("no window".into()))?;
    let media = window
        .navigator()
        .media_devices()
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;

    let constraints = web::MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = media
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;
    let stream: web::MediaStream = JsFuture::from(promise)
        .await
        .map_err(|e| DeviceError::Denied(describe(e)))?
        .dyn_into()
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;

    let track: web::MediaStreamTrack = stream
        .get_audio_tracks()
        .get(0)
        .dyn_into()
        .map_err(|_| DeviceError::Unavailable("stream has no audio track".into()))?;

    let ctx = web::AudioContext::new().map_err(|e| DeviceError::Unavailable(describe(e)))?;
    let analyser = ctx
        .create_analyser()
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;
    analyser.set_fft_size(fft_size);
    let source = ctx
        .create_media_stream_source(&stream)
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;
    source
        .connect_with_audio_node(&analyser)
        .map_err(|e| DeviceError::Unavailable(describe(e)))?;

    let bins = analyser.frequency_bin_count() as usize;
    log::info!("[audio] analyser ready ({bins} bins)");
    Ok(AnalyserSource {
        ctx,
        analyser,
        track,
        bytes: vec![0; bins],
    })
}
