//! Audio-reactive subsystem: binds a scene group to a live frequency source.
//!
//! The device is requested once. The host resolves the request whenever it
//! likes (usually from an async task) by calling [`DeviceRequest::grant`] or
//! [`DeviceRequest::deny`]; the result lands in a single slot that the next
//! [`AudioReactive::on_frame`] picks up. Until then, and forever after a
//! denial or a disconnect, the group runs its idle animation.

pub mod spectrum;

use crate::color::hsl;
use crate::constants::{
    BAR_LIGHTNESS, BEAT_COOLDOWN_SEC, BEAT_HUE, BEAT_LIGHTNESS, BEAT_THRESHOLD, BIN_LIGHTNESS,
    BIN_SATURATION, DEFAULT_FFT_SIZE,
};
use crate::error::{ConfigError, DeviceError};
use crate::scene::SceneGroup;
use crate::scheduler::TimeClamp;
use crate::uniforms::{COLOR, OPACITY};
use glam::Vec3;
use std::cell::RefCell;
use std::f32::consts::PI;
use std::fmt;
use std::rc::{Rc, Weak};

pub use spectrum::{AnalyserConfig, SpectrumAnalyser};

/// Live frequency-analysis handle handed over by the host.
pub trait FrequencySource {
    /// Number of bins written by [`read`](Self::read). Fixed for the handle's lifetime.
    fn bin_count(&self) -> usize;

    /// Fill `bins` (length [`bin_count`](Self::bin_count)) with energies in [0, 1].
    /// An error means the stream is gone for good.
    fn read(&mut self, bins: &mut [f32]) -> Result<(), DeviceError>;
}

/// Borrowed view of the bins read this frame.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisFrame<'a> {
    bins: &'a [f32],
}

impl<'a> AnalysisFrame<'a> {
    pub fn new(bins: &'a [f32]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &'a [f32] {
        self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Mean energy over every bin; 0.0 for an empty frame.
    pub fn average(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        self.bins.iter().sum::<f32>() / self.bins.len() as f32
    }
}

/// Beat flag plus the time at which it expires.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BeatState {
    active: bool,
    until: f32,
}

impl BeatState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Expiry time of the current beat; meaningless while inactive.
    pub fn until(&self) -> f32 {
        self.until
    }

    /// Expire first, then trigger. Returns true when a new beat started at `t`.
    pub fn update(&mut self, t: f32, average: f32, threshold: f32, cooldown: f32) -> bool {
        if self.active && t >= self.until {
            self.active = false;
        }
        if !self.active && average > threshold {
            self.active = true;
            self.until = t + cooldown;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioState {
    /// No device yet; a request may still be pending.
    Uninitialized,
    /// Device bound, bins read every frame.
    Active,
    /// Denied, unavailable, disconnected or torn down. Terminal.
    Disabled,
}

impl AudioState {
    pub fn name(self) -> &'static str {
        match self {
            AudioState::Uninitialized => "uninitialized",
            AudioState::Active => "active",
            AudioState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for AudioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How bin energy drives the bound objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReactiveStyle {
    /// Thin bars: y-scale `2e + 0.1`, height `2e - 1`, hue `e`.
    #[default]
    Waves,
    /// Wider bars that also roll and fade: y-scale `3e + 0.1`, height `1.5e`,
    /// roll `eπ`, opacity `0.8e + 0.2`.
    Bars,
    /// Floating particles: scale `0.5e + 0.1`, bob `0.5·sin(2t + i)`.
    Pulse,
}

impl ReactiveStyle {
    /// Analyser size the site used for this style.
    pub fn fft_size(self) -> usize {
        match self {
            ReactiveStyle::Bars => 512,
            ReactiveStyle::Waves | ReactiveStyle::Pulse => DEFAULT_FFT_SIZE,
        }
    }

    /// Visual state of object `index` for energy `e` at time `t`.
    pub fn map(
        self,
        e: f32,
        beat: bool,
        t: f32,
        index: usize,
        params: &ReactiveParams,
    ) -> BinVisual {
        let i = index as f32;
        let beat_color = hsl(params.beat_hue, BIN_SATURATION, BEAT_LIGHTNESS);
        match (self, beat) {
            (ReactiveStyle::Waves, false) => BinVisual {
                scale: ScaleMapping::Height(e * 2.0 + 0.1),
                height: e * 2.0 - 1.0,
                roll: None,
                color: hsl(e, BIN_SATURATION, BIN_LIGHTNESS),
                opacity: None,
            },
            (ReactiveStyle::Waves, true) => BinVisual {
                scale: ScaleMapping::Height(e * 4.0 + 0.5),
                height: e * 2.0 - 1.0,
                roll: None,
                color: beat_color,
                opacity: None,
            },
            (ReactiveStyle::Bars, false) => BinVisual {
                scale: ScaleMapping::Height(e * 3.0 + 0.1),
                height: e * 1.5,
                roll: Some(e * PI),
                color: hsl(e, BIN_SATURATION, BAR_LIGHTNESS),
                opacity: Some(e * 0.8 + 0.2),
            },
            (ReactiveStyle::Bars, true) => BinVisual {
                scale: ScaleMapping::Height(e * 6.0 + 0.5),
                height: e * 1.5,
                roll: Some(e * PI),
                color: beat_color,
                opacity: Some(1.0),
            },
            (ReactiveStyle::Pulse, false) => BinVisual {
                scale: ScaleMapping::Uniform(e * 0.5 + 0.1),
                height: (t * 2.0 + i).sin() * 0.5,
                roll: None,
                color: hsl(e, BIN_SATURATION, BIN_LIGHTNESS),
                opacity: None,
            },
            (ReactiveStyle::Pulse, true) => BinVisual {
                scale: ScaleMapping::Uniform(e * 2.0 + 0.5),
                height: (t * 10.0 + i).sin() * 2.0,
                roll: None,
                color: beat_color,
                opacity: None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleMapping {
    /// Replace the Y scale, keep X and Z.
    Height(f32),
    /// Replace all three axes.
    Uniform(f32),
}

/// Per-object result of an audio mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinVisual {
    pub scale: ScaleMapping,
    /// Absolute Y position.
    pub height: f32,
    /// Z rotation, when the style drives it.
    pub roll: Option<f32>,
    pub color: Vec3,
    pub opacity: Option<f32>,
}

/// Tuning for the audio mapping and beat detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactiveParams {
    pub style: ReactiveStyle,
    /// Mean normalized energy above which a beat triggers.
    pub beat_threshold: f32,
    /// Seconds a beat stays active.
    pub cooldown: f32,
    /// Divisor turning raw bin values into energy.
    pub max_energy: f32,
    pub beat_hue: f32,
}

impl Default for ReactiveParams {
    fn default() -> Self {
        Self {
            style: ReactiveStyle::default(),
            beat_threshold: BEAT_THRESHOLD,
            cooldown: BEAT_COOLDOWN_SEC,
            max_energy: 1.0,
            beat_hue: BEAT_HUE,
        }
    }
}

impl ReactiveParams {
    pub fn with_style(style: ReactiveStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.beat_threshold) {
            return Err(ConfigError::InvalidReactive(format!(
                "beat threshold {} outside [0, 1]",
                self.beat_threshold
            )));
        }
        if !self.cooldown.is_finite() || self.cooldown <= 0.0 {
            return Err(ConfigError::InvalidReactive(format!(
                "cooldown {} must be positive",
                self.cooldown
            )));
        }
        if !self.max_energy.is_finite() || self.max_energy <= 0.0 {
            return Err(ConfigError::InvalidReactive(format!(
                "max energy {} must be positive",
                self.max_energy
            )));
        }
        Ok(())
    }
}

type Grant = Result<Box<dyn FrequencySource>, DeviceError>;
type GrantSlot = Rc<RefCell<Option<Grant>>>;

/// One-shot handle for resolving a device request.
///
/// Holds only a weak link to the subsystem, so resolving it after the
/// subsystem was torn down or dropped does nothing.
pub struct DeviceRequest {
    slot: Weak<RefCell<Option<Grant>>>,
}

impl DeviceRequest {
    /// Whether the subsystem this request belongs to is gone.
    pub fn is_cancelled(&self) -> bool {
        self.slot.strong_count() == 0
    }

    pub fn grant(self, source: Box<dyn FrequencySource>) -> bool {
        self.deliver(Ok(source))
    }

    pub fn deny(self, err: DeviceError) -> bool {
        self.deliver(Err(err))
    }

    /// Returns false when the result was dropped because the subsystem is gone.
    pub fn deliver(self, result: Grant) -> bool {
        match self.slot.upgrade() {
            Some(slot) => {
                *slot.borrow_mut() = Some(result);
                true
            }
            None => {
                log::debug!("[audio] late device result ignored");
                false
            }
        }
    }
}

/// A scene group plus the audio state machine that drives it.
pub struct AudioReactive {
    group: SceneGroup,
    params: ReactiveParams,
    state: AudioState,
    requested: bool,
    pending: Option<GrantSlot>,
    source: Option<Box<dyn FrequencySource>>,
    bins: Vec<f32>,
    beat: BeatState,
    clamp: TimeClamp,
}

impl AudioReactive {
    pub fn new(group: SceneGroup, params: ReactiveParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            group,
            params,
            state: AudioState::Uninitialized,
            requested: false,
            pending: None,
            source: None,
            bins: Vec::new(),
            beat: BeatState::default(),
            clamp: TimeClamp::default(),
        })
    }

    pub fn group(&self) -> &SceneGroup {
        &self.group
    }

    pub fn params(&self) -> &ReactiveParams {
        &self.params
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn beat(&self) -> &BeatState {
        &self.beat
    }

    /// Bins read on the most recent active frame.
    pub fn frame(&self) -> AnalysisFrame<'_> {
        AnalysisFrame::new(&self.bins)
    }

    /// Start the one device request this instance will ever make. Returns
    /// `None` if a request was already made or the subsystem is disabled.
    pub fn request(&mut self) -> Option<DeviceRequest> {
        if self.requested || self.state != AudioState::Uninitialized {
            return None;
        }
        self.requested = true;
        let slot: GrantSlot = Rc::new(RefCell::new(None));
        let request = DeviceRequest {
            slot: Rc::downgrade(&slot),
        };
        self.pending = Some(slot);
        log::info!("[audio] requesting input device for '{}'", self.group.name());
        Some(request)
    }

    /// Release the device and stop listening for a pending grant.
    pub fn teardown(&mut self) {
        self.pending = None;
        self.source = None;
        self.beat.reset();
        if self.state != AudioState::Disabled {
            log::info!("[audio] '{}' torn down", self.group.name());
        }
        self.state = AudioState::Disabled;
    }

    fn poll_grant(&mut self) {
        let Some(slot) = &self.pending else {
            return;
        };
        let Some(result) = slot.borrow_mut().take() else {
            return;
        };
        self.pending = None;
        match result {
            Ok(source) => {
                let n = source.bin_count();
                log::info!("[audio] device granted ({n} bins)");
                self.bins = vec![0.0; n];
                self.source = Some(source);
                self.state = AudioState::Active;
            }
            Err(err) => {
                log::warn!("[audio] {err}; staying idle");
                self.state = AudioState::Disabled;
            }
        }
    }

    /// Idle animation first, then the audio mapping on top when active.
    pub fn on_frame(&mut self, t: f32) -> f32 {
        let t = self.clamp.clamp(t);
        self.poll_grant();
        self.group.on_frame(t);

        if self.state != AudioState::Active {
            return t;
        }
        let Some(source) = self.source.as_mut() else {
            return t;
        };
        if let Err(err) = source.read(&mut self.bins) {
            log::warn!("[audio] {err}; disabling");
            self.source = None;
            self.beat.reset();
            self.state = AudioState::Disabled;
            return t;
        }

        let average = AnalysisFrame::new(&self.bins).average() / self.params.max_energy;
        if self
            .beat
            .update(t, average, self.params.beat_threshold, self.params.cooldown)
        {
            log::debug!("[audio] beat at {t:.3}s (avg {average:.3})");
        }
        self.apply(t);
        t
    }

    fn apply(&mut self, t: f32) {
        let beat = self.beat.is_active();
        let params = self.params;
        let bins = &self.bins;
        for (i, object) in self.group.objects_mut().iter_mut().enumerate().take(bins.len()) {
            let e = bins[i] / params.max_energy;
            let v = params.style.map(e, beat, t, i, &params);
            match v.scale {
                ScaleMapping::Height(y) => object.transform.scale.y = y,
                ScaleMapping::Uniform(s) => object.transform.scale = Vec3::splat(s),
            }
            object.transform.position.y = v.height;
            if let Some(roll) = v.roll {
                object.transform.rotation.z = roll;
            }
            object.uniforms.set_color(COLOR, v.color);
            if let Some(opacity) = v.opacity {
                object.uniforms.set_float(OPACITY, opacity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_empty_frame_is_zero() {
        assert_eq!(AnalysisFrame::new(&[]).average(), 0.0);
        assert!((AnalysisFrame::new(&[0.2, 0.4]).average() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn beat_does_not_retrigger_while_active() {
        let mut b = BeatState::default();
        assert!(b.update(0.0, 0.9, 0.5, 0.25));
        assert!(!b.update(0.125, 0.9, 0.5, 0.25));
        assert!(b.is_active());
        // expiry and retrigger on the same frame
        assert!(b.update(0.25, 0.9, 0.5, 0.25));
        assert_eq!(b.until(), 0.5);
    }

    #[test]
    fn params_validation() {
        assert!(ReactiveParams::default().validate().is_ok());
        let bad = ReactiveParams {
            cooldown: 0.0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidReactive(_))));
    }
}
