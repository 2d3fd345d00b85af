// Host-side integration tests for the audio-reactive subsystem.
// Scripted frequency sources stand in for the microphone.

use fx_core::audio::{AnalysisFrame, ReactiveStyle};
use fx_core::color::hsl;
use fx_core::presets;
use fx_core::scene::{SceneComposer, SceneTable};
use fx_core::uniforms::{COLOR, OPACITY};
use fx_core::{
    AudioReactive, AudioState, DeviceError, FrequencySource, ReactiveParams, SceneGroup,
    ShaderRegistry,
};
use std::cell::Cell;
use std::f32::consts::PI;
use std::rc::Rc;

const DT: f32 = 1.0 / 16.0;

/// Replays fixed frames; the last one repeats forever. Fails once `fail_at`
/// reads have happened.
struct Scripted {
    bins: usize,
    frames: Vec<Vec<f32>>,
    reads: Rc<Cell<usize>>,
    fail_at: Option<usize>,
}

impl Scripted {
    fn new(bins: usize, frames: Vec<Vec<f32>>) -> Self {
        Self {
            bins,
            frames,
            reads: Rc::new(Cell::new(0)),
            fail_at: None,
        }
    }

    fn constant(bins: usize, value: f32) -> Self {
        Self::new(bins, vec![vec![value; bins]])
    }
}

impl FrequencySource for Scripted {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn read(&mut self, bins: &mut [f32]) -> Result<(), DeviceError> {
        let n = self.reads.get();
        if self.fail_at == Some(n) {
            return Err(DeviceError::Disconnected);
        }
        self.reads.set(n + 1);
        let frame = &self.frames[n.min(self.frames.len() - 1)];
        bins.copy_from_slice(frame);
        Ok(())
    }
}

fn build(table: &SceneTable) -> SceneGroup {
    let reg = ShaderRegistry::with_builtins().unwrap();
    SceneComposer::new(&reg).build(table).unwrap()
}

fn reactive(table: &SceneTable, params: ReactiveParams) -> AudioReactive {
    AudioReactive::new(build(table), params).unwrap()
}

fn fast_params(style: ReactiveStyle) -> ReactiveParams {
    ReactiveParams {
        cooldown: 0.25,
        ..ReactiveParams::with_style(style)
    }
}

#[test]
fn starts_uninitialized_and_requests_once() {
    let mut r = reactive(&presets::sound_waves(), ReactiveParams::default());
    assert_eq!(r.state(), AudioState::Uninitialized);
    let req = r.request();
    assert!(req.is_some());
    assert!(r.request().is_none(), "second request must not be issued");
    r.on_frame(0.5);
    assert_eq!(r.state(), AudioState::Uninitialized, "pending request stays idle");
}

#[test]
fn pending_request_runs_idle_animation() {
    let table = presets::beat_particles(4);
    let mut r = reactive(&table, ReactiveParams::with_style(ReactiveStyle::Pulse));
    let _pending = r.request().unwrap();
    let mut idle = build(&table);
    for step in 0..10 {
        let t = step as f32 * DT;
        r.on_frame(t);
        idle.on_frame(t);
        assert_eq!(r.group().objects(), idle.objects());
    }
}

#[test]
fn grant_activates_on_next_frame() {
    let mut r = reactive(&presets::sound_waves(), ReactiveParams::default());
    let req = r.request().unwrap();
    assert!(req.grant(Box::new(Scripted::constant(128, 0.0))));
    assert_eq!(r.state(), AudioState::Uninitialized, "grant is applied by the tick");
    r.on_frame(0.0);
    assert_eq!(r.state(), AudioState::Active);
    assert_eq!(r.frame().len(), 128);
}

#[test]
fn waves_mapping_sets_scale_height_and_hue() {
    let mut bins = vec![0.0; 128];
    bins[0] = 0.5;
    bins[1] = 0.25;
    let mut r = reactive(&presets::sound_waves(), ReactiveParams::default());
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::new(128, vec![bins])));
    r.on_frame(1.0);
    assert!(!r.beat().is_active());

    let objects = r.group().objects();
    let bar = &objects[0];
    assert!((bar.transform.scale.y - 1.1).abs() < 1e-6);
    assert!((bar.transform.position.y - 0.0).abs() < 1e-6);
    assert_eq!(bar.transform.scale.x, 0.05, "x scale is untouched");
    assert!((bar.uniforms.color(COLOR) - hsl(0.5, 1.0, 0.5)).length() < 1e-6);

    let quiet = &objects[10];
    assert!((quiet.transform.scale.y - 0.1).abs() < 1e-6);
    assert!((quiet.transform.position.y + 1.0).abs() < 1e-6);
}

#[test]
fn bars_mapping_rolls_and_fades() {
    let mut r = reactive(
        &presets::audio_visualizer(),
        ReactiveParams::with_style(ReactiveStyle::Bars),
    );
    // average stays below the beat threshold
    let mut bins = vec![0.0; 256];
    bins[3] = 1.0;
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::new(256, vec![bins])));
    r.on_frame(0.5);
    let bar = &r.group().objects()[3];
    assert!((bar.transform.scale.y - 3.1).abs() < 1e-6);
    assert!((bar.transform.position.y - 1.5).abs() < 1e-6);
    assert!((bar.transform.rotation.z - PI).abs() < 1e-6);
    assert!((bar.uniforms.float(OPACITY) - 1.0).abs() < 1e-6);
    let idle_bar = &r.group().objects()[4];
    assert!((idle_bar.uniforms.float(OPACITY) - 0.2).abs() < 1e-6);
}

#[test]
fn only_objects_with_a_bin_are_driven() {
    // 64 bars but only 16 bins
    let table = presets::sound_waves();
    let mut r = reactive(&table, ReactiveParams::default());
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::constant(16, 0.1)));
    let mut idle = build(&table);
    r.on_frame(2.0);
    idle.on_frame(2.0);
    assert_ne!(r.group().objects()[15], idle.objects()[15]);
    assert_eq!(&r.group().objects()[16..], &idle.objects()[16..]);
}

#[test]
fn beat_stays_active_for_exactly_the_cooldown() {
    let bins = 32;
    let k = 4;
    let mut frames = vec![vec![0.0; bins]; k];
    frames.push(vec![0.9; bins]);
    frames.push(vec![0.0; bins]);
    let mut r = reactive(&presets::beat_particles(1), fast_params(ReactiveStyle::Pulse));
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::new(bins, frames)));

    let mut history = Vec::new();
    for step in 0..16 {
        let t = step as f32 * DT;
        r.on_frame(t);
        history.push(r.beat().is_active());
    }
    // trigger at tick k (t = 0.25), expiry 0.25 s later (tick k + 4)
    for (step, active) in history.iter().enumerate() {
        let expected = (k..k + 4).contains(&step);
        assert_eq!(*active, expected, "tick {step}: beat active = {active}");
    }
}

#[test]
fn beat_mapping_replaces_per_bin_mapping() {
    let bins = 32;
    let mut r = reactive(&presets::beat_particles(1), fast_params(ReactiveStyle::Pulse));
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::constant(bins, 0.5)));
    let t = 0.75;
    r.on_frame(t);
    assert!(r.beat().is_active());
    let p = &r.group().objects()[2];
    assert!((p.transform.scale.x - (0.5 * 2.0 + 0.5)).abs() < 1e-6);
    assert!((p.transform.position.y - (t * 10.0 + 2.0).sin() * 2.0).abs() < 1e-5);
    assert!((p.uniforms.color(COLOR) - hsl(0.0, 1.0, 0.8)).length() < 1e-6);
}

#[test]
fn sustained_energy_retriggers_after_expiry() {
    let mut r = reactive(&presets::beat_particles(1), fast_params(ReactiveStyle::Pulse));
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::constant(8, 0.9)));
    r.on_frame(0.0);
    assert_eq!(r.beat().until(), 0.25);
    r.on_frame(0.125);
    assert_eq!(r.beat().until(), 0.25, "no retrigger while active");
    r.on_frame(0.25);
    assert!(r.beat().is_active());
    assert_eq!(r.beat().until(), 0.5);
}

#[test]
fn denial_is_indistinguishable_from_no_audio() {
    let table = presets::audio_visualizer();
    let mut r = reactive(&table, ReactiveParams::with_style(ReactiveStyle::Bars));
    let req = r.request().unwrap();
    assert!(req.deny(DeviceError::Denied("user said no".into())));
    let mut idle = build(&table);
    for step in 0..30 {
        let t = step as f32 * 0.1;
        r.on_frame(t);
        idle.on_frame(t);
        assert_eq!(r.state(), AudioState::Disabled);
        assert_eq!(r.group().objects(), idle.objects(), "diverged at t={t}");
    }
    assert!(r.request().is_none(), "denial is permanent");
}

#[test]
fn disconnect_disables_and_falls_back_to_idle() {
    let table = presets::sound_waves();
    let mut source = Scripted::constant(128, 0.4);
    source.fail_at = Some(3);
    let reads = Rc::clone(&source.reads);
    let mut r = reactive(&table, ReactiveParams::default());
    r.request().unwrap().grant(Box::new(source));
    let mut idle = build(&table);

    for step in 0..3 {
        r.on_frame(step as f32 * DT);
        assert_eq!(r.state(), AudioState::Active);
    }
    let t = 3.0 * DT;
    r.on_frame(t);
    idle.on_frame(t);
    assert_eq!(r.state(), AudioState::Disabled);
    assert!(!r.beat().is_active());
    assert_eq!(r.group().objects(), idle.objects());

    r.on_frame(1.0);
    assert_eq!(reads.get(), 3, "no reads after the stream ended");
}

#[test]
fn late_grant_after_teardown_is_ignored() {
    let mut r = reactive(&presets::sound_waves(), ReactiveParams::default());
    let req = r.request().unwrap();
    r.teardown();
    assert!(req.is_cancelled());
    assert!(!req.grant(Box::new(Scripted::constant(128, 1.0))));
    r.on_frame(1.0);
    assert_eq!(r.state(), AudioState::Disabled);
}

#[test]
fn late_grant_after_drop_is_ignored() {
    let mut r = reactive(&presets::sound_waves(), ReactiveParams::default());
    let req = r.request().unwrap();
    drop(r);
    assert!(req.is_cancelled());
    assert!(!req.deny(DeviceError::Unavailable("gone".into())));
}

#[test]
fn backwards_time_does_not_shorten_a_beat() {
    let mut r = reactive(&presets::beat_particles(1), fast_params(ReactiveStyle::Pulse));
    r.request()
        .unwrap()
        .grant(Box::new(Scripted::new(8, vec![vec![0.9; 8], vec![0.0; 8]])));
    r.on_frame(1.0);
    assert!(r.beat().is_active());
    r.on_frame(f32::NAN);
    r.on_frame(0.0);
    assert!(r.beat().is_active());
    assert_eq!(r.beat().until(), 1.25);
}

#[test]
fn beat_threshold_applies_to_normalised_energy() {
    // byte-scale bins, as an 8-bit analyser reports them
    let params = ReactiveParams {
        max_energy: 255.0,
        ..fast_params(ReactiveStyle::Pulse)
    };
    assert!(params.validate().is_ok());

    let mut quiet = reactive(&presets::beat_particles(1), params);
    quiet
        .request()
        .unwrap()
        .grant(Box::new(Scripted::constant(128, 10.0)));
    quiet.on_frame(0.0);
    assert_eq!(quiet.state(), AudioState::Active);
    assert!(!quiet.beat().is_active(), "10/255 is below the threshold");

    let mut loud = reactive(&presets::beat_particles(1), params);
    loud.request()
        .unwrap()
        .grant(Box::new(Scripted::constant(128, 60.0)));
    loud.on_frame(0.0);
    assert!(loud.beat().is_active(), "60/255 is above the threshold");
}

#[test]
fn analysis_frame_average() {
    let bins = [0.0, 0.5, 1.0, 0.5];
    assert!((AnalysisFrame::new(&bins).average() - 0.5).abs() < 1e-6);
}

#[test]
fn invalid_params_are_rejected() {
    let group = build(&presets::sound_waves());
    let params = ReactiveParams {
        max_energy: 0.0,
        ..Default::default()
    };
    assert!(AudioReactive::new(group, params).is_err());
}
