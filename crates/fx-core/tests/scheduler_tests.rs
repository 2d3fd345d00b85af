// Host-side integration tests for the frame scheduler and idle animation.

use fx_core::motion::MotionRule;
use fx_core::presets;
use fx_core::scene::{ObjectDescriptor, SceneComposer, SceneTable};
use fx_core::uniforms::{INTENSITY, TIME};
use fx_core::{
    AudioReactive, FrameScheduler, GeometryKind, Layer, LoopControl, ReactiveParams,
    SceneGroup, ShaderRegistry,
};
use glam::Vec3;

fn build(table: &SceneTable) -> SceneGroup {
    let reg = ShaderRegistry::with_builtins().unwrap();
    SceneComposer::new(&reg).build(table).unwrap()
}

#[test]
fn idle_animation_is_replayable() {
    for table in presets::all(5) {
        for (t1, t2) in [(0.5, 1.25), (0.0, 10.0), (3.3, 3.4)] {
            let mut replayed = build(&table);
            replayed.on_frame(t1);
            replayed.on_frame(t2);
            let mut direct = build(&table);
            direct.on_frame(t2);
            assert_eq!(
                replayed.objects(),
                direct.objects(),
                "'{}' depends on history ({t1} -> {t2})",
                table.name
            );
            assert_eq!(replayed.rotation(), direct.rotation());
        }
    }
}

#[test]
fn scheduler_updates_layers_in_order_with_one_time() {
    let mut sched = FrameScheduler::new();
    sched.add_scene(build(&presets::liquid_morphing()));
    sched.add_scene(build(&presets::cosmic_nebulas()));
    let used = sched.on_frame(2.0);
    assert_eq!(used, 2.0);
    assert_eq!(sched.frames(), 1);
    for layer in sched.layers() {
        for o in layer.group().objects() {
            assert_eq!(o.uniforms.float(TIME), 2.0);
        }
    }
}

#[test]
fn non_finite_and_backwards_time_is_clamped() {
    let mut sched = FrameScheduler::new();
    sched.add_scene(build(&presets::quantum_effects()));
    sched.on_frame(1.5);
    let snapshot: Vec<_> = sched.layers()[0].group().objects().to_vec();

    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.5] {
        assert_eq!(sched.on_frame(bad), 1.5, "{bad} was not clamped");
        let objects = sched.layers()[0].group().objects();
        assert_eq!(objects, snapshot.as_slice(), "{bad} changed state");
        for o in objects {
            assert!(o.transform.position.is_finite());
            assert!(o.transform.scale.is_finite());
            assert!(o.transform.rotation.is_finite());
        }
    }
    assert_eq!(sched.on_frame(2.0), 2.0);
}

#[test]
fn nan_before_any_valid_time_uses_zero() {
    let mut group = build(&presets::neon_glow());
    assert_eq!(group.on_frame(f32::NAN), 0.0);
    let mut fresh = build(&presets::neon_glow());
    fresh.on_frame(0.0);
    assert_eq!(group.objects(), fresh.objects());
}

#[test]
fn liquid_blob_scale_stays_within_bounds() {
    let mut group = build(&presets::liquid_morphing());
    let blobs: Vec<usize> = group
        .objects()
        .iter()
        .filter(|o| o.geometry() == GeometryKind::Sphere)
        .map(|o| o.index())
        .collect();
    assert_eq!(blobs.len(), 2);
    for step in 0..2000 {
        let t = step as f32 * 0.013;
        group.on_frame(t);
        for &i in &blobs {
            let o = &group.objects()[i];
            let base = o.base().scale.x;
            let s = o.transform.scale;
            assert!(
                s.x >= base - 0.15 - 1e-5 && s.x <= base + 0.15 + 1e-5,
                "blob {i} scale {} escaped [{}, {}] at t={t}",
                s.x,
                base - 0.15,
                base + 0.15
            );
            assert_eq!(s.x, s.y);
            assert_eq!(s.y, s.z);
        }
    }
}

#[test]
fn liquid_blob_follows_closed_form() {
    let table = SceneTable::new("blob").with(
        ObjectDescriptor::new("sphere", "liquid")
            .at(0.5, 1.0, 0.0)
            .uniform_scale(1.2)
            .speed(1.5),
    );
    let mut group = build(&table);
    let t = 2.7_f32;
    group.on_frame(t);
    let o = &group.objects()[0];
    let s = 1.5;
    let expected_scale = 1.2 + (t * s).sin() * 0.1 + (t * s * 0.7).cos() * 0.05;
    assert!((o.transform.scale.x - expected_scale).abs() < 1e-5);
    let expected_y = 1.0 + (t * s + 0.5).sin() * 0.2;
    assert!((o.transform.position.y - expected_y).abs() < 1e-5);
    let expected_rot = Vec3::new(0.1, 0.15, 0.05) * t * s;
    assert!((o.transform.rotation - expected_rot).length() < 1e-5);
}

#[test]
fn intensity_written_every_tick() {
    let mut group = build(&presets::portal_effects());
    group.on_frame(0.25);
    let expected = [1.0, 1.5, 0.8, 1.2, 1.1, 0.9];
    for (o, want) in group.objects().iter().zip(expected) {
        assert_eq!(o.uniforms.float(INTENSITY), want);
    }
}

#[test]
fn neighbours_are_out_of_phase() {
    let mut group = build(&presets::data_streams());
    group.on_frame(1.0);
    let objects = group.objects();
    let offset = |i: usize| objects[i].transform.position.y - objects[i].base().position.y;
    assert!((offset(0) - offset(1)).abs() > 1e-3);
}

#[test]
fn static_motion_keeps_base_transform() {
    let table = SceneTable::new("still").with(
        ObjectDescriptor::new("box", "flat")
            .at(1.0, 2.0, 3.0)
            .with_motion(MotionRule::STATIC),
    );
    let mut group = build(&table);
    group.on_frame(42.0);
    let o = &group.objects()[0];
    assert_eq!(o.transform, *o.base());
}

#[test]
fn reactive_layer_is_reachable() {
    let mut sched = FrameScheduler::new();
    sched.add_scene(build(&presets::neon_glow()));
    let group = build(&presets::sound_waves());
    let idx = sched.add_reactive(AudioReactive::new(group, ReactiveParams::default()).unwrap());
    assert_eq!(idx, 1);
    assert!(sched.reactive(0).is_none(), "scene layers are not reactive");
    assert!(sched.reactive(idx).is_some());
    assert!(sched.reactive_mut(idx).is_some());
    assert!(matches!(sched.layer(idx), Some(Layer::Reactive(_))));
    sched.on_frame(1.0);
    assert_eq!(sched.layers()[idx].group().len(), 64);
}

#[test]
fn install_adds_layers_in_order() {
    let reg = ShaderRegistry::with_builtins().unwrap();
    let composer = SceneComposer::new(&reg);
    let mut sched = FrameScheduler::new();
    let reactive = presets::install(
        &mut sched,
        &composer,
        &["cosmic-nebulas", "sound-waves", "neon-glow", "beat-particles"],
        3,
    )
    .unwrap();
    assert_eq!(reactive, vec![1, 3]);
    assert_eq!(sched.layers().len(), 4);
    assert!(matches!(sched.layer(0), Some(Layer::Scene(_))));
    let waves = sched.reactive_mut(1).unwrap();
    assert_eq!(waves.params().style, fx_core::ReactiveStyle::Waves);
    assert_eq!(waves.state().to_string(), "uninitialized");
}

#[test]
fn install_rejects_unknown_names_without_partial_adds() {
    let reg = ShaderRegistry::with_builtins().unwrap();
    let composer = SceneComposer::new(&reg);
    let mut sched = FrameScheduler::new();
    let err = presets::install(&mut sched, &composer, &["neon-glow", "lava-lamp"], 0).unwrap_err();
    assert_eq!(err, fx_core::ConfigError::UnknownPreset("lava-lamp".into()));
    assert!(sched.layers().is_empty());
}

#[test]
fn loop_control_allows_one_loop_at_a_time() {
    let control = LoopControl::new();
    let first = control.start().expect("first start");
    assert!(first.is_current());
    assert!(control.start().is_none(), "second start while running");
    control.stop();
    assert!(!control.is_running());
    assert!(!first.is_current());
}

#[test]
fn restart_before_the_next_frame_retires_the_old_loop() {
    let control = LoopControl::new();
    let old = control.start().unwrap();
    control.stop();
    let new = control.start().unwrap();
    // the queued callback of the old loop must not keep rescheduling
    assert!(!old.is_current());
    assert!(new.is_current());
    control.stop();
    assert!(!new.is_current());
    control.stop();
    assert!(control.start().is_some_and(|t| t.is_current()));
}
