//! Layout tables for the site's background layers.

use crate::audio::{AudioReactive, ReactiveParams, ReactiveStyle};
use crate::color::{hex, hsl};
use crate::constants::{
    COSMIC_DUST_SPIN, COSMIC_GROUP_SPIN, HOLOGRAPHIC_GROUP_SPIN, LIQUID_GROUP_SPIN,
    MORPHING_GROUP_SPIN, NEON_GROUP_SPIN, PORTAL_GROUP_SPIN, QUANTUM_GROUP_SPIN, STAR_FIELD_SPIN,
};
use crate::error::ConfigError;
use crate::motion::{Drift, Drive, HueCycle, MotionRule, PhaseSource, Pulse, Spin, Wave};
use crate::scene::{ObjectDescriptor, Scatter, SceneComposer, SceneTable};
use crate::scheduler::{FrameScheduler, Layer};
use crate::uniforms::{UniformValue, COLOR, GLOW_COLOR, OPACITY};
use glam::Vec3;
use std::f32::consts::TAU;

pub const NAMES: [&str; 17] = [
    "cosmic-nebulas",
    "star-field",
    "cosmic-dust",
    "liquid-morphing",
    "morphing-shapes",
    "holographic-effects",
    "neon-glow",
    "portal-effects",
    "quantum-effects",
    "rainbow-showcase",
    "rainbow-particles",
    "rainbow-beams",
    "matrix-rain",
    "data-streams",
    "sound-waves",
    "audio-visualizer",
    "beat-particles",
];

/// Six anchor positions shared by most effect layers.
const ANCHORS: [[f32; 3]; 6] = [
    [2.0, 1.0, -1.0],
    [-2.0, 0.0, -2.0],
    [0.0, 2.0, -3.0],
    [3.0, -1.0, -1.0],
    [-3.0, 1.0, -2.0],
    [1.0, -2.0, -4.0],
];

/// Table by name. `seed` only matters for layers with random placement.
pub fn by_name(name: &str, seed: u64) -> Option<SceneTable> {
    let table = match name {
        "cosmic-nebulas" => cosmic_nebulas(),
        "star-field" => star_field(seed),
        "cosmic-dust" => cosmic_dust(seed),
        "liquid-morphing" => liquid_morphing(),
        "morphing-shapes" => morphing_shapes(),
        "holographic-effects" => holographic_effects(),
        "neon-glow" => neon_glow(),
        "portal-effects" => portal_effects(),
        "quantum-effects" => quantum_effects(),
        "rainbow-showcase" => rainbow_showcase(),
        "rainbow-particles" => rainbow_particles(seed),
        "rainbow-beams" => rainbow_beams(),
        "matrix-rain" => matrix_rain(),
        "data-streams" => data_streams(),
        "sound-waves" => sound_waves(),
        "audio-visualizer" => audio_visualizer(),
        "beat-particles" => beat_particles(seed),
        _ => return None,
    };
    Some(table)
}

/// Every table, in [`NAMES`] order.
pub fn all(seed: u64) -> Vec<SceneTable> {
    NAMES.iter().filter_map(|n| by_name(n, seed)).collect()
}

/// Audio mapping for the layers that listen to the microphone.
pub fn reactive_style(name: &str) -> Option<ReactiveStyle> {
    match name {
        "sound-waves" => Some(ReactiveStyle::Waves),
        "audio-visualizer" => Some(ReactiveStyle::Bars),
        "beat-particles" => Some(ReactiveStyle::Pulse),
        _ => None,
    }
}

/// Build the named layers and add them to `scheduler` in order.
///
/// Audio layers are added as reactive layers with default parameters for
/// their style; their scheduler indices are returned so the host can issue
/// device requests. Nothing is added if any name fails to resolve.
pub fn install(
    scheduler: &mut FrameScheduler,
    composer: &SceneComposer<'_>,
    names: &[&str],
    seed: u64,
) -> Result<Vec<usize>, ConfigError> {
    let mut built = Vec::with_capacity(names.len());
    for name in names {
        let table =
            by_name(name, seed).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
        let group = composer.build(&table)?;
        built.push(match reactive_style(name) {
            Some(style) => Layer::Reactive(AudioReactive::new(
                group,
                ReactiveParams::with_style(style),
            )?),
            None => Layer::Scene(group),
        });
    }

    let mut reactive = Vec::new();
    for layer in built {
        match layer {
            Layer::Scene(group) => {
                scheduler.add_scene(group);
            }
            Layer::Reactive(layer) => reactive.push(scheduler.add_reactive(layer)),
        }
    }
    Ok(reactive)
}

/// Point `i` of `n` evenly spaced on a circle of `radius` in the XY plane.
pub fn ring_point(i: usize, n: usize, radius: f32) -> (f32, f32) {
    let a = i as f32 / n as f32 * TAU;
    (a.cos() * radius, a.sin() * radius)
}

fn anchored(geometry: &str, shader: &str, anchor: usize, scale: f32) -> ObjectDescriptor {
    let [x, y, z] = ANCHORS[anchor % ANCHORS.len()];
    ObjectDescriptor::new(geometry, shader)
        .at(x, y, z)
        .uniform_scale(scale)
}

pub fn cosmic_nebulas() -> SceneTable {
    let rows = [
        ([0.0, 0.0, -50.0], 20.0, 1.0),
        ([30.0, 20.0, -40.0], 15.0, 0.8),
        ([-30.0, -20.0, -60.0], 18.0, 0.9),
        ([20.0, -30.0, -45.0], 12.0, 0.7),
        ([-20.0, 30.0, -55.0], 16.0, 0.85),
    ];
    let mut table = SceneTable::new("cosmic-nebulas").spin_y(COSMIC_GROUP_SPIN);
    for ([x, y, z], scale, intensity) in rows {
        table.push(
            ObjectDescriptor::new("plane", "nebula")
                .at(x, y, z)
                .uniform_scale(scale)
                .intensity(intensity),
        );
    }
    table
}

fn point_layer(name: &str, spin: f32, count: usize, extent: f32, seed: u64) -> SceneTable {
    SceneTable::new(name).spin_y(spin).seeded(seed).with(
        ObjectDescriptor::new("points", "flat")
            .point_cloud(count, extent)
            .with_motion(MotionRule::STATIC),
    )
}

pub fn star_field(seed: u64) -> SceneTable {
    point_layer("star-field", STAR_FIELD_SPIN, 1000, 200.0, seed)
}

pub fn cosmic_dust(seed: u64) -> SceneTable {
    point_layer("cosmic-dust", COSMIC_DUST_SPIN, 500, 100.0, seed)
}

pub fn liquid_morphing() -> SceneTable {
    let rows = [
        ("sphere", 1.2, 1.0),
        ("box", 0.8, 1.5),
        ("torus", 1.0, 0.8),
        ("sphere", 0.6, 1.2),
        ("box", 1.1, 0.9),
        ("torus", 1.3, 1.1),
    ];
    let mut table = SceneTable::new("liquid-morphing").spin_y(LIQUID_GROUP_SPIN);
    for (i, (geometry, scale, speed)) in rows.into_iter().enumerate() {
        table.push(anchored(geometry, "liquid", i, scale).speed(speed));
    }
    table
}

pub fn morphing_shapes() -> SceneTable {
    let rows = [
        ("sphere", [3.0, 2.0, -2.0], 1.2),
        ("dodecahedron", [-3.0, 1.0, -1.0], 0.8),
        ("sphere", [0.0, -2.0, -3.0], 1.5),
        ("dodecahedron", [4.0, 0.0, -2.0], 1.0),
        ("sphere", [-2.0, -1.0, -4.0], 0.6),
    ];
    let mut table = SceneTable::new("morphing-shapes").spin_y(MORPHING_GROUP_SPIN);
    for (geometry, [x, y, z], scale) in rows {
        table.push(
            ObjectDescriptor::new(geometry, "morphing")
                .at(x, y, z)
                .uniform_scale(scale),
        );
    }
    table
}

pub fn holographic_effects() -> SceneTable {
    let rows = [
        ("box", 0.8),
        ("torus", 1.2),
        ("cylinder", 1.0),
        ("box", 0.6),
        ("torus", 0.9),
        ("cylinder", 1.5),
    ];
    let mut table = SceneTable::new("holographic-effects").spin_y(HOLOGRAPHIC_GROUP_SPIN);
    for (i, (geometry, scale)) in rows.into_iter().enumerate() {
        table.push(anchored(geometry, "holographic", i, scale));
    }
    table
}

pub fn neon_glow() -> SceneTable {
    let rows = [
        ("box", 0.8, 0x00ffff, 0x0080ff),
        ("sphere", 1.0, 0xff00ff, 0xff0080),
        ("torus", 1.2, 0xffff00, 0xff8000),
        ("box", 0.6, 0x00ff00, 0x008000),
        ("sphere", 0.9, 0xff8000, 0xff4000),
        ("torus", 1.1, 0x8000ff, 0x4000ff),
    ];
    let mut table = SceneTable::new("neon-glow").spin_y(NEON_GROUP_SPIN);
    for (i, (geometry, scale, color, glow)) in rows.into_iter().enumerate() {
        table.push(
            anchored(geometry, "neon", i, scale)
                .with_color(COLOR, hex(color))
                .with_color(GLOW_COLOR, hex(glow)),
        );
    }
    table
}

pub fn portal_effects() -> SceneTable {
    let rows = [
        ("circle", 1.0, 1.0),
        ("torus", 1.2, 1.5),
        ("sphere", 0.8, 0.8),
        ("circle", 0.6, 1.2),
        ("torus", 0.9, 1.1),
        ("sphere", 1.3, 0.9),
    ];
    let mut table = SceneTable::new("portal-effects").spin_y(PORTAL_GROUP_SPIN);
    for (i, (geometry, scale, intensity)) in rows.into_iter().enumerate() {
        table.push(anchored(geometry, "portal", i, scale).intensity(intensity));
    }
    table
}

pub fn quantum_effects() -> SceneTable {
    let rows = [
        ("sphere", 0.8, 1.0),
        ("box", 1.2, 1.5),
        ("torus", 1.0, 0.8),
        ("sphere", 0.6, 1.2),
        ("box", 0.9, 1.1),
        ("torus", 1.3, 0.9),
    ];
    let mut table = SceneTable::new("quantum-effects").spin_y(QUANTUM_GROUP_SPIN);
    for (i, (geometry, scale, field)) in rows.into_iter().enumerate() {
        table.push(anchored(geometry, "quantum", i, scale).intensity(field));
    }
    table
}

pub fn rainbow_showcase() -> SceneTable {
    let color_shift = MotionRule::spin(Vec3::new(0.4, 0.3, 0.2), Drive::Fixed)
        .with_pulse(Pulse::relative(Wave::sin(0.1, 2.0), Drive::Fixed))
        .with_hue(HueCycle {
            rate: 0.1,
            per_phase: 0.0,
            saturation: 1.0,
            lightness: 0.5,
        });
    SceneTable::new("rainbow-showcase")
        .with(ObjectDescriptor::new("sphere", "rainbow").at(-1.5, 0.0, -2.0))
        .with(
            ObjectDescriptor::new("box", "flat")
                .at(1.5, 0.0, -2.0)
                .uniform_scale(0.8)
                .with_motion(color_shift),
        )
}

pub fn rainbow_particles(seed: u64) -> SceneTable {
    let motion = MotionRule::STATIC
        .with_spin(
            Spin::new(Vec3::new(0.5, 0.3, 0.2), Drive::Fixed)
                .offset_per_phase(Vec3::new(0.1, 0.2, 0.15)),
        )
        .with_drift(Drift::axes(
            [Wave::cos(0.3, 1.5), Wave::sin(0.5, 2.0), Wave::sin(0.2, 1.2)],
            PhaseSource::Index(Vec3::new(0.3, 0.5, 0.4)),
        ))
        .with_hue(HueCycle {
            rate: 0.2,
            per_phase: 0.1,
            saturation: 1.0,
            lightness: 0.6,
        });
    let mut table = SceneTable::new("rainbow-particles").seeded(seed);
    for i in 0..30 {
        table.push(
            ObjectDescriptor::new("sphere", "flat")
                .scattered(Scatter {
                    extent: 8.0,
                    scale: Some((0.1, 0.4)),
                })
                .with_color(COLOR, hsl(i as f32 / 30.0, 1.0, 0.5))
                .with_motion(motion),
        );
    }
    table
}

pub fn rainbow_beams() -> SceneTable {
    let motion = MotionRule::STATIC
        .with_spin(
            Spin::new(Vec3::new(0.0, 0.5, 0.0), Drive::Fixed)
                .offset_per_phase(Vec3::new(0.0, 0.1, 0.0))
                .swaying(
                    [Wave::NONE, Wave::NONE, Wave::sin(0.1, 2.0)],
                    PhaseSource::Index(Vec3::ONE),
                ),
        )
        .with_pulse(Pulse::relative(Wave::sin(0.2, 3.0), Drive::Fixed).phased(0.5))
        .with_hue(HueCycle {
            rate: 0.3,
            per_phase: 0.1,
            saturation: 1.0,
            lightness: 0.7,
        });
    let n = 16;
    let mut table = SceneTable::new("rainbow-beams");
    for i in 0..n {
        let (x, y) = ring_point(i, n, 2.0);
        table.push(
            ObjectDescriptor::new("box", "flat")
                .at(x, y, 0.0)
                .scaled(Vec3::new(0.05, 3.0, 0.05))
                .with_color(COLOR, hsl(i as f32 / n as f32, 1.0, 0.5))
                .with_motion(motion),
        );
    }
    table
}

pub fn matrix_rain() -> SceneTable {
    SceneTable::new("matrix-rain").with(
        ObjectDescriptor::new("plane", "matrix")
            .at(0.0, 0.0, -5.0)
            .scaled(Vec3::new(10.0, 10.0, 1.0)),
    )
}

pub fn data_streams() -> SceneTable {
    let motion = MotionRule::STATIC
        .with_spin(Spin::STILL.swaying(
            [Wave::NONE, Wave::NONE, Wave::sin(0.1, 1.5)],
            PhaseSource::Index(Vec3::splat(0.3)),
        ))
        .with_drift(Drift::bob(
            Wave::sin(2.0, 2.0),
            PhaseSource::Index(Vec3::splat(0.5)),
        ))
        .with_hue(HueCycle {
            rate: 0.1,
            per_phase: 0.2,
            saturation: 1.0,
            lightness: 0.5,
        });
    let n = 12;
    let mut table = SceneTable::new("data-streams");
    for i in 0..n {
        let (x, y) = ring_point(i, n, 3.0);
        table.push(
            ObjectDescriptor::new("box", "flat")
                .at(x, y, -2.0)
                .scaled(Vec3::new(0.1, 3.0, 0.1))
                .with_color(COLOR, hsl(i as f32 / n as f32, 1.0, 0.5))
                .with_motion(motion),
        );
    }
    table
}

fn bar_row(name: &str, n: usize, spacing: f32, scale: Vec3, opacity: f32) -> SceneTable {
    let offset = spacing * n as f32 / 2.0 - spacing / 2.0;
    let mut table = SceneTable::new(name);
    for i in 0..n {
        table.push(
            ObjectDescriptor::new("box", "flat")
                .at(i as f32 * spacing - offset, 0.0, 0.0)
                .scaled(scale)
                .with_color(COLOR, hsl(i as f32 / n as f32, 1.0, 0.5))
                .with_uniform(OPACITY, UniformValue::Float(opacity))
                .with_motion(MotionRule::STATIC),
        );
    }
    table
}

/// 64 thin bars for [`ReactiveStyle::Waves`](crate::audio::ReactiveStyle::Waves).
pub fn sound_waves() -> SceneTable {
    let mut table = bar_row("sound-waves", 64, 0.1, Vec3::new(0.05, 0.1, 0.05), 0.8);
    // the site's row starts at -3.2 rather than being centred
    for (i, entry) in table.entries.iter_mut().enumerate() {
        entry.position.x = i as f32 * 0.1 - 3.2;
    }
    table
}

/// 32 bars for [`ReactiveStyle::Bars`](crate::audio::ReactiveStyle::Bars).
pub fn audio_visualizer() -> SceneTable {
    bar_row("audio-visualizer", 32, 0.2, Vec3::splat(0.1), 0.7)
}

/// 20 scattered spheres for [`ReactiveStyle::Pulse`](crate::audio::ReactiveStyle::Pulse).
pub fn beat_particles(seed: u64) -> SceneTable {
    let mut table = SceneTable::new("beat-particles").seeded(seed);
    for _ in 0..20 {
        table.push(
            ObjectDescriptor::new("sphere", "flat")
                .uniform_scale(0.1)
                .scattered(Scatter {
                    extent: 6.0,
                    scale: None,
                })
                .with_motion(MotionRule::STATIC),
        );
    }
    table
}
