//! Closed-form motion rules.
//!
//! A rule maps (elapsed time, per-object parameters) to a rotation, a scale, a
//! position offset and optionally a hue. Nothing here accumulates: evaluating a
//! rule at `t` never depends on earlier evaluations.

use crate::color::hsl;
use crate::object::GeometryKind;
use crate::shader::ShaderKind;
use glam::Vec3;

/// Per-object animation parameters fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimParams {
    pub speed: f32,
    pub intensity: f32,
    /// Phase offset derived from the object's index in its group.
    pub phase: f32,
}

impl Default for AnimParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            intensity: 1.0,
            phase: 0.0,
        }
    }
}

/// Which per-object parameter multiplies a rate or amplitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Drive {
    #[default]
    Fixed,
    Speed,
    Intensity,
}

impl Drive {
    #[inline]
    pub fn factor(self, params: &AnimParams) -> f32 {
        match self {
            Drive::Fixed => 1.0,
            Drive::Speed => params.speed,
            Drive::Intensity => params.intensity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveShape {
    Sin,
    Cos,
}

/// `amplitude · shape(frequency · t + phase)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
    pub shape: WaveShape,
}

impl Wave {
    pub const NONE: Wave = Wave::sin(0.0, 0.0);

    pub const fn sin(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase: 0.0,
            shape: WaveShape::Sin,
        }
    }

    pub const fn cos(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase: 0.0,
            shape: WaveShape::Cos,
        }
    }

    #[inline]
    pub fn sample(&self, t: f32, extra_phase: f32) -> f32 {
        if self.amplitude == 0.0 {
            return 0.0;
        }
        let x = self.frequency * t + self.phase + extra_phase;
        self.amplitude
            * match self.shape {
                WaveShape::Sin => x.sin(),
                WaveShape::Cos => x.cos(),
            }
    }
}

/// Where the per-axis phase offset of a drift or sway comes from.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum PhaseSource {
    #[default]
    None,
    /// The base X coordinate, shared by every axis.
    BaseX,
    /// Each axis uses its own base coordinate.
    BaseAxis,
    /// `k · phase` per axis, where phase is derived from the object index.
    Index(Vec3),
}

impl PhaseSource {
    #[inline]
    fn offset(self, axis: usize, base: Vec3, params: &AnimParams) -> f32 {
        match self {
            PhaseSource::None => 0.0,
            PhaseSource::BaseX => base.x,
            PhaseSource::BaseAxis => base[axis],
            PhaseSource::Index(k) => k[axis] * params.phase,
        }
    }
}

/// Rotation as a linear function of time plus an optional sinusoidal sway.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    /// Radians per second around X, Y, Z.
    pub rates: Vec3,
    /// Constant offset per unit of phase.
    pub per_phase: Vec3,
    pub drive: Drive,
    pub sway: [Wave; 3],
    pub sway_phase: PhaseSource,
}

impl Spin {
    pub const STILL: Spin = Spin::new(Vec3::ZERO, Drive::Fixed);

    pub const fn new(rates: Vec3, drive: Drive) -> Self {
        Self {
            rates,
            per_phase: Vec3::ZERO,
            drive,
            sway: [Wave::NONE; 3],
            sway_phase: PhaseSource::None,
        }
    }

    pub const fn offset_per_phase(mut self, per_phase: Vec3) -> Self {
        self.per_phase = per_phase;
        self
    }

    pub const fn swaying(mut self, sway: [Wave; 3], phase: PhaseSource) -> Self {
        self.sway = sway;
        self.sway_phase = phase;
        self
    }

    pub fn rotation(&self, t: f32, base: Vec3, params: &AnimParams) -> Vec3 {
        let mut r = self.rates * (t * self.drive.factor(params)) + self.per_phase * params.phase;
        for (axis, w) in self.sway.iter().enumerate() {
            r[axis] += w.sample(t, self.sway_phase.offset(axis, base, params));
        }
        r
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleMode {
    /// `base + osc`
    Additive,
    /// `base · (1 + osc)`
    Relative,
}

/// Scale oscillation `base ⊕ A·(w0(t·r) + w1(t·r))` with `A` and `r` taken from
/// the object's drive parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub mode: ScaleMode,
    pub waves: [Wave; 2],
    pub amplitude: Drive,
    pub rate: Drive,
    /// Phase added per unit of object phase.
    pub per_phase: f32,
}

impl Pulse {
    pub const fn additive(a: Wave, b: Wave, rate: Drive) -> Self {
        Self {
            mode: ScaleMode::Additive,
            waves: [a, b],
            amplitude: Drive::Fixed,
            rate,
            per_phase: 0.0,
        }
    }

    pub const fn relative(a: Wave, amplitude: Drive) -> Self {
        Self {
            mode: ScaleMode::Relative,
            waves: [a, Wave::NONE],
            amplitude,
            rate: Drive::Fixed,
            per_phase: 0.0,
        }
    }

    pub const fn phased(mut self, per_phase: f32) -> Self {
        self.per_phase = per_phase;
        self
    }

    pub const fn with_amplitude(mut self, amplitude: Drive) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Raw oscillation term before it is combined with the base scale.
    pub fn oscillation(&self, t: f32, params: &AnimParams) -> f32 {
        let tr = t * self.rate.factor(params);
        let shift = self.per_phase * params.phase;
        let osc = self.waves[0].sample(tr, shift) + self.waves[1].sample(tr, shift);
        osc * self.amplitude.factor(params)
    }

    /// Largest possible |oscillation| for these parameters.
    pub fn bound(&self, params: &AnimParams) -> f32 {
        (self.waves[0].amplitude.abs() + self.waves[1].amplitude.abs())
            * self.amplitude.factor(params).abs()
    }

    pub fn apply(&self, base: Vec3, t: f32, params: &AnimParams) -> Vec3 {
        let osc = self.oscillation(t, params);
        match self.mode {
            ScaleMode::Additive => base + Vec3::splat(osc),
            ScaleMode::Relative => base * (1.0 + osc),
        }
    }
}

/// Position offset from the base position, one wave per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drift {
    pub axes: [Wave; 3],
    pub phase: PhaseSource,
    pub amplitude: Drive,
    pub rate: Drive,
}

impl Drift {
    /// Vertical bob only.
    pub const fn bob(wave: Wave, phase: PhaseSource) -> Self {
        Self {
            axes: [Wave::NONE, wave, Wave::NONE],
            phase,
            amplitude: Drive::Fixed,
            rate: Drive::Fixed,
        }
    }

    pub const fn axes(axes: [Wave; 3], phase: PhaseSource) -> Self {
        Self {
            axes,
            phase,
            amplitude: Drive::Fixed,
            rate: Drive::Fixed,
        }
    }

    pub const fn driven(mut self, amplitude: Drive, rate: Drive) -> Self {
        self.amplitude = amplitude;
        self.rate = rate;
        self
    }

    pub fn offset(&self, base: Vec3, t: f32, params: &AnimParams) -> Vec3 {
        let tr = t * self.rate.factor(params);
        let amp = self.amplitude.factor(params);
        let mut out = Vec3::ZERO;
        for (axis, w) in self.axes.iter().enumerate() {
            out[axis] = w.sample(tr, self.phase.offset(axis, base, params)) * amp;
        }
        out
    }
}

/// `hue = (rate · t + per_phase · phase) mod 1`, written into the `color` uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HueCycle {
    pub rate: f32,
    pub per_phase: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl HueCycle {
    pub fn color(&self, t: f32, params: &AnimParams) -> Vec3 {
        let hue = (self.rate * t + self.per_phase * params.phase).rem_euclid(1.0);
        hsl(hue, self.saturation, self.lightness)
    }
}

/// Full per-object update rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionRule {
    pub spin: Spin,
    pub pulse: Option<Pulse>,
    pub drift: Option<Drift>,
    pub hue: Option<HueCycle>,
}

impl Default for MotionRule {
    fn default() -> Self {
        Self::spin(Vec3::new(0.1, 0.15, 0.05), Drive::Speed)
    }
}

impl MotionRule {
    pub const STATIC: MotionRule = MotionRule {
        spin: Spin::STILL,
        pulse: None,
        drift: None,
        hue: None,
    };

    pub const fn spin(rates: Vec3, drive: Drive) -> Self {
        Self {
            spin: Spin::new(rates, drive),
            pulse: None,
            drift: None,
            hue: None,
        }
    }

    pub const fn with_pulse(mut self, pulse: Pulse) -> Self {
        self.pulse = Some(pulse);
        self
    }

    pub const fn with_drift(mut self, drift: Drift) -> Self {
        self.drift = Some(drift);
        self
    }

    pub const fn with_hue(mut self, hue: HueCycle) -> Self {
        self.hue = Some(hue);
        self
    }

    pub const fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = spin;
        self
    }

    /// Default rule for a shader/geometry pairing as used by the site's layers.
    pub fn for_variant(shader: Option<ShaderKind>, geometry: GeometryKind) -> MotionRule {
        use Drive::{Fixed, Intensity, Speed};
        use GeometryKind as G;
        use ShaderKind as S;

        let Some(shader) = shader else {
            return MotionRule::default();
        };
        match (shader, geometry) {
            (S::Liquid, G::Box) => MotionRule::spin(Vec3::new(0.2, 0.25, 0.1), Speed)
                .with_pulse(Pulse::additive(
                    Wave::sin(0.08, 1.5),
                    Wave::cos(0.04, 0.9),
                    Speed,
                ))
                .with_drift(
                    Drift::bob(Wave::sin(0.15, 0.8), PhaseSource::BaseX).driven(Fixed, Speed),
                ),
            (S::Liquid, G::Torus) => MotionRule::spin(Vec3::new(0.15, 0.3, 0.08), Speed)
                .with_pulse(Pulse::additive(
                    Wave::sin(0.06, 1.2),
                    Wave::cos(0.03, 0.8),
                    Speed,
                ))
                .with_drift(
                    Drift::bob(Wave::sin(0.1, 0.6), PhaseSource::BaseX).driven(Fixed, Speed),
                ),
            (S::Liquid, _) => MotionRule::liquid_blob(),
            (S::Nebula, _) => MotionRule::spin(Vec3::new(0.1, 0.15, 0.05), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.1, 0.5), Intensity)),
            (S::Holographic, G::Box) => MotionRule::spin(Vec3::new(0.4, 0.3, 0.2), Fixed),
            (S::Holographic, G::Torus) => MotionRule::spin(Vec3::new(0.2, 0.4, 0.0), Fixed),
            (S::Holographic, _) => MotionRule::spin(Vec3::new(0.0, 0.5, 0.0), Fixed)
                .with_drift(Drift::bob(Wave::sin(0.2, 2.0), PhaseSource::None)),
            (S::Neon, G::Sphere) => MotionRule::spin(Vec3::new(0.15, 0.25, 0.0), Fixed)
                .with_drift(Drift::bob(Wave::sin(0.1, 1.0), PhaseSource::BaseX)),
            (S::Neon, G::Torus) => MotionRule::spin(Vec3::new(0.1, 0.4, 0.05), Fixed),
            (S::Neon, G::Plane) => MotionRule::spin(Vec3::new(0.0, 0.1, 0.0), Fixed)
                .with_drift(Drift::bob(Wave::sin(0.05, 2.0), PhaseSource::None)),
            (S::Neon, _) => MotionRule::spin(Vec3::new(0.2, 0.3, 0.1), Fixed),
            (S::Portal, G::Torus) => MotionRule::spin(Vec3::new(0.2, 0.4, 0.1), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.15, 2.5), Intensity)),
            (S::Portal, G::Sphere) => MotionRule::spin(Vec3::new(0.25, 0.35, 0.15), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.12, 1.8), Intensity))
                .with_drift(
                    Drift::bob(Wave::sin(0.15, 1.2), PhaseSource::None).driven(Intensity, Fixed),
                ),
            (S::Portal, _) => MotionRule::spin(Vec3::new(0.3, 0.5, 0.2), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.1, 2.0), Intensity))
                .with_drift(
                    Drift::bob(Wave::sin(0.2, 1.5), PhaseSource::None).driven(Intensity, Fixed),
                ),
            (S::Quantum, G::Box) => MotionRule::spin(Vec3::new(0.3, 0.4, 0.2), Intensity)
                .with_pulse(
                    Pulse::additive(Wave::sin(0.1, 2.0), Wave::cos(0.05, 1.5), Fixed)
                        .with_amplitude(Intensity),
                )
                .with_drift(
                    Drift::axes(
                        [Wave::sin(0.2, 1.5), Wave::cos(0.2, 1.2), Wave::sin(0.2, 1.8)],
                        PhaseSource::None,
                    )
                    .driven(Intensity, Fixed),
                ),
            (S::Quantum, G::Torus) => MotionRule::spin(Vec3::new(0.2, 0.5, 0.1), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.15, 2.5), Intensity))
                .with_drift(
                    Drift::bob(Wave::sin(0.3, 1.8), PhaseSource::None).driven(Intensity, Fixed),
                ),
            (S::Quantum, _) => MotionRule::spin(Vec3::new(0.5, 0.3, 0.2), Intensity)
                .with_pulse(Pulse::relative(Wave::sin(0.1, 3.0), Intensity))
                .with_drift(
                    Drift::axes(
                        [Wave::sin(0.1, 2.0), Wave::cos(0.1, 1.5), Wave::sin(0.1, 1.8)],
                        PhaseSource::BaseAxis,
                    )
                    .driven(Intensity, Fixed),
                ),
            (S::Rainbow, _) => MotionRule::spin(Vec3::new(0.3, 0.2, 0.0), Speed).with_drift(
                Drift::bob(Wave::sin(0.3, 1.0), PhaseSource::BaseX).driven(Fixed, Speed),
            ),
            (S::Morphing, G::Dodecahedron) => MotionRule::spin(Vec3::new(0.1, 0.15, 0.05), Fixed)
                .with_pulse(Pulse::additive(
                    Wave::sin(0.1, 2.0),
                    Wave::cos(0.05, 1.5),
                    Fixed,
                )),
            (S::Morphing, _) => MotionRule::spin(Vec3::new(0.3, 0.2, 0.0), Fixed)
                .with_drift(Drift::bob(Wave::sin(0.3, 1.0), PhaseSource::BaseX)),
            (S::Matrix, _) => MotionRule::STATIC,
            (S::Flat, G::Points) => MotionRule::STATIC,
            (S::Flat, _) => MotionRule::default(),
        }
    }

    /// The canonical liquid blob: `scale = base + 0.1·sin(s·t) + 0.05·cos(0.7·s·t)`.
    pub const fn liquid_blob() -> MotionRule {
        MotionRule::spin(Vec3::new(0.1, 0.15, 0.05), Drive::Speed)
            .with_pulse(Pulse::additive(
                Wave::sin(0.1, 1.0),
                Wave::cos(0.05, 0.7),
                Drive::Speed,
            ))
            .with_drift(
                Drift::bob(Wave::sin(0.2, 1.0), PhaseSource::BaseX)
                    .driven(Drive::Fixed, Drive::Speed),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_pulse_scales_base() {
        let p = Pulse::relative(Wave::sin(0.1, 1.0), Drive::Intensity);
        let params = AnimParams {
            intensity: 2.0,
            ..Default::default()
        };
        let t = std::f32::consts::FRAC_PI_2;
        let s = p.apply(Vec3::splat(3.0), t, &params);
        assert!((s.x - 3.0 * 1.2).abs() < 1e-5);
    }

    #[test]
    fn index_phase_puts_neighbours_out_of_phase() {
        let d = Drift::bob(Wave::sin(1.0, 1.0), PhaseSource::Index(Vec3::splat(0.5)));
        let a = AnimParams {
            phase: 0.0,
            ..Default::default()
        };
        let b = AnimParams {
            phase: 1.0,
            ..Default::default()
        };
        let oa = d.offset(Vec3::ZERO, 1.0, &a);
        let ob = d.offset(Vec3::ZERO, 1.0, &b);
        assert!((oa.y - ob.y).abs() > 1e-3);
    }
}
