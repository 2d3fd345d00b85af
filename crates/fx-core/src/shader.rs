//! Shader program registry.
//!
//! Every program pairs a set of declared uniform slots with two closed-form
//! functions: a vertex displacement evaluated per vertex and a fragment colour
//! evaluated per surface point. The built-in variants are selected through
//! [`ShaderKind`]; each one also bundles the WGSL source an external renderer
//! compiles, while the Rust functions serve as the CPU reference used by
//! tooling and tests.

use crate::color::{edge_distance, hex, mix, smoothstep};
use crate::error::ConfigError;
use crate::uniforms::{
    UniformSet, UniformSlot, UniformValue, COLOR, COLOR1, COLOR2, COLOR3, GLOW_COLOR, INTENSITY,
    OPACITY, SPEED, TIME,
};
use fnv::FnvHashMap;
use glam::{Vec2, Vec3, Vec4};
use std::fmt;
use std::str::FromStr;

// WGSL sources bundled as string constants
pub static NEBULA_WGSL: &str = include_str!("../shaders/nebula.wgsl");
pub static HOLOGRAPHIC_WGSL: &str = include_str!("../shaders/holographic.wgsl");
pub static LIQUID_WGSL: &str = include_str!("../shaders/liquid.wgsl");
pub static NEON_WGSL: &str = include_str!("../shaders/neon.wgsl");
pub static PORTAL_WGSL: &str = include_str!("../shaders/portal.wgsl");
pub static QUANTUM_WGSL: &str = include_str!("../shaders/quantum.wgsl");
pub static MATRIX_WGSL: &str = include_str!("../shaders/matrix.wgsl");
pub static RAINBOW_WGSL: &str = include_str!("../shaders/rainbow.wgsl");
pub static MORPHING_WGSL: &str = include_str!("../shaders/morphing.wgsl");
pub static FLAT_WGSL: &str = include_str!("../shaders/flat.wgsl");

/// Object-space vertex fed to a vertex function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

/// Displaces one vertex at time `t`.
pub type VertexFn = fn(Vertex, f32, &UniformSet) -> Vec3;
/// Colours one surface point (`uv` in [0, 1]²) at time `t`, returning RGBA.
pub type FragmentFn = fn(Vec2, f32, &UniformSet) -> Vec4;

/// Built-in shader variants. All share the same contract shape and differ
/// only in their displacement and colour formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Nebula,
    Holographic,
    Liquid,
    Neon,
    Portal,
    Quantum,
    Matrix,
    Rainbow,
    Morphing,
    Flat,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 10] = [
        ShaderKind::Nebula,
        ShaderKind::Holographic,
        ShaderKind::Liquid,
        ShaderKind::Neon,
        ShaderKind::Portal,
        ShaderKind::Quantum,
        ShaderKind::Matrix,
        ShaderKind::Rainbow,
        ShaderKind::Morphing,
        ShaderKind::Flat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderKind::Nebula => "nebula",
            ShaderKind::Holographic => "holographic",
            ShaderKind::Liquid => "liquid",
            ShaderKind::Neon => "neon",
            ShaderKind::Portal => "portal",
            ShaderKind::Quantum => "quantum",
            ShaderKind::Matrix => "matrix",
            ShaderKind::Rainbow => "rainbow",
            ShaderKind::Morphing => "morphing",
            ShaderKind::Flat => "flat",
        }
    }

    /// Declared uniforms with their defaults (palettes from the site's materials).
    pub fn slots(self) -> Vec<UniformSlot> {
        match self {
            ShaderKind::Nebula => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0xff0080)),
                UniformSlot::color(COLOR2, hex(0x8000ff)),
                UniformSlot::color(COLOR3, hex(0x0080ff)),
                UniformSlot::float(INTENSITY, 1.0),
            ],
            ShaderKind::Holographic => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0x00ffff)),
                UniformSlot::color(COLOR2, hex(0xff00ff)),
                UniformSlot::color(COLOR3, hex(0xffff00)),
                UniformSlot::float(OPACITY, 0.8),
            ],
            ShaderKind::Liquid => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0x667eea)),
                UniformSlot::color(COLOR2, hex(0x764ba2)),
                UniformSlot::color(COLOR3, hex(0xfbbf24)),
                UniformSlot::float(SPEED, 1.0),
            ],
            ShaderKind::Neon => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR, hex(0x00ffff)),
                UniformSlot::color(GLOW_COLOR, hex(0x0080ff)),
                UniformSlot::float(INTENSITY, 1.0),
            ],
            ShaderKind::Portal => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0xff0080)),
                UniformSlot::color(COLOR2, hex(0x8000ff)),
                UniformSlot::color(COLOR3, hex(0x0080ff)),
                UniformSlot::float(INTENSITY, 1.0),
            ],
            ShaderKind::Quantum => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0xff00ff)),
                UniformSlot::color(COLOR2, hex(0x00ffff)),
                UniformSlot::color(COLOR3, hex(0xffff00)),
                UniformSlot::float(INTENSITY, 1.0),
            ],
            ShaderKind::Matrix => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR, hex(0x00ff00)),
            ],
            ShaderKind::Rainbow => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::float(SPEED, 1.0),
            ],
            ShaderKind::Morphing => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR1, hex(0x667eea)),
                UniformSlot::color(COLOR2, hex(0x764ba2)),
                UniformSlot::color(COLOR3, hex(0xfbbf24)),
            ],
            ShaderKind::Flat => vec![
                UniformSlot::float(TIME, 0.0),
                UniformSlot::color(COLOR, Vec3::ONE),
                UniformSlot::float(OPACITY, 0.8),
            ],
        }
    }

    pub fn vertex(self) -> VertexFn {
        match self {
            ShaderKind::Nebula => nebula_vertex,
            ShaderKind::Holographic => holographic_vertex,
            ShaderKind::Liquid => liquid_vertex,
            ShaderKind::Neon => neon_vertex,
            ShaderKind::Portal => portal_vertex,
            ShaderKind::Quantum => quantum_vertex,
            ShaderKind::Matrix => matrix_vertex,
            ShaderKind::Rainbow => rainbow_vertex,
            ShaderKind::Morphing => morphing_vertex,
            ShaderKind::Flat => flat_vertex,
        }
    }

    pub fn fragment(self) -> FragmentFn {
        match self {
            ShaderKind::Nebula => nebula_fragment,
            ShaderKind::Holographic => holographic_fragment,
            ShaderKind::Liquid => liquid_fragment,
            ShaderKind::Neon => neon_fragment,
            ShaderKind::Portal => portal_fragment,
            ShaderKind::Quantum => quantum_fragment,
            ShaderKind::Matrix => matrix_fragment,
            ShaderKind::Rainbow => rainbow_fragment,
            ShaderKind::Morphing => morphing_fragment,
            ShaderKind::Flat => flat_fragment,
        }
    }

    pub fn wgsl(self) -> &'static str {
        match self {
            ShaderKind::Nebula => NEBULA_WGSL,
            ShaderKind::Holographic => HOLOGRAPHIC_WGSL,
            ShaderKind::Liquid => LIQUID_WGSL,
            ShaderKind::Neon => NEON_WGSL,
            ShaderKind::Portal => PORTAL_WGSL,
            ShaderKind::Quantum => QUANTUM_WGSL,
            ShaderKind::Matrix => MATRIX_WGSL,
            ShaderKind::Rainbow => RAINBOW_WGSL,
            ShaderKind::Morphing => MORPHING_WGSL,
            ShaderKind::Flat => FLAT_WGSL,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShaderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShaderKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownShader(s.to_string()))
    }
}

/// Index of a program inside its [`ShaderRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle(u16);

impl ShaderHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An immutable, validated shader program.
#[derive(Clone, Debug)]
pub struct ShaderProgram {
    name: String,
    kind: Option<ShaderKind>,
    slots: Vec<UniformSlot>,
    vertex: VertexFn,
    fragment: FragmentFn,
}

impl ShaderProgram {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Built-in variant this program was defined from, if any.
    pub fn kind(&self) -> Option<ShaderKind> {
        self.kind
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// Fresh uniform set holding every declared default.
    pub fn default_uniforms(&self) -> UniformSet {
        UniformSet::from_slots(&self.slots)
    }

    #[inline]
    pub fn displace(&self, vertex: Vertex, time: f32, uniforms: &UniformSet) -> Vec3 {
        (self.vertex)(vertex, time, uniforms)
    }

    #[inline]
    pub fn shade(&self, uv: Vec2, time: f32, uniforms: &UniformSet) -> Vec4 {
        (self.fragment)(uv, time, uniforms)
    }
}

/// Named collection of shader programs. Definitions are validated once and
/// never change afterwards.
#[derive(Default)]
pub struct ShaderRegistry {
    programs: Vec<ShaderProgram>,
    by_name: FnvHashMap<String, ShaderHandle>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every [`ShaderKind`] under its canonical name.
    pub fn with_builtins() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for kind in ShaderKind::ALL {
            registry.define_builtin(kind)?;
        }
        Ok(registry)
    }

    /// Define a named program. Every program must declare a float `time`
    /// slot and slot names must be unique.
    pub fn define(
        &mut self,
        name: &str,
        uniform_defaults: &[UniformSlot],
        vertex: VertexFn,
        fragment: FragmentFn,
    ) -> Result<ShaderHandle, ConfigError> {
        self.insert(name, None, uniform_defaults.to_vec(), vertex, fragment)
    }

    pub fn define_builtin(&mut self, kind: ShaderKind) -> Result<ShaderHandle, ConfigError> {
        self.insert(
            kind.name(),
            Some(kind),
            kind.slots(),
            kind.vertex(),
            kind.fragment(),
        )
    }

    fn insert(
        &mut self,
        name: &str,
        kind: Option<ShaderKind>,
        slots: Vec<UniformSlot>,
        vertex: VertexFn,
        fragment: FragmentFn,
    ) -> Result<ShaderHandle, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyProgramName);
        }
        if self.programs.len() > u16::MAX as usize {
            return Err(ConfigError::TooManyPrograms(self.programs.len()));
        }
        let key = name.to_ascii_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(ConfigError::DuplicateProgram(name.to_string()));
        }
        for (i, slot) in slots.iter().enumerate() {
            if slots[..i].iter().any(|s| s.name == slot.name) {
                return Err(ConfigError::DuplicateUniform {
                    shader: name.to_string(),
                    uniform: slot.name.to_string(),
                });
            }
        }
        let has_time = slots
            .iter()
            .any(|s| s.name == TIME && matches!(s.default, UniformValue::Float(_)));
        if !has_time {
            return Err(ConfigError::MissingTimeUniform(name.to_string()));
        }
        let handle = ShaderHandle(self.programs.len() as u16);
        self.programs.push(ShaderProgram {
            name: name.to_string(),
            kind,
            slots,
            vertex,
            fragment,
        });
        self.by_name.insert(key, handle);
        Ok(handle)
    }

    pub fn lookup(&self, name: &str) -> Option<ShaderHandle> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Like [`lookup`](Self::lookup) but reports an unknown name as a config error.
    pub fn resolve(&self, name: &str) -> Result<ShaderHandle, ConfigError> {
        self.lookup(name)
            .ok_or_else(|| ConfigError::UnknownShader(name.to_string()))
    }

    /// `None` for a handle issued by a different registry.
    pub fn program(&self, handle: ShaderHandle) -> Option<&ShaderProgram> {
        self.programs.get(handle.index())
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderHandle, &ShaderProgram)> {
        self.programs
            .iter()
            .enumerate()
            .map(|(i, p)| (ShaderHandle(i as u16), p))
    }
}

// --- reference implementations ---
// Displacements are applied component by component, so later axes see the
// already-displaced earlier ones.

#[inline]
fn wave01(x: f32) -> f32 {
    x * 0.5 + 0.5
}

#[inline]
fn edge_glow(uv: Vec2, width: f32) -> f32 {
    1.0 - smoothstep(0.0, width, edge_distance(uv.x, uv.y))
}

fn three_tone(u: &UniformSet, a: f32, b: f32) -> Vec3 {
    let c = mix(u.color(COLOR1), u.color(COLOR2), a);
    mix(c, u.color(COLOR3), b)
}

fn nebula_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    let i = u.float(INTENSITY);
    let p = v.position;
    p + Vec3::new(
        (p.x * 2.0 + t * 0.5).sin() * 0.3,
        (p.y * 2.0 + t * 0.3).cos() * 0.3,
        (p.z * 2.0 + t * 0.4).sin() * 0.3,
    ) * i
}

fn nebula_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let n1 = wave01((uv.x * 3.0 + t * 0.5).sin());
    let n2 = wave01((uv.y * 3.0 + t * 0.3).cos());
    let mut c = three_tone(u, n1, n2);
    c *= (uv.x * 10.0 + t * 2.0).sin() * 0.1 + 0.9;
    c *= (uv.x * 20.0 + t * 3.0).sin() * 0.05 + 0.95;
    c *= edge_glow(uv, 0.3);
    c.extend(0.6)
}

fn holographic_vertex(v: Vertex, t: f32, _u: &UniformSet) -> Vec3 {
    let mut p = v.position;
    p.x += (p.y * 5.0 + t * 3.0).sin() * 0.05;
    p.y += (p.x * 5.0 + t * 2.0).cos() * 0.05;
    p.z += (p.x * 3.0 + p.y * 3.0 + t * 1.5).sin() * 0.1;
    p
}

fn holographic_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let scanline = (uv.y * 100.0 + t * 10.0).sin() * 0.02 + 0.98;
    let hue_shift = wave01((t * 2.0 + uv.x * 10.0).sin());
    let mut c = three_tone(u, hue_shift, wave01((t * 1.5 + uv.y * 8.0).sin()));
    if (t * 20.0 + uv.x * 50.0).sin() >= 0.98 {
        c.x += 1.0;
    }
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.3);
    c *= scanline;
    c.extend(u.float(OPACITY))
}

fn liquid_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    let ts = t * u.float(SPEED);
    let o = v.position;
    let mut p = o + Vec3::new(
        (o.x * 4.0 + ts).sin() * 0.1,
        (o.y * 4.0 + ts * 0.8).cos() * 0.1,
        (o.z * 4.0 + ts * 0.6).sin() * 0.1,
    );
    p.x += (p.y * 2.0 + p.z * 2.0 + ts * 1.5).sin() * 0.05;
    p.y += (p.x * 2.0 + p.z * 2.0 + ts * 1.2).cos() * 0.05;
    p.z += (p.x * 2.0 + p.y * 2.0 + ts * 1.8).sin() * 0.05;
    p
}

fn liquid_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let ts = t * u.float(SPEED);
    let f1 = wave01((uv.x * 8.0 + ts * 2.0).sin());
    let f2 = wave01((uv.y * 8.0 + ts * 1.5).cos());
    let mut c = three_tone(u, f1, f2);
    c *= (uv.x * 20.0 + ts * 5.0).sin() * 0.02 + 0.98;
    c *= (uv.x * 15.0 + ts * 3.0).sin() * (uv.y * 15.0 + ts * 2.5).cos() * 0.1 + 0.9;
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.3);
    c.extend(0.9)
}

fn neon_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    v.position + v.normal * ((t * 2.0).sin() * 0.01 * u.float(INTENSITY))
}

fn neon_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let pulse = (t * 3.0).sin() * 0.3 + 0.7;
    let glow = edge_glow(uv, 0.1) * pulse * u.float(INTENSITY);
    let inner = edge_glow(uv, 0.3);
    let mut c = mix(u.color(COLOR), u.color(GLOW_COLOR), glow);
    c += Vec3::splat(inner * 0.5);
    c *= (uv.y * 50.0 + t * 10.0).sin() * 0.02 + 0.98;
    c.extend(glow)
}

fn portal_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    let i = u.float(INTENSITY);
    let o = v.position;
    let p = o + Vec3::new(
        (o.x * 6.0 + t * 2.5).sin() * 0.2,
        (o.y * 6.0 + t * 2.0).cos() * 0.2,
        (o.z * 6.0 + t * 1.8).sin() * 0.2,
    ) * i;
    p + v.normal * ((t * 4.0 + p.x * 3.0).sin() * 0.1 * i)
}

fn portal_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let d = uv - Vec2::splat(0.5);
    let distance = d.length();
    let angle = d.y.atan2(d.x);
    let spiral = wave01((angle * 8.0 + t * 3.0 + distance * 10.0).sin());
    let mut c = three_tone(u, spiral, wave01((angle * 4.0 + t * 2.0).sin()));
    c *= (distance * 20.0 + t * 5.0).sin() * 0.1 + 0.9;
    c += Vec3::splat((1.0 - smoothstep(0.0, 0.5, distance)) * 0.3);
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.2);
    c.extend(0.9)
}

fn quantum_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    let f = u.float(INTENSITY);
    let o = v.position;
    let p = o + Vec3::new(
        (o.x * 8.0 + t * 2.0).sin() * 0.1,
        (o.y * 8.0 + t * 1.5).cos() * 0.1,
        (o.z * 8.0 + t * 1.8).sin() * 0.1,
    ) * f;
    p + v.normal * ((t * 3.0 + p.x * 5.0).sin() * 0.05 * f)
}

fn quantum_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let i1 = wave01((uv.x * 20.0 + t * 3.0).sin());
    let i2 = wave01((uv.y * 20.0 + t * 2.5).cos());
    let mut c = three_tone(u, i1, i2);
    c *= (uv.x * 30.0 + t * 5.0).sin() * 0.1 + 0.9;
    c *= (uv.x * 10.0 + t * 2.0).sin() * (uv.y * 10.0 + t * 1.5).cos() * 0.2 + 0.8;
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.4);
    c.extend(0.9)
}

fn matrix_vertex(v: Vertex, t: f32, _u: &UniformSet) -> Vec3 {
    let mut p = v.position;
    p.y = (p.y + t * 2.0).rem_euclid(10.0) - 5.0;
    p
}

fn matrix_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let glyph = wave01((uv.x * 20.0 + t * 5.0).sin()) * wave01((uv.y * 30.0 + t * 8.0).sin());
    let fall = if (uv.y * 10.0 + t * 3.0).sin() >= 0.0 {
        1.0
    } else {
        0.0
    };
    let fade = 1.0 - smoothstep(0.0, 1.0, uv.y);
    let c = u.color(COLOR) * glyph * fall * fade;
    c.extend(c.y)
}

fn rainbow_vertex(v: Vertex, t: f32, u: &UniformSet) -> Vec3 {
    let ts = t * u.float(SPEED);
    let mut p = v.position;
    p.x += (p.y * 3.0 + ts).sin() * 0.1;
    p.y += (p.x * 3.0 + ts * 0.8).cos() * 0.1;
    p.z += (p.x * 2.0 + p.y * 2.0 + ts * 0.6).sin() * 0.2;
    p
}

fn rainbow_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let ts = t * u.float(SPEED);
    let hue = ((uv.x + uv.y + ts * 0.5) * 0.5).rem_euclid(1.0);
    let mut c = Vec3::new(
        (3.0 * hue - 1.5).abs() - 0.5,
        1.0 - (3.0 * hue - 1.0).abs(),
        1.0 - (3.0 * hue - 2.0).abs(),
    );
    c *= (ts * 2.0).sin() * 0.3 + 0.7;
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.5);
    c.extend(0.8)
}

fn morphing_vertex(v: Vertex, t: f32, _u: &UniformSet) -> Vec3 {
    let mut p = v.position;
    p.x += (p.y * 3.0 + t * 2.0).sin() * 0.1;
    p.y += (p.x * 3.0 + t * 1.5).cos() * 0.1;
    p.z += (p.x * 2.0 + p.y * 2.0 + t).sin() * 0.2;
    p
}

fn morphing_fragment(uv: Vec2, t: f32, u: &UniformSet) -> Vec4 {
    let n1 = wave01((uv.x * 10.0 + t * 2.0).sin());
    let n2 = wave01((uv.y * 8.0 + t * 1.5).sin());
    let mut c = three_tone(u, n1, n2);
    c *= (uv.x * 20.0 + t * 5.0).sin() * 0.1 + 0.9;
    c += Vec3::splat(edge_glow(uv, 0.1) * 0.5);
    c.extend(0.8)
}

fn flat_vertex(v: Vertex, _t: f32, _u: &UniformSet) -> Vec3 {
    v.position
}

fn flat_fragment(_uv: Vec2, _t: f32, u: &UniformSet) -> Vec4 {
    u.color(COLOR).extend(u.float(OPACITY))
}
