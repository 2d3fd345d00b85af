use crate::error::ConfigError;
use crate::motion::{AnimParams, MotionRule};
use crate::shader::ShaderHandle;
use crate::uniforms::{UniformSet, COLOR, INTENSITY, SPEED, TIME};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::fmt;
use std::str::FromStr;

/// Primitive a renderer draws for an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Sphere,
    Box,
    Torus,
    Plane,
    Points,
    Cylinder,
    Circle,
    Dodecahedron,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 8] = [
        GeometryKind::Sphere,
        GeometryKind::Box,
        GeometryKind::Torus,
        GeometryKind::Plane,
        GeometryKind::Points,
        GeometryKind::Cylinder,
        GeometryKind::Circle,
        GeometryKind::Dodecahedron,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Sphere => "sphere",
            GeometryKind::Box => "box",
            GeometryKind::Torus => "torus",
            GeometryKind::Plane => "plane",
            GeometryKind::Points => "points",
            GeometryKind::Cylinder => "cylinder",
            GeometryKind::Circle => "circle",
            GeometryKind::Dodecahedron => "dodecahedron",
        }
    }

    /// Stable numeric id handed to renderers.
    pub fn id(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "sphere" => GeometryKind::Sphere,
            "box" | "cube" => GeometryKind::Box,
            "torus" => GeometryKind::Torus,
            "plane" => GeometryKind::Plane,
            "points" | "point" | "particle" | "particles" => GeometryKind::Points,
            "cylinder" => GeometryKind::Cylinder,
            "circle" => GeometryKind::Circle,
            "dodecahedron" => GeometryKind::Dodecahedron,
            _ => return Err(ConfigError::UnknownGeometry(s.to_string())),
        };
        Ok(kind)
    }
}

/// Position, Euler rotation (XYZ, radians) and per-axis scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale,
        }
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// `T · R · S`
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// One visual primitive bound to a shader program.
///
/// Everything visible about an object after [`tick`](Self::tick) is a function
/// of the tick time and what was fixed at construction. The only fields that
/// change are `transform` and `uniforms`.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatedObject {
    index: usize,
    geometry: GeometryKind,
    shader: ShaderHandle,
    base: Transform,
    pub transform: Transform,
    pub uniforms: UniformSet,
    rest_uniforms: UniformSet,
    params: AnimParams,
    motion: MotionRule,
    points: Vec<Vec3>,
}

impl AnimatedObject {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        geometry: GeometryKind,
        shader: ShaderHandle,
        base: Transform,
        uniforms: UniformSet,
        params: AnimParams,
        motion: MotionRule,
        points: Vec<Vec3>,
    ) -> Self {
        Self {
            index,
            geometry,
            shader,
            base,
            transform: base,
            rest_uniforms: uniforms.clone(),
            uniforms,
            params,
            motion,
            points,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn geometry(&self) -> GeometryKind {
        self.geometry
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    /// Transform the object was constructed with.
    pub fn base(&self) -> &Transform {
        &self.base
    }

    pub fn params(&self) -> &AnimParams {
        &self.params
    }

    pub fn motion(&self) -> &MotionRule {
        &self.motion
    }

    /// Local-space positions for point-cloud geometry; empty otherwise.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Recompute transform and uniforms for elapsed time `t`.
    pub fn tick(&mut self, t: f32) {
        let p = &self.params;
        let m = &self.motion;

        self.transform.rotation = self.base.rotation + m.spin.rotation(t, self.base.position, p);
        self.transform.scale = match &m.pulse {
            Some(pulse) => pulse.apply(self.base.scale, t, p),
            None => self.base.scale,
        };
        self.transform.position = match &m.drift {
            Some(drift) => self.base.position + drift.offset(self.base.position, t, p),
            None => self.base.position,
        };

        self.uniforms.reset_from(&self.rest_uniforms);
        self.uniforms.set_float(TIME, t);
        self.uniforms.set_float(INTENSITY, p.intensity);
        self.uniforms.set_float(SPEED, p.speed);
        if let Some(hue) = &m.hue {
            self.uniforms.set_color(COLOR, hue.color(t, p));
        }
    }

    /// Uniform values the object returns to on every tick.
    pub fn rest_uniforms(&self) -> &UniformSet {
        &self.rest_uniforms
    }
}
