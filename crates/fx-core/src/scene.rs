//! Declarative scene tables and the composer that turns them into groups of
//! animated objects.

use crate::constants::SEED_MIX;
use crate::error::ConfigError;
use crate::motion::{AnimParams, MotionRule};
use crate::object::{AnimatedObject, GeometryKind, Transform};
use crate::scheduler::TimeClamp;
use crate::shader::ShaderRegistry;
use crate::uniforms::UniformValue;
use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random placement applied once at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scatter {
    /// Side of the cube (centred on the descriptor position) positions are drawn from.
    pub extent: f32,
    /// Uniform scale drawn from `[min, max)` when set.
    pub scale: Option<(f32, f32)>,
}

/// Point cloud sampled once at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointCloud {
    pub count: usize,
    pub extent: f32,
}

/// One row of a scene table.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDescriptor {
    pub geometry: String,
    pub shader: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub speed: f32,
    pub intensity: f32,
    pub uniforms: Vec<(String, UniformValue)>,
    /// Replaces the default rule for this shader/geometry pairing.
    pub motion: Option<MotionRule>,
    pub scatter: Option<Scatter>,
    pub points: Option<PointCloud>,
}

impl ObjectDescriptor {
    pub fn new(geometry: &str, shader: &str) -> Self {
        Self {
            geometry: geometry.to_string(),
            shader: shader.to_string(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            speed: 1.0,
            intensity: 1.0,
            uniforms: Vec::new(),
            motion: None,
            scatter: None,
            points: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(self, s: f32) -> Self {
        self.scaled(Vec3::splat(s))
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.uniforms.push((name.to_string(), value));
        self
    }

    pub fn with_color(self, name: &str, color: Vec3) -> Self {
        self.with_uniform(name, UniformValue::Color(color))
    }

    pub fn with_motion(mut self, motion: MotionRule) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn scattered(mut self, scatter: Scatter) -> Self {
        self.scatter = Some(scatter);
        self
    }

    pub fn point_cloud(mut self, count: usize, extent: f32) -> Self {
        self.points = Some(PointCloud { count, extent });
        self
    }
}

/// A named, ordered list of descriptors plus group-level settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneTable {
    pub name: String,
    /// Group rotation rate in radians per second around each axis.
    pub group_spin: Vec3,
    /// Seed for every random choice made while building.
    pub seed: u64,
    pub entries: Vec<ObjectDescriptor>,
}

impl SceneTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            group_spin: Vec3::ZERO,
            seed: 0,
            entries: Vec::new(),
        }
    }

    pub fn spin_y(mut self, rate: f32) -> Self {
        self.group_spin = Vec3::new(0.0, rate, 0.0);
        self
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn push(&mut self, entry: ObjectDescriptor) {
        self.entries.push(entry);
    }

    pub fn with(mut self, entry: ObjectDescriptor) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Fixed-size collection of animated objects sharing one group rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGroup {
    name: String,
    objects: Vec<AnimatedObject>,
    group_spin: Vec3,
    rotation: Vec3,
    clamp: TimeClamp,
}

impl SceneGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[AnimatedObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [AnimatedObject] {
        &mut self.objects
    }

    pub fn group_spin(&self) -> Vec3 {
        self.group_spin
    }

    /// Current group rotation (Euler XYZ, radians).
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn group_matrix(&self) -> Mat4 {
        Mat4::from_quat(Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        ))
    }

    /// Group rotation composed with the object's own `T · R · S`.
    pub fn world_matrix(&self, index: usize) -> Option<Mat4> {
        self.objects
            .get(index)
            .map(|o| self.group_matrix() * o.transform.matrix())
    }

    /// Advance the group to elapsed time `t`. Returns the time actually used
    /// after clamping.
    pub fn on_frame(&mut self, t: f32) -> f32 {
        let t = self.clamp.clamp(t);
        self.rotation = self.group_spin * t;
        for object in &mut self.objects {
            object.tick(t);
        }
        t
    }
}

/// Builds [`SceneGroup`]s against a shader registry.
pub struct SceneComposer<'a> {
    registry: &'a ShaderRegistry,
}

impl<'a> SceneComposer<'a> {
    pub fn new(registry: &'a ShaderRegistry) -> Self {
        Self { registry }
    }

    /// One object per entry, in table order. Any unresolved name or bad
    /// uniform override fails the whole build.
    pub fn build(&self, table: &SceneTable) -> Result<SceneGroup, ConfigError> {
        let mut objects = Vec::with_capacity(table.entries.len());
        for (index, entry) in table.entries.iter().enumerate() {
            objects.push(self.build_object(index, entry, table.seed)?);
        }
        log::info!(
            "[scene] built '{}' with {} objects (seed {})",
            table.name,
            objects.len(),
            table.seed
        );
        Ok(SceneGroup {
            name: table.name.clone(),
            objects,
            group_spin: table.group_spin,
            rotation: Vec3::ZERO,
            clamp: TimeClamp::default(),
        })
    }

    fn build_object(
        &self,
        index: usize,
        entry: &ObjectDescriptor,
        seed: u64,
    ) -> Result<AnimatedObject, ConfigError> {
        let geometry: GeometryKind = entry.geometry.parse()?;
        let handle = self.registry.resolve(&entry.shader)?;
        let program = self
            .registry
            .program(handle)
            .ok_or_else(|| ConfigError::UnknownShader(entry.shader.clone()))?;

        let mut uniforms = program.default_uniforms();
        for (name, value) in &entry.uniforms {
            match uniforms.get(name) {
                None => {
                    return Err(ConfigError::UnknownUniform {
                        shader: program.name().to_string(),
                        uniform: name.clone(),
                    })
                }
                Some(current) => {
                    if !uniforms.set(name, *value) {
                        return Err(ConfigError::UniformType {
                            shader: program.name().to_string(),
                            uniform: name.clone(),
                            expected: current.kind_name(),
                        });
                    }
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(SEED_MIX));
        let mut position = entry.position;
        let mut scale = entry.scale;
        if let Some(scatter) = entry.scatter {
            position += centred(&mut rng) * scatter.extent;
            if let Some((lo, hi)) = scatter.scale {
                scale = Vec3::splat(lo + rng.gen::<f32>() * (hi - lo));
            }
        }
        let points = match entry.points {
            Some(cloud) => (0..cloud.count)
                .map(|_| centred(&mut rng) * cloud.extent)
                .collect(),
            None => Vec::new(),
        };

        let motion = entry
            .motion
            .unwrap_or_else(|| MotionRule::for_variant(program.kind(), geometry));
        let base = Transform {
            position,
            rotation: entry.rotation,
            scale,
        };
        let params = AnimParams {
            speed: entry.speed,
            intensity: entry.intensity,
            phase: index as f32,
        };
        Ok(AnimatedObject::new(
            index, geometry, handle, base, uniforms, params, motion, points,
        ))
    }
}

/// Each component uniform in [-0.5, 0.5).
fn centred(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
        rng.gen::<f32>() - 0.5,
    )
}
