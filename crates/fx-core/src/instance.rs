//! Flat per-object records for GPU upload. Layout matches the `Instance`
//! struct declared in every bundled WGSL shader.

use crate::constants::NO_COLOR;
use crate::object::AnimatedObject;
use crate::scene::SceneGroup;
use crate::uniforms::{UniformValue, INTENSITY, OPACITY, SPEED, TIME};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRecord {
    pub model: [[f32; 4]; 4],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub color3: [f32; 4],
    pub time: f32,
    pub intensity: f32,
    pub speed: f32,
    pub opacity: f32,
    pub shader: u32,
    pub geometry: u32,
    pub _pad: [u32; 2],
}

impl InstanceRecord {
    /// Colour uniforms are packed in declaration order; missing floats fall
    /// back to 1.0.
    pub fn from_object(object: &AnimatedObject, group: Mat4) -> Self {
        let mut colors = [NO_COLOR; 3];
        let colored = object.uniforms.iter().filter_map(|(_, v)| match v {
            UniformValue::Color(c) => Some([c.x, c.y, c.z, 1.0]),
            UniformValue::Float(_) => None,
        });
        for (slot, c) in colors.iter_mut().zip(colored) {
            *slot = c;
        }
        let float_or_one = |name: &str| match object.uniforms.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 1.0,
        };
        Self {
            model: (group * object.transform.matrix()).to_cols_array_2d(),
            color1: colors[0],
            color2: colors[1],
            color3: colors[2],
            time: object.uniforms.float(TIME),
            intensity: float_or_one(INTENSITY),
            speed: float_or_one(SPEED),
            opacity: float_or_one(OPACITY),
            shader: object.shader().index() as u32,
            geometry: object.geometry().id(),
            _pad: [0; 2],
        }
    }
}

impl SceneGroup {
    /// Append one record per object, in group order.
    pub fn write_instances(&self, out: &mut Vec<InstanceRecord>) {
        let group = self.group_matrix();
        out.extend(
            self.objects()
                .iter()
                .map(|o| InstanceRecord::from_object(o, group)),
        );
    }
}
