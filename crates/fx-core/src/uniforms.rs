//! Named shader parameters and the per-object set of their current values.

use glam::Vec3;
use smallvec::SmallVec;

pub const TIME: &str = "time";
pub const INTENSITY: &str = "intensity";
pub const SPEED: &str = "speed";
pub const OPACITY: &str = "opacity";
pub const COLOR: &str = "color";
pub const GLOW_COLOR: &str = "glow_color";
pub const COLOR1: &str = "color1";
pub const COLOR2: &str = "color2";
pub const COLOR3: &str = "color3";

/// Value held by one uniform slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Color(Vec3),
}

impl UniformValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Color(_) => "color",
        }
    }

    #[inline]
    fn same_kind(&self, other: &UniformValue) -> bool {
        matches!(
            (self, other),
            (UniformValue::Float(_), UniformValue::Float(_))
                | (UniformValue::Color(_), UniformValue::Color(_))
        )
    }
}

/// Declared uniform of a shader program: name plus default value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub default: UniformValue,
}

impl UniformSlot {
    pub const fn float(name: &'static str, default: f32) -> Self {
        Self {
            name,
            default: UniformValue::Float(default),
        }
    }

    pub const fn color(name: &'static str, default: Vec3) -> Self {
        Self {
            name,
            default: UniformValue::Color(default),
        }
    }
}

/// Current uniform values of one animated object.
///
/// Programs declare at most a handful of slots, so the set lives inline and
/// lookups are linear scans over slot names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformSet {
    values: SmallVec<[(&'static str, UniformValue); 6]>,
}

impl UniformSet {
    /// Build a set holding every slot at its default value.
    pub fn from_slots(slots: &[UniformSlot]) -> Self {
        Self {
            values: slots.iter().map(|s| (s.name, s.default)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(n, _)| *n == name)
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Float value of `name`, or 0.0 when the slot is missing or holds a colour.
    pub fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    /// Colour value of `name`, or black when the slot is missing or holds a float.
    pub fn color(&self, name: &str) -> Vec3 {
        match self.get(name) {
            Some(UniformValue::Color(c)) => c,
            _ => Vec3::ZERO,
        }
    }

    /// Overwrite an existing slot. Returns false (and leaves the set untouched)
    /// when the slot is not declared or the value has a different kind.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) if slot.same_kind(&value) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.set(name, UniformValue::Float(value))
    }

    #[inline]
    pub fn set_color(&mut self, name: &str, value: Vec3) -> bool {
        self.set(name, UniformValue::Color(value))
    }

    /// Copy every value from `rest` without reallocating. Both sets must come
    /// from the same program.
    pub fn reset_from(&mut self, rest: &UniformSet) {
        debug_assert_eq!(self.values.len(), rest.values.len());
        for (dst, src) in self.values.iter_mut().zip(rest.values.iter()) {
            *dst = *src;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.values.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UniformSet {
        UniformSet::from_slots(&[
            UniformSlot::float(TIME, 0.0),
            UniformSlot::color(COLOR, Vec3::ONE),
        ])
    }

    #[test]
    fn set_rejects_unknown_and_mismatched_kinds() {
        let mut u = sample();
        assert!(u.set_float(TIME, 2.5));
        assert_eq!(u.float(TIME), 2.5);
        assert!(!u.set_float("nope", 1.0));
        assert!(!u.set_float(COLOR, 1.0));
        assert_eq!(u.color(COLOR), Vec3::ONE);
    }

    #[test]
    fn reset_restores_defaults() {
        let rest = sample();
        let mut u = rest.clone();
        u.set_float(TIME, 9.0);
        u.set_color(COLOR, Vec3::ZERO);
        u.reset_from(&rest);
        assert_eq!(u, rest);
    }
}
