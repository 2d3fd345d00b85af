//! Colour helpers shared by the shader reference implementations and the
//! audio mapping.

use glam::Vec3;

/// Convert a packed `0xRRGGBB` value into linear-ish RGB in [0, 1].
pub fn hex(rgb: u32) -> Vec3 {
    let r = ((rgb >> 16) & 0xff) as f32 / 255.0;
    let g = ((rgb >> 8) & 0xff) as f32 / 255.0;
    let b = (rgb & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

/// HSL to RGB with the hue wrapped into [0, 1) and saturation/lightness clamped.
pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    if s == 0.0 {
        return Vec3::splat(l);
    }
    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// GLSL `mix` for colours.
#[inline]
pub fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// GLSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Distance from `uv` to the closest edge of the unit square.
#[inline]
pub fn edge_distance(u: f32, v: f32) -> f32 {
    u.min(1.0 - u).min(v.min(1.0 - v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_unpacks_channels() {
        let c = hex(0xff0080);
        assert!((c.x - 1.0).abs() < 1e-6);
        assert!(c.y.abs() < 1e-6);
        assert!((c.z - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn hsl_primaries() {
        let red = hsl(0.0, 1.0, 0.5);
        assert!((red - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        let green = hsl(1.0 / 3.0, 1.0, 0.5);
        assert!((green - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
        // hue wraps
        let wrapped = hsl(1.0, 1.0, 0.5);
        assert!((wrapped - red).length() < 1e-5);
    }

    #[test]
    fn hsl_zero_saturation_is_grey() {
        assert_eq!(hsl(0.3, 0.0, 0.25), Vec3::splat(0.25));
    }
}
