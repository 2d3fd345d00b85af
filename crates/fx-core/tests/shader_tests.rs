// Host-side integration tests for the shader program registry.

use fx_core::shader::{ShaderKind, ShaderRegistry, Vertex};
use fx_core::uniforms::{UniformSet, UniformSlot, COLOR, INTENSITY, TIME};
use fx_core::ConfigError;
use glam::{Vec2, Vec3, Vec4};

fn passthrough(v: Vertex, _t: f32, _u: &UniformSet) -> Vec3 {
    v.position
}

fn white(_uv: Vec2, _t: f32, _u: &UniformSet) -> Vec4 {
    Vec4::ONE
}

#[test]
fn builtins_cover_every_variant() {
    let reg = ShaderRegistry::with_builtins().expect("builtins are valid");
    assert_eq!(reg.len(), ShaderKind::ALL.len());
    for kind in ShaderKind::ALL {
        let h = reg
            .lookup(kind.name())
            .unwrap_or_else(|| panic!("{kind} missing"));
        let p = reg.program(h).unwrap();
        assert_eq!(p.kind(), Some(kind));
        assert!(
            p.default_uniforms().contains(TIME),
            "{kind} lacks a time uniform"
        );
    }
}

#[test]
fn lookup_is_case_insensitive_and_unknown_names_error() {
    let reg = ShaderRegistry::with_builtins().unwrap();
    assert_eq!(reg.lookup("Nebula"), reg.lookup("nebula"));
    assert!(matches!(
        reg.resolve("plasma"),
        Err(ConfigError::UnknownShader(name)) if name == "plasma"
    ));
}

#[test]
fn define_requires_time_slot() {
    let mut reg = ShaderRegistry::new();
    let err = reg
        .define(
            "no-clock",
            &[UniformSlot::float(INTENSITY, 1.0)],
            passthrough,
            white,
        )
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingTimeUniform("no-clock".into()));

    // a colour named time does not count
    let err = reg
        .define(
            "bad-clock",
            &[UniformSlot::color(TIME, Vec3::ONE)],
            passthrough,
            white,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingTimeUniform(_)));
    assert!(reg.is_empty(), "failed definitions must not register");
}

#[test]
fn define_rejects_duplicates_and_empty_names() {
    let mut reg = ShaderRegistry::new();
    let slots = [UniformSlot::float(TIME, 0.0), UniformSlot::color(COLOR, Vec3::ONE)];
    let h = reg.define("glow", &slots, passthrough, white).unwrap();
    assert_eq!(reg.program(h).unwrap().name(), "glow");
    assert_eq!(
        reg.define("GLOW", &slots, passthrough, white).unwrap_err(),
        ConfigError::DuplicateProgram("GLOW".into())
    );
    assert_eq!(
        reg.define("", &slots, passthrough, white).unwrap_err(),
        ConfigError::EmptyProgramName
    );
    let twice = [UniformSlot::float(TIME, 0.0), UniformSlot::float(TIME, 1.0)];
    assert!(matches!(
        reg.define("twice", &twice, passthrough, white),
        Err(ConfigError::DuplicateUniform { .. })
    ));
}

#[test]
fn custom_program_uses_its_own_functions() {
    let mut reg = ShaderRegistry::new();
    let h = reg
        .define("plain", &[UniformSlot::float(TIME, 0.0)], passthrough, white)
        .unwrap();
    let p = reg.program(h).unwrap();
    assert_eq!(p.kind(), None);
    let v = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y);
    assert_eq!(p.displace(v, 5.0, &p.default_uniforms()), v.position);
    assert_eq!(p.shade(Vec2::splat(0.5), 5.0, &p.default_uniforms()), Vec4::ONE);
}

#[test]
fn reference_functions_stay_finite() {
    let reg = ShaderRegistry::with_builtins().unwrap();
    let normal = Vec3::new(0.0, 0.0, 1.0);
    for (_, p) in reg.iter() {
        let mut u = p.default_uniforms();
        for step in 0..50 {
            let t = step as f32 * 0.37;
            u.set_float(TIME, t);
            let uv = Vec2::new((step % 7) as f32 / 6.0, (step % 5) as f32 / 4.0);
            let pos = p.displace(Vertex::new(Vec3::new(uv.x, uv.y, 0.5), normal), t, &u);
            assert!(pos.is_finite(), "{} displaced to {pos:?} at t={t}", p.name());
            let c = p.shade(uv, t, &u);
            assert!(c.is_finite(), "{} shaded {c:?} at t={t}", p.name());
            assert!(
                (0.0..=1.0).contains(&c.w),
                "{} alpha {} out of range",
                p.name(),
                c.w
            );
        }
    }
}

#[test]
fn displacement_depends_on_time() {
    let reg = ShaderRegistry::with_builtins().unwrap();
    let p = reg.program(reg.resolve("liquid").unwrap()).unwrap();
    let u = p.default_uniforms();
    let v = Vertex::new(Vec3::new(0.3, 0.4, 0.5), Vec3::Z);
    assert_ne!(p.displace(v, 0.0, &u), p.displace(v, 1.0, &u));
}

#[test]
fn every_variant_bundles_wgsl_entry_points() {
    for kind in ShaderKind::ALL {
        let src = kind.wgsl();
        assert!(src.contains("fn vs_main"), "{kind} has no vertex entry");
        assert!(src.contains("fn fs_main"), "{kind} has no fragment entry");
        assert!(src.contains("struct Instance"), "{kind} has no instance block");
    }
}

#[test]
fn handles_from_another_registry_resolve_to_none() {
    let builtins = ShaderRegistry::with_builtins().unwrap();
    let foreign = builtins.resolve("quantum").unwrap();
    let mut reg = ShaderRegistry::new();
    reg.define("plain", &[UniformSlot::float(TIME, 0.0)], passthrough, white)
        .unwrap();
    assert!(foreign.index() >= reg.len());
    assert!(reg.program(foreign).is_none());
}

#[test]
fn registry_rejects_definitions_past_handle_capacity() {
    let mut reg = ShaderRegistry::new();
    let slots = [UniformSlot::float(TIME, 0.0)];
    for i in 0..=u16::MAX as usize {
        reg.define(&format!("p{i}"), &slots, passthrough, white)
            .unwrap();
    }
    assert_eq!(reg.len(), 65536);
    assert_eq!(
        reg.define("one-more", &slots, passthrough, white).unwrap_err(),
        ConfigError::TooManyPrograms(65536)
    );
    let (last, program) = reg.iter().last().unwrap();
    assert_eq!(last.index(), 65535);
    assert_eq!(program.name(), "p65535");
}
