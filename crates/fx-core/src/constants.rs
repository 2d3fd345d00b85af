// Shared animation/audio tuning constants used by the web and native hosts.

// Beat detection
pub const BEAT_THRESHOLD: f32 = 50.0 / 255.0; // mean normalized bin energy that counts as a beat
pub const BEAT_COOLDOWN_SEC: f32 = 0.2; // how long a beat stays active once triggered
pub const BEAT_HUE: f32 = 0.0; // fixed hue used while a beat is active (red)
pub const BEAT_LIGHTNESS: f32 = 0.8;

// Per-bin colour mapping
pub const BIN_SATURATION: f32 = 1.0;
pub const BIN_LIGHTNESS: f32 = 0.5;
pub const BAR_LIGHTNESS: f32 = 0.6;

// Spectrum analysis (mirrors the WebAudio AnalyserNode defaults used by the site)
pub const DEFAULT_FFT_SIZE: usize = 256;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;
pub const DEFAULT_SMOOTHING: f32 = 0.8;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

// Group rotation rates (radians per second around Y) taken from the site's layers
pub const COSMIC_GROUP_SPIN: f32 = 0.002;
pub const STAR_FIELD_SPIN: f32 = 0.01;
pub const COSMIC_DUST_SPIN: f32 = 0.005;
pub const LIQUID_GROUP_SPIN: f32 = 0.02;
pub const MORPHING_GROUP_SPIN: f32 = 0.05;
pub const HOLOGRAPHIC_GROUP_SPIN: f32 = 0.02;
pub const NEON_GROUP_SPIN: f32 = 0.01;
pub const PORTAL_GROUP_SPIN: f32 = 0.005;
pub const QUANTUM_GROUP_SPIN: f32 = 0.01;

// Seed mixing constant used to derive independent per-object RNG streams
pub const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

// Renderer hand-off
pub const NO_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
