pub mod audio;
pub mod color;
pub mod constants;
pub mod error;
pub mod instance;
pub mod motion;
pub mod object;
pub mod presets;
pub mod scene;
pub mod scheduler;
pub mod shader;
pub mod uniforms;

pub use audio::{
    AnalysisFrame, AudioReactive, AudioState, BeatState, DeviceRequest, FrequencySource,
    ReactiveParams, ReactiveStyle,
};
pub use error::{ConfigError, DeviceError};
pub use instance::InstanceRecord;
pub use motion::{AnimParams, MotionRule};
pub use object::{AnimatedObject, GeometryKind, Transform};
pub use scene::{ObjectDescriptor, SceneComposer, SceneGroup, SceneTable};
pub use scheduler::{FrameClock, FrameScheduler, Layer, LoopControl, LoopTicket, TimeClamp};
pub use shader::{ShaderHandle, ShaderKind, ShaderProgram, ShaderRegistry};
pub use uniforms::{UniformSet, UniformSlot, UniformValue};
