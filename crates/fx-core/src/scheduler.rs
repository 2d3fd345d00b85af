use crate::audio::AudioReactive;
use crate::scene::SceneGroup;
use std::cell::Cell;
use std::rc::Rc;

/// Keeps elapsed time finite and non-decreasing.
///
/// A NaN, infinite or backwards value is replaced by the last value that was
/// accepted (0.0 before the first one).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeClamp {
    last: Option<f32>,
}

impl TimeClamp {
    pub fn clamp(&mut self, t: f32) -> f32 {
        match self.last {
            Some(last) if !t.is_finite() || t < last => {
                log::debug!("[frame] clamped elapsed time {t} to {last}");
                last
            }
            None if !t.is_finite() => {
                log::debug!("[frame] clamped elapsed time {t} to 0");
                self.last = Some(0.0);
                0.0
            }
            _ => {
                self.last = Some(t);
                t
            }
        }
    }

    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

/// Something the scheduler ticks once per frame.
pub enum Layer {
    Scene(SceneGroup),
    Reactive(AudioReactive),
}

impl Layer {
    pub fn group(&self) -> &SceneGroup {
        match self {
            Layer::Scene(g) => g,
            Layer::Reactive(r) => r.group(),
        }
    }

    fn on_frame(&mut self, t: f32) {
        match self {
            Layer::Scene(g) => {
                g.on_frame(t);
            }
            Layer::Reactive(r) => {
                r.on_frame(t);
            }
        }
    }
}

/// The per-frame update loop. Layers are updated in insertion order.
#[derive(Default)]
pub struct FrameScheduler {
    layers: Vec<Layer>,
    clamp: TimeClamp,
    frames: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scene(&mut self, group: SceneGroup) -> usize {
        self.layers.push(Layer::Scene(group));
        self.layers.len() - 1
    }

    pub fn add_reactive(&mut self, reactive: AudioReactive) -> usize {
        self.layers.push(Layer::Reactive(reactive));
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Reactive layer at `index`, if that layer is one.
    pub fn reactive(&self, index: usize) -> Option<&AudioReactive> {
        match self.layers.get(index) {
            Some(Layer::Reactive(r)) => Some(r),
            _ => None,
        }
    }

    pub fn reactive_mut(&mut self, index: usize) -> Option<&mut AudioReactive> {
        match self.layers.get_mut(index) {
            Some(Layer::Reactive(r)) => Some(r),
            _ => None,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance every layer to elapsed time `t`. Returns the time used.
    pub fn on_frame(&mut self, t: f32) -> f32 {
        let t = self.clamp.clamp(t);
        for layer in &mut self.layers {
            layer.on_frame(t);
        }
        self.frames += 1;
        t
    }
}

/// Wall-clock elapsed seconds since construction, for hosts that do not get
/// a timestamp from their display callback.
pub struct FrameClock {
    start: instant::Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: instant::Instant::now(),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

#[derive(Debug, Default)]
struct LoopShared {
    generation: Cell<u32>,
    running: Cell<bool>,
}

/// Start/stop control for a host's display loop.
///
/// Every start and every stop bumps the generation, so a callback still
/// queued from an earlier start sees a stale [`LoopTicket`] and exits even
/// when the loop was restarted before it ran.
#[derive(Clone, Debug, Default)]
pub struct LoopControl {
    shared: Rc<LoopShared>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a new loop, or `None` while one is already running.
    pub fn start(&self) -> Option<LoopTicket> {
        if self.shared.running.replace(true) {
            return None;
        }
        Some(LoopTicket {
            generation: self.bump(),
            shared: Rc::clone(&self.shared),
        })
    }

    pub fn stop(&self) {
        if self.shared.running.replace(false) {
            self.bump();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    fn bump(&self) -> u32 {
        let next = self.shared.generation.get().wrapping_add(1);
        self.shared.generation.set(next);
        next
    }
}

/// Held by one loop; valid until the next start or stop.
#[derive(Debug)]
pub struct LoopTicket {
    generation: u32,
    shared: Rc<LoopShared>,
}

impl LoopTicket {
    pub fn is_current(&self) -> bool {
        self.shared.running.get() && self.shared.generation.get() == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_holds_last_valid_value() {
        let mut c = TimeClamp::default();
        assert_eq!(c.clamp(f32::NAN), 0.0);
        assert_eq!(c.clamp(1.5), 1.5);
        assert_eq!(c.clamp(1.0), 1.5);
        assert_eq!(c.clamp(f32::INFINITY), 1.5);
        assert_eq!(c.clamp(2.0), 2.0);
    }
}
