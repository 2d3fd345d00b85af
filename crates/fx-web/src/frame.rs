use fx_core::{FrameClock, FrameScheduler, InstanceRecord, LoopTicket};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

pub struct FrameContext {
    pub scheduler: FrameScheduler,
    pub reactive: Vec<usize>,
    pub clock: FrameClock,
    pub instances: Vec<InstanceRecord>,
    /// Instance count per layer, in layer order.
    pub counts: Vec<u32>,
}

impl FrameContext {
    pub fn new(scheduler: FrameScheduler, reactive: Vec<usize>) -> Self {
        Self {
            scheduler,
            reactive,
            clock: FrameClock::new(),
            instances: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Advance every layer to `t` and refresh the instance buffer.
    pub fn frame(&mut self, t: f32) -> f32 {
        let t = self.scheduler.on_frame(t);
        self.instances.clear();
        self.counts.clear();
        for layer in self.scheduler.layers() {
            let before = self.instances.len();
            layer.group().write_instances(&mut self.instances);
            self.counts.push((self.instances.len() - before) as u32);
        }
        t
    }

    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Drive `frame_ctx` from `requestAnimationFrame` while `ticket` is current,
/// calling `draw(t)` after each update.
pub fn start_loop(
    frame_ctx: Rc<RefCell<FrameContext>>,
    ticket: LoopTicket,
    draw: js_sys::Function,
) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !ticket.is_current() {
            log::info!("[frame] loop stopped");
            // breaks the closure <-> cell cycle; freed once this call returns
            drop(tick_clone.borrow_mut().take());
            return;
        }
        let t = {
            let mut ctx = frame_ctx.borrow_mut();
            let elapsed = ctx.clock.elapsed();
            ctx.frame(elapsed)
        };
        if let Err(e) = draw.call1(&JsValue::NULL, &JsValue::from_f64(t as f64)) {
            log::error!("[frame] draw callback failed: {:?}", e);
        }
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    let Some(w) = web::window() else {
        return;
    };
    if let Some(cb) = tick.borrow().as_ref() {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
