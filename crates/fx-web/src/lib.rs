#![cfg(target_arch = "wasm32")]
//! Browser bindings. JS owns the canvas and the GPU pipelines; this side owns
//! the scene state and hands over one packed instance buffer per frame.

mod audio;
mod frame;

use frame::FrameContext;
use fx_core::presets;
use fx_core::{FrameScheduler, LoopControl, SceneComposer, ShaderKind, ShaderRegistry};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("fx-web starting");
    Ok(())
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn build(layers: &str, seed: u64) -> anyhow::Result<FrameContext> {
    let registry = ShaderRegistry::with_builtins()?;
    let names: Vec<&str> = layers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        anyhow::bail!("no layers given");
    }
    let mut scheduler = FrameScheduler::new();
    let reactive = presets::install(&mut scheduler, &SceneComposer::new(&registry), &names, seed)?;
    log::info!(
        "[backdrop] {} layers ({} audio-reactive), seed {seed}",
        scheduler.layers().len(),
        reactive.len()
    );
    Ok(FrameContext::new(scheduler, reactive))
}

/// Scene state for one canvas.
#[wasm_bindgen]
pub struct Backdrop {
    ctx: Rc<RefCell<FrameContext>>,
    control: LoopControl,
}

#[wasm_bindgen]
impl Backdrop {
    /// `layers` is a comma-separated list of preset names, drawn in order.
    #[wasm_bindgen(constructor)]
    pub fn new(layers: &str, seed: u32) -> Result<Backdrop, JsValue> {
        let ctx = build(layers, seed as u64).map_err(to_js)?;
        Ok(Backdrop {
            ctx: Rc::new(RefCell::new(ctx)),
            control: LoopControl::new(),
        })
    }

    /// Advance to `t` seconds and return the time actually used.
    pub fn on_frame(&self, t: f32) -> f32 {
        self.ctx.borrow_mut().frame(t)
    }

    /// Packed instance records for the last frame, 144 bytes each.
    pub fn instance_data(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.ctx.borrow().instance_bytes())
    }

    pub fn instance_count(&self) -> u32 {
        self.ctx.borrow().instances.len() as u32
    }

    /// Instance count per layer so the caller can split draw calls.
    pub fn layer_counts(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(self.ctx.borrow().counts.as_slice())
    }

    pub fn shader_names() -> js_sys::Array {
        ShaderKind::ALL
            .iter()
            .map(|k| JsValue::from_str(k.name()))
            .collect()
    }

    pub fn shader_source(name: &str) -> Option<String> {
        name.parse::<ShaderKind>().ok().map(|k| k.wgsl().to_string())
    }

    /// Ask for the microphone on behalf of every audio layer. Must be called
    /// from a user gesture in most browsers. Returns the number of requests
    /// issued; layers that already asked are skipped.
    pub fn enable_microphone(&self) -> u32 {
        let mut ctx = self.ctx.borrow_mut();
        let indices = ctx.reactive.clone();
        let mut issued = 0;
        for index in indices {
            let Some(layer) = ctx.scheduler.reactive_mut(index) else {
                continue;
            };
            let fft_size = layer.params().style.fft_size() as u32;
            let Some(request) = layer.request() else {
                continue;
            };
            issued += 1;
            spawn_local(async move {
                match audio::open_microphone(fft_size).await {
                    Ok(source) => {
                        if !request.grant(Box::new(source)) {
                            log::info!("[audio] backdrop gone before the microphone opened");
                        }
                    }
                    Err(e) => {
                        request.deny(e);
                    }
                }
            });
        }
        issued
    }

    /// State of the first audio layer, or `"none"` when there is none.
    pub fn audio_state(&self) -> String {
        let ctx = self.ctx.borrow();
        ctx.reactive
            .first()
            .and_then(|&i| ctx.scheduler.reactive(i))
            .map_or_else(|| "none".to_string(), |r| r.state().to_string())
    }

    pub fn beat_active(&self) -> bool {
        let ctx = self.ctx.borrow();
        ctx.reactive.iter().any(|&i| {
            ctx.scheduler
                .reactive(i)
                .is_some_and(|r| r.beat().is_active())
        })
    }

    /// Run the frame loop on `requestAnimationFrame`, calling `draw(t)` after
    /// every update.
    pub fn start(&self, draw: js_sys::Function) {
        let Some(ticket) = self.control.start() else {
            log::warn!("[backdrop] loop already running");
            return;
        };
        frame::start_loop(self.ctx.clone(), ticket, draw);
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    /// Stop the loop and release the microphone. Requests still in flight
    /// are dropped when they resolve.
    pub fn teardown(&self) {
        self.stop();
        let mut ctx = self.ctx.borrow_mut();
        let indices = ctx.reactive.clone();
        for index in indices {
            if let Some(layer) = ctx.scheduler.reactive_mut(index) {
                layer.teardown();
            }
        }
    }
}
