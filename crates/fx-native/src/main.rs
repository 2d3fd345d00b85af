mod mic;

use anyhow::{anyhow, Context};
use fx_core::presets;
use fx_core::{
    AudioState, FrameClock, FrameScheduler, InstanceRecord, SceneComposer, ShaderRegistry,
};
use mic::MicSource;
use std::thread;
use std::time::Duration;

const DEFAULT_LAYERS: [&str; 2] = ["cosmic-nebulas", "sound-waves"];
const FRAME: Duration = Duration::from_micros(16_667);

struct Options {
    layers: Vec<String>,
    seed: u64,
    seconds: Option<f32>,
    microphone: bool,
    list: bool,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut opts = Options {
            layers: Vec::new(),
            seed: 42,
            seconds: Some(30.0),
            microphone: true,
            list: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let v = args.next().ok_or_else(|| anyhow!("--seed needs a value"))?;
                    opts.seed = v.parse().with_context(|| format!("bad seed '{v}'"))?;
                }
                "--seconds" => {
                    let v = args.next().ok_or_else(|| anyhow!("--seconds needs a value"))?;
                    let secs: f32 = v.parse().with_context(|| format!("bad duration '{v}'"))?;
                    opts.seconds = (secs > 0.0).then_some(secs);
                }
                "--no-mic" => opts.microphone = false,
                "--list" => opts.list = true,
                flag if flag.starts_with("--") => return Err(anyhow!("unknown flag '{flag}'")),
                _ => opts.layers.push(arg),
            }
        }
        if opts.layers.is_empty() {
            opts.layers = DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect();
        }
        Ok(opts)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let opts = Options::parse(std::env::args().skip(1))?;
    let registry = ShaderRegistry::with_builtins()?;

    if opts.list {
        for name in presets::NAMES {
            let audio = presets::reactive_style(name).map_or("", |_| " (audio)");
            println!("{name}{audio}");
        }
        for (_, program) in registry.iter() {
            println!("shader {} ({} uniforms)", program.name(), program.slots().len());
        }
        return Ok(());
    }

    let mut scheduler = FrameScheduler::new();
    let names: Vec<&str> = opts.layers.iter().map(String::as_str).collect();
    let reactive = presets::install(
        &mut scheduler,
        &SceneComposer::new(&registry),
        &names,
        opts.seed,
    )?;
    log::info!(
        "[native] {} layers ({} audio-reactive), seed {}",
        scheduler.layers().len(),
        reactive.len(),
        opts.seed
    );

    // Each reactive layer gets its own stream sized for its analyser.
    for &index in &reactive {
        let Some(layer) = scheduler.reactive_mut(index) else {
            continue;
        };
        let fft_size = layer.params().style.fft_size();
        let Some(request) = layer.request() else {
            continue;
        };
        if opts.microphone {
            match MicSource::open(fft_size) {
                Ok(source) => request.grant(Box::new(source)),
                Err(e) => request.deny(e),
            };
        } else {
            request.deny(fx_core::DeviceError::Unavailable("disabled by --no-mic".into()));
        }
    }

    run(&mut scheduler, &reactive, opts.seconds);
    Ok(())
}

fn run(scheduler: &mut FrameScheduler, reactive: &[usize], seconds: Option<f32>) {
    let clock = FrameClock::new();
    let mut instances: Vec<InstanceRecord> = Vec::new();
    let mut states: Vec<Option<AudioState>> = vec![None; reactive.len()];
    let mut beats = vec![false; reactive.len()];
    let mut beat_count = 0u64;

    loop {
        let t = scheduler.on_frame(clock.elapsed());

        instances.clear();
        for layer in scheduler.layers() {
            layer.group().write_instances(&mut instances);
        }

        for (slot, &index) in reactive.iter().enumerate() {
            let Some(layer) = scheduler.reactive(index) else {
                continue;
            };
            let state = layer.state();
            if states[slot] != Some(state) {
                log::info!("[native] '{}' audio {state}", layer.group().name());
                states[slot] = Some(state);
            }
            let active = layer.beat().is_active();
            if active && !beats[slot] {
                beat_count += 1;
                log::info!(
                    "[native] beat on '{}' at {t:.2}s (avg {:.3})",
                    layer.group().name(),
                    layer.frame().average()
                );
            }
            beats[slot] = active;
        }

        if scheduler.frames() % 600 == 1 {
            let bytes: &[u8] = bytemuck::cast_slice(&instances);
            let first = instances.first().map(|r| glam::Mat4::from_cols_array_2d(&r.model));
            log::info!(
                "[native] t={t:.1}s frame {} -> {} instances ({} bytes), first at {:?}",
                scheduler.frames(),
                instances.len(),
                bytes.len(),
                first.map(|m| m.w_axis.truncate())
            );
        }

        if seconds.is_some_and(|limit| t >= limit) {
            break;
        }
        thread::sleep(FRAME);
    }

    log::info!(
        "[native] stopped after {} frames, {beat_count} beats",
        scheduler.frames()
    );
}
