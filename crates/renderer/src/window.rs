use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chaosconfig::PresetConfig;
use chaoscore::{FrameOutcome, FrameScheduler, RenderCore, SchedulerState};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::gpu::GpuState;
use crate::types::RendererConfig;

/// What a key press asks the frame loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    TogglePause,
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    action_for_key(&event.logical_key)
}

fn action_for_key(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Quit),
        Key::Character(value) if value.eq_ignore_ascii_case("p") => Some(KeyAction::TogglePause),
        _ => None,
    }
}

/// Opens the window and drives the frame scheduler from the winit event loop.
///
/// Runs on the calling thread until the window closes, Escape is pressed, the
/// run limit expires or a device error occurs.
pub(crate) fn run(preset: &PresetConfig, config: &RendererConfig) -> Result<()> {
    let mut core = RenderCore::from_config(preset).context("invalid preset")?;

    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.window_title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut gpu = GpuState::new(window.as_ref(), window.inner_size(), config)
        .context("failed to initialise GPU renderer")?;
    let profile = gpu.adapter_profile().clone();
    if profile.is_software() {
        warn!(
            adapter = %profile.name,
            particles = config.particle_count,
            "software rasterizer detected; expect a low frame rate"
        );
    }

    let mut scheduler = FrameScheduler::new().with_run_limit(config.run_for);
    scheduler
        .initialize(&mut gpu)
        .context("graphics device reported an error after pipeline creation")?;
    scheduler.start()?;
    info!(
        preset = %preset.name,
        recurrence = %preset.recurrence,
        particles = preset.particle_count,
        "rendering started; press P to pause, Escape to quit"
    );
    window.request_redraw();

    let mut failure: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                let _ = scheduler.request_shutdown();
                elwt.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => match key_action(&event) {
                Some(KeyAction::Quit) => {
                    let _ = scheduler.request_shutdown();
                    elwt.exit();
                }
                Some(KeyAction::TogglePause) => match scheduler.toggle_pause() {
                    Ok(SchedulerState::Running) => window.request_redraw(),
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "ignored pause toggle"),
                },
                None => {}
            },
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let outcome = if scheduler.is_paused() {
                    scheduler.refresh(&mut gpu).map(|_| FrameOutcome::Paused)
                } else {
                    scheduler.tick(&mut core, &mut gpu)
                };
                match outcome {
                    Ok(FrameOutcome::Idle) if scheduler.is_winding_down() => elwt.exit(),
                    Ok(_) => {}
                    Err(err) => {
                        error!(error = %err, "frame failed; shutting down");
                        failure = Some(anyhow!(err));
                        let _ = scheduler.request_shutdown();
                        elwt.exit();
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            if scheduler.is_winding_down() {
                elwt.exit();
            } else if scheduler.is_paused() {
                elwt.set_control_flow(ControlFlow::Wait);
            } else {
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        Event::LoopExiting => {
            let _ = scheduler.request_shutdown();
            match scheduler.finish(&core, &mut gpu) {
                Ok(summary) => info!(
                    average_fps = format_args!("{:.1}", summary.average_fps),
                    "shut down cleanly"
                ),
                Err(err) => warn!(error = %err, "shutdown out of order"),
            }
        }
        _ => {}
    });

    if let Some(err) = failure {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
