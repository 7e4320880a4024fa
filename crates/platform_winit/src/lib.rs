//! platform_winit: window + input + present loop (winit 0.30).
//!
//! Provides a minimal `run()` that creates a window and drives the
//! `render_wgpu::Renderer` via winit's ApplicationHandler API. Input
//! routing lives here: clicks and wheel events over the control panel
//! go to the panel, everything else drives the orbit camera.

use data_runtime::catalog::ModelEntry;
use data_runtime::viewer_cfg::ViewerCfg;
use render_wgpu::Renderer;
use std::path::PathBuf;
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

/// Pixels of panel scroll per wheel "line" tick.
const WHEEL_LINE_PX: f32 = 32.0;

/// Everything `run()` needs, resolved by the binary up front.
pub struct RunOptions {
    pub data_root: PathBuf,
    pub catalog: Vec<ModelEntry>,
    pub cfg: ViewerCfg,
    pub vsync: bool,
}

struct App {
    opts: Option<RunOptions>,
    cfg: ViewerCfg,
    window: Option<Window>,
    state: Option<Renderer>,
    cursor: (f32, f32),
    dragging: bool,
}

impl App {
    fn new(opts: RunOptions) -> Self {
        Self {
            cfg: opts.cfg.clone(),
            opts: Some(opts),
            window: None,
            state: None,
            cursor: (0.0, 0.0),
            dragging: false,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(opts) = self.opts.take() else {
            return;
        };
        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title(self.cfg.window_title())
                .with_inner_size(LogicalSize::new(1280.0, 720.0)),
        ) {
            Ok(w) => w,
            Err(e) => {
                log::error!("create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let state = match Renderer::new(
            &window,
            opts.catalog,
            &opts.cfg,
            opts.data_root,
            opts.vsync,
        ) {
            Ok(s) => s,
            Err(e) => {
                log::error!("renderer init failed: {e:#}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window);
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(state)) = (&self.window, &mut self.state) else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                if self.dragging {
                    let (dx, dy) = (x - self.cursor.0, y - self.cursor.1);
                    state.orbit_rotate(dx, dy);
                }
                self.cursor = (x, y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                // Panel clicks never start an orbit drag.
                if !state.click(self.cursor.0, self.cursor.1) {
                    self.dragging = true;
                    state.set_dragging(true);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = false;
                state.set_dragging(false);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / WHEEL_LINE_PX,
                };
                if state.panel_contains(self.cursor.0, self.cursor.1) {
                    state.panel_scroll(-lines * WHEEL_LINE_PX);
                } else {
                    state.dolly(lines);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.render() {
                    match err {
                        SurfaceError::Lost | SurfaceError::Outdated => state.reconfigure(),
                        SurfaceError::OutOfMemory => {
                            log::error!("render: out of GPU memory");
                            event_loop.exit();
                        }
                        e => log::warn!("render error: {e:?}"),
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

fn is_headless() -> bool {
    if std::env::var("SIZEVIEW_HEADLESS")
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        return true;
    }
    if std::env::var("CI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
    {
        return true;
    }
    #[cfg(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd",
    ))]
    {
        if std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none() {
            return true;
        }
    }
    false
}

pub fn run(opts: RunOptions) -> anyhow::Result<()> {
    if is_headless() {
        log::info!("no display detected; exiting (set SIZEVIEW_HEADLESS=0 to force)");
        return Ok(());
    }
    let event_loop = EventLoop::new()?;
    let mut app = App::new(opts);
    event_loop.run_app(&mut app)?;
    Ok(())
}
