use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

// Import from the library crate
use scene3d::controller::{InputEvent, MouseButton};
use scene3d::view::{GpuContext, Renderer};
use scene3d::{logging, ui, ViewerConfig, ViewerError, ViewerState};

/// Window-bound resources, created once the event loop is resumed
struct Viewer {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    last_frame_time: Instant,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig, state: &mut ViewerState) -> Result<Self, ViewerError> {
        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let gpu = pollster::block_on(GpuContext::new_native(window.clone()))?;
        let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
        state.set_viewport(logical.width, logical.height);
        let renderer = Renderer::new(&gpu, state);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            egui_state,
            egui_ctx,
            last_frame_time: Instant::now(),
        })
    }

    fn logical(&self, position: PhysicalPosition<f64>) -> (f32, f32) {
        let logical = position.to_logical::<f32>(self.window.scale_factor());
        (logical.x, logical.y)
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>, state: &mut ViewerState) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.gpu.resize(new_size.width, new_size.height);
        self.renderer.resize(&self.gpu);
        let logical = new_size.to_logical::<f32>(self.window.scale_factor());
        state.handle_event(&InputEvent::Resized { width: logical.width, height: logical.height });
    }

    fn redraw(&mut self, state: &mut ViewerState) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        state.on_frame(dt);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, state);
        let (frame, platform_output) = ui::into_frame(&self.egui_ctx, output);
        self.egui_state.handle_platform_output(&self.window, platform_output);

        self.renderer.prepare(&self.gpu, state);
        self.renderer.render(&self.gpu, &frame)
    }
}

/// Winit key to the lowercase name used by the key bindings
fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_lowercase()),
        Key::Named(NamedKey::ArrowUp) => Some("arrowup".into()),
        Key::Named(NamedKey::ArrowDown) => Some("arrowdown".into()),
        Key::Named(NamedKey::ArrowLeft) => Some("arrowleft".into()),
        Key::Named(NamedKey::ArrowRight) => Some("arrowright".into()),
        _ => None,
    }
}

fn mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

struct App {
    config: ViewerConfig,
    state: ViewerState,
    viewer: Option<Viewer>,
    cursor: (f32, f32),
    error: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let state = ViewerState::new(&config);
        Self { config, state, viewer: None, cursor: (0.0, 0.0), error: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.config, &mut self.state) {
            Ok(viewer) => {
                info!(title = %self.config.title, "window opened");
                self.viewer = Some(viewer);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if window_id != viewer.window.id() {
            return;
        }

        // First let egui process the event
        let consumed = viewer.egui_state.on_window_event(&viewer.window, &event).consumed;

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => viewer.resize(physical_size, &mut self.state),
            WindowEvent::Focused(false) => self.state.handle_event(&InputEvent::FocusLost),
            // time spent in the background is not elapsed viewing time
            WindowEvent::Focused(true) => viewer.last_frame_time = Instant::now(),
            WindowEvent::RedrawRequested => match viewer.redraw(&mut self.state) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    warn!("surface lost, reconfiguring");
                    viewer.gpu.reconfigure();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => warn!(error = ?e, "frame skipped"),
            },
            // Releases always reach the scene so no key stays held
            WindowEvent::KeyboardInput { event, .. } if !consumed || event.state == ElementState::Released => {
                if let Some(key) = key_name(&event.logical_key) {
                    let input = match event.state {
                        ElementState::Pressed => InputEvent::KeyDown(key),
                        ElementState::Released => InputEvent::KeyUp(key),
                    };
                    self.state.handle_event(&input);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = viewer.logical(position);
                self.cursor = (x, y);
                if !consumed {
                    self.state.handle_event(&InputEvent::PointerMoved { x, y });
                }
            }
            WindowEvent::MouseInput { state, button, .. } if !consumed || state == ElementState::Released => {
                let Some(button) = mouse_button(button) else {
                    return;
                };
                let (x, y) = self.cursor;
                let input = match state {
                    ElementState::Pressed => InputEvent::PointerDown { button, x, y },
                    ElementState::Released => InputEvent::PointerUp { button, x, y },
                };
                self.state.handle_event(&input);
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                // winit reports scrolling away from the user as positive
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.state.handle_event(&InputEvent::Wheel { delta_y });
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = &self.viewer {
            viewer.window.request_redraw();
        }
    }
}

fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    app.error.map_or(Ok(()), Err)
}

fn main() -> ExitCode {
    logging::init();

    let config = ViewerConfig::from_env();
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "viewer failed");
            ExitCode::FAILURE
        }
    }
}
