// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::ViewerConfig;
pub use controller::ViewerState;
pub use error::ViewerError;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use tracing::{info, warn};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue, prelude::wasm_bindgen};
    use web_sys::{Document, Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

    use crate::controller::input::wasm::{keyboard_event_to_input, mouse_click_to_input, mouse_move_to_input, mouse_wheel_to_input};
    use crate::controller::{InputEvent, KeyBindings, ViewerState};
    use crate::view::{GpuContext, Renderer};
    use crate::{logging, ui, ViewerConfig, ViewerError};

    type SharedState = Rc<RefCell<ViewerState>>;
    type EguiEvents = Rc<RefCell<Vec<egui::Event>>>;

    /// Share of the browser window the canvas covers
    const VIEWPORT_FRACTION: (f64, f64) = (0.8, 0.7);

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        let mut config = ViewerConfig::default();
        let (window, document, canvas) = init_canvas()?;
        if let Some((width, height)) = viewer_size(&window) {
            config.width = width;
            config.height = height;
        }
        canvas.set_width(config.width);
        canvas.set_height(config.height);
        setup_app(&config, &window, &document, &canvas).await
    }

    /// Main application setup for WASM
    async fn setup_app(
        config: &ViewerConfig,
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
    ) -> Result<(), JsValue> {
        let mut gpu = GpuContext::new(canvas, config.width, config.height).await?;

        let state: SharedState = Rc::new(RefCell::new(ViewerState::new(config)));
        let mut renderer = Renderer::new(&gpu, &state.borrow());

        let egui_ctx = egui::Context::default();
        let egui_events: EguiEvents = Rc::new(RefCell::new(Vec::new()));
        let tab_resumed = Rc::new(Cell::new(false));

        setup_input_listeners(
            document,
            window,
            canvas,
            config.bindings.clone(),
            state.clone(),
            egui_ctx.clone(),
            egui_events.clone(),
            tab_resumed.clone(),
        )?;
        info!(width = config.width, height = config.height, "viewer started");

        let performance = window.performance();
        let mut last_time = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
        let canvas = canvas.clone();
        let browser_window = window.clone();

        // Continuous redraw using requestAnimationFrame
        let frame = RcCellCallback::new(window.clone(), move || {
            let now = performance.as_ref().map(|p| p.now()).unwrap_or(last_time);
            // rAF pauses in hidden tabs; that gap is not elapsed viewing time
            if tab_resumed.replace(false) {
                last_time = now;
            }
            let dt = ((now - last_time) / 1000.0) as f32;
            last_time = now;

            let mut state = state.borrow_mut();
            if let Some((width, height)) = viewer_size(&browser_window) {
                if (width, height) != (gpu.config.width, gpu.config.height) {
                    canvas.set_width(width);
                    canvas.set_height(height);
                    gpu.resize(width, height);
                    renderer.resize(&gpu);
                    state.handle_event(&InputEvent::Resized { width: width as f32, height: height as f32 });
                }
            }
            let (width, height) = (gpu.config.width as f32, gpu.config.height as f32);

            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(width, height)));
            raw_input.events = std::mem::take(&mut *egui_events.borrow_mut());

            state.on_frame(dt);
            let output = ui::build_ui(&egui_ctx, raw_input, &mut state);
            let (ui_frame, platform_output) = ui::into_frame(&egui_ctx, output);
            let _ = canvas.style().set_property("cursor", cursor_css(platform_output.cursor_icon));

            renderer.prepare(&gpu, &state);
            match renderer.render(&gpu, &ui_frame) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    warn!("surface lost, reconfiguring");
                    gpu.reconfigure();
                }
                Err(e) => warn!(error = ?e, "frame skipped"),
            }
        });
        frame.start()
    }

    /// Canvas size for the current browser window, in CSS pixels
    fn viewer_size(window: &Window) -> Option<(u32, u32)> {
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        let (fw, fh) = VIEWPORT_FRACTION;
        Some((((width * fw) as u32).max(1), ((height * fh) as u32).max(1)))
    }

    fn egui_button(button: i16) -> egui::PointerButton {
        match button {
            1 => egui::PointerButton::Middle,
            2 => egui::PointerButton::Secondary,
            _ => egui::PointerButton::Primary,
        }
    }

    fn cursor_css(icon: egui::CursorIcon) -> &'static str {
        match icon {
            egui::CursorIcon::PointingHand => "pointer",
            egui::CursorIcon::Grab => "grab",
            egui::CursorIcon::Grabbing => "grabbing",
            egui::CursorIcon::ResizeHorizontal => "ew-resize",
            egui::CursorIcon::Text => "text",
            _ => "default",
        }
    }

    /// Adds a listener whose closure lives for the rest of the page
    fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// DOM events become `InputEvent`s for the scene, or egui events when the header has the pointer
    #[allow(clippy::too_many_arguments)]
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        canvas: &HtmlCanvasElement,
        bindings: KeyBindings,
        state: SharedState,
        egui_ctx: egui::Context,
        egui_events: EguiEvents,
        tab_resumed: Rc<Cell<bool>>,
    ) -> Result<(), JsValue> {
        // Keyboard
        {
            let state = state.clone();
            listen(document, "keydown", move |e: KeyboardEvent| {
                // leave browser shortcuts such as Ctrl + "-" alone
                if !(e.ctrl_key() || e.meta_key()) && bindings.is_bound(&e.key()) {
                    e.prevent_default();
                }
                state.borrow_mut().handle_event(&keyboard_event_to_input(&e, true));
            })?;
        }
        {
            let state = state.clone();
            listen(document, "keyup", move |e: KeyboardEvent| {
                state.borrow_mut().handle_event(&keyboard_event_to_input(&e, false));
            })?;
        }

        // Focus loss - release every key
        {
            let state = state.clone();
            listen(window, "blur", move |_e: Event| state.borrow_mut().handle_event(&InputEvent::FocusLost))?;
        }
        {
            let state = state.clone();
            let visible_document = document.clone();
            listen(document, "visibilitychange", move |_e: Event| {
                if visible_document.hidden() {
                    state.borrow_mut().handle_event(&InputEvent::FocusLost);
                } else {
                    tab_resumed.set(true);
                }
            })?;
        }

        // Pointer
        {
            let state = state.clone();
            let egui_events = egui_events.clone();
            listen(canvas, "mousemove", move |e: MouseEvent| {
                let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
                egui_events.borrow_mut().push(egui::Event::PointerMoved(pos));
                state.borrow_mut().handle_event(&mouse_move_to_input(&e));
            })?;
        }
        {
            let state = state.clone();
            let egui_ctx = egui_ctx.clone();
            let egui_events = egui_events.clone();
            listen(canvas, "mousedown", move |e: MouseEvent| {
                let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
                egui_events.borrow_mut().push(egui::Event::PointerButton {
                    pos,
                    button: egui_button(e.button()),
                    pressed: true,
                    modifiers: egui::Modifiers::default(),
                });
                if !egui_ctx.is_pointer_over_area() {
                    state.borrow_mut().handle_event(&mouse_click_to_input(&e, true));
                }
                e.prevent_default();
            })?;
        }
        {
            let state = state.clone();
            let egui_events = egui_events.clone();
            listen(canvas, "mouseup", move |e: MouseEvent| {
                let pos = egui::pos2(e.offset_x() as f32, e.offset_y() as f32);
                egui_events.borrow_mut().push(egui::Event::PointerButton {
                    pos,
                    button: egui_button(e.button()),
                    pressed: false,
                    modifiers: egui::Modifiers::default(),
                });
                state.borrow_mut().handle_event(&mouse_click_to_input(&e, false));
            })?;
        }
        {
            let egui_events = egui_events.clone();
            listen(canvas, "mouseleave", move |_e: MouseEvent| {
                egui_events.borrow_mut().push(egui::Event::PointerGone);
            })?;
        }
        {
            let state = state.clone();
            let egui_ctx = egui_ctx.clone();
            listen(canvas, "wheel", move |e: WheelEvent| {
                if !egui_ctx.is_pointer_over_area() {
                    state.borrow_mut().handle_event(&mouse_wheel_to_input(&e));
                    e.prevent_default();
                }
            })?;
        }

        // Right drag pans, so keep the context menu away
        listen(canvas, "contextmenu", move |e: MouseEvent| e.prevent_default())?;

        Ok(())
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), ViewerError> {
        let window = web_sys::window().ok_or_else(|| browser_error("no global `window`"))?;
        let document = window.document().ok_or_else(|| browser_error("no document on window"))?;
        let body = document.body().ok_or_else(|| browser_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")
            .map_err(|e| browser_error(format!("create_element failed: {e:?}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| browser_error("failed to create canvas"))?;
        body.append_child(&canvas_el)
            .map_err(|e| browser_error(format!("append_child failed: {e:?}")))?;
        Ok((window, document, canvas_el))
    }

    fn browser_error<E: Into<String>>(msg: E) -> ViewerError {
        ViewerError::Browser(msg.into())
    }

    impl From<ViewerError> for JsValue {
        fn from(err: ViewerError) -> Self {
            JsValue::from_str(&err.to_string())
        }
    }

    /// requestAnimationFrame loop that re-arms itself after every call
    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) -> Result<(), JsValue> {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Schedule the next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        warn!(error = ?e, "requestAnimationFrame failed, stopping");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
            Ok(())
        }
    }
}
