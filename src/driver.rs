//! Browser event loop around a [`GlobeCanvas`].
//!
//! Owns the `requestAnimationFrame` callback, the resize and pointer
//! listeners and the intersection observer. Dropping or stopping the loop
//! cancels the pending frame and detaches everything it registered.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{
    console, Event, EventTarget, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, PointerEvent,
};

use crate::constants::VISIBILITY_THRESHOLD;
use crate::renderer::GlobeCanvas;

type FrameCallback = Closure<dyn FnMut(f64)>;
type EventCallback = Closure<dyn FnMut(Event)>;
type ObserverCallback = Closure<dyn FnMut(js_sys::Array)>;

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: EventCallback,
}

struct LoopState {
    globe: RefCell<GlobeCanvas>,
    running: Cell<bool>,
    frame_id: Cell<Option<i32>>,
    on_frame: RefCell<Option<FrameCallback>>,
    report: Option<js_sys::Function>,
    listeners: RefCell<Vec<Listener>>,
    observer: RefCell<Option<(IntersectionObserver, ObserverCallback)>>,
}

impl LoopState {
    fn schedule(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("Failed to get window")?;
        let callback = self.on_frame.borrow();
        let callback = callback.as_ref().ok_or("Frame callback missing")?;
        let id = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.frame_id.set(Some(id));
        Ok(())
    }

    fn tick(&self, now: f64) {
        self.frame_id.set(None);
        if !self.running.get() {
            return;
        }

        let result = match self.globe.try_borrow_mut() {
            Ok(mut globe) => globe.render(now),
            Err(_) => return warn("Frame skipped: canvas busy", &JsValue::UNDEFINED),
        };
        if let Some(report) = &self.report {
            if let Err(err) = report.call1(&JsValue::NULL, &JsValue::from(result)) {
                warn("Frame callback threw:", &err);
            }
        }
        if !self.running.get() {
            return;
        }
        if let Err(err) = self.schedule() {
            warn("Failed to schedule frame:", &err);
        }
    }

    fn with_globe(&self, f: impl FnOnce(&mut GlobeCanvas) -> Result<(), JsValue>) {
        let Ok(mut globe) = self.globe.try_borrow_mut() else {
            return;
        };
        if let Err(err) = f(&mut globe) {
            warn("Event handler failed:", &err);
        }
    }

    fn listen(
        self: &Rc<Self>,
        target: EventTarget,
        event: &'static str,
        handler: impl Fn(&LoopState, &Event) + 'static,
    ) -> Result<(), JsValue> {
        let weak: Weak<Self> = Rc::downgrade(self);
        let callback: EventCallback = Closure::wrap(Box::new(move |ev: Event| {
            if let Some(state) = weak.upgrade() {
                handler(&state, &ev);
            }
        }) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.listeners.borrow_mut().push(Listener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    fn stop(&self) {
        if !self.running.replace(false) {
            return;
        }

        if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                warn("Failed to cancel frame:", &err);
            }
        }
        for listener in self.listeners.borrow_mut().drain(..) {
            // The closure drops with the listener once detached.
            if let Err(err) = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                warn(&format!("Failed to remove {} listener:", listener.event), &err);
            }
        }
        if let Some((observer, _callback)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }

        console::log_1(&"[GlobeDrop] Animation stopped".into());
    }
}

fn warn(message: &str, detail: &JsValue) {
    console::warn_2(&format!("[GlobeDrop] {message}").into(), detail);
}

fn pointer_position(ev: &Event) -> Option<(f64, f64)> {
    ev.dyn_ref::<PointerEvent>()
        .map(|p| (p.client_x() as f64, p.client_y() as f64))
}

#[wasm_bindgen]
pub struct AnimationLoop {
    state: Rc<LoopState>,
}

#[wasm_bindgen]
impl AnimationLoop {
    /// Build a [`GlobeCanvas`] on `canvas_id` and start animating it.
    ///
    /// `on_frame`, when given, is called after every frame with the
    /// frame's `RenderResult`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        config: JsValue,
        on_frame: Option<js_sys::Function>,
    ) -> Result<AnimationLoop, JsValue> {
        let globe = GlobeCanvas::new(canvas_id, config)?;
        let window = web_sys::window().ok_or("Failed to get window")?;
        let canvas = globe.canvas().clone();

        let state = Rc::new(LoopState {
            globe: RefCell::new(globe),
            running: Cell::new(true),
            frame_id: Cell::new(None),
            on_frame: RefCell::new(None),
            report: on_frame,
            listeners: RefCell::new(Vec::new()),
            observer: RefCell::new(None),
        });

        let weak = Rc::downgrade(&state);
        *state.on_frame.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
            if let Some(state) = weak.upgrade() {
                state.tick(now);
            }
        }) as Box<dyn FnMut(f64)>));

        state.listen(window.into(), "resize", |s, _| s.with_globe(|g| g.resize()))?;

        let target: EventTarget = canvas.clone().into();
        state.listen(target.clone(), "pointerdown", |s, ev| {
            if let Some((x, y)) = pointer_position(ev) {
                s.with_globe(|g| g.pointer_down(x, y));
            }
        })?;
        state.listen(target.clone(), "pointermove", |s, ev| {
            if let Some((x, y)) = pointer_position(ev) {
                s.with_globe(|g| g.pointer_move(x, y));
            }
        })?;
        state.listen(target.clone(), "pointerup", |s, ev| {
            if let Some((x, y)) = pointer_position(ev) {
                s.with_globe(|g| g.pointer_up(x, y).map(|_| ()));
            }
        })?;
        state.listen(target, "pointerleave", |s, _| s.with_globe(|g| g.pointer_leave()))?;

        let weak = Rc::downgrade(&state);
        let on_intersect: ObserverCallback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let visible = entries
                .iter()
                .filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
                .last()
                .map(|e| e.is_intersecting());
            if let Some(visible) = visible {
                state.with_globe(|g| {
                    g.set_visible(visible);
                    Ok(())
                });
            }
        }) as Box<dyn FnMut(js_sys::Array)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(VISIBILITY_THRESHOLD));
        let observer =
            IntersectionObserver::new_with_options(on_intersect.as_ref().unchecked_ref(), &init)?;
        observer.observe(&canvas);
        *state.observer.borrow_mut() = Some((observer, on_intersect));

        state.schedule()?;
        console::log_1(&"[GlobeDrop] Animation started".into());

        Ok(AnimationLoop { state })
    }

    /// Cancel the pending frame and detach every listener.
    pub fn stop(&self) {
        self.state.stop();
    }

    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    /// Release one item at `x_fraction` of the canvas width.
    pub fn drop_item(&self, kind: usize, x_fraction: f64, size: f64) -> Option<u64> {
        let mut globe = self.state.globe.try_borrow_mut().ok()?;
        Some(globe.drop_item(kind, x_fraction, size))
    }

    pub fn set_auto_spawn(&self, enabled: bool) {
        self.state.with_globe(|g| {
            g.set_auto_spawn(enabled);
            Ok(())
        });
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.state.stop();
    }
}
