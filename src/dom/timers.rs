//! Timer and listener handles that clean up after themselves.
//!
//! `Interval` and `Listener` cancel on drop, so a session that owns them can
//! be torn down by dropping it. Never drop one from inside its own callback;
//! `cancel()` it there and drop the owner from a later task instead.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, window};

use crate::error::{EggError, Result};

/// One-shot timeout; the closure is freed after it runs.
pub fn after(ms: u32, f: impl FnOnce() + 'static) {
    let Some(win) = window() else {
        return;
    };
    let cb = Closure::once_into_js(f);
    if let Err(e) =
        win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), ms as i32)
    {
        log::warn!("setTimeout failed: {e:?}");
    }
}

/// Runs `f` on a fresh task, after the current event handler returned.
pub fn defer(f: impl FnOnce() + 'static) {
    after(0, f);
}

pub struct Interval {
    id: Option<i32>,
    _closure: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn new(ms: u32, f: impl FnMut() + 'static) -> Result<Self> {
        let win = window().ok_or_else(|| EggError::Dom("no window".into()))?;
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let id = win
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                ms as i32,
            )
            .map_err(EggError::dom)?;
        Ok(Self {
            id: Some(id),
            _closure: closure,
        })
    }

    /// Stops future ticks; safe to call from the interval's own callback.
    pub fn cancel(&mut self) {
        if let (Some(id), Some(win)) = (self.id.take(), window()) {
            win.clear_interval_with_handle(id);
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(target: &EventTarget, kind: &'static str, f: impl FnMut(Event) + 'static) -> Result<Self> {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .map_err(EggError::dom)?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Page-lifetime listener: attached once and never removed.
pub fn listen(target: &EventTarget, kind: &str, f: impl FnMut(Event) + 'static) -> Result<()> {
    let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
        .map_err(EggError::dom)?;
    closure.forget();
    Ok(())
}
