//! `unlock()`, `stats()` and `reset()` on `window`, for visitors who open
//! the developer console.

use wasm_bindgen::prelude::*;
use web_sys::window;

use super::with_engine;
use crate::error::{EggError, Result};

pub fn install() -> Result<()> {
    let win = window().ok_or_else(|| EggError::Dom("no window".into()))?;

    let unlock = Closure::wrap(Box::new(|| -> JsValue {
        console_unlock();
        JsValue::UNDEFINED
    }) as Box<dyn FnMut() -> JsValue>);
    let stats = Closure::wrap(Box::new(|| -> JsValue {
        JsValue::from_str(&console_stats())
    }) as Box<dyn FnMut() -> JsValue>);
    let reset = Closure::wrap(Box::new(|| -> JsValue {
        if let Err(e) = console_reset() {
            log::warn!("reset failed: {e}");
        }
        JsValue::UNDEFINED
    }) as Box<dyn FnMut() -> JsValue>);

    for (name, f) in [("unlock", &unlock), ("stats", &stats), ("reset", &reset)] {
        js_sys::Reflect::set(&win, &JsValue::from_str(name), f.as_ref())
            .map_err(EggError::dom)?;
    }
    unlock.forget();
    stats.forget();
    reset.forget();
    Ok(())
}

pub fn console_unlock() {
    match with_engine(|e| e.console_unlock()) {
        Some(Ok(true)) => log::info!("🎮 CONSOLE WARRIOR UNLOCKED!"),
        Some(Ok(false)) => log::info!("🎮 already a console warrior"),
        Some(Err(e)) => log::error!("{e}"),
        None => {}
    }
}

pub fn console_stats() -> String {
    let stats = with_engine(|e| e.stats()).unwrap_or_default();
    log::info!("{stats}");
    stats
}

/// Asks first, then wipes both blobs and reloads the page.
pub fn console_reset() -> Result<()> {
    let win = window().ok_or_else(|| EggError::Dom("no window".into()))?;
    let confirmed = win
        .confirm_with_message("Reset all achievements? This cannot be undone!")
        .map_err(EggError::dom)?;
    if !confirmed {
        return Ok(());
    }
    with_engine(|e| e.reset());
    win.location().reload().map_err(EggError::dom)
}
