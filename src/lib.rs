//! SHOOTZ easter eggs.
//!
//! Hidden achievements, a cookie quest with a boss fight and a troll finale,
//! layered over the static SHOOTZ community pages. Everything below `dom` is
//! plain Rust and runs on the host; `dom` wires it into the live page.

use wasm_bindgen::prelude::*;

pub mod achievements;
pub mod audio;
pub mod battle;
pub mod cards;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod presenter;
pub mod quest;
pub mod sensors;
pub mod store;

pub use achievements::{Achievement, Registry};
pub use config::EggConfig;
pub use engine::{Effect, Engine};
pub use error::{EggError, Result};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Page entrypoint. `config_json` may override any part of [`EggConfig`];
/// omitted fields keep their defaults.
#[wasm_bindgen]
pub fn start_eggs(config_json: Option<String>) -> std::result::Result<(), JsValue> {
    let cfg = match config_json.as_deref() {
        Some(json) => EggConfig::from_json(json)?,
        None => EggConfig::default(),
    };
    dom::start(cfg)
}

#[wasm_bindgen]
pub fn unlock() {
    dom::console::console_unlock();
}

#[wasm_bindgen]
pub fn stats() -> String {
    dom::console::console_stats()
}

#[wasm_bindgen]
pub fn reset() -> std::result::Result<(), JsValue> {
    Ok(dom::console::console_reset()?)
}
