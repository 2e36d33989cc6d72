//! Attaches the sensors to page elements and plays the effects they return.
//! A missing element just leaves its sensor unattached.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, window,
};

use super::timers::listen;
use super::{Cards, arena, now, overlay, with_engine};
use crate::config::EggConfig;
use crate::engine::Effect;
use crate::error::{EggError, Result};
use crate::sensors::ScrollSample;

pub(crate) fn install(doc: &Document, cfg: &EggConfig, cards: &Cards) -> Result<()> {
    if let Some(icon) = query(doc, &cfg.selectors.fire_icon) {
        on_click(&icon, |t| with_engine(|e| e.fire_icon_clicked(t)).flatten())?;
    }
    if let Some(title) = query(doc, &cfg.selectors.title) {
        on_click(&title, |t| with_engine(|e| e.title_clicked(t)).flatten())?;
    }
    match &cards.owner {
        Some(card) => on_click(card, |t| with_engine(|e| e.owner_card_clicked(t)).flatten())?,
        None => log::debug!("owner card '{}' not on this page", cfg.cards.owner),
    }
    match &cards.manager {
        Some(card) => install_manager(card)?,
        None => log::debug!("manager card '{}' not on this page", cfg.cards.manager),
    }
    install_scroll(doc)?;
    install_sections(doc, cfg)?;
    Ok(())
}

fn query(doc: &Document, selector: &str) -> Option<Element> {
    let found = doc.query_selector(selector).ok().flatten();
    if found.is_none() {
        log::debug!("'{selector}' not on this page");
    }
    found
}

fn pointer(el: &Element) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property("cursor", "pointer");
    }
}

/// Click sensor feeding `performance.now()` into `sense`.
fn on_click(el: &Element, sense: impl Fn(f64) -> Option<Effect> + 'static) -> Result<()> {
    pointer(el);
    listen(el, "click", move |_| {
        if let Some(effect) = sense(now()) {
            play(effect, None);
        }
    })
}

/// The manager card listens from the start; the engine keeps it inert until
/// the cookie quest is resolved.
fn install_manager(card: &Element) -> Result<()> {
    let target = card.clone();
    listen(card, "click", move |_| {
        let effects = with_engine(|e| e.manager_clicked()).unwrap_or_default();
        for effect in effects {
            play(effect, Some(&target));
        }
    })
}

pub(crate) fn play(effect: Effect, card: Option<&Element>) {
    let shown = match effect {
        Effect::FireExplosion => overlay::fire_explosion(),
        Effect::BulletTime => overlay::bullet_time(),
        Effect::CrownCollector => overlay::crown_collector(),
        Effect::Hint(text) => {
            overlay::quick_message(&text, "#FFD700");
            Ok(())
        }
        Effect::ManagerLine(text) => {
            match card {
                Some(card) => overlay::speech_bubble(card, &text),
                None => overlay::quick_message(&text, "#ff8c00"),
            }
            Ok(())
        }
        Effect::PesterBattle => start_pester_battle(card.cloned()),
    };
    if let Err(e) = shown {
        log::warn!("effect not shown: {e}");
    }
}

fn start_pester_battle(card: Option<Element>) -> Result<()> {
    let Some(cfg) = super::config() else {
        return Ok(());
    };
    arena::launch(cfg.pester_battle, card, || {
        overlay::quick_message("😤 The manager retreats... for now", "#ffd700");
    })
}

fn scroll_sample(doc: &Document) -> Option<ScrollSample> {
    let win = window()?;
    Some(ScrollSample {
        scroll_y: win.scroll_y().ok()?,
        viewport_height: win.inner_height().ok()?.as_f64()?,
        document_height: doc.document_element()?.scroll_height() as f64,
    })
}

fn install_scroll(doc: &Document) -> Result<()> {
    let win = window().ok_or_else(|| EggError::Dom("no window".into()))?;
    let doc = doc.clone();
    listen(&win, "scroll", move |_| {
        if let Some(sample) = scroll_sample(&doc) {
            with_engine(|e| e.scrolled(sample, now()));
        }
    })
}

fn install_sections(doc: &Document, cfg: &EggConfig) -> Result<()> {
    let callback = Closure::wrap(Box::new(
        move |entries: js_sys::Array, _observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let id = entry.target().id();
                if !id.is_empty() {
                    with_engine(|e| e.section_visible(&id));
                }
            }
        },
    ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let opts = IntersectionObserverInit::new();
    opts.set_threshold(&JsValue::from_f64(cfg.sections.threshold));
    opts.set_root_margin(&cfg.sections.root_margin);
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &opts)
            .map_err(EggError::dom)?;
    callback.forget();

    let mut observed = 0;
    for id in &cfg.sections.required {
        if let Some(section) = doc.get_element_by_id(id) {
            observer.observe(&section);
            observed += 1;
        }
    }
    log::debug!(
        "observing {observed}/{} sections",
        cfg.sections.required.len()
    );
    Ok(())
}
