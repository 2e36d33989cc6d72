//! Browser wiring: owns the page-wide [`Engine`] and attaches every sensor,
//! overlay and minigame to the live document.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, window};

use crate::cards::{self, CardEntry};
use crate::config::{EggConfig, Selectors};
use crate::engine::Engine;
use crate::error::{EggError, Result};
use crate::store::LocalStorageBackend;

pub mod arena;
pub mod console;
pub mod overlay;
pub mod quest;
pub mod timers;
pub mod triggers;

pub type PageEngine = Engine<LocalStorageBackend, overlay::DomPresenter>;

thread_local! {
    static ENGINE: RefCell<Option<PageEngine>> = const { RefCell::new(None) };
}

/// Runs `f` against the page engine. `None` before `start()` or if called
/// re-entrantly from inside another engine call.
pub(crate) fn with_engine<R>(f: impl FnOnce(&mut PageEngine) -> R) -> Option<R> {
    ENGINE.with(|cell| {
        let Ok(mut guard) = cell.try_borrow_mut() else {
            log::error!("engine re-entered; event dropped");
            return None;
        };
        guard.as_mut().map(f)
    })
}

pub(crate) fn config() -> Option<EggConfig> {
    with_engine(|e| e.config().clone())
}

pub(crate) fn document() -> Result<Document> {
    window()
        .and_then(|w| w.document())
        .ok_or_else(|| EggError::Dom("no document".into()))
}

pub(crate) fn now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

pub(crate) fn rand_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 4];
        if getrandom::getrandom(&mut buf).is_ok() {
            return u32::from_le_bytes(buf) as usize % len;
        }
    }
    // Linear transform of the clock; plenty for picking a target key.
    (now() as u64 as usize)
        .wrapping_mul(1664525)
        .wrapping_add(1013904223)
        % len
}

/// Resolved team cards; any of them may be missing on a given page.
#[derive(Clone, Default)]
pub(crate) struct Cards {
    pub owner: Option<Element>,
    pub quest_giver: Option<Element>,
    pub manager: Option<Element>,
}

pub(crate) fn find_cards(doc: &Document, cfg: &EggConfig) -> Cards {
    let (elements, entries) = match collect_cards(doc, &cfg.selectors) {
        Ok(found) => found,
        Err(e) => {
            log::debug!("team cards not found: {e}");
            return Cards::default();
        }
    };
    let pick = |wanted: &str| cards::resolve(&entries, wanted).map(|i| elements[i].clone());
    Cards {
        owner: pick(&cfg.cards.owner),
        quest_giver: pick(&cfg.cards.quest_giver),
        manager: pick(&cfg.cards.manager),
    }
}

fn collect_cards(doc: &Document, sel: &Selectors) -> Result<(Vec<Element>, Vec<CardEntry>)> {
    use wasm_bindgen::JsCast;

    let nodes = doc
        .query_selector_all(&sel.team_card)
        .map_err(EggError::dom)?;
    let mut elements = Vec::new();
    let mut entries = Vec::new();
    for i in 0..nodes.length() {
        let Some(card) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let name = card
            .query_selector(&sel.card_name)
            .ok()
            .flatten()
            .and_then(|n| n.text_content());
        let member = card.get_attribute("data-member");
        entries.push(CardEntry::new(member.as_deref(), name.as_deref()));
        elements.push(card);
    }
    Ok((elements, entries))
}

/// Routes `log` records to the browser console. A second `start()` keeps
/// the installed logger and only moves the level.
fn init_logging(filter: log::LevelFilter) {
    if let Some(level) = filter.to_level() {
        let _ = console_log::init_with_level(level);
    }
    log::set_max_level(filter);
}

/// Boots the easter-egg layer on the current page.
pub fn start(cfg: EggConfig) -> std::result::Result<(), JsValue> {
    init_logging(cfg.log_filter());
    let doc = document()?;

    overlay::install_styles(&doc)?;
    overlay::create_counter(&doc)?;

    let presenter = overlay::DomPresenter::new(cfg.notification_ms);
    let engine = Engine::new(cfg.clone(), LocalStorageBackend::open(), presenter);
    ENGINE.with(|cell| *cell.borrow_mut() = Some(engine));

    let cards = find_cards(&doc, &cfg);
    triggers::install(&doc, &cfg, &cards)?;
    quest::install(&cards)?;
    console::install()?;

    log::info!("🎮 easter eggs armed. Try typing: unlock(), stats(), or reset()");
    Ok(())
}

#[cfg(all(test, feature = "rng"))]
mod tests {
    use super::rand_index;

    #[test]
    fn random_indices_stay_in_range_and_vary() {
        let draws: Vec<usize> = (0..200).map(|_| rand_index(6)).collect();
        assert!(draws.iter().all(|&i| i < 6));
        let first = draws[0];
        assert!(draws.iter().any(|&i| i != first));
        assert_eq!(rand_index(0), 0);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod web_tests {
    use wasm_bindgen_test::*;

    use super::init_logging;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn logger_level_follows_config_on_restart() {
        init_logging(log::LevelFilter::Debug);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        init_logging(log::LevelFilter::Warn);
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
        log::warn!("console logger installed");
    }
}
