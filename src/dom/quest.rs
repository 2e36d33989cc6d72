//! Cookie quest UI: marker, dialogue, fight and return-cookie buttons, and
//! the reveal / countdown / troll finale. Each affordance removes itself on
//! first use, so a stale click finds nothing to act on.

use std::cell::RefCell;

use web_sys::Element;

use super::overlay::{self, append, element, fade_out_after, mount};
use super::timers::{Interval, after, defer, listen};
use super::{Cards, arena, document, with_engine};
use crate::audio::{self, Sfx};
use crate::error::{EggError, Result};
use crate::quest::QuestStage;

const GIVER_NAME: &str = "kit_cat350";

thread_local! {
    static COUNTDOWN: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

/// Restores the quest UI for whatever stage the stored flags imply.
pub(crate) fn install(cards: &Cards) -> Result<()> {
    let (Some(giver), Some(manager)) = (cards.quest_giver.clone(), cards.manager.clone()) else {
        log::debug!("quest cards not on this page");
        return Ok(());
    };
    let Some(stage) = with_engine(|e| e.quest().stage()) else {
        return Ok(());
    };
    match stage {
        QuestStage::NotStarted => add_marker(giver, manager),
        QuestStage::Talked | QuestStage::QuestAccepted => add_fight_button(manager, giver),
        QuestStage::CookieWon => add_cookie_button(giver),
        QuestStage::CookieReturned => {
            after(1_500, play_finale);
            Ok(())
        }
        QuestStage::FightAvailable
        | QuestStage::PlotTwistRevealed
        | QuestStage::AdminMayhemUnlocked => Ok(()),
    }
}

/// Logs and swallows quest step errors coming from the engine.
fn step(name: &str, f: impl FnOnce(&mut super::PageEngine) -> Result<QuestStage>) -> bool {
    match with_engine(f) {
        Some(Ok(_)) => true,
        Some(Err(e)) => {
            log::warn!("quest {name}: {e}");
            false
        }
        None => false,
    }
}

fn card_button(card: &Element, label: &str, title: &str, style: &str) -> Result<Element> {
    let doc = document()?;
    let btn = element(
        &doc,
        "button",
        &format!(
            "position:absolute;width:50px;height:50px;border-radius:50%;cursor:pointer;\
             font-size:1.5rem;z-index:10;{style}"
        ),
        Some(label),
    )?;
    btn.set_attribute("title", title).map_err(EggError::dom)?;
    if let Some(html) = wasm_bindgen::JsCast::dyn_ref::<web_sys::HtmlElement>(card) {
        let _ = html.style().set_property("position", "relative");
    }
    append(card, &btn)?;
    Ok(btn)
}

fn add_marker(giver: Element, manager: Element) -> Result<()> {
    let marker = card_button(
        &giver,
        "❗",
        &format!("{GIVER_NAME} needs your help!"),
        "top:10px;right:10px;background:#ffd700;border:3px solid #fff;\
         animation:egg-bounce 1s ease-in-out infinite;",
    )?;
    let used = marker.clone();
    listen(&marker, "click", move |evt| {
        evt.stop_propagation();
        if used.parent_node().is_none() {
            return;
        }
        if !step("talk", |e| e.quest_talk()) {
            return;
        }
        used.remove();
        if let Err(e) = show_request(giver.clone(), manager.clone()) {
            log::warn!("quest dialogue: {e}");
        }
    })
}

fn show_request(giver: Element, manager: Element) -> Result<()> {
    let (dialogue, button) = overlay::dialogue(
        "#ff8c00",
        "😢",
        GIVER_NAME,
        &["\"Help! The manager stole my cookie! 🍪 Can you get it back for me? I really need it...\""],
        Some("Accept Quest"),
    )?;
    let Some(button) = button else {
        return Ok(());
    };
    listen(&button, "click", move |_| {
        if dialogue.parent_node().is_none() {
            return;
        }
        dialogue.remove();
        if !step("accept", |e| e.quest_accept()) {
            return;
        }
        overlay::quick_message("⚔️ Quest Accepted: Fight the manager!", "#ff8c00");
        if let Err(e) = add_fight_button(manager.clone(), giver.clone()) {
            log::warn!("fight button: {e}");
        }
    })
}

fn add_fight_button(manager: Element, giver: Element) -> Result<()> {
    let btn = card_button(
        &manager,
        "⚔️",
        "Fight the manager to get the cookie!",
        "top:10px;right:10px;background:linear-gradient(135deg,#ff4655,#ff8c00);border:3px solid #fff;",
    )?;
    let used = btn.clone();
    listen(&btn, "click", move |evt| {
        evt.stop_propagation();
        if used.parent_node().is_none() {
            return;
        }
        let Some(cfg) = super::config() else {
            return;
        };
        if !step("begin_fight", |e| e.quest_begin_fight()) {
            return;
        }
        used.remove();
        let giver = giver.clone();
        let launched = arena::launch(cfg.quest_battle, Some(manager.clone()), move || {
            if step("win_cookie", |e| e.quest_win_cookie()) {
                if let Err(e) = add_cookie_button(giver) {
                    log::warn!("cookie button: {e}");
                }
            }
        });
        if let Err(e) = launched {
            log::warn!("quest battle: {e}");
        }
    })
}

fn add_cookie_button(giver: Element) -> Result<()> {
    let btn = card_button(
        &giver,
        "🍪",
        &format!("Return cookie to {GIVER_NAME}"),
        "bottom:10px;right:10px;background:linear-gradient(135deg,#d2691e,#8b4513);border:3px solid #ffd700;",
    )?;
    let used = btn.clone();
    listen(&btn, "click", move |evt| {
        evt.stop_propagation();
        if used.parent_node().is_none() {
            return;
        }
        if !step("return_cookie", |e| e.quest_return_cookie()) {
            return;
        }
        used.remove();
        log::info!("🍪 cookie returned to {GIVER_NAME}");
        defer(play_finale);
    })
}

/// Reveal dialogue, then the alarm countdown, then the troll overlay.
fn play_finale() {
    if !step("reveal", |e| e.quest_reveal()) {
        return;
    }
    let Some(cfg) = super::config() else {
        return;
    };
    let shown = overlay::dialogue(
        "#8b0000",
        "😈",
        GIVER_NAME,
        &[
            "\"HAHAHA! You fool! I was the villain all along! 😈\"",
            "\"Now witness the DESTRUCTION of this website!\"",
        ],
        None,
    );
    let dialogue = match shown {
        Ok((d, _)) => Some(d),
        Err(e) => {
            log::warn!("reveal dialogue: {e}");
            None
        }
    };
    let finale = cfg.finale;
    after(finale.reveal_ms, move || {
        if let Some(d) = dialogue {
            d.remove();
        }
        if let Err(e) = start_countdown(finale.countdown_steps, finale.step_ms, finale.troll_ms) {
            log::warn!("countdown: {e}");
            troll(None, finale.troll_ms);
        }
    });
}

fn start_countdown(steps: u32, step_ms: u32, troll_ms: u32) -> Result<()> {
    let doc = document()?;
    let screen = element(
        &doc,
        "div",
        "position:fixed;inset:0;background:#000;z-index:99998;display:flex;flex-direction:column;\
         align-items:center;justify-content:center;font-family:'Orbitron',sans-serif;color:#0f0;",
        None,
    )?;
    append(
        &screen,
        &element(
            &doc,
            "div",
            "font-size:2rem;margin-bottom:1rem;text-shadow:0 0 10px #0f0;",
            Some("ADMIN ACCESS GRANTED"),
        )?,
    )?;
    append(
        &screen,
        &element(
            &doc,
            "div",
            "font-size:1.5rem;color:#ff0000;animation:egg-blink 0.5s infinite;margin-bottom:2rem;",
            Some("⚠️ WEBSITE SELF-DESTRUCT SEQUENCE INITIATED ⚠️"),
        )?,
    )?;
    let digits = element(
        &doc,
        "div",
        "font-size:10rem;font-weight:900;color:#ff0000;text-shadow:0 0 30px #ff0000;",
        Some(&steps.to_string()),
    )?;
    append(&screen, &digits)?;
    mount(&doc, &screen)?;
    audio::play(Sfx::Alarm);

    let mut remaining = steps;
    let interval = Interval::new(step_ms, move || {
        remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            digits.set_text_content(Some(&remaining.to_string()));
            audio::play(Sfx::Alarm);
            return;
        }
        COUNTDOWN.with(|c| {
            if let Some(i) = c.borrow_mut().as_mut() {
                i.cancel();
            }
        });
        // Drop the interval from a later task, not from its own tick.
        defer(|| COUNTDOWN.with(|c| drop(c.borrow_mut().take())));
        troll(Some(screen.clone()), troll_ms);
    })?;
    COUNTDOWN.with(|c| *c.borrow_mut() = Some(interval));
    Ok(())
}

fn troll(countdown: Option<Element>, troll_ms: u32) {
    if let Some(screen) = countdown {
        screen.remove();
    }
    let shown = document().and_then(|doc| {
        let overlay = element(
            &doc,
            "div",
            "position:fixed;inset:0;background:rgba(0,0,0,0.95);z-index:99999;display:flex;\
             flex-direction:column;justify-content:center;align-items:center;",
            None,
        )?;
        append(
            &overlay,
            &element(
                &doc,
                "div",
                "font-size:20rem;animation:egg-spin 1s ease-in-out;margin-bottom:2rem;",
                Some("😈"),
            )?,
        )?;
        append(
            &overlay,
            &element(
                &doc,
                "div",
                "font-family:'Orbitron',sans-serif;font-size:3rem;color:#ff4655;text-shadow:0 0 30px #ff4655;",
                Some("TROLLED!"),
            )?,
        )?;
        append(
            &overlay,
            &element(
                &doc,
                "div",
                "font-family:'Rajdhani',sans-serif;font-size:1.5rem;color:#ff8c00;",
                Some(&format!("{GIVER_NAME}'s revenge is complete!")),
            )?,
        )?;
        mount(&doc, &overlay)?;
        Ok(overlay)
    });
    audio::play(Sfx::Trolled);
    match shown {
        Ok(overlay) => fade_out_after(overlay, troll_ms),
        Err(e) => log::warn!("troll overlay: {e}"),
    }
    if step("finish", |e| e.quest_finish()) {
        log::info!("😈 admin mayhem unleashed; the manager can be pestered now");
    }
}
