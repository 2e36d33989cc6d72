//! Transient UI: unlock notifications, the trophy badge and panel, quick
//! messages, dialogues and the full-screen unlock effects. Every overlay
//! removes itself after a fixed duration.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use super::timers::{Listener, after, defer, listen};
use super::{document, with_engine};
use crate::achievements::{self, Achievement};
use crate::audio::{self, Sfx};
use crate::error::{EggError, Result};
use crate::presenter::{OverlayQueue, Presenter};

const COUNTER_ID: &str = "achievement-counter";
const STYLE_ID: &str = "egg-keyframes";
const PANEL_ID: &str = "achievement-panel";

const KEYFRAMES: &str = "
@keyframes egg-slide-in { from { transform: translateX(400px); opacity: 0; } to { transform: translateX(0); opacity: 1; } }
@keyframes egg-slide-out { to { transform: translateX(400px); opacity: 0; } }
@keyframes egg-fade-in { from { opacity: 0; } to { opacity: 1; } }
@keyframes egg-fade-out { to { opacity: 0; } }
@keyframes egg-pop { from { opacity: 0; transform: translate(-50%, -50%) scale(0.3); } to { opacity: 1; transform: translate(-50%, -50%) scale(1); } }
@keyframes egg-rise { 0% { transform: translateY(0) scale(1); opacity: 1; } 100% { transform: translateY(-110vh) scale(1.6); opacity: 0; } }
@keyframes egg-spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } }
@keyframes egg-bounce { 0%, 100% { transform: translateY(0); } 50% { transform: translateY(-10px); } }
@keyframes egg-shake { 0%, 100% { transform: translateX(0); } 25% { transform: translateX(-10px) rotate(-2deg); } 75% { transform: translateX(10px) rotate(2deg); } }
@keyframes egg-blink { 0%, 100% { opacity: 1; } 50% { opacity: 0.2; } }
";

/// Injects the shared keyframes once per page.
pub fn install_styles(doc: &Document) -> Result<()> {
    if doc.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = doc.create_element("style").map_err(EggError::dom)?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(KEYFRAMES));
    let head = doc
        .head()
        .ok_or_else(|| EggError::Dom("no <head>".into()))?;
    head.append_child(&style).map_err(EggError::dom)?;
    Ok(())
}

fn body(doc: &Document) -> Result<HtmlElement> {
    doc.body().ok_or_else(|| EggError::Dom("no <body>".into()))
}

/// Creates `<tag style=..>` with optional plain-text content.
pub fn element(doc: &Document, tag: &str, style: &str, text: Option<&str>) -> Result<Element> {
    let el = doc.create_element(tag).map_err(EggError::dom)?;
    el.set_attribute("style", style).map_err(EggError::dom)?;
    if text.is_some() {
        el.set_text_content(text);
    }
    Ok(el)
}

pub fn append(parent: &Element, child: &Element) -> Result<()> {
    parent.append_child(child).map_err(EggError::dom)?;
    Ok(())
}

/// Appends `el` to `<body>`.
pub fn mount(doc: &Document, el: &Element) -> Result<()> {
    body(doc)?.append_child(el).map_err(EggError::dom)?;
    Ok(())
}

pub fn remove_after(el: Element, ms: u32) {
    after(ms, move || el.remove());
}

pub fn fade_out_after(el: Element, ms: u32) {
    after(ms, move || {
        let _ = el.set_attribute(
            "style",
            &format!(
                "{};animation:egg-fade-out 1s ease-out forwards;",
                el.get_attribute("style").unwrap_or_default()
            ),
        );
        remove_after(el, 1_000);
    });
}

// --- Notifications -----------------------------------------------------------

thread_local! {
    static PANEL: RefCell<Option<Panel>> = const { RefCell::new(None) };
    static NOTICES: RefCell<OverlayQueue<Achievement>> = RefCell::new(OverlayQueue::default());
}

/// Renders unlocks as corner toasts, one at a time in unlock order.
pub struct DomPresenter {
    notification_ms: u32,
}

impl DomPresenter {
    pub fn new(notification_ms: u32) -> Self {
        Self { notification_ms }
    }
}

impl Presenter for DomPresenter {
    fn notify_unlock(&mut self, achievement: &Achievement) {
        let ready = NOTICES.with(|q| q.borrow_mut().offer(achievement.clone()));
        if let Some(a) = ready {
            show_notification(a, self.notification_ms);
        }
    }

    fn refresh_counter(&mut self, unlocked: usize, total: usize) {
        if let Ok(doc) = document() {
            if let Some(badge) = doc.get_element_by_id(COUNTER_ID) {
                badge.set_text_content(Some(&format!("🏆 {unlocked}/{total}")));
            }
        }
    }
}

/// (background, border colour)
fn theme(id: &str) -> (&'static str, &'static str) {
    match id {
        achievements::BULLET_TIME => (
            "linear-gradient(135deg, rgba(138,43,226,0.95), rgba(0,191,255,0.95))",
            "#00bfff",
        ),
        achievements::FIRE_MASTER => (
            "linear-gradient(135deg, rgba(255,69,0,0.95), rgba(255,140,0,0.95))",
            "#ff4500",
        ),
        achievements::CROWN_COLLECTOR => (
            "linear-gradient(135deg, rgba(255,215,0,0.95), rgba(255,165,0,0.95))",
            "#ffd700",
        ),
        achievements::ADMIN_MAYHEM => (
            "linear-gradient(135deg, rgba(139,0,0,0.95), rgba(0,0,0,0.95))",
            "#ff0000",
        ),
        achievements::SPEED_RUNNER => (
            "linear-gradient(135deg, rgba(0,200,83,0.95), rgba(0,150,136,0.95))",
            "#00c853",
        ),
        _ => (
            "linear-gradient(135deg, rgba(255,70,85,0.95), rgba(255,140,0,0.95))",
            "#ff4655",
        ),
    }
}

fn show_notification(achievement: Achievement, visible_ms: u32) {
    if let Err(e) = try_show_notification(&achievement, visible_ms) {
        log::warn!("notification for {} not shown: {e}", achievement.id);
        // keep the queue moving
        next_notification(visible_ms);
    }
}

fn try_show_notification(achievement: &Achievement, visible_ms: u32) -> Result<()> {
    let doc = document()?;
    let (background, border) = theme(&achievement.id);
    let toast = element(
        &doc,
        "div",
        &format!(
            "position:fixed;top:100px;right:20px;background:{background};border:2px solid {border};\
             border-radius:15px;padding:1.2rem 1.5rem;color:#fff;z-index:10003;min-width:280px;\
             box-shadow:0 10px 40px rgba(0,0,0,0.5);animation:egg-slide-in 0.5s ease-out;\
             font-family:'Rajdhani',sans-serif;"
        ),
        None,
    )?;
    append(
        &toast,
        &element(
            &doc,
            "div",
            "font-size:0.8rem;letter-spacing:2px;opacity:0.85;",
            Some("🏆 ACHIEVEMENT UNLOCKED"),
        )?,
    )?;
    append(
        &toast,
        &element(
            &doc,
            "div",
            "font-family:'Orbitron',sans-serif;font-size:1.2rem;font-weight:700;margin:0.3rem 0;",
            Some(&achievement.name),
        )?,
    )?;
    append(
        &toast,
        &element(&doc, "div", "font-size:0.95rem;", Some(&achievement.description))?,
    )?;
    mount(&doc, &toast)?;
    audio::play(Sfx::Fanfare);

    after(visible_ms, move || {
        let _ = toast.set_attribute(
            "style",
            &format!(
                "{};animation:egg-slide-out 0.5s ease-out forwards;",
                toast.get_attribute("style").unwrap_or_default()
            ),
        );
        after(500, move || {
            toast.remove();
            next_notification(visible_ms);
        });
    });
    Ok(())
}

fn next_notification(visible_ms: u32) {
    if let Some(next) = NOTICES.with(|q| q.borrow_mut().finished()) {
        show_notification(next, visible_ms);
    }
}

// --- Trophy badge & panel ----------------------------------------------------

pub fn create_counter(doc: &Document) -> Result<()> {
    if doc.get_element_by_id(COUNTER_ID).is_some() {
        return Ok(());
    }
    let badge = element(
        doc,
        "div",
        "position:fixed;bottom:20px;right:20px;background:rgba(10,14,39,0.95);border:2px solid #ff4655;\
         border-radius:50px;padding:0.8rem 1.5rem;color:#ff4655;font-family:'Orbitron',sans-serif;\
         font-weight:700;font-size:0.9rem;z-index:9998;cursor:pointer;\
         box-shadow:0 5px 20px rgba(255,70,85,0.3);",
        Some("🏆 0/0"),
    )?;
    badge.set_id(COUNTER_ID);
    listen(&badge, "click", |_| {
        if let Err(e) = show_panel() {
            log::warn!("achievement panel: {e}");
        }
    })?;
    mount(doc, &badge)
}

/// The open achievement panel. Dropping it detaches the node and its
/// close listener.
struct Panel {
    backdrop: Element,
    _close: Listener,
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.backdrop.remove();
    }
}

fn show_panel() -> Result<()> {
    let Some((unlocked, total)) = with_engine(|e| {
        let unlocked: Vec<Achievement> = e.registry().iter().filter(|a| a.unlocked).cloned().collect();
        (unlocked, e.registry().total())
    }) else {
        return Ok(());
    };
    open_panel(&unlocked, total)
}

fn panel_open() -> bool {
    PANEL.with(|p| p.borrow().is_some())
}

fn close_panel() {
    let panel = PANEL.with(|p| p.borrow_mut().take());
    drop(panel);
}

fn open_panel(unlocked: &[Achievement], total: usize) -> Result<()> {
    if panel_open() {
        return Ok(());
    }
    let doc = document()?;
    let backdrop = element(
        &doc,
        "div",
        "position:fixed;inset:0;background:rgba(0,0,0,0.8);z-index:10004;display:flex;\
         align-items:center;justify-content:center;animation:egg-fade-in 0.3s ease-out;",
        None,
    )?;
    let panel = element(
        &doc,
        "div",
        "background:rgba(10,14,39,0.98);border:3px solid #ff4655;border-radius:20px;padding:2rem;\
         max-width:600px;width:90%;max-height:80vh;overflow-y:auto;color:#fff;\
         font-family:'Rajdhani',sans-serif;",
        None,
    )?;
    append(
        &panel,
        &element(
            &doc,
            "h2",
            "font-family:'Orbitron',sans-serif;color:#ff4655;text-align:center;margin-bottom:1.5rem;",
            Some(&format!("🏆 ACHIEVEMENTS {}/{}", unlocked.len(), total)),
        )?,
    )?;
    if unlocked.is_empty() {
        append(
            &panel,
            &element(
                &doc,
                "p",
                "text-align:center;color:#b8c5d6;font-size:1.1rem;",
                Some("🔒 No achievements yet. Explore the page to find hidden secrets!"),
            )?,
        )?;
    }
    for a in unlocked {
        let row = element(
            &doc,
            "div",
            "background:rgba(255,70,85,0.1);border-left:4px solid #ff4655;border-radius:10px;\
             padding:1rem;margin-bottom:0.8rem;",
            None,
        )?;
        append(&row, &element(&doc, "div", "font-size:1.2rem;font-weight:700;", Some(&a.name))?)?;
        append(&row, &element(&doc, "div", "color:#b8c5d6;", Some(&a.description))?)?;
        append(&panel, &row)?;
    }
    append(&backdrop, &panel)?;

    backdrop.set_id(PANEL_ID);

    let closing = backdrop.clone();
    let close = Listener::new(&backdrop, "click", move |evt| {
        let on_backdrop = evt
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .is_some_and(|t| t == closing);
        if on_backdrop {
            closing.remove();
            // The listener is still running; release it from a later task.
            defer(close_panel);
        }
    })?;
    mount(&doc, &backdrop)?;
    PANEL.with(|p| {
        *p.borrow_mut() = Some(Panel {
            backdrop,
            _close: close,
        })
    });
    Ok(())
}

// --- Messages & dialogues ----------------------------------------------------

/// Centered one-second message.
pub fn quick_message(text: &str, color: &str) {
    let shown = document().and_then(|doc| {
        let msg = element(
            &doc,
            "div",
            &format!(
                "position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);\
                 font-family:'Orbitron',sans-serif;font-size:2rem;font-weight:900;color:{color};\
                 text-shadow:0 0 20px {color};z-index:10005;pointer-events:none;\
                 animation:egg-pop 0.3s ease-out;"
            ),
            Some(text),
        )?;
        mount(&doc, &msg)?;
        Ok(msg)
    });
    match shown {
        Ok(msg) => remove_after(msg, 1_000),
        Err(e) => log::debug!("quick message dropped: {e}"),
    }
}

/// Speech bubble pinned above `card` for three seconds.
pub fn speech_bubble(card: &Element, text: &str) {
    let shown = document().and_then(|doc| {
        let rect = card.get_bounding_client_rect();
        let bubble = element(
            &doc,
            "div",
            &format!(
                "position:fixed;left:{}px;top:{}px;transform:translate(-50%,-100%);\
                 background:#fff;color:#0a0e27;border-radius:15px;padding:0.8rem 1.2rem;\
                 font-family:'Rajdhani',sans-serif;font-weight:700;font-size:1.1rem;\
                 z-index:10005;box-shadow:0 5px 20px rgba(0,0,0,0.3);pointer-events:none;\
                 animation:egg-fade-in 0.3s ease-out;",
                rect.left() + rect.width() / 2.0,
                (rect.top() - 10.0).max(10.0)
            ),
            Some(text),
        )?;
        mount(&doc, &bubble)?;
        Ok(bubble)
    });
    match shown {
        Ok(bubble) => remove_after(bubble, 3_000),
        Err(e) => log::debug!("speech bubble dropped: {e}"),
    }
}

/// Modal dialogue box. Returns the mounted overlay and its action button.
pub fn dialogue(
    accent: &str,
    emoji: &str,
    speaker: &str,
    lines: &[&str],
    action: Option<&str>,
) -> Result<(Element, Option<Element>)> {
    let doc = document()?;
    let boxed = element(
        &doc,
        "div",
        &format!(
            "position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);\
             background:rgba(10,14,39,0.98);border:3px solid {accent};border-radius:20px;\
             padding:2rem 3rem;max-width:560px;z-index:10000;color:#b8c5d6;\
             box-shadow:0 0 50px {accent};animation:egg-pop 0.3s ease-out;\
             font-family:'Rajdhani',sans-serif;"
        ),
        None,
    )?;
    append(
        &boxed,
        &element(&doc, "div", "font-size:3rem;text-align:center;margin-bottom:1rem;", Some(emoji))?,
    )?;
    append(
        &boxed,
        &element(
            &doc,
            "h2",
            &format!("font-family:'Orbitron',sans-serif;color:{accent};text-align:center;margin-bottom:1rem;"),
            Some(speaker),
        )?,
    )?;
    for line in lines {
        append(
            &boxed,
            &element(&doc, "p", "font-size:1.1rem;line-height:1.6;margin-bottom:1rem;", Some(line))?,
        )?;
    }
    let button = match action {
        Some(label) => {
            let btn = element(
                &doc,
                "button",
                "width:100%;background:linear-gradient(135deg,#ff4655,#ff8c00);border:none;\
                 padding:1rem;border-radius:10px;color:#fff;font-family:'Orbitron',sans-serif;\
                 font-size:1.1rem;cursor:pointer;",
                Some(label),
            )?;
            append(&boxed, &btn)?;
            Some(btn)
        }
        None => None,
    };
    mount(&doc, &boxed)?;
    Ok((boxed, button))
}

// --- Unlock effects ----------------------------------------------------------

fn full_screen(doc: &Document, background: &str, z: u32) -> Result<Element> {
    element(
        doc,
        "div",
        &format!(
            "position:fixed;inset:0;background:{background};z-index:{z};pointer-events:none;\
             overflow:hidden;animation:egg-fade-in 0.3s ease-out;"
        ),
        None,
    )
}

fn banner(doc: &Document, color: &str, title: &str, subtitle: &str) -> Result<Element> {
    let b = element(
        doc,
        "div",
        &format!(
            "position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);text-align:center;\
             z-index:10001;pointer-events:none;animation:egg-pop 0.6s ease-out;color:{color};\
             text-shadow:0 0 30px {color};"
        ),
        None,
    )?;
    append(
        &b,
        &element(
            doc,
            "div",
            "font-family:'Orbitron',sans-serif;font-size:3.5rem;font-weight:900;",
            Some(title),
        )?,
    )?;
    append(
        &b,
        &element(doc, "div", "font-family:'Rajdhani',sans-serif;font-size:1.5rem;", Some(subtitle))?,
    )?;
    Ok(b)
}

fn play_effect(background: &str, particle: &str, color: &str, title: &str, subtitle: &str, ms: u32) -> Result<()> {
    let doc = document()?;
    let layer = full_screen(&doc, background, 9999)?;
    for i in 0..30u32 {
        let left = (super::rand_index(100) + i as usize * 37) % 100;
        let delay = (i % 10) as f64 * 0.15;
        let p = element(
            &doc,
            "div",
            &format!(
                "position:absolute;bottom:-60px;left:{left}%;font-size:{}rem;\
                 animation:egg-rise {}s ease-in {delay}s forwards;",
                2 + i % 3,
                2.5 + (i % 4) as f64 * 0.5
            ),
            Some(particle),
        )?;
        append(&layer, &p)?;
    }
    let text = banner(&doc, color, title, subtitle)?;
    mount(&doc, &layer)?;
    mount(&doc, &text)?;
    remove_after(layer, ms);
    remove_after(text, ms);
    Ok(())
}

pub fn fire_explosion() -> Result<()> {
    audio::play(Sfx::FireBurst);
    log::info!("🔥🔥🔥 FIRE MASTER UNLOCKED! Promo code: FIREPOWER");
    play_effect(
        "radial-gradient(circle, rgba(255,69,0,0.35), transparent 70%)",
        "🔥",
        "#ff4500",
        "🔥 FIRE MASTER 🔥",
        "Promo code: FIREPOWER",
        5_000,
    )
}

pub fn bullet_time() -> Result<()> {
    audio::play(Sfx::BulletTime);
    log::info!("⚡ BULLET TIME ACTIVATED ⚡");
    play_effect(
        "rgba(0,20,0,0.85)",
        "⚡",
        "#00ff00",
        "⚡ BULLET TIME ⚡",
        "The world slows down...",
        6_000,
    )
}

pub fn crown_collector() -> Result<()> {
    audio::play(Sfx::Fanfare);
    log::info!("👑👑👑 CROWN COLLECTOR UNLOCKED! All hail the founder!");
    play_effect(
        "radial-gradient(circle, rgba(255,215,0,0.45), rgba(0,0,0,0.6))",
        "👑",
        "#ffd700",
        "CROWN COLLECTOR!",
        "You have honored the founder!",
        5_000,
    )
}
