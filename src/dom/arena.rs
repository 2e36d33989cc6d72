//! Boss battle session on the page.
//!
//! A session owns every timer, listener and node it creates; dropping the
//! [`Arena`] tears all of it down. Only one session runs at a time and every
//! callback checks its session token before touching state.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent};

use super::overlay::{append, element, mount};
use super::timers::{Interval, Listener, after, defer};
use super::{document, now, rand_index};
use crate::audio::{self, Sfx};
use crate::battle::{Battle, BattleConfig, BattlePhase, Hit, SessionGate, SessionToken, TargetId};
use crate::error::{EggError, Result};

thread_local! {
    static GATE: RefCell<SessionGate> = RefCell::new(SessionGate::default());
    static ARENA: RefCell<Option<Arena>> = const { RefCell::new(None) };
}

struct Arena {
    token: SessionToken,
    battle: Battle,
    backdrop: Element,
    hud: Element,
    heading: Element,
    fill: Element,
    percent: Element,
    boss_card: Option<Element>,
    targets: Vec<(TargetId, Element)>,
    banners: Vec<Element>,
    on_victory: Option<Box<dyn FnOnce()>>,
    load: Option<Interval>,
    spawn: Option<Interval>,
    music: Option<Interval>,
    listeners: Vec<Listener>,
}

impl Drop for Arena {
    fn drop(&mut self) {
        for (_, el) in self.targets.drain(..) {
            el.remove();
        }
        for el in self.banners.drain(..) {
            el.remove();
        }
        self.hud.remove();
        self.backdrop.remove();
        set_shaking(self.boss_card.as_ref(), false);
    }
}

impl Arena {
    fn render_health(&self) {
        let pct = self.battle.health_percent();
        let _ = self.fill.set_attribute("style", &fill_style(pct));
        self.percent
            .set_text_content(Some(&format!("{}%", pct.round() as u32)));
    }

    fn remove_target(&mut self, id: TargetId) {
        if let Some(pos) = self.targets.iter().position(|(t, _)| *t == id) {
            let (_, el) = self.targets.remove(pos);
            el.remove();
        }
    }

    /// Applies a landed hit. Returns true if it won the battle.
    fn apply_hit(&mut self, hit: &Hit) -> bool {
        self.render_health();
        audio::play(Sfx::Hit);
        let Some(remaining) = &hit.defeated else {
            return false;
        };
        for id in remaining {
            self.remove_target(*id);
        }
        for interval in [&mut self.spawn, &mut self.music].into_iter().flatten() {
            interval.cancel();
        }
        set_shaking(self.boss_card.as_ref(), false);
        true
    }
}

fn fill_style(pct: f64) -> String {
    format!(
        "height:100%;width:{pct}%;background:linear-gradient(90deg,#ff4655,#ff8c00);\
         border-radius:10px;transition:width 0.1s linear;"
    )
}

fn set_shaking(card: Option<&Element>, on: bool) {
    if let Some(html) = card.and_then(|c| c.dyn_ref::<HtmlElement>()) {
        let style = html.style();
        let _ = if on {
            style.set_property("animation", "egg-shake 0.3s infinite")
        } else {
            style.remove_property("animation").map(|_| ())
        };
    }
}

/// Runs `f` on the arena if `token` still owns it.
fn with_arena<R>(token: SessionToken, f: impl FnOnce(&mut Arena) -> R) -> Option<R> {
    ARENA.with(|cell| {
        let mut guard = cell.try_borrow_mut().ok()?;
        match guard.as_mut() {
            Some(arena) if arena.token == token => Some(f(arena)),
            _ => None,
        }
    })
}

/// Starts a battle session; `on_victory` runs after the victory banner.
pub fn launch(
    cfg: BattleConfig,
    boss_card: Option<Element>,
    on_victory: impl FnOnce() + 'static,
) -> Result<()> {
    let token = GATE.with(|g| g.borrow_mut().try_begin())?;
    match build(token, cfg, boss_card, Box::new(on_victory)) {
        Ok(arena) => {
            log::info!("battle started: {}", arena.battle.config().title);
            ARENA.with(|cell| *cell.borrow_mut() = Some(arena));
            Ok(())
        }
        Err(e) => {
            GATE.with(|g| g.borrow_mut().end(token));
            Err(e)
        }
    }
}

fn build(
    token: SessionToken,
    cfg: BattleConfig,
    boss_card: Option<Element>,
    on_victory: Box<dyn FnOnce()>,
) -> Result<Arena> {
    let doc = document()?;
    let backdrop = element(
        &doc,
        "div",
        "position:fixed;inset:0;background:rgba(139,0,0,0.25);z-index:9990;pointer-events:none;\
         animation:egg-fade-in 0.5s ease-out;",
        None,
    )?;
    let hud = element(
        &doc,
        "div",
        "position:fixed;top:20px;left:50%;transform:translateX(-50%);width:min(600px,90vw);\
         background:rgba(10,14,39,0.95);border:3px solid #ff4655;border-radius:15px;padding:1rem;\
         z-index:10001;text-align:center;font-family:'Orbitron',sans-serif;color:#fff;",
        None,
    )?;
    append(
        &hud,
        &element(&doc, "div", "font-size:1.2rem;font-weight:900;color:#ff4655;", Some(&cfg.title))?,
    )?;
    let heading = element(&doc, "div", "font-size:0.9rem;margin:0.4rem 0;", Some("LOADING..."))?;
    append(&hud, &heading)?;
    let track = element(
        &doc,
        "div",
        "height:20px;background:rgba(255,255,255,0.1);border-radius:10px;overflow:hidden;",
        None,
    )?;
    let fill = element(&doc, "div", &fill_style(0.0), None)?;
    append(&track, &fill)?;
    append(&hud, &track)?;
    let percent = element(&doc, "div", "font-size:0.9rem;margin-top:0.4rem;", Some("0%"))?;
    append(&hud, &percent)?;
    mount(&doc, &backdrop)?;
    mount(&doc, &hud)?;
    set_shaking(boss_card.as_ref(), true);

    let music = Interval::new(cfg.music_interval_ms, || audio::play(Sfx::BossRiff))?;
    audio::play(Sfx::BossRiff);
    let fight_delay = cfg.fight_delay_ms;
    let load = Interval::new(cfg.load_tick_ms, move || {
        let full = with_arena(token, |a| {
            let full = a.battle.load_tick();
            a.render_health();
            if full {
                if let Some(load) = a.load.as_mut() {
                    load.cancel();
                }
            }
            full
        });
        if full == Some(true) {
            after(fight_delay, move || begin_fight(token));
        }
    })?;

    Ok(Arena {
        token,
        battle: Battle::new(cfg),
        backdrop,
        hud,
        heading,
        fill,
        percent,
        boss_card,
        targets: Vec::new(),
        banners: Vec::new(),
        on_victory: Some(on_victory),
        load: Some(load),
        spawn: None,
        music: Some(music),
        listeners: Vec::new(),
    })
}

fn begin_fight(token: SessionToken) {
    let started = with_arena(token, |a| -> Result<()> {
        if !a.battle.start() {
            return Ok(());
        }
        a.heading.set_text_content(Some("FIGHT!"));
        a.spawn = Some(Interval::new(
            a.battle.config().spawn_interval_ms,
            move || {
                if let Err(e) = spawn_target(token) {
                    log::warn!("target spawn failed: {e}");
                }
            },
        )?);
        let doc = document()?;
        a.listeners.push(Listener::new(&doc, "keydown", move |evt| {
            if let Some(key) = evt.dyn_ref::<KeyboardEvent>() {
                on_key(token, key);
            }
        })?);
        Ok(())
    });
    if let Some(Err(e)) = started {
        log::warn!("battle could not start: {e}");
    }
}

fn spawn_target(token: SessionToken) -> Result<()> {
    let lifetime = with_arena(token, |a| -> Result<Option<u32>> {
        if a.battle.phase() != BattlePhase::Active {
            return Ok(None);
        }
        let keys = &a.battle.config().keys;
        let key = keys[rand_index(keys.len())];
        let Some(target) = a.battle.spawn(key, now()) else {
            return Ok(None);
        };

        let doc = document()?;
        let win = web_sys::window().ok_or_else(|| EggError::Dom("no window".into()))?;
        let width = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        let height = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
        let x = rand_index((width - 100.0).max(1.0) as usize);
        let y = rand_index((height - 200.0).max(1.0) as usize) + 100;
        let bubble = element(
            &doc,
            "div",
            &format!(
                "position:fixed;left:{x}px;top:{y}px;width:80px;height:80px;\
                 background:linear-gradient(135deg,#ff4655,#ff8c00);border:3px solid #fff;\
                 border-radius:50%;display:flex;align-items:center;justify-content:center;\
                 font-family:'Orbitron',sans-serif;font-size:2rem;font-weight:900;color:#fff;\
                 z-index:10000;cursor:pointer;animation:egg-pop 0.3s ease-out;"
            ),
            Some(&target.key.to_string()),
        )?;
        let id = target.id;
        a.listeners.push(Listener::new(&bubble, "click", move |_| {
            let hit = with_arena(token, |a| {
                let hit = a.battle.hit_target(id)?;
                a.remove_target(id);
                Some(a.apply_hit(&hit))
            });
            if hit.flatten() == Some(true) {
                victory(token);
            }
        })?);
        mount(&doc, &bubble)?;
        a.targets.push((id, bubble));
        Ok(Some(a.battle.config().target_lifetime_ms as u32))
    });

    if let Some(Some(ms)) = lifetime.transpose()? {
        after(ms, move || {
            with_arena(token, |a| {
                for id in a.battle.expire(now()) {
                    a.remove_target(id);
                }
            });
        });
    }
    Ok(())
}

fn on_key(token: SessionToken, evt: &KeyboardEvent) {
    let won = with_arena(token, |a| {
        let hit = match a.battle.strike(&evt.code()) {
            Some(hit) => hit,
            None => {
                let key = evt.key();
                let mut chars = key.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return false;
                };
                let Some((id, hit)) = a.battle.hit_key(c) else {
                    return false;
                };
                a.remove_target(id);
                hit
            }
        };
        evt.prevent_default();
        a.apply_hit(&hit)
    });
    if won == Some(true) {
        victory(token);
    }
}

fn victory(token: SessionToken) {
    let finished = with_arena(token, |a| {
        let banner = show_victory(&a.battle.config().victory_text);
        match banner {
            Ok(b) => a.banners.push(b),
            Err(e) => log::warn!("victory banner: {e}"),
        }
        log::info!("battle won: {}", a.battle.config().title);
        (a.on_victory.take(), a.battle.config().victory_ms)
    });
    let Some((on_victory, ms)) = finished else {
        return;
    };
    // Teardown drops the listener that is running right now, so it waits
    // for a later task.
    after(ms, move || {
        let arena = ARENA.with(|cell| {
            let mut slot = cell.borrow_mut();
            match slot.as_ref() {
                Some(a) if a.token == token => slot.take(),
                _ => None,
            }
        });
        drop(arena);
        GATE.with(|g| g.borrow_mut().end(token));
        if let Some(cb) = on_victory {
            defer(cb);
        }
    });
}

fn show_victory(text: &str) -> Result<Element> {
    let doc = document()?;
    let banner = element(
        &doc,
        "div",
        "position:fixed;top:50%;left:50%;transform:translate(-50%,-50%);\
         background:rgba(10,14,39,0.98);border:4px solid #ffd700;border-radius:20px;padding:3rem;\
         text-align:center;z-index:10002;box-shadow:0 20px 60px rgba(255,215,0,0.5);\
         animation:egg-pop 0.6s ease-out;",
        None,
    )?;
    append(&banner, &element(&doc, "div", "font-size:4rem;margin-bottom:1rem;", Some("🏆"))?)?;
    append(
        &banner,
        &element(
            &doc,
            "h2",
            "font-family:'Orbitron',sans-serif;color:#ffd700;font-size:2.5rem;margin-bottom:1rem;",
            Some("VICTORY!"),
        )?,
    )?;
    append(
        &banner,
        &element(&doc, "p", "color:#ff8c00;font-size:1.5rem;", Some(text))?,
    )?;
    mount(&doc, &banner)?;
    audio::play(Sfx::Fanfare);
    Ok(banner)
}
