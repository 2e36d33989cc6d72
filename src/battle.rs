//! Boss battle minigame core.
//!
//! One parameterized state machine serves both the quest fight and the
//! pester escalation. Health first loads from 0 to `max_health`, then input
//! from two channels (clicking a target, pressing its key) plus an optional
//! strike key decrements it, clamped at zero.

use serde::{Deserialize, Serialize};

use crate::error::{EggError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub title: String,
    pub victory_text: String,
    pub max_health: u32,
    pub load_step: u32,
    pub load_tick_ms: u32,
    pub fight_delay_ms: u32,
    pub spawn_interval_ms: u32,
    pub target_lifetime_ms: f64,
    pub click_damage: u32,
    pub key_damage: u32,
    /// `KeyboardEvent.code` of the strike key, if strikes are enabled.
    pub strike_code: Option<String>,
    pub strike_damage: u32,
    pub keys: Vec<char>,
    pub music_interval_ms: u32,
    pub victory_ms: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            title: "BOSS".into(),
            victory_text: "VICTORY!".into(),
            max_health: 100,
            load_step: 2,
            load_tick_ms: 30,
            fight_delay_ms: 500,
            spawn_interval_ms: 1_500,
            target_lifetime_ms: 3_000.0,
            click_damage: 10,
            key_damage: 10,
            strike_code: None,
            strike_damage: 5,
            keys: vec!['Q', 'W', 'E', 'A', 'S', 'D'],
            music_interval_ms: 2_000,
            victory_ms: 3_000,
        }
    }
}

impl BattleConfig {
    pub fn quest() -> Self {
        Self {
            title: "MANAGER'S PATIENCE".into(),
            victory_text: "You got the cookie! 🍪".into(),
            ..Self::default()
        }
    }

    pub fn pester() -> Self {
        Self {
            title: "MANAGER IS ANGRY".into(),
            victory_text: "The manager gives up. For now.".into(),
            strike_code: Some("Space".into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_health == 0 || self.load_step == 0 {
            return Err(EggError::Config("battle health and load step must be > 0".into()));
        }
        if self.keys.is_empty() {
            return Err(EggError::Config("battle needs at least one target key".into()));
        }
        Ok(())
    }
}

pub type TargetId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: TargetId,
    pub key: char,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    Loading,
    Active,
    Won,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub health: u32,
    /// Set on the hit that defeated the boss: every target still alive,
    /// which the caller must tear down.
    pub defeated: Option<Vec<TargetId>>,
}

#[derive(Debug, Clone)]
pub struct Battle {
    cfg: BattleConfig,
    health: u32,
    phase: BattlePhase,
    targets: Vec<Target>,
    next_id: TargetId,
}

impl Battle {
    pub fn new(cfg: BattleConfig) -> Self {
        Self {
            cfg,
            health: 0,
            phase: BattlePhase::Loading,
            targets: Vec::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.cfg
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn health_percent(&self) -> f64 {
        self.health as f64 * 100.0 / self.cfg.max_health as f64
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// One loading tick. Returns true once health is full.
    pub fn load_tick(&mut self) -> bool {
        if self.phase == BattlePhase::Loading {
            self.health = (self.health + self.cfg.load_step).min(self.cfg.max_health);
        }
        self.health >= self.cfg.max_health
    }

    pub fn start(&mut self) -> bool {
        if self.phase == BattlePhase::Loading && self.health >= self.cfg.max_health {
            self.phase = BattlePhase::Active;
            true
        } else {
            false
        }
    }

    pub fn spawn(&mut self, key: char, now: f64) -> Option<Target> {
        if self.phase != BattlePhase::Active {
            return None;
        }
        let target = Target {
            id: self.next_id,
            key: key.to_ascii_uppercase(),
            expires_at: now + self.cfg.target_lifetime_ms,
        };
        self.next_id += 1;
        self.targets.push(target);
        Some(target)
    }

    /// Click on target `id`. `None` if it is already gone.
    pub fn hit_target(&mut self, id: TargetId) -> Option<Hit> {
        if self.phase != BattlePhase::Active {
            return None;
        }
        let idx = self.targets.iter().position(|t| t.id == id)?;
        self.targets.remove(idx);
        Some(self.damage(self.cfg.click_damage))
    }

    /// Key press: destroys the oldest live target showing `key`.
    pub fn hit_key(&mut self, key: char) -> Option<(TargetId, Hit)> {
        if self.phase != BattlePhase::Active {
            return None;
        }
        let key = key.to_ascii_uppercase();
        let idx = self.targets.iter().position(|t| t.key == key)?;
        let target = self.targets.remove(idx);
        Some((target.id, self.damage(self.cfg.key_damage)))
    }

    pub fn strike(&mut self, code: &str) -> Option<Hit> {
        if self.phase != BattlePhase::Active || self.cfg.strike_code.as_deref() != Some(code) {
            return None;
        }
        Some(self.damage(self.cfg.strike_damage))
    }

    /// Removes targets whose lifetime ran out, returning their ids.
    pub fn expire(&mut self, now: f64) -> Vec<TargetId> {
        let mut gone = Vec::new();
        self.targets.retain(|t| {
            let alive = t.expires_at > now;
            if !alive {
                gone.push(t.id);
            }
            alive
        });
        gone
    }

    fn damage(&mut self, amount: u32) -> Hit {
        self.health = self.health.saturating_sub(amount);
        let defeated = if self.health == 0 {
            self.phase = BattlePhase::Won;
            Some(self.targets.drain(..).map(|t| t.id).collect())
        } else {
            None
        };
        Hit {
            health: self.health,
            defeated,
        }
    }
}

/// Opaque id of one running battle session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Allows one battle session at a time; stale callbacks compare their token
/// against the current one and bail out.
#[derive(Debug, Default)]
pub struct SessionGate {
    active: Option<SessionToken>,
    next: u64,
}

impl SessionGate {
    pub fn try_begin(&mut self) -> Result<SessionToken> {
        if self.active.is_some() {
            return Err(EggError::SessionBusy);
        }
        self.next += 1;
        let token = SessionToken(self.next);
        self.active = Some(token);
        Ok(token)
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.active == Some(token)
    }

    pub fn end(&mut self, token: SessionToken) -> bool {
        if self.is_current(token) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(cfg: BattleConfig) -> Battle {
        let mut b = Battle::new(cfg);
        let mut ticks = 0;
        while !b.load_tick() {
            ticks += 1;
        }
        assert_eq!(ticks + 1, 50);
        assert!(b.start());
        b
    }

    #[test]
    fn cannot_fight_before_loaded() {
        let mut b = Battle::new(BattleConfig::quest());
        assert!(!b.start());
        assert!(b.spawn('Q', 0.0).is_none());
        b.load_tick();
        assert_eq!(b.health(), 2);
        assert!(!b.start());
    }

    #[test]
    fn ten_click_hits_defeat_the_boss() {
        let mut b = ready(BattleConfig::quest());
        for i in 0..10 {
            let t = b.spawn('W', i as f64).unwrap();
            let hit = b.hit_target(t.id).unwrap();
            assert_eq!(hit.defeated.is_some(), i == 9);
        }
        assert_eq!(b.phase(), BattlePhase::Won);
        assert_eq!(b.health(), 0);
    }

    #[test]
    fn mixed_channels_share_the_health_pool() {
        let mut b = ready(BattleConfig::quest());
        for i in 0..5 {
            let t = b.spawn('A', i as f64).unwrap();
            b.hit_target(t.id).unwrap();
        }
        assert_eq!(b.health(), 50);
        for i in 0..4 {
            b.spawn('s', i as f64);
            let (_, hit) = b.hit_key('S').unwrap();
            assert!(hit.defeated.is_none());
        }
        b.spawn('D', 0.0);
        let (_, hit) = b.hit_key('d').unwrap();
        assert_eq!(hit.health, 0);
        assert!(hit.defeated.is_some());
    }

    #[test]
    fn target_counts_once_across_channels() {
        let mut b = ready(BattleConfig::quest());
        let t = b.spawn('E', 0.0).unwrap();
        assert!(b.hit_key('E').is_some());
        assert!(b.hit_target(t.id).is_none());
        assert_eq!(b.health(), 90);
    }

    #[test]
    fn health_is_clamped_and_victory_tears_down_targets() {
        let cfg = BattleConfig {
            click_damage: 35,
            ..BattleConfig::quest()
        };
        let mut b = ready(cfg);
        let a = b.spawn('Q', 0.0).unwrap();
        let w = b.spawn('W', 0.0).unwrap();
        assert_eq!(b.hit_target(a.id).unwrap().health, 65);
        let hit = b.hit_target(w.id).unwrap();
        assert_eq!(hit.health, 30);
        assert!(hit.defeated.is_none());
        let c = b.spawn('A', 0.0).unwrap();
        let d = b.spawn('S', 0.0).unwrap();
        b.hit_target(c.id);
        assert_eq!(b.health(), 0);
        assert_eq!(b.targets().len(), 0);
        assert!(b.hit_target(d.id).is_none());
        assert!(b.spawn('Q', 10.0).is_none());
    }

    #[test]
    fn defeat_reports_remaining_targets() {
        let cfg = BattleConfig {
            click_damage: 100,
            ..BattleConfig::quest()
        };
        let mut b = ready(cfg);
        let first = b.spawn('Q', 0.0).unwrap();
        let other = b.spawn('W', 0.0).unwrap();
        let hit = b.hit_target(first.id).unwrap();
        assert_eq!(hit.defeated, Some(vec![other.id]));
    }

    #[test]
    fn strike_only_when_configured() {
        let mut quest = ready(BattleConfig::quest());
        assert!(quest.strike("Space").is_none());
        let mut pester = ready(BattleConfig::pester());
        assert_eq!(pester.strike("Space").unwrap().health, 95);
        assert!(pester.strike("Enter").is_none());
    }

    #[test]
    fn targets_expire_after_lifetime() {
        let mut b = ready(BattleConfig::quest());
        let t0 = b.spawn('Q', 0.0).unwrap();
        let t1 = b.spawn('W', 1_500.0).unwrap();
        assert!(b.expire(2_999.0).is_empty());
        assert_eq!(b.expire(3_000.0), vec![t0.id]);
        assert!(b.hit_target(t0.id).is_none());
        assert_eq!(b.expire(10_000.0), vec![t1.id]);
        assert_eq!(b.health(), 100);
    }

    #[test]
    fn one_session_at_a_time() {
        let mut gate = SessionGate::default();
        let first = gate.try_begin().unwrap();
        assert!(matches!(gate.try_begin(), Err(EggError::SessionBusy)));
        assert!(gate.end(first));
        assert!(!gate.end(first));
        let second = gate.try_begin().unwrap();
        assert_ne!(first, second);
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }
}
