//! Runtime configuration. Every field has a default so a page can override only
//! what differs (e.g. a second page with different card ids).

use serde::{Deserialize, Serialize};

use crate::battle::BattleConfig;
use crate::error::{EggError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EggConfig {
    pub log_level: String,
    pub storage: StorageKeys,
    pub fire_icon: BurstConfig,
    pub title: BurstConfig,
    pub owner_card: BurstConfig,
    pub manager: PesterConfig,
    pub scroll: ScrollConfig,
    pub sections: SectionConfig,
    pub cards: CardIds,
    pub selectors: Selectors,
    pub finale: FinaleConfig,
    pub quest_battle: BattleConfig,
    pub pester_battle: BattleConfig,
    /// How long an unlock notification stays before sliding out.
    pub notification_ms: u32,
}

impl Default for EggConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            storage: StorageKeys::default(),
            fire_icon: BurstConfig::new(10, Some(2_000.0)),
            title: BurstConfig::new(7, Some(2_000.0)),
            owner_card: BurstConfig {
                threshold: 15,
                window_ms: Some(3_000.0),
                hints: vec![
                    Hint::new(5, "👑 Keep going..."),
                    Hint::new(10, "👑 Halfway there!"),
                ],
            },
            manager: PesterConfig::default(),
            scroll: ScrollConfig::default(),
            sections: SectionConfig::default(),
            cards: CardIds::default(),
            selectors: Selectors::default(),
            finale: FinaleConfig::default(),
            quest_battle: BattleConfig::quest(),
            pester_battle: BattleConfig::pester(),
            notification_ms: 4_000,
        }
    }
}

impl EggConfig {
    /// Parses a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: EggConfig =
            serde_json::from_str(json).map_err(|e| EggError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, burst) in [
            ("fire_icon", &self.fire_icon),
            ("title", &self.title),
            ("owner_card", &self.owner_card),
        ] {
            if burst.threshold == 0 {
                return Err(EggError::Config(format!("{name}.threshold must be > 0")));
            }
        }
        if self.manager.unlock_at == 0 {
            return Err(EggError::Config("manager.unlock_at must be > 0".into()));
        }
        if let Some(battle_at) = self.manager.battle_at {
            if battle_at <= self.manager.unlock_at {
                return Err(EggError::Config(format!(
                    "manager.battle_at ({battle_at}) must come after unlock_at ({})",
                    self.manager.unlock_at
                )));
            }
        }
        if self.sections.required.is_empty() {
            return Err(EggError::Config("sections.required is empty".into()));
        }
        self.quest_battle.validate()?;
        self.pester_battle.validate()?;
        Ok(())
    }

    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub achievements: String,
    pub quest: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            achievements: "shootz_achievements".into(),
            quest: "shootz_quest_progress".into(),
        }
    }
}

/// A click target that must be hit `threshold` times in one contiguous burst.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub threshold: u32,
    /// `None` means progress never decays.
    pub window_ms: Option<f64>,
    pub hints: Vec<Hint>,
}

impl BurstConfig {
    pub fn new(threshold: u32, window_ms: Option<f64>) -> Self {
        Self {
            threshold,
            window_ms,
            hints: Vec::new(),
        }
    }
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self::new(10, Some(2_000.0))
    }
}

/// Text shown when a counter reaches an intermediate count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub at: u32,
    pub text: String,
}

impl Hint {
    pub fn new(at: u32, text: &str) -> Self {
        Self {
            at,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PesterConfig {
    pub lines: Vec<Hint>,
    pub unlock_at: u32,
    /// Count at which the pester boss battle starts (once per page load).
    pub battle_at: Option<u32>,
}

impl Default for PesterConfig {
    fn default() -> Self {
        Self {
            lines: vec![
                Hint::new(1, "🍪 Still thinking about that cookie..."),
                Hint::new(3, "Why do you keep clicking me?"),
                Hint::new(6, "The cookie is gone, stop!"),
                Hint::new(9, "I learned my lesson already!"),
                Hint::new(12, "Fine! Take your achievement!"),
                Hint::new(20, "Seriously. Stop."),
                Hint::new(30, "That's it. You asked for it!"),
            ],
            unlock_at: 12,
            battle_at: Some(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Distance from the document edges still counted as "at" the edge.
    pub margin_px: f64,
    pub window_ms: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            margin_px: 100.0,
            window_ms: 3_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub required: Vec<String>,
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            required: ["home", "about", "team", "features", "controls", "updates"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            threshold: 0.25,
            root_margin: "0px 0px -20% 0px".into(),
        }
    }
}

/// Stable identifiers of the team cards the easter eggs bind to. Matched
/// against `data-member` first and the visible name second.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CardIds {
    pub owner: String,
    pub quest_giver: String,
    pub manager: String,
}

impl Default for CardIds {
    fn default() -> Self {
        Self {
            owner: "vonrosie".into(),
            quest_giver: "kit_cat350".into(),
            manager: "NikVonWittelsbach".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub fire_icon: String,
    pub title: String,
    pub team_card: String,
    pub card_name: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            fire_icon: ".logo-icon".into(),
            title: ".glitch".into(),
            team_card: ".team-card".into(),
            card_name: ".team-name".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinaleConfig {
    pub reveal_ms: u32,
    pub countdown_steps: u32,
    pub step_ms: u32,
    pub troll_ms: u32,
}

impl Default for FinaleConfig {
    fn default() -> Self {
        Self {
            reveal_ms: 4_000,
            countdown_steps: 10,
            step_ms: 1_000,
            troll_ms: 5_000,
        }
    }
}
