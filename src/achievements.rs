//! Achievement catalog and registry.
//!
//! The catalog is static data; the registry owns the mutable `unlocked`
//! flags. Ids double as keys of the persisted JSON blob.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EggError, Result};

pub const FIRE_MASTER: &str = "fireMaster";
pub const BULLET_TIME: &str = "bulletTime";
pub const SPEED_RUNNER: &str = "speedRunner";
pub const CONSOLE_WARRIOR: &str = "consoleWarrior";
pub const EXPLORER: &str = "explorer";
pub const ANNOYING_PLAYER: &str = "annoyingPlayer";
pub const CROWN_COLLECTOR: &str = "crownCollector";
pub const ADMIN_MAYHEM: &str = "adminMayhem";

/// (id, display name, description)
pub const CATALOG: &[(&str, &str, &str)] = &[
    (FIRE_MASTER, "🔥 Fire Master", "Click the fire emoji 10 times"),
    (BULLET_TIME, "⚡ Bullet Time", "Click the SHOOTZ title 7 times"),
    (SPEED_RUNNER, "🏃 Speed Runner", "Scroll to bottom and back to top in 3 seconds"),
    (CONSOLE_WARRIOR, "🎮 Console Warrior", "Use developer console commands"),
    (EXPLORER, "👀 Explorer", "Visit all page sections"),
    (ANNOYING_PLAYER, "😤 Annoying Player", "Clicked the manager 12 times"),
    (CROWN_COLLECTOR, "👑 Crown Collector", "Show respect to the founder"),
    (ADMIN_MAYHEM, "😈 Admin Mayhem", "Unleash the admin's troll power"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
}

impl Achievement {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            unlocked: false,
        }
    }
}

/// Shape read back from storage. Only the flag matters; name and
/// description always come from the catalog.
#[derive(Debug, Default, Deserialize)]
pub struct SavedAchievement {
    #[serde(default)]
    pub unlocked: bool,
}

pub type SavedAchievements = HashMap<String, SavedAchievement>;

#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<Achievement>,
}

impl Registry {
    pub fn new(entries: Vec<Achievement>) -> Self {
        Self { entries }
    }

    pub fn from_catalog() -> Self {
        Self::new(
            CATALOG
                .iter()
                .map(|(id, name, desc)| Achievement::new(id, name, desc))
                .collect(),
        )
    }

    pub fn get(&self, id: &str) -> Result<&Achievement> {
        self.entries
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| EggError::UnknownAchievement(id.into()))
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.get(id).map(|a| a.unlocked).unwrap_or(false)
    }

    /// Flips `id` to unlocked. `Ok(None)` when it already was.
    pub fn unlock(&mut self, id: &str) -> Result<Option<&Achievement>> {
        let entry = self
            .entries
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| EggError::UnknownAchievement(id.into()))?;
        if entry.unlocked {
            return Ok(None);
        }
        entry.unlocked = true;
        Ok(Some(&*entry))
    }

    /// Stored flags win over the defaults; unknown stored ids are ignored.
    pub fn rehydrate(&mut self, saved: &SavedAchievements) {
        for entry in &mut self.entries {
            if let Some(s) = saved.get(&entry.id) {
                entry.unlocked = s.unlocked;
            }
        }
    }

    pub fn lock_all(&mut self) {
        for entry in &mut self.entries {
            entry.unlocked = false;
        }
    }

    /// The persisted blob: id -> full record.
    pub fn blob(&self) -> BTreeMap<&str, &Achievement> {
        self.entries.iter().map(|a| (a.id.as_str(), a)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.entries.iter()
    }

    pub fn unlocked_count(&self) -> usize {
        self.entries.iter().filter(|a| a.unlocked).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> Stats<'_> {
        Stats { registry: self }
    }
}

/// Console report: `Unlocked: n/total` followed by one line per achievement.
pub struct Stats<'a> {
    registry: &'a Registry,
}

impl fmt::Display for Stats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 ACHIEVEMENT STATS")?;
        write!(
            f,
            "Unlocked: {}/{}",
            self.registry.unlocked_count(),
            self.registry.total()
        )?;
        for a in self.registry.iter() {
            let mark = if a.unlocked { '✓' } else { '✗' };
            write!(f, "\n{mark} {} - {}", a.name, a.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let reg = Registry::from_catalog();
        let mut ids: Vec<_> = reg.iter().map(|a| a.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        assert_eq!(reg.unlocked_count(), 0);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut reg = Registry::from_catalog();
        assert!(reg.unlock(EXPLORER).unwrap().is_some());
        assert!(reg.unlock(EXPLORER).unwrap().is_none());
        assert_eq!(reg.unlocked_count(), 1);
    }

    #[test]
    fn unknown_id_fails_loudly() {
        let mut reg = Registry::from_catalog();
        assert!(matches!(
            reg.unlock("annoying"),
            Err(EggError::UnknownAchievement(id)) if id == "annoying"
        ));
    }

    #[test]
    fn rehydrate_takes_stored_flags() {
        let mut reg = Registry::from_catalog();
        let saved: SavedAchievements = serde_json::from_str(
            r#"{"fireMaster":{"id":"fireMaster","unlocked":true},"ghost":{"unlocked":true},"explorer":{}}"#,
        )
        .unwrap();
        reg.rehydrate(&saved);
        assert!(reg.is_unlocked(FIRE_MASTER));
        assert!(!reg.is_unlocked(EXPLORER));
        assert_eq!(reg.unlocked_count(), 1);
    }

    #[test]
    fn stats_lists_every_entry() {
        let mut reg = Registry::from_catalog();
        reg.unlock(BULLET_TIME).unwrap();
        let text = reg.stats().to_string();
        assert!(text.contains("Unlocked: 1/8"));
        assert!(text.contains("✓ ⚡ Bullet Time"));
        assert_eq!(text.lines().count(), 2 + CATALOG.len());
    }
}
