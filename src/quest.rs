//! The cookie quest: a one-way narrative that ends in the admin-mayhem reveal.
//!
//! Only three milestones are persisted (`talkedToKitCat`, `gotCookie`,
//! `gaveCookie`); the in-between stages live in memory and are rebuilt from
//! the flags on load.

use serde::{Deserialize, Serialize};

use crate::error::{EggError, Result};

/// Persisted quest flags, field names kept compatible with the stored blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestProgress {
    pub talked_to_kit_cat: bool,
    pub got_cookie: bool,
    pub gave_cookie: bool,
    /// Reserved milestone slots carried in the stored blob.
    pub button2: bool,
    pub button3: bool,
}

impl QuestProgress {
    /// Drops any flag whose predecessor is unset. Returns true if something changed.
    pub fn normalize(&mut self) -> bool {
        let before = *self;
        self.got_cookie &= self.talked_to_kit_cat;
        self.gave_cookie &= self.got_cookie;
        before != *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QuestStage {
    NotStarted,
    Talked,
    QuestAccepted,
    FightAvailable,
    CookieWon,
    CookieReturned,
    PlotTwistRevealed,
    AdminMayhemUnlocked,
}

#[derive(Debug, Clone)]
pub struct Quest {
    progress: QuestProgress,
    stage: QuestStage,
}

impl Default for Quest {
    fn default() -> Self {
        Self {
            progress: QuestProgress::default(),
            stage: QuestStage::NotStarted,
        }
    }
}

impl Quest {
    /// Rebuilds the quest from stored flags. A player who talked but never
    /// won the fight resumes at the fight; a finished quest whose finale
    /// never completed (`finale_done == false`) resumes at the reveal.
    pub fn resume(mut progress: QuestProgress, finale_done: bool) -> Self {
        if progress.normalize() {
            log::warn!("quest progress was out of order; truncated to {progress:?}");
        }
        let stage = if progress.gave_cookie {
            if finale_done {
                QuestStage::AdminMayhemUnlocked
            } else {
                QuestStage::CookieReturned
            }
        } else if progress.got_cookie {
            QuestStage::CookieWon
        } else if progress.talked_to_kit_cat {
            QuestStage::QuestAccepted
        } else {
            QuestStage::NotStarted
        };
        Self { progress, stage }
    }

    pub fn stage(&self) -> QuestStage {
        self.stage
    }

    pub fn progress(&self) -> &QuestProgress {
        &self.progress
    }

    /// The manager gate: open once the cookie went back to its owner.
    pub fn cookie_returned(&self) -> bool {
        self.progress.gave_cookie
    }

    fn advance(&mut self, from: QuestStage, to: QuestStage, step: &'static str) -> Result<()> {
        if self.stage != from {
            return Err(EggError::QuestOutOfOrder {
                stage: self.stage,
                step,
            });
        }
        log::info!("quest: {from:?} -> {to:?}");
        self.stage = to;
        Ok(())
    }

    /// Quest marker clicked.
    pub fn talk(&mut self) -> Result<()> {
        self.advance(QuestStage::NotStarted, QuestStage::Talked, "talk")?;
        self.progress.talked_to_kit_cat = true;
        Ok(())
    }

    pub fn accept(&mut self) -> Result<()> {
        self.advance(QuestStage::Talked, QuestStage::QuestAccepted, "accept")
    }

    /// Fight affordance clicked; the battle is now running.
    pub fn begin_fight(&mut self) -> Result<()> {
        self.advance(QuestStage::QuestAccepted, QuestStage::FightAvailable, "begin_fight")
    }

    pub fn win_cookie(&mut self) -> Result<()> {
        self.advance(QuestStage::FightAvailable, QuestStage::CookieWon, "win_cookie")?;
        self.progress.got_cookie = true;
        Ok(())
    }

    pub fn return_cookie(&mut self) -> Result<()> {
        self.advance(QuestStage::CookieWon, QuestStage::CookieReturned, "return_cookie")?;
        self.progress.gave_cookie = true;
        Ok(())
    }

    pub fn reveal_plot_twist(&mut self) -> Result<()> {
        self.advance(
            QuestStage::CookieReturned,
            QuestStage::PlotTwistRevealed,
            "reveal_plot_twist",
        )
    }

    pub fn finish(&mut self) -> Result<()> {
        self.advance(
            QuestStage::PlotTwistRevealed,
            QuestStage::AdminMayhemUnlocked,
            "finish",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_forward_walk() {
        let mut q = Quest::default();
        q.talk().unwrap();
        assert!(q.progress().talked_to_kit_cat);
        q.accept().unwrap();
        q.begin_fight().unwrap();
        q.win_cookie().unwrap();
        assert!(q.progress().got_cookie);
        assert!(!q.cookie_returned());
        q.return_cookie().unwrap();
        assert!(q.cookie_returned());
        q.reveal_plot_twist().unwrap();
        q.finish().unwrap();
        assert_eq!(q.stage(), QuestStage::AdminMayhemUnlocked);
    }

    #[test]
    fn skipping_ahead_is_rejected_without_side_effects() {
        let mut q = Quest::default();
        let err = q.return_cookie().unwrap_err();
        assert!(matches!(
            err,
            EggError::QuestOutOfOrder { stage: QuestStage::NotStarted, step: "return_cookie" }
        ));
        assert!(!q.progress().gave_cookie);
        assert!(q.win_cookie().is_err());
        assert!(!q.progress().got_cookie);
    }

    #[test]
    fn steps_cannot_repeat() {
        let mut q = Quest::default();
        q.talk().unwrap();
        assert!(q.talk().is_err());
        assert_eq!(q.stage(), QuestStage::Talked);
    }

    #[test]
    fn resume_from_flags() {
        let talked = QuestProgress {
            talked_to_kit_cat: true,
            ..Default::default()
        };
        assert_eq!(Quest::resume(talked, false).stage(), QuestStage::QuestAccepted);

        let won = QuestProgress {
            got_cookie: true,
            ..talked
        };
        assert_eq!(Quest::resume(won, false).stage(), QuestStage::CookieWon);

        let gave = QuestProgress {
            gave_cookie: true,
            ..won
        };
        assert_eq!(Quest::resume(gave, false).stage(), QuestStage::CookieReturned);
        assert_eq!(Quest::resume(gave, true).stage(), QuestStage::AdminMayhemUnlocked);
    }

    #[test]
    fn inconsistent_flags_are_truncated() {
        let broken = QuestProgress {
            gave_cookie: true,
            ..Default::default()
        };
        let q = Quest::resume(broken, true);
        assert_eq!(q.stage(), QuestStage::NotStarted);
        assert!(!q.cookie_returned());
    }

    #[test]
    fn blob_uses_stored_field_names() {
        let json = serde_json::to_string(&QuestProgress {
            talked_to_kit_cat: true,
            ..Default::default()
        })
        .unwrap();
        assert!(json.contains("\"talkedToKitCat\":true"));
        assert!(json.contains("\"gaveCookie\":false"));
        let partial: QuestProgress = serde_json::from_str(r#"{"gotCookie":true}"#).unwrap();
        assert!(partial.got_cookie && !partial.button3);
    }
}
