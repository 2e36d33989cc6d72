//! Achievement engine: registry, quest and sensors behind one owner.
//!
//! Event handlers receive plain data (timestamps, ids, scroll samples) and
//! return the [`Effect`]s the page should play; unlocking, persisting and
//! notifying happen in here.

use crate::achievements::{self, Registry, SavedAchievements};
use crate::config::EggConfig;
use crate::error::Result;
use crate::presenter::Presenter;
use crate::quest::{Quest, QuestProgress, QuestStage};
use crate::sensors::{ClickBurst, Pester, ScrollRoundTrip, ScrollSample, SectionTracker};
use crate::store::{KvBackend, Store};

/// Presentation work requested by a sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FireExplosion,
    BulletTime,
    CrownCollector,
    /// Short centered message (click-progress hints).
    Hint(String),
    /// Speech bubble on the manager card.
    ManagerLine(String),
    PesterBattle,
}

pub struct Engine<B: KvBackend, P: Presenter> {
    cfg: EggConfig,
    store: Store<B>,
    registry: Registry,
    quest: Quest,
    presenter: P,
    fire: ClickBurst,
    title: ClickBurst,
    owner: ClickBurst,
    pester: Pester,
    scroll: ScrollRoundTrip,
    sections: SectionTracker,
}

impl<B: KvBackend, P: Presenter> Engine<B, P> {
    /// Builds the engine and rehydrates both blobs from `backend`.
    pub fn new(cfg: EggConfig, backend: B, mut presenter: P) -> Self {
        let store = Store::new(backend);
        let mut registry = Registry::from_catalog();
        let saved: SavedAchievements = store.load(&cfg.storage.achievements);
        registry.rehydrate(&saved);
        let progress: QuestProgress = store.load(&cfg.storage.quest);
        let quest = Quest::resume(progress, registry.is_unlocked(achievements::ADMIN_MAYHEM));
        presenter.refresh_counter(registry.unlocked_count(), registry.total());
        log::info!(
            "achievements loaded: {}/{} unlocked, quest at {:?}",
            registry.unlocked_count(),
            registry.total(),
            quest.stage()
        );
        Self {
            fire: ClickBurst::from_config(&cfg.fire_icon),
            title: ClickBurst::from_config(&cfg.title),
            owner: ClickBurst::from_config(&cfg.owner_card),
            pester: Pester::new(&cfg.manager),
            scroll: ScrollRoundTrip::new(&cfg.scroll),
            sections: SectionTracker::new(&cfg.sections.required),
            cfg,
            store,
            registry,
            quest,
            presenter,
        }
    }

    pub fn config(&self) -> &EggConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn store(&self) -> &Store<B> {
        &self.store
    }

    /// Unlocks `id` at most once: persists, notifies and refreshes the badge.
    /// Returns whether this call did the unlocking.
    pub fn unlock(&mut self, id: &str) -> Result<bool> {
        let Some(achievement) = self.registry.unlock(id)? else {
            return Ok(false);
        };
        log::info!("achievement unlocked: {}", achievement.name);
        let achievement = achievement.clone();
        self.store
            .save(&self.cfg.storage.achievements, &self.registry.blob());
        self.presenter.notify_unlock(&achievement);
        self.presenter
            .refresh_counter(self.registry.unlocked_count(), self.registry.total());
        Ok(true)
    }

    // Sensor-driven unlocks use catalog constants, so an error here is a bug
    // in the catalog rather than something to surface.
    fn award(&mut self, id: &str) {
        if let Err(e) = self.unlock(id) {
            log::error!("{e}");
        }
    }

    pub fn fire_icon_clicked(&mut self, now: f64) -> Option<Effect> {
        if !self.fire.register_event(now).fired {
            return None;
        }
        self.award(achievements::FIRE_MASTER);
        Some(Effect::FireExplosion)
    }

    pub fn title_clicked(&mut self, now: f64) -> Option<Effect> {
        if !self.title.register_event(now).fired {
            return None;
        }
        self.award(achievements::BULLET_TIME);
        Some(Effect::BulletTime)
    }

    pub fn owner_card_clicked(&mut self, now: f64) -> Option<Effect> {
        let step = self.owner.register_event(now);
        if step.fired {
            self.award(achievements::CROWN_COLLECTOR);
            return Some(Effect::CrownCollector);
        }
        self.owner.hint(step.count).map(|h| Effect::Hint(h.to_owned()))
    }

    /// Manager card clicks count only after the cookie went back.
    pub fn manager_clicked(&mut self) -> Vec<Effect> {
        let Some(step) = self.pester.click(self.quest.cookie_returned()) else {
            log::debug!("manager click ignored (gate closed or spent)");
            return Vec::new();
        };
        let mut effects = Vec::new();
        if let Some(line) = step.line {
            effects.push(Effect::ManagerLine(line));
        }
        if step.unlock {
            self.award(achievements::ANNOYING_PLAYER);
        }
        if step.escalate {
            effects.push(Effect::PesterBattle);
        }
        effects
    }

    pub fn scrolled(&mut self, sample: ScrollSample, now: f64) -> bool {
        if !self.scroll.on_scroll(sample, now) {
            return false;
        }
        self.award(achievements::SPEED_RUNNER);
        true
    }

    pub fn section_visible(&mut self, id: &str) -> bool {
        if !self.sections.visit(id) {
            return false;
        }
        self.award(achievements::EXPLORER);
        true
    }

    /// `unlock()` typed into the developer console.
    pub fn console_unlock(&mut self) -> Result<bool> {
        self.unlock(achievements::CONSOLE_WARRIOR)
    }

    pub fn stats(&self) -> String {
        self.registry.stats().to_string()
    }

    /// Forgets everything: both blobs, all flags, all transient counters.
    pub fn reset(&mut self) {
        self.store.clear(&self.cfg.storage.achievements);
        self.store.clear(&self.cfg.storage.quest);
        self.registry.lock_all();
        self.quest = Quest::default();
        self.fire.reset();
        self.title.reset();
        self.owner.reset();
        self.pester.reset();
        self.scroll.reset();
        self.sections.reset();
        self.presenter
            .refresh_counter(self.registry.unlocked_count(), self.registry.total());
        log::info!("achievements reset");
    }

    fn quest_step(&mut self, step: impl FnOnce(&mut Quest) -> Result<()>) -> Result<QuestStage> {
        let before = *self.quest.progress();
        step(&mut self.quest)?;
        if *self.quest.progress() != before {
            self.store.save(&self.cfg.storage.quest, self.quest.progress());
        }
        Ok(self.quest.stage())
    }

    pub fn quest_talk(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::talk)
    }

    pub fn quest_accept(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::accept)
    }

    pub fn quest_begin_fight(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::begin_fight)
    }

    pub fn quest_win_cookie(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::win_cookie)
    }

    pub fn quest_return_cookie(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::return_cookie)
    }

    pub fn quest_reveal(&mut self) -> Result<QuestStage> {
        self.quest_step(Quest::reveal_plot_twist)
    }

    /// Finale: the last quest stage unlocks admin mayhem.
    pub fn quest_finish(&mut self) -> Result<QuestStage> {
        let stage = self.quest_step(Quest::finish)?;
        self.unlock(achievements::ADMIN_MAYHEM)?;
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::achievements::Achievement;
    use crate::presenter::RecordingPresenter;
    use crate::store::MemoryBackend;

    fn engine() -> Engine<MemoryBackend, RecordingPresenter> {
        Engine::new(
            EggConfig::default(),
            MemoryBackend::new(),
            RecordingPresenter::default(),
        )
    }

    #[test]
    fn counter_is_refreshed_on_startup() {
        let e = engine();
        assert_eq!(e.presenter().counter, Some((0, 8)));
    }

    #[test]
    fn owner_card_gives_hints_then_crown() {
        let mut e = engine();
        let effects: Vec<Effect> = (0..15)
            .filter_map(|i| e.owner_card_clicked(i as f64 * 100.0))
            .collect();
        assert_eq!(
            effects,
            vec![
                Effect::Hint("👑 Keep going...".into()),
                Effect::Hint("👑 Halfway there!".into()),
                Effect::CrownCollector,
            ]
        );
        assert!(e.registry().is_unlocked(achievements::CROWN_COLLECTOR));
    }

    #[test]
    fn title_fires_bullet_time() {
        let mut e = engine();
        let fired: Vec<_> = (0..7).filter_map(|i| e.title_clicked(i as f64)).collect();
        assert_eq!(fired, vec![Effect::BulletTime]);
        assert_eq!(e.presenter().notified, vec![achievements::BULLET_TIME]);
    }

    #[test]
    fn explosions_replay_but_unlock_once() {
        let mut e = engine();
        let mut explosions = 0;
        for i in 0..20 {
            if e.fire_icon_clicked(i as f64 * 10.0).is_some() {
                explosions += 1;
            }
        }
        assert_eq!(explosions, 2);
        assert_eq!(e.presenter().notified.len(), 1);
    }

    /// Backend and presenter writing into one shared call log.
    #[derive(Clone, Default)]
    struct Journal(Rc<RefCell<Vec<String>>>);

    impl KvBackend for Journal {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            self.0.borrow_mut().push(format!("save {key}"));
            Ok(())
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    impl Presenter for Journal {
        fn notify_unlock(&mut self, achievement: &Achievement) {
            self.0.borrow_mut().push(format!("notify {}", achievement.id));
        }

        fn refresh_counter(&mut self, unlocked: usize, total: usize) {
            self.0.borrow_mut().push(format!("counter {unlocked}/{total}"));
        }
    }

    #[test]
    fn unlock_persists_before_notifying() {
        let journal = Journal::default();
        let mut e = Engine::new(EggConfig::default(), journal.clone(), journal.clone());
        journal.0.borrow_mut().clear();

        e.unlock(achievements::EXPLORER).unwrap();
        assert_eq!(
            *journal.0.borrow(),
            vec![
                "save shootz_achievements".to_string(),
                "notify explorer".to_string(),
                "counter 1/8".to_string(),
            ]
        );
    }

    #[test]
    fn fire_burst_forfeited_by_a_long_gap() {
        let mut e = engine();
        // Nine clicks 500 ms apart, then the tenth arrives 2100 ms late.
        let mut times: Vec<f64> = (0..9).map(|i| i as f64 * 500.0).collect();
        times.push(4_000.0 + 2_100.0);
        let fired: Vec<_> = times
            .iter()
            .filter_map(|&t| e.fire_icon_clicked(t))
            .collect();
        assert!(fired.is_empty());
        assert!(!e.registry().is_unlocked(achievements::FIRE_MASTER));
        assert!(e.presenter().notified.is_empty());

        // The late click opened a new burst: nine more quick ones complete it.
        let fired: Vec<_> = (1..10)
            .filter_map(|i| e.fire_icon_clicked(6_100.0 + i as f64 * 500.0))
            .collect();
        assert_eq!(fired, vec![Effect::FireExplosion]);
        assert_eq!(e.presenter().notified, vec![achievements::FIRE_MASTER]);
    }

    #[test]
    fn finish_requires_the_reveal() {
        let mut e = engine();
        assert!(e.quest_finish().is_err());
        assert!(!e.registry().is_unlocked(achievements::ADMIN_MAYHEM));
    }
}
