// Integration tests (native) for the `shootz-eggs` crate.
// These drive the engine through an in-memory backend and a recording
// presenter, so they run under `cargo test` on the host without a browser.

use shootz_eggs::achievements::{self, ADMIN_MAYHEM, ANNOYING_PLAYER, CONSOLE_WARRIOR, FIRE_MASTER};
use shootz_eggs::engine::{Effect, Engine};
use shootz_eggs::presenter::RecordingPresenter;
use shootz_eggs::quest::QuestStage;
use shootz_eggs::sensors::ScrollSample;
use shootz_eggs::store::MemoryBackend;
use shootz_eggs::EggConfig;

const ACHIEVEMENTS_KEY: &str = "shootz_achievements";
const QUEST_KEY: &str = "shootz_quest_progress";

type TestEngine = Engine<MemoryBackend, RecordingPresenter>;

fn engine_on(backend: MemoryBackend) -> TestEngine {
    Engine::new(EggConfig::default(), backend, RecordingPresenter::default())
}

fn engine() -> TestEngine {
    engine_on(MemoryBackend::new())
}

/// Simulates a page reload: a fresh engine over the same storage contents.
fn reload(e: &TestEngine) -> TestEngine {
    engine_on(e.store().backend().clone())
}

fn walk_quest_to_returned(e: &mut TestEngine) {
    e.quest_talk().unwrap();
    e.quest_accept().unwrap();
    e.quest_begin_fight().unwrap();
    e.quest_win_cookie().unwrap();
    e.quest_return_cookie().unwrap();
}

#[test]
fn unlock_is_idempotent() {
    let mut e = engine();
    assert!(e.unlock(FIRE_MASTER).unwrap());
    let blob = e.store().backend().raw(ACHIEVEMENTS_KEY).map(str::to_owned);
    assert!(blob.is_some());

    assert!(!e.unlock(FIRE_MASTER).unwrap());
    assert_eq!(e.store().backend().raw(ACHIEVEMENTS_KEY).map(str::to_owned), blob);
    assert_eq!(e.presenter().notified, vec![FIRE_MASTER]);
    assert_eq!(e.presenter().counter, Some((1, 8)));
}

#[test]
fn unknown_id_is_an_error_and_changes_nothing() {
    let mut e = engine();
    assert!(e.unlock("doesNotExist").is_err());
    assert_eq!(e.registry().unlocked_count(), 0);
    assert!(e.presenter().notified.is_empty());
    assert!(e.store().backend().raw(ACHIEVEMENTS_KEY).is_none());
}

#[test]
fn unlocks_survive_a_reload() {
    let mut e = engine();
    e.unlock(FIRE_MASTER).unwrap();
    e.console_unlock().unwrap();

    let again = reload(&e);
    assert!(again.registry().is_unlocked(FIRE_MASTER));
    assert!(again.registry().is_unlocked(CONSOLE_WARRIOR));
    assert!(!again.registry().is_unlocked(ADMIN_MAYHEM));
    assert_eq!(again.presenter().counter, Some((2, 8)));
    // Rehydration never notifies.
    assert!(again.presenter().notified.is_empty());
}

#[test]
fn stored_blob_uses_camel_case_ids() {
    let mut e = engine();
    e.unlock(ANNOYING_PLAYER).unwrap();
    let raw = e.store().backend().raw(ACHIEVEMENTS_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(json["annoyingPlayer"]["unlocked"], true);
    assert_eq!(json["fireMaster"]["unlocked"], false);
}

#[test]
fn reset_forgets_everything() {
    let mut e = engine();
    e.unlock(FIRE_MASTER).unwrap();
    e.quest_talk().unwrap();
    assert!(e.store().backend().raw(QUEST_KEY).is_some());

    e.reset();
    assert_eq!(e.registry().unlocked_count(), 0);
    assert_eq!(e.quest().stage(), QuestStage::NotStarted);
    assert!(e.store().backend().raw(ACHIEVEMENTS_KEY).is_none());
    assert!(e.store().backend().raw(QUEST_KEY).is_none());
    assert_eq!(e.presenter().counter, Some((0, 8)));

    let again = reload(&e);
    assert_eq!(again.registry().unlocked_count(), 0);
    assert_eq!(again.quest().stage(), QuestStage::NotStarted);
}

#[test]
fn failing_storage_still_unlocks_for_the_session() {
    let mut backend = MemoryBackend::new();
    backend.reject_writes = true;
    let mut e = engine_on(backend);

    assert!(e.unlock(FIRE_MASTER).unwrap());
    assert!(e.registry().is_unlocked(FIRE_MASTER));
    assert_eq!(e.presenter().notified, vec![FIRE_MASTER]);

    let again = reload(&e);
    assert!(!again.registry().is_unlocked(FIRE_MASTER));
}

#[test]
fn malformed_storage_starts_fresh() {
    let backend = MemoryBackend::new()
        .with_entry(ACHIEVEMENTS_KEY, "{not json")
        .with_entry(QUEST_KEY, "\"nope\"");
    let e = engine_on(backend);
    assert_eq!(e.registry().unlocked_count(), 0);
    assert_eq!(e.quest().stage(), QuestStage::NotStarted);
}

#[test]
fn partial_and_unknown_entries_are_tolerated() {
    let backend = MemoryBackend::new().with_entry(
        ACHIEVEMENTS_KEY,
        r#"{"bulletTime":{"unlocked":true},"retiredAchievement":{"unlocked":true}}"#,
    );
    let e = engine_on(backend);
    assert!(e.registry().is_unlocked(achievements::BULLET_TIME));
    assert_eq!(e.registry().unlocked_count(), 1);
}

#[test]
fn quest_walks_to_admin_mayhem() {
    let mut e = engine();
    assert_eq!(e.quest_talk().unwrap(), QuestStage::Talked);
    assert_eq!(e.quest_accept().unwrap(), QuestStage::QuestAccepted);
    assert_eq!(e.quest_begin_fight().unwrap(), QuestStage::FightAvailable);
    assert_eq!(e.quest_win_cookie().unwrap(), QuestStage::CookieWon);
    assert_eq!(e.quest_return_cookie().unwrap(), QuestStage::CookieReturned);
    assert_eq!(e.quest_reveal().unwrap(), QuestStage::PlotTwistRevealed);
    assert!(!e.registry().is_unlocked(ADMIN_MAYHEM));
    assert_eq!(e.quest_finish().unwrap(), QuestStage::AdminMayhemUnlocked);
    assert!(e.registry().is_unlocked(ADMIN_MAYHEM));

    let raw = e.store().backend().raw(QUEST_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(json["talkedToKitCat"], true);
    assert_eq!(json["gotCookie"], true);
    assert_eq!(json["gaveCookie"], true);
}

#[test]
fn quest_steps_cannot_skip_or_repeat() {
    let mut e = engine();
    assert!(e.quest_return_cookie().is_err());
    assert!(e.quest_accept().is_err());
    assert_eq!(e.quest().stage(), QuestStage::NotStarted);

    e.quest_talk().unwrap();
    assert!(e.quest_talk().is_err());
    assert_eq!(e.quest().stage(), QuestStage::Talked);
    assert!(e.store().backend().raw(QUEST_KEY).is_some());
}

#[test]
fn quest_resumes_after_reload() {
    let mut e = engine();
    e.quest_talk().unwrap();
    assert_eq!(reload(&e).quest().stage(), QuestStage::QuestAccepted);

    e.quest_accept().unwrap();
    e.quest_begin_fight().unwrap();
    e.quest_win_cookie().unwrap();
    let mut resumed = reload(&e);
    assert_eq!(resumed.quest().stage(), QuestStage::CookieWon);
    assert_eq!(resumed.quest_return_cookie().unwrap(), QuestStage::CookieReturned);
}

#[test]
fn interrupted_finale_replays_on_reload() {
    let mut e = engine();
    walk_quest_to_returned(&mut e);
    e.quest_reveal().unwrap();

    let mut resumed = reload(&e);
    assert_eq!(resumed.quest().stage(), QuestStage::CookieReturned);
    resumed.quest_reveal().unwrap();
    resumed.quest_finish().unwrap();
    assert_eq!(reload(&resumed).quest().stage(), QuestStage::AdminMayhemUnlocked);
}

#[test]
fn out_of_order_flags_are_truncated() {
    let backend = MemoryBackend::new().with_entry(
        QUEST_KEY,
        r#"{"talkedToKitCat":false,"gotCookie":true,"gaveCookie":true}"#,
    );
    let e = engine_on(backend);
    assert_eq!(e.quest().stage(), QuestStage::NotStarted);
    assert!(!e.quest().cookie_returned());
}

#[test]
fn manager_ignores_clicks_until_the_cookie_is_returned() {
    let mut e = engine();
    for _ in 0..20 {
        assert!(e.manager_clicked().is_empty());
    }
    walk_quest_to_returned(&mut e);

    let first = e.manager_clicked();
    assert_eq!(
        first,
        vec![Effect::ManagerLine("🍪 Still thinking about that cookie...".into())]
    );
    for _ in 2..12 {
        e.manager_clicked();
    }
    assert!(!e.registry().is_unlocked(ANNOYING_PLAYER));
    let twelfth = e.manager_clicked();
    assert_eq!(twelfth.len(), 1);
    assert!(e.registry().is_unlocked(ANNOYING_PLAYER));
    assert_eq!(e.presenter().notified, vec![ANNOYING_PLAYER]);
}

#[test]
fn pestering_escalates_to_a_battle_once() {
    let mut e = engine();
    walk_quest_to_returned(&mut e);
    let mut battles = 0;
    for _ in 0..40 {
        battles += e
            .manager_clicked()
            .iter()
            .filter(|fx| **fx == Effect::PesterBattle)
            .count();
    }
    assert_eq!(battles, 1);
    assert!(e.manager_clicked().is_empty());
}

#[test]
fn gate_survives_a_reload() {
    let mut e = engine();
    walk_quest_to_returned(&mut e);
    let mut again = reload(&e);
    assert!(!again.manager_clicked().is_empty());
}

#[test]
fn explorer_needs_every_section() {
    let mut e = engine();
    for id in ["home", "about", "team", "features", "controls"] {
        assert!(!e.section_visible(id));
        assert!(!e.section_visible(id));
    }
    assert!(!e.section_visible("footer"));
    assert!(!e.registry().is_unlocked(achievements::EXPLORER));
    assert!(e.section_visible("updates"));
    assert!(e.registry().is_unlocked(achievements::EXPLORER));
}

fn bottom() -> ScrollSample {
    ScrollSample {
        scroll_y: 4_200.0,
        viewport_height: 800.0,
        document_height: 5_000.0,
    }
}

fn top() -> ScrollSample {
    ScrollSample {
        scroll_y: 0.0,
        viewport_height: 800.0,
        document_height: 5_000.0,
    }
}

#[test]
fn fast_round_trip_is_a_speed_run() {
    let mut e = engine();
    assert!(!e.scrolled(bottom(), 1_000.0));
    assert!(e.scrolled(top(), 3_999.0));
    assert!(e.registry().is_unlocked(achievements::SPEED_RUNNER));
}

#[test]
fn slow_round_trip_is_not() {
    let mut e = engine();
    e.scrolled(bottom(), 1_000.0);
    assert!(!e.scrolled(top(), 4_001.0));
    assert!(!e.registry().is_unlocked(achievements::SPEED_RUNNER));
}

#[test]
fn stats_list_every_achievement() {
    let mut e = engine();
    e.console_unlock().unwrap();
    let stats = e.stats();
    assert!(stats.contains("Unlocked: 1/8"));
    assert_eq!(stats.matches('✓').count(), 1);
    assert_eq!(stats.matches('✗').count(), 7);
}

#[test]
fn config_overrides_merge_with_defaults() {
    let cfg = EggConfig::from_json(r#"{"title":{"threshold":3},"log_level":"debug"}"#).unwrap();
    let mut e = Engine::new(cfg, MemoryBackend::new(), RecordingPresenter::default());
    let fired: Vec<_> = (0..3).filter_map(|i| e.title_clicked(i as f64)).collect();
    assert_eq!(fired, vec![Effect::BulletTime]);
}
