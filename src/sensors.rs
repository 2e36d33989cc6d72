//! Trigger sensors: pure state machines fed with event timestamps (ms, as
//! returned by `performance.now()`), independent of the DOM.

use std::collections::BTreeSet;

use crate::config::{BurstConfig, Hint, PesterConfig, ScrollConfig};

/// Outcome of one registered click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstStep {
    /// Count reached by this click (before the reset that follows firing).
    pub count: u32,
    pub fired: bool,
}

/// Threshold counter with a decay window.
///
/// Equivalent to rescheduling a "reset to zero" timer on every click: a click
/// arriving `window_ms` or later after the previous one starts a new burst.
#[derive(Debug, Clone)]
pub struct ClickBurst {
    threshold: u32,
    window_ms: Option<f64>,
    hints: Vec<Hint>,
    count: u32,
    last_at: Option<f64>,
}

impl ClickBurst {
    pub fn new(threshold: u32, window_ms: Option<f64>) -> Self {
        Self {
            threshold,
            window_ms,
            hints: Vec::new(),
            count: 0,
            last_at: None,
        }
    }

    pub fn from_config(cfg: &BurstConfig) -> Self {
        Self {
            hints: cfg.hints.clone(),
            ..Self::new(cfg.threshold, cfg.window_ms)
        }
    }

    pub fn register_event(&mut self, now: f64) -> BurstStep {
        if let (Some(window), Some(last)) = (self.window_ms, self.last_at) {
            if now - last >= window {
                self.count = 0;
            }
        }
        self.count += 1;
        self.last_at = Some(now);
        let count = self.count;
        let fired = count == self.threshold;
        if fired {
            self.count = 0;
        }
        BurstStep { count, fired }
    }

    pub fn hint(&self, count: u32) -> Option<&str> {
        self.hints
            .iter()
            .find(|h| h.at == count)
            .map(|h| h.text.as_str())
    }

    /// Progress as seen at `now`, i.e. after any pending decay.
    pub fn count_at(&self, now: f64) -> u32 {
        match (self.window_ms, self.last_at) {
            (Some(window), Some(last)) if now - last >= window => 0,
            _ => self.count,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_at = None;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

/// Bottom-then-top within `window_ms`.
#[derive(Debug, Clone)]
pub struct ScrollRoundTrip {
    margin: f64,
    window_ms: f64,
    bottom_at: Option<f64>,
}

impl ScrollRoundTrip {
    pub fn new(cfg: &ScrollConfig) -> Self {
        Self {
            margin: cfg.margin_px,
            window_ms: cfg.window_ms,
            bottom_at: None,
        }
    }

    /// Returns true when this sample completes a fast enough round trip.
    pub fn on_scroll(&mut self, s: ScrollSample, now: f64) -> bool {
        let at_bottom = s.scroll_y + s.viewport_height >= s.document_height - self.margin;
        if at_bottom && self.bottom_at.is_none() {
            self.bottom_at = Some(now);
        }
        match self.bottom_at {
            Some(t) if s.scroll_y < self.margin => {
                self.bottom_at = None;
                now - t < self.window_ms
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.bottom_at = None;
    }
}

/// Accumulates distinct visible section ids. Never shrinks.
#[derive(Debug, Clone)]
pub struct SectionTracker {
    required: Vec<String>,
    visited: BTreeSet<String>,
}

impl SectionTracker {
    pub fn new(required: &[String]) -> Self {
        Self {
            required: required.to_vec(),
            visited: BTreeSet::new(),
        }
    }

    /// Records `id`; returns true once every required section has been seen.
    pub fn visit(&mut self, id: &str) -> bool {
        if !id.is_empty() {
            self.visited.insert(id.to_owned());
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.required.iter().all(|s| self.visited.contains(s))
    }

    pub fn reset(&mut self) {
        self.visited.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PesterStep {
    pub count: u32,
    pub line: Option<String>,
    pub unlock: bool,
    pub escalate: bool,
}

/// Identity-gated click counter on one card. Inert while the gate is closed;
/// no decay. Unlocks at `unlock_at`, optionally escalates to a boss battle at
/// `battle_at`, and goes quiet after its last milestone.
#[derive(Debug, Clone)]
pub struct Pester {
    cfg: PesterConfig,
    count: u32,
    done: bool,
}

impl Pester {
    pub fn new(cfg: &PesterConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            count: 0,
            done: false,
        }
    }

    /// `None` when the gate is closed or the sensor has run its course.
    pub fn click(&mut self, gate_open: bool) -> Option<PesterStep> {
        if !gate_open || self.done {
            return None;
        }
        self.count += 1;
        let count = self.count;
        let last = self
            .cfg
            .battle_at
            .map_or(self.cfg.unlock_at, |b| b.max(self.cfg.unlock_at));
        if count >= last {
            self.done = true;
        }
        Some(PesterStep {
            count,
            line: self
                .cfg
                .lines
                .iter()
                .find(|l| l.at == count)
                .map(|l| l.text.clone()),
            unlock: count == self.cfg.unlock_at,
            escalate: self.cfg.battle_at == Some(count),
        })
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.done = false;
    }
}
