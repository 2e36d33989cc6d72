//! Seam between the state machine and whatever renders it.

use std::collections::VecDeque;

use crate::achievements::Achievement;

pub trait Presenter {
    /// A freshly unlocked achievement.
    fn notify_unlock(&mut self, achievement: &Achievement);
    /// The `🏆 n/total` badge.
    fn refresh_counter(&mut self, unlocked: usize, total: usize);
}

/// FIFO of overlays that must not overlap: at most one is showing.
#[derive(Debug)]
pub struct OverlayQueue<T> {
    showing: bool,
    pending: VecDeque<T>,
}

impl<T> Default for OverlayQueue<T> {
    fn default() -> Self {
        Self {
            showing: false,
            pending: VecDeque::new(),
        }
    }
}

impl<T> OverlayQueue<T> {
    /// Returns the item back if it can be shown right away, otherwise queues it.
    pub fn offer(&mut self, item: T) -> Option<T> {
        if self.showing {
            self.pending.push_back(item);
            None
        } else {
            self.showing = true;
            Some(item)
        }
    }

    /// The showing overlay went away; returns the next one to show.
    pub fn finished(&mut self) -> Option<T> {
        let next = self.pending.pop_front();
        self.showing = next.is_some();
        next
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Presenter that only records calls; used by host-side tests.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub notified: Vec<String>,
    pub counter: Option<(usize, usize)>,
}

impl Presenter for RecordingPresenter {
    fn notify_unlock(&mut self, achievement: &Achievement) {
        self.notified.push(achievement.id.clone());
    }

    fn refresh_counter(&mut self, unlocked: usize, total: usize) {
        self.counter = Some((unlocked, total));
    }
}
