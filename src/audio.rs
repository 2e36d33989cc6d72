//! Sound effects as short oscillator note sequences.
//!
//! Playback is best effort: browsers without Web Audio (or that refuse a
//! context before a user gesture) just stay silent.

use std::cell::RefCell;

use web_sys::{AudioContext, OscillatorType};

use crate::error::{EggError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Fanfare,
    FireBurst,
    BulletTime,
    BossRiff,
    Hit,
    Alarm,
    Trolled,
}

/// (frequency Hz, start offset s, duration s)
type Note = (f32, f64, f64);

impl Sfx {
    fn wave(self) -> OscillatorType {
        match self {
            Sfx::Fanfare | Sfx::Trolled => OscillatorType::Triangle,
            Sfx::BossRiff | Sfx::FireBurst => OscillatorType::Sawtooth,
            Sfx::Alarm | Sfx::Hit => OscillatorType::Square,
            Sfx::BulletTime => OscillatorType::Sine,
        }
    }

    fn volume(self) -> f32 {
        match self {
            Sfx::Alarm | Sfx::Fanfare => 0.3,
            Sfx::Hit => 0.15,
            _ => 0.2,
        }
    }

    fn notes(self) -> &'static [Note] {
        match self {
            // C5 E5 G5 C6
            Sfx::Fanfare => &[
                (523.25, 0.0, 0.5),
                (659.25, 0.15, 0.5),
                (783.99, 0.3, 0.5),
                (1046.5, 0.45, 0.5),
            ],
            Sfx::FireBurst => &[(110.0, 0.0, 0.3), (82.41, 0.1, 0.5), (55.0, 0.25, 0.6)],
            Sfx::BulletTime => &[(880.0, 0.0, 0.8), (440.0, 0.2, 1.0), (220.0, 0.5, 1.2)],
            Sfx::BossRiff => &[
                (82.41, 0.0, 0.2),
                (82.41, 0.25, 0.2),
                (98.0, 0.5, 0.2),
                (82.41, 0.75, 0.2),
                (110.0, 1.0, 0.2),
                (103.83, 1.25, 0.2),
                (98.0, 1.5, 0.4),
            ],
            Sfx::Hit => &[(220.0, 0.0, 0.08)],
            Sfx::Alarm => &[(800.0, 0.0, 0.25), (400.0, 0.25, 0.25)],
            Sfx::Trolled => &[
                (392.0, 0.0, 0.2),
                (349.23, 0.2, 0.2),
                (329.63, 0.4, 0.2),
                (293.66, 0.6, 0.6),
            ],
        }
    }
}

thread_local! {
    static CONTEXT: RefCell<Option<AudioContext>> = const { RefCell::new(None) };
}

/// Plays `sfx`, logging (never surfacing) failures.
pub fn play(sfx: Sfx) {
    if let Err(e) = try_play(sfx) {
        log::warn!("sound {sfx:?} skipped: {e}");
    }
}

fn try_play(sfx: Sfx) -> Result<()> {
    CONTEXT.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(AudioContext::new().map_err(EggError::audio)?);
        }
        let ctx = slot
            .as_ref()
            .ok_or_else(|| EggError::Audio("no context".into()))?;
        let now = ctx.current_time();
        for &(freq, offset, duration) in sfx.notes() {
            let osc = ctx.create_oscillator().map_err(EggError::audio)?;
            let gain = ctx.create_gain().map_err(EggError::audio)?;
            osc.connect_with_audio_node(&gain).map_err(EggError::audio)?;
            gain.connect_with_audio_node(&ctx.destination())
                .map_err(EggError::audio)?;
            osc.set_type(sfx.wave());
            osc.frequency().set_value(freq);
            let start = now + offset;
            let level = gain.gain();
            level
                .set_value_at_time(sfx.volume(), start)
                .map_err(EggError::audio)?;
            level
                .exponential_ramp_to_value_at_time(0.01, start + duration)
                .map_err(EggError::audio)?;
            osc.start_with_when(start).map_err(EggError::audio)?;
            osc.stop_with_when(start + duration).map_err(EggError::audio)?;
        }
        Ok(())
    })
}
