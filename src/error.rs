//! Error type shared by the core and the browser wiring.

use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::quest::QuestStage;

#[derive(Error, Debug)]
pub enum EggError {
    #[error("unknown achievement id: {0}")]
    UnknownAchievement(String),

    #[error("local storage is unavailable")]
    StorageUnavailable,

    #[error("storage operation failed: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("quest step '{step}' is not allowed while {stage:?}")]
    QuestOutOfOrder { stage: QuestStage, step: &'static str },

    #[error("DOM operation failed: {0}")]
    Dom(String),

    #[error("audio unavailable: {0}")]
    Audio(String),

    #[error("another battle session is already running")]
    SessionBusy,
}

pub type Result<T> = std::result::Result<T, EggError>;

impl EggError {
    /// Wraps a JS exception coming out of a `web-sys` call.
    pub fn dom(err: JsValue) -> Self {
        EggError::Dom(describe(&err))
    }

    pub fn storage(err: JsValue) -> Self {
        EggError::Storage(describe(&err))
    }

    pub fn audio(err: JsValue) -> Self {
        EggError::Audio(describe(&err))
    }
}

impl From<EggError> for JsValue {
    fn from(err: EggError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
