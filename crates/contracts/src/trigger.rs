//! Trigger kinds - the interaction events that can start dispatch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Interaction event that may start dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Scroll,
    #[serde(alias = "pointermove")]
    MouseMove,
    TouchStart,
    KeyDown,
    Click,
}

impl TriggerKind {
    /// Default trigger set, in registration order
    pub const DEFAULT: [TriggerKind; 5] = [
        TriggerKind::Scroll,
        TriggerKind::MouseMove,
        TriggerKind::TouchStart,
        TriggerKind::KeyDown,
        TriggerKind::Click,
    ];

    /// DOM event name
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::MouseMove => "mousemove",
            Self::TouchStart => "touchstart",
            Self::KeyDown => "keydown",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for TriggerKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scroll" => Ok(Self::Scroll),
            "mousemove" | "pointermove" => Ok(Self::MouseMove),
            "touchstart" => Ok(Self::TouchStart),
            "keydown" => Ok(Self::KeyDown),
            "click" => Ok(Self::Click),
            other => Err(ContractError::config_parse(format!(
                "unknown trigger event: {other}"
            ))),
        }
    }
}

/// What started a dispatch pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "event", rename_all = "snake_case")]
pub enum TriggerSource {
    /// A user interaction listener
    Interaction(TriggerKind),
    /// The fallback timer elapsed
    Timer,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interaction(kind) => write!(f, "{kind}"),
            Self::Timer => f.write_str("timer"),
        }
    }
}
