use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const POINTER_GRAB_INTENSITY: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonsterState {
    Hungry,
    Satisfied,
}

impl MonsterState {
    pub fn wire_name(self) -> &'static str {
        match self {
            MonsterState::Hungry => "HUNGRY",
            MonsterState::Satisfied => "SATISFIED",
        }
    }

    pub fn is_agitated(self) -> bool {
        matches!(self, MonsterState::Hungry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusRecord {
    #[serde(rename = "status")]
    pub state: MonsterState,
    #[serde(rename = "anger_level")]
    pub intensity: u8,
    #[serde(rename = "last_check")]
    pub observed_at: DateTime<Utc>,
}

impl StatusRecord {
    pub fn intercepts_pointer(&self) -> bool {
        self.state.is_agitated() && self.intensity > POINTER_GRAB_INTENSITY
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    status: String,
    anger_level: i64,
    last_check: DateTime<Utc>,
}

pub fn parse_status_payload(raw: &str) -> Result<StatusRecord> {
    let wire = serde_json::from_str::<WireStatus>(raw)
        .context("status payload did not match the expected shape")?;
    record_from_wire(wire)
}

// Numeric overshoot is clamped; an unknown status word is rejected outright.
fn record_from_wire(wire: WireStatus) -> Result<StatusRecord> {
    let state = match wire.status.as_str() {
        "HUNGRY" => MonsterState::Hungry,
        "SATISFIED" => MonsterState::Satisfied,
        other => return Err(anyhow!("unknown monster status {other:?}")),
    };
    let intensity = if (0..=100).contains(&wire.anger_level) {
        wire.anger_level as u8
    } else {
        let clamped = wire.anger_level.clamp(0, 100) as u8;
        warn!(
            anger_level = wire.anger_level,
            clamped, "anger level outside 0..=100"
        );
        clamped
    };
    Ok(StatusRecord {
        state,
        intensity,
        observed_at: wire.last_check,
    })
}
