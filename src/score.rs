//! Score messages from the quiz widget and the tiers derived from them.

use crate::config::SimConfig;
use crate::error::MessageError;
use serde::Deserialize;

pub const SCORE_RESULT_TYPE: &str = "H5P_SCORE_RESULT";

/// Envelope shared by every inbound message: only the tag and sender are
/// inspected before the payload is decoded.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: f64,
    /// Missing or non-positive values count as 1 once recorded
    #[serde(default)]
    pub max_score: f64,
}

impl ScoreResult {
    /// Decode one raw message, checking the sender when `allowed_origin` is set.
    pub fn decode(raw: &str, allowed_origin: Option<&str>) -> Result<Self, MessageError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MessageError::Empty);
        }

        let value: serde_json::Value = serde_json::from_str(raw)?;
        let envelope = Envelope::deserialize(&value)?;

        match envelope.kind.as_deref() {
            Some(SCORE_RESULT_TYPE) => {}
            other => return Err(MessageError::UnknownType(other.unwrap_or_default().to_string())),
        }

        if let Some(allowed) = allowed_origin {
            if envelope.origin.as_deref() != Some(allowed) {
                return Err(MessageError::UntrustedOrigin(envelope.origin));
            }
        }

        Ok(Self::deserialize(value)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Excellent,
    Good,
    NeedsWork,
    Pending,
}

impl Tier {
    pub fn headline(self) -> Option<&'static str> {
        match self {
            Tier::Excellent => Some("Congratulations! Excellent score!"),
            Tier::Good => Some("Good score, keep it up."),
            Tier::NeedsWork => Some("Needs more effort!"),
            Tier::Pending => None,
        }
    }

    /// Headline hue on the 0-255 wheel; `None` means plain white.
    pub fn hue(self) -> Option<f32> {
        match self {
            Tier::Excellent => Some(85.0),
            Tier::Good => Some(40.0),
            Tier::NeedsWork => Some(0.0),
            Tier::Pending => None,
        }
    }

    pub fn celebrates(self) -> bool {
        matches!(self, Tier::Excellent)
    }
}

/// Latest score received, plus the status line shown before any arrives.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    pub score: f64,
    pub max_score: f64,
    pub status: String,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self {
            score: 0.0,
            max_score: 1.0,
            status: "Waiting for score...".to_string(),
        }
    }
}

impl ScoreBoard {
    pub fn record(&mut self, result: &ScoreResult) {
        self.score = result.score;
        self.max_score = if result.max_score > 0.0 {
            result.max_score
        } else {
            1.0
        };
        self.status = format!("Final score: {}", self.fraction());
    }

    /// Force an excellent score without a widget attached.
    pub fn manual_test(&mut self) {
        self.score = 95.0;
        self.max_score = 100.0;
        self.status = "Manual test mode: 95/100".to_string();
    }

    pub fn percentage(&self) -> f64 {
        self.score / self.max_score * 100.0
    }

    pub fn tier(&self, config: &SimConfig) -> Tier {
        let percentage = self.percentage();
        if percentage >= f64::from(config.excellent_threshold) {
            Tier::Excellent
        } else if percentage >= f64::from(config.good_threshold) {
            Tier::Good
        } else if percentage > 0.0 {
            Tier::NeedsWork
        } else {
            Tier::Pending
        }
    }

    pub fn fraction(&self) -> String {
        format!("{}/{}", self.score, self.max_score)
    }
}
