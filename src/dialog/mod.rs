//! Creation-dialog state machine.
//!
//! The dialog that collects a new consortium's parameters is modeled as an
//! explicit step enum persisted in the session document, keyed by the
//! initiating user. A process restart therefore resumes a mid-dialog
//! conversation exactly where it left off. Only messages and button presses
//! from the owning user advance the machine.

use serde::{Deserialize, Serialize};

/// Current step of a pending creation dialog, plus the fields accumulated so
/// far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DialogStep {
    /// Waiting for the total pool value
    AwaitAmount,
    /// Waiting for the participant count
    AwaitParticipants { amount: f64 },
    /// Summary sent; waiting for the Sim/Não press
    AwaitConfirmation { amount: f64, participants: u32 },
}

/// Parse a pool value from a chat message.
///
/// Accepts a decimal comma ("1500,50") since the audience types pt-BR
/// numbers. Must be a positive finite number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let normalized = text.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Some(v),
        _ => None,
    }
}

/// Parse a participant count: a positive integer.
pub fn parse_participants(text: &str) -> Option<u32> {
    match text.trim().parse::<u32>() {
        Ok(v) if v > 0 => Some(v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_plain_and_decimal_comma() {
        assert_eq!(parse_amount("1200"), Some(1200.0));
        assert_eq!(parse_amount("  1500,50 "), Some(1500.5));
        assert_eq!(parse_amount("99.9"), Some(99.9));
    }

    #[test]
    fn amount_rejects_garbage() {
        assert_eq!(parse_amount("mil reais"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn participants_must_be_positive_integer() {
        assert_eq!(parse_participants("12"), Some(12));
        assert_eq!(parse_participants(" 3 "), Some(3));
        assert_eq!(parse_participants("0"), None);
        assert_eq!(parse_participants("2.5"), None);
        assert_eq!(parse_participants("doze"), None);
    }

    #[test]
    fn step_serde_roundtrip() {
        let steps = [
            DialogStep::AwaitAmount,
            DialogStep::AwaitParticipants { amount: 1200.0 },
            DialogStep::AwaitConfirmation {
                amount: 1200.0,
                participants: 12,
            },
        ];
        for step in steps {
            let json = serde_json::to_string(&step).unwrap();
            let back: DialogStep = serde_json::from_str(&json).unwrap();
            assert_eq!(back, step);
        }
    }

    #[test]
    fn step_json_is_tagged_for_schema_stability() {
        let json = serde_json::to_value(DialogStep::AwaitParticipants { amount: 10.0 }).unwrap();
        assert_eq!(json["step"], "await_participants");
        assert_eq!(json["amount"], 10.0);
    }
}
