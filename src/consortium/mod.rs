//! Consortium entity and participant roster rules.
//!
//! A consortium is a fixed-term rotating savings pool: `participants` members
//! each pay `monthly_fee` per month for `participants` months. The entity is
//! created once at the end of the creation dialog and mutated only by joins.

pub mod render;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One member of a consortium, in join order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub id: i64,
}

impl Participant {
    pub fn new(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// A monthly payment record.
///
/// Reserved for the payment-tracking feature; no handler reads or writes
/// these yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    /// User id of the paying participant
    pub participant: i64,
    pub confirmed: bool,
}

/// A rotating savings pool stored inside a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consortium {
    /// Total pool value
    pub amount: f64,
    /// Target participant count; also the duration in months
    pub participants: u32,
    /// `amount / participants`, computed once at creation, never recomputed
    pub monthly_fee: f64,
    /// Reserved: monthly counter, advanced by the (unimplemented) draw cycle
    #[serde(default)]
    pub current_month: u32,
    /// Reserved: user id of the monthly draw winner
    #[serde(default)]
    pub winner: i64,
    /// Members in join order; first entry is always the creator
    pub participants_list: Vec<Participant>,
    /// Reserved: payment history
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    /// Date the consortium was confirmed; rendered in the card header
    pub created_on: NaiveDate,
}

/// Result of applying a join press to a consortium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Participant appended; `complete` is true when the roster just filled
    Joined { complete: bool },
    /// The pressing user is already on the roster; nothing changed
    AlreadyMember,
    /// The roster was already full; nothing changed
    Full,
}

impl Consortium {
    /// Create a consortium with the creator as sole initial participant.
    pub fn new(amount: f64, participants: u32, creator: Participant, created_on: NaiveDate) -> Self {
        Self {
            amount,
            participants,
            monthly_fee: amount / f64::from(participants),
            current_month: 0,
            winner: 0,
            participants_list: vec![creator],
            payments: Vec::new(),
            created_on,
        }
    }

    pub fn is_member(&self, user_id: i64) -> bool {
        self.participants_list.iter().any(|p| p.id == user_id)
    }

    pub fn is_complete(&self) -> bool {
        self.participants_list.len() >= self.participants as usize
    }

    /// Append a participant, enforcing roster uniqueness and capacity.
    pub fn join(&mut self, participant: Participant) -> JoinOutcome {
        if self.is_member(participant.id) {
            return JoinOutcome::AlreadyMember;
        }
        if self.is_complete() {
            return JoinOutcome::Full;
        }
        self.participants_list.push(participant);
        JoinOutcome::Joined {
            complete: self.is_complete(),
        }
    }
}
