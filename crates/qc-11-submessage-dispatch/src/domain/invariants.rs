//! # Domain Invariants
//!
//! Invariants that MUST hold for every dispatch.
//!
//! - INVARIANT-1: Contract address attribute is first, unique and correct
//! - INVARIANT-2: No other attribute key uses the reserved prefix
//! - INVARIANT-3: A reply echoes the id and payload of its submessage
//! - INVARIANT-4: Contract-visible events are an ordered subsequence of the full log
//! - INVARIANT-5: A submessage never charges more than its gas limit
//!
//! A failed reply carries no events by construction (`SubMsgResult::Err`
//! holds only a message).

use crate::domain::entities::{Event, Reply, SubMessage};
use crate::domain::event_builder::{ATTRIBUTE_KEY_CONTRACT_ADDR, ATTRIBUTE_RESERVED_PREFIX};
use crate::domain::value_objects::{Address, Gas};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Contract Address Attribute
///
/// The first attribute is `_contract_address` with the contract's canonical
/// address, and no other attribute uses that key.
#[must_use]
pub fn check_contract_address_invariant(event: &Event, contract: &Address) -> bool {
    let Some((first, rest)) = event.attributes.split_first() else {
        return false;
    };
    first.key == ATTRIBUTE_KEY_CONTRACT_ADDR
        && first.value == contract.to_canonical_string()
        && rest.iter().all(|attr| attr.key != ATTRIBUTE_KEY_CONTRACT_ADDR)
}

/// INVARIANT-2: Reserved Keys
///
/// Only the injected contract address may use the reserved prefix.
#[must_use]
pub fn check_reserved_keys_invariant(event: &Event) -> bool {
    event
        .attributes
        .iter()
        .skip(1)
        .all(|attr| !attr.key.starts_with(ATTRIBUTE_RESERVED_PREFIX))
}

/// INVARIANT-3: Reply Echo
#[must_use]
pub fn check_reply_echo_invariant(sub: &SubMessage, reply: &Reply) -> bool {
    sub.id == reply.id && sub.payload == reply.payload
}

/// INVARIANT-4: Filter Preserves Order
///
/// Every contract-visible event appears in the full log, in the same
/// relative order.
#[must_use]
pub fn check_filtered_subsequence(visible: &[Event], full_log: &[Event]) -> bool {
    let mut log = full_log.iter();
    visible.iter().all(|event| log.any(|candidate| candidate == event))
}

/// INVARIANT-5: Gas Limit Enforcement
#[must_use]
pub fn check_gas_limit_invariant(gas_used: Gas, gas_limit: Option<Gas>) -> bool {
    gas_limit.map_or(true, |limit| gas_used <= limit)
}

/// Checks every invariant that applies to a delivered reply.
#[must_use]
pub fn check_reply_invariants(sub: &SubMessage, reply: &Reply) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_reply_echo_invariant(sub, reply) {
        violations.push(InvariantViolation::ReplyMismatch {
            expected: sub.id,
            actual: reply.id,
        });
    }

    if !check_gas_limit_invariant(reply.gas_used, sub.gas_limit) {
        violations.push(InvariantViolation::GasLimitExceeded {
            used: reply.gas_used,
            limit: sub.gas_limit.unwrap_or_default(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

/// Checks every invariant that applies to contract events.
#[must_use]
pub fn check_contract_event_invariants(events: &[Event], contract: &Address) -> InvariantCheckResult {
    let violations: Vec<_> = events
        .iter()
        .filter_map(|event| {
            if !check_contract_address_invariant(event, contract) {
                Some(InvariantViolation::ContractAddressMissing {
                    event_type: event.ty.clone(),
                })
            } else if !check_reserved_keys_invariant(event) {
                Some(InvariantViolation::ReservedKeyUsed {
                    event_type: event.ty.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Contract address attribute missing, misplaced or duplicated.
    ContractAddressMissing {
        /// Type of the offending event.
        event_type: String,
    },
    /// A reserved key other than the contract address was used.
    ReservedKeyUsed {
        /// Type of the offending event.
        event_type: String,
    },
    /// Reply does not match its submessage.
    ReplyMismatch {
        /// Submessage id.
        expected: u64,
        /// Id carried by the reply.
        actual: u64,
    },
    /// Submessage charged more than its limit.
    GasLimitExceeded {
        /// Gas charged upward.
        used: Gas,
        /// Submessage gas limit.
        limit: Gas,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContractAddressMissing { event_type } => {
                write!(f, "contract address attribute invalid in {event_type}")
            }
            Self::ReservedKeyUsed { event_type } => {
                write!(f, "reserved attribute key used in {event_type}")
            }
            Self::ReplyMismatch { expected, actual } => {
                write!(f, "reply id mismatch: expected {expected}, got {actual}")
            }
            Self::GasLimitExceeded { used, limit } => {
                write!(f, "gas limit exceeded: used {used} > limit {limit}")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
