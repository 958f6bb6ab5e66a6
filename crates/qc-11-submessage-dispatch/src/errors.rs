//! # Error Types
//!
//! All error types for submessage dispatch.

use crate::domain::entities::MessageKind;
use crate::domain::value_objects::Gas;
use thiserror::Error;

// =============================================================================
// ABCI CODES
// =============================================================================

/// Codespace of base chain errors.
pub const SDK_CODESPACE: &str = "sdk";
/// Codespace of contract module errors.
pub const WASM_CODESPACE: &str = "wasm";
/// Codespace of errors without a registered code.
pub const UNDEFINED_CODESPACE: &str = "undefined";

// =============================================================================
// HANDLER ERRORS
// =============================================================================

/// Failure of a message handler while executing one submessage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The submessage hit its gas ceiling.
    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {used}")]
    OutOfGas {
        /// What was being charged.
        descriptor: String,
        /// Ceiling of the meter.
        limit: Gas,
        /// Consumption when the ceiling was hit.
        used: Gas,
    },

    /// Not enough funds for a transfer.
    #[error("insufficient funds: {required} is smaller than {available}")]
    InsufficientFunds {
        /// Required amount.
        required: String,
        /// Available amount.
        available: String,
    },

    /// A contract call failed.
    #[error("execute wasm contract failed: {0}")]
    ExecuteFailed(String),

    /// Target does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed message.
    #[error("invalid: {0}")]
    Invalid(String),

    /// No handler is registered for this message kind.
    #[error("unknown message from the contract: no handler for {0}")]
    Unsupported(MessageKind),

    /// Events produced during execution failed validation.
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] EventError),

    /// Error registered by another module.
    #[error("{message}")]
    Custom {
        /// Owning module.
        codespace: String,
        /// Code within the codespace.
        code: u32,
        /// Full message.
        message: String,
    },

    /// System error. Deterministic by construction, never redacted.
    #[error("system error: {0}")]
    System(String),
}

impl HandlerError {
    /// Returns the `(codespace, code)` pair of this error.
    #[must_use]
    pub fn abci_info(&self) -> (&str, u32) {
        match self {
            Self::OutOfGas { .. } => (SDK_CODESPACE, 11),
            Self::InsufficientFunds { .. } => (SDK_CODESPACE, 5),
            Self::ExecuteFailed(_) => (WASM_CODESPACE, 5),
            Self::NotFound(_) => (WASM_CODESPACE, 8),
            Self::Invalid(_) => (WASM_CODESPACE, 14),
            Self::Unsupported(_) => (WASM_CODESPACE, 20),
            Self::InvalidEvent(_) => (WASM_CODESPACE, 21),
            Self::Custom {
                codespace, code, ..
            } => (codespace.as_str(), *code),
            Self::System(_) => (UNDEFINED_CODESPACE, 1),
        }
    }

    /// Returns true for out-of-gas failures.
    #[must_use]
    pub const fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas { .. })
    }

    /// Returns true for system errors.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// Message safe to hand to a contract.
    ///
    /// Only the codespace and code survive; the text can contain
    /// node-specific details. System errors keep their full message.
    #[must_use]
    pub fn redacted(&self) -> String {
        if self.is_system() {
            return self.to_string();
        }
        let (codespace, code) = self.abci_info();
        format!("codespace: {codespace}, code: {code}")
    }
}

// =============================================================================
// EVENT ERRORS
// =============================================================================

/// Validation failures of contract-declared events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Event type shorter than the minimum after trimming.
    #[error("event type too short: {0:?}")]
    TypeTooShort(String),

    /// Attribute key empty after trimming.
    #[error("empty attribute key, value: {value:?}")]
    EmptyAttributeKey {
        /// Value that came with the empty key.
        value: String,
    },

    /// The contract tried to set the injected contract address attribute.
    #[error("attribute key {0:?} is reserved for the contract address")]
    ContractAddressAttribute(String),

    /// Attribute key uses the reserved prefix.
    #[error("attribute key starts with reserved prefix: {0:?}")]
    ReservedAttributeKey(String),
}

// =============================================================================
// REPLY ERRORS
// =============================================================================

/// Failures of the replyer. Always fatal to the dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The contract reply entry point failed.
    #[error("contract reply failed: {0}")]
    ContractFailed(String),

    /// The reply response contained invalid events.
    #[error("reply events: {0}")]
    Event(#[from] EventError),

    /// Submessages returned by the reply could not be dispatched.
    #[error("nested dispatch failed: {0}")]
    NestedDispatch(Box<DispatchError>),

    /// The reply ran the ambient meter out of gas.
    #[error("reply out of gas: {0}")]
    OutOfGas(HandlerError),

    /// Replies nested deeper than the configured limit.
    #[error("reply depth {depth} exceeds maximum {max}")]
    DepthExceeded {
        /// Depth of the rejected reply.
        depth: u32,
        /// Configured maximum.
        max: u32,
    },
}

impl From<DispatchError> for ReplyError {
    fn from(err: DispatchError) -> Self {
        Self::NestedDispatch(Box::new(err))
    }
}

// =============================================================================
// CONTEXT ERRORS
// =============================================================================

/// Misuse of the isolated context arena.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Only the innermost open layer can be committed or discarded.
    #[error("layer {layer} is not the innermost open layer ({top})")]
    NotInnermost {
        /// Requested layer.
        layer: usize,
        /// Innermost open layer.
        top: usize,
    },

    /// The root layer is owned by the enclosing transaction.
    #[error("root layer cannot be committed or discarded")]
    RootLayer,
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// The single error returned by an aborted dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A handler failure that the reply policy does not absorb.
    #[error("submessage {id}: {source}")]
    Handler {
        /// Submessage identifier.
        id: u64,
        /// Handler failure.
        source: HandlerError,
    },

    /// The replyer failed.
    #[error("reply to submessage {id}: {source}")]
    Reply {
        /// Submessage identifier.
        id: u64,
        /// Replyer failure.
        source: ReplyError,
    },

    /// Context arena misuse.
    #[error("context: {0}")]
    Context(#[from] ContextError),
}

impl DispatchError {
    /// Identifier of the submessage that caused the abort.
    #[must_use]
    pub const fn submessage_id(&self) -> Option<u64> {
        match self {
            Self::Handler { id, .. } | Self::Reply { id, .. } => Some(*id),
            Self::Context(_) => None,
        }
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Handler { .. } => "handler",
            Self::Reply { .. } => "reply",
            Self::Context(_) => "context",
        }
    }
}

// =============================================================================
// ADDRESS ERRORS
// =============================================================================

/// Failures parsing addresses and protocol identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Missing `0x` prefix.
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),

    /// Not hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Wrong byte length.
    #[error("invalid address length: {0} bytes, expected 20")]
    InvalidLength(usize),

    /// Mixed-case input with a wrong checksum.
    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    /// Port identifier without a known contract prefix.
    #[error("invalid port id: {0}")]
    InvalidPortId(String),
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Malformed configuration document.
    #[error("config parse error: {0}")]
    Parse(String),

    /// A field has an invalid value.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

// =============================================================================
// IPC ERRORS
// =============================================================================

/// Errors related to IPC communication.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IpcError {
    /// Message validation failed.
    #[error("message validation failed: {0}")]
    ValidationFailed(String),

    /// Unauthorized sender.
    #[error("unauthorized sender: {sender_id} not in allowed list {allowed:?}")]
    UnauthorizedSender {
        /// Sender subsystem.
        sender_id: u8,
        /// Allowed subsystems.
        allowed: Vec<u8>,
    },

    /// Too many submessages in one request.
    #[error("too many submessages: {count} > {max}")]
    TooManySubmessages {
        /// Submitted.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_abci_info() {
        let err = HandlerError::OutOfGas {
            descriptor: "submessage".to_string(),
            limit: 100,
            used: 101,
        };
        assert_eq!(err.abci_info(), ("sdk", 11));
        assert!(err.is_out_of_gas());

        assert_eq!(
            HandlerError::Unsupported(MessageKind::Ibc).abci_info(),
            ("wasm", 20)
        );
        let custom = HandlerError::Custom {
            codespace: "bank".to_string(),
            code: 7,
            message: "whatever".to_string(),
        };
        assert_eq!(custom.abci_info(), ("bank", 7));
    }

    #[test]
    fn test_redacted_hides_message() {
        let err = HandlerError::InsufficientFunds {
            required: "100uqc".to_string(),
            available: "3uqc".to_string(),
        };
        assert_eq!(err.redacted(), "codespace: sdk, code: 5");
        assert!(err.to_string().contains("100uqc"));
    }

    #[test]
    fn test_redacted_keeps_system_errors() {
        let err = HandlerError::System("store corrupted".to_string());
        assert_eq!(err.redacted(), "system error: store corrupted");
    }

    #[test]
    fn test_dispatch_error_accessors() {
        let err = DispatchError::Handler {
            id: 4,
            source: HandlerError::ExecuteFailed("boom".to_string()),
        };
        assert_eq!(err.submessage_id(), Some(4));
        assert_eq!(err.reason(), "handler");
        assert_eq!(
            err.to_string(),
            "submessage 4: execute wasm contract failed: boom"
        );

        let err: DispatchError = ContextError::RootLayer.into();
        assert_eq!(err.submessage_id(), None);
        assert_eq!(err.reason(), "context");
    }

    #[test]
    fn test_nested_dispatch_error_conversion() {
        let inner = DispatchError::Context(ContextError::RootLayer);
        let err: ReplyError = inner.clone().into();
        assert_eq!(err, ReplyError::NestedDispatch(Box::new(inner)));
    }

    #[test]
    fn test_ipc_error_display() {
        let err = IpcError::UnauthorizedSender {
            sender_id: 5,
            allowed: vec![11, 15],
        };
        assert!(err.to_string().contains("unauthorized"));
        assert!(err.to_string().contains('5'));
    }
}
