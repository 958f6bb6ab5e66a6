//! # Core Domain Entities
//!
//! Main business entities for submessage dispatch.
//! A contract hands the dispatcher an ordered list of [`SubMessage`]s; each one
//! is executed by a message handler and may be answered with a [`Reply`].

use crate::domain::value_objects::{Address, Bytes, Coin, Gas};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// REPLY POLICY
// =============================================================================

/// When the issuing contract wants to be called back with the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPolicy {
    /// Never call back. A failure aborts the whole dispatch.
    #[default]
    Never,
    /// Call back on success only. A failure aborts the whole dispatch.
    Success,
    /// Call back on failure only. Success continues silently.
    Error,
    /// Always call back.
    Always,
}

impl ReplyPolicy {
    /// Returns true if a successful execution triggers a reply.
    #[must_use]
    pub const fn replies_on_success(self) -> bool {
        matches!(self, Self::Success | Self::Always)
    }

    /// Returns true if a failed execution triggers a reply instead of an abort.
    #[must_use]
    pub const fn replies_on_error(self) -> bool {
        matches!(self, Self::Error | Self::Always)
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Success => "success",
            Self::Error => "error",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for ReplyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MESSAGE VARIANTS
// =============================================================================

/// Token transfers handled by the bank module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankMessage {
    /// Send coins from the contract to another account.
    Send {
        /// Recipient.
        to_address: Address,
        /// Coins to send.
        amount: Vec<Coin>,
    },
    /// Burn coins held by the contract.
    Burn {
        /// Coins to burn.
        amount: Vec<Coin>,
    },
}

/// Calls into other contracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasmMessage {
    /// Execute an existing contract.
    Execute {
        /// Target contract.
        contract_addr: Address,
        /// Opaque execute message.
        msg: Bytes,
        /// Funds sent along with the call.
        funds: Vec<Coin>,
    },
    /// Instantiate a new contract from stored code.
    Instantiate {
        /// Optional admin allowed to migrate the new contract.
        admin: Option<Address>,
        /// Stored code identifier.
        code_id: u64,
        /// Opaque instantiate message.
        msg: Bytes,
        /// Funds sent along with the call.
        funds: Vec<Coin>,
        /// Human readable label.
        label: String,
    },
    /// Migrate a contract to new code.
    Migrate {
        /// Target contract.
        contract_addr: Address,
        /// New code identifier.
        new_code_id: u64,
        /// Opaque migrate message.
        msg: Bytes,
    },
}

/// A protocol-level message addressed by type URL (stargate-style).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyMessage {
    /// Fully qualified message type.
    pub type_url: String,
    /// Encoded message body.
    pub value: Bytes,
}

/// Timeout for outgoing IBC packets. At least one bound should be set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbcTimeout {
    /// Block height on the counterparty chain.
    pub height: Option<u64>,
    /// Unix timestamp in nanoseconds.
    pub timestamp: Option<u64>,
}

/// Cross-chain messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcMessage {
    /// ICS-20 token transfer.
    Transfer {
        /// Local channel.
        channel_id: String,
        /// Recipient on the counterparty chain.
        to_address: String,
        /// Amount to transfer.
        amount: Coin,
        /// Packet timeout.
        timeout: IbcTimeout,
    },
    /// Raw packet on a channel owned by the contract.
    SendPacket {
        /// Local channel.
        channel_id: String,
        /// Packet data.
        data: Bytes,
        /// Packet timeout.
        timeout: IbcTimeout,
    },
    /// Close a channel owned by the contract.
    CloseChannel {
        /// Local channel.
        channel_id: String,
    },
}

/// Execution target of a submessage.
///
/// The dispatcher never looks inside; only message handlers do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMessage {
    /// Bank module.
    Bank(BankMessage),
    /// Other contracts.
    Wasm(WasmMessage),
    /// Protocol message addressed by type URL.
    Any(AnyMessage),
    /// Cross-chain transport.
    Ibc(IbcMessage),
    /// Chain-specific extension, opaque to this crate.
    Custom(Bytes),
}

impl ContractMessage {
    /// Returns the variant tag.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Bank(_) => MessageKind::Bank,
            Self::Wasm(_) => MessageKind::Wasm,
            Self::Any(_) => MessageKind::Any,
            Self::Ibc(_) => MessageKind::Ibc,
            Self::Custom(_) => MessageKind::Custom,
        }
    }
}

impl Default for ContractMessage {
    fn default() -> Self {
        Self::Custom(Bytes::new())
    }
}

/// Variant tag of a [`ContractMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Bank module.
    Bank,
    /// Other contracts.
    Wasm,
    /// Protocol message addressed by type URL.
    Any,
    /// Cross-chain transport.
    Ibc,
    /// Chain-specific extension.
    Custom,
}

impl MessageKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [Self::Bank, Self::Wasm, Self::Any, Self::Ibc, Self::Custom];

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Wasm => "wasm",
            Self::Any => "any",
            Self::Ibc => "ibc",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SUBMESSAGE
// =============================================================================

/// One contract-issued unit of work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMessage {
    /// Identifier echoed back in the reply.
    pub id: u64,
    /// What to execute.
    pub msg: ContractMessage,
    /// Optional gas ceiling for this submessage.
    pub gas_limit: Option<Gas>,
    /// When to call the contract back.
    pub reply_on: ReplyPolicy,
    /// Opaque bytes echoed back in the reply.
    pub payload: Bytes,
}

impl SubMessage {
    /// Creates a fire-and-forget submessage (`id = 0`, never replies).
    #[must_use]
    pub fn new(msg: ContractMessage) -> Self {
        Self {
            id: 0,
            msg,
            gas_limit: None,
            reply_on: ReplyPolicy::Never,
            payload: Bytes::new(),
        }
    }

    /// Creates a submessage that replies with the given policy.
    #[must_use]
    pub fn reply_on(msg: ContractMessage, id: u64, reply_on: ReplyPolicy) -> Self {
        Self {
            id,
            reply_on,
            ..Self::new(msg)
        }
    }

    /// Sets the gas ceiling.
    #[must_use]
    pub fn with_gas_limit(mut self, limit: Gas) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Sets the payload echoed in the reply.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// A key/value pair attached to an [`Event`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventAttribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

impl EventAttribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A typed, ordered list of attributes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Event {
    /// Event type.
    #[serde(rename = "type")]
    pub ty: String,
    /// Attributes in emission order.
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Creates an event without attributes.
    #[must_use]
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn add_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute::new(key, value));
        self
    }

    /// Returns the value of the first attribute with the given key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

// =============================================================================
// HANDLER OUTPUT
// =============================================================================

/// Response of one protocol-level message executed by a handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolResponse {
    /// Fully qualified response type.
    pub type_url: String,
    /// Encoded response body.
    pub value: Bytes,
}

impl ProtocolResponse {
    /// Creates a protocol response.
    #[must_use]
    pub fn new(type_url: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }
}

/// What a message handler produced for one successful submessage.
///
/// Failures are reported through `Err(HandlerError)` instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Raw events returned by the handler.
    pub events: Vec<Event>,
    /// Data frames, one per executed protocol message.
    pub data: Vec<Bytes>,
    /// Protocol responses, one list per executed protocol message.
    pub protocol_responses: Vec<Vec<ProtocolResponse>>,
}

impl DispatchOutcome {
    /// An outcome carrying only data frames.
    #[must_use]
    pub fn with_data(data: Vec<Bytes>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// An outcome carrying only events.
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }
}

// =============================================================================
// REPLY
// =============================================================================

/// Successful branch of a [`SubMsgResult`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMsgResponse {
    /// Contract-visible events of the submessage.
    pub events: Vec<Event>,
    /// First data frame of the handler, if any.
    pub data: Option<Bytes>,
    /// Flattened protocol responses.
    pub msg_responses: Vec<ProtocolResponse>,
}

/// Outcome delivered to the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubMsgResult {
    /// The submessage executed and its effects were committed.
    Ok(SubMsgResponse),
    /// The submessage failed and its effects were discarded.
    #[serde(rename = "error")]
    Err(String),
}

impl SubMsgResult {
    /// Returns true for the `Ok` branch.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns the response of the `Ok` branch.
    #[must_use]
    pub const fn ok(&self) -> Option<&SubMsgResponse> {
        match self {
            Self::Ok(response) => Some(response),
            Self::Err(_) => None,
        }
    }

    /// Returns the message of the `Err` branch.
    #[must_use]
    pub fn err(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Err(msg) => Some(msg),
        }
    }
}

/// Synchronous callback delivering a submessage outcome to the issuing contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Identifier of the originating submessage.
    pub id: u64,
    /// Payload of the originating submessage.
    pub payload: Bytes,
    /// Gas the submessage charged to the ambient meter.
    pub gas_used: Gas,
    /// Execution outcome.
    pub result: SubMsgResult,
}

// =============================================================================
// CONTRACT RESPONSE
// =============================================================================

/// What a contract entry point returned to the sandbox.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractResponse {
    /// Attributes for the module-level `wasm` event.
    pub attributes: Vec<EventAttribute>,
    /// Contract-declared custom events.
    pub events: Vec<Event>,
    /// Submessages to dispatch next.
    pub messages: Vec<SubMessage>,
    /// Response data.
    pub data: Option<Bytes>,
}

// =============================================================================
// DISPATCH REPORT
// =============================================================================

/// Per-submessage summary of a completed dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubMessageReport {
    /// Submessage identifier.
    pub id: u64,
    /// Whether the isolated context was merged into the parent.
    pub committed: bool,
    /// Whether the replyer was invoked.
    pub replied: bool,
    /// Gas charged to the ambient meter.
    pub gas_used: Gas,
}

/// Result of a dispatch that ran to completion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Last non-`None` response data returned by a reply.
    pub data: Option<Bytes>,
    /// One entry per submessage, in execution order.
    pub submessages: Vec<SubMessageReport>,
}

impl DispatchReport {
    /// Commit flags in execution order.
    #[must_use]
    pub fn commits(&self) -> Vec<bool> {
        self.submessages.iter().map(|s| s.committed).collect()
    }

    /// Total gas charged by all submessages.
    #[must_use]
    pub fn gas_used(&self) -> Gas {
        self.submessages.iter().map(|s| s.gas_used).sum()
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Rules used to split handler events into contract-visible and full log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilterConfig {
    /// Event types removed from the contract-visible set.
    pub hidden_event_types: Vec<String>,
    /// Attribute keys marking an event as protocol or cross-chain originated.
    pub protocol_origin_attribute_keys: Vec<String>,
    /// Let events of non-contract messages reach the reply.
    pub expose_non_contract_events: bool,
}

impl Default for EventFilterConfig {
    fn default() -> Self {
        Self {
            hidden_event_types: vec!["message".to_string()],
            protocol_origin_attribute_keys: vec!["stargate".to_string()],
            expose_non_contract_events: false,
        }
    }
}

/// Dispatcher configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Replace handler error messages in replies by their ABCI code.
    pub redact_errors: bool,
    /// Event visibility rules.
    pub event_filter: EventFilterConfig,
    /// Gas charged to the caller's meter before each contract reply.
    pub reply_gas_cost: Gas,
    /// Maximum nesting of replies that dispatch further submessages.
    pub max_reply_depth: u32,
}

/// Default setup cost of a contract reply.
pub const DEFAULT_REPLY_GAS_COST: Gas = 60_000;

/// Default maximum reply nesting.
pub const DEFAULT_MAX_REPLY_DEPTH: u32 = 16;

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            redact_errors: true,
            event_filter: EventFilterConfig::default(),
            reply_gas_cost: DEFAULT_REPLY_GAS_COST,
            max_reply_depth: DEFAULT_MAX_REPLY_DEPTH,
        }
    }
}

impl DispatcherConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for blank event types or keys,
    /// or a zero reply depth.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_reply_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_reply_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        let filter = &self.event_filter;
        if filter.hidden_event_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "event_filter.hidden_event_types",
                reason: "event types must not be blank".to_string(),
            });
        }
        if filter
            .protocol_origin_attribute_keys
            .iter()
            .any(|k| k.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "event_filter.protocol_origin_attribute_keys",
                reason: "attribute keys must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Builder-style method to toggle error redaction.
    #[must_use]
    pub fn with_redact_errors(mut self, redact: bool) -> Self {
        self.redact_errors = redact;
        self
    }

    /// Builder-style method to set the per-reply gas cost.
    #[must_use]
    pub fn with_reply_gas_cost(mut self, cost: Gas) -> Self {
        self.reply_gas_cost = cost;
        self
    }

    /// Builder-style method to set the maximum reply nesting.
    #[must_use]
    pub fn with_max_reply_depth(mut self, depth: u32) -> Self {
        self.max_reply_depth = depth;
        self
    }

    /// Builder-style method to replace the event filter rules.
    #[must_use]
    pub fn with_event_filter(mut self, event_filter: EventFilterConfig) -> Self {
        self.event_filter = event_filter;
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_policy_matrix() {
        assert!(!ReplyPolicy::Never.replies_on_success());
        assert!(!ReplyPolicy::Never.replies_on_error());
        assert!(ReplyPolicy::Success.replies_on_success());
        assert!(!ReplyPolicy::Success.replies_on_error());
        assert!(!ReplyPolicy::Error.replies_on_success());
        assert!(ReplyPolicy::Error.replies_on_error());
        assert!(ReplyPolicy::Always.replies_on_success());
        assert!(ReplyPolicy::Always.replies_on_error());
    }

    #[test]
    fn test_reply_policy_serde_rejects_unknown() {
        let policy: ReplyPolicy = serde_json::from_str("\"always\"").unwrap();
        assert_eq!(policy, ReplyPolicy::Always);
        assert!(serde_json::from_str::<ReplyPolicy>("\"sometimes\"").is_err());
    }

    #[test]
    fn test_message_kind() {
        let msg = ContractMessage::Any(AnyMessage {
            type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
            value: Bytes::new(),
        });
        assert_eq!(msg.kind(), MessageKind::Any);
        assert_eq!(ContractMessage::default().kind(), MessageKind::Custom);
        assert_eq!(MessageKind::Wasm.to_string(), "wasm");
    }

    #[test]
    fn test_submessage_builders() {
        let sub = SubMessage::reply_on(ContractMessage::default(), 7, ReplyPolicy::Error)
            .with_gas_limit(500)
            .with_payload("ctx");
        assert_eq!(sub.id, 7);
        assert_eq!(sub.reply_on, ReplyPolicy::Error);
        assert_eq!(sub.gas_limit, Some(500));
        assert_eq!(sub.payload, Bytes::from("ctx"));
    }

    #[test]
    fn test_event_serializes_type_field() {
        let event = Event::new("wasm-foo").add_attribute("k", "v");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"wasm-foo\""));
        assert_eq!(event.attribute("k"), Some("v"));
        assert_eq!(event.attribute("missing"), None);
    }

    #[test]
    fn test_sub_msg_result_accessors() {
        let ok = SubMsgResult::Ok(SubMsgResponse::default());
        assert!(ok.is_ok());
        assert!(ok.ok().is_some());
        assert!(ok.err().is_none());

        let err = SubMsgResult::Err("boom".to_string());
        assert!(!err.is_ok());
        assert_eq!(err.err(), Some("boom"));
    }

    #[test]
    fn test_dispatcher_config_defaults() {
        let config = DispatcherConfig::default();
        assert!(config.redact_errors);
        assert_eq!(config.event_filter.hidden_event_types, vec!["message"]);
        assert_eq!(config.reply_gas_cost, DEFAULT_REPLY_GAS_COST);
        assert_eq!(config.max_reply_depth, DEFAULT_MAX_REPLY_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dispatcher_config_rejects_zero_reply_depth() {
        assert!(matches!(
            DispatcherConfig::default().with_max_reply_depth(0).validate(),
            Err(ConfigError::InvalidValue { field: "max_reply_depth", .. })
        ));
        assert!(DispatcherConfig::default()
            .with_max_reply_depth(1)
            .with_reply_gas_cost(0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_dispatcher_config_from_json() {
        let config = DispatcherConfig::from_json(r#"{"redact_errors": false}"#).unwrap();
        assert!(!config.redact_errors);
        assert_eq!(config.event_filter, EventFilterConfig::default());

        let err = DispatcherConfig::from_json(
            r#"{"event_filter": {"hidden_event_types": ["  "]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        assert!(matches!(
            DispatcherConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_dispatch_report_helpers() {
        let report = DispatchReport {
            data: None,
            submessages: vec![
                SubMessageReport {
                    id: 1,
                    committed: true,
                    replied: false,
                    gas_used: 10,
                },
                SubMessageReport {
                    id: 2,
                    committed: false,
                    replied: true,
                    gas_used: 5,
                },
            ],
        };
        assert_eq!(report.commits(), vec![true, false]);
        assert_eq!(report.gas_used(), 15);
    }
}
