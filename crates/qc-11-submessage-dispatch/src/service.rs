//! # Submessage Dispatch Service
//!
//! Async service that runs each dispatch request as its own transaction over
//! a committed store.
//!
//! ## Architecture Compliance
//!
//! - Subscribes to `DispatchSubmessagesRequest` from Subsystems 11, 15
//! - Publishes results via Event Bus (aborted dispatches go to the DLQ)
//! - NO direct subsystem-to-subsystem calls
//!
//! ## Transactions
//!
//! One dispatch at a time: snapshot the store, dispatch on a fresh arena,
//! then apply the root layer only if the dispatch completed. An aborted
//! dispatch leaves the store untouched, including submessages that had
//! already committed into the root layer.
//!
//! ## Security
//!
//! - Validates `sender_id` from envelope per IPC-MATRIX.md
//! - All identity from `AuthenticatedMessage.sender_id` only

use crate::context::{BasicGasMeter, ContextArena, ExecutionContext, GasMeter};
use crate::dispatcher::MessageDispatcher;
use crate::domain::entities::DispatcherConfig;
use crate::domain::services::port_id_for_contract;
use crate::domain::value_objects::Gas;
use crate::errors::{ConfigError, DispatchError, IpcError};
use crate::events::{
    subsystem_ids, topics, DispatchSubmessagesRequestPayload, DispatchSubmessagesResponsePayload,
};
use crate::ports::inbound::{DispatchRequest, DispatchResult, SubmessageApi};
use crate::ports::outbound::{CommittedStore, MessageHandler, Replyer};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Submessage Dispatch Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Dispatcher configuration.
    pub dispatcher: DispatcherConfig,
    /// Gas available to a request that does not set its own limit.
    pub default_gas_limit: Gas,
    /// Maximum submessages accepted in one request.
    pub max_submessages: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            default_gas_limit: 10_000_000,
            max_submessages: 64,
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero limits or an invalid
    /// dispatcher configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_gas_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_submessages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_submessages",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.dispatcher.validate()
    }

    /// Set the dispatcher configuration.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Set the default gas limit.
    #[must_use]
    pub fn with_default_gas_limit(mut self, gas: Gas) -> Self {
        self.default_gas_limit = gas;
        self
    }

    /// Set the maximum submessages per request.
    #[must_use]
    pub fn with_max_submessages(mut self, max: usize) -> Self {
        self.max_submessages = max;
        self
    }
}

/// Statistics for the Submessage Dispatch Service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Dispatches run.
    pub dispatches_executed: u64,
    /// Dispatches whose effects were committed.
    pub committed_dispatches: u64,
    /// Dispatches aborted and rolled back.
    pub aborted_dispatches: u64,
    /// Submessages executed by committed dispatches.
    pub submessages_executed: u64,
    /// Total gas consumed.
    pub total_gas_used: u64,
    /// Average dispatch time in microseconds.
    pub avg_dispatch_time_us: u64,
    /// Rejected requests (unauthorized sender, oversized request).
    pub rejected_requests: u64,
}

impl ServiceStats {
    /// Records one finished dispatch. Counters saturate.
    pub fn record_dispatch(&mut self, submessages: Option<usize>, gas_used: Gas, elapsed_us: u64) {
        self.dispatches_executed = self.dispatches_executed.saturating_add(1);
        self.total_gas_used = self.total_gas_used.saturating_add(gas_used);
        match submessages {
            Some(count) => {
                self.committed_dispatches = self.committed_dispatches.saturating_add(1);
                self.submessages_executed = self
                    .submessages_executed
                    .saturating_add(u64::try_from(count).unwrap_or(u64::MAX));
            }
            None => self.aborted_dispatches = self.aborted_dispatches.saturating_add(1),
        }
        // Running average, weighted sum in u128.
        let total = u128::from(self.dispatches_executed);
        let sum = u128::from(self.avg_dispatch_time_us) * (total - 1) + u128::from(elapsed_us);
        self.avg_dispatch_time_us = u64::try_from(sum / total).unwrap_or(u64::MAX);
    }
}

/// Inbound message from event bus.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Topic the message was received on.
    pub topic: String,
    /// Sender subsystem ID (from envelope).
    pub sender_id: u8,
    /// Correlation ID for request/response matching.
    pub correlation_id: Uuid,
    /// Raw payload bytes (JSON).
    pub payload: Vec<u8>,
}

/// Outbound message for the event bus.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Topic to publish on.
    pub topic: &'static str,
    /// Correlation ID copied from the request.
    pub correlation_id: Uuid,
    /// Raw payload bytes (JSON).
    pub payload: Vec<u8>,
}

/// The main Submessage Dispatch Service.
///
/// This service:
/// 1. Receives dispatch requests from the Event Bus
/// 2. Runs them through the dispatcher as isolated transactions
/// 3. Commits or rolls back the store
/// 4. Maintains dispatch statistics
pub struct SubmessageService<H, R, S> {
    /// Service configuration.
    config: ServiceConfig,
    /// Dispatch engine.
    dispatcher: MessageDispatcher<H, R>,
    /// Committed state.
    store: Arc<S>,
    /// Serializes transactions over the store.
    tx_lock: Mutex<()>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<H: MessageHandler, R: Replyer, S: CommittedStore> SubmessageService<H, R, S> {
    /// Create a new Submessage Dispatch Service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` does not validate.
    pub fn new(handler: H, replyer: R, store: Arc<S>, config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dispatcher = MessageDispatcher::with_config(handler, replyer, config.dispatcher.clone());
        Ok(Self {
            config,
            dispatcher,
            store,
            tx_lock: Mutex::new(()),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        })
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Committed store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Handle a dispatch request from the Event Bus.
    ///
    /// An aborted dispatch is still answered, with `success: false`.
    ///
    /// # Security
    ///
    /// Validates that the `sender_id` is authorized per IPC-MATRIX.md:
    /// - `DispatchSubmessagesRequest`: `sender_id` must be 11 or 15
    ///
    /// # Errors
    ///
    /// Returns [`IpcError`] if the request is rejected before dispatch.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_dispatch_submessages(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        payload: DispatchSubmessagesRequestPayload,
    ) -> Result<DispatchSubmessagesResponsePayload, IpcError> {
        // Security: Validate sender
        if !subsystem_ids::is_authorized_dispatch_sender(sender_id) {
            warn!(
                sender_id = sender_id,
                "Unauthorized sender for DispatchSubmessagesRequest"
            );
            self.stats.write().await.rejected_requests += 1;
            return Err(IpcError::UnauthorizedSender {
                sender_id,
                allowed: vec![subsystem_ids::SMART_CONTRACTS, subsystem_ids::CROSS_CHAIN],
            });
        }

        let count = payload.submessages.len();
        if count > self.config.max_submessages {
            warn!(count, max = self.config.max_submessages, "Oversized dispatch request");
            self.stats.write().await.rejected_requests += 1;
            return Err(IpcError::TooManySubmessages {
                count,
                max: self.config.max_submessages,
            });
        }

        info!(
            contract = %payload.contract,
            submessages = count,
            "Processing dispatch request"
        );

        let (result, gas_used) = self.run_transaction(payload.into()).await;
        Ok(match result {
            Ok(result) => DispatchSubmessagesResponsePayload::committed(
                result.report,
                result.events,
                result.gas_used,
            ),
            Err(err) => DispatchSubmessagesResponsePayload::aborted(err.to_string(), gas_used),
        })
    }

    /// Decode, handle and encode one bus message.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::ValidationFailed`] for unknown topics or malformed
    /// payloads, or any rejection of [`Self::handle_dispatch_submessages`].
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<OutboundMessage, IpcError> {
        if message.topic != topics::DISPATCH_SUBMESSAGES_REQUEST {
            return Err(IpcError::ValidationFailed(format!(
                "unexpected topic: {}",
                message.topic
            )));
        }
        let payload: DispatchSubmessagesRequestPayload = serde_json::from_slice(&message.payload)
            .map_err(|e| IpcError::ValidationFailed(e.to_string()))?;

        let response = self
            .handle_dispatch_submessages(message.sender_id, message.correlation_id, payload)
            .await?;
        let topic = if response.success {
            topics::DISPATCH_SUBMESSAGES_RESPONSE
        } else {
            topics::DLQ
        };
        let payload =
            serde_json::to_vec(&response).map_err(|e| IpcError::ValidationFailed(e.to_string()))?;

        Ok(OutboundMessage {
            topic,
            correlation_id: message.correlation_id,
            payload,
        })
    }

    /// Runs one dispatch as a transaction. Also returns the gas consumed,
    /// which the error alone does not carry.
    async fn run_transaction(&self, request: DispatchRequest) -> (Result<DispatchResult, DispatchError>, Gas) {
        let _tx = self.tx_lock.lock().await;
        let start = Instant::now();

        let mut arena = ContextArena::new(self.store.snapshot().await);
        let mut meter =
            BasicGasMeter::new(request.gas_limit.unwrap_or(self.config.default_gas_limit));
        let protocol_id = request
            .protocol_id
            .clone()
            .unwrap_or_else(|| port_id_for_contract(&request.contract));

        let result = {
            let mut ctx = ExecutionContext::root(&mut arena, &mut meter);
            self.dispatcher.dispatch_submessages(
                &mut ctx,
                &request.contract,
                &protocol_id,
                &request.submessages,
            )
        };
        let gas_used = meter.consumed();

        let result = match result {
            Ok(report) => {
                let changes = arena.into_root_changes();
                debug!(
                    writes = changes.writes.len(),
                    events = changes.events.len(),
                    "Committing dispatch"
                );
                self.store.apply(changes.writes).await;
                Ok(DispatchResult {
                    report,
                    events: changes.events,
                    gas_used,
                })
            }
            Err(err) => {
                debug!(error = %err, "Rolling back dispatch");
                Err(err)
            }
        };

        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        self.stats.write().await.record_dispatch(
            result.as_ref().ok().map(|res| res.report.submessages.len()),
            gas_used,
            elapsed_us,
        );

        (result, gas_used)
    }
}

// =============================================================================
// SubmessageApi Implementation
// =============================================================================

#[async_trait]
impl<H: MessageHandler, R: Replyer, S: CommittedStore> SubmessageApi for SubmessageService<H, R, S> {
    async fn dispatch_submessages(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchResult, DispatchError> {
        self.run_transaction(request).await.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
