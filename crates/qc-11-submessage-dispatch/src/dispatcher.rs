//! # Message Dispatcher
//!
//! Runs a contract's submessages strictly in order. Each one executes in an
//! isolated layer, optionally under its own gas ceiling, and its outcome is
//! settled by the reply policy:
//!
//! | Outcome | Policy | Layer | Action |
//! |---------|--------|-------|--------|
//! | Ok | `never`, `error` | commit | continue |
//! | Ok | `success`, `always` | commit | reply `Ok` |
//! | Err | `error`, `always` | discard | reply `Err` |
//! | Err | `never`, `success` | discard | abort |
//!
//! A failing reply aborts the dispatch whatever the policy.

use crate::context::{
    scoped_charge, scoped_meter, ExecutionContext, LayerId, SUBMESSAGE_GAS_DESCRIPTOR,
};
use crate::domain::entities::{
    DispatchOutcome, DispatchReport, DispatcherConfig, Event, Reply, SubMessage,
    SubMessageReport, SubMsgResult,
};
use crate::domain::event_filter::EventFilter;
use crate::domain::invariants::{
    check_filtered_subsequence, check_gas_limit_invariant, check_reply_echo_invariant,
};
use crate::domain::services::{failure_result, success_result};
use crate::domain::value_objects::{Address, Bytes, Gas};
use crate::errors::{DispatchError, HandlerError, ReplyError};
use crate::metrics;
use crate::ports::inbound::SubmessageDispatch;
use crate::ports::outbound::{MessageHandler, Replyer};
use tracing::{debug, instrument, warn};

/// Submessage dispatcher over a message handler and a replyer.
#[derive(Debug)]
pub struct MessageDispatcher<H, R> {
    handler: H,
    replyer: R,
    config: DispatcherConfig,
    filter: EventFilter,
}

impl<H: MessageHandler, R: Replyer> MessageDispatcher<H, R> {
    /// Creates a dispatcher with the default configuration.
    pub fn new(handler: H, replyer: R) -> Self {
        Self::with_config(handler, replyer, DispatcherConfig::default())
    }

    /// Creates a dispatcher with the given configuration.
    pub fn with_config(handler: H, replyer: R, config: DispatcherConfig) -> Self {
        let filter = EventFilter::new(config.event_filter.clone());
        Self {
            handler,
            replyer,
            config,
            filter,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the message handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns the replyer.
    #[must_use]
    pub fn replyer(&self) -> &R {
        &self.replyer
    }

    /// Dispatches `submessages` in order.
    ///
    /// # Errors
    ///
    /// See [`SubmessageDispatch::dispatch`].
    #[instrument(
        skip_all,
        fields(contract = %contract, protocol_id = %protocol_id, count = submessages.len())
    )]
    pub fn dispatch_submessages(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        submessages: &[SubMessage],
    ) -> Result<DispatchReport, DispatchError> {
        let mut report = DispatchReport::default();

        for sub in submessages {
            match self.dispatch_one(ctx, contract, protocol_id, sub, &mut report.data) {
                Ok(entry) => report.submessages.push(entry),
                Err(err) => {
                    warn!(
                        submsg_id = sub.id,
                        reply_on = %sub.reply_on,
                        reason = err.reason(),
                        error = %err,
                        "Dispatch aborted"
                    );
                    metrics::record_dispatch_abort(err.reason());
                    return Err(err);
                }
            }
        }

        debug!(
            executed = report.submessages.len(),
            has_data = report.data.is_some(),
            "Dispatch completed"
        );
        Ok(report)
    }

    /// Executes one submessage and settles it.
    fn dispatch_one(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        sub: &SubMessage,
        running: &mut Option<Bytes>,
    ) -> Result<SubMessageReport, DispatchError> {
        let gas_before = ctx.gas_consumed();
        let layer = ctx.open_layer()?;
        let mut scoped = scoped_meter(ctx.gas_remaining(), sub.gas_limit);

        let result = {
            let mut sub_ctx = match scoped.as_mut() {
                Some(meter) => ctx.derive_with_meter(layer, meter),
                None => ctx.derive(layer),
            };
            let result = self
                .handler
                .dispatch(&mut sub_ctx, contract, protocol_id, &sub.msg);
            match result {
                // A handler must not swallow running out of gas.
                Ok(_) if sub_ctx.is_out_of_gas() => Err(HandlerError::OutOfGas {
                    descriptor: SUBMESSAGE_GAS_DESCRIPTOR.to_string(),
                    limit: sub_ctx.gas_limit(),
                    used: sub_ctx.gas_consumed(),
                }),
                other => other,
            }
        };

        // Close the layer before anything else can fail.
        let layer_events = match &result {
            Ok(_) => {
                let events = ctx.take_layer_events(layer);
                ctx.commit_layer(layer)?;
                events
            }
            Err(_) => {
                ctx.discard_layer(layer)?;
                Vec::new()
            }
        };
        metrics::record_submessage(result.is_ok());

        if let Some(meter) = &scoped {
            let out_of_gas = matches!(&result, Err(err) if err.is_out_of_gas());
            let charge = scoped_charge(meter, out_of_gas);
            debug_assert!(check_gas_limit_invariant(charge, sub.gas_limit));
            metrics::record_limited_gas(charge);
            ctx.consume_gas(charge, SUBMESSAGE_GAS_DESCRIPTOR)
                .map_err(|source| DispatchError::Handler { id: sub.id, source })?;
        }
        // Only a scoped meter's exhaustion can be absorbed by a reply.
        if ctx.is_out_of_gas() {
            debug!(submsg_id = sub.id, "Rollback & Abort (ambient out of gas)");
            return Err(DispatchError::Handler {
                id: sub.id,
                source: ambient_out_of_gas(ctx),
            });
        }
        let gas_used = ctx.gas_consumed().saturating_sub(gas_before);

        let reply_result = match result {
            Ok(outcome) => match self.settle_success(ctx, sub, layer, layer_events, outcome) {
                Some(result) => result,
                None => {
                    debug!(submsg_id = sub.id, gas_used, "Commit & Continue");
                    return Ok(SubMessageReport {
                        id: sub.id,
                        committed: true,
                        replied: false,
                        gas_used,
                    });
                }
            },
            Err(err) => {
                if !sub.reply_on.replies_on_error() {
                    debug!(submsg_id = sub.id, gas_used, "Rollback & Abort");
                    return Err(DispatchError::Handler {
                        id: sub.id,
                        source: err,
                    });
                }
                debug!(submsg_id = sub.id, gas_used, error = %err, "Rollback & Reply");
                failure_result(&err, self.config.redact_errors)
            }
        };

        let committed = reply_result.is_ok();
        let data = self.send_reply(ctx, contract, sub, gas_used, reply_result)?;
        if ctx.is_out_of_gas() {
            return Err(DispatchError::Reply {
                id: sub.id,
                source: ReplyError::OutOfGas(ambient_out_of_gas(ctx)),
            });
        }
        if let Some(data) = data {
            *running = Some(data);
        }

        Ok(SubMessageReport {
            id: sub.id,
            committed,
            replied: true,
            gas_used,
        })
    }

    /// Filters and emits the events of a committed submessage.
    ///
    /// Returns the `Ok` reply result if the policy asks for one.
    fn settle_success(
        &self,
        ctx: &mut ExecutionContext<'_>,
        sub: &SubMessage,
        layer: LayerId,
        mut events: Vec<Event>,
        outcome: DispatchOutcome,
    ) -> Option<SubMsgResult> {
        let DispatchOutcome {
            events: returned,
            data,
            protocol_responses,
        } = outcome;
        events.extend(returned);

        let filtered = self.filter.filter(sub.msg.kind(), events);
        debug_assert!(check_filtered_subsequence(
            &filtered.contract_visible,
            &filtered.full_log
        ));
        debug!(
            submsg_id = sub.id,
            layer = layer.depth(),
            visible = filtered.contract_visible.len(),
            emitted = filtered.full_log.len(),
            "Committed submessage events"
        );
        ctx.emit_events(filtered.full_log);

        if !sub.reply_on.replies_on_success() {
            return None;
        }
        debug!(submsg_id = sub.id, "Commit & Reply");
        Some(success_result(
            filtered.contract_visible,
            data,
            protocol_responses,
        ))
    }

    /// Hands a reply to the replyer on the parent context.
    fn send_reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        sub: &SubMessage,
        gas_used: Gas,
        result: SubMsgResult,
    ) -> Result<Option<Bytes>, DispatchError> {
        let reply = Reply {
            id: sub.id,
            payload: sub.payload.clone(),
            gas_used,
            result,
        };
        debug_assert!(check_reply_echo_invariant(sub, &reply));
        metrics::record_reply(reply.result.is_ok());

        self.replyer
            .reply(ctx, contract, reply)
            .map_err(|source| DispatchError::Reply { id: sub.id, source })
    }
}

/// Out-of-gas error for the exhausted meter in charge of `ctx`.
fn ambient_out_of_gas(ctx: &ExecutionContext<'_>) -> HandlerError {
    HandlerError::OutOfGas {
        descriptor: SUBMESSAGE_GAS_DESCRIPTOR.to_string(),
        limit: ctx.gas_limit(),
        used: ctx.gas_consumed(),
    }
}

impl<H: MessageHandler, R: Replyer> SubmessageDispatch for MessageDispatcher<H, R> {
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        submessages: &[SubMessage],
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatch_submessages(ctx, contract, protocol_id, submessages)
    }
}

// =============================================================================
// TESTS
// =============================================================================
