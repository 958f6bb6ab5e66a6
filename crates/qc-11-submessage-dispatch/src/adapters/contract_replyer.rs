//! # Contract Replyer Adapter
//!
//! Replyer that calls the issuing contract's `reply` entry point through a
//! [`ContractRuntime`] and handles what the contract returns:
//!
//! 1. `reply` event carrying `_contract_address`
//! 2. module `wasm` event, only if the response has attributes
//! 3. one `wasm-<type>` event per declared event
//! 4. the response's own submessages, dispatched on the reply context
//!
//! The reply's data is the nested dispatch's data if any, else the
//! response's own data.
//!
//! Every reply first charges `reply_gas_cost` to the caller's meter, and
//! replies nest at most `max_reply_depth` deep.

use crate::context::ExecutionContext;
use crate::dispatcher::MessageDispatcher;
use crate::domain::entities::{DispatcherConfig, Event, Reply};
use crate::domain::event_builder::{
    new_custom_events, new_module_event, ATTRIBUTE_KEY_CONTRACT_ADDR,
};
use crate::domain::invariants::check_contract_event_invariants;
use crate::domain::services::port_id_for_contract;
use crate::domain::value_objects::{Address, Bytes};
use crate::errors::ReplyError;
use crate::ports::outbound::{ContractRuntime, MessageHandler, Replyer};
use tracing::debug;

/// Type of the event emitted for every delivered reply.
pub const REPLY_EVENT_TYPE: &str = "reply";

/// Descriptor of the gas charged before each reply.
pub const REPLY_GAS_DESCRIPTOR: &str = "contract reply";

/// Replyer backed by the contract sandbox.
#[derive(Debug)]
pub struct ContractReplyer<C, H> {
    runtime: C,
    handler: H,
    config: DispatcherConfig,
}

impl<C: ContractRuntime, H: MessageHandler> ContractReplyer<C, H> {
    /// Create a replyer; nested submessages go through `handler`.
    pub fn new(runtime: C, handler: H, config: DispatcherConfig) -> Self {
        Self {
            runtime,
            handler,
            config,
        }
    }

    /// The contract runtime.
    #[must_use]
    pub fn runtime(&self) -> &C {
        &self.runtime
    }
}

impl<C: ContractRuntime, H: MessageHandler> Replyer for ContractReplyer<C, H> {
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
    ) -> Result<Option<Bytes>, ReplyError> {
        self.reply_at(ctx, contract, reply, 1)
    }
}

impl<C: ContractRuntime, H: MessageHandler> ContractReplyer<C, H> {
    /// Delivers `reply` at nesting `depth`, the outermost reply being 1.
    fn reply_at(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
        depth: u32,
    ) -> Result<Option<Bytes>, ReplyError> {
        let max = self.config.max_reply_depth;
        if depth > max {
            return Err(ReplyError::DepthExceeded { depth, max });
        }
        ctx.consume_gas(self.config.reply_gas_cost, REPLY_GAS_DESCRIPTOR)
            .map_err(ReplyError::OutOfGas)?;

        let response = self.runtime.reply(ctx, contract, &reply)?;

        ctx.emit_event(
            Event::new(REPLY_EVENT_TYPE)
                .add_attribute(ATTRIBUTE_KEY_CONTRACT_ADDR, contract.to_canonical_string()),
        );
        let mut events = Vec::with_capacity(response.events.len() + 1);
        if !response.attributes.is_empty() {
            events.push(new_module_event(contract, &response.attributes)?);
        }
        events.extend(new_custom_events(contract, &response.events)?);
        debug_assert!(check_contract_event_invariants(&events, contract).is_valid());
        ctx.emit_events(events);

        debug!(
            submsg_id = reply.id,
            ok = reply.result.is_ok(),
            depth,
            nested = response.messages.len(),
            "Reply delivered"
        );

        let nested = if response.messages.is_empty() {
            None
        } else {
            let replyer = NestedReplyer {
                replyer: self,
                depth: depth + 1,
            };
            let dispatcher =
                MessageDispatcher::with_config(&self.handler, replyer, self.config.clone());
            let port_id = port_id_for_contract(contract);
            dispatcher
                .dispatch_submessages(ctx, contract, &port_id, &response.messages)?
                .data
        };

        Ok(nested.or(response.data))
    }
}

/// Replyer for submessages dispatched from inside a reply.
struct NestedReplyer<'a, C, H> {
    replyer: &'a ContractReplyer<C, H>,
    depth: u32,
}

impl<C: ContractRuntime, H: MessageHandler> Replyer for NestedReplyer<'_, C, H> {
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
    ) -> Result<Option<Bytes>, ReplyError> {
        self.replyer.reply_at(ctx, contract, reply, self.depth)
    }
}
