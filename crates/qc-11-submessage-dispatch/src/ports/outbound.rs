//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the dispatcher and the service depend on. Adapters implement
//! these traits to execute messages, call contracts back and persist state.
//!
//! - Dependencies point INWARD (adapters implement these traits)
//! - Handlers and replyers are synchronous; the dispatch loop never suspends

use crate::context::{ExecutionContext, StoreMap, WriteSet};
use crate::domain::entities::{ContractMessage, ContractResponse, DispatchOutcome, Reply};
use crate::domain::value_objects::{Address, Bytes};
use crate::errors::{HandlerError, ReplyError};
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// MESSAGE HANDLER
// =============================================================================

/// Executes one concrete message on behalf of a contract.
///
/// Implementations read and write only through `ctx`; the caller decides
/// whether those effects are committed.
pub trait MessageHandler: Send + Sync {
    /// Executes `msg` issued by `contract`.
    ///
    /// # Errors
    ///
    /// Any [`HandlerError`], including out-of-gas from `ctx`.
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        msg: &ContractMessage,
    ) -> Result<DispatchOutcome, HandlerError>;
}

impl<T: MessageHandler + ?Sized> MessageHandler for &T {
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        msg: &ContractMessage,
    ) -> Result<DispatchOutcome, HandlerError> {
        (**self).dispatch(ctx, contract, protocol_id, msg)
    }
}

impl<T: MessageHandler + ?Sized> MessageHandler for Arc<T> {
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        msg: &ContractMessage,
    ) -> Result<DispatchOutcome, HandlerError> {
        (**self).dispatch(ctx, contract, protocol_id, msg)
    }
}

// =============================================================================
// REPLYER
// =============================================================================

/// Delivers a [`Reply`] into the issuing contract.
pub trait Replyer: Send + Sync {
    /// Calls the contract back.
    ///
    /// `Some(data)` (possibly empty) replaces the dispatch's response data,
    /// `None` leaves it untouched.
    ///
    /// # Errors
    ///
    /// Any [`ReplyError`]. Always fatal to the dispatch.
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
    ) -> Result<Option<Bytes>, ReplyError>;
}

impl<T: Replyer + ?Sized> Replyer for &T {
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
    ) -> Result<Option<Bytes>, ReplyError> {
        (**self).reply(ctx, contract, reply)
    }
}

impl<T: Replyer + ?Sized> Replyer for Arc<T> {
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: Reply,
    ) -> Result<Option<Bytes>, ReplyError> {
        (**self).reply(ctx, contract, reply)
    }
}

// =============================================================================
// CONTRACT RUNTIME
// =============================================================================

/// The contract sandbox, reduced to the reply entry point.
pub trait ContractRuntime: Send + Sync {
    /// Runs the contract's `reply` entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::ContractFailed`] if the contract errors.
    fn reply(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        reply: &Reply,
    ) -> Result<ContractResponse, ReplyError>;
}

// =============================================================================
// COMMITTED STORE
// =============================================================================

/// Committed state of the enclosing transaction.
#[async_trait]
pub trait CommittedStore: Send + Sync {
    /// Point-in-time view the arena reads through to.
    async fn snapshot(&self) -> Arc<StoreMap>;

    /// Applies root-layer writes. `None` deletes the key.
    async fn apply(&self, writes: WriteSet);
}
