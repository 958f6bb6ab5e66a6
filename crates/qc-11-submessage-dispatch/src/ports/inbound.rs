//! # Driving Ports (API - Inbound)
//!
//! These are the interfaces exposed by the submessage dispatch subsystem.
//!
//! - [`SubmessageDispatch`]: synchronous engine entry point, used inside a
//!   running contract invocation (including nested dispatch from replies)
//! - [`SubmessageApi`]: async facade that owns the enclosing transaction

use crate::context::ExecutionContext;
use crate::domain::entities::{DispatchReport, Event, SubMessage};
use crate::domain::value_objects::{Address, Gas};
use crate::errors::DispatchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// =============================================================================
// SUBMESSAGE DISPATCH (Engine)
// =============================================================================

/// Executes a contract's submessages in order.
pub trait SubmessageDispatch {
    /// Runs `submessages` issued by `contract` on `ctx`.
    ///
    /// Returns the last non-`None` reply data and a per-submessage report.
    ///
    /// # Errors
    ///
    /// The first unabsorbed handler failure or any replyer failure. Effects
    /// committed into `ctx` before the abort stay there; rolling them back is
    /// up to the caller.
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        submessages: &[SubMessage],
    ) -> Result<DispatchReport, DispatchError>;
}

// =============================================================================
// SUBMESSAGE API (Transaction Facade)
// =============================================================================

/// One dispatch run as its own transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Issuing contract.
    pub contract: Address,
    /// Protocol identifier; defaults to the contract's port id.
    pub protocol_id: Option<String>,
    /// Submessages in execution order.
    pub submessages: Vec<SubMessage>,
    /// Gas available to the whole dispatch; defaults to the service config.
    pub gas_limit: Option<Gas>,
}

/// Outcome of a committed dispatch transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Engine report.
    pub report: DispatchReport,
    /// Events committed to the root, in emission order.
    pub events: Vec<Event>,
    /// Gas consumed by the whole dispatch.
    pub gas_used: Gas,
}

/// Primary async API.
///
/// ## Usage
///
/// ```ignore
/// let result = api.dispatch_submessages(request).await?;
/// ```
#[async_trait]
pub trait SubmessageApi: Send + Sync {
    /// Runs one dispatch and commits its root effects only on success.
    ///
    /// # Errors
    ///
    /// The dispatch error; nothing was committed.
    async fn dispatch_submessages(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchResult, DispatchError>;
}
