//! # Message Router Adapter
//!
//! Message handler that forwards each message to the handler registered for
//! its variant.

use crate::context::ExecutionContext;
use crate::domain::entities::{ContractMessage, DispatchOutcome, MessageKind};
use crate::domain::value_objects::Address;
use crate::errors::HandlerError;
use crate::ports::outbound::MessageHandler;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Routes messages by [`MessageKind`].
#[derive(Clone, Default)]
pub struct MessageRouter {
    routes: BTreeMap<MessageKind, Arc<dyn MessageHandler>>,
}

impl MessageRouter {
    /// Create a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous one.
    #[must_use]
    pub fn with_handler(mut self, kind: MessageKind, handler: impl MessageHandler + 'static) -> Self {
        self.routes.insert(kind, Arc::new(handler));
        self
    }

    /// Register a shared handler for `kind`.
    #[must_use]
    pub fn with_shared_handler(mut self, kind: MessageKind, handler: Arc<dyn MessageHandler>) -> Self {
        self.routes.insert(kind, handler);
        self
    }

    /// Returns true if a handler is registered for `kind`.
    #[must_use]
    pub fn handles(&self, kind: MessageKind) -> bool {
        self.routes.contains_key(&kind)
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageRouter")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MessageHandler for MessageRouter {
    fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        contract: &Address,
        protocol_id: &str,
        msg: &ContractMessage,
    ) -> Result<DispatchOutcome, HandlerError> {
        let kind = msg.kind();
        let Some(handler) = self.routes.get(&kind) else {
            debug!(kind = %kind, "No route for message");
            return Err(HandlerError::Unsupported(kind));
        };
        handler.dispatch(ctx, contract, protocol_id, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BasicGasMeter, ContextArena};
    use crate::domain::entities::Event;
    use crate::domain::value_objects::Bytes;

    struct Echo(&'static str);

    impl MessageHandler for Echo {
        fn dispatch(
            &self,
            ctx: &mut ExecutionContext<'_>,
            _contract: &Address,
            _protocol_id: &str,
            _msg: &ContractMessage,
        ) -> Result<DispatchOutcome, HandlerError> {
            ctx.emit_event(Event::new(self.0));
            Ok(DispatchOutcome::default())
        }
    }

    #[test]
    fn test_routes_by_kind() {
        let router = MessageRouter::new()
            .with_handler(MessageKind::Custom, Echo("custom"))
            .with_shared_handler(MessageKind::Wasm, Arc::new(Echo("wasm")));
        assert!(router.handles(MessageKind::Custom));
        assert!(!router.handles(MessageKind::Bank));

        let mut arena = ContextArena::default();
        let mut meter = BasicGasMeter::infinite();
        let mut ctx = ExecutionContext::root(&mut arena, &mut meter);
        router
            .dispatch(
                &mut ctx,
                &Address::ZERO,
                "wasm.test",
                &ContractMessage::Custom(Bytes::from("x")),
            )
            .unwrap();
        assert_eq!(ctx.events(), &[Event::new("custom")]);
    }

    #[test]
    fn test_unregistered_kind_is_unsupported() {
        let router = MessageRouter::new();
        let mut arena = ContextArena::default();
        let mut meter = BasicGasMeter::infinite();
        let mut ctx = ExecutionContext::root(&mut arena, &mut meter);

        let err = router
            .dispatch(
                &mut ctx,
                &Address::ZERO,
                "wasm.test",
                &ContractMessage::Custom(Bytes::new()),
            )
            .unwrap_err();
        assert_eq!(err, HandlerError::Unsupported(MessageKind::Custom));
        assert_eq!(err.abci_info(), ("wasm", 20));
    }

    #[test]
    fn test_debug_lists_routes() {
        let router = MessageRouter::new().with_handler(MessageKind::Bank, Echo("bank"));
        assert!(format!("{router:?}").contains("Bank"));
    }
}
