//! # Execution Context
//!
//! What message handlers and replyers operate on: one layer of the arena plus
//! the gas meter in charge. Handlers read, write and emit events; only the
//! dispatcher opens, commits and discards layers.

use crate::context::cache::{ContextArena, LayerId};
use crate::context::gas::GasMeter;
use crate::domain::entities::Event;
use crate::domain::value_objects::Gas;
use crate::errors::{ContextError, HandlerError};

/// A view on one arena layer with a gas meter.
pub struct ExecutionContext<'a> {
    arena: &'a mut ContextArena,
    layer: LayerId,
    gas: &'a mut dyn GasMeter,
}

impl<'a> ExecutionContext<'a> {
    /// Root context of a transaction.
    pub fn root(arena: &'a mut ContextArena, gas: &'a mut dyn GasMeter) -> Self {
        Self {
            arena,
            layer: LayerId::ROOT,
            gas,
        }
    }

    /// Layer this context reads and writes.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Reads a key through all layers below.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.arena.get(self.layer, key)
    }

    /// Buffers a write.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.arena.set(self.layer, key.into(), value.into());
    }

    /// Buffers a deletion.
    pub fn remove(&mut self, key: impl Into<Vec<u8>>) {
        self.arena.remove(self.layer, key.into());
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Emits an event into this context's buffer.
    pub fn emit_event(&mut self, event: Event) {
        self.arena.emit_event(self.layer, event);
    }

    /// Emits events in order.
    pub fn emit_events(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit_event(event);
        }
    }

    /// Events buffered in this context's layer.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        self.arena.events(self.layer)
    }

    // =========================================================================
    // GAS
    // =========================================================================

    /// Charges gas to the meter in charge.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::OutOfGas`] past the meter's ceiling.
    pub fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> Result<(), HandlerError> {
        self.gas.consume(amount, descriptor)
    }

    /// Gas consumed on the meter in charge.
    #[must_use]
    pub fn gas_consumed(&self) -> Gas {
        self.gas.consumed()
    }

    /// Gas left on the meter in charge.
    #[must_use]
    pub fn gas_remaining(&self) -> Gas {
        self.gas.remaining()
    }

    /// Ceiling of the meter in charge.
    #[must_use]
    pub fn gas_limit(&self) -> Gas {
        self.gas.limit()
    }

    /// Returns true if the meter in charge went past its ceiling.
    #[must_use]
    pub fn is_out_of_gas(&self) -> bool {
        self.gas.is_out_of_gas()
    }

    // =========================================================================
    // LAYERS (dispatcher only)
    // =========================================================================

    /// Opens an isolated layer above this context.
    pub(crate) fn open_layer(&mut self) -> Result<LayerId, ContextError> {
        self.arena.open_layer(self.layer)
    }

    /// Context on `layer`, sharing this context's meter.
    pub(crate) fn derive(&mut self, layer: LayerId) -> ExecutionContext<'_> {
        ExecutionContext {
            arena: &mut *self.arena,
            layer,
            gas: &mut *self.gas,
        }
    }

    /// Context on `layer`, metered by `gas`.
    pub(crate) fn derive_with_meter<'b>(
        &'b mut self,
        layer: LayerId,
        gas: &'b mut dyn GasMeter,
    ) -> ExecutionContext<'b> {
        ExecutionContext {
            arena: &mut *self.arena,
            layer,
            gas,
        }
    }

    /// Merges `layer` into this context's layer.
    pub(crate) fn commit_layer(&mut self, layer: LayerId) -> Result<(), ContextError> {
        self.arena.commit(layer)
    }

    /// Drops `layer`.
    pub(crate) fn discard_layer(&mut self, layer: LayerId) -> Result<(), ContextError> {
        self.arena.discard(layer)
    }

    /// Drains the events buffered in `layer`.
    pub(crate) fn take_layer_events(&mut self, layer: LayerId) -> Vec<Event> {
        self.arena.take_events(layer)
    }
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("layer", &self.layer)
            .field("gas_consumed", &self.gas.consumed())
            .field("gas_limit", &self.gas.limit())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::gas::BasicGasMeter;

    #[test]
    fn test_state_and_events_on_root() {
        let mut arena = ContextArena::default();
        let mut meter = BasicGasMeter::new(1_000);
        let mut ctx = ExecutionContext::root(&mut arena, &mut meter);

        ctx.set(b"k".to_vec(), b"v".to_vec());
        ctx.emit_event(Event::new("foo"));
        assert_eq!(ctx.get(b"k"), Some(b"v".to_vec()));
        assert_eq!(ctx.events().len(), 1);

        ctx.remove(b"k".to_vec());
        assert_eq!(ctx.get(b"k"), None);
    }

    #[test]
    fn test_derived_context_isolated_until_commit() {
        let mut arena = ContextArena::default();
        let mut meter = BasicGasMeter::new(1_000);
        let mut ctx = ExecutionContext::root(&mut arena, &mut meter);

        let layer = ctx.open_layer().unwrap();
        {
            let mut child = ctx.derive(layer);
            child.set(b"k".to_vec(), b"v".to_vec());
            child.consume_gas(10, "write").unwrap();
        }
        assert_eq!(ctx.get(b"k"), None);
        assert_eq!(ctx.gas_consumed(), 10);

        ctx.commit_layer(layer).unwrap();
        assert_eq!(ctx.get(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn test_derived_context_with_own_meter() {
        let mut arena = ContextArena::default();
        let mut ambient = BasicGasMeter::new(1_000);
        ambient.consume(900, "siblings").unwrap();
        let mut ctx = ExecutionContext::root(&mut arena, &mut ambient);

        let layer = ctx.open_layer().unwrap();
        let mut scoped = BasicGasMeter::new(50);
        {
            let mut child = ctx.derive_with_meter(layer, &mut scoped);
            assert_eq!(child.gas_consumed(), 0);
            assert_eq!(child.gas_remaining(), 50);
            assert!(child.consume_gas(60, "loop").is_err());
            assert!(child.is_out_of_gas());
        }
        ctx.discard_layer(layer).unwrap();
        assert_eq!(ctx.gas_consumed(), 900);
    }
}
