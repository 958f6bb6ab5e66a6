//! # Gas Meters
//!
//! The ambient meter is passed by `&mut` through the call chain. A submessage
//! with a gas limit gets a fresh meter with that ceiling; what it consumed is
//! charged to the ambient meter afterwards.

use crate::domain::value_objects::Gas;
use crate::errors::HandlerError;

/// Descriptor used when a submessage's consumption is charged upward.
pub const SUBMESSAGE_GAS_DESCRIPTOR: &str = "submessage";

/// A gas meter: consume, limit, remaining.
pub trait GasMeter: Send {
    /// Charges `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::OutOfGas`] once consumption passes the limit.
    /// The consumption is recorded even then.
    fn consume(&mut self, amount: Gas, descriptor: &str) -> Result<(), HandlerError>;

    /// Gas consumed so far.
    fn consumed(&self) -> Gas;

    /// Ceiling of this meter.
    fn limit(&self) -> Gas;

    /// Gas left before the ceiling.
    fn remaining(&self) -> Gas {
        self.limit().saturating_sub(self.consumed())
    }

    /// Returns true once consumption went past the ceiling.
    fn is_out_of_gas(&self) -> bool {
        self.consumed() > self.limit()
    }
}

// =============================================================================
// BASIC METER
// =============================================================================

/// Meter with a fixed ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasicGasMeter {
    limit: Gas,
    consumed: Gas,
}

impl BasicGasMeter {
    /// Creates a meter with nothing consumed.
    #[must_use]
    pub const fn new(limit: Gas) -> Self {
        Self { limit, consumed: 0 }
    }

    /// A meter that never runs out in practice.
    #[must_use]
    pub const fn infinite() -> Self {
        Self::new(Gas::MAX)
    }
}

impl GasMeter for BasicGasMeter {
    fn consume(&mut self, amount: Gas, descriptor: &str) -> Result<(), HandlerError> {
        self.consumed = self.consumed.saturating_add(amount);
        if self.consumed > self.limit {
            return Err(HandlerError::OutOfGas {
                descriptor: descriptor.to_string(),
                limit: self.limit,
                used: self.consumed,
            });
        }
        Ok(())
    }

    fn consumed(&self) -> Gas {
        self.consumed
    }

    fn limit(&self) -> Gas {
        self.limit
    }
}

// =============================================================================
// SCOPED CEILING
// =============================================================================

/// Fresh meter for a submessage, or `None` to run on the ambient meter.
///
/// A ceiling is only installed when it is tighter than what the ambient meter
/// has left, so the effective limit is `min(gas_limit, remaining)`.
#[must_use]
pub fn scoped_meter(ambient_remaining: Gas, gas_limit: Option<Gas>) -> Option<BasicGasMeter> {
    gas_limit
        .filter(|limit| *limit < ambient_remaining)
        .map(BasicGasMeter::new)
}

/// Gas a finished scoped meter charges to the ambient meter.
///
/// Running out charges the whole ceiling.
#[must_use]
pub fn scoped_charge(meter: &BasicGasMeter, failed_out_of_gas: bool) -> Gas {
    if failed_out_of_gas || meter.is_out_of_gas() {
        meter.limit()
    } else {
        meter.consumed()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_meter_consume() {
        let mut meter = BasicGasMeter::new(100);
        meter.consume(60, "a").unwrap();
        assert_eq!(meter.consumed(), 60);
        assert_eq!(meter.remaining(), 40);
        meter.consume(40, "b").unwrap();
        assert!(!meter.is_out_of_gas());
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn test_basic_meter_out_of_gas() {
        let mut meter = BasicGasMeter::new(100);
        let err = meter.consume(101, "store").unwrap_err();
        assert_eq!(
            err,
            HandlerError::OutOfGas {
                descriptor: "store".to_string(),
                limit: 100,
                used: 101
            }
        );
        assert!(meter.is_out_of_gas());
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn test_infinite_meter_saturates() {
        let mut meter = BasicGasMeter::infinite();
        meter.consume(Gas::MAX, "all").unwrap();
        assert!(meter.consume(1, "more").is_ok());
    }

    #[test]
    fn test_scoped_meter_only_when_tighter() {
        assert_eq!(scoped_meter(1_000, None), None);
        assert_eq!(scoped_meter(1_000, Some(1_000)), None);
        assert_eq!(scoped_meter(1_000, Some(5_000)), None);
        let meter = scoped_meter(1_000, Some(400)).unwrap();
        assert_eq!(meter.limit(), 400);
        assert_eq!(meter.consumed(), 0);
    }

    #[test]
    fn test_scoped_charge() {
        let mut meter = BasicGasMeter::new(400);
        meter.consume(150, "x").unwrap();
        assert_eq!(scoped_charge(&meter, false), 150);
        assert_eq!(scoped_charge(&meter, true), 400);

        let _ = meter.consume(1_000, "y");
        assert_eq!(scoped_charge(&meter, false), 400);
    }
}
