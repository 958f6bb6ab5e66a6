//! # Execution Contexts
//!
//! Isolated (cache) layers and gas-limited metering for submessages.

pub mod cache;
pub mod execution;
pub mod gas;

pub use cache::{ContextArena, LayerId, RootChanges, StoreMap, WriteSet};
pub use execution::ExecutionContext;
pub use gas::{scoped_charge, scoped_meter, BasicGasMeter, GasMeter, SUBMESSAGE_GAS_DESCRIPTOR};
