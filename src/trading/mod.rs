//! Copy-trading logic: quantity sizing, brokerage registry, approval workflow.

mod brokerages;
mod copy_engine;
mod quantity;

pub use brokerages::{BrokerageRegistry, UNKNOWN_BROKERAGE};
pub use copy_engine::{ApprovalError, CopyEngine, CopyOrder, PendingCopyTrade};
pub use quantity::{
    derive_quantity, QuantityMode, QuantityPreference, QuantitySettings, DEFAULT_CUSTOM_QUANTITY,
    DEFAULT_PERCENTAGE,
};
