//! Copy-trade approval workflow.
//!
//! At most one copy trade is staged at a time. Staging sizes the copy from
//! the quantity preferences; the user may resize it and pick a brokerage,
//! then either approves (yielding a [`CopyOrder`] to execute) or rejects.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::models::Trade;
use crate::store::PreferenceStore;

use super::{BrokerageRegistry, QuantityMode, QuantityPreference, QuantitySettings};

/// A copy trade awaiting approval.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCopyTrade {
    /// Snapshot of the source trade taken when the copy was staged
    pub trade: Trade,

    /// Candidate copy quantity
    pub quantity: u32,

    /// Brokerage to route to; empty until one is chosen
    pub selected_brokerage: String,
}

/// An approved copy, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOrder {
    pub trade: Trade,
    pub quantity: u32,
    pub brokerage_id: String,
}

/// Why an approval was refused. The pending trade is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("No copy trade is awaiting approval")]
    NothingPending,

    #[error("Please select a brokerage")]
    NoBrokerageSelected,

    #[error("Brokerage '{0}' is not connected")]
    BrokerageNotConnected(String),
}

/// Copy-trade workflow state.
#[derive(Debug)]
pub struct CopyEngine {
    quantity: QuantitySettings,
    pending: Option<PendingCopyTrade>,
    require_connected: bool,
}

impl CopyEngine {
    pub fn new(store: Arc<dyn PreferenceStore>, require_connected: bool) -> Self {
        Self {
            quantity: QuantitySettings::load(store),
            pending: None,
            require_connected,
        }
    }

    pub fn pending(&self) -> Option<&PendingCopyTrade> {
        self.pending.as_ref()
    }

    /// Whether the approval prompt should be shown.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn quantity_preference(&self) -> QuantityPreference {
        self.quantity.preference()
    }

    /// Stage a copy of `trade`, replacing anything already staged.
    pub fn initiate(&mut self, trade: &Trade, default_brokerage: &str) -> &PendingCopyTrade {
        let quantity = self.quantity.calculate(trade.quantity);

        if let Some(previous) = &self.pending {
            debug!(trade_id = previous.trade.id, "Replacing staged copy trade");
        }
        info!(
            trade_id = trade.id,
            ticker = %trade.ticker,
            quantity = quantity,
            brokerage = %default_brokerage,
            "Copy trade staged for approval"
        );

        self.pending.insert(PendingCopyTrade {
            trade: trade.clone(),
            quantity,
            selected_brokerage: default_brokerage.to_string(),
        })
    }

    /// Change the sizing policy and resize any staged copy.
    pub fn set_quantity_mode(&mut self, mode: QuantityMode) {
        self.quantity.set_mode(mode);
        self.recompute();
    }

    /// Change the fixed copy quantity and resize any staged copy.
    pub fn set_custom_quantity(&mut self, quantity: u32) {
        self.quantity.set_custom_quantity(quantity);
        self.recompute();
    }

    /// Change the percentage multiplier and resize any staged copy.
    pub fn set_percentage(&mut self, percentage: u32) {
        self.quantity.set_percentage(percentage);
        self.recompute();
    }

    /// Override the staged quantity directly (at least 1). Returns false if nothing is staged.
    pub fn set_pending_quantity(&mut self, quantity: u32) -> bool {
        match self.pending.as_mut() {
            Some(p) => {
                p.quantity = quantity.max(1);
                true
            }
            None => false,
        }
    }

    /// Choose the brokerage for the staged copy. Returns false if nothing is staged.
    pub fn select_brokerage(&mut self, brokerage_id: &str) -> bool {
        match self.pending.as_mut() {
            Some(p) => {
                p.selected_brokerage = brokerage_id.to_string();
                true
            }
            None => false,
        }
    }

    /// Approve the staged copy and clear the slot.
    pub fn approve(&mut self, registry: &BrokerageRegistry) -> Result<CopyOrder, ApprovalError> {
        let pending = self.pending.as_ref().ok_or(ApprovalError::NothingPending)?;

        if pending.selected_brokerage.is_empty() {
            return Err(ApprovalError::NoBrokerageSelected);
        }
        if self.require_connected && !registry.is_connected(&pending.selected_brokerage) {
            return Err(ApprovalError::BrokerageNotConnected(
                pending.selected_brokerage.clone(),
            ));
        }

        let pending = self.pending.take().ok_or(ApprovalError::NothingPending)?;
        info!(
            trade_id = pending.trade.id,
            quantity = pending.quantity,
            brokerage = %pending.selected_brokerage,
            "Copy trade approved"
        );

        Ok(CopyOrder {
            trade: pending.trade,
            quantity: pending.quantity,
            brokerage_id: pending.selected_brokerage,
        })
    }

    /// Discard the staged copy, if any.
    pub fn reject(&mut self) -> Option<PendingCopyTrade> {
        let rejected = self.pending.take();
        if let Some(p) = &rejected {
            info!(trade_id = p.trade.id, "Copy trade rejected");
        }
        rejected
    }

    /// Resize the staged copy from the snapshot taken at staging time.
    fn recompute(&mut self) {
        let preference = self.quantity.preference();
        if let Some(p) = self.pending.as_mut() {
            p.quantity = preference.quantity_for(p.trade.quantity);
            debug!(trade_id = p.trade.id, quantity = p.quantity, "Staged copy resized");
        }
    }
}
