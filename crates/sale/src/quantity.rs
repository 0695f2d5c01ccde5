//! Quantity control.
//!
//! The quantity always stays within `[1, max(1, max_mint)]`. A `max_mint`
//! of zero pins the control at 1 with increment disabled; minting is then
//! refused by the purchase gate rather than by the control.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityControl {
    quantity: u32,
    max_mint: u32,
}

impl Default for QuantityControl {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Clamps `quantity` into `[1, max(1, max_mint)]`.
#[must_use]
pub fn clamp_quantity(quantity: u32, max_mint: u32) -> u32 {
    quantity.clamp(1, max_mint.max(1))
}

impl QuantityControl {
    #[must_use]
    pub fn new(max_mint: u32) -> Self {
        Self { quantity: 1, max_mint }
    }

    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn max_mint(&self) -> u32 {
        self.max_mint
    }

    pub fn set(&mut self, quantity: u32) -> u32 {
        self.quantity = clamp_quantity(quantity, self.max_mint);
        self.quantity
    }

    /// Changes the bound and re-clamps the current quantity.
    pub fn set_max_mint(&mut self, max_mint: u32) {
        self.max_mint = max_mint;
        self.quantity = clamp_quantity(self.quantity, max_mint);
    }

    pub fn increment(&mut self) -> u32 {
        self.set(self.quantity.saturating_add(1))
    }

    pub fn decrement(&mut self) -> u32 {
        self.set(self.quantity.saturating_sub(1))
    }

    #[must_use]
    pub fn can_increment(&self) -> bool {
        self.quantity < self.max_mint
    }

    #[must_use]
    pub fn can_decrement(&self) -> bool {
        self.quantity > 1
    }
}
