//! Reference/sample card selection.
//!
//! Given a binary edge mask, the selector:
//! 1. labels 8-connected foreground components,
//! 2. keeps the two largest (ties broken by lower label),
//! 3. fits a minimum-area quad around each,
//! 4. names the one with the smaller mean y the *reference* card.
//!
//! Failing to find two usable regions is not an error: [`RegionSelector::select`]
//! returns `Ok(None)` so callers can fall back to manual boxes.

mod mask;
mod selector;

pub use mask::threshold_mask;
pub use selector::{RegionError, RegionPair, RegionSelector};
