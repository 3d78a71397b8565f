//! Real estate syndication: a multi-year pro forma for an acquisition,
//! the sale at the end of the hold, and the LP/GP distribution waterfall.

pub mod amortization;
pub mod deal;
pub mod exit;
pub mod inputs;
pub mod proforma;
pub mod sensitivity;
pub mod validation;
pub mod waterfall;

pub use deal::{analyze_deal, run_syndication, DealResults};
pub use inputs::{DealInputs, WaterfallPreset};
