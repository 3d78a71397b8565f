use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::time_value::irr_with_final_adjustment;
use crate::types::*;

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// One promote tier. Splits are percentages of the distributable remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallTier {
    /// LP IRR (percent) that must be reached for this tier to apply
    pub irr_hurdle: Percent,
    pub lp_split: Percent,
    pub gp_split: Percent,
}

/// Equity split, preferred return and tiers shared by both waterfalls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStructure {
    pub lp_equity_percent: Percent,
    pub gp_equity_percent: Percent,
    /// Annual LP preferred return (percent of LP equity)
    pub preferred_return: Percent,
    /// Base split, no hurdle
    pub tier1: WaterfallTier,
    pub tier2: WaterfallTier,
    pub tier3: WaterfallTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Tier1,
    Tier2,
    Tier3,
}

impl WaterfallStructure {
    pub fn tier(&self, level: TierLevel) -> &WaterfallTier {
        match level {
            TierLevel::Tier1 => &self.tier1,
            TierLevel::Tier2 => &self.tier2,
            TierLevel::Tier3 => &self.tier3,
        }
    }

    /// Preferred return owed on `lp_equity` for one year.
    pub fn annual_preferred(&self, lp_equity: Money) -> Money {
        lp_equity * percent_to_rate(self.preferred_return)
    }
}

/// Split `amount` by a tier's LP/GP percentages.
fn split(amount: Money, tier: &WaterfallTier) -> (Money, Money) {
    (
        amount * percent_to_rate(tier.lp_split),
        amount * percent_to_rate(tier.gp_split),
    )
}

// ---------------------------------------------------------------------------
// Operating-period waterfall
// ---------------------------------------------------------------------------

/// One year's operating distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingDistribution {
    /// LP capital returned (exit year only)
    pub capital_returned: Money,
    pub preferred_paid: Money,
    /// Capital + preferred + LP tier-1 share
    pub lp_distribution: Money,
    /// GP tier-1 share (fees are added by the caller)
    pub gp_distribution: Money,
}

/// Distribute one year of cash flow after debt service.
///
/// In an exit year outstanding LP capital comes back first. The year's
/// preferred return is then paid, and anything left is split at tier 1.
/// Non-positive `available` distributes nothing.
pub fn distribute_operating(
    available: Money,
    lp_equity: Money,
    cumulative_lp: Money,
    is_exit_year: bool,
    structure: &WaterfallStructure,
) -> OperatingDistribution {
    if available <= Decimal::ZERO {
        return OperatingDistribution::default();
    }

    let mut remaining = available;

    let capital_returned = if is_exit_year {
        let outstanding = (lp_equity - cumulative_lp).max(Decimal::ZERO);
        outstanding.min(remaining)
    } else {
        Decimal::ZERO
    };
    remaining -= capital_returned;

    let preferred_paid = structure
        .annual_preferred(lp_equity)
        .max(Decimal::ZERO)
        .min(remaining);
    remaining -= preferred_paid;

    let (lp_split, gp_split) = split(remaining, &structure.tier1);

    OperatingDistribution {
        capital_returned,
        preferred_paid,
        lp_distribution: capital_returned + preferred_paid + lp_split,
        gp_distribution: gp_split,
    }
}

// ---------------------------------------------------------------------------
// Exit waterfall
// ---------------------------------------------------------------------------

/// State at sale needed to settle the exit waterfall.
#[derive(Debug, Clone)]
pub struct ExitWaterfallInput<'a> {
    /// Net sale proceeds available to equity
    pub distributable: Money,
    pub lp_equity: Money,
    pub gp_equity: Money,
    /// LP operating distributions to date
    pub cumulative_lp: Money,
    /// GP waterfall distributions to date, fees excluded
    pub cumulative_gp: Money,
    /// Preferred return paid to date
    pub preferred_paid: Money,
    pub hold_period_years: u32,
    /// Pre-exit LP cash flows (index 0 = contribution)
    pub lp_cash_flows: &'a [Money],
    /// Pre-exit GP cash flows (index 0 = contribution)
    pub gp_cash_flows: &'a [Money],
    pub structure: &'a WaterfallStructure,
}

/// How the sale proceeds were split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitDistribution {
    pub lp_capital_returned: Money,
    pub gp_capital_returned: Money,
    /// Unpaid preferred return settled at sale
    pub preferred_catch_up: Money,
    /// Proceeds left for the tier split
    pub remainder: Money,
    pub tier_applied: TierLevel,
    pub lp_remainder_share: Money,
    pub gp_remainder_share: Money,
    /// Total exit proceeds to the LP
    pub lp_distribution: Money,
    /// Total exit proceeds to the GP
    pub gp_distribution: Money,
    /// GP proceeds above its pro-rata share of the pool
    pub gp_promote: Money,
    /// LP IRR with the exit proceeds booked in the final year
    pub lp_irr: Percent,
    /// GP IRR with the exit proceeds booked in the final year
    pub gp_irr: Percent,
}

/// Settle the sale proceeds.
///
/// Order of payment: LP outstanding capital, GP outstanding capital, the
/// unpaid preferred return over the whole hold, then the remainder at the
/// highest tier whose LP IRR hurdle the deal clears. The hurdle test books
/// each candidate LP exit share against the pre-exit LP cash flows without
/// touching them.
pub fn calculate_exit_waterfall(input: &ExitWaterfallInput) -> ExitDistribution {
    let structure = input.structure;

    if input.distributable <= Decimal::ZERO {
        return ExitDistribution {
            lp_capital_returned: Decimal::ZERO,
            gp_capital_returned: Decimal::ZERO,
            preferred_catch_up: Decimal::ZERO,
            remainder: Decimal::ZERO,
            tier_applied: TierLevel::Tier1,
            lp_remainder_share: Decimal::ZERO,
            gp_remainder_share: Decimal::ZERO,
            lp_distribution: Decimal::ZERO,
            gp_distribution: Decimal::ZERO,
            gp_promote: Decimal::ZERO,
            lp_irr: irr_with_final_adjustment(input.lp_cash_flows, Decimal::ZERO),
            gp_irr: irr_with_final_adjustment(input.gp_cash_flows, Decimal::ZERO),
        };
    }

    let mut remaining = input.distributable;

    // --- Return of capital: LP first, then GP ---
    let lp_capital_returned = (input.lp_equity - input.cumulative_lp)
        .max(Decimal::ZERO)
        .min(remaining);
    remaining -= lp_capital_returned;

    let gp_capital_returned = (input.gp_equity - input.cumulative_gp)
        .max(Decimal::ZERO)
        .min(remaining);
    remaining -= gp_capital_returned;

    // --- Preferred return catch-up ---
    let preferred_due =
        structure.annual_preferred(input.lp_equity) * Decimal::from(input.hold_period_years);
    let preferred_catch_up = (preferred_due - input.preferred_paid)
        .max(Decimal::ZERO)
        .min(remaining);
    remaining -= preferred_catch_up;

    // --- Tier split ---
    let lp_before_split = lp_capital_returned + preferred_catch_up;
    let tier_applied = select_tier(structure, input.lp_cash_flows, lp_before_split, remaining);
    let (lp_remainder_share, gp_remainder_share) = if remaining > Decimal::ZERO {
        split(remaining, structure.tier(tier_applied))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let lp_distribution = lp_before_split + lp_remainder_share;
    let gp_distribution = gp_capital_returned + gp_remainder_share;

    // Pro-rata is measured against the whole pool
    let gp_weight = safe_div(
        structure.gp_equity_percent,
        structure.lp_equity_percent + structure.gp_equity_percent,
    );
    let gp_promote = (gp_distribution - input.distributable * gp_weight).max(Decimal::ZERO);

    trace!(
        distributable = %input.distributable,
        tier = ?tier_applied,
        lp = %lp_distribution,
        gp = %gp_distribution,
        "exit waterfall settled"
    );

    ExitDistribution {
        lp_capital_returned,
        gp_capital_returned,
        preferred_catch_up,
        remainder: remaining,
        tier_applied,
        lp_remainder_share,
        gp_remainder_share,
        lp_distribution,
        gp_distribution,
        gp_promote,
        lp_irr: irr_with_final_adjustment(input.lp_cash_flows, lp_distribution),
        gp_irr: irr_with_final_adjustment(input.gp_cash_flows, gp_distribution),
    }
}

/// Highest tier whose hurdle the LP strictly exceeds if `remainder` is split at that
/// tier's LP percentage on top of `lp_exit_so_far`. Tier 3 is tested before
/// tier 2; tier 1 applies when neither clears or nothing remains.
pub fn select_tier(
    structure: &WaterfallStructure,
    lp_cash_flows: &[Money],
    lp_exit_so_far: Money,
    remainder: Money,
) -> TierLevel {
    if remainder <= Decimal::ZERO {
        return TierLevel::Tier1;
    }

    for level in [TierLevel::Tier3, TierLevel::Tier2] {
        let tier = structure.tier(level);
        let candidate = lp_exit_so_far + remainder * percent_to_rate(tier.lp_split);
        let lp_irr = irr_with_final_adjustment(lp_cash_flows, candidate);
        if lp_irr > tier.irr_hurdle {
            return level;
        }
    }

    TierLevel::Tier1
}
