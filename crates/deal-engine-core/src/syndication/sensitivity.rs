use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::exit::value_exit;
use super::inputs::CapitalizationSummary;
use super::proforma::DistributionLedger;
use super::waterfall::{calculate_exit_waterfall, WaterfallStructure};
use crate::types::*;

/// Exit cap rate offsets (percentage points) around the base case.
const CAP_RATE_OFFSETS: [Decimal; 5] = [dec!(-1.0), dec!(-0.5), dec!(0), dec!(0.5), dec!(1.0)];

/// Returns at one candidate exit cap rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub exit_cap_rate: Percent,
    pub exit_value: Money,
    pub net_sale_proceeds: Money,
    pub lp_irr: Percent,
    pub gp_irr: Percent,
    pub lp_equity_multiple: Multiple,
    pub gp_equity_multiple: Multiple,
}

/// The settled pre-exit state every candidate sale is run against.
#[derive(Debug, Clone)]
pub struct SensitivityBase<'a> {
    pub base_exit_cap_rate: Percent,
    pub exit_noi: Money,
    pub disposition_fee_percent: Percent,
    pub loan_payoff: Money,
    pub hold_period_years: u32,
    pub capitalization: &'a CapitalizationSummary,
    pub structure: &'a WaterfallStructure,
    /// Ledger after the last operating year, before exit proceeds
    pub ledger: &'a DistributionLedger,
}

/// Candidate exit cap rates, ascending, non-positive candidates dropped.
pub fn candidate_cap_rates(base: Percent) -> Vec<Percent> {
    CAP_RATE_OFFSETS
        .iter()
        .map(|offset| base + offset)
        .filter(|rate| *rate > Decimal::ZERO)
        .collect()
}

/// Re-run the sale and exit waterfall at each candidate cap rate.
///
/// Each row settles against the same pre-exit ledger; the ledger's cash-flow
/// vectors are read, never modified.
pub fn build_sensitivity_table(base: &SensitivityBase) -> Vec<SensitivityRow> {
    candidate_cap_rates(base.base_exit_cap_rate)
        .into_iter()
        .map(|cap_rate| {
            let valuation = value_exit(
                base.exit_noi,
                cap_rate,
                base.disposition_fee_percent,
                base.loan_payoff,
            );
            let exit = calculate_exit_waterfall(&base.ledger.exit_input(
                valuation.distributable(),
                base.capitalization,
                base.structure,
                base.hold_period_years,
            ));

            SensitivityRow {
                exit_cap_rate: cap_rate,
                exit_value: valuation.exit_value,
                net_sale_proceeds: valuation.net_sale_proceeds,
                lp_irr: exit.lp_irr,
                gp_irr: exit.gp_irr,
                lp_equity_multiple: safe_div(
                    base.ledger.cumulative_lp + exit.lp_distribution,
                    base.capitalization.lp_equity,
                ),
                gp_equity_multiple: safe_div(
                    base.ledger.cumulative_gp + exit.gp_distribution,
                    base.capitalization.gp_equity,
                ),
            }
        })
        .collect()
}
