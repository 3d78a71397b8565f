use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::amortization::LoanTerms;
use super::waterfall::{WaterfallStructure, WaterfallTier};
use crate::types::*;
use crate::DealEngineResult;

// ---------------------------------------------------------------------------
// Deal inputs
// ---------------------------------------------------------------------------

/// Inputs for a syndication deal analysis.
///
/// Rate-like fields are percentages (6.5 = 6.5%), matching the deal records
/// the engine is fed from. Missing fields in a deal file fall back to
/// [`DealInputs::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealInputs {
    // --- Project capitalization ---
    pub purchase_price: Money,
    pub closing_costs: Money,
    pub capex_reserves: Money,

    // --- Equity structure ---
    pub lp_equity_percent: Percent,
    pub gp_equity_percent: Percent,

    // --- Debt ---
    /// Loan as a percent of purchase price
    pub loan_to_value: Percent,
    /// Annual note rate
    pub interest_rate: Percent,
    /// Note term (balloon); informational
    pub loan_term_years: u32,
    pub amortization_years: u32,
    pub interest_only: bool,
    pub interest_only_years: u32,

    // --- Fees ---
    /// Paid to the GP at closing, percent of purchase price
    pub acquisition_fee_percent: Percent,
    /// Paid to the GP annually, percent of total equity
    pub asset_management_fee_percent: Percent,

    // --- Waterfall ---
    pub preferred_return: Percent,
    pub tier1_lp_split: Percent,
    pub tier1_gp_split: Percent,
    pub tier2_irr_hurdle: Percent,
    pub tier2_lp_split: Percent,
    pub tier2_gp_split: Percent,
    pub tier3_irr_hurdle: Percent,
    pub tier3_lp_split: Percent,
    pub tier3_gp_split: Percent,

    // --- Property operations (year 1) ---
    pub gross_potential_rent: Money,
    pub vacancy_rate: Percent,
    pub other_income: Money,
    /// Operating expenses as a percent of year-1 effective gross income
    pub operating_expense_ratio: Percent,

    // --- Growth ---
    pub rent_growth_rate: Percent,
    pub expense_growth_rate: Percent,
    pub hold_period_years: u32,

    // --- Exit ---
    pub exit_cap_rate: Percent,
    pub disposition_fee_percent: Percent,
}

impl Default for DealInputs {
    /// A typical multifamily syndication.
    fn default() -> Self {
        Self {
            purchase_price: dec!(5000000),
            closing_costs: dec!(100000),
            capex_reserves: dec!(150000),
            lp_equity_percent: dec!(90),
            gp_equity_percent: dec!(10),
            loan_to_value: dec!(65),
            interest_rate: dec!(6.5),
            loan_term_years: 10,
            amortization_years: 30,
            interest_only: true,
            interest_only_years: 3,
            acquisition_fee_percent: dec!(2),
            asset_management_fee_percent: dec!(2),
            preferred_return: dec!(8),
            tier1_lp_split: dec!(70),
            tier1_gp_split: dec!(30),
            tier2_irr_hurdle: dec!(12),
            tier2_lp_split: dec!(60),
            tier2_gp_split: dec!(40),
            tier3_irr_hurdle: dec!(18),
            tier3_lp_split: dec!(50),
            tier3_gp_split: dec!(50),
            gross_potential_rent: dec!(600000),
            vacancy_rate: dec!(5),
            other_income: dec!(24000),
            operating_expense_ratio: dec!(45),
            rent_growth_rate: dec!(3),
            expense_growth_rate: dec!(2),
            hold_period_years: 5,
            exit_cap_rate: dec!(6.0),
            disposition_fee_percent: dec!(2),
        }
    }
}

impl DealInputs {
    /// Parse a JSON deal record; missing fields take the default values.
    pub fn from_json(json: &str) -> DealEngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sources of capital: total capitalization, loan and equity by class.
    pub fn capitalization(&self) -> CapitalizationSummary {
        let total_capitalization = self.purchase_price + self.closing_costs + self.capex_reserves;
        let loan_amount = self.purchase_price * percent_to_rate(self.loan_to_value);
        let total_equity = total_capitalization - loan_amount;

        CapitalizationSummary {
            total_capitalization,
            loan_amount,
            total_equity,
            lp_equity: total_equity * percent_to_rate(self.lp_equity_percent),
            gp_equity: total_equity * percent_to_rate(self.gp_equity_percent),
        }
    }

    /// Sponsor fees. Asset management is charged on total equity each year.
    pub fn fees(&self, total_equity: Money) -> FeeSummary {
        let annual_asset_management_fee =
            total_equity * percent_to_rate(self.asset_management_fee_percent);

        FeeSummary {
            acquisition_fee: self.purchase_price * percent_to_rate(self.acquisition_fee_percent),
            annual_asset_management_fee,
            total_asset_management_fees: annual_asset_management_fee
                * Decimal::from(self.hold_period_years),
        }
    }

    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.capitalization().loan_amount,
            annual_rate_percent: self.interest_rate,
            amortization_years: self.amortization_years,
            interest_only: self.interest_only,
            interest_only_years: self.interest_only_years,
        }
    }

    pub fn waterfall_structure(&self) -> WaterfallStructure {
        WaterfallStructure {
            lp_equity_percent: self.lp_equity_percent,
            gp_equity_percent: self.gp_equity_percent,
            preferred_return: self.preferred_return,
            tier1: WaterfallTier {
                irr_hurdle: Decimal::ZERO,
                lp_split: self.tier1_lp_split,
                gp_split: self.tier1_gp_split,
            },
            tier2: WaterfallTier {
                irr_hurdle: self.tier2_irr_hurdle,
                lp_split: self.tier2_lp_split,
                gp_split: self.tier2_gp_split,
            },
            tier3: WaterfallTier {
                irr_hurdle: self.tier3_irr_hurdle,
                lp_split: self.tier3_lp_split,
                gp_split: self.tier3_gp_split,
            },
        }
    }
}

/// Capital stack at closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalizationSummary {
    /// Purchase price + closing costs + capex reserves
    pub total_capitalization: Money,
    /// Purchase price * LTV
    pub loan_amount: Money,
    /// Total capitalization - loan amount
    pub total_equity: Money,
    pub lp_equity: Money,
    pub gp_equity: Money,
}

/// Sponsor fees over the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSummary {
    pub acquisition_fee: Money,
    pub annual_asset_management_fee: Money,
    pub total_asset_management_fees: Money,
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Common waterfall structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallPreset {
    /// LP favourable: 80/20, 70/30 over 15%, 60/40 over 20%
    Conservative,
    /// 70/30, 60/40 over 12%, 50/50 over 18%
    Standard,
    /// GP favourable: 60/40, 50/50 over 10%, 40/60 over 15%
    Aggressive,
}

impl WaterfallPreset {
    /// Overwrite the tier fields of `inputs` with this preset.
    pub fn apply(self, inputs: &mut DealInputs) {
        let (t1, t2_hurdle, t2, t3_hurdle, t3) = match self {
            WaterfallPreset::Conservative => (dec!(80), dec!(15), dec!(70), dec!(20), dec!(60)),
            WaterfallPreset::Standard => (dec!(70), dec!(12), dec!(60), dec!(18), dec!(50)),
            WaterfallPreset::Aggressive => (dec!(60), dec!(10), dec!(50), dec!(15), dec!(40)),
        };
        let hundred = dec!(100);

        inputs.tier1_lp_split = t1;
        inputs.tier1_gp_split = hundred - t1;
        inputs.tier2_irr_hurdle = t2_hurdle;
        inputs.tier2_lp_split = t2;
        inputs.tier2_gp_split = hundred - t2;
        inputs.tier3_irr_hurdle = t3_hurdle;
        inputs.tier3_lp_split = t3;
        inputs.tier3_gp_split = hundred - t3;
    }
}
