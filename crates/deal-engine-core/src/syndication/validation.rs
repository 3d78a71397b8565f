use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::deal::DealResults;
use super::inputs::DealInputs;
use crate::error::DealEngineError;
use crate::types::*;
use crate::DealEngineResult;

const MIN_DSCR: Decimal = dec!(1.20);
const HIGH_LTV: Percent = dec!(80);

fn check_range(field: &str, value: Decimal, min: Decimal, max: Decimal) -> DealEngineResult<()> {
    if value < min || value > max {
        return Err(DealEngineError::InvalidInput {
            field: field.into(),
            reason: format!("Must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

fn check_years(field: &str, value: u32, min: u32, max: u32) -> DealEngineResult<()> {
    if value < min || value > max {
        return Err(DealEngineError::InvalidInput {
            field: field.into(),
            reason: format!("Must be between {min} and {max} years, got {value}"),
        });
    }
    Ok(())
}

fn check_split(field: &str, lp: Percent, gp: Percent) -> DealEngineResult<()> {
    check_range(&format!("{field}_lp_split"), lp, Decimal::ZERO, dec!(100))?;
    check_range(&format!("{field}_gp_split"), gp, Decimal::ZERO, dec!(100))?;
    if lp + gp != dec!(100) {
        return Err(DealEngineError::InvalidInput {
            field: field.into(),
            reason: format!("LP and GP splits must sum to 100, got {}", lp + gp),
        });
    }
    Ok(())
}

/// Reject deals outside the ranges the engine is calibrated for.
pub fn validate_inputs(inputs: &DealInputs) -> DealEngineResult<()> {
    let hundred = dec!(100);
    let zero = Decimal::ZERO;

    // --- Capitalization ---
    check_range("purchase_price", inputs.purchase_price, dec!(100000), dec!(500000000))?;
    check_range("closing_costs", inputs.closing_costs, zero, dec!(10000000))?;
    check_range("capex_reserves", inputs.capex_reserves, zero, dec!(10000000))?;

    // --- Equity ---
    check_range("lp_equity_percent", inputs.lp_equity_percent, zero, hundred)?;
    check_range("gp_equity_percent", inputs.gp_equity_percent, zero, hundred)?;
    if inputs.lp_equity_percent + inputs.gp_equity_percent != hundred {
        return Err(DealEngineError::InvalidInput {
            field: "equity_split".into(),
            reason: format!(
                "LP and GP equity must sum to 100, got {}",
                inputs.lp_equity_percent + inputs.gp_equity_percent
            ),
        });
    }

    // --- Debt ---
    check_range("loan_to_value", inputs.loan_to_value, zero, dec!(90))?;
    check_range("interest_rate", inputs.interest_rate, zero, dec!(25))?;
    check_years("loan_term_years", inputs.loan_term_years, 1, 40)?;
    check_years("amortization_years", inputs.amortization_years, 1, 40)?;
    check_years("interest_only_years", inputs.interest_only_years, 0, 10)?;

    // --- Fees ---
    check_range("acquisition_fee_percent", inputs.acquisition_fee_percent, zero, dec!(5))?;
    check_range(
        "asset_management_fee_percent",
        inputs.asset_management_fee_percent,
        zero,
        dec!(5),
    )?;

    // --- Waterfall ---
    check_range("preferred_return", inputs.preferred_return, zero, dec!(20))?;
    check_split("tier1", inputs.tier1_lp_split, inputs.tier1_gp_split)?;
    check_split("tier2", inputs.tier2_lp_split, inputs.tier2_gp_split)?;
    check_split("tier3", inputs.tier3_lp_split, inputs.tier3_gp_split)?;
    check_range("tier2_irr_hurdle", inputs.tier2_irr_hurdle, zero, dec!(50))?;
    check_range("tier3_irr_hurdle", inputs.tier3_irr_hurdle, zero, dec!(50))?;

    // --- Operations ---
    check_range("gross_potential_rent", inputs.gross_potential_rent, zero, dec!(100000000))?;
    check_range("vacancy_rate", inputs.vacancy_rate, zero, dec!(50))?;
    check_range("other_income", inputs.other_income, zero, dec!(10000000))?;
    check_range("operating_expense_ratio", inputs.operating_expense_ratio, zero, dec!(90))?;
    check_range("rent_growth_rate", inputs.rent_growth_rate, dec!(-10), dec!(20))?;
    check_range("expense_growth_rate", inputs.expense_growth_rate, zero, dec!(20))?;
    check_years("hold_period_years", inputs.hold_period_years, 1, 15)?;

    // --- Exit ---
    check_range("exit_cap_rate", inputs.exit_cap_rate, dec!(1), dec!(15))?;
    check_range("disposition_fee_percent", inputs.disposition_fee_percent, zero, dec!(10))?;

    Ok(())
}

/// Underwriting warnings for a completed analysis.
pub fn review_results(inputs: &DealInputs, results: &DealResults) -> Vec<String> {
    let mut warnings = Vec::new();

    if inputs.loan_to_value > HIGH_LTV {
        warnings.push(format!(
            "High leverage: LTV of {}% exceeds {HIGH_LTV}%",
            inputs.loan_to_value
        ));
    }
    if inputs.loan_term_years < inputs.hold_period_years {
        warnings.push(format!(
            "Loan term of {} years is shorter than the {}-year hold; refinancing risk",
            inputs.loan_term_years, inputs.hold_period_years
        ));
    }

    for year in &results.yearly_projections {
        if !year.debt_service.is_zero() {
            let dscr = year.noi / year.debt_service;
            if dscr < MIN_DSCR {
                warnings.push(format!(
                    "Year {}: DSCR of {:.2}x is below {MIN_DSCR}x",
                    year.year, dscr
                ));
            }
        }
        if year.cash_flow_after_debt < Decimal::ZERO {
            warnings.push(format!(
                "Year {}: negative cash flow after debt service ({:.0})",
                year.year, year.cash_flow_after_debt
            ));
        }
    }

    if inputs.exit_cap_rate < results.metrics.going_in_cap_rate {
        warnings.push(format!(
            "Exit cap rate {}% is below the going-in cap rate {:.2}%; assumes cap rate compression",
            inputs.exit_cap_rate, results.metrics.going_in_cap_rate
        ));
    }

    warnings
}
