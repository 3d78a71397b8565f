use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::exit::{value_exit, ExitValuation};
use super::inputs::{CapitalizationSummary, DealInputs, FeeSummary};
use super::proforma::{ProForma, YearlyProjection};
use super::sensitivity::{build_sensitivity_table, SensitivityBase, SensitivityRow};
use super::validation::{review_results, validate_inputs};
use super::waterfall::{calculate_exit_waterfall, ExitDistribution};
use crate::time_value::irr;
use crate::types::*;
use crate::DealEngineResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Sale figures and how the proceeds were split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSummary {
    #[serde(flatten)]
    pub valuation: ExitValuation,
    pub waterfall: ExitDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpReturns {
    pub total_distributions: Money,
    /// Operating-period distributions
    pub cash_flow_distributions: Money,
    pub sale_proceeds_distribution: Money,
    pub equity_multiple: Multiple,
    pub irr: Percent,
    /// Preferred return paid during the hold plus the catch-up at sale
    pub preferred_return_total: Money,
    /// Final cash flows, exit proceeds included in the last year
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpReturns {
    /// Operating distributions, asset management fees and sale proceeds
    pub total_distributions: Money,
    /// Operating waterfall distributions, fees excluded
    pub cash_flow_distributions: Money,
    pub asset_management_fees: Money,
    /// Paid at closing and netted into the first GP cash flow; not counted
    /// in `total_distributions`
    pub acquisition_fee: Money,
    pub sale_proceeds_distribution: Money,
    pub equity_multiple: Multiple,
    pub irr: Percent,
    pub promote: Money,
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealMetrics {
    /// Year-1 NOI / purchase price, percent
    pub going_in_cap_rate: Percent,
    /// Mean cash flow after debt service / total equity, percent
    pub average_cash_on_cash: Percent,
    /// LP + GP total distributions less total equity
    pub total_profit: Money,
    /// Year-1 NOI / year-1 debt service
    pub year1_dscr: Multiple,
    /// Lowest NOI / debt service over the hold (years carrying debt)
    pub minimum_dscr: Multiple,
}

/// Full analysis of a syndication deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealResults {
    pub capitalization: CapitalizationSummary,
    pub fees: FeeSummary,
    pub yearly_projections: Vec<YearlyProjection>,
    pub total_noi_over_hold: Money,
    pub exit: ExitSummary,
    pub lp_returns: LpReturns,
    pub gp_returns: GpReturns,
    pub metrics: DealMetrics,
    pub sensitivity_analysis: Vec<SensitivityRow>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Project the hold, sell, run both waterfalls and compute returns.
///
/// Pure and infallible: zero divisors produce zero, cash shortfalls
/// distribute nothing, and IRRs that cannot be solved fall back to zero or
/// the solver's best estimate. Inputs are assumed to be in range; see
/// [`validate_inputs`].
pub fn analyze_deal(inputs: &DealInputs) -> DealResults {
    let pro_forma = ProForma::new(inputs);
    let capitalization = pro_forma.capitalization.clone();
    let fees = inputs.fees(capitalization.total_equity);
    let hold = inputs.hold_period_years;

    // --- Operating years ---
    let (yearly_projections, ledger) = pro_forma.project_hold(pro_forma.opening_ledger());
    let total_noi_over_hold: Money = yearly_projections.iter().map(|y| y.noi).sum();

    // --- Exit ---
    let exit_noi = pro_forma.operating_statement(hold + 1).noi;
    let loan_payoff = pro_forma.loan.balance_after(hold);
    let valuation = value_exit(
        exit_noi,
        inputs.exit_cap_rate,
        inputs.disposition_fee_percent,
        loan_payoff,
    );
    let exit_waterfall = calculate_exit_waterfall(&ledger.exit_input(
        valuation.distributable(),
        &capitalization,
        &pro_forma.structure,
        hold,
    ));

    debug!(
        exit_value = %valuation.exit_value,
        net_sale_proceeds = %valuation.net_sale_proceeds,
        tier = ?exit_waterfall.tier_applied,
        "exit settled"
    );

    let sensitivity_analysis = build_sensitivity_table(&SensitivityBase {
        base_exit_cap_rate: inputs.exit_cap_rate,
        exit_noi,
        disposition_fee_percent: inputs.disposition_fee_percent,
        loan_payoff,
        hold_period_years: hold,
        capitalization: &capitalization,
        structure: &pro_forma.structure,
        ledger: &ledger,
    });

    // --- Returns ---
    let lp_cash_flows = with_exit_proceeds(&ledger.lp_cash_flows, exit_waterfall.lp_distribution);
    let gp_cash_flows = with_exit_proceeds(&ledger.gp_cash_flows, exit_waterfall.gp_distribution);

    let lp_total = ledger.cumulative_lp + exit_waterfall.lp_distribution;
    let gp_total = ledger.cumulative_gp + exit_waterfall.gp_distribution;

    let lp_returns = LpReturns {
        total_distributions: lp_total,
        cash_flow_distributions: ledger.cumulative_lp,
        sale_proceeds_distribution: exit_waterfall.lp_distribution,
        equity_multiple: safe_div(lp_total, capitalization.lp_equity),
        irr: irr(&lp_cash_flows),
        preferred_return_total: ledger.preferred_paid + exit_waterfall.preferred_catch_up,
        cash_flows: lp_cash_flows,
    };
    let gp_returns = GpReturns {
        total_distributions: gp_total,
        cash_flow_distributions: ledger.cumulative_gp_waterfall,
        asset_management_fees: ledger.asset_management_fees(),
        acquisition_fee: fees.acquisition_fee,
        sale_proceeds_distribution: exit_waterfall.gp_distribution,
        equity_multiple: safe_div(gp_total, capitalization.gp_equity),
        irr: irr(&gp_cash_flows),
        promote: exit_waterfall.gp_promote,
        cash_flows: gp_cash_flows,
    };

    let metrics = deal_metrics(
        inputs,
        &capitalization,
        &yearly_projections,
        lp_total + gp_total,
    );

    DealResults {
        capitalization,
        fees,
        yearly_projections,
        total_noi_over_hold,
        exit: ExitSummary {
            valuation,
            waterfall: exit_waterfall,
        },
        lp_returns,
        gp_returns,
        metrics,
        sensitivity_analysis,
    }
}

/// Copy of `cash_flows` with `proceeds` booked in the final year.
fn with_exit_proceeds(cash_flows: &[Money], proceeds: Money) -> Vec<Money> {
    let mut flows = cash_flows.to_vec();
    if let Some(last) = flows.last_mut() {
        *last += proceeds;
    }
    flows
}

fn deal_metrics(
    inputs: &DealInputs,
    capitalization: &CapitalizationSummary,
    years: &[YearlyProjection],
    total_distributions: Money,
) -> DealMetrics {
    let year1_noi = years.first().map(|y| y.noi).unwrap_or(Decimal::ZERO);
    let year1_debt_service = years.first().map(|y| y.debt_service).unwrap_or(Decimal::ZERO);

    let total_cash_flow: Money = years.iter().map(|y| y.cash_flow_after_debt).sum();
    let average_cash_flow = safe_div(total_cash_flow, Decimal::from(years.len() as u64));

    let minimum_dscr = years
        .iter()
        .filter(|y| !y.debt_service.is_zero())
        .map(|y| y.noi / y.debt_service)
        .min()
        .unwrap_or(Decimal::ZERO);

    DealMetrics {
        going_in_cap_rate: safe_div(year1_noi, inputs.purchase_price) * dec!(100),
        average_cash_on_cash: safe_div(average_cash_flow, capitalization.total_equity) * dec!(100),
        total_profit: total_distributions - capitalization.total_equity,
        year1_dscr: safe_div(year1_noi, year1_debt_service),
        minimum_dscr,
    }
}

// ---------------------------------------------------------------------------
// Validated entry point
// ---------------------------------------------------------------------------

/// Validate `inputs`, analyse the deal and wrap the result with the review
/// warnings (coverage, leverage, negative cash flow, cap rate compression).
pub fn run_syndication(inputs: &DealInputs) -> DealEngineResult<ComputationOutput<DealResults>> {
    let start = Instant::now();
    validate_inputs(inputs)?;

    let results = analyze_deal(inputs);
    let warnings = review_results(inputs, &results);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Syndication pro forma with IRR-hurdle distribution waterfall",
        inputs,
        warnings,
        elapsed,
        results,
    ))
}
