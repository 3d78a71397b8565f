use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::amortization::LoanTerms;
use super::inputs::{CapitalizationSummary, DealInputs};
use super::waterfall::{distribute_operating, ExitWaterfallInput, WaterfallStructure};
use crate::types::*;

/// Compounded growth `(1 + g)^periods` for a percentage rate.
pub fn growth_factor(rate: Percent, periods: u32) -> Decimal {
    (Decimal::ONE + percent_to_rate(rate))
        .checked_powu(periods as u64)
        .unwrap_or(Decimal::MAX)
}

// ---------------------------------------------------------------------------
// Projection records
// ---------------------------------------------------------------------------

/// Property income statement for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingStatement {
    pub gross_potential_rent: Money,
    pub effective_gross_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
}

/// One year of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub gross_potential_rent: Money,
    pub effective_gross_income: Money,
    pub operating_expenses: Money,
    pub noi: Money,
    pub asset_management_fee: Money,
    /// NOI less asset management fee
    pub cash_flow_before_debt: Money,
    pub debt_service: Money,
    pub cash_flow_after_debt: Money,
    pub lp_distribution: Money,
    /// GP waterfall share plus the asset management fee
    pub gp_distribution: Money,
    pub preferred_return_paid: Money,
    pub cumulative_lp_distributions: Money,
    pub cumulative_gp_distributions: Money,
}

/// Running distribution totals threaded through the yearly fold.
///
/// Cash-flow vectors start with each class's contribution as a negative
/// amount at index 0; year `n` lands at index `n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionLedger {
    pub cumulative_lp: Money,
    /// GP distributions including asset management fees
    pub cumulative_gp: Money,
    /// GP waterfall distributions only
    pub cumulative_gp_waterfall: Money,
    pub preferred_paid: Money,
    pub lp_cash_flows: Vec<Money>,
    pub gp_cash_flows: Vec<Money>,
}

impl DistributionLedger {
    /// Ledger at closing: contributions in, nothing distributed. The GP
    /// receives the acquisition fee at closing, netted against its equity.
    pub fn at_closing(capitalization: &CapitalizationSummary, acquisition_fee: Money) -> Self {
        Self {
            lp_cash_flows: vec![-capitalization.lp_equity],
            gp_cash_flows: vec![acquisition_fee - capitalization.gp_equity],
            ..Self::default()
        }
    }

    /// Asset management fees paid to date.
    pub fn asset_management_fees(&self) -> Money {
        self.cumulative_gp - self.cumulative_gp_waterfall
    }

    /// Exit waterfall input for settling `distributable` against this ledger.
    pub fn exit_input<'a>(
        &'a self,
        distributable: Money,
        capitalization: &CapitalizationSummary,
        structure: &'a WaterfallStructure,
        hold_period_years: u32,
    ) -> ExitWaterfallInput<'a> {
        ExitWaterfallInput {
            distributable,
            lp_equity: capitalization.lp_equity,
            gp_equity: capitalization.gp_equity,
            cumulative_lp: self.cumulative_lp,
            cumulative_gp: self.cumulative_gp_waterfall,
            preferred_paid: self.preferred_paid,
            hold_period_years,
            lp_cash_flows: &self.lp_cash_flows,
            gp_cash_flows: &self.gp_cash_flows,
            structure,
        }
    }
}

// ---------------------------------------------------------------------------
// Pro forma
// ---------------------------------------------------------------------------

/// Everything a year of the projection needs, derived once from the inputs.
#[derive(Debug, Clone)]
pub struct ProForma<'a> {
    inputs: &'a DealInputs,
    pub capitalization: CapitalizationSummary,
    pub loan: LoanTerms,
    pub structure: WaterfallStructure,
    pub annual_asset_management_fee: Money,
    pub acquisition_fee: Money,
    /// Year-1 operating expenses, grown at the expense growth rate
    pub base_operating_expenses: Money,
}

impl<'a> ProForma<'a> {
    pub fn new(inputs: &'a DealInputs) -> Self {
        let capitalization = inputs.capitalization();
        let fees = inputs.fees(capitalization.total_equity);
        let year_one_egi = effective_gross_income(
            inputs.gross_potential_rent,
            inputs.vacancy_rate,
            inputs.other_income,
        );

        Self {
            inputs,
            loan: inputs.loan_terms(),
            structure: inputs.waterfall_structure(),
            annual_asset_management_fee: fees.annual_asset_management_fee,
            acquisition_fee: fees.acquisition_fee,
            base_operating_expenses: year_one_egi
                * percent_to_rate(inputs.operating_expense_ratio),
            capitalization,
        }
    }

    /// Distribution ledger on the closing date of this deal.
    pub fn opening_ledger(&self) -> DistributionLedger {
        DistributionLedger::at_closing(&self.capitalization, self.acquisition_fee)
    }

    /// Income statement for `year` (1-based). Year `hold + 1` is the
    /// forward year used to value the exit.
    pub fn operating_statement(&self, year: u32) -> OperatingStatement {
        let periods = year.saturating_sub(1);
        let rent_growth = growth_factor(self.inputs.rent_growth_rate, periods);
        let expense_growth = growth_factor(self.inputs.expense_growth_rate, periods);

        let gross_potential_rent = self.inputs.gross_potential_rent.saturating_mul(rent_growth);
        let other_income = self.inputs.other_income.saturating_mul(rent_growth);
        let effective_gross_income =
            effective_gross_income(gross_potential_rent, self.inputs.vacancy_rate, other_income);
        let operating_expenses = self.base_operating_expenses.saturating_mul(expense_growth);

        OperatingStatement {
            gross_potential_rent,
            effective_gross_income,
            operating_expenses,
            noi: effective_gross_income.saturating_sub(operating_expenses),
        }
    }

    /// Project one year and fold its distributions into `ledger`.
    ///
    /// Operating cash is never treated as an exit year here; sale proceeds
    /// settle outstanding capital in the exit waterfall.
    pub fn project_year(
        &self,
        year: u32,
        mut ledger: DistributionLedger,
    ) -> (YearlyProjection, DistributionLedger) {
        let statement = self.operating_statement(year);
        let asset_management_fee = self.annual_asset_management_fee;
        let debt_service = self.loan.annual_debt_service(year);

        let cash_flow_before_debt = statement.noi - asset_management_fee;
        let cash_flow_after_debt = cash_flow_before_debt - debt_service;

        let distribution = distribute_operating(
            cash_flow_after_debt.max(Decimal::ZERO),
            self.capitalization.lp_equity,
            ledger.cumulative_lp,
            false,
            &self.structure,
        );
        let lp_distribution = distribution.lp_distribution;
        let gp_distribution = distribution.gp_distribution + asset_management_fee;

        ledger.cumulative_lp += lp_distribution;
        ledger.cumulative_gp += gp_distribution;
        ledger.cumulative_gp_waterfall += distribution.gp_distribution;
        ledger.preferred_paid += distribution.preferred_paid;
        ledger.lp_cash_flows.push(lp_distribution);
        ledger.gp_cash_flows.push(gp_distribution);

        trace!(
            year,
            noi = %statement.noi,
            cash_flow_after_debt = %cash_flow_after_debt,
            lp = %lp_distribution,
            gp = %gp_distribution,
            "projected year"
        );

        let projection = YearlyProjection {
            year,
            gross_potential_rent: statement.gross_potential_rent,
            effective_gross_income: statement.effective_gross_income,
            operating_expenses: statement.operating_expenses,
            noi: statement.noi,
            asset_management_fee,
            cash_flow_before_debt,
            debt_service,
            cash_flow_after_debt,
            lp_distribution,
            gp_distribution,
            preferred_return_paid: distribution.preferred_paid,
            cumulative_lp_distributions: ledger.cumulative_lp,
            cumulative_gp_distributions: ledger.cumulative_gp,
        };
        (projection, ledger)
    }

    /// Project years `1..=hold`, starting from `ledger`.
    pub fn project_hold(
        &self,
        ledger: DistributionLedger,
    ) -> (Vec<YearlyProjection>, DistributionLedger) {
        let hold = self.inputs.hold_period_years;
        (1..=hold).fold(
            (Vec::with_capacity(hold as usize), ledger),
            |(mut projections, ledger), year| {
                let (projection, ledger) = self.project_year(year, ledger);
                projections.push(projection);
                (projections, ledger)
            },
        )
    }
}

/// GPR net of vacancy, plus other income.
pub fn effective_gross_income(
    gross_potential_rent: Money,
    vacancy_rate: Percent,
    other_income: Money,
) -> Money {
    gross_potential_rent * (Decimal::ONE - percent_to_rate(vacancy_rate)) + other_income
}
