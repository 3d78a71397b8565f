use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DealEngineError;
use crate::types::*;
use crate::DealEngineResult;

fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    percent_to_rate(annual_rate_percent) / dec!(12)
}

/// (1 + r)^n, or `None` once it no longer fits in a Decimal.
fn compound_factor(r: Rate, months: u32) -> Option<Decimal> {
    (Decimal::ONE + r).checked_powu(months as u64)
}

/// Monthly payment on a level-payment or interest-only loan.
///
/// Non-positive principal pays nothing; a zero rate amortises straight-line.
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    years: u32,
    interest_only: bool,
) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let r = monthly_rate(annual_rate_percent);
    if interest_only {
        return principal * r;
    }

    let total_months = years * 12;
    if total_months == 0 {
        return Decimal::ZERO;
    }
    if r.is_zero() {
        return principal / Decimal::from(total_months);
    }

    // P * r(1+r)^n / ((1+r)^n - 1)
    match compound_factor(r, total_months) {
        Some(compound) => (principal * r)
            .checked_mul(compound)
            .map(|num| safe_div(num, compound - Decimal::ONE))
            .unwrap_or(principal * r),
        // Factor too large to represent: payment converges on interest alone
        None => principal * r,
    }
}

/// Outstanding balance after `years_elapsed` years.
///
/// The balance holds at `principal` through the interest-only window, then
/// amortises with the full-term level payment. Never negative.
pub fn remaining_balance(
    principal: Money,
    annual_rate_percent: Percent,
    amort_years: u32,
    years_elapsed: u32,
    interest_only: bool,
    io_years: u32,
) -> Money {
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let io_window = if interest_only { io_years } else { 0 };
    if years_elapsed <= io_window {
        return principal;
    }

    let months_amortised = (years_elapsed - io_window) * 12;
    let payment = monthly_payment(principal, annual_rate_percent, amort_years, false);
    let r = monthly_rate(annual_rate_percent);

    let balance = if r.is_zero() {
        principal - payment * Decimal::from(months_amortised)
    } else {
        // B_k = P(1+r)^k - pmt * ((1+r)^k - 1) / r
        match compound_factor(r, months_amortised) {
            Some(compound) => principal
                .checked_mul(compound)
                .zip(payment.checked_mul(compound - Decimal::ONE))
                .map(|(grown, paid)| grown - paid / r)
                .unwrap_or(principal),
            None => principal,
        }
    };

    balance.max(Decimal::ZERO)
}

/// Debt service for `year` (1-based): twelve interest-only payments inside
/// the IO window, twelve level payments after it.
pub fn annual_debt_service(
    principal: Money,
    annual_rate_percent: Percent,
    amort_years: u32,
    interest_only: bool,
    io_years: u32,
    year: u32,
) -> Money {
    let in_io_window = interest_only && year <= io_years;
    monthly_payment(principal, annual_rate_percent, amort_years, in_io_window) * dec!(12)
}

// ---------------------------------------------------------------------------
// Loan terms
// ---------------------------------------------------------------------------

/// Acquisition loan as carried through the pro forma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub amortization_years: u32,
    pub interest_only: bool,
    pub interest_only_years: u32,
}

impl LoanTerms {
    /// Whether `year` (1-based) falls inside the interest-only window.
    pub fn is_interest_only_year(&self, year: u32) -> bool {
        self.interest_only && year <= self.interest_only_years
    }

    /// Twelve monthly payments for `year`, interest-only inside the IO window.
    /// Zero once the loan has been repaid.
    pub fn annual_debt_service(&self, year: u32) -> Money {
        if year > 1 && self.balance_after(year - 1).is_zero() {
            return Decimal::ZERO;
        }
        annual_debt_service(
            self.principal,
            self.annual_rate_percent,
            self.amortization_years,
            self.interest_only,
            self.interest_only_years,
            year,
        )
    }

    pub fn balance_after(&self, years_elapsed: u32) -> Money {
        remaining_balance(
            self.principal,
            self.annual_rate_percent,
            self.amortization_years,
            years_elapsed,
            self.interest_only,
            self.interest_only_years,
        )
    }
}

/// One year of a loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanYear {
    pub year: u32,
    pub opening_balance: Money,
    pub debt_service: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub closing_balance: Money,
    pub interest_only: bool,
}

/// Year-by-year loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleOutput {
    pub monthly_payment: Money,
    pub interest_only_payment: Money,
    pub years: Vec<LoanYear>,
    pub total_debt_service: Money,
    pub total_interest: Money,
    pub total_principal: Money,
}

/// Input for a standalone loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Number of years to schedule
    pub years: u32,
}

/// Build an annual schedule of debt service and balances.
pub fn build_loan_schedule(
    input: &LoanScheduleInput,
) -> DealEngineResult<ComputationOutput<LoanScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let terms = &input.terms;
    let years = input.years;

    if terms.principal < Decimal::ZERO {
        return Err(DealEngineError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal cannot be negative".into(),
        });
    }
    if terms.annual_rate_percent < Decimal::ZERO {
        return Err(DealEngineError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if terms.amortization_years == 0 {
        return Err(DealEngineError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization must be at least 1 year".into(),
        });
    }
    if years == 0 {
        return Err(DealEngineError::InvalidInput {
            field: "years".into(),
            reason: "Schedule must cover at least 1 year".into(),
        });
    }

    let io_end = if terms.interest_only {
        terms.interest_only_years
    } else {
        0
    };
    if years > io_end + terms.amortization_years {
        warnings.push(format!(
            "Loan is fully repaid in year {}; later years carry no debt service",
            io_end + terms.amortization_years
        ));
    }

    let mut schedule = Vec::with_capacity(years as usize);
    let mut total_debt_service = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for year in 1..=years {
        let opening_balance = terms.balance_after(year - 1);
        let closing_balance = terms.balance_after(year);
        let debt_service = terms.annual_debt_service(year);
        let principal_paid = opening_balance - closing_balance;

        total_debt_service += debt_service;
        total_principal += principal_paid;

        schedule.push(LoanYear {
            year,
            opening_balance,
            debt_service,
            interest: debt_service - principal_paid,
            principal_paid,
            closing_balance,
            interest_only: terms.is_interest_only_year(year),
        });
    }

    let output = LoanScheduleOutput {
        monthly_payment: monthly_payment(
            terms.principal,
            terms.annual_rate_percent,
            terms.amortization_years,
            false,
        ),
        interest_only_payment: monthly_payment(
            terms.principal,
            terms.annual_rate_percent,
            terms.amortization_years,
            true,
        ),
        years: schedule,
        total_debt_service,
        total_interest: total_debt_service - total_principal,
        total_principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization with interest-only window",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> LoanTerms {
        LoanTerms {
            principal: dec!(3250000),
            annual_rate_percent: dec!(6.5),
            amortization_years: 30,
            interest_only: true,
            interest_only_years: 3,
        }
    }

    fn schedule_input(terms: LoanTerms, years: u32) -> LoanScheduleInput {
        LoanScheduleInput { terms, years }
    }

    #[test]
    fn test_monthly_payment_amortizing() {
        // 200k at 6% over 30 years ≈ 1199.10
        let pmt = monthly_payment(dec!(200000), dec!(6), 30, false);
        assert!((pmt - dec!(1199.10)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_monthly_payment_interest_only() {
        let pmt = monthly_payment(dec!(1200000), dec!(6), 30, true);
        assert_eq!(pmt, dec!(6000));
    }

    #[test]
    fn test_monthly_payment_zero_rate_is_straight_line() {
        let pmt = monthly_payment(dec!(360000), Decimal::ZERO, 30, false);
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_monthly_payment_non_positive_principal() {
        assert_eq!(monthly_payment(Decimal::ZERO, dec!(6), 30, false), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-5), dec!(6), 30, true), Decimal::ZERO);
    }

    #[test]
    fn test_balance_holds_through_io_window() {
        let t = terms();
        assert_eq!(t.balance_after(0), dec!(3250000));
        assert_eq!(t.balance_after(3), dec!(3250000));
        assert!(t.balance_after(4) < dec!(3250000));
    }

    #[test]
    fn test_balance_after_five_years_fully_amortizing() {
        // 200k at 6% / 30yr: balance after 60 payments ≈ 186,108.71
        let bal = remaining_balance(dec!(200000), dec!(6), 30, 5, false, 0);
        assert!((bal - dec!(186108.71)).abs() < dec!(0.5), "got {bal}");
    }

    #[test]
    fn test_balance_clamped_at_zero_after_term() {
        let bal = remaining_balance(dec!(100000), dec!(5), 10, 12, false, 0);
        assert_eq!(bal, Decimal::ZERO);
        let zero_rate = remaining_balance(dec!(120000), Decimal::ZERO, 10, 11, false, 0);
        assert_eq!(zero_rate, Decimal::ZERO);
    }

    #[test]
    fn test_io_flag_off_ignores_io_years() {
        let with_flag_off = remaining_balance(dec!(200000), dec!(6), 30, 2, false, 5);
        assert!(with_flag_off < dec!(200000));
    }

    #[test]
    fn test_annual_debt_service_switches_after_io() {
        let t = terms();
        // IO: 3,250,000 * 0.065 = 211,250
        let io = t.annual_debt_service(1);
        assert!((io - dec!(211250)).abs() < dec!(0.01), "got {io}");
        assert_eq!(t.annual_debt_service(3), io);
        assert!(t.annual_debt_service(4) > dec!(211250));
    }

    #[test]
    fn test_loan_schedule_balances_reconcile() {
        let result = build_loan_schedule(&schedule_input(terms(), 5)).unwrap();
        let sched = &result.result;
        assert_eq!(sched.years.len(), 5);
        assert!(sched.years[0].interest_only);
        assert!(!sched.years[3].interest_only);
        assert_eq!(sched.years[0].principal_paid, Decimal::ZERO);

        let last = sched.years.last().unwrap();
        let tol = dec!(0.0001);
        assert!((dec!(3250000) - sched.total_principal - last.closing_balance).abs() < tol);
        assert!(
            (sched.total_interest + sched.total_principal - sched.total_debt_service).abs() < tol
        );
    }

    #[test]
    fn test_debt_service_stops_once_repaid() {
        let t = LoanTerms {
            principal: dec!(120000),
            annual_rate_percent: Decimal::ZERO,
            amortization_years: 2,
            interest_only: false,
            interest_only_years: 0,
        };
        assert_eq!(t.annual_debt_service(2), dec!(60000));
        assert_eq!(t.annual_debt_service(3), Decimal::ZERO);

        let sched = build_loan_schedule(&schedule_input(t, 4)).unwrap();
        assert_eq!(sched.warnings.len(), 1);
        assert_eq!(sched.result.total_debt_service, dec!(120000));
    }

    #[test]
    fn test_loan_schedule_rejects_zero_amortization() {
        let mut t = terms();
        t.amortization_years = 0;
        match build_loan_schedule(&schedule_input(t, 5)).unwrap_err() {
            DealEngineError::InvalidInput { field, .. } => {
                assert_eq!(field, "amortization_years")
            }
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
    }
}
