use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::DealEngineError;
use crate::types::*;
use crate::DealEngineResult;

const NEWTON_INITIAL_GUESS: Rate = dec!(0.10);
const RATE_TOLERANCE: Decimal = dec!(0.0001);
const NPV_TOLERANCE: Decimal = dec!(0.0001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);
const DERIVATIVE_NUDGE: Rate = dec!(0.1);
const MAX_IRR_ITERATIONS: u32 = 100;

// Newton excursions outside [floor, ceiling] restart from a snap point.
const NEWTON_RATE_FLOOR: Rate = dec!(-0.99);
const NEWTON_RATE_CEILING: Rate = dec!(10);
const NEWTON_SNAP_LOW: Rate = dec!(-0.5);
const NEWTON_SNAP_HIGH: Rate = dec!(2);

const BISECTION_LOW: Rate = dec!(-0.99);
const BISECTION_HIGH: Rate = dec!(5);

/// Outcome of a single root-finding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootSearch {
    /// Rate (decimal) at which NPV is approximately zero
    Converged { rate: Rate, iterations: u32 },
    /// Strategy gave up; carries its last estimate
    Exhausted { last_rate: Rate },
}

/// Which path produced an IRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrMethod {
    /// Flows never change sign, IRR reported as zero
    NoSignChange,
    NewtonRaphson,
    Bisection,
    /// Neither strategy converged; last Newton-Raphson estimate
    BestEstimate,
}

/// IRR expressed as a percentage, with the method that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrSolution {
    pub irr: Percent,
    pub method: IrrMethod,
}

// ---------------------------------------------------------------------------
// NPV
// ---------------------------------------------------------------------------

/// Net present value of annual cash flows at a decimal `rate`.
///
/// Arithmetic saturates instead of overflowing, so rates near -100% yield a
/// very large value of the correct sign rather than a panic.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Money {
    npv_and_derivative(cash_flows, rate).0
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> (Decimal, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return (Decimal::ZERO, Decimal::ZERO);
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // 1 / (1+r)^t

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.saturating_add(cf.saturating_mul(discount));
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .saturating_mul(*cf)
                .saturating_mul(discount);
            dnpv = dnpv.saturating_sub(saturating_div(term, one_plus_r));
        }
        discount = saturating_div(discount, one_plus_r);
    }

    (npv, dnpv)
}

fn saturating_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or({
        if numerator.is_sign_negative() == denominator.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

// ---------------------------------------------------------------------------
// Root-finding strategies
// ---------------------------------------------------------------------------

/// Newton-Raphson from a 10% guess.
///
/// Near-flat derivatives nudge the rate up by 0.1; proposals below -0.99 or
/// above 10 restart from -0.5 or 2. Converges on successive estimates
/// within 1e-4.
pub fn newton_raphson(cash_flows: &[Money]) -> RootSearch {
    let mut rate = NEWTON_INITIAL_GUESS;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(cash_flows, rate);

        if dnpv.abs() < DERIVATIVE_FLOOR {
            rate += DERIVATIVE_NUDGE;
            continue;
        }

        let proposed = rate.saturating_sub(saturating_div(npv_val, dnpv));

        if proposed < NEWTON_RATE_FLOOR {
            rate = NEWTON_SNAP_LOW;
            continue;
        }
        if proposed > NEWTON_RATE_CEILING {
            rate = NEWTON_SNAP_HIGH;
            continue;
        }

        if (proposed - rate).abs() < RATE_TOLERANCE {
            return RootSearch::Converged {
                rate: proposed,
                iterations: i + 1,
            };
        }

        rate = proposed;
    }

    RootSearch::Exhausted { last_rate: rate }
}

/// Bisection over [-0.99, 5]. Needs NPV to change sign across the bracket.
pub fn bisection(cash_flows: &[Money]) -> RootSearch {
    let mut low = BISECTION_LOW;
    let mut high = BISECTION_HIGH;
    let mut npv_low = npv(low, cash_flows);
    let npv_high = npv(high, cash_flows);

    if npv_low.is_zero() {
        return RootSearch::Converged {
            rate: low,
            iterations: 0,
        };
    }
    if npv_high.is_zero() {
        return RootSearch::Converged {
            rate: high,
            iterations: 0,
        };
    }
    if npv_low.is_sign_negative() == npv_high.is_sign_negative() {
        return RootSearch::Exhausted { last_rate: low };
    }

    for i in 0..MAX_IRR_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let npv_mid = npv(mid, cash_flows);

        if npv_mid.abs() < NPV_TOLERANCE || (high - low) / dec!(2) < RATE_TOLERANCE {
            return RootSearch::Converged {
                rate: mid,
                iterations: i + 1,
            };
        }

        if npv_mid.is_sign_negative() == npv_low.is_sign_negative() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }

    RootSearch::Exhausted {
        last_rate: (low + high) / dec!(2),
    }
}

// ---------------------------------------------------------------------------
// IRR driver
// ---------------------------------------------------------------------------

/// Solve IRR, reporting which strategy produced the answer.
pub fn solve_irr(cash_flows: &[Money]) -> IrrSolution {
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if cash_flows.len() < 2 || !has_negative || !has_positive {
        return IrrSolution {
            irr: Decimal::ZERO,
            method: IrrMethod::NoSignChange,
        };
    }

    let newton_estimate = match newton_raphson(cash_flows) {
        RootSearch::Converged { rate, .. } => {
            return IrrSolution {
                irr: rate * dec!(100),
                method: IrrMethod::NewtonRaphson,
            };
        }
        RootSearch::Exhausted { last_rate } => last_rate,
    };

    debug!(
        flows = cash_flows.len(),
        last_rate = %newton_estimate,
        "newton-raphson did not converge, falling back to bisection"
    );

    match bisection(cash_flows) {
        RootSearch::Converged { rate, .. } => IrrSolution {
            irr: rate * dec!(100),
            method: IrrMethod::Bisection,
        },
        RootSearch::Exhausted { .. } => {
            debug!(last_rate = %newton_estimate, "irr did not converge, using best estimate");
            IrrSolution {
                irr: newton_estimate * dec!(100),
                method: IrrMethod::BestEstimate,
            }
        }
    }
}

/// Internal rate of return as a percentage (12.5 = 12.5%).
///
/// Returns zero when fewer than two flows are given or the flows never
/// change sign. Never fails: a non-converging series returns the best
/// available estimate.
pub fn irr(cash_flows: &[Money]) -> Percent {
    solve_irr(cash_flows).irr
}

/// IRR of `cash_flows` with `extra` added to the final entry, leaving the
/// caller's vector untouched.
pub fn irr_with_final_adjustment(cash_flows: &[Money], extra: Money) -> Percent {
    let mut adjusted = cash_flows.to_vec();
    if let Some(last) = adjusted.last_mut() {
        *last += extra;
    }
    irr(&adjusted)
}

// ---------------------------------------------------------------------------
// Cash-flow returns
// ---------------------------------------------------------------------------

/// Input for analysing an arbitrary annual cash-flow series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReturnsInput {
    /// Annual cash flows (index 0 = initial investment, negative)
    pub cash_flows: Vec<Money>,
    /// Optional discount rate (percent) for an NPV figure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Percent>,
}

/// Returns for an annual cash-flow series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReturnsOutput {
    /// Internal rate of return (percent)
    pub irr: Percent,
    pub irr_method: IrrMethod,
    /// NPV at the requested discount rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npv: Option<Money>,
    /// Sum of negative flows (as a positive amount)
    pub total_invested: Money,
    /// Sum of positive flows
    pub total_returned: Money,
    /// total_returned / total_invested
    pub equity_multiple: Multiple,
}

/// Calculate IRR, NPV and equity multiple for a periodic cash-flow series.
pub fn analyze_cash_flows(
    input: &CashFlowReturnsInput,
) -> DealEngineResult<ComputationOutput<CashFlowReturnsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.len() < 2 {
        return Err(DealEngineError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if let Some(rate) = input.discount_rate {
        if rate <= dec!(-100) {
            return Err(DealEngineError::InvalidInput {
                field: "discount_rate".into(),
                reason: "Discount rate must be greater than -100%".into(),
            });
        }
    }

    let solution = solve_irr(&input.cash_flows);
    match solution.method {
        IrrMethod::NoSignChange => warnings
            .push("Cash flows never change sign; IRR is undefined and reported as 0".into()),
        IrrMethod::BestEstimate => warnings
            .push("IRR did not converge; reporting the last Newton-Raphson estimate".into()),
        IrrMethod::NewtonRaphson | IrrMethod::Bisection => {}
    }

    let total_invested: Money = input
        .cash_flows
        .iter()
        .filter(|cf| cf.is_sign_negative())
        .map(|cf| cf.abs())
        .sum();
    let total_returned: Money = input
        .cash_flows
        .iter()
        .filter(|cf| **cf > Decimal::ZERO)
        .sum();

    let output = CashFlowReturnsOutput {
        irr: solution.irr,
        irr_method: solution.method,
        npv: input
            .discount_rate
            .map(|r| npv(percent_to_rate(r), &input.cash_flows)),
        total_invested,
        total_returned,
        equity_multiple: safe_div(total_returned, total_invested),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IRR (Newton-Raphson with bisection fallback), NPV, equity multiple",
        input,
        warnings,
        elapsed,
        output,
    ))
}
