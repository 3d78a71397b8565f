use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use deal_engine_core::syndication::amortization::{self, LoanScheduleInput, LoanTerms};

use crate::input;

/// Arguments for a loan schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (percent)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, default_value_t = 30)]
    pub amortization_years: u32,

    /// Interest-only years at the start of the loan
    #[arg(long, default_value_t = 0)]
    pub interest_only_years: u32,

    /// Years to schedule
    #[arg(long, default_value_t = 10)]
    pub years: u32,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: LoanScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LoanScheduleInput {
            terms: LoanTerms {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args
                    .rate
                    .ok_or("--rate is required (or provide --input)")?,
                amortization_years: args.amortization_years,
                interest_only: args.interest_only_years > 0,
                interest_only_years: args.interest_only_years,
            },
            years: args.years,
        }
    };

    let result = amortization::build_loan_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
