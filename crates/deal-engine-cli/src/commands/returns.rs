use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use deal_engine_core::time_value::{self, CashFlowReturnsInput};

use crate::input;

/// Arguments for cash-flow returns
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Annual cash flows (comma-separated, e.g. "-100,30,30,130")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Discount rate for NPV (percent)
    #[arg(long, allow_hyphen_values = true)]
    pub discount_rate: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let returns_input: CashFlowReturnsInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CashFlowReturnsInput {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            discount_rate: args.discount_rate,
        }
    };

    let result = time_value::analyze_cash_flows(&returns_input)?;
    Ok(serde_json::to_value(result)?)
}
