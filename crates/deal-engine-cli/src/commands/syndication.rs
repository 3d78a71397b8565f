use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

use deal_engine_core::syndication::{self, DealInputs, WaterfallPreset};

use crate::input;

/// Waterfall preset selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    Conservative,
    Standard,
    Aggressive,
}

impl From<PresetArg> for WaterfallPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Conservative => WaterfallPreset::Conservative,
            PresetArg::Standard => WaterfallPreset::Standard,
            PresetArg::Aggressive => WaterfallPreset::Aggressive,
        }
    }
}

/// Which part of the analysis to print
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum View {
    /// Full results envelope
    #[default]
    Summary,
    /// One row per year of the hold
    Yearly,
    /// Exit cap rate sensitivity table
    Sensitivity,
}

/// Arguments for a syndication deal analysis
#[derive(Args)]
pub struct SyndicationArgs {
    /// Path to a JSON or YAML deal file (missing fields use the defaults)
    #[arg(long)]
    pub input: Option<String>,

    /// Analyse the built-in default deal
    #[arg(long)]
    pub defaults: bool,

    /// Replace the waterfall tiers with a preset
    #[arg(long)]
    pub preset: Option<PresetArg>,

    /// Override the hold period (years)
    #[arg(long)]
    pub hold_years: Option<u32>,

    /// Override the exit cap rate (percent, e.g. 6.25)
    #[arg(long)]
    pub exit_cap_rate: Option<Decimal>,

    /// Part of the analysis to print
    #[arg(long, value_enum, default_value_t = View::Summary)]
    pub view: View,
}

pub fn run_syndication(args: SyndicationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut inputs: DealInputs = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else if args.defaults {
        DealInputs::default()
    } else {
        return Err("--input <deal.json|deal.yaml>, stdin or --defaults required".into());
    };

    if let Some(preset) = args.preset {
        WaterfallPreset::from(preset).apply(&mut inputs);
    }
    if let Some(hold) = args.hold_years {
        inputs.hold_period_years = hold;
    }
    if let Some(cap) = args.exit_cap_rate {
        inputs.exit_cap_rate = cap;
    }

    let output = syndication::run_syndication(&inputs)?;
    info!(
        lp_irr = %output.result.lp_returns.irr.round_dp(2),
        gp_irr = %output.result.gp_returns.irr.round_dp(2),
        warnings = output.warnings.len(),
        "deal analysed"
    );

    match args.view {
        View::Summary => Ok(serde_json::to_value(output)?),
        View::Yearly => Ok(json!({
            "results": output.result.yearly_projections,
            "warnings": output.warnings,
        })),
        View::Sensitivity => Ok(json!({
            "results": output.result.sensitivity_analysis,
        })),
    }
}

/// Arguments for printing the default deal
#[derive(Args)]
pub struct DefaultsArgs {
    /// Apply a waterfall preset to the defaults
    #[arg(long)]
    pub preset: Option<PresetArg>,
}

pub fn run_defaults(args: DefaultsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut inputs = DealInputs::default();
    if let Some(preset) = args.preset {
        WaterfallPreset::from(preset).apply(&mut inputs);
    }
    Ok(serde_json::to_value(inputs)?)
}
