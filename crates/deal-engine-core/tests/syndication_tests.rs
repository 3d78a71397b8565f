use deal_engine_core::syndication::waterfall::{distribute_operating, TierLevel};
use deal_engine_core::syndication::{analyze_deal, run_syndication, DealInputs, WaterfallPreset};
use deal_engine_core::DealEngineError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 5M acquisition at 65% LTV, 6% fully amortizing, 600k GPR, 40% expenses.
fn scenario() -> DealInputs {
    DealInputs {
        purchase_price: dec!(5000000),
        loan_to_value: dec!(65),
        interest_rate: dec!(6),
        amortization_years: 30,
        interest_only: false,
        interest_only_years: 0,
        gross_potential_rent: dec!(600000),
        vacancy_rate: dec!(5),
        other_income: Decimal::ZERO,
        operating_expense_ratio: dec!(40),
        rent_growth_rate: dec!(3),
        expense_growth_rate: dec!(2),
        hold_period_years: 5,
        exit_cap_rate: dec!(6),
        lp_equity_percent: dec!(90),
        gp_equity_percent: dec!(10),
        preferred_return: dec!(8),
        tier1_lp_split: dec!(70),
        tier1_gp_split: dec!(30),
        ..DealInputs::default()
    }
}

// ===========================================================================
// End-to-end scenario
// ===========================================================================

#[test]
fn test_scenario_going_in_cap_rate() {
    let results = analyze_deal(&scenario());
    // 600,000 * 0.95 * 0.60 / 5,000,000
    assert_eq!(results.metrics.going_in_cap_rate, dec!(6.84));
}

#[test]
fn test_scenario_lp_beats_preferred_return() {
    let results = analyze_deal(&scenario());
    assert!(
        results.lp_returns.irr > dec!(8),
        "Expected LP IRR above 8%, got {}",
        results.lp_returns.irr
    );
    // LP IRR ~12.8%
    assert!((results.lp_returns.irr - dec!(12.84)).abs() < dec!(0.1));
    assert!(results.gp_returns.promote >= Decimal::ZERO);
    assert!(results.gp_returns.irr > results.lp_returns.irr);
}

#[test]
fn test_scenario_exit_figures() {
    let results = analyze_deal(&scenario());
    let exit = &results.exit.valuation;
    assert_eq!(exit.exit_value, exit.exit_noi / dec!(0.06));
    assert_eq!(exit.disposition_costs, exit.exit_value * dec!(0.02));
    assert_eq!(
        exit.net_sale_proceeds,
        exit.exit_value - exit.disposition_costs - exit.loan_payoff
    );
    assert!(exit.loan_payoff < results.capitalization.loan_amount);
    assert_eq!(results.exit.waterfall.tier_applied, TierLevel::Tier2);
}

#[test]
fn test_exit_proceeds_fully_distributed() {
    let results = analyze_deal(&scenario());
    let waterfall = &results.exit.waterfall;
    let distributed = waterfall.lp_distribution + waterfall.gp_distribution;
    assert!((distributed - results.exit.valuation.net_sale_proceeds).abs() < dec!(0.01));
}

// ===========================================================================
// Identities
// ===========================================================================

#[test]
fn test_capitalization_identity() {
    let cap = analyze_deal(&DealInputs::default()).capitalization;
    assert_eq!(cap.loan_amount + cap.total_equity, cap.total_capitalization);
    assert_eq!(cap.lp_equity + cap.gp_equity, cap.total_equity);
}

#[test]
fn test_yearly_cash_flow_identity() {
    let results = analyze_deal(&DealInputs::default());
    assert_eq!(results.yearly_projections.len(), 5);
    for year in &results.yearly_projections {
        let expected = year.noi - year.asset_management_fee - year.debt_service;
        assert!((year.cash_flow_after_debt - expected).abs() < dec!(0.01));
    }
}

#[test]
fn test_io_window_debt_service() {
    let results = analyze_deal(&DealInputs::default());
    let years = &results.yearly_projections;
    assert_eq!(years[0].debt_service, years[2].debt_service);
    assert!(years[3].debt_service > years[2].debt_service);
}

#[test]
fn test_cumulative_distributions_accumulate() {
    let results = analyze_deal(&DealInputs::default());
    let mut lp = Decimal::ZERO;
    for year in &results.yearly_projections {
        lp += year.lp_distribution;
        assert_eq!(year.cumulative_lp_distributions, lp);
    }
    assert_eq!(results.lp_returns.cash_flow_distributions, lp);
}

#[test]
fn test_equity_multiple_is_distributions_over_equity() {
    let results = analyze_deal(&DealInputs::default());
    assert_eq!(
        results.lp_returns.equity_multiple,
        results.lp_returns.total_distributions / results.capitalization.lp_equity
    );
    assert_eq!(
        results.gp_returns.equity_multiple,
        results.gp_returns.total_distributions / results.capitalization.gp_equity
    );
}

#[test]
fn test_zero_gp_equity_multiple_is_zero() {
    let inputs = DealInputs {
        lp_equity_percent: dec!(100),
        gp_equity_percent: Decimal::ZERO,
        ..DealInputs::default()
    };
    let results = analyze_deal(&inputs);
    assert_eq!(results.capitalization.gp_equity, Decimal::ZERO);
    assert_eq!(results.gp_returns.equity_multiple, Decimal::ZERO);
}

#[test]
fn test_cash_flow_vectors_carry_exit_in_final_year() {
    let results = analyze_deal(&DealInputs::default());
    let lp = &results.lp_returns.cash_flows;
    assert_eq!(lp.len(), 6);
    assert_eq!(lp[0], -results.capitalization.lp_equity);
    let last_year = results.yearly_projections.last().unwrap();
    assert_eq!(
        lp[5],
        last_year.lp_distribution + results.lp_returns.sale_proceeds_distribution
    );
    let sum: Decimal = lp[1..].iter().copied().sum();
    assert!((sum - results.lp_returns.total_distributions).abs() < dec!(0.01));
}

#[test]
fn test_gp_fee_breakdown() {
    let results = analyze_deal(&DealInputs::default());
    let gp = &results.gp_returns;
    assert!((gp.asset_management_fees - dec!(200000)).abs() < dec!(0.01));
    assert_eq!(gp.acquisition_fee, dec!(100000));
    let parts =
        gp.cash_flow_distributions + gp.asset_management_fees + gp.sale_proceeds_distribution;
    assert!((gp.total_distributions - parts).abs() < dec!(0.01));
}

#[test]
fn test_gp_cash_flows_open_net_of_acquisition_fee() {
    let results = analyze_deal(&DealInputs::default());
    let gp = &results.gp_returns;
    assert_eq!(
        gp.cash_flows[0],
        -results.capitalization.gp_equity + results.fees.acquisition_fee
    );
    // Fee is excluded from the multiple
    assert_eq!(
        gp.equity_multiple,
        gp.total_distributions / results.capitalization.gp_equity
    );
    let sum: Decimal = gp.cash_flows[1..].iter().copied().sum();
    assert!((sum - gp.total_distributions).abs() < dec!(0.01));
}

#[test]
fn test_acquisition_fee_raises_gp_irr() {
    let with_fee = analyze_deal(&DealInputs::default());
    let without_fee = analyze_deal(&DealInputs {
        acquisition_fee_percent: Decimal::ZERO,
        ..DealInputs::default()
    });
    assert!(with_fee.gp_returns.irr > without_fee.gp_returns.irr);
    assert_eq!(
        with_fee.gp_returns.total_distributions,
        without_fee.gp_returns.total_distributions
    );
}

#[test]
fn test_total_profit() {
    let results = analyze_deal(&DealInputs::default());
    assert_eq!(
        results.metrics.total_profit,
        results.lp_returns.total_distributions + results.gp_returns.total_distributions
            - results.capitalization.total_equity
    );
}

#[test]
fn test_operating_waterfall_preferred_first() {
    let structure = DealInputs::default().waterfall_structure();
    let dist = distribute_operating(dec!(5000), dec!(100000), Decimal::ZERO, false, &structure);
    assert_eq!(dist.lp_distribution, dec!(5000));
    assert_eq!(dist.gp_distribution, Decimal::ZERO);
}

// ===========================================================================
// Sensitivity
// ===========================================================================

#[test]
fn test_sensitivity_rows_ascend() {
    let results = analyze_deal(&scenario());
    let rates: Vec<Decimal> = results
        .sensitivity_analysis
        .iter()
        .map(|r| r.exit_cap_rate)
        .collect();
    assert_eq!(rates, vec![dec!(5), dec!(5.5), dec!(6), dec!(6.5), dec!(7)]);
}

#[test]
fn test_sensitivity_monotonic() {
    // Hurdles out of reach keep every row at the same tier
    let inputs = DealInputs {
        tier2_irr_hurdle: dec!(50),
        tier3_irr_hurdle: dec!(50),
        ..scenario()
    };
    let rows = analyze_deal(&inputs).sensitivity_analysis;
    for pair in rows.windows(2) {
        assert!(pair[1].exit_value < pair[0].exit_value);
        assert!(pair[1].lp_irr <= pair[0].lp_irr);
        assert!(pair[1].lp_equity_multiple <= pair[0].lp_equity_multiple);
    }
}

#[test]
fn test_sensitivity_base_row_matches_results() {
    let results = analyze_deal(&scenario());
    let base = results
        .sensitivity_analysis
        .iter()
        .find(|r| r.exit_cap_rate == dec!(6))
        .unwrap();
    assert_eq!(base.exit_value, results.exit.valuation.exit_value);
    assert_eq!(base.lp_irr, results.lp_returns.irr);
    assert_eq!(base.gp_irr, results.gp_returns.irr);
    assert_eq!(base.lp_equity_multiple, results.lp_returns.equity_multiple);
}

#[test]
fn test_sensitivity_drops_non_positive_cap_rates() {
    let inputs = DealInputs {
        exit_cap_rate: dec!(1),
        ..DealInputs::default()
    };
    let rows = analyze_deal(&inputs).sensitivity_analysis;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.exit_cap_rate > Decimal::ZERO));
}

// ===========================================================================
// Degenerate inputs
// ===========================================================================

#[test]
fn test_zero_exit_cap_rate_does_not_fault() {
    let inputs = DealInputs {
        exit_cap_rate: Decimal::ZERO,
        ..DealInputs::default()
    };
    let results = analyze_deal(&inputs);
    assert_eq!(results.exit.valuation.exit_value, Decimal::ZERO);
    assert_eq!(results.lp_returns.sale_proceeds_distribution, Decimal::ZERO);
    assert_eq!(results.sensitivity_analysis.len(), 2);
}

#[test]
fn test_zero_purchase_price_does_not_fault() {
    let inputs = DealInputs {
        purchase_price: Decimal::ZERO,
        closing_costs: Decimal::ZERO,
        capex_reserves: Decimal::ZERO,
        ..DealInputs::default()
    };
    let results = analyze_deal(&inputs);
    assert_eq!(results.metrics.going_in_cap_rate, Decimal::ZERO);
    assert_eq!(results.metrics.average_cash_on_cash, Decimal::ZERO);
    assert_eq!(results.lp_returns.equity_multiple, Decimal::ZERO);
}

// ===========================================================================
// Validated entry point
// ===========================================================================

#[test]
fn test_run_syndication_wraps_results() {
    let output = run_syndication(&DealInputs::default()).unwrap();
    assert!(output.methodology.contains("waterfall"));
    assert_eq!(output.result, analyze_deal(&DealInputs::default()));
    // Default exit cap (6%) sits below the going-in cap (6.534%)
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("cap rate compression")));
}

#[test]
fn test_run_syndication_rejects_invalid_split() {
    let mut inputs = DealInputs::default();
    inputs.tier3_lp_split = dec!(55);
    match run_syndication(&inputs).unwrap_err() {
        DealEngineError::InvalidInput { field, .. } => assert_eq!(field, "tier3"),
        other => panic!("Expected InvalidInput, got: {other:?}"),
    }
}

#[test]
fn test_presets_shift_economics_toward_gp() {
    let mut conservative = DealInputs::default();
    WaterfallPreset::Conservative.apply(&mut conservative);
    let mut aggressive = DealInputs::default();
    WaterfallPreset::Aggressive.apply(&mut aggressive);

    let lp_conservative = analyze_deal(&conservative).lp_returns.total_distributions;
    let lp_aggressive = analyze_deal(&aggressive).lp_returns.total_distributions;
    assert!(lp_conservative > lp_aggressive);
}
