//! Property-based tests for the deal engine.
//!
//! These tests verify invariants hold across randomly generated deals.

use deal_engine_core::syndication::amortization::{monthly_payment, remaining_balance};
use deal_engine_core::syndication::waterfall::distribute_operating;
use deal_engine_core::syndication::{analyze_deal, DealInputs};
use deal_engine_core::time_value::irr;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn money_strategy(min: i64, max: i64) -> impl Strategy<Value = Decimal> {
    (min..max).prop_map(Decimal::from)
}

fn percent_strategy(max_hundredths: i64) -> impl Strategy<Value = Decimal> {
    (0i64..=max_hundredths).prop_map(|x| Decimal::new(x, 2)) // 0.00% to max
}

fn deal_strategy() -> impl Strategy<Value = DealInputs> {
    (
        money_strategy(1_000_000, 50_000_000),
        percent_strategy(8000),
        percent_strategy(1000),
        (100_000i64..5_000_000i64).prop_map(Decimal::from),
        1u32..=10u32,
        (300i64..=1200i64).prop_map(|x| Decimal::new(x, 2)),
        any::<bool>(),
    )
        .prop_map(
            |(purchase_price, loan_to_value, interest_rate, rent, hold, exit_cap, io)| DealInputs {
                purchase_price,
                loan_to_value,
                interest_rate,
                gross_potential_rent: rent,
                hold_period_years: hold,
                exit_cap_rate: exit_cap,
                interest_only: io,
                ..DealInputs::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Loan plus equity always funds the full capitalization
    #[test]
    fn capitalization_balances(inputs in deal_strategy()) {
        let cap = analyze_deal(&inputs).capitalization;
        prop_assert_eq!(cap.loan_amount + cap.total_equity, cap.total_capitalization);
    }

    /// Cash flow after debt is NOI less fee less debt service every year
    #[test]
    fn yearly_cash_flow_identity(inputs in deal_strategy()) {
        let results = analyze_deal(&inputs);
        prop_assert_eq!(results.yearly_projections.len() as u32, inputs.hold_period_years);
        for year in &results.yearly_projections {
            let expected = year.noi - year.asset_management_fee - year.debt_service;
            prop_assert!((year.cash_flow_after_debt - expected).abs() < dec!(0.01));
        }
    }

    /// No party ever receives a negative distribution
    #[test]
    fn distributions_never_negative(inputs in deal_strategy()) {
        let results = analyze_deal(&inputs);
        for year in &results.yearly_projections {
            prop_assert!(year.lp_distribution >= Decimal::ZERO);
            prop_assert!(year.gp_distribution >= Decimal::ZERO);
        }
        prop_assert!(results.lp_returns.sale_proceeds_distribution >= Decimal::ZERO);
        prop_assert!(results.gp_returns.sale_proceeds_distribution >= Decimal::ZERO);
        prop_assert!(results.gp_returns.promote >= Decimal::ZERO);
    }

    /// Operating waterfall hands out exactly the cash it is given
    #[test]
    fn operating_waterfall_conserves_cash(
        available in money_strategy(0, 2_000_000),
        lp_equity in money_strategy(1, 10_000_000),
    ) {
        let structure = DealInputs::default().waterfall_structure();
        let dist = distribute_operating(available, lp_equity, Decimal::ZERO, false, &structure);
        let total = dist.lp_distribution + dist.gp_distribution;
        prop_assert!((total - available).abs() < dec!(0.000001));
    }

    /// Balance never goes negative and never exceeds principal
    #[test]
    fn balance_within_bounds(
        principal in money_strategy(1, 100_000_000),
        rate in percent_strategy(2500),
        amort in 1u32..=40u32,
        elapsed in 0u32..=50u32,
    ) {
        let balance = remaining_balance(principal, rate, amort, elapsed, false, 0);
        prop_assert!(balance >= Decimal::ZERO);
        prop_assert!(balance <= principal);
        prop_assert!(monthly_payment(principal, rate, amort, false) > Decimal::ZERO);
    }

    /// Same-signed flows have no IRR
    #[test]
    fn irr_same_sign_is_zero(flows in prop::collection::vec(1i64..1_000_000i64, 2..10)) {
        let positive: Vec<Decimal> = flows.iter().map(|x| Decimal::from(*x)).collect();
        let negative: Vec<Decimal> = positive.iter().map(|x| -*x).collect();
        prop_assert_eq!(irr(&positive), Decimal::ZERO);
        prop_assert_eq!(irr(&negative), Decimal::ZERO);
    }
}
