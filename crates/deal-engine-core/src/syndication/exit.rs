use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Sale of the property at the end of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitValuation {
    pub exit_cap_rate: Percent,
    /// Forward NOI (the year after the hold)
    pub exit_noi: Money,
    pub exit_value: Money,
    pub disposition_costs: Money,
    pub loan_payoff: Money,
    /// Exit value less disposition costs and loan payoff
    pub net_sale_proceeds: Money,
    /// Exit value less loan payoff
    pub equity_at_sale: Money,
}

impl ExitValuation {
    /// Proceeds the exit waterfall can distribute.
    pub fn distributable(&self) -> Money {
        self.net_sale_proceeds.max(Decimal::ZERO)
    }
}

/// Value the property at `exit_cap_rate` and settle the loan.
///
/// A zero cap rate values the property at zero.
pub fn value_exit(
    exit_noi: Money,
    exit_cap_rate: Percent,
    disposition_fee_percent: Percent,
    loan_payoff: Money,
) -> ExitValuation {
    let exit_value = safe_div(exit_noi, percent_to_rate(exit_cap_rate));
    let disposition_costs = exit_value * percent_to_rate(disposition_fee_percent);

    ExitValuation {
        exit_cap_rate,
        exit_noi,
        exit_value,
        disposition_costs,
        loan_payoff,
        net_sale_proceeds: exit_value - disposition_costs - loan_payoff,
        equity_at_sale: exit_value - loan_payoff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_exit() {
        let exit = value_exit(dec!(360000), dec!(6), dec!(2), dec!(3000000));
        assert_eq!(exit.exit_value, dec!(6000000));
        assert_eq!(exit.disposition_costs, dec!(120000));
        assert_eq!(exit.net_sale_proceeds, dec!(2880000));
        assert_eq!(exit.equity_at_sale, dec!(3000000));
    }

    #[test]
    fn test_zero_cap_rate_values_at_zero() {
        let exit = value_exit(dec!(360000), Decimal::ZERO, dec!(2), dec!(1000000));
        assert_eq!(exit.exit_value, Decimal::ZERO);
        assert_eq!(exit.net_sale_proceeds, dec!(-1000000));
        assert_eq!(exit.distributable(), Decimal::ZERO);
    }
}
