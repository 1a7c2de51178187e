use model_core::StatementRow;

use crate::drivers::DriverRatios;

/// One projection period's computed line items.
///
/// Aggregates (`total_assets`, `total_liabilities`, `total_equity`, `check`)
/// are always recomputed from components, never carried forward. Cash is held
/// flat rather than solved as the balancing plug, so `check` drifts by
/// cumulative projected net income; this mirrors the spreadsheet formulas
/// (the sheet stays internally consistent, not balanced).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPeriod {
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub sga: f64,
    pub ebitda: f64,
    pub depreciation_amortization: f64,
    pub ebit: f64,
    pub interest: f64,
    pub ebt: f64,
    pub tax: f64,
    pub net_income: f64,

    pub cash: f64,
    pub accounts_receivable: f64,
    pub ppe: f64,
    pub other_assets: f64,
    pub total_assets: f64,
    pub accounts_payable: f64,
    pub debt: f64,
    pub other_liabilities: f64,
    pub total_liabilities: f64,
    pub share_capital: f64,
    pub retained_earnings: f64,
    pub total_equity: f64,
    pub check: f64,
}

/// Project `periods` future periods from the last historical row, top-down:
/// revenue compounds by the growth ratio, expense lines follow their
/// revenue ratios, interest is zero for every projected period, D&A is held
/// flat, and on the balance sheet only retained earnings moves (by net
/// income). An empty history yields no projections.
pub fn project(rows: &[StatementRow], ratios: DriverRatios, periods: usize) -> Vec<ProjectedPeriod> {
    let Some(last) = rows.last() else {
        return Vec::new();
    };

    // Flat balance-sheet lines, fixed at the final historical values.
    let cash = last.cash;
    let accounts_receivable = last.accounts_receivable;
    let ppe = last.ppe;
    let other_assets = last.other_assets;
    let accounts_payable = last.accounts_payable;
    let debt = last.debt;
    let other_liabilities = last.other_liabilities;
    let share_capital = last.share_capital;

    let mut prev_revenue = last.revenue;
    let mut prev_da = last.depreciation_amortization;
    let mut prev_retained = last.retained_earnings;

    let mut out = Vec::with_capacity(periods);
    for _ in 0..periods {
        let revenue = prev_revenue * (1.0 + ratios.revenue_growth);
        let cogs = revenue * ratios.cogs_of_revenue;
        let gross_profit = revenue - cogs;
        let sga = revenue * ratios.sga_of_revenue;
        let ebitda = gross_profit - sga;
        let depreciation_amortization = prev_da;
        let ebit = ebitda - depreciation_amortization;
        let interest = 0.0;
        let ebt = ebit - interest;
        let tax = ebt * ratios.tax_rate;
        let net_income = ebt - tax;

        let retained_earnings = prev_retained + net_income;
        let total_assets = cash + accounts_receivable + ppe + other_assets;
        let total_liabilities = accounts_payable + debt + other_liabilities;
        let total_equity = share_capital + retained_earnings;
        let check = total_assets - (total_liabilities + total_equity);

        out.push(ProjectedPeriod {
            revenue,
            cogs,
            gross_profit,
            sga,
            ebitda,
            depreciation_amortization,
            ebit,
            interest,
            ebt,
            tax,
            net_income,
            cash,
            accounts_receivable,
            ppe,
            other_assets,
            total_assets,
            accounts_payable,
            debt,
            other_liabilities,
            total_liabilities,
            share_capital,
            retained_earnings,
            total_equity,
            check,
        });

        prev_revenue = revenue;
        prev_da = depreciation_amortization;
        prev_retained = retained_earnings;
    }
    out
}
