use model_core::StatementRow;

/// Revenue and net income per historical period (dual-axis view).
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSeries {
    pub revenue: Vec<f64>,
    pub net_income: Vec<f64>,
}

pub fn performance_series(rows: &[StatementRow]) -> PerformanceSeries {
    PerformanceSeries {
        revenue: rows.iter().map(|r| r.revenue).collect(),
        net_income: rows.iter().map(|r| r.net_income).collect(),
    }
}

/// Gross, EBIT and net margins per historical period, as fractions.
/// Periods with zero revenue contribute 0.0 (charts cannot plot a
/// division by zero).
#[derive(Debug, Clone, PartialEq)]
pub struct MarginSeries {
    pub gross: Vec<f64>,
    pub ebit: Vec<f64>,
    pub net: Vec<f64>,
}

pub fn margin_series(rows: &[StatementRow]) -> MarginSeries {
    let of_revenue = |row: &StatementRow, numerator: f64| {
        if row.revenue == 0.0 {
            0.0
        } else {
            numerator / row.revenue
        }
    };

    MarginSeries {
        gross: rows
            .iter()
            .map(|r| of_revenue(r, r.revenue - r.cogs))
            .collect(),
        ebit: rows
            .iter()
            .map(|r| of_revenue(r, r.revenue - r.cogs - r.sga - r.depreciation_amortization))
            .collect(),
        net: rows.iter().map(|r| of_revenue(r, r.net_income)).collect(),
    }
}

/// Operating cash flow, capex (negative as reported) and free cash flow
/// (their sum) per historical period.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSeries {
    pub operating: Vec<f64>,
    pub capex: Vec<f64>,
    pub free_cash_flow: Vec<f64>,
}

pub fn cash_flow_series(rows: &[StatementRow]) -> CashFlowSeries {
    CashFlowSeries {
        operating: rows.iter().map(|r| r.operating_cash_flow).collect(),
        capex: rows.iter().map(|r| r.capex).collect(),
        free_cash_flow: rows
            .iter()
            .map(|r| r.operating_cash_flow + r.capex)
            .collect(),
    }
}
