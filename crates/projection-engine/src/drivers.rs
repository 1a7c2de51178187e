use model_core::StatementRow;

/// Effective tax rate substituted when a period's pre-tax income is zero.
pub const DEFAULT_TAX_RATE: f64 = 0.21;

/// One historical period's six driver ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverRatios {
    pub revenue_growth: f64,
    pub cogs_of_revenue: f64,
    pub sga_of_revenue: f64,
    pub tax_rate: f64,
    pub da_of_ppe: f64,
    pub capex_of_revenue: f64,
}

/// Derive the driver ratios for every historical period, in period order.
///
/// Revenue growth is zero for the first period and whenever the previous
/// period's revenue is zero. The tax rate divides the tax provision by
/// pre-tax income (revenue − COGS − SG&A − interest) and falls back to
/// [`DEFAULT_TAX_RATE`] when that denominator is zero. All other ratios
/// substitute zero on a zero denominator.
pub fn derive_drivers(rows: &[StatementRow]) -> Vec<DriverRatios> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let revenue_growth = if i == 0 {
                0.0
            } else {
                let prev = rows[i - 1].revenue;
                if prev == 0.0 {
                    0.0
                } else {
                    row.revenue / prev - 1.0
                }
            };

            let pre_tax = row.revenue - row.cogs - row.sga - row.interest;
            let tax_rate = if pre_tax == 0.0 {
                DEFAULT_TAX_RATE
            } else {
                row.tax / pre_tax
            };

            DriverRatios {
                revenue_growth,
                cogs_of_revenue: ratio(row.cogs, row.revenue),
                sga_of_revenue: ratio(row.sga, row.revenue),
                tax_rate,
                da_of_ppe: ratio(row.depreciation_amortization, row.ppe),
                capex_of_revenue: ratio(row.capex.abs(), row.revenue),
            }
        })
        .collect()
}

/// The flat-forward assumption: every projection period reuses the last
/// historical period's ratios unchanged.
pub fn flat_forward(drivers: &[DriverRatios]) -> Option<DriverRatios> {
    drivers.last().copied()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
