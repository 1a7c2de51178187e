use model_core::StatementRow;

/// One headline KPI card: latest value plus a context subtitle.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub title: &'static str,
    pub value: f64,
    pub display: String,
    pub subtitle: String,
}

/// The four headline metrics, computed from the two most recent periods
/// (the previous period falls back to the latest when only one exists):
/// revenue with YoY growth, net income with margin, cash on hand, and debt
/// with debt-to-equity. Empty history yields no cards.
pub fn headline_kpis(rows: &[StatementRow]) -> Vec<Kpi> {
    let Some(latest) = rows.last() else {
        return Vec::new();
    };
    let prev = if rows.len() > 1 {
        &rows[rows.len() - 2]
    } else {
        latest
    };

    let revenue_growth = if prev.revenue == 0.0 {
        0.0
    } else {
        (latest.revenue - prev.revenue) / prev.revenue
    };
    let net_margin = if latest.revenue == 0.0 {
        0.0
    } else {
        latest.net_income / latest.revenue
    };
    let debt_to_equity = if latest.total_equity == 0.0 {
        0.0
    } else {
        latest.debt / latest.total_equity
    };

    vec![
        Kpi {
            title: "Revenue",
            value: latest.revenue,
            display: fmt_money(latest.revenue),
            subtitle: format!("{:+.1}% YoY", revenue_growth * 100.0),
        },
        Kpi {
            title: "Net Income",
            value: latest.net_income,
            display: fmt_money(latest.net_income),
            subtitle: format!("{:.1}% margin", net_margin * 100.0),
        },
        Kpi {
            title: "Cash",
            value: latest.cash,
            display: fmt_money(latest.cash),
            subtitle: "On hand".to_string(),
        },
        Kpi {
            title: "Debt",
            value: latest.debt,
            display: fmt_money(latest.debt),
            subtitle: format!("{:.2}x D/E", debt_to_equity),
        },
    ]
}

/// `$1.5B` above one billion, `$900M` otherwise (millions, no decimals).
pub fn fmt_money(value: f64) -> String {
    if value > 1e9 {
        format!("${:.1}B", value / 1e9)
    } else {
        format!("${:.0}M", value / 1e6)
    }
}
