use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of synthesized projection periods appended after the historical ones.
pub const PROJECTION_YEARS: usize = 5;

/// One fiscal period's normalized statement values.
///
/// Every numeric field defaults to zero when the provider omits it, so a row
/// is always fully populated and downstream math never deals with optionals.
/// `other_assets` / `other_liabilities` are residual plugs computed by the
/// fetcher, not provider fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatementRow {
    pub period_end: NaiveDate,

    // Income statement
    pub revenue: f64,
    pub cogs: f64,
    pub sga: f64,
    pub interest: f64,
    pub tax: f64,
    pub net_income: f64,

    // Balance sheet
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

    // Cash flow
    pub depreciation_amortization: f64,
    pub capex: f64,
    pub operating_cash_flow: f64,
}

impl StatementRow {
    /// Fiscal-period label used in headers and charts, e.g. `2023A`.
    pub fn label(&self) -> String {
        format!("{}A", self.period_end.format("%Y"))
    }
}

/// Descriptive company metadata shown in headers and the workbook title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyMeta {
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub currency: String,
}

impl CompanyMeta {
    /// Fallback metadata when the provider has no profile for the symbol.
    pub fn unknown(ticker: &str) -> Self {
        Self {
            name: ticker.to_string(),
            sector: "Unknown".to_string(),
            industry: "Unknown".to_string(),
            currency: "USD".to_string(),
        }
    }
}

/// The unit returned by a data provider: metadata plus the normalized
/// statement rows, ascending by `period_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyFinancials {
    pub meta: CompanyMeta,
    pub rows: Vec<StatementRow>,
}

/// Period labels for the model grid: sorted historical labels (`2023A`)
/// followed by [`PROJECTION_YEARS`] synthesized future labels (`2024E`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Timeline {
    pub historical: Vec<String>,
    pub projected: Vec<String>,
}

impl Timeline {
    /// Build the timeline from rows already sorted ascending by period.
    /// An empty row slice yields an empty timeline.
    pub fn from_rows(rows: &[StatementRow]) -> Self {
        let historical: Vec<String> = rows.iter().map(StatementRow::label).collect();
        let projected = match rows.last() {
            Some(last) => {
                let last_year = last.period_end.year();
                (1..=PROJECTION_YEARS as i32)
                    .map(|i| format!("{}E", last_year + i))
                    .collect()
            }
            None => Vec::new(),
        };
        Self {
            historical,
            projected,
        }
    }

    /// All labels in grid order: historical then projected.
    pub fn all(&self) -> Vec<String> {
        self.historical
            .iter()
            .chain(self.projected.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32) -> StatementRow {
        StatementRow {
            period_end: NaiveDate::from_ymd_opt(year, 9, 30).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_row_label_uses_fiscal_year_with_actual_suffix() {
        assert_eq!(row(2023).label(), "2023A");
    }

    #[test]
    fn test_timeline_appends_five_projection_years() {
        let rows = vec![row(2021), row(2022), row(2023)];
        let timeline = Timeline::from_rows(&rows);

        assert_eq!(timeline.historical, vec!["2021A", "2022A", "2023A"]);
        assert_eq!(
            timeline.projected,
            vec!["2024E", "2025E", "2026E", "2027E", "2028E"]
        );
        assert_eq!(timeline.all().len(), 8);
        assert_eq!(timeline.all()[3], "2024E");
    }

    #[test]
    fn test_timeline_empty_rows_yield_empty_timeline() {
        let timeline = Timeline::from_rows(&[]);
        assert!(timeline.historical.is_empty());
        assert!(timeline.projected.is_empty());
    }

    #[test]
    fn test_unknown_meta_defaults() {
        let meta = CompanyMeta::unknown("AAPL");
        assert_eq!(meta.name, "AAPL");
        assert_eq!(meta.sector, "Unknown");
        assert_eq!(meta.industry, "Unknown");
        assert_eq!(meta.currency, "USD");
    }
}
