//! Alias-based normalization of the provider's fundamentals-timeseries
//! responses into [`StatementRow`]s.
//!
//! The provider names the same line item differently across symbols and
//! statement vintages, so every normalized field carries an explicit ordered
//! list of candidate keys; the first key present in the response wins, even
//! when it has no value for a given period. Fields absent under every key are
//! zero in every period.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use model_core::StatementRow;
use serde_json::Value;

struct Field {
    keys: &'static [&'static str],
    set: fn(&mut StatementRow, f64),
}

const INCOME_FIELDS: &[Field] = &[
    Field {
        keys: &["annualTotalRevenue", "annualOperatingRevenue"],
        set: |r, v| r.revenue = v,
    },
    Field {
        keys: &["annualCostOfRevenue", "annualReconciledCostOfRevenue"],
        set: |r, v| r.cogs = v,
    },
    Field {
        keys: &[
            "annualSellingGeneralAndAdministration",
            "annualOperatingExpense",
        ],
        set: |r, v| r.sga = v,
    },
    Field {
        keys: &[
            "annualInterestExpense",
            "annualNetNonOperatingInterestIncomeExpense",
        ],
        set: |r, v| r.interest = v,
    },
    Field {
        keys: &["annualTaxProvision"],
        set: |r, v| r.tax = v,
    },
    Field {
        keys: &["annualNetIncome", "annualNetIncomeCommonStockholders"],
        set: |r, v| r.net_income = v,
    },
];

const BALANCE_FIELDS: &[Field] = &[
    Field {
        keys: &[
            "annualCashAndCashEquivalents",
            "annualCashCashEquivalentsAndShortTermInvestments",
        ],
        set: |r, v| r.cash = v,
    },
    Field {
        keys: &[
            "annualReceivables",
            "annualAccountsReceivable",
            "annualNetReceivables",
        ],
        set: |r, v| r.accounts_receivable = v,
    },
    Field {
        keys: &["annualNetPPE", "annualGrossPPE"],
        set: |r, v| r.ppe = v,
    },
    Field {
        keys: &["annualTotalAssets"],
        set: |r, v| r.total_assets = v,
    },
    Field {
        keys: &["annualAccountsPayable", "annualPayables"],
        set: |r, v| r.accounts_payable = v,
    },
    Field {
        keys: &["annualTotalDebt", "annualLongTermDebt"],
        set: |r, v| r.debt = v,
    },
    Field {
        keys: &[
            "annualTotalLiabilitiesNetMinorityInterest",
            "annualTotalLiabilities",
        ],
        set: |r, v| r.total_liabilities = v,
    },
    Field {
        keys: &["annualCommonStock", "annualShareIssued"],
        set: |r, v| r.share_capital = v,
    },
    Field {
        keys: &["annualRetainedEarnings"],
        set: |r, v| r.retained_earnings = v,
    },
    Field {
        keys: &[
            "annualStockholdersEquity",
            "annualTotalEquityGrossMinorityInterest",
        ],
        set: |r, v| r.total_equity = v,
    },
];

const CASH_FLOW_FIELDS: &[Field] = &[
    Field {
        keys: &[
            "annualDepreciationAndAmortization",
            "annualDepreciationAmortizationDepletion",
        ],
        set: |r, v| r.depreciation_amortization = v,
    },
    Field {
        keys: &["annualCapitalExpenditure"],
        set: |r, v| r.capex = v,
    },
    Field {
        keys: &[
            "annualOperatingCashFlow",
            "annualCashFlowFromContinuingOperatingActivities",
        ],
        set: |r, v| r.operating_cash_flow = v,
    },
];

fn request_keys(fields: &[Field]) -> Vec<&'static str> {
    fields.iter().flat_map(|f| f.keys.iter().copied()).collect()
}

pub(crate) fn income_request_keys() -> Vec<&'static str> {
    request_keys(INCOME_FIELDS)
}

pub(crate) fn balance_request_keys() -> Vec<&'static str> {
    request_keys(BALANCE_FIELDS)
}

pub(crate) fn cash_flow_request_keys() -> Vec<&'static str> {
    request_keys(CASH_FLOW_FIELDS)
}

/// One statement type's reported series, keyed by provider field name.
pub(crate) struct StatementTable {
    values: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    /// Build the per-key series map from the provider's `result` array.
    ///
    /// A key reported with no parseable points still registers with an empty
    /// series, so alias resolution prefers it over later candidates, the
    /// same as a present-but-empty column upstream. Null points and points
    /// without a reported value are skipped.
    pub(crate) fn from_results(results: &[Value]) -> Self {
        let mut values: HashMap<String, BTreeMap<NaiveDate, f64>> = HashMap::new();

        for result in results {
            let Some(key) = result
                .get("meta")
                .and_then(|m| m.get("type"))
                .and_then(|t| t.get(0))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let series = values.entry(key.to_string()).or_default();

            let Some(points) = result.get(key).and_then(Value::as_array) else {
                continue;
            };
            for point in points {
                let Some(date) = point
                    .get("asOfDate")
                    .and_then(Value::as_str)
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                else {
                    continue;
                };
                let Some(raw) = point
                    .get("reportedValue")
                    .and_then(|v| v.get("raw"))
                    .and_then(Value::as_f64)
                else {
                    continue;
                };
                series.insert(date, raw);
            }
        }

        Self { values }
    }

    fn series(&self, keys: &[&str]) -> Option<&BTreeMap<NaiveDate, f64>> {
        keys.iter().find_map(|k| self.values.get(*k))
    }

    /// First-present-alias value for a period, zero when the alias series
    /// lacks the date or no alias is present at all.
    fn value(&self, keys: &[&str], date: NaiveDate) -> f64 {
        self.series(keys)
            .and_then(|s| s.get(&date))
            .copied()
            .unwrap_or(0.0)
    }

    /// All report dates in this table, ascending.
    pub(crate) fn period_ends(&self) -> Vec<NaiveDate> {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for series in self.values.values() {
            dates.extend(series.keys().copied());
        }
        dates.into_iter().collect()
    }
}

/// Join the three statements into normalized rows.
///
/// The income statement defines the period spine; balance and cash-flow
/// values join by exact report date and contribute zero where absent. The
/// residual plugs are derived last: Other Assets absorbs whatever of Total
/// Assets the named asset lines don't explain, Other Liabilities likewise.
pub(crate) fn normalize(
    income: &StatementTable,
    balance: &StatementTable,
    cash_flow: &StatementTable,
) -> Vec<StatementRow> {
    income
        .period_ends()
        .into_iter()
        .map(|period_end| {
            let mut row = StatementRow {
                period_end,
                ..Default::default()
            };
            for field in INCOME_FIELDS {
                (field.set)(&mut row, income.value(field.keys, period_end));
            }
            for field in BALANCE_FIELDS {
                (field.set)(&mut row, balance.value(field.keys, period_end));
            }
            for field in CASH_FLOW_FIELDS {
                (field.set)(&mut row, cash_flow.value(field.keys, period_end));
            }

            row.other_assets = row.total_assets - (row.cash + row.accounts_receivable + row.ppe);
            row.other_liabilities = row.total_liabilities - (row.accounts_payable + row.debt);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(key: &str, points: Vec<Value>) -> Value {
        json!({
            "meta": { "symbol": ["TEST"], "type": [key] },
            "timestamp": [],
            key: points,
        })
    }

    fn point(date: &str, raw: f64) -> Value {
        json!({
            "asOfDate": date,
            "periodType": "12M",
            "currencyCode": "USD",
            "reportedValue": { "raw": raw, "fmt": null },
        })
    }

    fn empty() -> StatementTable {
        StatementTable::from_results(&[])
    }

    #[test]
    fn test_first_present_alias_wins() {
        let income = StatementTable::from_results(&[
            result("annualTotalRevenue", vec![point("2023-09-30", 100.0)]),
            result("annualOperatingRevenue", vec![point("2023-09-30", 999.0)]),
        ]);
        let rows = normalize(&income, &empty(), &empty());
        assert_eq!(rows[0].revenue, 100.0);
    }

    #[test]
    fn test_later_alias_used_when_first_absent() {
        let income = StatementTable::from_results(&[
            result("annualTotalRevenue", vec![point("2023-09-30", 100.0)]),
            result("annualOperatingExpense", vec![point("2023-09-30", 40.0)]),
        ]);
        let rows = normalize(&income, &empty(), &empty());
        assert_eq!(rows[0].sga, 40.0);
    }

    #[test]
    fn test_present_but_empty_alias_still_wins() {
        // The preferred key exists with no values; the fallback must NOT be
        // consulted, matching a present-but-empty column.
        let income = StatementTable::from_results(&[
            result("annualTotalRevenue", vec![point("2023-09-30", 100.0)]),
            result("annualSellingGeneralAndAdministration", vec![]),
            result("annualOperatingExpense", vec![point("2023-09-30", 40.0)]),
        ]);
        let rows = normalize(&income, &empty(), &empty());
        assert_eq!(rows[0].sga, 0.0);
    }

    #[test]
    fn test_absent_fields_default_to_zero() {
        let income =
            StatementTable::from_results(&[result("annualTotalRevenue", vec![point("2023-09-30", 100.0)])]);
        let rows = normalize(&income, &empty(), &empty());
        assert_eq!(rows[0].cogs, 0.0);
        assert_eq!(rows[0].tax, 0.0);
        assert_eq!(rows[0].cash, 0.0);
    }

    #[test]
    fn test_income_statement_defines_the_spine() {
        let income = StatementTable::from_results(&[result(
            "annualTotalRevenue",
            vec![point("2022-09-30", 90.0), point("2023-09-30", 100.0)],
        )]);
        // Balance sheet covers only one of the two periods plus an extra date
        // that must not create a row.
        let balance = StatementTable::from_results(&[result(
            "annualCashAndCashEquivalents",
            vec![point("2023-09-30", 25.0), point("2021-09-30", 11.0)],
        )]);
        let rows = normalize(&income, &balance, &empty());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cash, 0.0);
        assert_eq!(rows[1].cash, 25.0);
    }

    #[test]
    fn test_rows_sorted_ascending_regardless_of_response_order() {
        let income = StatementTable::from_results(&[result(
            "annualTotalRevenue",
            vec![point("2023-09-30", 100.0), point("2021-09-30", 70.0), point("2022-09-30", 90.0)],
        )]);
        let rows = normalize(&income, &empty(), &empty());
        let years: Vec<String> = rows.iter().map(|r| r.label()).collect();
        assert_eq!(years, vec!["2021A", "2022A", "2023A"]);
    }

    #[test]
    fn test_residual_plugs() {
        let income =
            StatementTable::from_results(&[result("annualTotalRevenue", vec![point("2023-09-30", 100.0)])]);
        let balance = StatementTable::from_results(&[
            result("annualCashAndCashEquivalents", vec![point("2023-09-30", 50.0)]),
            result("annualReceivables", vec![point("2023-09-30", 20.0)]),
            result("annualNetPPE", vec![point("2023-09-30", 100.0)]),
            result("annualTotalAssets", vec![point("2023-09-30", 200.0)]),
            result("annualAccountsPayable", vec![point("2023-09-30", 15.0)]),
            result("annualTotalDebt", vec![point("2023-09-30", 60.0)]),
            result(
                "annualTotalLiabilitiesNetMinorityInterest",
                vec![point("2023-09-30", 90.0)],
            ),
        ]);
        let rows = normalize(&income, &balance, &empty());
        let row = &rows[0];

        assert_eq!(row.other_assets, 200.0 - (50.0 + 20.0 + 100.0));
        assert_eq!(row.other_liabilities, 90.0 - (15.0 + 60.0));
        // The residual construction makes the sums hold exactly.
        assert_eq!(
            row.total_assets,
            row.cash + row.accounts_receivable + row.ppe + row.other_assets
        );
        assert_eq!(
            row.total_liabilities,
            row.accounts_payable + row.debt + row.other_liabilities
        );
    }

    #[test]
    fn test_null_points_and_malformed_values_skipped() {
        let income = StatementTable::from_results(&[result(
            "annualTotalRevenue",
            vec![
                Value::Null,
                json!({ "asOfDate": "2023-09-30" }),
                json!({ "asOfDate": "not-a-date", "reportedValue": { "raw": 5.0 } }),
                point("2022-09-30", 90.0),
            ],
        )]);
        let rows = normalize(&income, &empty(), &empty());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].revenue, 90.0);
    }

    #[test]
    fn test_empty_income_statement_yields_no_rows() {
        assert!(normalize(&empty(), &empty(), &empty()).is_empty());
    }
}
