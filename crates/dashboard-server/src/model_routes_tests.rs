#[cfg(test)]
mod tests {
    use super::super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use model_core::{FinancialDataProvider, ModelError};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::{build_router, AppState};

    struct StubProvider;

    #[async_trait]
    impl FinancialDataProvider for StubProvider {
        async fn fetch_company(&self, ticker: &str) -> Result<CompanyFinancials, ModelError> {
            match ticker {
                "EMPTY" => Err(ModelError::DataUnavailable(ticker.to_string())),
                "DOWN" => Err(ModelError::Fetch("HTTP 500 Internal Server Error".to_string())),
                _ => Ok(CompanyFinancials {
                    meta: CompanyMeta {
                        name: "Test Corp".to_string(),
                        sector: "Technology".to_string(),
                        industry: "Software".to_string(),
                        currency: "USD".to_string(),
                    },
                    rows: fixture_rows(),
                }),
            }
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn fixture_rows() -> Vec<StatementRow> {
        [(2021, 80.0e9), (2022, 90.0e9), (2023, 100.0e9)]
            .into_iter()
            .map(|(year, revenue)| StatementRow {
                period_end: NaiveDate::from_ymd_opt(year, 9, 30).unwrap(),
                revenue,
                cogs: revenue * 0.4,
                sga: revenue * 0.2,
                interest: 0.5e9,
                tax: revenue * 0.06,
                net_income: revenue * 0.25,
                cash: 50.0e9,
                accounts_receivable: 20.0e9,
                ppe: 80.0e9,
                total_assets: 200.0e9,
                accounts_payable: 15.0e9,
                debt: 55.0e9,
                total_liabilities: 90.0e9,
                share_capital: 30.0e9,
                retained_earnings: 80.0e9,
                total_equity: 110.0e9,
                depreciation_amortization: 8.0e9,
                capex: -12.0e9,
                operating_cash_flow: 30.0e9,
                ..Default::default()
            })
            .collect()
    }

    fn app_state() -> AppState {
        AppState {
            provider: Arc::new(StubProvider),
        }
    }

    #[tokio::test]
    async fn test_model_payload_contents() {
        let Json(body) = get_model(State(app_state()), Path("test".to_string()))
            .await
            .unwrap();

        assert!(body.success);
        let data = body.data.unwrap();

        assert_eq!(data.ticker, "TEST");
        assert_eq!(data.company.name, "Test Corp");
        assert_eq!(data.company.sector, "Technology");

        assert_eq!(data.timeline.historical, vec!["2021A", "2022A", "2023A"]);
        assert_eq!(data.timeline.projected.len(), 5);
        assert_eq!(data.timeline.projected[0], "2024E");
        assert_eq!(data.timeline.projected[4], "2028E");

        // Chart series cover history only, with plain calendar years.
        assert_eq!(data.performance.years, vec!["2021", "2022", "2023"]);
        assert_eq!(data.performance.revenue, vec![80.0e9, 90.0e9, 100.0e9]);
        assert_eq!(data.performance.net_income[2], 25.0e9);
        assert_eq!(data.margins.gross.len(), 3);
        assert_eq!(data.cash_flow.free[0], 30.0e9 - 12.0e9);
    }

    #[tokio::test]
    async fn test_kpi_cards() {
        let Json(body) = get_model(State(app_state()), Path("TEST".to_string()))
            .await
            .unwrap();
        let kpis = body.data.unwrap().kpis;

        let titles: Vec<&str> = kpis.iter().map(|k| k.title.as_str()).collect();
        assert_eq!(titles, vec!["Revenue", "Net Income", "Cash", "Debt"]);

        assert_eq!(kpis[0].value, 100.0e9);
        assert_eq!(kpis[0].display, "$100.0B");
        assert_eq!(kpis[0].subtitle, "+11.1% YoY");
        assert_eq!(kpis[1].subtitle, "25.0% margin");
        assert_eq!(kpis[2].subtitle, "On hand");
        assert_eq!(kpis[3].subtitle, "0.50x D/E");
    }

    #[tokio::test]
    async fn test_classic_statement_sections() {
        let Json(body) = get_model(State(app_state()), Path("TEST".to_string()))
            .await
            .unwrap();
        let statements = body.data.unwrap().statements;

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].heading, "INCOME STATEMENT");
        assert_eq!(statements[1].heading, "BALANCE SHEET");

        let is_labels: Vec<&str> = statements[0].lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(is_labels, vec!["Revenue", "COGS", "SG&A", "D&A", "Interest", "Net Income"]);

        let bs_labels: Vec<&str> = statements[1].lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            bs_labels,
            vec!["Cash", "AR", "PP&E", "Total Assets", "AP", "Debt", "Total Liab", "Total Equity"]
        );

        assert_eq!(statements[0].lines[0].values, vec![80.0e9, 90.0e9, 100.0e9]);
    }

    #[tokio::test]
    async fn test_unknown_ticker_maps_to_not_found() {
        let Err(err) = get_model(State(app_state()), Path("empty".to_string())).await else {
            panic!("expected an error for an unknown ticker");
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("EMPTY"));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_bad_gateway() {
        let Err(err) = get_model(State(app_state()), Path("DOWN".to_string())).await else {
            panic!("expected an error when the provider is down");
        };

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_workbook_download_headers_and_body() {
        let response = download_workbook(State(app_state()), Path("test".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].clone();
        let disposition = response.headers()[header::CONTENT_DISPOSITION].clone();
        assert_eq!(content_type, XLSX_CONTENT_TYPE);
        assert!(disposition.to_str().unwrap().contains("TEST_Model.xlsx"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_router_routes_and_fallback() {
        let app = build_router(app_state());

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let model = app
            .clone()
            .oneshot(Request::builder().uri("/api/model/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(model.status(), StatusCode::OK);

        let missing = app
            .oneshot(
                Request::builder()
                    .uri("/no-such-asset.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
