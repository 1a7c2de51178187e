//! Model generation API routes.
//!
//! One endpoint returns the full dashboard payload for a ticker (KPIs, all
//! chart series, and the classic statement table); a second renders the xlsx
//! workbook for download. Both run the whole pipeline per request.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use model_core::{CompanyFinancials, CompanyMeta, StatementRow, Timeline};
use projection_engine::{
    cash_flow_series, derive_drivers, headline_kpis, margin_series, performance_series,
};
use serde::Serialize;
use workbook_builder::{build_workbook, workbook_filename};

use crate::{ApiResponse, AppError, AppState};

#[cfg(test)]
#[path = "model_routes_tests.rs"]
mod model_routes_tests;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One KPI card on the dashboard header row.
#[derive(Serialize, utoipa::ToSchema)]
pub struct KpiCard {
    pub title: String,
    pub value: f64,
    pub display: String,
    pub subtitle: String,
}

/// Revenue vs. net income, one point per historical year.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PerformancePayload {
    pub years: Vec<String>,
    pub revenue: Vec<f64>,
    pub net_income: Vec<f64>,
}

/// Margin ratios, one point per historical year.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MarginsPayload {
    pub years: Vec<String>,
    pub gross: Vec<f64>,
    pub ebit: Vec<f64>,
    pub net: Vec<f64>,
}

/// Operating cash flow, capex, and free cash flow per historical year.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CashFlowPayload {
    pub years: Vec<String>,
    pub operating: Vec<f64>,
    pub capex: Vec<f64>,
    pub free: Vec<f64>,
}

/// One row of the classic model view table.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatementLine {
    pub label: String,
    pub values: Vec<f64>,
}

/// A titled block of statement lines.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatementSection {
    pub heading: String,
    pub lines: Vec<StatementLine>,
}

/// Everything the dashboard needs to render one company.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ModelResponse {
    pub ticker: String,
    pub company: CompanyMeta,
    pub kpis: Vec<KpiCard>,
    pub timeline: Timeline,
    pub performance: PerformancePayload,
    pub margins: MarginsPayload,
    pub cash_flow: CashFlowPayload,
    pub statements: Vec<StatementSection>,
}

pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/api/model/:ticker", get(get_model))
        .route("/api/model/:ticker/workbook", get(download_workbook))
}

/// Generate the dashboard payload for a ticker
#[utoipa::path(
    get,
    path = "/api/model/{ticker}",
    params(("ticker" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Generated model payload"),
        (status = 404, description = "No statements available for the ticker"),
        (status = 502, description = "Data provider failure")
    ),
    tag = "Model"
)]
pub(crate) async fn get_model(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiResponse<ModelResponse>>, AppError> {
    let ticker = ticker.trim().to_uppercase();
    let CompanyFinancials { meta, rows } = state.provider.fetch_company(&ticker).await?;

    // Charts and the classic table show history; the projection lives in
    // the workbook where it stays editable.
    let years: Vec<String> = rows
        .iter()
        .map(|r| r.period_end.format("%Y").to_string())
        .collect();

    let kpis = headline_kpis(&rows)
        .into_iter()
        .map(|k| KpiCard {
            title: k.title.to_string(),
            value: k.value,
            display: k.display,
            subtitle: k.subtitle,
        })
        .collect();

    let performance = performance_series(&rows);
    let margins = margin_series(&rows);
    let cash_flow = cash_flow_series(&rows);

    let response = ModelResponse {
        ticker: ticker.clone(),
        company: meta,
        kpis,
        timeline: Timeline::from_rows(&rows),
        performance: PerformancePayload {
            years: years.clone(),
            revenue: performance.revenue,
            net_income: performance.net_income,
        },
        margins: MarginsPayload {
            years: years.clone(),
            gross: margins.gross,
            ebit: margins.ebit,
            net: margins.net,
        },
        cash_flow: CashFlowPayload {
            years,
            operating: cash_flow.operating,
            capex: cash_flow.capex,
            free: cash_flow.free_cash_flow,
        },
        statements: statement_sections(&rows),
    };
    tracing::info!("generated model payload for {ticker}");

    Ok(Json(ApiResponse::success(response)))
}

/// Download the generated xlsx workbook
#[utoipa::path(
    get,
    path = "/api/model/{ticker}/workbook",
    params(("ticker" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "The linked two-sheet workbook"),
        (status = 404, description = "No statements available for the ticker"),
        (status = 502, description = "Data provider failure")
    ),
    tag = "Model"
)]
pub(crate) async fn download_workbook(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Response, AppError> {
    let ticker = ticker.trim().to_uppercase();
    let company = state.provider.fetch_company(&ticker).await?;

    let drivers = derive_drivers(&company.rows);
    let timeline = Timeline::from_rows(&company.rows);
    let buffer = build_workbook(&company.meta, &company.rows, &drivers, &timeline)?;

    let filename = workbook_filename(&ticker);
    tracing::info!("built {filename} ({} bytes)", buffer.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        buffer,
    )
        .into_response())
}

/// The line items the classic view shows, in statement order. Subtotals that
/// only exist as workbook formulas are left out.
fn statement_sections(rows: &[StatementRow]) -> Vec<StatementSection> {
    let line = |label: &str, get: fn(&StatementRow) -> f64| StatementLine {
        label: label.to_string(),
        values: rows.iter().map(get).collect(),
    };

    vec![
        StatementSection {
            heading: "INCOME STATEMENT".to_string(),
            lines: vec![
                line("Revenue", |r| r.revenue),
                line("COGS", |r| r.cogs),
                line("SG&A", |r| r.sga),
                line("D&A", |r| r.depreciation_amortization),
                line("Interest", |r| r.interest),
                line("Net Income", |r| r.net_income),
            ],
        },
        StatementSection {
            heading: "BALANCE SHEET".to_string(),
            lines: vec![
                line("Cash", |r| r.cash),
                line("AR", |r| r.accounts_receivable),
                line("PP&E", |r| r.ppe),
                line("Total Assets", |r| r.total_assets),
                line("AP", |r| r.accounts_payable),
                line("Debt", |r| r.debt),
                line("Total Liab", |r| r.total_liabilities),
                line("Total Equity", |r| r.total_equity),
            ],
        },
    ]
}
