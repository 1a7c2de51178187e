//! Yahoo Finance data fetcher: the production [`FinancialDataProvider`].
//!
//! Statement history comes from the fundamentals-timeseries endpoint (one
//! call per statement type), company name and currency from the chart meta
//! block, and sector/industry from the quoteSummary assetProfile module. The
//! profile endpoint requires a session crumb, which is fetched lazily once
//! per client; profile failures degrade to default metadata instead of
//! failing the pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use model_core::{CompanyFinancials, CompanyMeta, FinancialDataProvider, ModelError};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

mod statements;

use statements::StatementTable;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

// Yahoo refuses the default reqwest user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// Six calendar years of history covers the five annual reports the
// provider serves for most symbols.
const LOOKBACK_SECS: i64 = 60 * 60 * 24 * 365 * 6;

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_COOKIE_URL)
    }

    /// Client against a non-default endpoint (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>, cookie_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            cookie_url: cookie_url.into(),
            crumb: Arc::new(Mutex::new(None)),
        }
    }

    /// Lazily fetch and cache the session crumb the profile endpoint wants.
    /// Returns None when the provider refuses; callers fall back to defaults.
    async fn crumb(&self) -> Option<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Some(crumb.clone());
        }

        // A crumb is only issued to a session that already has cookies.
        let _ = self.client.get(&self.cookie_url).send().await;

        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            tracing::debug!("crumb request refused: {}", response.status());
            return None;
        }
        let crumb = response.text().await.ok()?;
        if crumb.is_empty() || crumb.contains('{') {
            return None;
        }
        *cached = Some(crumb.clone());
        Some(crumb)
    }

    /// One fundamentals-timeseries call covering every candidate key for a
    /// statement type.
    async fn fetch_statement(
        &self,
        symbol: &str,
        keys: &[&'static str],
    ) -> Result<StatementTable, ModelError> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - LOOKBACK_SECS;
        let type_param = keys.join(",");
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.base_url, symbol
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("type", type_param.as_str()),
                ("period1", period1.to_string().as_str()),
                ("period2", period2.to_string().as_str()),
                ("merge", "false"),
                ("padTimeSeries", "false"),
            ])
            .send()
            .await
            .map_err(|e| ModelError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelError::Fetch(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::Fetch(e.to_string()))?;

        if let Some(error) = body.get("timeseries").and_then(|t| t.get("error")) {
            if !error.is_null() {
                let message = error
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("provider error");
                return Err(ModelError::Fetch(message.to_string()));
            }
        }

        let results = body
            .get("timeseries")
            .and_then(|t| t.get("result"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(StatementTable::from_results(&results))
    }

    /// Chart meta block: company name and trading currency. No crumb needed.
    async fn chart_meta(&self, symbol: &str) -> Option<Value> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().await.ok()?;
        body.get("chart")
            .and_then(|c| c.get("result"))
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("meta"))
            .cloned()
    }

    /// quoteSummary assetProfile module: sector and industry. Best effort.
    async fn asset_profile(&self, symbol: &str) -> Option<Value> {
        let crumb = self.crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("modules", "assetProfile"), ("crumb", crumb.as_str())])
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            tracing::debug!("assetProfile for {symbol} refused: {}", response.status());
            return None;
        }
        let body: Value = response.json().await.ok()?;
        body.get("quoteSummary")
            .and_then(|q| q.get("result"))
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("assetProfile"))
            .cloned()
    }

    async fn fetch_meta(&self, symbol: &str) -> CompanyMeta {
        let mut meta = CompanyMeta::unknown(symbol);

        if let Some(chart) = self.chart_meta(symbol).await {
            if let Some(name) = chart
                .get("shortName")
                .or_else(|| chart.get("longName"))
                .and_then(Value::as_str)
            {
                meta.name = name.to_string();
            }
            if let Some(currency) = chart.get("currency").and_then(Value::as_str) {
                meta.currency = currency.to_string();
            }
        } else {
            tracing::debug!("no chart metadata for {symbol}; using defaults");
        }

        if let Some(profile) = self.asset_profile(symbol).await {
            if let Some(sector) = profile.get("sector").and_then(Value::as_str) {
                meta.sector = sector.to_string();
            }
            if let Some(industry) = profile.get("industry").and_then(Value::as_str) {
                meta.industry = industry.to_string();
            }
        }

        meta
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FinancialDataProvider for YahooClient {
    async fn fetch_company(&self, ticker: &str) -> Result<CompanyFinancials, ModelError> {
        let symbol = ticker.trim().to_uppercase();
        tracing::info!("fetching statement history for {symbol}");

        let income_keys = statements::income_request_keys();
        let balance_keys = statements::balance_request_keys();
        let cash_flow_keys = statements::cash_flow_request_keys();
        let (income, balance, cash_flow) = tokio::join!(
            self.fetch_statement(&symbol, &income_keys),
            self.fetch_statement(&symbol, &balance_keys),
            self.fetch_statement(&symbol, &cash_flow_keys),
        );
        let rows = statements::normalize(&income?, &balance?, &cash_flow?);
        if rows.is_empty() {
            return Err(ModelError::DataUnavailable(symbol));
        }
        tracing::debug!("normalized {} periods for {symbol}", rows.len());

        let meta = self.fetch_meta(&symbol).await;
        Ok(CompanyFinancials { meta, rows })
    }

    fn provider_name(&self) -> &str {
        "yahoo-finance"
    }
}
