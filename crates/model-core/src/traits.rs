use async_trait::async_trait;

use crate::error::ModelError;
use crate::types::CompanyFinancials;

/// A market-data source able to produce normalized statement history for a
/// ticker. The pipeline only ever talks to this trait; the production
/// implementation lives in `yahoo-client` and tests substitute fixtures.
#[async_trait]
pub trait FinancialDataProvider: Send + Sync {
    /// Fetch income/balance/cash-flow history plus company metadata.
    ///
    /// Rows come back ascending by period. Fails with
    /// [`ModelError::DataUnavailable`] when the provider has no income
    /// statement for the symbol, [`ModelError::Fetch`] for anything else.
    async fn fetch_company(&self, ticker: &str) -> Result<CompanyFinancials, ModelError>;

    /// Provider name for logging.
    fn provider_name(&self) -> &str;
}
