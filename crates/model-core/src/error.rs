use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// The provider recognized nothing for the symbol (empty income statement).
    #[error("no financial statements available for {0}")]
    DataUnavailable(String),

    /// Any other provider-side failure: transport, HTTP status, or an error
    /// object in the response body.
    #[error("data fetch failed: {0}")]
    Fetch(String),

    /// Spreadsheet writer failure.
    #[error("workbook generation failed: {0}")]
    Workbook(String),
}
