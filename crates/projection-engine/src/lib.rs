//! Pure computation for the three-statement model: driver ratios derived from
//! history, the five-year projection, headline KPIs and the chart series the
//! dashboard plots. No I/O here; everything operates on normalized
//! [`model_core::StatementRow`]s.

pub mod drivers;
pub mod kpis;
pub mod project;
pub mod series;

pub use drivers::*;
pub use kpis::*;
pub use project::*;
pub use series::*;
