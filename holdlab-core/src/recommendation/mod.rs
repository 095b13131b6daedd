//! Recommendation-to-position adapter.
//!
//! An alternate entry point to the indicator pipeline: irregular, externally
//! ranked recommendation batches become the same continuous daily position
//! matrix. The steps, in order:
//!
//! 1. parse stored records ([`record`])
//! 2. align each record to a period end and keep the latest record per period
//!    ([`align`], [`adapter`])
//! 3. rank by priority, truncate to capacity, pivot, forward-fill to daily
//! 4. mask to the trading window ([`window`])
//!
//! The final one-day backward shift is applied by the recommendation strategy.

pub mod adapter;
pub mod align;
pub mod record;
pub mod store;
pub mod window;

pub use adapter::{PeriodBatch, RecommendationAdapter};
pub use align::PeriodAlignment;
pub use record::{
    parse_records, Candidate, InstrumentCode, RawCandidate, RawRecommendation,
    RecommendationRecord,
};
pub use store::{JsonRecommendationStore, RecommendationStore, StoreError};
pub use window::TradingWindow;
