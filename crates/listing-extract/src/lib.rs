//! # Listing Extract
//!
//! Turns free-text car listings into structured JSON records with a
//! text-generation model, behind the `listing_guard` safety filter.
//!
//! ```text
//! description ──► safety gate ──► sanitize ──► instructions (+ image hint)
//!                                                   │
//!                     ┌─────────────────────────────┘
//!                     ▼
//!              GuardedCall: screen ► call model ► screen ► parse
//!                     │         ▲                          │
//!                     │         └── corrective message ◄───┤ unsafe / malformed
//!                     ▼
//!               ListingRecord {"car": {...}}
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use listing_extract::{ChatCompletionsOracle, ListingPipeline, OracleConfig, PipelineConfig};
//! use listing_guard::SafetyFilter;
//! use std::sync::Arc;
//!
//! # async fn run() -> listing_extract::Result<()> {
//! let oracle = ChatCompletionsOracle::new(
//!     OracleConfig::azure("https://cars.openai.azure.com", "gpt-4o-mini", "key"),
//! )?;
//! let pipeline = ListingPipeline::new(
//!     Arc::new(oracle),
//!     SafetyFilter::default(),
//!     PipelineConfig::default(),
//! );
//!
//! let record = pipeline
//!     .process_description_to_record("Blue 2015 Ford Fusion, 2.0L, 80k miles.", None)
//!     .await?;
//! println!("{}", record.to_pretty_json()?);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod guarded;
pub mod message;
pub mod oracle;
pub mod pipeline;
pub mod record;
pub mod repair;

pub use classifier::{FixedClassifier, ImageClassifier, UNKNOWN_CATEGORY};
pub use config::{ClassifierConfig, OracleConfig, PipelineConfig};
pub use error::{ExtractError, Result};
pub use guarded::GuardedCall;
pub use message::{ChatMessage, Role};
pub use oracle::{ChatCompletionsOracle, Oracle};
pub use pipeline::ListingPipeline;
pub use record::{CarListing, ListingRecord};
pub use repair::OutputRepair;
