//! End-to-end extraction: description (and optional photo) to record

use crate::classifier::{FixedClassifier, ImageClassifier, UNKNOWN_CATEGORY};
use crate::config::PipelineConfig;
use crate::error::{ExtractError, Result};
use crate::guarded::GuardedCall;
use crate::message::ChatMessage;
use crate::oracle::Oracle;
use crate::record::ListingRecord;
use crate::repair::OutputRepair;
use listing_guard::{Direction, SafetyFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

const LISTING_INSTRUCTIONS: &str = r#"You are a strict car listing parser.
Convert the text into JSON with a single top-level key called "{key}".
The "{key}" object should include the following fields:
body_type, color, brand, model, manufactured_year, motor_size_cc,
tires (with type and manufactured_year), windows,
notices (list of type and description), price (amount and currency).

Requirements:
- Extract all information from the description text.
- If a field is missing, infer reasonable values based on real car specs.
- If any field is not mentioned in the text, fill it with a typical value for the given brand, model and year. Do not leave fields as "unknown".
- Output must be valid JSON.
- No extra keys, comments, or text outside the JSON."#;

const REPAIR_INSTRUCTIONS: &str = "Return corrected JSON only.";

/// Turns free-text listings into validated records
pub struct ListingPipeline {
    oracle: Arc<dyn Oracle>,
    filter: SafetyFilter,
    repair: OutputRepair,
    classifier: Arc<dyn ImageClassifier>,
    config: PipelineConfig,
}

impl ListingPipeline {
    pub fn new(oracle: Arc<dyn Oracle>, filter: SafetyFilter, config: PipelineConfig) -> Self {
        Self {
            oracle,
            filter,
            repair: OutputRepair::new(config.wrapping_key.clone()),
            classifier: Arc::new(FixedClassifier::default()),
            config,
        }
    }

    /// Replace the image classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ImageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn filter(&self) -> &SafetyFilter {
        &self.filter
    }

    /// Extract a listing record from `description`, using `image` for a
    /// body-type hint when given.
    pub async fn process_description_to_record(
        &self,
        description: &str,
        image: Option<&Path>,
    ) -> Result<ListingRecord> {
        let span = info_span!("extract", request_id = %Uuid::new_v4());
        self.process(description, image).instrument(span).await
    }

    async fn process(&self, description: &str, image: Option<&Path>) -> Result<ListingRecord> {
        if description.trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let verdict = self.filter.inspect(description, Direction::Input);
        if !verdict.is_safe {
            return Err(ExtractError::UnsafeInput {
                flagged: verdict.flagged_list(),
            });
        }
        let clean = self.filter.sanitize(description).trim().to_string();

        let hint = match image {
            Some(path) => Some(self.classify(path.to_path_buf()).await),
            None => None,
        };
        let messages = self.build_messages(&clean, hint.as_deref());

        let value = GuardedCall::new(self.oracle.as_ref(), &self.filter, &self.repair)
            .with_timeout(self.config.oracle_timeout())
            .guarded_extract(messages, self.config.max_retries)
            .await?;

        let record = ListingRecord::from_value(value, &self.config.wrapping_key)?;
        info!(fields = record.body().len(), "Listing extracted");
        Ok(record)
    }

    /// System and user messages for one extraction
    pub fn build_messages(
        &self,
        description: &str,
        body_type_hint: Option<&str>,
    ) -> Vec<ChatMessage> {
        let mut instructions = LISTING_INSTRUCTIONS.replace("{key}", &self.config.wrapping_key);
        if let Some(hint) = body_type_hint.filter(|h| !h.is_empty() && *h != UNKNOWN_CATEGORY) {
            instructions.push_str(&format!("\n- Use this body_type from the image: {hint}"));
        }
        vec![
            ChatMessage::system(instructions),
            ChatMessage::user(description),
        ]
    }

    /// Turn a stored or hand-edited payload into a record, asking the model
    /// to fix it when it does not parse.
    pub async fn repair_payload(&self, raw: &str) -> Result<ListingRecord> {
        let span = info_span!("repair", request_id = %Uuid::new_v4());
        async {
            let value = self
                .repair
                .parse_with_repair(raw, self.config.repair_attempts, |text| self.ask_for_fix(text))
                .await?;
            ListingRecord::from_value(value, &self.config.wrapping_key)
        }
        .instrument(span)
        .await
    }

    async fn ask_for_fix(&self, text: String) -> Result<String> {
        let messages = vec![
            ChatMessage::system(REPAIR_INSTRUCTIONS),
            ChatMessage::user(format!(
                "Fix this JSON so it has a single top-level '{}' key and is valid:\n{}",
                self.config.wrapping_key, text
            )),
        ];
        for message in &messages {
            let verdict = self.filter.inspect(&message.content, Direction::Input);
            if !verdict.is_safe {
                return Err(ExtractError::UnsafeInput {
                    flagged: verdict.flagged_list(),
                });
            }
        }

        let timeout = self.config.oracle_timeout();
        let raw = match tokio::time::timeout(timeout, self.oracle.complete(&messages)).await {
            Ok(result) => result?,
            Err(_) => return Err(ExtractError::OracleTimeout(timeout.as_secs())),
        };

        let verdict = self.filter.inspect(&raw, Direction::Output);
        if !verdict.is_safe {
            return Err(ExtractError::UnsafeOutput {
                flagged: verdict.flagged_list(),
            });
        }
        Ok(self.filter.sanitize(&raw).trim().to_string())
    }

    async fn classify(&self, path: PathBuf) -> String {
        let classifier = Arc::clone(&self.classifier);
        let shown = path.display().to_string();
        match tokio::task::spawn_blocking(move || classifier.classify(&path)).await {
            Ok(category) => category,
            Err(e) => {
                warn!(path = %shown, error = %e, "Image classifier task failed");
                UNKNOWN_CATEGORY.to_string()
            }
        }
    }
}
