//! Image hints for the listing body type

use crate::config::ClassifierConfig;
use std::path::Path;
use tracing::{debug, warn};

/// Category reported when an image cannot be read
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Maps an image to a body-type hint. Never fails: unreadable images
/// yield [`UNKNOWN_CATEGORY`].
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: &Path) -> String;
}

/// Reports one configured category for every image that decodes
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    category: String,
}

impl Default for FixedClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl FixedClassifier {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.fixed_category.clone())
    }
}

impl ImageClassifier for FixedClassifier {
    fn classify(&self, image: &Path) -> String {
        match image::image_dimensions(image) {
            Ok((width, height)) => {
                debug!(
                    path = %image.display(),
                    width,
                    height,
                    category = %self.category,
                    "Classified image"
                );
                self.category.clone()
            }
            Err(e) => {
                warn!(path = %image.display(), error = %e, "Could not read image");
                UNKNOWN_CATEGORY.to_string()
            }
        }
    }
}
