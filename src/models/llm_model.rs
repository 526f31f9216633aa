//! Chat models that `/ask` may be driven with.

use std::borrow::Cow;
use validator::ValidationError;

/// The first entry is the default.
pub const AVAILABLE_MODELS: [&str; 4] = ["gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"];

pub fn available_models() -> Vec<String> {
    AVAILABLE_MODELS.iter().map(|m| m.to_string()).collect()
}

pub fn default_model() -> String {
    AVAILABLE_MODELS[0].to_string()
}

pub fn is_supported(model: &str) -> bool {
    AVAILABLE_MODELS.contains(&model)
}

/// `^(gpt-4o-mini|gpt-4-turbo|gpt-4|gpt-3.5-turbo)$`
pub fn model_pattern() -> String {
    format!("^({})$", AVAILABLE_MODELS.join("|"))
}

pub(crate) fn validate_model(model: &str) -> Result<(), ValidationError> {
    if is_supported(model) {
        return Ok(());
    }
    let mut error = ValidationError::new("string_pattern_mismatch");
    error.message = Some(Cow::from(format!(
        "String should match pattern '{}'",
        model_pattern()
    )));
    Err(error)
}
