//! Model auto-selection.
//!
//! The preferred model is not always visible to every key, so startup walks a
//! fallback chain against the provider's model listing.
use std::fmt;

use tracing::{info, warn};

use signvision_core::VisionModel;

/// Used when the listing is empty and nothing else matched.
pub const LAST_RESORT_MODEL: &str = "models/gemini-1.5-flash";

/// Ordered list of models to try, from primary → fallback.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    models: Vec<String>,
}

impl FallbackChain {
    pub fn new(primary: impl Into<String>) -> Self {
        Self { models: vec![primary.into()] }
    }

    pub fn then(mut self, fallback: impl Into<String>) -> Self {
        self.models.push(fallback.into());
        self
    }

    /// The chain always holds at least the primary.
    pub fn primary(&self) -> &str {
        self.models.first().map(String::as_str).unwrap_or(LAST_RESORT_MODEL)
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

/// How the model was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// The primary model is available.
    Preferred,
    /// A later entry of the chain is available.
    Fallback,
    /// Nothing in the chain matched; a vision-capable looking model was.
    VisionCapable,
    /// First model in the listing.
    FirstAvailable,
    /// The listing was empty.
    LastResort,
    /// The listing failed; the primary is used unverified.
    Unverified,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Preferred => "preferred",
            Self::Fallback => "fallback",
            Self::VisionCapable => "vision-capable",
            Self::FirstAvailable => "first-available",
            Self::LastResort => "last-resort",
            Self::Unverified => "unverified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub reason: SelectionReason,
}

/// Pick a model name from the available ones.
pub fn select_model(available: &[String], chain: &FallbackChain) -> ModelSelection {
    for (i, wanted) in chain.models.iter().enumerate() {
        if available.iter().any(|m| same_model(m, wanted)) {
            let reason = if i == 0 { SelectionReason::Preferred } else { SelectionReason::Fallback };
            return ModelSelection { model: wanted.clone(), reason };
        }
    }

    if let Some(m) = available.iter().find(|m| looks_vision_capable(m)) {
        return ModelSelection { model: m.clone(), reason: SelectionReason::VisionCapable };
    }

    match available.first() {
        Some(m) => ModelSelection { model: m.clone(), reason: SelectionReason::FirstAvailable },
        None => ModelSelection {
            model: LAST_RESORT_MODEL.to_string(),
            reason: SelectionReason::LastResort,
        },
    }
}

/// List the provider's models and pick one. Listing errors keep the primary.
pub async fn resolve_model(provider: &dyn VisionModel, chain: &FallbackChain) -> ModelSelection {
    let selection = match provider.list_models().await {
        Ok(models) => {
            let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
            info!(provider = provider.name(), available = names.len(), "Listed models");
            select_model(&names, chain)
        }
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "Model listing failed; using primary model unverified");
            ModelSelection {
                model: chain.primary().to_string(),
                reason: SelectionReason::Unverified,
            }
        }
    };

    if selection.reason == SelectionReason::Preferred {
        info!(model = %selection.model, "Using preferred model");
    } else {
        warn!(model = %selection.model, reason = %selection.reason, "Preferred model unavailable");
    }
    selection
}

/// Gemini lists models as `models/<id>`; configs often omit the prefix.
fn same_model(listed: &str, wanted: &str) -> bool {
    listed.trim_start_matches("models/") == wanted.trim_start_matches("models/")
}

fn looks_vision_capable(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    (lower.contains("gemini") && (lower.contains("flash") || lower.contains("pro")))
        || lower.starts_with("gpt-4o")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> FallbackChain {
        FallbackChain::new("models/gemini-2.0-flash")
            .then("models/gemini-2.5-flash")
            .then("models/gemini-1.5-flash")
    }

    #[test]
    fn chain_keeps_order_with_primary_first() {
        let chain = chain();
        assert_eq!(chain.primary(), "models/gemini-2.0-flash");
        assert_eq!(
            chain.models(),
            names(&["models/gemini-2.0-flash", "models/gemini-2.5-flash", "models/gemini-1.5-flash"])
        );
        assert_eq!(FallbackChain::new("gpt-4o").primary(), "gpt-4o");
    }

    #[test]
    fn prefers_primary() {
        let sel = select_model(&names(&["models/gemini-2.5-flash", "models/gemini-2.0-flash"]), &chain());
        assert_eq!(sel.model, "models/gemini-2.0-flash");
        assert_eq!(sel.reason, SelectionReason::Preferred);
    }

    #[test]
    fn walks_fallback_chain_in_order() {
        let sel = select_model(&names(&["models/gemini-1.5-flash", "models/gemini-2.5-flash"]), &chain());
        assert_eq!(sel.model, "models/gemini-2.5-flash");
        assert_eq!(sel.reason, SelectionReason::Fallback);
    }

    #[test]
    fn prefix_is_optional() {
        let sel = select_model(&names(&["models/gemini-2.0-flash"]), &FallbackChain::new("gemini-2.0-flash"));
        assert_eq!(sel.reason, SelectionReason::Preferred);
    }

    #[test]
    fn falls_back_to_vision_capable_then_first_then_last_resort() {
        let sel = select_model(
            &names(&["models/embedding-001", "models/gemini-3-pro-preview"]),
            &chain(),
        );
        assert_eq!(sel.model, "models/gemini-3-pro-preview");
        assert_eq!(sel.reason, SelectionReason::VisionCapable);

        let sel = select_model(&names(&["models/embedding-001"]), &chain());
        assert_eq!(sel.reason, SelectionReason::FirstAvailable);

        let sel = select_model(&[], &chain());
        assert_eq!(sel.model, LAST_RESORT_MODEL);
        assert_eq!(sel.reason, SelectionReason::LastResort);
    }
}
