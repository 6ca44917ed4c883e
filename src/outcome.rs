//! Per-section outcome classification

use serde::Serialize;

/// Classified result of fetching and normalizing one resource kind.
///
/// Every fetch yields exactly one outcome; sections never influence each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum SectionOutcome<T> {
    /// Structurally valid data with content
    Ok(T),
    /// Valid response without content (no contributors, no releases, ...)
    Empty,
    /// Upstream is still computing the data
    Pending(String),
    /// Transport failure, non-success status, or malformed payload
    Error(String),
}

impl<T> SectionOutcome<T> {
    pub fn error(reason: impl Into<String>) -> Self {
        SectionOutcome::Error(reason.into())
    }

    pub fn pending(message: impl Into<String>) -> Self {
        SectionOutcome::Pending(message.into())
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            SectionOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Short state name used by renderers
    pub fn state(&self) -> &'static str {
        match self {
            SectionOutcome::Ok(_) => "ok",
            SectionOutcome::Empty => "empty",
            SectionOutcome::Pending(_) => "pending",
            SectionOutcome::Error(_) => "error",
        }
    }
}

impl<T> SectionOutcome<Vec<T>> {
    /// `Empty` for a zero-length collection, `Ok` otherwise
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            SectionOutcome::Empty
        } else {
            SectionOutcome::Ok(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_items() {
        assert_eq!(SectionOutcome::<Vec<u8>>::from_items(vec![]), SectionOutcome::Empty);
        assert_eq!(SectionOutcome::from_items(vec![3]), SectionOutcome::Ok(vec![3]));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SectionOutcome::Ok(1).state(), "ok");
        assert_eq!(SectionOutcome::<u8>::Empty.state(), "empty");
        assert_eq!(SectionOutcome::<u8>::pending("wait").state(), "pending");
        assert_eq!(SectionOutcome::<u8>::error("boom").state(), "error");
    }

    #[test]
    fn test_serialized_shape() {
        let ok = serde_json::to_value(SectionOutcome::Ok(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({"state": "ok", "value": [1, 2]}));

        let empty = serde_json::to_value(SectionOutcome::<u8>::Empty).unwrap();
        assert_eq!(empty, serde_json::json!({"state": "empty"}));

        let err = serde_json::to_value(SectionOutcome::<u8>::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"state": "error", "value": "nope"}));
    }
}
