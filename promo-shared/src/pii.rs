use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const MASK: &str = "********";

/// Wraps credentials read from configuration (API keys, tokens) so they never
/// show up through `Debug`/`Display` in log lines.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Reports and config dumps only ever see the mask.
        serializer.serialize_str(MASK)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the secret for the one place that needs it (an auth header).
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_value() {
        let key = Masked::new("sk-live-123".to_string());
        assert_eq!(format!("{:?}", key), MASK);
        assert_eq!(format!("{}", key), MASK);
        assert_eq!(serde_json::to_string(&key).unwrap(), format!("\"{}\"", MASK));
        assert_eq!(key.expose(), "sk-live-123");
    }

    #[test]
    fn test_masked_deserializes_transparently() {
        let key: Masked<String> = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(key.into_inner(), "token");

        let blank: Masked<String> = serde_json::from_str("\"  \"").unwrap();
        assert!(blank.is_blank());
    }
}
