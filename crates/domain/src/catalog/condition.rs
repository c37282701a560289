use serde::{Deserialize, Serialize};

/// Physical condition rating of an individually-tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    /// Unsafe or broken; must go through maintenance before lending again.
    NeedsRepair,
}

impl Condition {
    /// Returns true if the item must be routed to maintenance.
    pub fn needs_repair(&self) -> bool {
        matches!(self, Condition::NeedsRepair)
    }

    /// Returns the condition name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "EXCELLENT",
            Condition::Good => "GOOD",
            Condition::Fair => "FAIR",
            Condition::Poor => "POOR",
            Condition::NeedsRepair => "NEEDS_REPAIR",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_needs_repair_routes_to_maintenance() {
        assert!(Condition::NeedsRepair.needs_repair());
        assert!(!Condition::Poor.needs_repair());
        assert!(!Condition::Good.needs_repair());
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&Condition::NeedsRepair).unwrap();
        assert_eq!(json, "\"NEEDS_REPAIR\"");
        assert_eq!(Condition::NeedsRepair.to_string(), "NEEDS_REPAIR");
    }
}
