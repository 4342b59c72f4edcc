//! Known execution contexts.

use serde::{Deserialize, Serialize};

/// One independently deployed UI fragment, or the orchestrating host.
///
/// The set is fixed at design time; adding a participant is a code
/// change, not a runtime operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    /// Host application that orchestrates all fragments.
    Shell,
    /// Navigation bar with the cart badge.
    Header,
    /// Product catalog.
    Products,
    /// Shopping cart view.
    Cart,
}

impl Participant {
    /// All known participants, shell first.
    pub const ALL: [Self; 4] = [Self::Shell, Self::Header, Self::Products, Self::Cart];

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shell => "Shell",
            Self::Header => "Header",
            Self::Products => "Products",
            Self::Cart => "Cart",
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Participant::Products).unwrap();
        assert_eq!(json, "\"products\"");

        let parsed: Participant = serde_json::from_str("\"header\"").unwrap();
        assert_eq!(parsed, Participant::Header);
    }

    #[test]
    fn test_all_covers_every_variant() {
        assert_eq!(Participant::ALL.len(), 4);
        assert_eq!(Participant::ALL[0], Participant::Shell);
    }
}
