//! Availability - Stock state of a catalog product

use serde::{Deserialize, Serialize};

/// Stock state as reported by the upstream catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    #[default]
    InStock,
    OutOfStock,
    Preorder,
    Backorder,
}

impl Availability {
    /// Platform vocabulary shared by Google, Facebook and Instagram
    pub fn feed_value(&self) -> &'static str {
        match self {
            Availability::InStock => "in stock",
            Availability::OutOfStock => "out of stock",
            Availability::Preorder => "preorder",
            Availability::Backorder => "backorder",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::InStock => write!(f, "IN_STOCK"),
            Availability::OutOfStock => write!(f, "OUT_OF_STOCK"),
            Availability::Preorder => write!(f, "PREORDER"),
            Availability::Backorder => write!(f, "BACKORDER"),
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace([' ', '-'], "_").as_str() {
            "IN_STOCK" => Ok(Availability::InStock),
            "OUT_OF_STOCK" => Ok(Availability::OutOfStock),
            "PREORDER" => Ok(Availability::Preorder),
            "BACKORDER" => Ok(Availability::Backorder),
            _ => Err(format!("Unknown availability: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("IN_STOCK".parse::<Availability>(), Ok(Availability::InStock));
        assert_eq!("out of stock".parse::<Availability>(), Ok(Availability::OutOfStock));
        assert!("sold".parse::<Availability>().is_err());
    }
}
