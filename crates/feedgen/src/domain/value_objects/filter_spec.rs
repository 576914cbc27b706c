//! FilterSpec - Declarative product selection embedded in feed settings

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Product selection rules for a feed.
///
/// Inclusion sets are `None` when they do not constrain. An empty set is
/// normalized to `None` so "empty" never silently means "nothing".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_brands: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_categories: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_collections: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_product_ids: BTreeSet<Uuid>,
}

impl FilterSpec {
    /// Validate price bounds
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, bound) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(value) = bound {
                if value.is_sign_negative() {
                    return Err(DomainError::Validation(format!(
                        "{} must not be negative (got {})",
                        name, value
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::Validation(format!(
                    "min_price ({}) is greater than max_price ({})",
                    min, max
                )));
            }
        }

        Ok(())
    }

    /// Collapse empty inclusion sets to "no constraint"
    pub fn normalized(mut self) -> Self {
        for set in [
            &mut self.include_brands,
            &mut self.include_categories,
            &mut self.include_tags,
            &mut self.include_collections,
        ] {
            if set.as_ref().is_some_and(|s| s.is_empty()) {
                *set = None;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_above_max_rejected() {
        let spec = FilterSpec {
            min_price: Some(Decimal::new(500, 0)),
            max_price: Some(Decimal::new(20, 0)),
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let spec = FilterSpec {
            min_price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_empty_sets_normalize_to_none() {
        let spec = FilterSpec {
            include_brands: Some(BTreeSet::new()),
            include_tags: Some(["sale".to_string()].into_iter().collect()),
            ..Default::default()
        }
        .normalized();
        assert!(spec.include_brands.is_none());
        assert!(spec.include_tags.is_some());
    }

    #[test]
    fn test_deserialize_partial_spec() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"min_price": "20", "include_brands": ["A"]}"#).unwrap();
        assert_eq!(spec.min_price, Some(Decimal::new(20, 0)));
        assert!(spec.max_price.is_none());
        assert_eq!(spec.include_brands.unwrap().len(), 1);
    }
}
