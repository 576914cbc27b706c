//! Filter Engine
//!
//! Applies a feed's `FilterSpec` to a product sequence. Rules run in a fixed
//! order and stop at the first rejection:
//!
//! 1. availability must be `IN_STOCK` (always, regardless of the filter settings)
//! 2. product id must not be excluded
//! 3. price within `min_price` / `max_price`
//! 4. brand, category, tags, collections must match each constraining set

use std::collections::BTreeSet;

use crate::domain::entities::Product;
use crate::domain::value_objects::{Availability, FilterSpec};

/// Why a product was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotInStock,
    ExcludedId,
    BelowMinPrice,
    AboveMaxPrice,
    Brand,
    Category,
    Tags,
    Collections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Reject(RejectReason),
}

/// Running totals; `included + excluded == processed` at all times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounters {
    pub processed: u64,
    pub included: u64,
    pub excluded: u64,
}

impl FilterCounters {
    pub fn record(&mut self, decision: FilterDecision) {
        self.processed += 1;
        match decision {
            FilterDecision::Accept => self.included += 1,
            FilterDecision::Reject(_) => self.excluded += 1,
        }
    }
}

/// Stateless evaluator bound to one filter spec
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine<'a> {
    spec: &'a FilterSpec,
}

impl<'a> FilterEngine<'a> {
    pub fn new(spec: &'a FilterSpec) -> Self {
        Self { spec }
    }

    pub fn evaluate(&self, product: &Product) -> FilterDecision {
        match self.first_rejection(product) {
            Some(reason) => FilterDecision::Reject(reason),
            None => FilterDecision::Accept,
        }
    }

    fn first_rejection(&self, product: &Product) -> Option<RejectReason> {
        let spec = self.spec;

        if product.availability != Availability::InStock {
            return Some(RejectReason::NotInStock);
        }
        if spec.exclude_product_ids.contains(&product.id) {
            return Some(RejectReason::ExcludedId);
        }
        if spec.min_price.is_some_and(|min| product.price < min) {
            return Some(RejectReason::BelowMinPrice);
        }
        if spec.max_price.is_some_and(|max| product.price > max) {
            return Some(RejectReason::AboveMaxPrice);
        }
        if !single_matches(&spec.include_brands, product.brand.as_deref()) {
            return Some(RejectReason::Brand);
        }
        if !single_matches(&spec.include_categories, product.category.as_deref()) {
            return Some(RejectReason::Category);
        }
        if !any_matches(&spec.include_tags, &product.tags) {
            return Some(RejectReason::Tags);
        }
        if !any_matches(&spec.include_collections, &product.collections) {
            return Some(RejectReason::Collections);
        }
        None
    }

    /// Lazily filter a product sequence, counting as it goes
    pub fn filter<I>(&self, products: I) -> Filtered<'a, I::IntoIter>
    where
        I: IntoIterator<Item = Product>,
    {
        Filtered {
            engine: *self,
            inner: products.into_iter(),
            counters: FilterCounters::default(),
        }
    }
}

fn single_matches(allowed: &Option<BTreeSet<String>>, value: Option<&str>) -> bool {
    match allowed {
        None => true,
        Some(set) if set.is_empty() => true,
        Some(set) => value.is_some_and(|v| set.contains(v)),
    }
}

fn any_matches(allowed: &Option<BTreeSet<String>>, values: &[String]) -> bool {
    match allowed {
        None => true,
        Some(set) if set.is_empty() => true,
        Some(set) => values.iter().any(|v| set.contains(v)),
    }
}

/// Iterator adapter yielding accepted products
pub struct Filtered<'a, I> {
    engine: FilterEngine<'a>,
    inner: I,
    counters: FilterCounters,
}

impl<I> Filtered<'_, I> {
    pub fn counters(&self) -> FilterCounters {
        self.counters
    }
}

impl<I: Iterator<Item = Product>> Iterator for Filtered<'_, I> {
    type Item = Product;

    fn next(&mut self) -> Option<Product> {
        loop {
            let product = self.inner.next()?;
            let decision = self.engine.evaluate(&product);
            self.counters.record(decision);
            if decision == FilterDecision::Accept {
                return Some(product);
            }
        }
    }
}
