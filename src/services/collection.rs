use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{compare_by_weight, IncomparableValue, ProductId, ProductRecord};
use crate::services::weighting::{AffinityRule, RecommendationKind, WeightRule, WeightingEngine};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollectionError {
    #[error("Product {0} is already recommended")]
    DuplicateCandidate(ProductId),

    #[error("Product {0} is not in the recommendations")]
    CandidateNotFound(ProductId),

    #[error(transparent)]
    Incomparable(#[from] IncomparableValue),
}

/// Ordering used when dumping a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending candidate id
    #[default]
    Key,
    /// Descending weight, ties by ascending candidate id
    Weight,
}

/// Scored recommendation candidates for a single source product
///
/// Entries are keyed by candidate id. A key is inserted at most once; callers
/// replace an entry by deleting it first.
#[derive(Debug, Clone)]
pub struct RecommendationCollection<R = AffinityRule> {
    owner: ProductRecord,
    rule: R,
    entries: BTreeMap<ProductId, ProductRecord>,
}

impl RecommendationCollection<AffinityRule> {
    /// Creates an empty collection scored with the symmetric affinity rule
    pub fn new(owner: ProductRecord) -> Self {
        Self::with_rule(owner, AffinityRule)
    }
}

impl From<WeightingEngine> for RecommendationCollection<RecommendationKind> {
    fn from(engine: WeightingEngine) -> Self {
        let kind = engine.kind();
        Self::with_rule(engine.into_source(), kind)
    }
}

impl<R: WeightRule> RecommendationCollection<R> {
    pub fn with_rule(owner: ProductRecord, rule: R) -> Self {
        Self {
            owner,
            rule,
            entries: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &ProductRecord {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ProductId) -> Option<&ProductRecord> {
        self.entries.get(id)
    }

    /// Scores `candidate` against the owner and stores it
    ///
    /// Returns the computed weight. An id that is already present leaves the
    /// collection untouched and yields `DuplicateCandidate`.
    pub fn insert(&mut self, mut candidate: ProductRecord) -> Result<f64, CollectionError> {
        if self.entries.contains_key(&candidate.id) {
            return Err(CollectionError::DuplicateCandidate(candidate.id));
        }

        let weight = f64::from(self.rule.weigh(&self.owner, &candidate));
        candidate.weight = Some(weight);
        self.entries.insert(candidate.id.clone(), candidate);

        Ok(weight)
    }

    /// Removes the candidate with the given id and hands it back
    pub fn delete(&mut self, id: &ProductId) -> Result<ProductRecord, CollectionError> {
        self.entries
            .remove(id)
            .ok_or_else(|| CollectionError::CandidateNotFound(id.clone()))
    }

    /// All candidates in ascending id order
    pub fn list_sorted(&self) -> Vec<&ProductRecord> {
        self.entries.values().collect()
    }

    /// All candidates by descending weight; equal weights keep id order
    pub fn list_by_weight(&self) -> Result<Vec<&ProductRecord>, CollectionError> {
        let mut ranked = self.list_sorted();

        // sort_by can't propagate comparator errors, so reject unscored entries first
        if ranked.iter().any(|product| product.weight.is_none()) {
            return Err(IncomparableValue.into());
        }

        // Stable sort keeps key order among equal weights
        ranked.sort_by(|a, b| compare_by_weight(*b, *a).unwrap_or(std::cmp::Ordering::Equal));

        Ok(ranked)
    }

    pub fn list(&self, order: SortOrder) -> Result<Vec<&ProductRecord>, CollectionError> {
        match order {
            SortOrder::Key => Ok(self.list_sorted()),
            SortOrder::Weight => self.list_by_weight(),
        }
    }

    /// Consumes the collection, returning its owner and candidates in `order`
    pub fn into_parts(
        self,
        order: SortOrder,
    ) -> Result<(ProductRecord, Vec<ProductRecord>), CollectionError> {
        let ids: Vec<ProductId> = self
            .list(order)?
            .into_iter()
            .map(|product| product.id.clone())
            .collect();

        let mut entries = self.entries;
        let candidates = ids
            .iter()
            .filter_map(|id| entries.remove(id))
            .collect();

        Ok((self.owner, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::weighting::UpsellRule;

    fn parse(raw: &str) -> ProductRecord {
        ProductRecord::parse(raw).unwrap()
    }

    fn socks() -> ProductRecord {
        parse(r#"{"id":"1","name":"socks","category":"footwear","price":"4.50"}"#)
    }

    fn shoes() -> ProductRecord {
        parse(r#"{"id":"2","name":"shoes","category":"footwear","price":"8.50"}"#)
    }

    fn flipflops() -> ProductRecord {
        parse(r#"{"id":"4","name":"flipflops","category":"swimwear","price":"8.50"}"#)
    }

    fn shoes3() -> ProductRecord {
        parse(r#"{"id":"3","name":"shoes3","category":"footwear","price":"8.50"}"#)
    }

    fn filled() -> RecommendationCollection {
        let mut recs = RecommendationCollection::new(socks());
        recs.insert(shoes()).unwrap();
        recs.insert(flipflops()).unwrap();
        recs.insert(shoes3()).unwrap();
        recs
    }

    #[test]
    fn test_insert_scores_candidates() {
        let mut recs = RecommendationCollection::new(socks());

        assert_eq!(recs.insert(shoes()), Ok(2.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs.insert(flipflops()), Ok(1.0));
        assert_eq!(recs.len(), 2);
        assert_eq!(recs.insert(shoes3()), Ok(2.0));
        assert_eq!(recs.len(), 3);

        let stored = recs.get(&ProductId::from("2")).unwrap();
        assert_eq!(stored.weight, Some(2.0));
    }

    #[test]
    fn test_insert_duplicate_is_rejected() {
        let mut recs = filled();

        let mut duplicate = shoes();
        duplicate.name = "other shoes".to_string();
        let result = recs.insert(duplicate);

        assert_eq!(
            result,
            Err(CollectionError::DuplicateCandidate(ProductId::from("2")))
        );
        assert_eq!(recs.len(), 3);
        assert_eq!(recs.get(&ProductId::from("2")).unwrap().name, "shoes");
    }

    #[test]
    fn test_delete() {
        let mut recs = filled();

        let removed = recs.delete(&ProductId::from("3")).unwrap();
        assert_eq!(removed.name, "shoes3");
        assert_eq!(recs.len(), 2);

        let result = recs.delete(&ProductId::from("3"));
        assert_eq!(
            result,
            Err(CollectionError::CandidateNotFound(ProductId::from("3")))
        );
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_list_sorted_uses_key_order() {
        let recs = filled();
        let ids: Vec<String> = recs.list_sorted().iter().map(|p| p.id.to_string()).collect();
        // Key order, regardless of the weights (2, 2, 1)
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_list_sorted_numeric_ids() {
        let mut recs = RecommendationCollection::new(ProductRecord::new(1, "a", "x", 1.0));
        for id in [10, 9, 100] {
            recs.insert(ProductRecord::new(id, "b", "y", 50.0)).unwrap();
        }
        let ids: Vec<String> = recs.list_sorted().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["9", "10", "100"]);
    }

    #[test]
    fn test_list_sorted_empty() {
        let recs = RecommendationCollection::new(socks());
        assert!(recs.list_sorted().is_empty());
        assert!(recs.list_by_weight().unwrap().is_empty());
    }

    #[test]
    fn test_list_by_weight() {
        let recs = filled();
        let ids: Vec<String> = recs
            .list_by_weight()
            .unwrap()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3", "4"]);

        let mut recs = RecommendationCollection::new(socks());
        recs.insert(ProductRecord::new("2", "wetsuit", "swimwear", 120.0)).unwrap();
        recs.insert(ProductRecord::new("3", "insoles", "footwear", 5.0)).unwrap();
        let ids: Vec<String> = recs
            .list(SortOrder::Weight)
            .unwrap()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["3", "2"]);

        let ids: Vec<String> = recs
            .list(SortOrder::Key)
            .unwrap()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_upsell_collection() {
        let mut recs = RecommendationCollection::with_rule(socks(), UpsellRule);
        let cheap = parse(r#"{"id":"3","name":"cheapsocks","category":"footwear","price":"1.50"}"#);

        assert_eq!(recs.insert(shoes()), Ok(2.0));
        assert_eq!(recs.insert(cheap), Ok(1.0));
    }

    #[test]
    fn test_collection_from_engine() {
        let engine = WeightingEngine::new(socks(), 1).unwrap();
        let mut recs = RecommendationCollection::from(engine);
        assert_eq!(recs.owner().name, "socks");
        assert_eq!(recs.insert(flipflops()), Ok(1.0));
    }

    #[test]
    fn test_into_parts() {
        let (owner, candidates) = filled().into_parts(SortOrder::Weight).unwrap();
        assert_eq!(owner.name, "socks");
        let weights: Vec<Option<f64>> = candidates.iter().map(|p| p.weight).collect();
        assert_eq!(weights, vec![Some(2.0), Some(2.0), Some(1.0)]);
    }

    #[test]
    fn test_sort_order_deserialization() {
        let order: SortOrder = serde_json::from_str("\"weight\"").unwrap();
        assert_eq!(order, SortOrder::Weight);
        assert_eq!(SortOrder::default(), SortOrder::Key);
    }
}
