//! Customer requests and the daily customer queue generator.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogError};
use crate::constants::{LOG_TARGET, SHELF_SEEDED_REQUESTS};
use crate::rng::{RandomSource, choose, shuffle};

/// Ids of the catalog items that satisfy a request.
pub type LinkedIds = SmallVec<[String; 2]>;

/// A customer's stated want.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub text: String,
    #[serde(alias = "linkedItemIds", alias = "linkedBookIds", alias = "linkedGameIds")]
    pub linked_item_ids: LinkedIds,
}

impl Request {
    #[must_use]
    pub fn accepts(&self, item_id: &str) -> bool {
        self.linked_item_ids.iter().any(|id| id == item_id)
    }
}

#[derive(Debug, Deserialize)]
struct RequestFile {
    requests: Vec<Request>,
}

/// Validated request pool. Every request links to at least one catalog item.
#[derive(Debug, Clone, Default)]
pub struct RequestPool {
    requests: Vec<Request>,
}

impl RequestPool {
    /// Validate requests against the catalog.
    ///
    /// Links to unknown ids are dropped, and so are requests left without any
    /// link.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyRequest`] when a request has blank text.
    pub fn new(requests: Vec<Request>, catalog: &Catalog) -> Result<Self, CatalogError> {
        let mut kept = Vec::with_capacity(requests.len());
        for (pos, mut request) in requests.into_iter().enumerate() {
            if request.text.trim().is_empty() {
                return Err(CatalogError::EmptyRequest(pos));
            }
            let before = request.linked_item_ids.len();
            request.linked_item_ids.retain(|id| catalog.contains(id));
            if request.linked_item_ids.len() != before {
                warn!(
                    target: LOG_TARGET,
                    "request {pos} links {} unknown item(s)",
                    before - request.linked_item_ids.len()
                );
            }
            if request.linked_item_ids.is_empty() {
                warn!(target: LOG_TARGET, "request {pos} dropped: no known linked items");
                continue;
            }
            kept.push(request);
        }
        Ok(Self { requests: kept })
    }

    /// Parse `{"requests": [...]}` and validate it against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a request has blank text.
    pub fn from_json(json: &str, catalog: &Catalog) -> Result<Self, CatalogError> {
        let file: RequestFile = serde_json::from_str(json)?;
        Self::new(file.requests, catalog)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Request> {
        self.requests.get(index)
    }

    #[must_use]
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Indices of the requests satisfied by `item_id`.
    pub fn linked_to<'a>(&'a self, item_id: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.requests
            .iter()
            .enumerate()
            .filter(move |(_, request)| request.accepts(item_id))
            .map(|(index, _)| index)
    }
}

/// One customer in today's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Position of the request in the pool.
    pub request_index: usize,
    pub text: String,
    pub linked_item_ids: LinkedIds,
    pub avatar: String,
}

impl Customer {
    #[must_use]
    pub fn accepts(&self, item_id: &str) -> bool {
        self.linked_item_ids.iter().any(|id| id == item_id)
    }
}

/// Tracks requests already handed out today, by index and by phrasing.
struct UsedRequests<'a> {
    indices: HashSet<usize>,
    texts: HashSet<&'a str>,
}

impl<'a> UsedRequests<'a> {
    fn new() -> Self {
        Self {
            indices: HashSet::new(),
            texts: HashSet::new(),
        }
    }

    fn is_free(&self, index: usize, request: &Request) -> bool {
        !self.indices.contains(&index) && !self.texts.contains(request.text.as_str())
    }

    fn mark(&mut self, index: usize, request: &'a Request) {
        self.indices.insert(index);
        self.texts.insert(request.text.as_str());
    }
}

/// Build today's customer queue.
///
/// Up to [`SHELF_SEEDED_REQUESTS`] distinct shelf items each get one linked
/// request, the rest of the queue is filled from any unused request, and the
/// result is shuffled. The queue is shorter than `count` when the pool runs out
/// of unused requests.
pub fn generate_customers(
    shelf_ids: &[&str],
    count: usize,
    pool: &RequestPool,
    avatars: &[&str],
    rng: &mut dyn RandomSource,
) -> Vec<Customer> {
    let mut used = UsedRequests::new();
    let mut chosen: Vec<usize> = Vec::with_capacity(count);

    let mut seeds: Vec<&str> = Vec::with_capacity(shelf_ids.len());
    for id in shelf_ids {
        if !seeds.contains(id) {
            seeds.push(id);
        }
    }
    shuffle(&mut seeds, rng);

    for item_id in seeds.iter().take(SHELF_SEEDED_REQUESTS.min(count)) {
        let candidates: Vec<usize> = pool
            .linked_to(item_id)
            .filter(|&index| {
                pool.get(index)
                    .is_some_and(|request| used.is_free(index, request))
            })
            .collect();
        let Some(&index) = choose(&candidates, rng) else {
            continue;
        };
        if let Some(request) = pool.get(index) {
            used.mark(index, request);
            chosen.push(index);
        }
    }

    while chosen.len() < count {
        let remaining: Vec<usize> = pool
            .requests()
            .iter()
            .enumerate()
            .filter(|(index, request)| used.is_free(*index, request))
            .map(|(index, _)| index)
            .collect();
        let Some(&index) = choose(&remaining, rng) else {
            break;
        };
        if let Some(request) = pool.get(index) {
            used.mark(index, request);
            chosen.push(index);
        }
    }

    if chosen.len() < count {
        debug!(
            target: LOG_TARGET,
            "request pool exhausted: {} of {count} customers",
            chosen.len()
        );
    }

    shuffle(&mut chosen, rng);
    chosen
        .into_iter()
        .filter_map(|index| {
            let request = pool.get(index)?;
            let avatar = choose(avatars, rng).copied().unwrap_or("👤");
            Some(Customer {
                request_index: index,
                text: request.text.clone(),
                linked_item_ids: request.linked_item_ids.clone(),
                avatar: avatar.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;
    use crate::test_support::{catalog_of, request};

    fn pool() -> (Catalog, RequestPool) {
        let catalog = catalog_of(&[("a", 100), ("b", 100), ("c", 100)]);
        let pool = RequestPool::new(
            vec![
                request("wants a", &["a"]),
                request("wants b", &["b"]),
                request("wants c", &["c"]),
                request("a or b", &["a", "b"]),
                request("wants a", &["a"]),
            ],
            &catalog,
        )
        .unwrap();
        (catalog, pool)
    }

    #[test]
    fn pool_drops_unknown_links() {
        let catalog = catalog_of(&[("a", 100)]);
        let pool = RequestPool::new(
            vec![request("mixed", &["a", "ghost"]), request("ghost only", &["ghost"])],
            &catalog,
        )
        .unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.requests()[0].linked_item_ids.as_slice(), ["a"]);
    }

    #[test]
    fn pool_rejects_blank_text() {
        let catalog = catalog_of(&[("a", 100)]);
        let err = RequestPool::new(vec![request("  ", &["a"])], &catalog).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyRequest(0)));
    }

    #[test]
    fn pool_accepts_camel_case_links() {
        let catalog = catalog_of(&[("a", 100)]);
        let json = r#"{"requests": [{"text": "old style", "linkedBookIds": ["a"]}]}"#;
        let pool = RequestPool::from_json(json, &catalog).unwrap();
        assert!(pool.requests()[0].accepts("a"));
    }

    #[test]
    fn queue_never_repeats_text_or_index() {
        let (_, pool) = pool();
        let customers =
            generate_customers(&["a", "b"], 8, &pool, &["🙂"], &mut ScriptedRandom::zeros());
        // Five requests, but "wants a" appears twice.
        assert_eq!(customers.len(), 4);
        let mut texts: Vec<&str> = customers.iter().map(|c| c.text.as_str()).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), 4);
        assert!(customers.iter().all(|c| c.avatar == "🙂"));
    }

    #[test]
    fn shelf_items_get_a_linked_request() {
        let (_, pool) = pool();
        for seed in 0..16 {
            let mut rng = ScriptedRandom::new(vec![seed, seed * 7 + 3, seed * 13 + 1]);
            let customers = generate_customers(&["c"], 2, &pool, &["🙂"], &mut rng);
            assert_eq!(customers.len(), 2);
            assert!(customers.iter().any(|c| c.accepts("c")));
        }
    }

    #[test]
    fn empty_pool_yields_empty_queue() {
        let pool = RequestPool::default();
        let customers = generate_customers(&["a"], 5, &pool, &[], &mut ScriptedRandom::zeros());
        assert!(customers.is_empty());
    }

    #[test]
    fn missing_avatars_fall_back_to_placeholder() {
        let (_, pool) = pool();
        let customers = generate_customers(&[], 1, &pool, &[], &mut ScriptedRandom::zeros());
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].avatar, "👤");
    }
}
