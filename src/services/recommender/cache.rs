use dashmap::DashMap;
use ndarray::Array1;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded cache of recently resolved latent vectors, keyed by the sorted
/// known-item-id set of the request.
///
/// Eviction is oldest-first on overflow. The cache is a latency
/// optimization only: a racing miss recomputes the same vector, it never
/// corrupts a returned result.
pub struct LatentCache {
    entries: DashMap<Vec<usize>, Arc<Array1<f64>>>,
    order: Mutex<VecDeque<Vec<usize>>>,
    capacity: usize,
}

impl LatentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn get(&self, key: &[usize]) -> Option<Arc<Array1<f64>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, key: Vec<usize>, latent: Arc<Array1<f64>>) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.insert(key.clone(), latent).is_some() {
            // Already tracked in the eviction queue.
            return;
        }

        let mut order = self.order.lock().expect("latent cache queue poisoned");
        order.push_back(key);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
