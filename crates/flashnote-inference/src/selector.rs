//! Worker selection: shuffle-then-scan over the registry.
//!
//! Picks a usable, not-yet-tried worker. The scan is bounded by registry
//! size; unresolvable (no connection) and excluded (already tried by this
//! dispatch) entries are dropped as encountered. An exhausted registry is
//! a configuration condition, not a per-call error — callers treat `None`
//! as "nothing to do".

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::debug;

use crate::registry::{ConnectionConfig, WorkerDescriptor, WorkerRegistry};

/// A worker picked for one pipeline branch, with its resolved connection.
#[derive(Debug, Clone)]
pub struct SelectedWorker {
    pub descriptor: WorkerDescriptor,
    pub connection: ConnectionConfig,
}

/// Select a random usable worker whose model is not in `excluded`.
pub fn select_worker(
    registry: &WorkerRegistry,
    excluded: &HashSet<String>,
) -> Option<SelectedWorker> {
    let mut candidates: Vec<&WorkerDescriptor> = registry.workers().iter().collect();
    candidates.shuffle(&mut thread_rng());

    for worker in candidates {
        if excluded.contains(&worker.model) {
            continue;
        }
        let Some(connection) = registry.connection(worker.provider) else {
            continue;
        };
        debug!(
            provider = %worker.provider,
            model = %worker.model,
            "selected worker"
        );
        return Some(SelectedWorker {
            descriptor: worker.clone(),
            connection: connection.clone(),
        });
    }

    debug!(
        excluded = excluded.len(),
        pool = registry.len(),
        "no usable worker"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Provider;

    fn test_registry() -> WorkerRegistry {
        WorkerRegistry::new(vec![
            WorkerDescriptor::new(Provider::Zhipu, "glm-4.6", "zhipu"),
            WorkerDescriptor::new(Provider::Moonshot, "kimi-k2-turbo-preview", "kimi"),
            WorkerDescriptor::new(Provider::Deepseek, "deepseek-chat", "deepseek"),
        ])
        .with_connection(
            Provider::Zhipu,
            ConnectionConfig {
                base_url: "http://zhipu.test".to_string(),
                api_key: "k1".to_string(),
            },
        )
        .with_connection(
            Provider::Moonshot,
            ConnectionConfig {
                base_url: "http://moonshot.test".to_string(),
                api_key: "k2".to_string(),
            },
        )
    }

    #[test]
    fn selects_only_workers_with_connections() {
        let registry = test_registry();
        // deepseek has no connection; repeated draws must never yield it
        for _ in 0..50 {
            let picked = select_worker(&registry, &HashSet::new()).unwrap();
            assert_ne!(picked.descriptor.provider, Provider::Deepseek);
        }
    }

    #[test]
    fn respects_exclusion_set() {
        let registry = test_registry();
        let excluded: HashSet<String> = ["glm-4.6".to_string()].into();
        for _ in 0..50 {
            let picked = select_worker(&registry, &excluded).unwrap();
            assert_eq!(picked.descriptor.model, "kimi-k2-turbo-preview");
        }
    }

    #[test]
    fn exhausted_registry_yields_none() {
        let registry = test_registry();
        let excluded: HashSet<String> = [
            "glm-4.6".to_string(),
            "kimi-k2-turbo-preview".to_string(),
        ]
        .into();
        assert!(select_worker(&registry, &excluded).is_none());
    }

    #[test]
    fn empty_registry_yields_none() {
        let registry = WorkerRegistry::new(vec![]);
        assert!(select_worker(&registry, &HashSet::new()).is_none());
    }

    #[test]
    fn no_connections_yields_none() {
        let registry = WorkerRegistry::new(vec![WorkerDescriptor::new(
            Provider::Zhipu,
            "glm-4.6",
            "zhipu",
        )]);
        assert!(select_worker(&registry, &HashSet::new()).is_none());
    }

    #[test]
    fn eventually_picks_every_usable_worker() {
        // Shuffle-based selection should reach both configured workers.
        let registry = test_registry();
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let picked = select_worker(&registry, &HashSet::new()).unwrap();
            seen.insert(picked.descriptor.model.clone());
            if seen.len() == 2 {
                break;
            }
        }
        assert_eq!(seen.len(), 2);
    }
}
