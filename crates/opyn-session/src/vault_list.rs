//! Every vault on an option, with its health
//!
//! One poller per watched option. A list starts out loading and stays that
//! way until its first successful refresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use convexity::{fetch_vault_views, VaultView};
use opyn_core::{Address, ChainReader, GraphReader, SourceError};
use parking_lot::Mutex;
use serde::Serialize;

use crate::poller::{Poller, Refresh};
use crate::Sources;

pub struct VaultListRefresh {
    chain: Arc<dyn ChainReader>,
    graph: Arc<dyn GraphReader>,
}

#[async_trait]
impl Refresh for VaultListRefresh {
    type Key = Address;
    type Output = Vec<VaultView>;

    fn name(&self) -> &'static str {
        "vault_list"
    }

    async fn fetch(&self, option: &Address) -> Result<Vec<VaultView>, SourceError> {
        fetch_vault_views(self.chain.as_ref(), self.graph.as_ref(), *option).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultList {
    pub option: Address,
    pub loading: bool,
    pub vaults: Vec<VaultView>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct VaultBoard {
    refresh: Arc<VaultListRefresh>,
    interval: Duration,
    pollers: Mutex<HashMap<Address, Poller<VaultListRefresh>>>,
}

impl VaultBoard {
    pub fn new(sources: &Sources, interval: Duration) -> Self {
        Self {
            refresh: Arc::new(VaultListRefresh {
                chain: Arc::clone(&sources.chain),
                graph: Arc::clone(&sources.graph),
            }),
            interval,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Start refreshing the vaults of `option`; no-op if already watched
    pub fn watch(&self, option: Address) {
        let mut pollers = self.pollers.lock();
        let poller = pollers.entry(option).or_insert_with(|| {
            tracing::debug!(%option, "Watching vaults");
            Poller::new(Arc::clone(&self.refresh), self.interval)
        });
        poller.set_key(option);
    }

    /// Watch `option` and return its current list
    pub fn list(&self, option: Address) -> VaultList {
        self.watch(option);
        let snapshot = self
            .pollers
            .lock()
            .get(&option)
            .and_then(|poller| poller.latest());

        match snapshot {
            Some(snapshot) => VaultList {
                option,
                loading: false,
                vaults: snapshot.value,
                updated_at: Some(snapshot.published_at),
            },
            None => VaultList {
                option,
                loading: true,
                vaults: Vec::new(),
                updated_at: None,
            },
        }
    }

    /// Stop refreshing `option`; returns whether it was watched
    pub fn unwatch(&self, option: Address) -> bool {
        let removed = self.pollers.lock().remove(&option);
        if let Some(poller) = &removed {
            poller.shutdown();
        }
        removed.is_some()
    }

    pub fn watched(&self) -> Vec<Address> {
        self.pollers.lock().keys().copied().collect()
    }

    pub fn shutdown(&self) {
        for (_, poller) in self.pollers.lock().drain() {
            poller.shutdown();
        }
    }
}
