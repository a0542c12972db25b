use std::{collections::HashSet, sync::Arc};

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::{
    pool::LocalPool,
    remote::RemoteSource,
    store::{DataStore, WatchEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub url: String,
    pub origin: VideoOrigin,
}

pub struct Resolver {
    remote: Arc<dyn RemoteSource>,
    remote_categories: HashSet<String>,
}

impl Resolver {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        remote_categories: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            remote,
            remote_categories: remote_categories.into_iter().collect(),
        }
    }

    pub fn supports_remote(&self, category: &str) -> bool {
        self.remote_categories.contains(category)
    }

    pub async fn resolve(&self, category: &str, pool: &LocalPool) -> Option<ResolvedVideo> {
        let local = pool.get(category);
        let has_local = !local.is_empty();
        let has_remote = self.supports_remote(category);

        let resolved = match (has_local, has_remote) {
            (true, true) => {
                if rand::random::<bool>() {
                    pick_local(local)
                } else {
                    self.fetch_remote(category).await
                }
            }
            (true, false) => pick_local(local),
            (false, true) => self.fetch_remote(category).await,
            (false, false) => None,
        };

        // One extra remote attempt for remote-supported categories, whichever branch ran.
        if resolved.is_none() && has_remote {
            debug!("No clip for category {category:?} yet, retrying remote API once.");
            return self.fetch_remote(category).await;
        }

        resolved
    }

    async fn fetch_remote(&self, category: &str) -> Option<ResolvedVideo> {
        match self.remote.fetch(category).await {
            Ok(response) => {
                let code = response.code;
                let url = response.into_video_url();
                if url.is_none() {
                    debug!("Remote API returned no clip for {category:?} (code {code:?}).");
                }
                url.map(|url| ResolvedVideo {
                    url,
                    origin: VideoOrigin::Remote,
                })
            }
            Err(error) => {
                warn!("Remote API miss for category {category:?}: {error}");
                None
            }
        }
    }
}

fn pick_local(urls: &[String]) -> Option<ResolvedVideo> {
    urls.choose(&mut rand::thread_rng()).map(|url| ResolvedVideo {
        url: url.clone(),
        origin: VideoOrigin::Local,
    })
}

/// Failures are logged and dropped.
pub fn spawn_watch_record(store: DataStore, event: WatchEvent) {
    tokio::spawn(async move {
        if let Err(error) = store.record_watch(event).await {
            warn!("Could not record watch event: {}", error.message);
        }
    });
}
