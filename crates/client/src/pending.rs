//! In-flight request registry.
//!
//! Requests are keyed by method, URL, query and body. Registering a key that
//! is already in flight aborts the earlier task, so only the newest of a burst
//! of identical calls completes.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::task::AbortHandle;
use tracing::debug;

pub fn request_key(method: &str, url: &str, query: &[(String, String)], body: Option<&str>) -> String {
    let mut q: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    q.sort();
    format!("{} {}?{}#{}", method.to_ascii_uppercase(), url, q.join("&"), body.unwrap_or(""))
}

#[derive(Debug, Default)]
pub struct PendingRequests {
    inflight: DashMap<String, (u64, AbortHandle)>,
    next: AtomicU64,
}

impl PendingRequests {
    pub fn new() -> Self { Self::default() }

    /// Track `handle` under `key`, aborting whatever was there. Returns the
    /// ticket to pass to [`PendingRequests::finish`].
    pub fn register(&self, key: &str, handle: AbortHandle) -> u64 {
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self.inflight.insert(key.to_string(), (ticket, handle)) {
            debug!(%key, "cancelling duplicate in-flight request");
            previous.abort();
        }
        ticket
    }

    /// Forget `key` unless a newer request already took it over.
    pub fn finish(&self, key: &str, ticket: u64) {
        self.inflight.remove_if(key, |_, (t, _)| *t == ticket);
    }

    /// Like [`PendingRequests::register`], but the entry is finished when
    /// the returned guard drops, including when the caller is cancelled.
    pub fn track<'a>(&'a self, key: &'a str, handle: AbortHandle) -> Tracked<'a> {
        let ticket = self.register(key, handle);
        Tracked { pending: self, key, ticket }
    }

    pub fn len(&self) -> usize { self.inflight.len() }

    pub fn is_empty(&self) -> bool { self.inflight.is_empty() }
}

pub struct Tracked<'a> {
    pending: &'a PendingRequests,
    key: &'a str,
    ticket: u64,
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        self.pending.finish(self.key, self.ticket);
    }
}
