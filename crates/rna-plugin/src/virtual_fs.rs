//! In-memory modules produced by dependency builds.
//!
//! Each path maps to a single shared computation. The first request for a path
//! registers the computation; every later request, concurrent or not, awaits
//! the same one. Entries live for the whole server session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::BundleError;

/// Body of a virtual module.
pub type ModuleBody = Arc<str>;

/// Outcome of the computation behind a virtual module.
pub type BodyResult = Result<ModuleBody, BundleError>;

/// Cloneable handle to a pending or finished computation.
pub type PendingBody = Shared<BoxFuture<'static, BodyResult>>;

/// Outcome of [`VirtualFs::register`].
pub enum Slot {
    /// The computation was created by this call.
    Registered(PendingBody),
    /// Another caller registered the path first.
    Existing(PendingBody),
}

impl Slot {
    pub fn is_registered(&self) -> bool {
        matches!(self, Slot::Registered(_))
    }
}

/// Concurrent map from absolute file path to virtual module.
#[derive(Clone, Default)]
pub struct VirtualFs {
    entries: Arc<DashMap<PathBuf, PendingBody>>,
}

impl VirtualFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<PendingBody> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// Await the module at `path`, if one is registered.
    pub async fn read(&self, path: &Path) -> Option<BodyResult> {
        let pending = self.get(path)?;
        Some(pending.await)
    }

    /// Register `path` unless it is already present.
    ///
    /// `start` runs only when the path is vacant, while the map entry is held,
    /// so it must not touch this map synchronously.
    pub fn register<F>(&self, path: PathBuf, start: F) -> Slot
    where
        F: FnOnce() -> BoxFuture<'static, BodyResult>,
    {
        match self.entries.entry(path) {
            Entry::Occupied(entry) => Slot::Existing(entry.get().clone()),
            Entry::Vacant(entry) => {
                let pending = start().shared();
                entry.insert(pending.clone());
                Slot::Registered(pending)
            }
        }
    }

    /// Publish a finished body. An existing entry for `path` wins.
    pub fn publish(&self, path: PathBuf, body: ModuleBody) -> bool {
        match self.entries.entry(path) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(futures::future::ready(Ok(body)).boxed().shared());
                true
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

impl std::fmt::Debug for VirtualFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFs")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn register_runs_start_once() {
        let fs = VirtualFs::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let path = PathBuf::from("/p/node_modules/a/index.js");

        for _ in 0..3 {
            let starts = Arc::clone(&starts);
            fs.register(path.clone(), move || {
                starts.fetch_add(1, Ordering::SeqCst);
                async { Ok(ModuleBody::from("export default 1;")) }.boxed()
            });
        }

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        let body = fs.read(&path).await.unwrap().unwrap();
        assert_eq!(&*body, "export default 1;");
    }

    #[tokio::test]
    async fn failures_are_shared() {
        let fs = VirtualFs::new();
        let path = PathBuf::from("/x.js");
        let slot = fs.register(path.clone(), || {
            async { Err(BundleError::NoOutput(PathBuf::from("/x.js"))) }.boxed()
        });
        assert!(slot.is_registered());

        let first = fs.read(&path).await.unwrap();
        let second = fs.read(&path).await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_err());
    }

    #[tokio::test]
    async fn publish_keeps_existing_entry() {
        let fs = VirtualFs::new();
        let path = PathBuf::from("/chunk.js");
        assert!(fs.publish(path.clone(), ModuleBody::from("first")));
        assert!(!fs.publish(path.clone(), ModuleBody::from("second")));
        assert_eq!(&*fs.read(&path).await.unwrap().unwrap(), "first");
        assert_eq!(fs.len(), 1);
        assert!(fs.read(Path::new("/missing.js")).await.is_none());
    }
}
