//! `AssetCache`: logical image key → loaded bitmap.
//!
//! Loading itself is delegated to an [`ImageLoader`] supplied by the host
//! (an `HtmlImageElement` in the browser, the filesystem natively).  The
//! loader only *starts* a load; the host later reports the outcome through
//! [`AssetCache::finish`] from the same thread that owns the cache, so no
//! locking is needed.

use std::collections::HashMap;

use crate::types::Size;

/// Key under which the world map image is cached.
pub const WORLD_MAP_KEY: &str = "world";

/// Cache key of one avatar frame.
pub fn avatar_frame_key(avatar: &str, compass: &str, index: usize) -> String {
    format!("avatar/{avatar}/{compass}/{index}")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load {url}: {reason}")]
    LoadFailed { url: String, reason: String },
    #[error("unsupported image {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// A loaded image handle.
pub trait Bitmap {
    /// Natural size in pixels.
    fn size(&self) -> Size;
}

/// Host capability: begin loading `url` and, once done, report the result
/// for `key` back to the cache owner.
pub trait ImageLoader {
    type Bitmap: Bitmap;

    fn load(&mut self, key: &str, url: &str);
}

#[derive(Debug)]
enum Entry<B> {
    Pending { url: String },
    Ready(B),
}

/// Outcome of [`AssetCache::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensure {
    /// Already loaded.
    Ready,
    /// A load for this key is already in flight.
    Pending,
    /// A new load was handed to the loader.
    Started,
    /// The cache was closed by session teardown.
    Closed,
}

#[derive(Debug)]
pub struct AssetCache<B> {
    entries: HashMap<String, Entry<B>>,
    closed: bool,
}

impl<B> Default for AssetCache<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            closed: false,
        }
    }
}

impl<B: Bitmap> AssetCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `key` is loaded or loading.  Starts at most one load per key.
    pub fn ensure<L>(&mut self, key: &str, url: &str, loader: &mut L) -> Ensure
    where
        L: ImageLoader<Bitmap = B>,
    {
        match self.entries.get(key) {
            Some(Entry::Ready(_)) => Ensure::Ready,
            Some(Entry::Pending { .. }) => Ensure::Pending,
            None if self.closed => Ensure::Closed,
            None => {
                log::debug!("[assets] loading {} from {}", key, url);
                self.entries
                    .insert(key.to_string(), Entry::Pending { url: url.into() });
                loader.load(key, url);
                Ensure::Started
            }
        }
    }

    /// Record the outcome of a load.
    ///
    /// Returns `Ok(true)` when `key` just became ready, `Ok(false)` when the
    /// completion was stale (no load pending for that key).  A failure evicts
    /// the entry so a later [`ensure`](Self::ensure) retries.
    pub fn finish(&mut self, key: &str, result: Result<B, AssetError>) -> Result<bool, AssetError> {
        let pending = matches!(self.entries.get(key), Some(Entry::Pending { .. }));
        if !pending {
            log::debug!("[assets] ignoring stale completion for {}", key);
            return Ok(false);
        }
        match result {
            Ok(bitmap) => {
                self.entries.insert(key.to_string(), Entry::Ready(bitmap));
                Ok(true)
            }
            Err(e) => {
                self.entries.remove(key);
                log::warn!("[assets] {} evicted: {}", key, e);
                Err(e)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&B> {
        match self.entries.get(key) {
            Some(Entry::Ready(b)) => Some(b),
            _ => None,
        }
    }

    pub fn is_ready(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Entry::Pending { .. }))
    }

    /// URL of an in-flight load.
    pub fn pending_url(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(Entry::Pending { url }) => Some(url),
            _ => None,
        }
    }

    pub fn ready_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len() - self.ready_count()
    }

    /// Stop accepting new loads.  Ready entries stay readable.
    pub fn close(&mut self) {
        self.closed = true;
        self.entries.retain(|_, e| matches!(e, Entry::Ready(_)));
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
