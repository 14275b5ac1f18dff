//! # Icons
//!
//! Renderers ask an [`IconResolver`] for "icon `name` at `width` x `height`".
//! Decoding and storing pixels is the host's business; the renderer only needs
//! a handle it can pass back to its drawing surface.
//!
//! [`IconManager`] is an in-memory resolver: icons are registered by name with
//! the sizes they are available in, and requests pick the best source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A drawable icon handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconImage {
    pub name: String,
    /// Drawn width in pixels.
    pub width: u32,
    /// Drawn height in pixels.
    pub height: u32,
    /// Size of the source the image is scaled from.
    pub source_width: u32,
    pub source_height: u32,
}

impl IconImage {
    pub fn is_scaled(&self) -> bool {
        self.width != self.source_width || self.height != self.source_height
    }
}

/// Icon lookup service injected into the renderer by the host.
pub trait IconResolver {
    /// Icon `name` at the requested size, or `None` when it cannot be provided.
    fn resolve(&mut self, name: &str, width: u32, height: u32) -> Option<IconImage>;
}

/// Resolver that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn resolve(&mut self, _name: &str, _width: u32, _height: u32) -> Option<IconImage> {
        None
    }
}

/// In-memory icon registry with a cache keyed by `name#WxH`.
#[derive(Clone, Debug, Default)]
pub struct IconManager {
    sources: HashMap<String, Vec<(u32, u32)>>,
    cache: HashMap<String, IconImage>,
}

impl IconManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` available at `width` x `height`.
    pub fn register(&mut self, name: impl Into<String>, width: u32, height: u32) {
        let sizes = self.sources.entry(name.into()).or_default();
        if !sizes.contains(&(width, height)) {
            sizes.push((width, height));
            sizes.sort_unstable();
        }
    }

    /// Forgets an icon and its cached images.
    pub fn remove(&mut self, name: &str) -> bool {
        let prefix = format!("{name}#");
        self.cache.retain(|k, _| k != name && !k.starts_with(&prefix));
        self.sources.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.cache.clear();
    }

    pub fn cached(&self, key: &str) -> Option<&IconImage> {
        self.cache.get(key)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Icon at its first registered size, cached under `name`.
    pub fn natural(&mut self, name: &str) -> Option<IconImage> {
        if let Some(hit) = self.cache.get(name) {
            return Some(hit.clone());
        }
        let (w, h) = *self.sources.get(name)?.first()?;
        let image = IconImage {
            name: name.to_string(),
            width: w,
            height: h,
            source_width: w,
            source_height: h,
        };
        self.cache.insert(name.to_string(), image.clone());
        Some(image)
    }

    /// Exact size if registered, else the smallest larger source scaled down.
    fn best_source(&self, name: &str, width: u32, height: u32) -> Option<(u32, u32)> {
        let sizes = self.sources.get(name)?;
        if sizes.contains(&(width, height)) {
            return Some((width, height));
        }
        sizes
            .iter()
            .filter(|(w, h)| *w >= width && *h >= height)
            .min_by_key(|(w, h)| u64::from(*w) * u64::from(*h))
            .copied()
    }
}

impl IconResolver for IconManager {
    fn resolve(&mut self, name: &str, width: u32, height: u32) -> Option<IconImage> {
        let key = format!("{name}#{width}x{height}");
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.clone());
        }
        let (source_width, source_height) = self.best_source(name, width, height)?;
        let image = IconImage {
            name: name.to_string(),
            width,
            height,
            source_width,
            source_height,
        };
        self.cache.insert(key, image.clone());
        Some(image)
    }
}
