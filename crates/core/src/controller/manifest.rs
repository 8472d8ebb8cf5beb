//! Precache manifest resolution.

use url::Url;

use crate::Error;
use crate::cache::key::{canonicalize, request_key};

/// Ordered, de-duplicated set of absolute URLs fetched at install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheManifest {
    urls: Vec<Url>,
}

impl PrecacheManifest {
    /// Resolve manifest entries against `scope`.
    ///
    /// Entries that canonicalize to the same request key keep their first
    /// position; later duplicates are dropped.
    pub fn resolve<I, T>(entries: I, scope: &Url) -> Result<Self, Error>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut urls: Vec<Url> = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            let url = canonicalize(entry, scope).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")))?;
            if !urls.iter().any(|u| request_key(u) == request_key(&url)) {
                urls.push(url);
            }
        }
        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
