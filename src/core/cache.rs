//! Derived ledgers cached by the content hash of the source file.

use super::ledger::{derive_ledger, Ledger, LedgerError, RawTable};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Hex encoded SHA-256 of the file contents.
pub fn content_key(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Default)]
pub struct LedgerCache {
    entries: HashMap<String, Arc<Ledger>>,
}

impl LedgerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ledger derived from `bytes`, deriving it on first sight of the content.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Arc<Ledger>, LedgerError> {
        let key = content_key(bytes);
        if let Some(ledger) = self.entries.get(&key) {
            log::debug!("Ledger cache hit {}", &key[..12]);
            return Ok(Arc::clone(ledger));
        }
        let raw = RawTable::read_csv(bytes)?;
        let ledger = Arc::new(derive_ledger(&raw)?);
        self.entries.insert(key, Arc::clone(&ledger));
        Ok(ledger)
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.entries.contains_key(&content_key(bytes))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
    }
}

/// One analysis session: the currently loaded ledger plus the load cache.
#[derive(Debug, Default)]
pub struct Session {
    cache: LedgerCache,
    current: Option<Arc<Ledger>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: &Path) -> Result<Arc<Ledger>, LedgerError> {
        let bytes = std::fs::read(path)?;
        self.open_bytes(&bytes)
    }

    /// Load a file's contents. A failed load leaves the session without a ledger.
    pub fn open_bytes(&mut self, bytes: &[u8]) -> Result<Arc<Ledger>, LedgerError> {
        self.current = None;
        let ledger = self.cache.load(bytes)?;
        self.current = Some(Arc::clone(&ledger));
        Ok(ledger)
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.current.as_deref()
    }

    pub fn cache(&self) -> &LedgerCache {
        &self.cache
    }

    /// Drop the current ledger and everything cached.
    pub fn reset(&mut self) {
        self.current = None;
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "년월,수익코드,캠퍼스,브랜드,사업부,매출액\n202401,R,C,B,U,100\n";

    #[test]
    fn same_content_is_derived_once() {
        let mut cache = LedgerCache::new();
        let first = cache.load(CSV.as_bytes()).unwrap();
        let second = cache.load(CSV.as_bytes()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other = format!("{CSV}202402,R,C,B,U,200\n");
        let third = cache.load(other.as_bytes()).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_clears_entries() {
        let mut cache = LedgerCache::new();
        cache.load(CSV.as_bytes()).unwrap();
        assert!(cache.contains(CSV.as_bytes()));
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(!cache.contains(CSV.as_bytes()));
    }

    #[test]
    fn content_key_is_sha256_hex() {
        assert_eq!(
            content_key(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut session = Session::new();
        session.open_bytes(CSV.as_bytes()).unwrap();
        assert!(session.ledger().is_some());

        let err = session.open_bytes("년월,매출액\n202401,1\n".as_bytes());
        assert!(err.is_err());
        assert!(session.ledger().is_none());
        assert_eq!(session.cache().len(), 1);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut session = Session::new();
        session.open_bytes(CSV.as_bytes()).unwrap();
        session.reset();
        assert!(session.ledger().is_none());
        assert!(session.cache().is_empty());
    }
}
