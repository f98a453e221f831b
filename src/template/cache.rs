//! Template cache
//!
//! Loading a template means unzipping it and walking its styles, so
//! converters keep one [`StyleMapper`] per template path. The cache is an
//! ordinary value owned by the caller; share it with an `Arc` when several
//! converters need it.

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::mapper::{MapperOptions, StyleMapper};
use super::reader::TemplateReader;
use crate::error::TemplateError;

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<PathBuf, Arc<StyleMapper>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mapper for `path`, loading the template on a miss.
    ///
    /// Two callers missing at the same time may both load; the last insert wins.
    pub fn get_or_load(
        &self,
        path: &Path,
        options: &MapperOptions,
    ) -> Result<Arc<StyleMapper>, TemplateError> {
        if let Some(mapper) = self.get(path) {
            return Ok(mapper);
        }

        debug!("Template cache miss for {}", path.display());
        let reader = Arc::new(TemplateReader::load(path)?);
        let mapper = Arc::new(StyleMapper::new(reader, options.clone()));
        self.insert(path, Arc::clone(&mapper));
        Ok(mapper)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<StyleMapper>> {
        self.entries.read().get(path).cloned()
    }

    pub fn insert(&self, path: &Path, mapper: Arc<StyleMapper>) {
        self.entries.write().insert(path.to_path_buf(), mapper);
    }

    /// Drop the entry for `path`, returning whether one existed
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.write().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
