use log::debug;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::TypeCatalog;
use crate::config::FinderConfig;
use crate::error::{FinderError, Result};
use crate::filter::AttributeFilter;
use crate::probe::probe_file;
use crate::registry::ClassRegistry;
use crate::scan::{PathSet, ScanRoot, enumerate};

/// Entry point: collect roots, optionally an attribute filter, then call
/// [`ClassFinder::find`].
///
/// ```no_run
/// use class_scan::{ClassFinder, StaticCatalog};
/// use std::sync::Arc;
///
/// # fn main() -> class_scan::Result<()> {
/// let catalog = Arc::new(StaticCatalog::new().with_class("Acme\\Shapes\\Widget"));
/// let classes = ClassFinder::new(catalog)
///     .scan(["src", "lib/Models/*"])
///     .find()?;
/// for (fingerprint, info) in &classes {
///     println!("{fingerprint} {info}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClassFinder {
    catalog: Arc<dyn TypeCatalog>,
    config: FinderConfig,
    paths: PathSet,
    filter: AttributeFilter,
}

impl ClassFinder {
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self {
            catalog,
            config: FinderConfig::default(),
            paths: PathSet::new(),
            filter: AttributeFilter::new(),
        }
    }

    pub fn with_config(catalog: Arc<dyn TypeCatalog>, config: FinderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(catalog)
        })
    }

    /// Adds several roots; each is recursive unless it ends in the
    /// non-recursive marker.
    pub fn scan<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for dir in directories {
            self.paths.add(dir, None, &self.config.non_recursive_marker);
        }
        self
    }

    pub fn in_directory(mut self, path: impl AsRef<Path>, recursive: Option<bool>) -> Self {
        self.paths.add(path, recursive, &self.config.non_recursive_marker);
        self
    }

    /// Restricts results to classes carrying the named attribute types.
    /// Unknown names are rejected here, before anything is scanned.
    pub fn with_attribute<I, S>(mut self, names: I, require_all: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter.with_attribute(&self.catalog, names, require_all)?;
        Ok(self)
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn filter(&self) -> &AttributeFilter {
        &self.filter
    }

    /// Every class discovered under the roots, before attribute filtering.
    pub fn registry(&self) -> Result<ClassRegistry> {
        if self.paths.is_empty() {
            return Err(FinderError::Configuration(
                "no directories to scan".to_string(),
            ));
        }

        let mut registry = ClassRegistry::new();
        for root in self.paths.roots() {
            if self.config.parallel {
                self.scan_root_parallel(root, &mut registry)?;
            } else {
                self.scan_root(root, &mut registry)?;
            }
        }
        Ok(registry)
    }

    /// Discovered classes that pass the attribute filter.
    ///
    /// Every call walks the roots and reads the candidate files again; keep
    /// the returned registry to reuse one scan.
    pub fn find(&self) -> Result<ClassRegistry> {
        let mut registry = self.registry()?;
        if self.filter.is_empty() {
            return Ok(registry);
        }

        let mut rejected = HashSet::new();
        for (key, info) in &registry {
            if !self.filter.matches(info)? {
                rejected.insert(*key);
            }
        }
        debug!(
            "Attribute filter kept {} of {} classes",
            registry.count() - rejected.len(),
            registry.count()
        );
        registry.retain(|key, _| !rejected.contains(key));
        Ok(registry)
    }

    /// Number of classes [`find`](Self::find) would return. This runs a full
    /// scan each time; use `find()?.count()` on a kept result instead of
    /// calling it repeatedly.
    pub fn count(&self) -> Result<usize> {
        Ok(self.find()?.count())
    }

    fn scan_root(&self, root: &ScanRoot, registry: &mut ClassRegistry) -> Result<()> {
        let mut files = 0usize;
        let mut added = 0usize;
        for path in enumerate(&root.path, root.recursive, &self.config)? {
            let path = path?;
            files += 1;
            if let Some(info) = probe_file(&path, &self.catalog, &self.config)?
                && registry.register(info)
            {
                added += 1;
            }
        }
        debug!(
            "Scanned {files} files under {}, {added} new classes",
            root.path.display()
        );
        Ok(())
    }

    fn scan_root_parallel(&self, root: &ScanRoot, registry: &mut ClassRegistry) -> Result<()> {
        let files: Vec<PathBuf> =
            enumerate(&root.path, root.recursive, &self.config)?.collect::<Result<_>>()?;
        let found: Vec<_> = files
            .par_iter()
            .map(|path| probe_file(path, &self.catalog, &self.config))
            .collect::<Result<_>>()?;

        let mut added = 0usize;
        for info in found.into_iter().flatten() {
            if registry.register(info) {
                added += 1;
            }
        }
        debug!(
            "Scanned {} files under {} in parallel, {added} new classes",
            files.len(),
            root.path.display()
        );
        Ok(())
    }
}
