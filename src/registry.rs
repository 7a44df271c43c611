use fnv::FnvHasher;
use indexmap::IndexMap;
use indexmap::map::Iter;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use crate::class_info::ClassInfo;

/// FNV-1a hash of a normalized file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of_path(normalized: &str) -> Self {
        let mut hasher = FnvHasher::default();
        hasher.write(normalized.as_bytes());
        Self(hasher.finish())
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Discovered classes keyed by the fingerprint of their file, in insertion
/// order. The first record registered for a file is the one that stays.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    entries: IndexMap<Fingerprint, Arc<ClassInfo>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record was new.
    pub fn register(&mut self, info: ClassInfo) -> bool {
        let key = Fingerprint::of_path(info.file());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Arc::new(info));
        true
    }

    pub fn all(&self) -> &IndexMap<Fingerprint, Arc<ClassInfo>> {
        &self.entries
    }

    pub fn get(&self, key: Fingerprint) -> Option<&Arc<ClassInfo>> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: Fingerprint) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Fingerprint, Arc<ClassInfo>> {
        self.entries.iter()
    }

    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Fingerprint, &mut Arc<ClassInfo>) -> bool,
    {
        self.entries.retain(keep);
    }
}

impl<'a> IntoIterator for &'a ClassRegistry {
    type Item = (&'a Fingerprint, &'a Arc<ClassInfo>);
    type IntoIter = Iter<'a, Fingerprint, Arc<ClassInfo>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for ClassRegistry {
    type Item = (Fingerprint, Arc<ClassInfo>);
    type IntoIter = indexmap::map::IntoIter<Fingerprint, Arc<ClassInfo>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ClassRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, info) in &self.entries {
            map.serialize_entry(key, info.as_ref())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StaticCatalog, TypeCatalog};
    use crate::classify::DeclarationKind;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn info(catalog: &Arc<dyn TypeCatalog>, namespace: &str, name: &str, file: &str) -> ClassInfo {
        ClassInfo::discovered(
            Arc::clone(catalog),
            namespace,
            name,
            "\\",
            DeclarationKind::Class,
            Path::new(file),
        )
    }

    fn catalog() -> Arc<dyn TypeCatalog> {
        Arc::new(StaticCatalog::new())
    }

    #[test]
    fn fingerprint_is_deterministic_and_hex_rendered() {
        let a = Fingerprint::of_path("/srv/app/src/Widget.php");
        let b = Fingerprint::of_path("/srv/app/src/Widget.php");
        let c = Fingerprint::of_path("/srv/app/src/Gadget.php");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string().len(), 16);
        assert_eq!(Fingerprint::of_path("").value(), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn register_same_file_twice_keeps_first_record() {
        let catalog = catalog();
        let mut registry = ClassRegistry::new();
        assert!(registry.register(info(&catalog, "A", "First", "/srv/x/One.php")));
        assert!(!registry.register(info(&catalog, "A", "Second", "/srv/x/One.php")));

        assert_eq!(registry.count(), 1);
        let (_, stored) = registry.iter().next().unwrap();
        assert_eq!(stored.class_name(), "A\\First");
    }

    #[test]
    fn same_identity_in_different_files_is_kept_twice() {
        let catalog = catalog();
        let mut registry = ClassRegistry::new();
        registry.register(info(&catalog, "A", "Dup", "/srv/x/One.php"));
        registry.register(info(&catalog, "A", "Dup", "/srv/y/One.php"));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let catalog = catalog();
        let mut registry = ClassRegistry::new();
        for (name, file) in [("Zeta", "/srv/z.php"), ("Alpha", "/srv/a.php"), ("Mid", "/srv/m.php")] {
            registry.register(info(&catalog, "", name, file));
        }
        let names: Vec<&str> = registry.iter().map(|(_, i)| i.basename()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);

        let key = Fingerprint::of_path("/srv/a.php");
        assert!(registry.contains(key));
        assert_eq!(registry.get(key).map(|i| i.class_name()), Some("Alpha"));
    }

    #[test]
    fn serializes_as_fingerprint_keyed_map() -> anyhow::Result<()> {
        let catalog = catalog();
        let mut registry = ClassRegistry::new();
        registry.register(info(&catalog, "Acme", "Widget", "/srv/w.php"));
        let json = serde_json::to_value(&registry)?;
        let key = Fingerprint::of_path("/srv/w.php").to_string();
        assert_eq!(json[key.as_str()]["class_name"], "Acme\\Widget");
        Ok(())
    }
}
