use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::catalog::{Attribute, Instance, TypeCatalog};
use crate::classify::DeclarationKind;
use crate::error::{FinderError, Result};
use crate::scan::normalize_path;

/// A discovered type. Equality and hashing go by `class_name` only.
///
/// Attribute lookups go through the catalog the record was built with and
/// are cached on the record after the first call.
#[derive(Serialize)]
pub struct ClassInfo {
    class_name: String,
    basename: String,
    namespace: String,
    file: String,
    exists: bool,
    kind: Option<DeclarationKind>,
    #[serde(skip)]
    catalog: Arc<dyn TypeCatalog>,
    #[serde(skip)]
    attributes: OnceLock<Vec<Attribute>>,
}

pub fn compose_class_name(namespace: &str, basename: &str, separator: &str) -> String {
    if namespace.is_empty() {
        basename.to_string()
    } else {
        format!("{namespace}{separator}{basename}")
    }
}

impl ClassInfo {
    pub(crate) fn discovered(
        catalog: Arc<dyn TypeCatalog>,
        namespace: &str,
        basename: &str,
        separator: &str,
        kind: DeclarationKind,
        file: &Path,
    ) -> Self {
        let namespace = namespace.trim_end_matches(separator);
        let class_name = compose_class_name(namespace, basename, separator);
        let exists = catalog.resolves(&class_name);
        Self {
            class_name,
            basename: basename.to_string(),
            namespace: namespace.to_string(),
            file: normalize_path(file),
            exists,
            kind: Some(kind),
            catalog,
            attributes: OnceLock::new(),
        }
    }

    /// Builds a record for an identity the catalog already knows, taking the
    /// file from the catalog instead of scanning for it.
    pub fn from_class_name(catalog: Arc<dyn TypeCatalog>, class_name: &str) -> Result<Self> {
        let class_name = class_name.trim_start_matches('\\');
        if class_name.is_empty() {
            return Err(FinderError::Configuration(
                "class name must not be empty".to_string(),
            ));
        }
        let file = catalog.defining_file(class_name).ok_or_else(|| {
            FinderError::reflection(class_name, "no defining file is known for this class")
        })?;
        let (namespace, basename) = match class_name.rsplit_once('\\') {
            Some((ns, base)) => (ns, base),
            None => ("", class_name),
        };
        let exists = catalog.resolves(class_name);

        Ok(Self {
            class_name: class_name.to_string(),
            basename: basename.to_string(),
            namespace: namespace.to_string(),
            file: normalize_path(&file),
            exists,
            kind: None,
            catalog,
            attributes: OnceLock::new(),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// `None` when the record was built from a live identity rather than a
    /// declaration line.
    pub fn kind(&self) -> Option<DeclarationKind> {
        self.kind
    }

    /// Constructs an instance of this type through the catalog.
    pub fn invoke(&self, args: &[Value]) -> Result<Instance> {
        self.catalog.instantiate(&self.class_name, args)
    }

    pub fn attributes(&self, filter: Option<&str>) -> Result<Vec<Attribute>> {
        let all = self.reflect()?;
        Ok(match filter {
            Some(name) => all.iter().filter(|a| a.has_type(name)).cloned().collect(),
            None => all.to_vec(),
        })
    }

    pub fn has_attribute(&self, type_name: &str) -> Result<bool> {
        Ok(self.reflect()?.iter().any(|a| a.has_type(type_name)))
    }

    /// The single attribute of `type_name`, if any. More than one is an
    /// error; use [`ClassInfo::attributes`] when several are expected.
    pub fn attribute(&self, type_name: &str) -> Result<Option<Attribute>> {
        let mut matches = self.attributes(Some(type_name))?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            count => Err(FinderError::AmbiguousAttribute {
                class_name: self.class_name.clone(),
                attribute: type_name.trim_start_matches('\\').to_string(),
                count,
            }),
        }
    }

    fn reflect(&self) -> Result<&[Attribute]> {
        if let Some(cached) = self.attributes.get() {
            return Ok(cached.as_slice());
        }
        let fetched = self.catalog.attributes(&self.class_name)?;
        Ok(self.attributes.get_or_init(|| fetched).as_slice())
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class_name)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("class_name", &self.class_name)
            .field("basename", &self.basename)
            .field("namespace", &self.namespace)
            .field("file", &self.file)
            .field("exists", &self.exists)
            .field("kind", &self.kind)
            .finish()
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.class_name == other.class_name
    }
}

impl Eq for ClassInfo {}

impl Hash for ClassInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class_name.hash(state);
    }
}
