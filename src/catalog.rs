//! The reflection side of discovery.
//!
//! Scanning only guesses identities from text. A [`TypeCatalog`] is the
//! authority that confirms an identity is live, reports the attributes
//! attached to it, and builds instances on demand.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{FinderError, Result};

pub type Instance = Box<dyn Any + Send>;

/// One attribute attached to a type: its declared type name and the
/// arguments it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub type_name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl Attribute {
    pub fn new(type_name: impl Into<String>, arguments: Value) -> Self {
        let type_name: String = type_name.into();
        Self {
            type_name: canonical(&type_name),
            arguments,
        }
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_name == name.trim_start_matches('\\')
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.type_name)
    }

    /// Materializes the attribute's arguments as `T`.
    pub fn instantiate<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.arguments.clone()).map_err(|e| {
            FinderError::reflection(
                &self.type_name,
                format!("cannot instantiate attribute: {e}"),
            )
        })
    }
}

/// Last segment of a namespaced name.
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

pub trait TypeCatalog: Send + Sync {
    /// Whether `class_name` names a live type.
    fn resolves(&self, class_name: &str) -> bool;

    fn attributes(&self, class_name: &str) -> Result<Vec<Attribute>>;

    fn defining_file(&self, class_name: &str) -> Option<PathBuf>;

    /// Whether `name` is a known attribute type. Used to reject filter
    /// configurations before any scanning happens.
    fn knows_attribute(&self, name: &str) -> bool;

    fn instantiate(&self, class_name: &str, args: &[Value]) -> Result<Instance>;
}

type Constructor = Arc<dyn Fn(&[Value]) -> anyhow::Result<Instance> + Send + Sync>;

#[derive(Clone, Default)]
struct CatalogEntry {
    file: Option<PathBuf>,
    attributes: Vec<Attribute>,
    constructor: Option<Constructor>,
}

/// An in-memory [`TypeCatalog`] populated up front.
#[derive(Clone, Default)]
pub struct StaticCatalog {
    classes: HashMap<String, CatalogEntry>,
    attribute_types: HashSet<String>,
}

impl fmt::Debug for StaticCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&String> = self.classes.keys().collect();
        classes.sort();
        f.debug_struct("StaticCatalog")
            .field("classes", &classes)
            .field("attribute_types", &self.attribute_types.len())
            .finish()
    }
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.classes.entry(canonical(class_name)).or_default();
        self
    }

    pub fn with_class_in(mut self, class_name: &str, file: impl Into<PathBuf>) -> Self {
        self.classes.entry(canonical(class_name)).or_default().file = Some(file.into());
        self
    }

    /// Attaches an attribute to a class, registering both if needed.
    pub fn with_attribute(mut self, class_name: &str, attribute: Attribute) -> Self {
        self.attribute_types.insert(canonical(&attribute.type_name));
        self.classes
            .entry(canonical(class_name))
            .or_default()
            .attributes
            .push(attribute);
        self
    }

    pub fn with_attribute_type(mut self, name: &str) -> Self {
        self.attribute_types.insert(canonical(name));
        self
    }

    pub fn with_constructor<F>(mut self, class_name: &str, constructor: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.classes
            .entry(canonical(class_name))
            .or_default()
            .constructor = Some(Arc::new(constructor));
        self
    }

    pub fn without_class(mut self, class_name: &str) -> Self {
        self.classes.remove(&canonical(class_name));
        self
    }

    fn entry(&self, class_name: &str) -> Result<&CatalogEntry> {
        self.classes
            .get(class_name.trim_start_matches('\\'))
            .ok_or_else(|| FinderError::reflection(class_name, "class is not loaded"))
    }
}

impl TypeCatalog for StaticCatalog {
    fn resolves(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name.trim_start_matches('\\'))
    }

    fn attributes(&self, class_name: &str) -> Result<Vec<Attribute>> {
        Ok(self.entry(class_name)?.attributes.clone())
    }

    fn defining_file(&self, class_name: &str) -> Option<PathBuf> {
        self.classes
            .get(class_name.trim_start_matches('\\'))
            .and_then(|e| e.file.clone())
    }

    fn knows_attribute(&self, name: &str) -> bool {
        self.attribute_types.contains(name.trim_start_matches('\\'))
    }

    fn instantiate(&self, class_name: &str, args: &[Value]) -> Result<Instance> {
        let constructor = self.entry(class_name)?.constructor.as_ref().ok_or_else(|| {
            FinderError::reflection(class_name, "class has no registered constructor")
        })?;
        constructor(args).map_err(|e| FinderError::reflection(class_name, format!("{e:#}")))
    }
}

fn canonical(name: &str) -> String {
    name.trim_start_matches('\\').to_string()
}
