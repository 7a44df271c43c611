use indexmap::IndexMap;
use log::warn;
use std::sync::Arc;

use crate::catalog::{TypeCatalog, short_name};
use crate::class_info::ClassInfo;
use crate::error::{FinderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    #[default]
    Unset,
    Any,
    All,
}

/// Required attribute types and how many of them a class must carry.
///
/// The policy is fixed by the first [`AttributeFilter::with_attribute`] call.
/// Nothing is reflected until [`AttributeFilter::matches`] runs.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    required: IndexMap<String, String>,
    policy: MatchPolicy,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute<I, S>(
        &mut self,
        catalog: &Arc<dyn TypeCatalog>,
        names: I,
        require_all: bool,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = Vec::new();
        for name in names {
            let name = name.as_ref().trim().trim_start_matches('\\');
            if name.is_empty() {
                return Err(FinderError::Configuration(
                    "attribute name must not be empty".to_string(),
                ));
            }
            if !catalog.knows_attribute(name) {
                return Err(FinderError::Configuration(format!(
                    "unknown attribute type: {name}"
                )));
            }
            accepted.push(name.to_string());
        }

        let requested = if require_all {
            MatchPolicy::All
        } else {
            MatchPolicy::Any
        };
        match self.policy {
            MatchPolicy::Unset => self.policy = requested,
            current if current != requested => {
                warn!("Attribute filter policy already set to {current:?}; ignoring {requested:?}");
            }
            _ => {}
        }

        for name in accepted {
            let display = short_name(&name).to_string();
            self.required.entry(name).or_insert(display);
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Required attribute type names mapped to their short display names.
    pub fn required(&self) -> &IndexMap<String, String> {
        &self.required
    }

    pub fn matches(&self, info: &ClassInfo) -> Result<bool> {
        if self.required.is_empty() {
            return Ok(true);
        }
        let attributes = info.attributes(None)?;
        let carried = |name: &str| attributes.iter().any(|a| a.has_type(name));
        Ok(match self.policy {
            MatchPolicy::All => self.required.keys().all(|n| carried(n.as_str())),
            MatchPolicy::Any | MatchPolicy::Unset => self.required.keys().any(|n| carried(n.as_str())),
        })
    }
}
