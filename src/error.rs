use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Failed to read path: {}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Reflection failed for {class_name}: {message}")]
    Reflection { class_name: String, message: String },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Expected at most one {attribute} attribute on {class_name}, found {count}")]
    AmbiguousAttribute {
        class_name: String,
        attribute: String,
        count: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FinderError {
    pub(crate) fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn reflection(class_name: &str, message: impl Into<String>) -> Self {
        Self::Reflection {
            class_name: class_name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
