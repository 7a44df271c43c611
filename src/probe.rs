use log::{debug, trace};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::catalog::TypeCatalog;
use crate::class_info::{ClassInfo, compose_class_name};
use crate::classify::{LineKind, classify_line, normalize_line};
use crate::config::FinderConfig;
use crate::error::{FinderError, Result};

/// Looks for the first type declaration in a source file.
///
/// Lines are read one at a time until a declaration or a stop token; the
/// rest of the file is never read. A declaration the catalog cannot resolve
/// is treated as a miss, not an error.
pub fn probe_file(
    path: &Path,
    catalog: &Arc<dyn TypeCatalog>,
    config: &FinderConfig,
) -> Result<Option<ClassInfo>> {
    let file = File::open(path).map_err(|e| FinderError::file_system(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut namespace: Option<String> = None;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| FinderError::file_system(path, e))?;
        if read == 0 {
            trace!("No declaration in {}", path.display());
            return Ok(None);
        }

        let line = normalize_line(&String::from_utf8_lossy(&buf));
        match classify_line(&line, config.stop_tokens.as_slice()) {
            LineKind::Continue => {}
            LineKind::Namespace(name) => {
                if namespace.is_none() {
                    namespace = Some(name);
                }
            }
            LineKind::StopFile => {
                trace!("Stop token before any declaration in {}", path.display());
                return Ok(None);
            }
            LineKind::Declaration { kind, basename } => {
                let namespace = namespace.unwrap_or_default();
                let class_name =
                    compose_class_name(&namespace, &basename, &config.namespace_separator);
                if !catalog.resolves(&class_name) {
                    debug!(
                        "Skipping {} in {}: not resolvable",
                        class_name,
                        path.display()
                    );
                    return Ok(None);
                }
                return Ok(Some(ClassInfo::discovered(
                    Arc::clone(catalog),
                    &namespace,
                    &basename,
                    &config.namespace_separator,
                    kind,
                    path,
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn catalog() -> Arc<dyn TypeCatalog> {
        Arc::new(
            StaticCatalog::new()
                .with_class("Acme\\Shapes\\Widget")
                .with_class("Legacy"),
        )
    }

    fn probe(content: &str) -> Result<Option<ClassInfo>> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Widget.php");
        fs::write(&path, content).unwrap();
        probe_file(&path, &catalog(), &FinderConfig::default())
    }

    #[test]
    fn namespaced_final_class_is_found() -> Result<()> {
        let info = probe(
            "<?php\n\ndeclare(strict_types=1);\n\n/**\n * A widget.\n */\nnamespace Acme\\Shapes;\n\nuse Acme\\Base\\Shape;\n\n#[Entity]\nfinal class Widget extends Shape\n{\n}\n",
        )?
        .expect("declaration should be found");
        assert_eq!(info.class_name(), "Acme\\Shapes\\Widget");
        assert_eq!(info.basename(), "Widget");
        assert_eq!(info.namespace(), "Acme\\Shapes");
        assert!(info.file().ends_with("/Widget.php"));
        assert!(info.exists());
        Ok(())
    }

    #[test]
    fn namespace_sharing_the_open_tag_line_is_kept() -> Result<()> {
        let info = probe("<?php namespace Acme\\Shapes;\n\nclass Widget {}\n")?
            .expect("declaration");
        assert_eq!(info.class_name(), "Acme\\Shapes\\Widget");
        Ok(())
    }

    #[test]
    fn class_without_namespace_uses_basename() -> Result<()> {
        let info = probe("<?php\r\nclass Legacy {\r\n}\r\n")?.expect("declaration");
        assert_eq!(info.class_name(), "Legacy");
        assert_eq!(info.namespace(), "");
        Ok(())
    }

    #[test]
    fn return_before_declaration_stops_the_scan() -> Result<()> {
        assert!(probe("<?php\n// config\nreturn;\nclass Legacy {}\n")?.is_none());
        assert!(probe("<?php\nreturn [\n  'class' => Legacy::class,\n];\n")?.is_none());
        Ok(())
    }

    #[test]
    fn file_without_declaration_yields_nothing() -> Result<()> {
        assert!(probe("<?php\nfunction helper() {}\n")?.is_none());
        assert!(probe("")?.is_none());
        Ok(())
    }

    #[test]
    fn unresolvable_declaration_is_a_silent_miss() -> Result<()> {
        assert!(probe("<?php\nnamespace Acme\\Shapes;\nclass Phantom {}\n")?.is_none());
        Ok(())
    }

    #[test]
    fn first_namespace_wins() -> Result<()> {
        let info = probe("<?php\nnamespace Acme\\Shapes;\nnamespace Other;\nclass Widget {}\n")?
            .expect("declaration");
        assert_eq!(info.namespace(), "Acme\\Shapes");
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_tolerated() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bin.php");
        let mut bytes = b"<?php\n// \xff\xfe\nnamespace Acme\\Shapes;\n".to_vec();
        bytes.extend_from_slice(b"class Widget {}\n");
        fs::write(&path, bytes).unwrap();
        let info = probe_file(&path, &catalog(), &FinderConfig::default())?;
        assert_eq!(
            info.map(|i| i.class_name().to_string()),
            Some("Acme\\Shapes\\Widget".to_string())
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_a_file_system_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = probe_file(
            &dir.path().join("Gone.php"),
            &catalog(),
            &FinderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FinderError::FileSystem { .. }));
    }

    #[test]
    fn custom_stop_tokens_are_honored() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Script.php");
        fs::write(&path, "<?php\necho 'hi';\nclass Legacy {}\n").unwrap();
        let config = FinderConfig {
            stop_tokens: vec!["echo".to_string()],
            ..FinderConfig::default()
        };
        assert!(probe_file(&path, &catalog(), &config)?.is_none());
        assert!(probe_file(&path, &catalog(), &FinderConfig::default())?.is_some());
        Ok(())
    }
}
