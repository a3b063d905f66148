//! Source scanner — walks a directory tree and builds the class
//! registry plus the constant doc side table.
//!
//! The registry is the only shared state in the pipeline: it is built
//! here in one pass and read-only afterwards.

use crate::model::ClassFacts;
use crate::parser;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the walker needs: matched classes in name order and the
/// `Type::CONST` -> raw doc-block side table.
#[derive(Debug, Default)]
pub struct Registry {
    pub classes: BTreeMap<String, ClassFacts>,
    pub constant_docs: HashMap<String, String>,
}

impl Registry {
    /// Raw doc block for one constant, empty if none was recorded.
    pub fn constant_doc(&self, class: &str, constant: &str) -> &str {
        self.constant_docs
            .get(&format!("{}::{}", class, constant))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Scan `root` for classes. Files whose path matches `file_pattern`
/// are parsed; classes whose name matches `class_pattern` enter the
/// registry. A missing or non-directory root is the one fatal error.
pub fn scan(root: &Path, file_pattern: &Regex, class_pattern: &Regex) -> Result<Registry> {
    if !root.is_dir() {
        bail!(
            "scan path does not exist or is not a directory: {}",
            root.display()
        );
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)
        .with_context(|| format!("failed to walk {}", root.display()))?;
    // Sort for deterministic scanning order.
    files.sort();

    let mut registry = Registry::default();

    for path in &files {
        if !file_pattern.is_match(&path.to_string_lossy()) {
            continue;
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("warning: skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let facts = parser::php::parse(&content);
        registry.constant_docs.extend(facts.constant_docs);

        for mut class in facts.classes {
            if !class_pattern.is_match(&class.name) {
                continue;
            }
            class.file = path.to_string_lossy().to_string();
            registry.classes.insert(class.name.clone(), class);
        }
    }

    resolve_user_defined(&mut registry);

    Ok(registry)
}

/// Flag parent and interface references that point at classes found in
/// this scan, as opposed to external ones.
fn resolve_user_defined(registry: &mut Registry) {
    let known: Vec<String> = registry.classes.keys().cloned().collect();

    for class in registry.classes.values_mut() {
        if let Some(parent) = &mut class.parent {
            parent.user_defined = known.contains(&parent.name);
        }
        for interface in &mut class.interfaces {
            interface.user_defined = known.contains(&interface.name);
        }
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = scan(
            Path::new("/no/such/dir"),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn registry_is_name_ordered() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.php", "<?php\nclass Zeta {\n}\nclass Alpha {\n}\n");
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap();
        let names: Vec<&String> = registry.classes.keys().collect();
        assert_eq!(names, ["Alpha", "Zeta"]);
    }

    #[test]
    fn file_pattern_filters_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.php", "<?php\nclass InPhp {\n}\n");
        write(&dir, "a.txt", "<?php\nclass InTxt {\n}\n");
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap();
        assert!(registry.classes.contains_key("InPhp"));
        assert!(!registry.classes.contains_key("InTxt"));
    }

    #[test]
    fn class_pattern_filters_classes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.php", "<?php\nclass AppThing {\n}\nclass Other {\n}\n");
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new("^App").unwrap(),
        )
        .unwrap();
        assert!(registry.classes.contains_key("AppThing"));
        assert!(!registry.classes.contains_key("Other"));
    }

    #[test]
    fn user_defined_resolved_across_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "base.php", "<?php\nclass Base {\n}\n");
        write(
            &dir,
            "child.php",
            "<?php\nclass Child extends Base implements Countable {\n}\n",
        );
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap();
        let child = &registry.classes["Child"];
        assert!(child.parent.as_ref().unwrap().user_defined);
        assert!(!child.interfaces[0].user_defined);
    }

    #[test]
    fn constant_docs_land_in_side_table() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "c.php",
            "<?php\nclass C {\n    /**\n     * Limit.\n     */\n    const MAX = 10;\n}\n",
        );
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap();
        assert!(registry.constant_doc("C", "MAX").contains("Limit."));
        assert_eq!(registry.constant_doc("C", "OTHER"), "");
    }

    #[test]
    fn scan_recurses_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(
            dir.path().join("sub/deep.php"),
            "<?php\nclass Deep {\n}\n",
        )
        .unwrap();
        let registry = scan(
            dir.path(),
            &Regex::new(r"\.php$").unwrap(),
            &Regex::new(".*").unwrap(),
        )
        .unwrap();
        assert!(registry.classes.contains_key("Deep"));
    }
}
