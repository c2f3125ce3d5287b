use crate::errors::ProbeError;
use crate::executor::Interpreter;
use crate::package::{module_name_as_path, resolve_package_paths};
use hookprobe_config::DEFAULT_BINARY_PATTERNS;
use hookprobe_logger as logger;
use hookprobe_manifest::BinaryEntry;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Shell-style file name patterns identifying shared libraries
#[derive(Debug, Clone)]
pub struct BinaryPatterns {
    patterns: Vec<glob::Pattern>,
}

impl BinaryPatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|e| ProbeError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BinaryPatterns { patterns })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }

    fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.matches(n))
    }
}

impl Default for BinaryPatterns {
    fn default() -> Self {
        BinaryPatterns {
            patterns: DEFAULT_BINARY_PATTERNS
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect(),
        }
    }
}

/// Libraries directly inside `dir`, sorted; a missing directory has none
pub fn libraries_in_dir(dir: &Path, patterns: &BinaryPatterns) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut libraries: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && patterns.matches_path(p))
        .collect();
    libraries.sort();
    libraries
}

/// Libraries anywhere below `dir`, in walk order
pub fn libraries_in_subdirs(dir: &Path, patterns: &BinaryPatterns) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir() && patterns.matches_path(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Pair every library below `source_root` with its place under `target_root`
///
/// The relative directory of each library is kept, so
/// `source_root/sub/lib.so` lands at `target_root/sub/lib.so`.
pub fn collect_binaries(
    source_root: &Path,
    target_root: &Path,
    patterns: &BinaryPatterns,
) -> Result<Vec<BinaryEntry>, ProbeError> {
    if !source_root.is_dir() {
        return Err(ProbeError::NotADirectory(source_root.to_path_buf()));
    }

    let binaries: Vec<BinaryEntry> = libraries_in_subdirs(source_root, patterns)
        .into_iter()
        .filter_map(|source| {
            let relative = source.strip_prefix(source_root).ok()?.to_path_buf();
            Some(BinaryEntry::new(target_root.join(relative), source))
        })
        .collect();

    for binary in &binaries {
        logger::debug(&format!(
            "Binary {} -> {}",
            binary.source.display(),
            binary.dest.display()
        ));
    }
    Ok(binaries)
}

/// Libraries shipped inside a package, placed under the package's own path
///
/// Plain modules fail with [`ProbeError::NotAPackage`]; their directory is
/// somebody else's.
pub fn collect_package_binaries(
    interpreter: &dyn Interpreter,
    name: &str,
    patterns: &BinaryPatterns,
) -> Result<Vec<BinaryEntry>, ProbeError> {
    let location = resolve_package_paths(interpreter, name)?;
    collect_binaries(&location.package_dir, &module_name_as_path(name), patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;
    use crate::testing::FakeInterpreter;
    use tempfile::TempDir;

    fn touch(path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(path, "");
    }

    #[test]
    fn test_default_patterns() {
        let patterns = BinaryPatterns::default();
        assert!(patterns.matches("libfoo.so"));
        assert!(patterns.matches("foo.dll"));
        assert!(patterns.matches("libfoo.dylib"));
        assert!(!patterns.matches("foo.py"));
        assert!(!patterns.matches("libfoo.so.1"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            BinaryPatterns::new(["[unclosed"]),
            Err(ProbeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_collect_keeps_relative_dirs() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let src = temp_dir.path().join("src");
        touch(src.join("sub/lib.so"));
        touch(src.join("top.dll"));
        touch(src.join("notes.txt"));

        let binaries = collect_binaries(&src, Path::new("pkg"), &BinaryPatterns::default()).unwrap_or_default();

        assert_eq!(
            binaries,
            vec![
                BinaryEntry::new("pkg/sub/lib.so", src.join("sub/lib.so")),
                BinaryEntry::new("pkg/top.dll", src.join("top.dll")),
            ]
        );
    }

    #[test]
    fn test_collect_from_missing_root() {
        let result = collect_binaries(
            Path::new("/nonexistent/src"),
            Path::new("pkg"),
            &BinaryPatterns::default(),
        );
        assert!(matches!(result, Err(ProbeError::NotADirectory(_))));
    }

    #[test]
    fn test_libraries_in_dir_is_not_recursive() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        touch(temp_dir.path().join("a.so"));
        touch(temp_dir.path().join("nested/b.so"));

        let found = libraries_in_dir(temp_dir.path(), &BinaryPatterns::default());
        assert_eq!(found, vec![temp_dir.path().join("a.so")]);
        assert!(libraries_in_dir(&temp_dir.path().join("missing"), &BinaryPatterns::default()).is_empty());
    }

    #[test]
    fn test_custom_patterns() {
        let Ok(patterns) = BinaryPatterns::new(["*.so.*"]) else {
            return;
        };
        assert!(patterns.matches("libfoo.so.1"));
        assert!(!patterns.matches("libfoo.so"));
    }

    fn answering(name: &str, is_pkg: &str, file: &Path) -> FakeInterpreter {
        let mut fake = FakeInterpreter::new();
        if let (Ok(is_pkg_query), Ok(file_query)) = (query::is_package(name), query::module_file(name)) {
            fake = fake
                .answer(is_pkg_query, is_pkg)
                .answer(file_query, format!("{:?}", file.display().to_string()));
        }
        fake
    }

    #[test]
    fn test_package_binaries_under_dotted_path() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        touch(root.join("a/b/__init__.py"));
        touch(root.join("a/b/libs/_core.so"));

        let fake = answering("a.b", "True", &root.join("a/b/__init__.py"));
        let binaries = collect_package_binaries(&fake, "a.b", &BinaryPatterns::default());
        assert!(binaries.is_ok_and(|b| b == vec![BinaryEntry::new("a/b/libs/_core.so", root.join("a/b/libs/_core.so"))]));
    }

    #[test]
    fn test_plain_module_has_no_package_binaries() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        touch(root.join("six.py"));
        touch(root.join("_neighbour.so"));

        let fake = answering("six", "False", &root.join("six.py"));
        assert!(matches!(
            collect_package_binaries(&fake, "six", &BinaryPatterns::default()),
            Err(ProbeError::NotAPackage(_))
        ));
    }
}
