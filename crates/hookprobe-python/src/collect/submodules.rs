use super::{has_extension_in, PY_EXECUTABLE_EXTENSIONS};
use crate::errors::ProbeError;
use crate::executor::Interpreter;
use crate::package::{has_init_file, resolve_package_paths, PackageLocation};
use hookprobe_logger as logger;
use hookprobe_manifest::SubmoduleSet;
use std::path::Path;
use walkdir::WalkDir;

/// The package and every importable module beneath it
pub fn collect_submodules(interpreter: &dyn Interpreter, name: &str) -> Result<SubmoduleSet, ProbeError> {
    let location = resolve_package_paths(interpreter, name)?;
    submodules_in(&location)
}

/// Walk a resolved package, pruning directories without an init file
pub fn submodules_in(location: &PackageLocation) -> Result<SubmoduleSet, ProbeError> {
    if !location.package_dir.is_dir() {
        return Err(ProbeError::NotADirectory(location.package_dir.clone()));
    }

    let mut modules = SubmoduleSet::new();
    let mut walker = WalkDir::new(&location.package_dir)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::debug(&format!("Skipping unreadable entry: {}", e));
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            match location.dotted_path_of(path) {
                Some(dotted) if has_init_file(path) => {
                    modules.insert(dotted);
                }
                _ => walker.skip_current_dir(),
            }
            continue;
        }

        // Files only show up for directories that passed the init gate
        if !has_extension_in(path, PY_EXECUTABLE_EXTENSIONS) {
            continue;
        }
        let Some(module) = module_stem(path) else {
            continue;
        };
        if module == "__init__" {
            continue;
        }
        if let Some(parent) = path.parent().and_then(|p| location.dotted_path_of(p)) {
            modules.insert(format!("{}.{}", parent, module));
        }
    }

    logger::debug(&format!(
        "Found {} modules under '{}'",
        modules.len(),
        location.name
    ));
    Ok(modules)
}

/// Module name of a file: everything before the first dot
///
/// Extension modules carry ABI tags (`speedups.cpython-311-x86_64-linux-gnu.so`)
/// that are not part of the importable name.
fn module_stem(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    file_name.split('.').next().filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;
    use crate::testing::FakeInterpreter;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(path: PathBuf) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(path, "");
    }

    fn location(root: &Path, name: &str) -> PackageLocation {
        PackageLocation {
            name: name.to_string(),
            namespace_root: root.to_path_buf(),
            package_dir: root.join(name),
        }
    }

    #[test]
    fn test_walk_prunes_non_packages() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        touch(root.join("foo/__init__.py"));
        touch(root.join("foo/bar.py"));
        touch(root.join("foo/_speedups.cpython-311-x86_64-linux-gnu.so"));
        touch(root.join("foo/README.txt"));
        touch(root.join("foo/sub/__init__.py"));
        touch(root.join("foo/sub/baz.py"));
        touch(root.join("foo/notpkg/qux.py"));
        touch(root.join("foo/notpkg/deeper/__init__.py"));
        touch(root.join("foo/__pycache__/bar.cpython-311.pyc"));

        let modules = submodules_in(&location(root, "foo")).unwrap_or_default();
        let expected: SubmoduleSet = ["foo", "foo._speedups", "foo.bar", "foo.sub", "foo.sub.baz"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(modules, expected);
    }

    #[test]
    fn test_every_entry_is_prefixed_by_package() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        touch(root.join("foo/__init__.pyc"));
        touch(root.join("foo/compiled.pyc"));

        let modules = submodules_in(&location(root, "foo")).unwrap_or_default();
        assert!(modules.contains("foo.compiled"));
        assert!(modules.iter().all(|m| m == "foo" || m.starts_with("foo.")));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let loc = location(Path::new("/nonexistent"), "foo");
        assert!(matches!(submodules_in(&loc), Err(ProbeError::NotADirectory(_))));
    }

    #[test]
    fn test_collect_resolves_through_interpreter() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        touch(root.join("foo/__init__.py"));
        touch(root.join("foo/bar.py"));

        let init = root.join("foo/__init__.py");
        let mut fake = FakeInterpreter::new();
        if let (Ok(is_pkg), Ok(file)) = (query::is_package("foo"), query::module_file("foo")) {
            fake = fake
                .answer(is_pkg, "True")
                .answer(file, format!("{:?}", init.display().to_string()));
        }

        let modules = collect_submodules(&fake, "foo");
        assert!(modules.is_ok_and(|m| m.len() == 2 && m.contains("foo.bar")));
    }
}
