use super::{has_extension_in, PY_IGNORE_EXTENSIONS};
use crate::errors::ProbeError;
use crate::executor::Interpreter;
use crate::package::{resolve_package_paths, PackageLocation};
use hookprobe_logger as logger;
use hookprobe_manifest::DataFileEntry;
use walkdir::WalkDir;

/// Every non-code file of a package, placed relative to its namespace root
pub fn collect_data_files(interpreter: &dyn Interpreter, name: &str) -> Result<Vec<DataFileEntry>, ProbeError> {
    let location = resolve_package_paths(interpreter, name)?;
    data_files_in(&location)
}

pub fn data_files_in(location: &PackageLocation) -> Result<Vec<DataFileEntry>, ProbeError> {
    if !location.package_dir.is_dir() {
        return Err(ProbeError::NotADirectory(location.package_dir.clone()));
    }

    let mut datas = Vec::new();
    for entry in WalkDir::new(&location.package_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger::debug(&format!("Skipping unreadable entry: {}", e));
                continue;
            }
        };
        if entry.file_type().is_dir() || has_extension_in(entry.path(), PY_IGNORE_EXTENSIONS) {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let Ok(dest_dir) = dir.strip_prefix(&location.namespace_root) else {
            continue;
        };
        datas.push(DataFileEntry::new(entry.path(), dest_dir));
    }

    logger::debug(&format!(
        "Found {} data files in '{}'",
        datas.len(),
        location.name
    ));
    Ok(datas)
}
