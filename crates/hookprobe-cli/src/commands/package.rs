//! Package-level commands: paths, submodules, datas, binaries, collect

use crate::common::print_json;
use crate::errors::CliError;
use crate::GlobalOpts;
use hookprobe_logger as logger;
use hookprobe_manifest::{read_from_path, write_to_path, Manifest};
use hookprobe_python::collect::{self, BinaryPatterns};
use serde::Serialize;
use std::path::Path;

pub fn handle_paths(package: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    let location = opts.introspector()?.resolve_package_paths(package)?;
    print_json(&location)
}

pub fn handle_submodules(package: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    let modules = opts.introspector()?.collect_submodules(package)?;
    print_json(&modules)
}

pub fn handle_datas(package: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    let datas = opts.introspector()?.collect_data_files(package)?;
    print_json(&datas)
}

/// Libraries of a package, or of a source directory placed under a target
///
/// The directory form needs no interpreter.
pub fn handle_binaries(
    package: Option<&str>,
    source: Option<&Path>,
    target: Option<&Path>,
    opts: &GlobalOpts,
) -> Result<(), CliError> {
    let binaries = match (package, source, target) {
        (Some(package), None, None) => opts.introspector()?.collect_package_binaries(package)?,
        (None, Some(source), Some(target)) => {
            let patterns = BinaryPatterns::new(opts.config()?.binary_patterns())?;
            collect::collect_binaries(source, target, &patterns)?
        }
        _ => {
            return Err(CliError::Usage(
                "pass either a package name or both --source and --target".to_string(),
            ))
        }
    };
    print_json(&binaries)
}

/// What `collect` wrote
#[derive(Debug, Serialize)]
struct CollectSummary<'a> {
    manifest: &'a Path,
    packages: Vec<&'a str>,
    hidden_imports: Vec<String>,
    datas: usize,
    binaries: usize,
}

/// Collect packages into a manifest file
///
/// An existing manifest at `output` is updated: collected packages replace
/// their earlier entries and `dropped` ones are removed outright.
pub fn handle_collect(packages: &[String], dropped: &[String], output: &Path, opts: &GlobalOpts) -> Result<(), CliError> {
    let introspector = opts.introspector()?;
    let interpreter = introspector.interpreter().interpreter().display().to_string();
    let mut manifest = if output.exists() {
        logger::debug(&format!("Updating existing manifest {}", output.display()));
        let mut existing = read_from_path(output)?;
        existing.interpreter = Some(interpreter);
        existing
    } else {
        Manifest::with_interpreter(interpreter)
    };

    for package in dropped {
        manifest.remove_package(package)?;
        logger::step(&format!("Dropped {}", package));
    }

    for package in packages {
        logger::spinner_start(&format!("Collecting {}", package));
        match introspector.collect_package(package) {
            Ok(resources) => {
                logger::spinner_stop();
                logger::step(&format!(
                    "{}: {} modules, {} data files, {} binaries",
                    package,
                    resources.submodules.len(),
                    resources.datas.len(),
                    resources.binaries.len()
                ));
                manifest.upsert_package(resources);
            }
            Err(e) => {
                logger::spinner_error(&format!("Failed to collect {}", package));
                return Err(e.into());
            }
        }
    }

    write_to_path(&manifest, output)?;
    logger::success(&format!("Wrote {}", output.display()));

    print_json(&CollectSummary {
        manifest: output,
        packages: manifest.packages.iter().map(|p| p.name.as_str()).collect(),
        hidden_imports: manifest.hidden_imports(),
        datas: manifest.all_datas().count(),
        binaries: manifest.all_binaries().count(),
    })
}
