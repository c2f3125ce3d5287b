//! One handle bundling an interpreter with the settings collectors need

use crate::collect::{self, BinaryPatterns};
use crate::errors::ProbeError;
use crate::executor::{default_script_dir, ExecutorOptions, Interpreter, PythonExecutor};
use crate::literal::PyLiteral;
use crate::package::{self, PackageLocation};
use crate::resolvers::qt::{self, QtBinding};
use crate::resolvers::{django, imports, opengl, pywin32, Lookup, SearchContext};
use crate::{eval, query::Query};
use hookprobe_config::{Config, ToolkitTables};
use hookprobe_logger as logger;
use hookprobe_manifest::{BinaryEntry, DataFileEntry, PackageResources, SubmoduleSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Introspector<I: Interpreter = PythonExecutor> {
    interpreter: I,
    patterns: BinaryPatterns,
    tables: ToolkitTables,
    context: SearchContext,
    qmake: Option<PathBuf>,
}

impl Introspector<PythonExecutor> {
    /// Build from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ProbeError> {
        let python = config.resolve_python()?;
        let timeout = config.timeout();
        let options = ExecutorOptions {
            search_paths: config.search_paths(),
            script_dir: config
                .script_dir
                .as_ref()
                .map_or_else(default_script_dir, PathBuf::from),
            timeout: (timeout > Duration::ZERO).then_some(timeout),
        };
        let patterns = BinaryPatterns::new(config.binary_patterns())?;
        let qmake = match config.qmake {
            Some(ref qmake) => Some(PathBuf::from(qmake)),
            None => which::which("qmake").ok(),
        };

        logger::debug(&format!("Interpreter: {}", python.display()));
        let context = SearchContext::for_interpreter(&python);
        Ok(Introspector::new(PythonExecutor::new(python, options), patterns, config.toolkit.clone())
            .with_context(context)
            .with_qmake(qmake))
    }
}

impl<I: Interpreter> Introspector<I> {
    pub fn new(interpreter: I, patterns: BinaryPatterns, tables: ToolkitTables) -> Self {
        Introspector {
            interpreter,
            patterns,
            tables,
            context: SearchContext::default(),
            qmake: None,
        }
    }

    pub fn with_context(mut self, context: SearchContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_qmake(mut self, qmake: Option<PathBuf>) -> Self {
        self.qmake = qmake;
        self
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn patterns(&self) -> &BinaryPatterns {
        &self.patterns
    }

    pub fn eval(&self, query: &Query) -> Result<Option<PyLiteral>, ProbeError> {
        eval::eval_query(&self.interpreter, query)
    }

    pub fn resolve_package_paths(&self, name: &str) -> Result<PackageLocation, ProbeError> {
        package::resolve_package_paths(&self.interpreter, name)
    }

    pub fn module_file_attribute(&self, name: &str) -> Result<Option<PathBuf>, ProbeError> {
        package::module_file_attribute(&self.interpreter, name)
    }

    pub fn collect_submodules(&self, name: &str) -> Result<SubmoduleSet, ProbeError> {
        collect::collect_submodules(&self.interpreter, name)
    }

    pub fn collect_data_files(&self, name: &str) -> Result<Vec<DataFileEntry>, ProbeError> {
        collect::collect_data_files(&self.interpreter, name)
    }

    pub fn collect_binaries(&self, source_root: &Path, target_root: &Path) -> Result<Vec<BinaryEntry>, ProbeError> {
        collect::collect_binaries(source_root, target_root, &self.patterns)
    }

    pub fn collect_package_binaries(&self, name: &str) -> Result<Vec<BinaryEntry>, ProbeError> {
        collect::collect_package_binaries(&self.interpreter, name, &self.patterns)
    }

    /// Submodules, data files and libraries of one package from a single lookup
    pub fn collect_package(&self, name: &str) -> Result<PackageResources, ProbeError> {
        let location = self.resolve_package_paths(name)?;

        let mut resources = PackageResources::new(name);
        resources.set_submodules(collect::submodules_in(&location)?);
        resources.datas = collect::data_files_in(&location)?;
        resources.binaries = collect::collect_binaries(
            &location.package_dir,
            &package::module_name_as_path(name),
            &self.patterns,
        )?;
        resources.namespace_root = Some(location.namespace_root);
        resources.package_dir = Some(location.package_dir);

        logger::debug(&format!(
            "Collected '{}': {} modules, {} data files, {} binaries",
            name,
            resources.submodules.len(),
            resources.datas.len(),
            resources.binaries.len()
        ));
        Ok(resources)
    }

    pub fn qt_plugins_dir(&self, binding: QtBinding) -> Result<Lookup<PathBuf>, ProbeError> {
        qt::plugins_dir(&self.interpreter, binding)
    }

    pub fn qt_phonon_plugins_dir(&self, binding: QtBinding) -> Result<Lookup<PathBuf>, ProbeError> {
        qt::phonon_plugins_dir(&self.interpreter, binding)
    }

    pub fn qt_plugins_binaries(&self, binding: QtBinding, plugin_type: &str) -> Result<Vec<BinaryEntry>, ProbeError> {
        qt::plugins_binaries(&self.interpreter, binding, plugin_type, &self.patterns)
    }

    pub fn qt_menu_nib_dir(&self, binding: QtBinding) -> Lookup<PathBuf> {
        qt::menu_nib_dir(binding, &self.tables, &self.context)
    }

    pub fn qt5_qml_dir(&self) -> Lookup<PathBuf> {
        qt::qml_dir(self.qmake.as_deref())
    }

    pub fn qt5_qml_data(&self, dir: &str) -> Result<Lookup<DataFileEntry>, ProbeError> {
        match self.qt5_qml_dir() {
            Lookup::Found(qml_dir) => qt::qml_data(&qml_dir, dir).map(Lookup::Found),
            Lookup::Missing => Ok(Lookup::Missing),
            Lookup::Unavailable(reason) => Ok(Lookup::Unavailable(reason)),
        }
    }

    pub fn qt5_qml_plugins_binaries(&self, dir: &str) -> Result<Vec<BinaryEntry>, ProbeError> {
        match self.qt5_qml_dir() {
            Lookup::Found(qml_dir) => qt::qml_plugins_binaries(&qml_dir, dir, &self.patterns),
            _ => Ok(Vec::new()),
        }
    }

    pub fn django_dottedstring_imports(&self, root_dir: &Path) -> Result<Lookup<Vec<String>>, ProbeError> {
        django::dottedstring_imports(&self.interpreter, root_dir)
    }

    pub fn opengl_arrays_modules(&self) -> Result<Lookup<Vec<String>>, ProbeError> {
        opengl::arrays_modules(&self.interpreter)
    }

    pub fn extension_imports(&self, module: &str) -> Result<Lookup<Vec<String>>, ProbeError> {
        imports::extension_imports(&self.interpreter, module)
    }

    pub fn six_moved_module(&self, name: &str) -> Result<Lookup<String>, ProbeError> {
        imports::six_moved_module(&self.interpreter, name)
    }

    pub fn pywin32_module_file(&self, name: &str) -> Result<Lookup<PathBuf>, ProbeError> {
        pywin32::module_file(&self.interpreter, name)
    }
}
