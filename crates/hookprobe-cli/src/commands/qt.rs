use crate::common::print_json;
use crate::errors::CliError;
use crate::GlobalOpts;
use clap::Subcommand;
use hookprobe_python::QtBinding;

#[derive(Subcommand, Debug, Clone)]
pub enum QtAction {
    /// Plugin directory of a binding (PyQt4 or PyQt5)
    PluginsDir { binding: String },
    /// Plugin directory once the phonon backend is loaded
    PhononDir { binding: String },
    /// Libraries of one plugin type, e.g. `imageformats`
    PluginBinaries { binding: String, plugin_type: String },
    /// Directory containing qt_menu.nib (macOS)
    MenuNib { binding: String },
    /// QML import directory reported by qmake
    QmlDir,
    /// A QML import directory as a data entry
    QmlData { dir: String },
    /// Libraries below a QML import directory
    QmlBinaries { dir: String },
}

pub fn handle_qt(action: QtAction, opts: &GlobalOpts) -> Result<(), CliError> {
    let introspector = opts.introspector()?;
    match action {
        QtAction::PluginsDir { binding } => print_json(&introspector.qt_plugins_dir(binding.parse::<QtBinding>()?)?),
        QtAction::PhononDir { binding } => {
            print_json(&introspector.qt_phonon_plugins_dir(binding.parse::<QtBinding>()?)?)
        }
        QtAction::PluginBinaries { binding, plugin_type } => {
            print_json(&introspector.qt_plugins_binaries(binding.parse::<QtBinding>()?, &plugin_type)?)
        }
        QtAction::MenuNib { binding } => print_json(&introspector.qt_menu_nib_dir(binding.parse::<QtBinding>()?)),
        QtAction::QmlDir => print_json(&introspector.qt5_qml_dir()),
        QtAction::QmlData { dir } => print_json(&introspector.qt5_qml_data(&dir)?),
        QtAction::QmlBinaries { dir } => print_json(&introspector.qt5_qml_plugins_binaries(&dir)?),
    }
}
