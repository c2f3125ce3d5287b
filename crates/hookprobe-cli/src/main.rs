use clap::{Parser, Subcommand};
use hookprobe::commands::{
    config::{self, ConfigAction},
    django::{self, DjangoAction},
    package, probes,
    qt::{self, QtAction},
};
use hookprobe::{CliError, GlobalOpts};
use hookprobe_logger as logger;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hookprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Inspect installed Python packages for bundling",
    long_about = "hookprobe answers questions about installed Python packages by running \
                  each query in a fresh interpreter and prints the answers as JSON."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package directory and namespace root of a package
    Paths { package: String },
    /// Every module below a package, the package included
    Submodules { package: String },
    /// Non-code files of a package with their bundle directories
    Datas { package: String },
    /// Shared libraries of a package, or of a directory
    Binaries {
        package: Option<String>,
        /// Directory to scan instead of a package
        #[arg(long, requires = "target", conflicts_with = "package")]
        source: Option<PathBuf>,
        /// Bundle directory for libraries found under --source
        #[arg(long, requires = "source", conflicts_with = "package")]
        target: Option<PathBuf>,
    },
    /// Collect modules, data files and libraries of packages into a manifest
    Collect {
        #[arg(required_unless_present = "drop")]
        packages: Vec<String>,
        /// Remove a package from an existing manifest (repeatable)
        #[arg(long, value_name = "PACKAGE")]
        drop: Vec<String>,
        /// Manifest file; `.json` writes JSON, anything else TOML
        #[arg(short, long, default_value = "hookprobe-manifest.toml")]
        output: PathBuf,
    },
    /// Qt plugin, menu nib and QML lookups
    #[command(subcommand)]
    Qt(QtAction),
    /// Django project lookups
    #[command(subcommand)]
    Django(DjangoAction),
    /// Array handler modules bundled with PyOpenGL
    OpenglArrays,
    /// Modules a (C extension) module imports when loaded
    ExtensionImports { module: String },
    /// Real modules behind `six.moves` names
    SixMoves {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// File of a PyWin32 module such as `pywintypes` (Windows)
    Pywin32Module { module: String },
    /// Interpreter queries run under
    Python,
    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigAction),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(logger::verbosity_to_filter()))
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(e) = run(cli.command, &cli.global) {
        logger::error(&e.to_string());
        if cli.global.verbosity_level() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, opts: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Commands::Paths { package } => package::handle_paths(&package, opts),
        Commands::Submodules { package } => package::handle_submodules(&package, opts),
        Commands::Datas { package } => package::handle_datas(&package, opts),
        Commands::Binaries { package, source, target } => {
            package::handle_binaries(package.as_deref(), source.as_deref(), target.as_deref(), opts)
        }
        Commands::Collect { packages, drop, output } => {
            package::handle_collect(&packages, &drop, &output, opts)
        }
        Commands::Qt(action) => qt::handle_qt(action, opts),
        Commands::Django(action) => django::handle_django(action, opts),
        Commands::OpenglArrays => probes::handle_opengl_arrays(opts),
        Commands::ExtensionImports { module } => probes::handle_extension_imports(&module, opts),
        Commands::SixMoves { names } => probes::handle_six_moves(&names, opts),
        Commands::Pywin32Module { module } => probes::handle_pywin32_module(&module, opts),
        Commands::Python => probes::handle_python(opts),
        Commands::Config(action) => config::handle_config(action, opts),
    }
}
