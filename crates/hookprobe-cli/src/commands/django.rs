use crate::common::print_json;
use crate::errors::CliError;
use crate::GlobalOpts;
use clap::Subcommand;
use hookprobe_python::resolvers::django;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum DjangoAction {
    /// Project package next to a manage.py
    FindRoot { manage_py: PathBuf },
    /// Modules referenced by the settings of a project package
    Imports { root_dir: PathBuf },
}

pub fn handle_django(action: DjangoAction, opts: &GlobalOpts) -> Result<(), CliError> {
    match action {
        DjangoAction::FindRoot { manage_py } => match django::find_root_dir(&manage_py) {
            Some(root) => print_json(&root),
            None => Err(CliError::NotFound(format!(
                "No directory with settings.py and urls.py next to {}",
                manage_py.display()
            ))),
        },
        DjangoAction::Imports { root_dir } => {
            print_json(&opts.introspector()?.django_dottedstring_imports(&root_dir)?)
        }
    }
}
