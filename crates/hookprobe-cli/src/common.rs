//! Common types and utilities shared across commands

use crate::errors::CliError;
use clap::Parser;
use hookprobe_config::Config;
use hookprobe_logger as logger;
use hookprobe_python::Introspector;
use serde::Serialize;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,

    #[arg(long, global = true, help = "Interpreter for child queries (path or command name)")]
    pub python: Option<String>,

    #[arg(
        long = "path",
        global = true,
        value_name = "DIR",
        help = "Extra module search path for child queries (repeatable)"
    )]
    pub paths: Vec<String>,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Layer command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref python) = self.python {
            config.python = Some(python.clone());
        }
        config.search_paths.extend(self.paths.iter().cloned());
    }

    /// Effective configuration for this run
    pub fn config(&self) -> Result<Config, CliError> {
        let mut config = Config::load()?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn introspector(&self) -> Result<Introspector, CliError> {
        let config = self.config()?;
        let introspector = Introspector::from_config(&config)?;
        logger::debug(&format!(
            "Using interpreter {}",
            introspector.interpreter().interpreter().display()
        ));
        Ok(introspector)
    }
}

/// Print a result as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let opts = GlobalOpts {
            python: Some("/opt/python/bin/python3".to_string()),
            paths: vec!["/proj".to_string()],
            ..Default::default()
        };
        let mut config = Config {
            search_paths: vec!["/site".to_string()],
            ..Default::default()
        };
        opts.apply(&mut config);

        assert_eq!(config.python.as_deref(), Some("/opt/python/bin/python3"));
        assert_eq!(config.search_paths, vec!["/site", "/proj"]);
    }

    #[test]
    fn test_quiet_wins() {
        let opts = GlobalOpts {
            quiet: true,
            verbose: 2,
            ..Default::default()
        };
        assert_eq!(opts.verbosity_level(), 0);
    }
}
