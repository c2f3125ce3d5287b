use crate::errors::CliError;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::*;
use hookprobe_config::Config;
use hookprobe_logger as logger;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured value
    Show,
    /// Print the path of the configuration file
    Path,
    /// Print one value
    Get { key: String },
    /// Set one value; list keys take comma-separated values
    Set { key: String, value: String },
}

pub fn handle_config(action: ConfigAction, opts: &GlobalOpts) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
            Ok(())
        }
        ConfigAction::Path => {
            let path = Config::path()?;
            logger::debug(&format!("Config path: {}", path.display()));
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Get { key } => {
            match Config::load()?.get(&key)? {
                Some(value) => println!("{}", value),
                None => logger::warn(&format!("{} is not set", key)),
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, value.clone())?;
            config.save()?;
            logger::success(&format!("Set {} = {}", key, value));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut config = Config::default();
        let result = config.set("cache-path", "x".to_string());
        assert!(result.is_err());
    }
}
