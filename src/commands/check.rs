use crate::cli::{CheckArgs, GlobalArgs};
use crate::config::NormalizerConfig;
use crate::registry::AdapterRegistry;
use colored::*;

/// Build every adapter in the configuration, reporting each outcome
pub fn run_check(args: CheckArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = global.config.as_deref().ok_or("check needs --config PATH")?;
    let config = NormalizerConfig::load(path)?;

    let mut registry = if args.all {
        AdapterRegistry::builtin()
    } else {
        AdapterRegistry::new()
    };
    for spec in &config.adapters {
        registry.register(spec.clone());
    }

    let mut failures = 0;
    for (name, outcome) in registry.check_all() {
        match outcome {
            Ok(()) => println!("{} {}", "ok".green(), name),
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", "error".red().bold(), name, e);
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} adapter(s) failed to build", failures).into());
    }
    // settings and duplicate names
    config.validate()?;

    println!("{} {}", path.display().to_string().dimmed(), "is valid".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn global(file: &tempfile::NamedTempFile) -> GlobalArgs {
        GlobalArgs {
            config: Some(file.path().to_path_buf()),
            parallel: 0,
        }
    }

    #[test]
    fn test_check_valid_config() {
        let file = config_file(
            "adapters:\n  - name: app\n    parsers:\n      - format: regex\n        regex: '^(?<message>.*)$'\n",
        );
        assert!(run_check(CheckArgs { all: true }, &global(&file)).is_ok());
    }

    #[test]
    fn test_check_reports_broken_adapter() {
        let file = config_file("adapters:\n  - name: app\n    parsers:\n      - format: regex\n        regex: '(unclosed'\n");
        assert!(run_check(CheckArgs { all: false }, &global(&file)).is_err());
    }

    #[test]
    fn test_check_requires_config() {
        assert!(run_check(CheckArgs { all: false }, &GlobalArgs::default()).is_err());
    }
}
