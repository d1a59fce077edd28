use crate::cli::{AdaptersArgs, GlobalArgs};
use crate::commands::load_config;
use crate::pipeline::AdapterSpec;
use crate::registry::AdapterRegistry;
use colored::*;
use std::io::{stdout, Write};

pub fn run_adapters(args: AdaptersArgs, global: &GlobalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(global.config.as_deref())?;
    let registry = AdapterRegistry::from_config(&config)?;
    let mut output = stdout().lock();

    match args.show {
        Some(name) => {
            let spec = registry.get(&name).ok_or_else(|| format!("unknown adapter '{}'", name))?;
            write!(output, "{}", serde_yaml::to_string(spec)?)?;
        }
        None => {
            for spec in registry.specs() {
                writeln!(output, "{}", describe(spec))?;
            }
        }
    }
    Ok(())
}

fn describe(spec: &AdapterSpec) -> String {
    let mut line = format!("{:<20} {} parser(s)", spec.name.white().bold(), spec.parsers.len());
    if !spec.multiline.is_empty() {
        line.push_str(&format!(", {}", "multiline".cyan()));
    }
    if !spec.include_paths.is_empty() {
        line.push_str(&format!("  {}", spec.include_paths.join(" ").dimmed()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::zookeeper;

    #[test]
    fn test_describe() {
        colored::control::set_override(false);
        let line = describe(&zookeeper::spec());

        assert!(line.starts_with("zookeeper_general"));
        assert!(line.contains("2 parser(s), multiline"));
        assert!(line.contains("/var/log/zookeeper/zookeeper.log"));
    }
}
