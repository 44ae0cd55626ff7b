//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_POLICY: &str = r#"# nsdep policy
#
# Every reference from a type in one namespace to a type in another namespace
# must be allowed by an [[allow]] rule and must not match any [[disallow]] rule.
# References within a namespace are always allowed. "*" matches any namespace.

# Set to false to switch analysis off for this project.
enabled = true

# Stop reporting after this many issues (0 = no limit).
max_issue_count = 100

# Severity of reported issues: "error", "warning" or "info".
issue_severity = "warning"

# Also layer in nsdep.toml files from up to this many parent directories.
# Settings here win; rules from all levels apply.
# inheritance_depth = 1

# Everything may use the base library.
[[allow]]
from = "*"
to = "System"

# [[allow]]
# from = "MyApp.Ui"
# to = "MyApp.Domain"
# types = ["OrderService"]   # only these types; omit for all types

# [[disallow]]
# from = "*"
# to = "MyApp.Infrastructure"

# Types always visible to allowed referrers, regardless of "types" lists.
# [[visible-types]]
# namespace = "MyApp.Domain"
# types = ["Money"]
"#;

/// Runs the init command in the current directory.
pub fn run(force: bool) -> Result<()> {
    write_policy(Path::new("nsdep.toml"), force)?;

    println!("Created nsdep.toml");
    println!("\nNext steps:");
    println!("  1. Edit nsdep.toml to declare allowed namespace dependencies");
    println!("  2. Run: nsdep check --facts <facts.json>");

    Ok(())
}

fn write_policy(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_POLICY)?;
    Ok(())
}
