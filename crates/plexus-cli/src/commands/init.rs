//! Initialize a new Plexus project.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{data_dir, Config, CONFIG_FILE};

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Plexus project...", "→".blue());

    let plexus_dir = data_dir(&base_path);
    std::fs::create_dir_all(&plexus_dir)
        .with_context(|| format!("Failed to create {}", plexus_dir.display()))?;
    println!("  {} Created {}", "✓".green(), plexus_dir.display());

    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    let gitignore_path = plexus_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, "*.db\n*.db-wal\n*.db-shm\n")
            .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;
        println!("  {} Created {}", "✓".green(), gitignore_path.display());
    }

    println!();
    println!("{} Plexus project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} plexus seed alice bob carol", "1.".blue());
    println!("  {} plexus record alice bob", "2.".blue());
    println!("  {} plexus suggest alice", "3.".blue());

    Ok(())
}
