use std::path::PathBuf;
use tagscope_core::{cache, Provider};

/// Removes one project's tag database, or the whole cache root.
pub fn run(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let root = std::fs::canonicalize(&path)?;
            let dir = cache::project_cache_dir(&root, Provider::Tagscope, None)?;
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
                println!("Removed {}", dir.display());
            } else {
                println!("No database for {}", root.display());
            }
        }
        None => {
            let root = cache::cache_root(Provider::Tagscope, None);
            if root.exists() {
                std::fs::remove_dir_all(&root)?;
                println!("Removed {}", root.display());
            } else {
                println!("Nothing to clear");
            }
        }
    }
    Ok(())
}
