use crate::config::Provider;
use crate::error::{Result, TagscopeError};
use std::path::{Path, PathBuf};

/// Base directory under which per-project index directories live.
/// Supports the TAGSCOPE_CACHE_ROOT env var, then the operator override,
/// then the provider's conventional location.
pub fn cache_root(provider: Provider, override_root: Option<&Path>) -> PathBuf {
    if let Ok(env_root) = std::env::var("TAGSCOPE_CACHE_ROOT") {
        return PathBuf::from(env_root);
    }
    if let Some(root) = override_root {
        return root.to_path_buf();
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    match provider {
        Provider::Tagscope => Path::new(&home).join(".cache/gtags"),
        Provider::Leaderf => Path::new(&home).join(".LfCache/gtags"),
    }
}

/// Maps a project root to its index directory: the root path with
/// separators flattened to `_`, so distinct roots never collide and a
/// directory name can be traced back to its project by eye. Pure; no
/// filesystem access beyond reading env vars through [`cache_root`].
pub fn project_cache_dir(
    project_root: &Path,
    provider: Provider,
    override_root: Option<&Path>,
) -> Result<PathBuf> {
    if !project_root.is_absolute() {
        return Err(TagscopeError::InvalidPath(project_root.to_path_buf()));
    }
    let flattened = project_root
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "_");
    Ok(cache_root(provider, override_root).join(flattened))
}

/// [`project_cache_dir`], creating the directory (with parents) under
/// the default provider; the LeaderF layout is owned by that plugin and
/// is only ever read.
pub fn resolve_cache_dir(
    project_root: &Path,
    provider: Provider,
    override_root: Option<&Path>,
) -> Result<PathBuf> {
    let dir = project_cache_dir(project_root, provider, override_root)?;
    if provider == Provider::Tagscope {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}
