use std::path::PathBuf;
use tagscope_core::{cache, IndexEvent, IndexManager, IndexState, Provider, Toolchain};

/// One-shot index build, outside any editor session.
pub async fn run(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let root = std::fs::canonicalize(&path)?;
    let cache_dir = cache::resolve_cache_dir(&root, Provider::Tagscope, None)?;

    println!("Indexing {} -> {}", root.display(), cache_dir.display());

    let manager = IndexManager::new(
        root,
        cache_dir,
        Provider::Tagscope,
        Toolchain::default(),
        tagscope_core::process::DEFAULT_TIMEOUT,
    );

    let state = manager
        .initialize(|event| async move {
            match event {
                IndexEvent::Corrupted => println!("Existing database is corrupted, rebuilding..."),
                IndexEvent::BuildStarted => println!("Building tag database..."),
                IndexEvent::BuildFinished => println!("Done."),
                IndexEvent::BuildFailed(reason) => eprintln!("Build failed: {reason}"),
            }
        })
        .await;

    match state {
        IndexState::Ready => Ok(()),
        other => Err(format!("indexing did not complete: {other:?}").into()),
    }
}
