#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tagscope_core::{IndexEvent, IndexManager, Provider, Toolchain};

/// Writes an executable stub script that logs every invocation to
/// `invocations.log` next to itself, then runs `body`.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    let script = format!(
        "#!/bin/sh\ndir=$(dirname \"$0\")\nprintf '%s\\n' \"{name} $*\" >> \"$dir/invocations.log\"\n{body}\n"
    );
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

pub fn invocations(bin_dir: &Path) -> Vec<String> {
    std::fs::read_to_string(bin_dir.join("invocations.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

pub struct Fixture {
    pub root: PathBuf,
    pub cache_dir: PathBuf,
    pub bin_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

impl Fixture {
    /// A project root, a cache directory and a stub toolchain, all
    /// inside one temp directory.
    pub fn new(gtags_body: &str, global_body: &str) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("project");
        let cache_dir = tmp.path().join("cache");
        let bin_dir = tmp.path().join("bin");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::create_dir_all(&bin_dir).unwrap();
        write_stub(&bin_dir, "gtags", gtags_body);
        write_stub(&bin_dir, "global", global_body);
        Fixture {
            root,
            cache_dir,
            bin_dir,
            _tmp: tmp,
        }
    }

    pub fn manager(&self) -> IndexManager {
        self.manager_for(Provider::Tagscope)
    }

    pub fn manager_for(&self, provider: Provider) -> IndexManager {
        let toolchain = Toolchain {
            gtags: self.bin_dir.join("gtags").to_string_lossy().into_owned(),
            global: self.bin_dir.join("global").to_string_lossy().into_owned(),
        };
        IndexManager::new(
            self.root.clone(),
            self.cache_dir.clone(),
            provider,
            toolchain,
            Duration::from_secs(10),
        )
    }

    pub fn touch_marker(&self) {
        std::fs::write(self.cache_dir.join("GTAGS"), b"").unwrap();
    }

    pub fn invocations(&self) -> Vec<String> {
        invocations(&self.bin_dir)
    }
}

pub fn event_recorder() -> (
    Arc<Mutex<Vec<IndexEvent>>>,
    impl Fn(IndexEvent) -> std::future::Ready<()> + Send,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (events, move |event| {
        sink.lock().unwrap().push(event);
        std::future::ready(())
    })
}

/// gtags stub body: create the marker file in the target directory.
pub const GTAGS_OK: &str = r#"mkdir -p "$1" && touch "$1/GTAGS""#;

/// global stub body: succeed silently whatever the arguments.
pub const GLOBAL_OK: &str = "exit 0";
