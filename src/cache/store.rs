//! Cache entry bookkeeping
//!
//! One directory per app name under the cache root, each holding the
//! isolated runtime plus marker files that carry the entry's state across
//! processes. Markers are replaced via temp-file-plus-rename, so a reader
//! observes either the previous complete state or the new one, never a
//! half-written marker.

use crate::error::{VappError, VappResult};
use crate::pkgspec::{AppName, PackageSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker recording a completed build.
pub const READY_MARKER: &str = "ready.json";
/// Transient marker recording an in-progress build.
pub const BUILDING_MARKER: &str = "building.json";
/// Directory holding the isolated runtime inside an entry.
pub const RUNTIME_DIR: &str = "venv";

/// State of a cache entry, derived from marker inspection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// No entry (or only unrecognized residue) exists
    Absent,
    /// A build is in flight and its owning process is alive
    Building,
    /// Entry is complete and launchable
    Ready,
    /// A build was interrupted; the entry needs a rebuild before use
    Stale,
}

impl CacheState {
    /// Whether a launch may use the entry as-is
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Marker written when an entry finishes building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyMarker {
    /// Package spec the environment was built from
    pub spec: PackageSpec,

    /// Executable root of the built environment
    pub exec_root: PathBuf,

    /// When the build completed
    pub built_at: DateTime<Utc>,
}

/// Marker written while an entry is building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingMarker {
    /// Package spec being installed
    pub spec: PackageSpec,

    /// Process that owns the build, for diagnostics
    pub pid: u32,

    /// When the build started
    pub started_at: DateTime<Utc>,
}

/// One entry as seen by `CacheStore::list`
#[derive(Debug, Clone, Serialize)]
pub struct AppEntry {
    /// App name (directory name under the root)
    pub name: AppName,

    /// Current state
    pub state: CacheState,

    /// Ready marker, if the entry has completed a build
    pub ready: Option<ReadyMarker>,
}

/// Durable bookkeeping for all cache entries under one root directory.
///
/// The store exclusively owns the entry directories; the builder and
/// launcher only touch paths the store hands out.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store over the given root (not created until needed)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root if it does not exist yet
    pub fn ensure_root(&self) -> VappResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| VappError::io(format!("creating cache root {}", self.root.display()), e))
    }

    /// Directory for one entry; the entry need not exist
    pub fn entry_path(&self, name: &AppName) -> PathBuf {
        self.root.join(name.as_str())
    }

    /// Directory the isolated runtime is materialized in
    pub fn runtime_dir(&self, name: &AppName) -> PathBuf {
        self.entry_path(name).join(RUNTIME_DIR)
    }

    /// Lock file guarding the entry's building transition.
    ///
    /// Kept as a sibling of the entry directory so a purge can never
    /// unlink a lock path another process holds open.
    pub fn lock_path(&self, name: &AppName) -> PathBuf {
        self.root.join(format!("{}.lock", name.as_str()))
    }

    fn ready_path(&self, name: &AppName) -> PathBuf {
        self.entry_path(name).join(READY_MARKER)
    }

    fn building_path(&self, name: &AppName) -> PathBuf {
        self.entry_path(name).join(BUILDING_MARKER)
    }

    /// Derive the entry's state from its markers
    pub fn state(&self, name: &AppName) -> VappResult<CacheState> {
        let building_path = self.building_path(name);
        if building_path.exists() {
            return Ok(match self.read_building(name)? {
                Some(marker) if process_alive(marker.pid) => CacheState::Building,
                // Unparsable marker or dead owner: the build died midway.
                _ => CacheState::Stale,
            });
        }

        if self.ready_path(name).exists() {
            Ok(CacheState::Ready)
        } else {
            Ok(CacheState::Absent)
        }
    }

    /// Resolve a user-supplied app argument to an entry name.
    ///
    /// The argument is first tried as an explicit name, normalized exactly
    /// as `--name` is at install time; an existing entry under that name
    /// wins, so apps installed under a chosen name stay addressable by it.
    /// Anything else is read as a package spec and the default name derives
    /// from it.
    pub fn resolve_name(&self, raw: &str) -> VappResult<AppName> {
        if let Ok(name) = AppName::parse(raw) {
            if self.state(&name)? != CacheState::Absent {
                return Ok(name);
            }
        }
        AppName::derive(&PackageSpec::parse(raw)?)
    }

    /// Read the ready marker, if one exists
    pub fn ready_marker(&self, name: &AppName) -> VappResult<Option<ReadyMarker>> {
        let path = self.ready_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VappError::io(
                    format!("reading ready marker {}", path.display()),
                    e,
                ))
            }
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn read_building(&self, name: &AppName) -> VappResult<Option<BuildingMarker>> {
        let path = self.building_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VappError::io(
                    format!("reading building marker {}", path.display()),
                    e,
                ))
            }
        };
        match serde_json::from_str(&content) {
            Ok(marker) => Ok(Some(marker)),
            Err(e) => {
                warn!(
                    "Unreadable building marker {} ({}); treating build as dead",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Record that a build is in flight; idempotent
    pub fn mark_building(&self, name: &AppName, spec: &PackageSpec) -> VappResult<()> {
        let entry = self.entry_path(name);
        fs::create_dir_all(&entry)
            .map_err(|e| VappError::io(format!("creating entry {}", entry.display()), e))?;

        let marker = BuildingMarker {
            spec: spec.clone(),
            pid: std::process::id(),
            started_at: Utc::now(),
        };
        self.write_marker(&self.building_path(name), &marker)?;
        debug!("Marked {} building (pid {})", name, marker.pid);
        Ok(())
    }

    /// Record a completed build, atomically replacing any prior ready state
    pub fn mark_ready(
        &self,
        name: &AppName,
        spec: &PackageSpec,
        exec_root: &Path,
    ) -> VappResult<()> {
        let marker = ReadyMarker {
            spec: spec.clone(),
            exec_root: exec_root.to_path_buf(),
            built_at: Utc::now(),
        };
        // New ready marker lands before the building marker goes away, so a
        // concurrent reader never sees the entry dip through Absent.
        self.write_marker(&self.ready_path(name), &marker)?;
        remove_if_exists(&self.building_path(name))?;
        debug!("Marked {} ready ({})", name, exec_root.display());
        Ok(())
    }

    /// Roll back a failed build.
    ///
    /// Removes the building marker; if the entry never completed a build the
    /// whole directory is purged, so a first install failure leaves the
    /// entry absent rather than half-claimed. A failed update keeps the
    /// prior ready state untouched.
    pub fn mark_failed(&self, name: &AppName) -> VappResult<()> {
        remove_if_exists(&self.building_path(name))?;
        if !self.ready_path(name).exists() {
            self.purge(name)?;
            debug!("Rolled back {} to absent", name);
        } else {
            debug!("Rolled back {} to prior ready state", name);
        }
        Ok(())
    }

    /// Remove the entry directory and everything in it
    pub fn purge(&self, name: &AppName) -> VappResult<()> {
        let entry = self.entry_path(name);
        match fs::remove_dir_all(&entry) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VappError::io(format!("purging {}", entry.display()), e)),
        }
    }

    /// Enumerate entries under the root, sorted by name.
    ///
    /// Entries with unreadable ready markers are listed without marker
    /// details rather than dropped.
    pub fn list(&self) -> VappResult<Vec<AppEntry>> {
        let mut entries = Vec::new();
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => {
                return Err(VappError::io(
                    format!("reading cache root {}", self.root.display()),
                    e,
                ))
            }
        };

        for dir_entry in read_dir {
            let dir_entry =
                dir_entry.map_err(|e| VappError::io("reading cache root entry", e))?;
            if !dir_entry.path().is_dir() {
                continue; // lock files and stray files live beside entries
            }
            let Ok(name) = AppName::parse(&dir_entry.file_name().to_string_lossy()) else {
                debug!("Skipping unrecognized cache dir {:?}", dir_entry.file_name());
                continue;
            };

            let state = self.state(&name)?;
            let ready = match self.ready_marker(&name) {
                Ok(ready) => ready,
                Err(e) => {
                    warn!("Unreadable ready marker for {}: {}", name, e);
                    None
                }
            };
            entries.push(AppEntry { name, state, ready });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Write a marker via temp file + rename in the same directory
    fn write_marker<T: Serialize>(&self, path: &Path, value: &T) -> VappResult<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        let json = serde_json::to_string_pretty(value)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| VappError::io(format!("creating temp marker in {}", parent.display()), e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| VappError::io(format!("writing marker {}", path.display()), e))?;
        // Flush before rename so a crash cannot leave a truncated marker
        // behind the rename barrier.
        tmp.as_file()
            .sync_all()
            .map_err(|e| VappError::io(format!("syncing marker {}", path.display()), e))?;
        tmp.persist(path)
            .map_err(|e| VappError::io(format!("replacing marker {}", path.display()), e.error))?;
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> VappResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VappError::io(format!("removing {}", path.display()), e)),
    }
}

/// Whether a process with the given PID is currently alive.
#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // Signal 0 performs the existence/permission check without delivering
    // anything; EPERM still means the process exists.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    // No cheap probe available; assume alive so a live builder is never
    // treated as crashed. The lock, not this probe, provides exclusion.
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CacheStore) {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path());
        (temp, store)
    }

    fn name(s: &str) -> AppName {
        AppName::parse(s).unwrap()
    }

    fn spec(s: &str) -> PackageSpec {
        PackageSpec::parse(s).unwrap()
    }

    #[test]
    fn entry_paths_are_deterministic() {
        let (_temp, store) = store();
        let n = name("black");
        assert_eq!(store.entry_path(&n), store.root().join("black"));
        assert_eq!(store.runtime_dir(&n), store.root().join("black/venv"));
        assert_eq!(store.lock_path(&n), store.root().join("black.lock"));
        assert!(!store.lock_path(&n).starts_with(store.entry_path(&n)));
    }

    #[test]
    fn state_absent_when_nothing_exists() {
        let (_temp, store) = store();
        assert_eq!(store.state(&name("ghost")).unwrap(), CacheState::Absent);
    }

    #[test]
    fn building_with_live_owner() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();
        // Marker carries our own (alive) pid
        assert_eq!(store.state(&n).unwrap(), CacheState::Building);
    }

    #[test]
    fn mark_building_is_idempotent() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();
        store.mark_building(&n, &spec("black")).unwrap();
        assert_eq!(store.state(&n).unwrap(), CacheState::Building);
    }

    #[test]
    fn stale_when_owner_is_dead() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();

        // Rewrite the marker with a pid that cannot exist
        let marker = BuildingMarker {
            spec: spec("black"),
            pid: u32::MAX,
            started_at: Utc::now(),
        };
        store
            .write_marker(&store.building_path(&n), &marker)
            .unwrap();

        assert_eq!(store.state(&n).unwrap(), CacheState::Stale);
    }

    #[test]
    fn stale_when_building_marker_is_garbage() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();
        fs::write(store.building_path(&n), "not json").unwrap();
        assert_eq!(store.state(&n).unwrap(), CacheState::Stale);
    }

    #[test]
    fn mark_ready_completes_the_entry() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black==24.1")).unwrap();
        let exec_root = store.runtime_dir(&n).join("bin");
        store.mark_ready(&n, &spec("black==24.1"), &exec_root).unwrap();

        assert_eq!(store.state(&n).unwrap(), CacheState::Ready);
        let marker = store.ready_marker(&n).unwrap().unwrap();
        assert_eq!(marker.spec.as_str(), "black==24.1");
        assert_eq!(marker.exec_root, exec_root);
        assert!(!store.building_path(&n).exists());
    }

    #[test]
    fn mark_failed_first_build_rolls_back_to_absent() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();
        fs::create_dir_all(store.runtime_dir(&n)).unwrap();
        fs::write(store.runtime_dir(&n).join("residue"), "x").unwrap();

        store.mark_failed(&n).unwrap();

        assert_eq!(store.state(&n).unwrap(), CacheState::Absent);
        assert!(!store.entry_path(&n).exists());
    }

    #[test]
    fn mark_failed_update_preserves_prior_ready() {
        let (_temp, store) = store();
        let n = name("black");
        let exec_root = store.runtime_dir(&n).join("bin");
        store.mark_building(&n, &spec("black")).unwrap();
        store.mark_ready(&n, &spec("black"), &exec_root).unwrap();

        // A later update starts and fails
        store.mark_building(&n, &spec("black")).unwrap();
        store.mark_failed(&n).unwrap();

        assert_eq!(store.state(&n).unwrap(), CacheState::Ready);
        let marker = store.ready_marker(&n).unwrap().unwrap();
        assert_eq!(marker.exec_root, exec_root);
    }

    #[test]
    fn purge_removes_entry() {
        let (_temp, store) = store();
        let n = name("black");
        store.mark_building(&n, &spec("black")).unwrap();
        store.purge(&n).unwrap();
        assert!(!store.entry_path(&n).exists());

        // Purging a missing entry is fine
        store.purge(&n).unwrap();
    }

    #[test]
    fn list_skips_non_entries_and_sorts() {
        let (_temp, store) = store();
        store.ensure_root().unwrap();

        for app in ["zeta", "alpha"] {
            let n = name(app);
            store.mark_building(&n, &spec(app)).unwrap();
            let exec_root = store.runtime_dir(&n).join("bin");
            store.mark_ready(&n, &spec(app), &exec_root).unwrap();
        }
        // Stray lock file beside the entries
        fs::write(store.root().join("alpha.lock"), "").unwrap();

        let entries = store.list().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(entries.iter().all(|e| e.state == CacheState::Ready));
    }

    #[test]
    fn list_empty_root() {
        let (_temp, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn resolve_name_prefers_an_existing_entry() {
        let (_temp, store) = store();
        let n = name("My_Tool");
        store.mark_building(&n, &spec("my_tool")).unwrap();
        store
            .mark_ready(&n, &spec("my_tool"), &store.runtime_dir(&n).join("bin"))
            .unwrap();

        // Derivation would fold this to "my-tool"; the entry wins as typed
        assert_eq!(store.resolve_name("My_Tool").unwrap(), n);
    }

    #[test]
    fn resolve_name_derives_when_nothing_matches() {
        let (_temp, store) = store();
        assert_eq!(
            store.resolve_name("Cool_Tool==2.0").unwrap(),
            name("cool-tool")
        );
    }
}
