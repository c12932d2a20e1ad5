//! File watching and stage re-runs.
//!
//! Watches the asset tree (recursive), the pages directory (top level only)
//! and `sitekit.toml`. Changes are debounced, classified to the transform
//! stage that owns them, and each affected stage is re-run serially before a
//! single reload broadcast. A config change reloads settings and rebuilds
//! everything.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{self, Receiver};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use crate::cli::build::{self, Stage};
use crate::config::{cfg, reload_config};
use crate::core::BuildMode;
use crate::utils::path::normalize_path;
use crate::{log, logger, reload};

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const RERUN_COOLDOWN_MS: u64 = 800;

/// What happened to a watched path within one debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Spawn the watcher thread (no-op when watching is disabled).
pub(super) fn spawn_watcher(
    watch_enabled: bool,
    shutdown_rx: Receiver<()>,
) -> Option<JoinHandle<()>> {
    if !watch_enabled {
        return None;
    }

    Some(std::thread::spawn(move || {
        if let Err(e) = watch_loop(shutdown_rx) {
            log!("watch"; "error: {}", e);
        }
    }))
}

fn watch_loop(shutdown_rx: Receiver<()>) -> Result<()> {
    let (tx, rx) = channel::unbounded();
    let mut watcher =
        notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        })?;

    {
        let config = cfg();
        if config.build.assets.is_dir() {
            watcher.watch(&config.build.assets, RecursiveMode::Recursive)?;
        }
        if config.build.pages.is_dir() {
            watcher.watch(&config.build.pages, RecursiveMode::NonRecursive)?;
        }
        if config.config_path.is_file() {
            watcher.watch(&config.config_path, RecursiveMode::NonRecursive)?;
        }
        log!("watch"; "watching {}", config.build.assets.display());
    }

    let mut debouncer = Debouncer::new();
    loop {
        crossbeam::select! {
            recv(rx) -> event => match event {
                Ok(event) => debouncer.add_event(&event),
                Err(_) => return Ok(()),
            },
            recv(shutdown_rx) -> _ => return Ok(()),
            default(debouncer.sleep_duration()) => {}
        }

        if let Some(changes) = debouncer.take_if_ready() {
            run_changes(&changes);
        }
    }
}

/// React to one debounced batch of changes.
fn run_changes(changes: &FxHashMap<PathBuf, ChangeKind>) {
    let config = cfg();

    // Config edits reload settings and rebuild everything.
    if changes.keys().any(|p| *p == config.config_path) {
        match reload_config() {
            Ok(true) => {
                log!("watch"; "config changed, rebuilding");
                let config = cfg();
                match build::build_site(BuildMode::DEVELOPMENT, &config) {
                    Ok(_) => {
                        logger::status_success("rebuilt site");
                        reload::broadcast_reload();
                    }
                    Err(e) => logger::status_error("rebuild failed", &format!("{e:#}")),
                }
                return;
            }
            Ok(false) => {}
            Err(e) => {
                logger::status_error("config reload failed", &format!("{e:#}"));
                return;
            }
        }
    }

    // One re-run per affected stage, serialized.
    let stages: Vec<Stage> = Stage::ALL
        .into_iter()
        .filter(|stage| {
            changes
                .keys()
                .any(|path| Stage::for_source_path(path, &config) == Some(*stage))
        })
        .collect();

    if stages.is_empty() {
        return;
    }

    let mut ok = true;
    for stage in &stages {
        match stage.run(&config) {
            Ok(count) => {
                logger::status_success(&format!("{}: {} file(s)", stage.label(), count));
            }
            Err(e) => {
                logger::status_error(&format!("{} failed", stage.label()), &format!("{e:#}"));
                ok = false;
            }
        }
    }

    if ok {
        reload::broadcast_reload();
    }
}

// ============================================================================
// Debouncer
// ============================================================================

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<std::time::Instant>,
    last_run: Option<std::time::Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_run: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Removed + Created/Modified → Created/Modified (file was restored)
    /// - Modified + Removed → Removed (file was deleted)
    /// - Created + Removed → discarded (appeared then vanished)
    /// - Same type events: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // Ignore metadata-only changes (mtime/atime/chmod noise)
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            let path = normalize_path(path);
            self.record(path, kind);
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        if let Some(&existing) = self.changes.get(&path) {
            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    crate::debug!("watch"; "{} restored: {}", existing.label(), path.display());
                    self.changes.insert(path, kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                // Same kind or other combos (Created+Modified, etc.): first wins
                _ => return,
            }
            self.last_event = Some(std::time::Instant::now());
            return;
        }

        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
        self.changes.insert(path, kind);
        self.last_event = Some(std::time::Instant::now());
    }

    /// Take the batch if debounce + cooldown elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        if changes.is_empty() {
            return None;
        }

        self.last_run = Some(std::time::Instant::now());
        Some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }

        if let Some(last_run) = self.last_run
            && last_run.elapsed() < Duration::from_millis(RERUN_COOLDOWN_MS)
        {
            return false;
        }

        !self.changes.is_empty()
    }

    /// Precise sleep duration until the next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining =
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());

        let cooldown_remaining = self
            .last_run
            .map(|t| Duration::from_millis(RERUN_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
