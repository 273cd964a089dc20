use std::path::{Path, PathBuf};

/// Where the index keeps its tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Single SQLite database file.
    File(PathBuf),
    /// Private in-memory database, dropped with the index.
    Memory,
}

/// SQLite `synchronous` pragma setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Synchronous {
    /// Sync on every commit.
    Full,
    /// Sync at WAL checkpoints.
    #[default]
    Normal,
    /// Leave syncing to the OS.
    Off,
}

impl Synchronous {
    pub(crate) fn pragma_value(self) -> &'static str {
        match self {
            Synchronous::Full => "FULL",
            Synchronous::Normal => "NORMAL",
            Synchronous::Off => "OFF",
        }
    }
}

/// Options used when opening an [`Index`](super::Index).
#[derive(Clone, Debug)]
pub struct IndexOptions {
    /// Storage backend.
    pub backend: Backend,
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,
    /// Durability level for file backends.
    pub synchronous: Synchronous,
    /// How long a locked database is retried before failing, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            create_if_missing: true,
            synchronous: Synchronous::default(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl IndexOptions {
    /// File-backed index at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            backend: Backend::File(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// In-memory index.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Sets [`IndexOptions::create_if_missing`].
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets [`IndexOptions::synchronous`].
    pub fn synchronous(mut self, mode: Synchronous) -> Self {
        self.synchronous = mode;
        self
    }
}
