use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of "the one running instance".
///
/// Immutable once built. Two launches agree on the running instance only
/// when their identities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceIdentity {
    title: String,
    window_class: String,
}

impl InstanceIdentity {
    pub fn new(title: impl Into<String>, window_class: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window_class: window_class.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn window_class(&self) -> &str {
        &self.window_class
    }

    /// Filesystem and pipe-name safe form of the title.
    ///
    /// ASCII alphanumerics, `-` and `_` are kept, everything else becomes `_`.
    pub fn slug(&self) -> String {
        let slug: String = self
            .title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();

        if slug.is_empty() {
            "instance".to_string()
        } else {
            slug
        }
    }
}

impl fmt::Display for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.window_class)
    }
}

/// Where a running instance listens, and where its claim lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    slug: String,
    runtime_dir: PathBuf,
}

impl Endpoint {
    pub fn new(identity: &InstanceIdentity, runtime_dir: &Path) -> Self {
        Self {
            slug: identity.slug(),
            runtime_dir: runtime_dir.to_path_buf(),
        }
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// Unix domain socket served by the primary instance.
    pub fn socket_path(&self) -> PathBuf {
        self.runtime_dir.join(format!("{}.sock", self.slug))
    }

    /// Lock file held by the primary instance for its whole lifetime.
    pub fn lock_path(&self) -> PathBuf {
        self.runtime_dir.join(format!("{}.lock", self.slug))
    }

    /// Named pipe served by the primary instance on Windows.
    pub fn pipe_name(&self) -> String {
        format!(r"\\.\pipe\{}-shell", self.slug)
    }

    /// Session-local named mutex held by the primary instance on Windows.
    pub fn mutex_name(&self) -> String {
        format!(r"Local\{}-shell", self.slug)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if cfg!(windows) {
            write!(f, "{}", self.pipe_name())
        } else {
            write!(f, "{}", self.socket_path().display())
        }
    }
}

/// Borrowed reference to a live instance found by a locator.
///
/// Only valid for the query-and-signal sequence that follows the lookup;
/// the instance may exit at any time after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub identity: InstanceIdentity,
    pub endpoint: Endpoint,
    pub pid: Option<u32>,
}
