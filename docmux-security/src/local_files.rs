//! Local file access policy
//!
//! Paths are resolved to one absolute form before any comparison, so `..`
//! segments and symlinks cannot step outside an allowed root. The deny list is
//! checked first and always wins. Deny reasons never mention the path; callers
//! that soft-fail put [`LOCAL_FILE_PLACEHOLDER`] in the output instead.

use crate::error::LocalFileDenial;
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Text substituted for content from a refused local file
pub const LOCAL_FILE_PLACEHOLDER: &str = "[local file omitted]";

/// Turns a requested path into the absolute path it really names
pub trait PathResolver {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf>;
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// Resolves through the filesystem, following symlinks
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl PathResolver for FsResolver {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir().and_then(std::fs::canonicalize)
    }
}

/// Resolves by normalizing components against a fixed working directory
///
/// Does no I/O, so symlinks are not followed.
#[derive(Debug, Clone)]
pub struct LexicalResolver {
    cwd: PathBuf,
}

impl LexicalResolver {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl PathResolver for LexicalResolver {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        Ok(normalize(&joined))
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(normalize(&self.cwd))
    }
}

/// Drop `.` and apply `..` lexically; `..` never climbs above the root
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalFileAccessPolicy {
    pub allow: bool,
    /// Treat the working directory as an allowed root
    pub allow_current_dir: bool,
    pub allowed_roots: Vec<PathBuf>,
    pub denied_paths: Vec<PathBuf>,
}

impl LocalFileAccessPolicy {
    pub fn check_path(&self, path: &Path) -> Verdict {
        self.check_path_with(path, &FsResolver)
    }

    pub fn check_path_with<R: PathResolver + ?Sized>(&self, path: &Path, resolver: &R) -> Verdict {
        if !self.allow {
            return Verdict::deny(LocalFileDenial::Disabled);
        }
        let resolved = match resolver.resolve(path) {
            Ok(resolved) => resolved,
            Err(_) => return Verdict::deny(LocalFileDenial::Unresolvable),
        };

        let denied = self
            .denied_paths
            .iter()
            .filter_map(|p| resolve_entry(resolver, p))
            .any(|p| resolved.starts_with(p));
        if denied {
            return Verdict::deny(LocalFileDenial::DeniedPath);
        }

        let mut roots: Vec<PathBuf> = self
            .allowed_roots
            .iter()
            .filter_map(|p| resolve_entry(resolver, p))
            .collect();
        if self.allow_current_dir {
            if let Ok(cwd) = resolver.current_dir() {
                roots.push(cwd);
            }
        }
        if roots.iter().any(|root| resolved.starts_with(root)) {
            Verdict::Allow
        } else {
            Verdict::deny(LocalFileDenial::OutsideAllowedRoots)
        }
    }

    /// Check a `file://` URL
    pub fn check_file_url(&self, url: &str) -> Verdict {
        self.check_file_url_with(url, &FsResolver)
    }

    pub fn check_file_url_with<R: PathResolver + ?Sized>(&self, url: &str, resolver: &R) -> Verdict {
        match file_url_path(url) {
            Some(path) => self.check_path_with(&path, resolver),
            None => Verdict::deny(LocalFileDenial::NotAFileUrl),
        }
    }
}

/// Path named by a `file://` URL
pub fn file_url_path(url: &str) -> Option<PathBuf> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}

// Entries that do not exist are skipped: a missing deny entry denies nothing
// and a missing root admits nothing.
fn resolve_entry<R: PathResolver + ?Sized>(resolver: &R, path: &Path) -> Option<PathBuf> {
    resolver.resolve(path).ok()
}
