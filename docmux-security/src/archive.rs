//! Archive extraction policy
//!
//! The whole member list is judged before anything is extracted, in this order:
//! member count, then each member's path, size and compression ratio, then the
//! total decompressed size. The first violation rejects the archive as a whole.
//!
//! Declared sizes come from the archive itself, so extraction goes through
//! [`ArchiveValidationPolicy::extract_member`], which stops reading as soon as
//! a member produces more than it declared.

use crate::error::{ArchiveDenial, SecurityError};
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

pub const DEFAULT_MAX_FILES: usize = 1000;
/// 100 MiB per member
pub const DEFAULT_MAX_MEMBER_BYTES: u64 = 100 * 1024 * 1024;
/// 1 GiB for the whole archive
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_MAX_RATIO: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveValidationPolicy {
    pub max_files: usize,
    pub max_member_bytes: u64,
    pub max_total_bytes: u64,
    /// Largest allowed decompressed:compressed ratio for one member
    pub max_compression_ratio: f64,
}

impl Default for ArchiveValidationPolicy {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_member_bytes: DEFAULT_MAX_MEMBER_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_compression_ratio: DEFAULT_MAX_RATIO,
        }
    }
}

/// One entry of an archive's directory, as declared by the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveMember {
    pub name: String,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub is_dir: bool,
}

impl ArchiveMember {
    pub fn file(name: impl Into<String>, compressed_size: u64, uncompressed_size: u64) -> Self {
        Self {
            name: name.into(),
            compressed_size,
            uncompressed_size,
            is_dir: false,
        }
    }

    /// Decompressed:compressed ratio; infinite when a non-empty member claims zero compressed bytes
    pub fn ratio(&self) -> f64 {
        match (self.compressed_size, self.uncompressed_size) {
            (_, 0) => 0.0,
            (0, _) => f64::INFINITY,
            (c, u) => u as f64 / c as f64,
        }
    }
}

impl ArchiveValidationPolicy {
    pub fn check_archive(&self, members: &[ArchiveMember]) -> Verdict {
        if members.len() > self.max_files {
            return Verdict::deny(ArchiveDenial::TooManyMembers {
                count: members.len(),
                limit: self.max_files,
            });
        }

        let mut total: u64 = 0;
        for member in members {
            if safe_member_path(&member.name).is_none() {
                return Verdict::deny(ArchiveDenial::UnsafePath {
                    name: member.name.clone(),
                });
            }
            if member.is_dir {
                continue;
            }
            if member.uncompressed_size > self.max_member_bytes {
                return Verdict::deny(ArchiveDenial::MemberTooLarge {
                    name: member.name.clone(),
                    size: member.uncompressed_size,
                    limit: self.max_member_bytes,
                });
            }
            let ratio = member.ratio();
            if ratio > self.max_compression_ratio {
                return Verdict::deny(ArchiveDenial::RatioExceeded {
                    name: member.name.clone(),
                    ratio,
                    limit: self.max_compression_ratio,
                });
            }
            total = total.saturating_add(member.uncompressed_size);
        }

        if total > self.max_total_bytes {
            return Verdict::deny(ArchiveDenial::TotalTooLarge {
                size: total,
                limit: self.max_total_bytes,
            });
        }
        Verdict::Allow
    }

    /// Read a zip's directory and check it
    pub fn check_zip(&self, bytes: &[u8]) -> Verdict {
        match zip_members(bytes) {
            Ok(members) => self.check_archive(&members),
            Err(SecurityError::Archive(denial)) => Verdict::deny(denial),
            Err(other) => Verdict::deny(ArchiveDenial::Unreadable(other.to_string())),
        }
    }

    /// Decompress one zip member, capped at its declared size and at `max_member_bytes`
    pub fn extract_member(&self, bytes: &[u8], name: &str) -> Result<Vec<u8>, SecurityError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ArchiveDenial::Unreadable(e.to_string()))?;
        let entry = archive
            .by_name(name)
            .map_err(|e| ArchiveDenial::Unreadable(e.to_string()))?;
        if safe_member_path(entry.name()).is_none() {
            return Err(ArchiveDenial::UnsafePath {
                name: name.to_string(),
            }
            .into());
        }

        let declared = entry.size();
        let limit = declared.min(self.max_member_bytes);
        let mut out = Vec::new();
        entry
            .take(limit.saturating_add(1))
            .read_to_end(&mut out)
            .map_err(|e| ArchiveDenial::Unreadable(e.to_string()))?;
        if out.len() as u64 <= limit {
            return Ok(out);
        }

        log::warn!("archive member '{}' inflated past {} bytes", name, limit);
        let denial = if declared > self.max_member_bytes {
            ArchiveDenial::MemberTooLarge {
                name: name.to_string(),
                size: declared,
                limit: self.max_member_bytes,
            }
        } else {
            ArchiveDenial::DeclaredSizeExceeded {
                name: name.to_string(),
                declared,
            }
        };
        Err(denial.into())
    }
}

/// Relative path a member may be extracted to, or `None` if it would escape
///
/// Backslashes count as separators. Absolute paths, drive prefixes and `..`
/// segments that climb above the target directory are refused outright rather
/// than stripped.
pub fn safe_member_path(name: &str) -> Option<PathBuf> {
    let unified = name.replace('\\', "/");
    if unified.starts_with('/') || unified.contains('\0') || has_drive_prefix(&unified) {
        return None;
    }

    let mut out = PathBuf::new();
    let mut depth: usize = 0;
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// List a zip's members from its central directory without decompressing
pub fn zip_members(bytes: &[u8]) -> Result<Vec<ArchiveMember>, SecurityError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ArchiveDenial::Unreadable(e.to_string()))?;
    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| ArchiveDenial::Unreadable(e.to_string()))?;
        members.push(ArchiveMember {
            name: entry.name().to_string(),
            compressed_size: entry.compressed_size(),
            uncompressed_size: entry.size(),
            is_dir: entry.is_dir(),
        });
    }
    log::debug!("zip directory lists {} members", members.len());
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_member_count_checked_first() {
        let policy = ArchiveValidationPolicy {
            max_files: 10,
            ..Default::default()
        };
        // The traversal member would also fail, but the count is reported.
        let mut members: Vec<ArchiveMember> = (0..10)
            .map(|i| ArchiveMember::file(format!("f{}.txt", i), 10, 20))
            .collect();
        members.push(ArchiveMember::file("../evil", 10, 20));
        assert_eq!(
            policy.check_archive(&members),
            Verdict::Deny(ArchiveDenial::TooManyMembers { count: 11, limit: 10 }.into())
        );
        members.pop();
        assert!(policy.check_archive(&members).is_allowed());
    }

    #[test]
    fn test_ratio_below_size_ceiling() {
        let policy = ArchiveValidationPolicy::default();
        let bomb = ArchiveMember::file("bomb.txt", 1_000, 1_000_000);
        assert!(bomb.uncompressed_size < policy.max_member_bytes);
        assert!(matches!(
            policy.check_archive(&[bomb]),
            Verdict::Deny(crate::DenyReason::Archive(ArchiveDenial::RatioExceeded { .. }))
        ));
    }

    #[test]
    fn test_member_and_total_size() {
        let policy = ArchiveValidationPolicy {
            max_member_bytes: 100,
            max_total_bytes: 150,
            ..Default::default()
        };
        assert!(policy
            .check_archive(&[ArchiveMember::file("a", 100, 101)])
            .is_denied());
        assert_eq!(
            policy.check_archive(&[
                ArchiveMember::file("a", 80, 80),
                ArchiveMember::file("b", 80, 80)
            ]),
            Verdict::Deny(ArchiveDenial::TotalTooLarge { size: 160, limit: 150 }.into())
        );
    }

    #[test]
    fn test_zero_compressed_size() {
        let policy = ArchiveValidationPolicy::default();
        assert!(policy
            .check_archive(&[ArchiveMember::file("a", 0, 10)])
            .is_denied());
        assert!(policy
            .check_archive(&[ArchiveMember::file("empty", 0, 0)])
            .is_allowed());
    }

    #[rstest]
    #[case("docs/readme.txt", Some("docs/readme.txt"))]
    #[case("./a/./b", Some("a/b"))]
    #[case("a/../b", Some("b"))]
    #[case("../evil", None)]
    #[case("a/../../evil", None)]
    #[case("/etc/passwd", None)]
    #[case("C:/Windows/x", None)]
    #[case("..\\..\\evil", None)]
    #[case("", None)]
    #[case(".", None)]
    fn test_safe_member_path(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(safe_member_path(name), expected.map(PathBuf::from));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let policy = ArchiveValidationPolicy::default();
        assert!(matches!(
            policy.check_zip(b"not a zip"),
            Verdict::Deny(crate::DenyReason::Archive(ArchiveDenial::Unreadable(_)))
        ));
    }
}
