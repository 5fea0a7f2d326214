//! Deny reasons and the error they become when a caller fails hard

use std::net::IpAddr;
use thiserror::Error;

/// Why a network fetch was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkDenial {
    #[error("network access is disabled")]
    NetworkDisabled,
    #[error("remote fetching is not allowed by policy")]
    FetchNotAllowed,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("scheme '{0}' is not allowed for remote fetches")]
    UnsupportedScheme(String),
    #[error("insecure transport: https is required")]
    InsecureTransport,
    #[error("host '{0}' is not in the allowlist")]
    HostNotAllowed(String),
    #[error("host resolved to no addresses")]
    NoResolvedAddress,
    #[error("address {address} is {class}, not a public address")]
    NonPublicAddress { address: IpAddr, class: &'static str },
    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: u32 },
    #[error("response exceeds {limit} bytes")]
    SizeLimitExceeded { limit: u64 },
    #[error("request exceeded the {limit_ms} ms timeout")]
    Timeout { limit_ms: u128 },
}

/// Why a local file read was refused
///
/// Variants never carry the attempted path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalFileDenial {
    #[error("local file access is disabled")]
    Disabled,
    #[error("path could not be resolved")]
    Unresolvable,
    #[error("path is outside the allowed roots")]
    OutsideAllowedRoots,
    #[error("path is on the deny list")]
    DeniedPath,
    #[error("not a file URL")]
    NotAFileUrl,
}

/// Why an archive was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchiveDenial {
    #[error("archive has {count} members (limit {limit})")]
    TooManyMembers { count: usize, limit: usize },
    #[error("member '{name}' has an unsafe path")]
    UnsafePath { name: String },
    #[error("member '{name}' decompresses to {size} bytes (limit {limit})")]
    MemberTooLarge { name: String, size: u64, limit: u64 },
    #[error("member '{name}' has compression ratio {ratio:.1} (limit {limit:.1})")]
    RatioExceeded { name: String, ratio: f64, limit: f64 },
    #[error("member '{name}' decompresses past its declared {declared} bytes")]
    DeclaredSizeExceeded { name: String, declared: u64 },
    #[error("archive decompresses to {size} bytes in total (limit {limit})")]
    TotalTooLarge { size: u64, limit: u64 },
    #[error("archive is unreadable: {0}")]
    Unreadable(String),
}

/// Why markup was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupDenial {
    #[error("URL scheme '{0}' is not safe to render")]
    UnsafeUrlScheme(String),
    #[error("element <{0}> is not allowed")]
    DangerousElement(String),
}

/// A denial turned into a hard failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("network security: {0}")]
    Network(#[from] NetworkDenial),
    #[error("local file security: {0}")]
    LocalFile(#[from] LocalFileDenial),
    #[error("archive security: {0}")]
    Archive(#[from] ArchiveDenial),
    #[error("markup security: {0}")]
    Markup(#[from] MarkupDenial),
}
