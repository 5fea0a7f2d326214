//! # docmux-security
//!
//! Policy checks every parser runs before reaching outside in-memory parsing:
//! remote fetches, local file reads, archive extraction and markup that will
//! be rendered again.
//!
//! Every check is a pure function of a request and a policy returning a
//! [`Verdict`]. Nothing here performs the I/O being judged. Policies default
//! to the most restrictive setting:
//!
//! - [`NetworkFetchPolicy::default`] denies every URL
//! - [`LocalFileAccessPolicy::default`] denies every path
//! - [`ArchiveValidationPolicy::default`] caps count, size and ratio
//! - [`MarkupSanitizationPolicy::default`] strips event handlers and unsafe URLs
//!
//! Policies are plain immutable values and can be shared across threads.

pub mod archive;
pub mod error;
pub mod local_files;
pub mod markup;
pub mod network;
pub mod verdict;

pub use archive::{safe_member_path, zip_members, ArchiveMember, ArchiveValidationPolicy};
pub use error::{ArchiveDenial, LocalFileDenial, MarkupDenial, NetworkDenial, SecurityError};
pub use local_files::{
    FsResolver, LexicalResolver, LocalFileAccessPolicy, PathResolver, LOCAL_FILE_PLACEHOLDER,
};
pub use markup::{
    is_dangerous_element, is_event_handler, is_framework_directive, is_safe_url_scheme,
    MarkupSanitizationPolicy, SanitizedAttributes,
};
pub use network::{is_public_address, ByteBudget, CappedReader, NetworkFetchPolicy};
pub use verdict::{DenyReason, Verdict};
