//! The result of every policy check

use crate::error::{ArchiveDenial, LocalFileDenial, MarkupDenial, NetworkDenial, SecurityError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DenyReason {
    Network(NetworkDenial),
    LocalFile(LocalFileDenial),
    Archive(ArchiveDenial),
    Markup(MarkupDenial),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Network(r) => write!(f, "{}", r),
            DenyReason::LocalFile(r) => write!(f, "{}", r),
            DenyReason::Archive(r) => write!(f, "{}", r),
            DenyReason::Markup(r) => write!(f, "{}", r),
        }
    }
}

impl From<DenyReason> for SecurityError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Network(r) => SecurityError::Network(r),
            DenyReason::LocalFile(r) => SecurityError::LocalFile(r),
            DenyReason::Archive(r) => SecurityError::Archive(r),
            DenyReason::Markup(r) => SecurityError::Markup(r),
        }
    }
}

/// Allow or deny, never an error
///
/// The caller decides whether a deny is a soft failure (a placeholder in the
/// output) or a hard one ([`Verdict::into_result`]).
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    pub(crate) fn deny(reason: impl Into<DenyReason>) -> Verdict {
        let reason = reason.into();
        log::warn!("security gate denied access: {}", reason);
        Verdict::Deny(reason)
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), SecurityError> {
        match self {
            Verdict::Allow => Ok(()),
            Verdict::Deny(reason) => Err(reason.into()),
        }
    }

    /// Continue with `next` only if this verdict allows
    pub fn and_then(self, next: impl FnOnce() -> Verdict) -> Verdict {
        match self {
            Verdict::Allow => next(),
            deny => deny,
        }
    }
}

impl From<NetworkDenial> for DenyReason {
    fn from(r: NetworkDenial) -> Self {
        DenyReason::Network(r)
    }
}

impl From<LocalFileDenial> for DenyReason {
    fn from(r: LocalFileDenial) -> Self {
        DenyReason::LocalFile(r)
    }
}

impl From<ArchiveDenial> for DenyReason {
    fn from(r: ArchiveDenial) -> Self {
        DenyReason::Archive(r)
    }
}

impl From<MarkupDenial> for DenyReason {
    fn from(r: MarkupDenial) -> Self {
        DenyReason::Markup(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_maps_category() {
        assert!(Verdict::Allow.into_result().is_ok());
        let err = Verdict::deny(NetworkDenial::FetchNotAllowed)
            .into_result()
            .unwrap_err();
        assert_eq!(err, SecurityError::Network(NetworkDenial::FetchNotAllowed));
        assert_eq!(
            err.to_string(),
            "network security: remote fetching is not allowed by policy"
        );
    }

    #[test]
    fn test_and_then_short_circuits() {
        let v = Verdict::deny(LocalFileDenial::Disabled).and_then(|| Verdict::Allow);
        assert!(v.is_denied());
        assert_eq!(v.reason(), Some(&DenyReason::LocalFile(LocalFileDenial::Disabled)));
        assert!(Verdict::Allow.and_then(|| Verdict::Allow).is_allowed());
    }
}
