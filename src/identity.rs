//! User/group identity references and their resolution to numeric ids.
//!
//! A desired owner or group may be given either as a numeric id or as a
//! symbolic name.  Names are resolved through the platform identity database
//! behind the [`IdentityLookup`] seam; numeric refs never touch it.
//!
//! Numeric ids are conventionally unsigned 32-bit, but the platform chown
//! interface stores them in a signed 32-bit slot.  [`to_platform_id`] and
//! [`from_platform_id`] perform the two's-complement reinterpretation at
//! that boundary; the pair round-trips for every id.

use anyhow::Result;
use std::str::FromStr;

use crate::error::LinkError;
use crate::exec::Executor;

/// A reference to a user or group: either an already-numeric id or a
/// symbolic name to be resolved against the platform identity database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRef {
    /// A numeric id, used as-is without any lookup.
    Id(u32),
    /// A symbolic name, resolved via [`IdentityLookup`].
    Name(String),
}

impl From<u32> for IdentityRef {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl FromStr for IdentityRef {
    type Err = std::convert::Infallible;

    /// An all-digit reference is numeric; anything else is a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = s.parse::<u32>() {
                return Ok(Self::Id(id));
            }
        }
        Ok(Self::Name(s.to_string()))
    }
}

impl std::fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Lookup of symbolic user/group names in the platform identity database.
pub trait IdentityLookup: std::fmt::Debug {
    /// Resolve a user name to its numeric id; `None` when the user does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the database itself cannot be queried.
    fn user_id(&self, name: &str) -> Result<Option<u32>>;

    /// Resolve a group name to its numeric id; `None` when the group does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the database itself cannot be queried.
    fn group_id(&self, name: &str) -> Result<Option<u32>>;
}

/// [`IdentityLookup`] backed by `getent`, which consults the same NSS
/// sources as `getpwnam`/`getgrnam`.
#[derive(Debug)]
pub struct SystemIdentity<'a> {
    exec: &'a dyn Executor,
}

impl<'a> SystemIdentity<'a> {
    /// Create a lookup over the given executor.
    pub const fn new(exec: &'a dyn Executor) -> Self {
        Self { exec }
    }

    fn getent(&self, database: &str, name: &str) -> Result<Option<u32>> {
        let result = self.exec.run_unchecked("getent", &[database, name])?;
        if !result.success {
            // getent exits 2 when the key is not found in the database.
            return Ok(None);
        }
        Ok(parse_id_field(&result.stdout))
    }
}

impl IdentityLookup for SystemIdentity<'_> {
    fn user_id(&self, name: &str) -> Result<Option<u32>> {
        self.getent("passwd", name)
    }

    fn group_id(&self, name: &str) -> Result<Option<u32>> {
        self.getent("group", name)
    }
}

/// Extract the numeric id from a passwd/group database line.
///
/// Both formats carry the id in the third colon-separated field
/// (`name:x:id:...`).
fn parse_id_field(line: &str) -> Option<u32> {
    line.lines()
        .next()?
        .split(':')
        .nth(2)?
        .trim()
        .parse::<u32>()
        .ok()
}

/// Resolve a desired owner reference to a numeric user id.
///
/// # Errors
///
/// Returns [`LinkError::IdentityNotFound`] when a symbolic name does not
/// exist, or the lookup's own error when the database cannot be queried.
pub fn resolve_user(reference: &IdentityRef, lookup: &dyn IdentityLookup) -> Result<u32> {
    match reference {
        IdentityRef::Id(id) => Ok(*id),
        IdentityRef::Name(name) => lookup.user_id(name)?.ok_or_else(|| {
            LinkError::IdentityNotFound {
                scope: "user",
                name: name.clone(),
            }
            .into()
        }),
    }
}

/// Resolve a desired group reference to a numeric group id.
///
/// # Errors
///
/// Returns [`LinkError::IdentityNotFound`] when a symbolic name does not
/// exist, or the lookup's own error when the database cannot be queried.
pub fn resolve_group(reference: &IdentityRef, lookup: &dyn IdentityLookup) -> Result<u32> {
    match reference {
        IdentityRef::Id(id) => Ok(*id),
        IdentityRef::Name(name) => lookup.group_id(name)?.ok_or_else(|| {
            LinkError::IdentityNotFound {
                scope: "group",
                name: name.clone(),
            }
            .into()
        }),
    }
}

/// Reinterpret an unsigned 32-bit id as the platform's signed representation.
///
/// Ids above `i32::MAX` wrap to their negative two's-complement form before
/// being handed to the chown primitive.  [`from_platform_id`] is the exact
/// inverse.
#[must_use]
pub const fn to_platform_id(id: u32) -> i32 {
    if id > i32::MAX as u32 {
        ((id as i64) - (1_i64 << 32)) as i32
    } else {
        id as i32
    }
}

/// Inverse of [`to_platform_id`]: recover the unsigned id from its signed
/// platform representation.
#[must_use]
pub const fn from_platform_id(id: i32) -> u32 {
    if id < 0 {
        ((id as i64) + (1_i64 << 32)) as u32
    } else {
        id as u32
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    #[test]
    fn ref_from_digits_is_numeric() {
        let r: IdentityRef = "1000".parse().unwrap();
        assert_eq!(r, IdentityRef::Id(1000));
    }

    #[test]
    fn ref_from_name_is_symbolic() {
        let r: IdentityRef = "daemon".parse().unwrap();
        assert_eq!(r, IdentityRef::Name("daemon".to_string()));
    }

    #[test]
    fn ref_from_overlong_digits_falls_back_to_name() {
        // 2^32 does not fit in a u32; treat it as a name rather than truncate.
        let r: IdentityRef = "4294967296".parse().unwrap();
        assert_eq!(r, IdentityRef::Name("4294967296".to_string()));
    }

    #[test]
    fn parse_id_field_passwd_line() {
        assert_eq!(
            parse_id_field("daemon:x:2:2:daemon:/sbin:/usr/sbin/nologin"),
            Some(2)
        );
    }

    #[test]
    fn parse_id_field_group_line() {
        assert_eq!(parse_id_field("wheel:x:998:alice,bob"), Some(998));
    }

    #[test]
    fn parse_id_field_rejects_garbage() {
        assert_eq!(parse_id_field("not a passwd line"), None);
        assert_eq!(parse_id_field(""), None);
    }

    #[test]
    fn resolve_numeric_ref_skips_lookup() {
        let mock = MockExecutor::fail();
        let identity = SystemIdentity::new(&mock);
        let id = resolve_user(&IdentityRef::Id(42), &identity).unwrap();
        assert_eq!(id, 42);
        assert_eq!(mock.call_count(), 0, "numeric refs must not hit the database");
    }

    #[test]
    fn resolve_name_via_lookup() {
        let mock = MockExecutor::ok("svc:x:301:301::/run/svc:/usr/sbin/nologin");
        let identity = SystemIdentity::new(&mock);
        let id = resolve_user(&IdentityRef::Name("svc".to_string()), &identity).unwrap();
        assert_eq!(id, 301);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn resolve_missing_name_is_identity_not_found() {
        let mock = MockExecutor::fail();
        let identity = SystemIdentity::new(&mock);
        let err = resolve_user(&IdentityRef::Name("ghost".to_string()), &identity).unwrap_err();
        match err.downcast_ref::<LinkError>() {
            Some(LinkError::IdentityNotFound { scope, name }) => {
                assert_eq!(*scope, "user");
                assert_eq!(name, "ghost");
            }
            other => panic!("expected IdentityNotFound, got {other:?}"),
        }
    }

    #[test]
    fn resolve_missing_group_is_identity_not_found() {
        let mock = MockExecutor::fail();
        let identity = SystemIdentity::new(&mock);
        let err = resolve_group(&IdentityRef::Name("nogroup2".to_string()), &identity).unwrap_err();
        match err.downcast_ref::<LinkError>() {
            Some(LinkError::IdentityNotFound { scope, .. }) => {
                assert_eq!(*scope, "group");
            }
            other => panic!("expected IdentityNotFound, got {other:?}"),
        }
    }

    #[test]
    fn platform_id_round_trip_above_signed_max() {
        // 4294967294 is the unsigned form of -2.
        let id: u32 = 4_294_967_294;
        let wrapped = to_platform_id(id);
        assert_eq!(wrapped, -2);
        assert_eq!(from_platform_id(wrapped), id);
    }

    #[test]
    fn platform_id_preserves_small_ids() {
        assert_eq!(to_platform_id(0), 0);
        assert_eq!(to_platform_id(1000), 1000);
        assert_eq!(from_platform_id(1000), 1000);
    }

    #[test]
    fn platform_id_boundaries() {
        assert_eq!(to_platform_id(i32::MAX as u32), i32::MAX);
        assert_eq!(to_platform_id((i32::MAX as u32) + 1), i32::MIN);
        assert_eq!(from_platform_id(i32::MIN), (i32::MAX as u32) + 1);
        assert_eq!(from_platform_id(-1), u32::MAX);
    }

    #[test]
    fn platform_id_round_trip_exhaustive_edges() {
        for id in [0_u32, 1, 999, i32::MAX as u32, (i32::MAX as u32) + 1, u32::MAX] {
            assert_eq!(from_platform_id(to_platform_id(id)), id);
        }
    }
}
