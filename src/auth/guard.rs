//! Ownership checks.
//!
//! There is exactly one permission: the owner of a resource may read, update
//! and delete it. Nobody else may do anything with it.

use super::{
    error::AuthError,
    identity::{Identity, UserId},
};

/// Anything that records the user who created it.
pub trait Owned {
    fn owner(&self) -> UserId;
}

/// Allow the call only when `identity` owns the resource. Pure, no I/O.
///
/// # Errors
/// Returns `AuthError::Forbidden` on mismatch.
pub fn authorize(identity: &Identity, resource_owner: UserId) -> Result<(), AuthError> {
    if identity.user_id() == resource_owner {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Resolve a looked-up resource for `identity`.
///
/// A missing resource is `NotFound`; a resource owned by someone else is
/// `Forbidden`. Callers must run this before disclosing or mutating anything.
///
/// # Errors
/// `NotFound` or `Forbidden` as described above.
pub fn authorize_resource<R: Owned>(
    identity: &Identity,
    resource: Option<R>,
) -> Result<R, AuthError> {
    let resource = resource.ok_or(AuthError::NotFound)?;
    authorize(identity, resource.owner())?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing(UserId);

    impl Owned for Thing {
        fn owner(&self) -> UserId {
            self.0
        }
    }

    #[test]
    fn owner_is_allowed() {
        let identity = Identity::new(UserId::new(42), "owner");
        assert_eq!(authorize(&identity, UserId::new(42)), Ok(()));
    }

    #[test]
    fn non_owner_is_forbidden() {
        let identity = Identity::new(UserId::new(7), "other");
        assert_eq!(
            authorize(&identity, UserId::new(42)),
            Err(AuthError::Forbidden)
        );
    }

    #[test]
    fn missing_resource_is_not_found() {
        let identity = Identity::new(UserId::new(7), "other");
        assert!(matches!(
            authorize_resource::<Thing>(&identity, None),
            Err(AuthError::NotFound)
        ));
    }

    #[test]
    fn found_resource_checks_ownership() {
        let owner = Identity::new(UserId::new(42), "owner");
        let other = Identity::new(UserId::new(7), "other");
        assert!(authorize_resource(&owner, Some(Thing(UserId::new(42)))).is_ok());
        assert!(matches!(
            authorize_resource(&other, Some(Thing(UserId::new(42)))),
            Err(AuthError::Forbidden)
        ));
    }
}
