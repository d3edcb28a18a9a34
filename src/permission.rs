//! Authorization predicates.
//!
//! Every check is a plain function over the acting principal (`None` for an
//! anonymous request), the owner of the resource and the kind of access, so
//! handlers combine them with whatever resource-level policy they enforce.

use uuid::Uuid;

use crate::route::auth::model::User;

/// The kind of access an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	/// Operations without side effects.
	Read,
	/// Anything that creates, changes or deletes a record.
	Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
	#[error("authentication credentials were not provided")]
	Unauthenticated,
	#[error("you do not have permission to perform this action")]
	Forbidden,
}

/// Staff members and superusers are administrators.
pub fn is_admin(user: &User) -> bool {
	user.is_staff || user.is_superuser
}

/// Reads are always allowed; writes only by the record's author.
///
/// A record without an author belongs to nobody, so it cannot be written to.
pub fn is_owner_or_read_only(principal: Option<&User>, owner: Option<Uuid>, access: Access) -> bool {
	match access {
		Access::Read => true,
		Access::Write => matches!((principal, owner), (Some(user), Some(owner)) if user.id == owner),
	}
}

/// Like [`is_owner_or_read_only`], but reports why access was denied.
pub fn check_owner(principal: Option<&User>, owner: Option<Uuid>, access: Access) -> Result<(), Denied> {
	if is_owner_or_read_only(principal, owner, access) {
		Ok(())
	} else if principal.is_none() {
		Err(Denied::Unauthenticated)
	} else {
		Err(Denied::Forbidden)
	}
}

pub fn require_admin(principal: Option<&User>) -> Result<&User, Denied> {
	match principal {
		None => Err(Denied::Unauthenticated),
		Some(user) if is_admin(user) => Ok(user),
		Some(..) => Err(Denied::Forbidden),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn user(is_staff: bool, is_superuser: bool) -> User {
		User {
			id: Uuid::new_v4(),
			email: "jane@example.com".into(),
			password: Vec::new(),
			username: "jane".into(),
			is_staff,
			is_superuser,
			created_at: chrono::Utc::now(),
		}
	}

	#[test]
	fn test_reads_are_open_to_everyone() {
		let jane = user(false, false);

		assert!(is_owner_or_read_only(None, None, Access::Read));
		assert!(is_owner_or_read_only(None, Some(Uuid::new_v4()), Access::Read));
		assert!(is_owner_or_read_only(Some(&jane), Some(Uuid::new_v4()), Access::Read));
	}

	#[test]
	fn test_writes_need_the_author() {
		let jane = user(false, false);

		assert!(is_owner_or_read_only(Some(&jane), Some(jane.id), Access::Write));
		assert!(!is_owner_or_read_only(Some(&jane), Some(Uuid::new_v4()), Access::Write));
		assert!(!is_owner_or_read_only(None, Some(jane.id), Access::Write));
	}

	#[test]
	fn test_anonymous_records_are_read_only() {
		let jane = user(true, true);

		assert!(!is_owner_or_read_only(Some(&jane), None, Access::Write));
		assert!(!is_owner_or_read_only(None, None, Access::Write));
	}

	#[test]
	fn test_check_owner_reports_the_reason() {
		let jane = user(false, false);

		assert_eq!(
			check_owner(None, Some(jane.id), Access::Write),
			Err(Denied::Unauthenticated)
		);
		assert_eq!(
			check_owner(Some(&jane), Some(Uuid::new_v4()), Access::Write),
			Err(Denied::Forbidden)
		);
		assert_eq!(check_owner(Some(&jane), Some(jane.id), Access::Write), Ok(()));
	}

	#[test]
	fn test_require_admin() {
		let staff = user(true, false);
		let superuser = user(false, true);
		let member = user(false, false);

		assert!(require_admin(Some(&staff)).is_ok());
		assert!(require_admin(Some(&superuser)).is_ok());
		assert_eq!(require_admin(Some(&member)).unwrap_err(), Denied::Forbidden);
		assert_eq!(require_admin(None).unwrap_err(), Denied::Unauthenticated);
	}
}
