//! Share-list validation and pure list operations.
//!
//! The collaborator list is an ordered set of lower-case emails. These
//! helpers validate and produce the updated list; persisting it (and the
//! owner-only gate) is the sync layer's job.

use thiserror::Error;

/// Share-registry validation errors. All are rejected locally, before any
/// store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
    #[error("{0} already has access")]
    AlreadyShared(String),
    #[error("{0} does not have access")]
    NotShared(String),
}

/// Syntactic well-formedness: one `@`, non-empty local part, a dot with
/// non-empty segments in the domain, no whitespace anywhere.
pub fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = raw.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Trim, lower-case, and validate an email.
pub fn normalize_email(raw: &str) -> Result<String, ShareError> {
    let email = raw.trim().to_ascii_lowercase();
    if !is_valid_email(&email) {
        return Err(ShareError::InvalidEmail(raw.to_string()));
    }
    Ok(email)
}

/// The list with `raw` appended.
///
/// Fails with [`ShareError::AlreadyShared`] when the email is already a
/// member — the caller is told, rather than a silent no-op.
pub fn add_email(list: &[String], raw: &str) -> Result<Vec<String>, ShareError> {
    let email = normalize_email(raw)?;
    if list.iter().any(|e| e == &email) {
        return Err(ShareError::AlreadyShared(email));
    }
    let mut updated = list.to_vec();
    updated.push(email);
    Ok(updated)
}

/// The list with `raw` removed.
///
/// Fails with [`ShareError::NotShared`] when the email is not a member;
/// callers may report this without treating it as fatal.
pub fn remove_email(list: &[String], raw: &str) -> Result<Vec<String>, ShareError> {
    let email = raw.trim().to_ascii_lowercase();
    if !list.iter().any(|e| e == &email) {
        return Err(ShareError::NotShared(email));
    }
    Ok(list.iter().filter(|e| **e != email).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("b@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(is_valid_email("user+tag@x.co"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plain"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("b@"));
        assert!(!is_valid_email("b@nodot"));
        assert!(!is_valid_email("b@.com"));
        assert!(!is_valid_email("b@x."));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@b@x.com"));
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  B@X.Com ").unwrap(), "b@x.com");
        assert_eq!(
            normalize_email("not an email"),
            Err(ShareError::InvalidEmail("not an email".to_string()))
        );
    }

    #[test]
    fn test_add_appends_normalized() {
        let list = vec!["a@x.com".to_string()];
        let updated = add_email(&list, " B@X.com").unwrap();
        assert_eq!(updated, vec!["a@x.com".to_string(), "b@x.com".to_string()]);
        // Input list untouched.
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let list = vec!["b@x.com".to_string()];
        assert_eq!(
            add_email(&list, "B@x.com"),
            Err(ShareError::AlreadyShared("b@x.com".to_string()))
        );
    }

    #[test]
    fn test_add_twice_keeps_single_membership() {
        let list = Vec::new();
        let once = add_email(&list, "b@x.com").unwrap();
        let again = add_email(&once, "b@x.com");
        assert!(again.is_err());
        assert_eq!(once.iter().filter(|e| *e == "b@x.com").count(), 1);
    }

    #[test]
    fn test_remove_existing() {
        let list = vec!["a@x.com".to_string(), "b@x.com".to_string()];
        let updated = remove_email(&list, "a@x.com").unwrap();
        assert_eq!(updated, vec!["b@x.com".to_string()]);
    }

    #[test]
    fn test_remove_missing_reports_not_shared() {
        let list = vec!["a@x.com".to_string()];
        assert_eq!(
            remove_email(&list, "b@x.com"),
            Err(ShareError::NotShared("b@x.com".to_string()))
        );
    }

    #[test]
    fn test_insertion_order_preserved_for_display() {
        let mut list = Vec::new();
        for email in ["c@x.com", "a@x.com", "b@x.com"] {
            list = add_email(&list, email).unwrap();
        }
        assert_eq!(list, vec!["c@x.com", "a@x.com", "b@x.com"]);
    }
}
