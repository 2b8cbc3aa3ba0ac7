use std::collections::HashSet;

/// Static set of privileged usernames.
///
/// Names are stored lowercase; membership is tested against the lowercase
/// form of the candidate.
#[derive(Clone, Debug, Default)]
pub struct AdminPolicy {
    usernames: HashSet<String>,
}

impl AdminPolicy {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            usernames: usernames
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.usernames.contains(&username.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.usernames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_case_insensitive() {
        let policy = AdminPolicy::new(["admin", "Owner"]);
        assert!(policy.is_admin("ADMIN"));
        assert!(policy.is_admin("owner"));
        assert!(!policy.is_admin("headadmin"));
    }

    #[test]
    fn test_empty_policy_has_no_admins() {
        let policy = AdminPolicy::default();
        assert!(policy.is_empty());
        assert!(!policy.is_admin("admin"));
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let policy = AdminPolicy::new(["admin", "ADMIN", "Admin"]);
        assert_eq!(policy.len(), 1);
    }
}
