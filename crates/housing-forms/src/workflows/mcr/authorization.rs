/// The fixed set of principals empowered to approve or reject a submitted
/// form. Membership is configuration, injected at construction, and checked
/// case-insensitively. Only the decide transition consults this policy; it
/// does not gate creation or viewing.
#[derive(Debug, Clone)]
pub struct ApproverAllowList {
    principals: Vec<String>,
}

impl ApproverAllowList {
    pub fn new<I, S>(principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let principals = principals
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_ascii_lowercase())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { principals }
    }

    /// Absent or unauthenticated identities fail closed.
    pub fn can_decide(&self, identity: Option<&str>) -> bool {
        match identity {
            Some(identity) if !identity.trim().is_empty() => {
                let normalized = identity.trim().to_ascii_lowercase();
                self.principals.iter().any(|entry| *entry == normalized)
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}
