//! Static domain allow-list.

use std::collections::HashSet;

use super::DomainValidator;
use crate::types::DomainName;

/// Accepts only the listed domains, or every domain if the list is empty.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    domains: HashSet<DomainName>,
}

impl AllowList {
    pub fn new(domains: impl IntoIterator<Item = DomainName>) -> Self {
        AllowList {
            domains: domains.into_iter().collect(),
        }
    }

    /// An allow-list that accepts any domain.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn allows(&self, domain: &DomainName) -> bool {
        self.domains.is_empty() || self.domains.contains(domain)
    }
}

impl DomainValidator for AllowList {
    async fn validate_domain(&self, domain: &DomainName) -> bool {
        self.allows(domain)
    }
}
