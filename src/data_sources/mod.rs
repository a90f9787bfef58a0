//! # Data sources
//!
//! Read-only lookups. Each sets its ID from the object it found and fills
//! the computed attributes of its schema.

pub mod authdomain_ad;
pub mod configoption;
pub mod domain;
pub mod local_password_policy;
pub mod version;

use crate::provider::DataSource;

/// Every data source shipped with the crate
pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(authdomain_ad::AuthDomainAdDataSource),
        Box::new(configoption::ConfigOptionDataSource),
        Box::new(domain::DomainDataSource),
        Box::new(local_password_policy::LocalPasswordPolicyDataSource),
        Box::new(version::VersionDataSource),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = all().iter().map(|d| d.name()).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
