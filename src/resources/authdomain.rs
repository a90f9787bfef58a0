//! `/authdomains` plumbing shared by the AD, Azure AD, LDAP and SAML
//! authentication domains and their group mappings.

use crate::client::BastionClient;
use crate::error::Result;
use crate::schema::ResourceData;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::collection::{HasId, NamedCollection};

pub(crate) const AUTHDOMAINS: NamedCollection = NamedCollection::new("/authdomains/", "domain_name").forced();

/// ID of the authentication domain named `domain_name`
pub(crate) async fn search(client: &BastionClient, domain_name: &str) -> Result<Option<String>> {
    AUTHDOMAINS.search(client, domain_name).await
}

pub(crate) async fn ensure_exists(client: &BastionClient, domain_id: &str) -> Result<()> {
    super::ensure_parent(client, "auth domain", &AUTHDOMAINS.object_uri(domain_id), domain_id).await
}

pub(crate) async fn fetch<T: DeserializeOwned + HasId>(client: &BastionClient, id: &str) -> Result<Option<T>> {
    AUTHDOMAINS.fetch(client, id).await
}

pub(crate) async fn create<B: Serialize + Sync>(client: &BastionClient, d: &mut ResourceData, payload: &B) -> Result<()> {
    AUTHDOMAINS.create(client, d, payload).await
}

pub(crate) async fn update<B: Serialize + Sync>(client: &BastionClient, d: &ResourceData, payload: &B) -> Result<()> {
    AUTHDOMAINS.update(client, d, payload).await
}

pub(crate) async fn delete(client: &BastionClient, d: &ResourceData) -> Result<()> {
    AUTHDOMAINS.delete(client, d).await
}

pub(crate) async fn import(client: &BastionClient, d: &mut ResourceData) -> Result<()> {
    AUTHDOMAINS.import(client, d, "<domain_name>").await
}
