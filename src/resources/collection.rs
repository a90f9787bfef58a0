//! Top-level collections whose objects are addressed by a unique name
//! (`/checkoutpolicies/`, `/profiles/`, `/authdomains/`, ...).

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::schema::ResourceData;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{already_exists, not_found_after_post};

/// How a name is resolved to an ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// `?q=<field>=<name>`
    Query,
    /// List every object with `?fields=<field>,id` and match locally
    Scan,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NamedCollection {
    pub uri: &'static str,
    pub field: &'static str,
    pub lookup: Lookup,
    /// Append `?force=true` to updates
    pub force_update: bool,
}

impl NamedCollection {
    pub(crate) const fn new(uri: &'static str, field: &'static str) -> Self {
        Self {
            uri,
            field,
            lookup: Lookup::Query,
            force_update: false,
        }
    }

    pub(crate) const fn scanned(mut self) -> Self {
        self.lookup = Lookup::Scan;
        self
    }

    pub(crate) const fn forced(mut self) -> Self {
        self.force_update = true;
        self
    }

    pub(crate) fn object_uri(&self, id: &str) -> String {
        format!("{}{id}", self.uri)
    }

    /// ID of the object named `name`
    pub(crate) async fn search(&self, client: &BastionClient, name: &str) -> Result<Option<String>> {
        match self.lookup {
            Lookup::Query => client.search_by_query(self.uri, self.field, name).await,
            Lookup::Scan => client.search_by_scan(self.uri, self.field, name).await,
        }
    }

    /// Object by ID; `None` on 404 or when the body carries no ID
    pub(crate) async fn fetch<T: DeserializeOwned + HasId>(&self, client: &BastionClient, id: &str) -> Result<Option<T>> {
        Ok(client
            .get_json::<T>(&self.object_uri(id))
            .await?
            .filter(|json| !json.id().is_empty()))
    }

    /// Refuse a duplicate name, POST, then learn the new ID
    pub(crate) async fn create<B: Serialize + Sync>(
        &self,
        client: &BastionClient,
        d: &mut ResourceData,
        payload: &B,
    ) -> Result<()> {
        let name = d.get_string(self.field);
        if self.search(client, &name).await?.is_some() {
            return Err(already_exists(self.field, name));
        }
        client.post(self.uri, payload).await?;
        let id = self
            .search(client, &name)
            .await?
            .ok_or_else(|| not_found_after_post(self.field, &name))?;
        d.set_id(id);
        Ok(())
    }

    pub(crate) async fn update<B: Serialize + Sync>(
        &self,
        client: &BastionClient,
        d: &ResourceData,
        payload: &B,
    ) -> Result<()> {
        let mut uri = self.object_uri(d.id());
        if self.force_update {
            uri.push_str("?force=true");
        }
        client.put(&uri, payload).await
    }

    pub(crate) async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&self.object_uri(d.id())).await
    }

    /// Resolve an import ID holding the object name
    pub(crate) async fn import(&self, client: &BastionClient, d: &mut ResourceData, expected: &'static str) -> Result<()> {
        let name = d.id().to_string();
        let id = self
            .search(client, &name)
            .await?
            .ok_or(BastionError::ImportNotFound {
                field: self.field,
                id: name,
                expected,
            })?;
        d.set_id(id);
        Ok(())
    }
}

/// Payloads read back from a collection
pub(crate) trait HasId {
    fn id(&self) -> &str;
}

/// Implement [`HasId`] for payload structs with an `id: String` field
macro_rules! has_id {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::resources::collection::HasId for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })+
    };
}

pub(crate) use has_id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        const PROFILES: NamedCollection = NamedCollection::new("/profiles/", "profile_name").scanned().forced();
        assert_eq!(PROFILES.lookup, Lookup::Scan);
        assert!(PROFILES.force_update);
        assert_eq!(PROFILES.object_uri("p1"), "/profiles/p1");
    }
}
