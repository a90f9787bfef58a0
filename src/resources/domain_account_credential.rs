//! `wallix-bastion_domain_account_credential`

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;

use super::{already_exists, credential, domain, domain_account, not_found_after_post, split_import_id};

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainAccountCredentialResource;

fn account_uri(domain_id: &str, account_id: &str) -> String {
    format!("/domains/{domain_id}/accounts/{account_id}")
}

impl DomainAccountCredentialResource {
    fn account_uri(d: &ResourceData) -> String {
        account_uri(&d.get_string("domain_id"), &d.get_string("account_id"))
    }
}

#[async_trait]
impl Resource for DomainAccountCredentialResource {
    fn name(&self) -> &'static str {
        "domain_account_credential"
    }

    fn schema(&self) -> Schema {
        credential::with_credential_attributes(
            Schema::new()
                .with_attribute("domain_id", Attribute::string().required().force_new())
                .with_attribute("account_id", Attribute::string().required().force_new()),
        )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_id = d.get_string("domain_id");
        let account_id = d.get_string("account_id");
        let kind = d.get_string("type");
        domain::ensure_exists(client, &domain_id).await?;
        domain_account::ensure_exists(client, &domain_id, &account_id).await?;

        let uri = Self::account_uri(d);
        let described = format!("{kind} on account_id {account_id}, domain_id {domain_id}");
        if credential::search(client, &uri, &kind).await?.is_some() {
            return Err(already_exists("credential type", described));
        }
        client
            .post(&format!("{uri}/credentials/"), &credential::payload(d))
            .await?;
        let id = credential::search(client, &uri, &kind)
            .await?
            .ok_or_else(|| not_found_after_post("credential type", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        match credential::fetch(client, &Self::account_uri(d), d.id()).await? {
            Some(json) => credential::fill(d, json),
            None => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}/credentials/{}", Self::account_uri(d), d.id());
        client.put(&uri, &credential::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}/credentials/{}", Self::account_uri(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<domain_id>/<account_id>/<type>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 3, EXPECTED)?;
        let id = credential::search(client, &account_uri(parts[0], parts[1]), parts[2])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "credential",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("domain_id", parts[0])?;
        d.set("account_id", parts[1])?;
        d.set_id(id);
        Ok(())
    }
}
