//! `wallix-bastion_device_localdomain_account_credential`

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;

use super::{
    already_exists, credential, device, device_localdomain, device_localdomain_account, not_found_after_post,
    split_import_id,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceLocalDomainAccountCredentialResource;

fn account_uri(device_id: &str, domain_id: &str, account_id: &str) -> String {
    format!("/devices/{device_id}/localdomains/{domain_id}/accounts/{account_id}")
}

impl DeviceLocalDomainAccountCredentialResource {
    fn account_uri(d: &ResourceData) -> String {
        account_uri(
            &d.get_string("device_id"),
            &d.get_string("domain_id"),
            &d.get_string("account_id"),
        )
    }
}

#[async_trait]
impl Resource for DeviceLocalDomainAccountCredentialResource {
    fn name(&self) -> &'static str {
        "device_localdomain_account_credential"
    }

    fn schema(&self) -> Schema {
        credential::with_credential_attributes(
            Schema::new()
                .with_attribute("device_id", Attribute::string().required().force_new())
                .with_attribute("domain_id", Attribute::string().required().force_new())
                .with_attribute("account_id", Attribute::string().required().force_new()),
        )
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let device_id = d.get_string("device_id");
        let domain_id = d.get_string("domain_id");
        let account_id = d.get_string("account_id");
        let kind = d.get_string("type");
        device::ensure_exists(client, &device_id).await?;
        device_localdomain::ensure_exists(client, &device_id, &domain_id).await?;
        device_localdomain_account::ensure_exists(client, &device_id, &domain_id, &account_id).await?;

        let uri = Self::account_uri(d);
        let described = format!("{kind} on account_id {account_id}, domain_id {domain_id}, device_id {device_id}");
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
        const EXPECTED: &str = "<device_id>/<domain_id>/<account_id>/<type>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 4, EXPECTED)?;
        let uri = account_uri(parts[0], parts[1], parts[2]);
        let id = credential::search(client, &uri, parts[3])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "credential",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("device_id", parts[0])?;
        d.set("domain_id", parts[1])?;
        d.set("account_id", parts[2])?;
        d.set_id(id);
        Ok(())
    }
}
