//! `wallix-bastion_domain_account`: accounts of a global domain.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{already_exists, credential, domain, not_found_after_post, split_import_id, JsonCredential};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonDomainAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    account_name: String,
    account_login: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain_password_change: Option<bool>,
    auto_change_password: bool,
    auto_change_ssh_key: bool,
    checkout_policy: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    certificate_validity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<Vec<JsonCredential>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainAccountResource;

pub(crate) async fn search(client: &BastionClient, domain_id: &str, account_name: &str) -> Result<Option<String>> {
    client
        .search_by_query(&format!("/domains/{domain_id}/accounts/"), "account_name", account_name)
        .await
}

pub(crate) async fn ensure_exists(client: &BastionClient, domain_id: &str, account_id: &str) -> Result<()> {
    super::ensure_parent(
        client,
        "account_id",
        &format!("/domains/{domain_id}/accounts/{account_id}"),
        &format!("{account_id} on domain_id {domain_id}"),
    )
    .await
}

impl DomainAccountResource {
    fn payload(d: &ResourceData) -> Result<JsonDomainAccount> {
        let mut json = JsonDomainAccount {
            account_name: d.get_string("account_name"),
            account_login: d.get_string("account_login"),
            checkout_policy: d.get_string("checkout_policy"),
            auto_change_password: d.get_bool("auto_change_password"),
            auto_change_ssh_key: d.get_bool("auto_change_ssh_key"),
            certificate_validity: d.get_string("certificate_validity"),
            description: d.get_string("description"),
            ..JsonDomainAccount::default()
        };
        if d.has_change("resources") {
            let resources = d.get_string_list("resources");
            if resources.iter().any(|r| r.split(':').count() != 2) {
                return Err(BastionError::validation(
                    "resource must have format device:service or application:APP",
                ));
            }
            json.resources = Some(resources);
        }
        Ok(json)
    }

    fn collection(d: &ResourceData) -> String {
        format!("/domains/{}/accounts/", d.get_string("domain_id"))
    }
}

#[async_trait]
impl Resource for DomainAccountResource {
    fn name(&self) -> &'static str {
        "domain_account"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("domain_id", Attribute::string().required().force_new())
            .with_attribute("account_name", Attribute::string().required())
            .with_attribute("account_login", Attribute::string().required())
            .with_attribute("auto_change_password", Attribute::bool().optional())
            .with_attribute("auto_change_ssh_key", Attribute::bool().optional())
            .with_attribute("certificate_validity", Attribute::string().optional())
            .with_attribute("checkout_policy", Attribute::string().default("default"))
            .with_attribute("credentials", Attribute::block_list(credential::summary_schema()).computed())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("domain_password_change", Attribute::bool().computed())
            .with_attribute("resources", Attribute::string_set().optional().computed())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let domain_id = d.get_string("domain_id");
        let account_name = d.get_string("account_name");
        domain::ensure_exists(client, &domain_id).await?;
        let described = format!("{account_name} on domain_id {domain_id}");
        if search(client, &domain_id, &account_name).await?.is_some() {
            return Err(already_exists("account_name", described));
        }
        client.post(&Self::collection(d), &Self::payload(d)?).await?;
        let id = search(client, &domain_id, &account_name)
            .await?
            .ok_or_else(|| not_found_after_post("account_name", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}", Self::collection(d), d.id());
        match client.get_json::<JsonDomainAccount>(&uri).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("account_name", json.account_name)?;
                d.set("account_login", json.account_login)?;
                d.set("checkout_policy", json.checkout_policy)?;
                d.set("auto_change_password", json.auto_change_password)?;
                d.set("auto_change_ssh_key", json.auto_change_ssh_key)?;
                d.set("certificate_validity", json.certificate_validity)?;
                d.set("credentials", credential::summaries(json.credentials))?;
                d.set("description", json.description)?;
                d.set("domain_password_change", json.domain_password_change.unwrap_or_default())?;
                d.set("resources", json.resources.unwrap_or_default())
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}?force=true", Self::collection(d), d.id());
        client.put(&uri, &Self::payload(d)?).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}{}", Self::collection(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<domain_id>/<account_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 2, EXPECTED)?;
        let id = search(client, parts[0], parts[1])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "account_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("domain_id", parts[0])?;
        d.set_id(id);
        Ok(())
    }
}
