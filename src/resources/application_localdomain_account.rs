//! `wallix-bastion_application_localdomain_account`

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    already_exists, application, application_localdomain, not_found_after_post, split_import_id, JsonCredential,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonApplicationLocalDomainAccount {
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    account_name: String,
    account_login: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain_password_change: Option<bool>,
    auto_change_password: bool,
    checkout_policy: String,
    credentials: Vec<JsonCredential>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationLocalDomainAccountResource;

async fn search(
    client: &BastionClient,
    application_id: &str,
    domain_id: &str,
    account_name: &str,
) -> Result<Option<String>> {
    client
        .search_by_query(
            &format!("/applications/{application_id}/localdomains/{domain_id}/accounts/"),
            "account_name",
            account_name,
        )
        .await
}

impl ApplicationLocalDomainAccountResource {
    /// The password is carried as a `password` credential, or not at all
    fn payload(d: &ResourceData) -> JsonApplicationLocalDomainAccount {
        let password = d.get_string("password");
        let credentials = if password.is_empty() {
            Vec::new()
        } else {
            vec![JsonCredential {
                kind: "password".to_string(),
                password,
                ..JsonCredential::default()
            }]
        };
        JsonApplicationLocalDomainAccount {
            account_name: d.get_string("account_name"),
            account_login: d.get_string("account_login"),
            checkout_policy: d.get_string("checkout_policy"),
            auto_change_password: d.get_bool("auto_change_password"),
            description: d.get_string("description"),
            credentials,
            ..JsonApplicationLocalDomainAccount::default()
        }
    }

    fn collection(d: &ResourceData) -> String {
        format!(
            "/applications/{}/localdomains/{}/accounts/",
            d.get_string("application_id"),
            d.get_string("domain_id")
        )
    }
}

#[async_trait]
impl Resource for ApplicationLocalDomainAccountResource {
    fn name(&self) -> &'static str {
        "application_localdomain_account"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("application_id", Attribute::string().required().force_new())
            .with_attribute("domain_id", Attribute::string().required().force_new())
            .with_attribute("account_name", Attribute::string().required())
            .with_attribute("account_login", Attribute::string().required())
            .with_attribute("auto_change_password", Attribute::bool().optional())
            .with_attribute("checkout_policy", Attribute::string().default("default"))
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("domain_password_change", Attribute::bool().computed())
            .with_attribute("password", Attribute::string().optional().sensitive())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let application_id = d.get_string("application_id");
        let domain_id = d.get_string("domain_id");
        let account_name = d.get_string("account_name");
        application::ensure_exists(client, &application_id).await?;
        application_localdomain::ensure_exists(client, &application_id, &domain_id).await?;
        let described = format!("{account_name} on domain_id {domain_id}, application_id {application_id}");
        if search(client, &application_id, &domain_id, &account_name)
            .await?
            .is_some()
        {
            return Err(already_exists("account_name", described));
        }
        client.post(&Self::collection(d), &Self::payload(d)).await?;
        let id = search(client, &application_id, &domain_id, &account_name)
            .await?
            .ok_or_else(|| not_found_after_post("account_name", described))?;
        d.set_id(id);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}", Self::collection(d), d.id());
        match client.get_json::<JsonApplicationLocalDomainAccount>(&uri).await? {
            Some(json) if !json.id.is_empty() => {
                d.set("account_name", json.account_name)?;
                d.set("account_login", json.account_login)?;
                d.set("checkout_policy", json.checkout_policy)?;
                d.set("auto_change_password", json.auto_change_password)?;
                d.set("description", json.description)?;
                d.set("domain_password_change", json.domain_password_change.unwrap_or_default())
            }
            _ => {
                d.set_id("");
                Ok(())
            }
        }
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = format!("{}{}?force=true", Self::collection(d), d.id());
        client.put(&uri, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client
            .delete(&format!("{}{}", Self::collection(d), d.id()))
            .await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        const EXPECTED: &str = "<application_id>/<domain_id>/<account_name>";
        let import_id = d.id().to_string();
        let parts = split_import_id(&import_id, 3, EXPECTED)?;
        let id = search(client, parts[0], parts[1], parts[2])
            .await?
            .ok_or_else(|| BastionError::ImportNotFound {
                field: "account_name",
                id: import_id.clone(),
                expected: EXPECTED,
            })?;
        d.set("application_id", parts[0])?;
        d.set("domain_id", parts[1])?;
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_becomes_credential() {
        let config = json!({"application_id": "a", "domain_id": "l", "account_name": "svc",
                            "account_login": "svc", "password": "pw"});
        let d = ResourceData::from_config(
            ApplicationLocalDomainAccountResource.schema(),
            config.as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(ApplicationLocalDomainAccountResource::payload(&d)).unwrap();
        assert_eq!(payload["credentials"], json!([{"type": "password", "password": "pw"}]));
        assert_eq!(payload["checkout_policy"], "default");

        let config = json!({"application_id": "a", "domain_id": "l", "account_name": "svc", "account_login": "svc"});
        let d = ResourceData::from_config(
            ApplicationLocalDomainAccountResource.schema(),
            config.as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(ApplicationLocalDomainAccountResource::payload(&d)).unwrap();
        assert_eq!(payload["credentials"], json!([]));
    }
}
