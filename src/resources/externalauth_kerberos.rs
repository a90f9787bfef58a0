//! `wallix-bastion_externalauth_kerberos`

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::collection::{has_id, NamedCollection};

const EXTERNAL_AUTHS: NamedCollection =
    NamedCollection::new("/externalauths/", "authentication_name").scanned();

const KERBEROS: &str = "KERBEROS";
const KERBEROS_PASSWORD: &str = "KERBEROS-PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonExternalAuthKerberos {
    use_primary_auth_domain: bool,
    port: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    id: String,
    authentication_name: String,
    description: String,
    host: String,
    ker_dom_controller: String,
    login_attribute: String,
    #[serde(rename = "type")]
    kind: String,
}

has_id!(JsonExternalAuthKerberos);

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalAuthKerberosResource;

impl ExternalAuthKerberosResource {
    fn payload(d: &ResourceData) -> JsonExternalAuthKerberos {
        let kind = if d.get_bool("kerberos_password") {
            KERBEROS_PASSWORD
        } else {
            KERBEROS
        };
        JsonExternalAuthKerberos {
            authentication_name: d.get_string("authentication_name"),
            host: d.get_string("host"),
            ker_dom_controller: d.get_string("ker_dom_controller"),
            port: d.get_int("port"),
            description: d.get_string("description"),
            login_attribute: d.get_string("login_attribute"),
            use_primary_auth_domain: d.get_bool("use_primary_auth_domain"),
            kind: kind.to_string(),
            ..JsonExternalAuthKerberos::default()
        }
    }
}

#[async_trait]
impl Resource for ExternalAuthKerberosResource {
    fn name(&self) -> &'static str {
        "externalauth_kerberos"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("authentication_name", Attribute::string().required())
            .with_attribute("host", Attribute::string().required())
            .with_attribute("ker_dom_controller", Attribute::string().required())
            .with_attribute("port", Attribute::int().required().int_between(1, 65535))
            .with_attribute("kerberos_password", Attribute::bool().optional().force_new())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("login_attribute", Attribute::string().optional())
            .with_attribute("use_primary_auth_domain", Attribute::bool().optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let payload = Self::payload(d);
        EXTERNAL_AUTHS.create(client, d, &payload).await
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = EXTERNAL_AUTHS
            .fetch::<JsonExternalAuthKerberos>(client, d.id())
            .await?
        else {
            d.set_id("");
            return Ok(());
        };
        d.set("authentication_name", json.authentication_name)?;
        d.set("host", json.host)?;
        d.set("ker_dom_controller", json.ker_dom_controller)?;
        d.set("port", json.port)?;
        d.set("description", json.description)?;
        d.set("login_attribute", json.login_attribute)?;
        d.set("use_primary_auth_domain", json.use_primary_auth_domain)?;
        d.set("kerberos_password", json.kind == KERBEROS_PASSWORD)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.update(client, d, &Self::payload(d)).await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.delete(client, d).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        EXTERNAL_AUTHS.import(client, d, "<authentication_name>").await
    }
}
