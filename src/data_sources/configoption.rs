//! `wallix-bastion_configoption`: one configuration section of the appliance.
//!
//! Option values have no fixed shape, so each is exposed as its JSON text.

use crate::client::BastionClient;
use crate::error::Result;
use crate::provider::DataSource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct JsonConfigOptions {
    id: String,
    config_name: String,
    name: String,
    date: String,
    options: Vec<Value>,
}

/// `/configoptions/<config_id>`, restricted to `options` when any are given
fn uri(config_id: &str, options: &[String]) -> String {
    if options.is_empty() {
        format!("/configoptions/{config_id}")
    } else {
        format!("/configoptions/{config_id}?options={}", options.join(","))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOptionDataSource;

#[async_trait]
impl DataSource for ConfigOptionDataSource {
    fn name(&self) -> &'static str {
        "configoption"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("config_id", Attribute::string().required().not_empty())
            .with_attribute("options_list", Attribute::string_set().optional())
            .with_attribute("config_name", Attribute::string().computed())
            .with_attribute("name", Attribute::string().computed())
            .with_attribute("date", Attribute::string().computed())
            .with_attribute("options", Attribute::string_list().computed())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let uri = uri(&d.get_string("config_id"), &d.get_string_list("options_list"));
        let json: JsonConfigOptions = client.get_required(&uri).await?;
        let options: Vec<String> = json.options.iter().map(Value::to_string).collect();
        d.set("config_name", json.config_name)?;
        d.set("name", json.name)?;
        d.set("date", json.date)?;
        d.set("options", options)?;
        d.set_id(json.id);
        Ok(())
    }
}
