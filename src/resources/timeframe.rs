//! `wallix-bastion_timeframe`: named sets of periods when access is allowed.
//!
//! Timeframes are addressed by `timeframe_name`, which is also the state ID.

use crate::client::BastionClient;
use crate::error::{BastionError, Result};
use crate::provider::Resource;
use crate::schema::{Attribute, ResourceData, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{already_exists, not_found_after_post};

const TIMEFRAMES: &str = "/timeframes/";

const DATE_PATTERN: &str = r"^([12]\d{3}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01]))$";
const TIME_PATTERN: &str = r"^(0[0-9]|1[0-9]|2[0-3]):[0-5][0-9]$";

const WEEK_DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct JsonTimeframePeriod {
    start_date: String,
    end_date: String,
    start_time: String,
    end_time: String,
    week_days: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct JsonTimeframe {
    is_overtimable: bool,
    timeframe_name: String,
    description: String,
    periods: Vec<JsonTimeframePeriod>,
}

fn uri(name: &str) -> String {
    format!("{TIMEFRAMES}{name}")
}

async fn exists(client: &BastionClient, name: &str) -> Result<bool> {
    Ok(client.get_json::<Value>(&uri(name)).await?.is_some())
}

fn periods_schema() -> Schema {
    Schema::new()
        .with_attribute("start_date", Attribute::string().required().matches(DATE_PATTERN))
        .with_attribute("end_date", Attribute::string().required().matches(DATE_PATTERN))
        .with_attribute("start_time", Attribute::string().required().matches(TIME_PATTERN))
        .with_attribute("end_time", Attribute::string().required().matches(TIME_PATTERN))
        .with_attribute("week_days", Attribute::string_set().optional().one_of(&WEEK_DAYS))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeframeResource;

impl TimeframeResource {
    fn payload(d: &ResourceData) -> Result<JsonTimeframe> {
        Ok(JsonTimeframe {
            is_overtimable: d.get_bool("is_overtimable"),
            timeframe_name: d.get_string("timeframe_name"),
            description: d.get_string("description"),
            periods: d.get_blocks("periods")?,
        })
    }
}

#[async_trait]
impl Resource for TimeframeResource {
    fn name(&self) -> &'static str {
        "timeframe"
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("timeframe_name", Attribute::string().required())
            .with_attribute("description", Attribute::string().optional())
            .with_attribute("is_overtimable", Attribute::bool().optional())
            .with_attribute("periods", Attribute::block_set(periods_schema()).optional())
    }

    async fn create(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let name = d.get_string("timeframe_name");
        if exists(client, &name).await? {
            return Err(already_exists("timeframe_name", name));
        }
        client.post(TIMEFRAMES, &Self::payload(d)?).await?;
        if !exists(client, &name).await? {
            return Err(not_found_after_post("timeframe_name", name));
        }
        d.set_id(name);
        Ok(())
    }

    async fn read(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let Some(json) = client.get_json::<JsonTimeframe>(&uri(d.id())).await? else {
            d.set_id("");
            return Ok(());
        };
        d.set("timeframe_name", json.timeframe_name)?;
        d.set("description", json.description)?;
        d.set("is_overtimable", json.is_overtimable)?;
        d.set("periods", json.periods)
    }

    async fn update(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        client
            .put(&format!("{}?force=true", uri(d.id())), &Self::payload(d)?)
            .await
    }

    async fn delete(&self, client: &BastionClient, d: &ResourceData) -> Result<()> {
        client.delete(&uri(d.id())).await
    }

    async fn import(&self, client: &BastionClient, d: &mut ResourceData) -> Result<()> {
        let name = d.id().to_string();
        if !exists(client, &name).await? {
            return Err(BastionError::ImportNotFound {
                field: "timeframe_name",
                id: name,
                expected: "<timeframe_name>",
            });
        }
        d.set("timeframe_name", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(period: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        json!({"timeframe_name": "office", "periods": [period]})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_period_formats() {
        let schema = TimeframeResource.schema();
        let valid = config(json!({"start_date": "2024-01-01", "end_date": "2024-12-31",
                                  "start_time": "08:00", "end_time": "18:30", "week_days": ["monday", "friday"]}));
        assert!(!schema.validate(&valid).has_errors());

        let bad_time = config(json!({"start_date": "2024-01-01", "end_date": "2024-12-31",
                                     "start_time": "8:00", "end_time": "24:00"}));
        assert_eq!(schema.validate(&bad_time).iter().count(), 2);

        let bad_day = config(json!({"start_date": "2024-01-01", "end_date": "2024-13-01",
                                    "start_time": "08:00", "end_time": "18:00", "week_days": ["funday"]}));
        assert_eq!(schema.validate(&bad_day).iter().count(), 2);
    }

    #[test]
    fn test_periods_default_to_empty_list() {
        let d = ResourceData::from_config(
            TimeframeResource.schema(),
            json!({"timeframe_name": "never"}).as_object().cloned().unwrap(),
        );
        let payload = serde_json::to_value(TimeframeResource::payload(&d).unwrap()).unwrap();
        assert_eq!(payload["periods"], json!([]));
        assert_eq!(payload["is_overtimable"], false);
    }
}
