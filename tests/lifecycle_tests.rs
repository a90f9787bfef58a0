//! Lifecycle tests against the in-process Bastion mock
//!
//! These drive plan/apply/refresh/import/destroy end to end through real HTTP
//! requests and check both the resulting state and the objects left on the
//! mock appliance.

mod common;

use common::{client_for, MockBastion};
use serde_json::{json, Map, Value};
use wallix_bastion_provider::provider::Action;
use wallix_bastion_provider::Provider;

const CLUSTER: &str = "wallix-bastion_cluster";

fn config(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object expected")
}

#[tokio::test]
async fn test_cluster_create_update_destroy() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();

    let desired = config(json!({
        "cluster_name": "web",
        "description": "web farm",
        "accounts": ["admin@local@srv1"]
    }));
    let plan = provider.plan(&client, CLUSTER, &desired, None).unwrap();
    assert_eq!(plan.action, Action::Create);

    let state = provider.apply(&client, CLUSTER, &desired, None).await.unwrap();
    let stored = mock.objects("clusters").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(state["id"], stored[0]["id"]);
    assert_eq!(state["cluster_name"], "web");
    assert_eq!(state["accounts"], json!(["admin@local@srv1"]));

    // Nothing changed on either side
    let refreshed = provider.refresh(&client, CLUSTER, &state).await.unwrap().unwrap();
    let plan = provider.plan(&client, CLUSTER, &desired, Some(&refreshed)).unwrap();
    assert_eq!(plan.action, Action::NoOp, "unexpected changes: {:?}", plan.changes);

    let mut changed = desired.clone();
    changed.insert("description".to_string(), json!("front ends"));
    let plan = provider.plan(&client, CLUSTER, &changed, Some(&refreshed)).unwrap();
    assert_eq!(plan.action, Action::Update);
    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.changes[0].attribute, "description");

    let state = provider.apply(&client, CLUSTER, &changed, Some(&refreshed)).await.unwrap();
    assert_eq!(state["description"], "front ends");
    assert_eq!(mock.objects("clusters").await[0]["description"], "front ends");
    let id = state["id"].as_str().unwrap().to_string();
    assert!(mock
        .requests()
        .await
        .contains(&format!("PUT /api/v3.12/clusters/{id}?force=true")));

    provider.destroy(&client, CLUSTER, &state).await.unwrap();
    assert!(mock.objects("clusters").await.is_empty());
    assert!(provider.refresh(&client, CLUSTER, &state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_refuses_existing_name() {
    let (mock, url) = MockBastion::start().await;
    mock.insert("clusters", json!({"cluster_name": "web", "accounts": []})).await;
    let client = client_for(&url, "v3.12");

    let err = Provider::new()
        .apply(
            &client,
            CLUSTER,
            &config(json!({"cluster_name": "web", "interactive_logins": ["srv1:SSH"]})),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "cluster_name web already exists");
    assert_eq!(mock.objects("clusters").await.len(), 1);
}

#[tokio::test]
async fn test_import_by_name() {
    let (mock, url) = MockBastion::start().await;
    let id = mock
        .insert(
            "clusters",
            json!({"cluster_name": "db", "description": "databases", "accounts": ["dba@local@pg1"]}),
        )
        .await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();

    let state = provider.import(&client, CLUSTER, "db").await.unwrap();
    assert_eq!(state["id"], id.as_str());
    assert_eq!(state["description"], "databases");

    let err = provider.import(&client, CLUSTER, "missing").await.unwrap_err();
    assert!(err.to_string().contains("missing"), "{err}");
}

#[tokio::test]
async fn test_refresh_drops_objects_deleted_out_of_band() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();

    let state = provider
        .apply(
            &client,
            CLUSTER,
            &config(json!({"cluster_name": "tmp", "accounts": ["a@local@d"]})),
            None,
        )
        .await
        .unwrap();
    mock.forget("clusters", "tmp").await;
    assert!(provider.refresh(&client, CLUSTER, &state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_connection_message_is_never_deleted() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let kind = "wallix-bastion_connection_message";

    let state = provider
        .apply(
            &client,
            kind,
            &config(json!({"message_name": "motd_en", "message": "Authorized use only"})),
            None,
        )
        .await
        .unwrap();
    assert_eq!(state["id"], "motd_en");
    assert_eq!(state["message"], "Authorized use only");

    provider.destroy(&client, kind, &state).await.unwrap();
    assert!(!mock.requests().await.iter().any(|r| r.starts_with("DELETE")));
    assert_eq!(mock.objects("connectionmessages").await.len(), 1);
}

#[tokio::test]
async fn test_version_gate_blocks_before_any_request() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();

    let err = provider
        .plan(
            &client,
            "wallix-bastion_ldapmapping",
            &config(json!({"domain": "corp", "user_group": "ops", "ldap_group": "cn=ops"})),
            None,
        )
        .unwrap_err();
    assert!(err.to_string().contains("wallix-bastion_authdomain_mapping"), "{err}");
    assert!(mock.requests().await.is_empty());
}

#[tokio::test]
async fn test_version_data_source() {
    let (_mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");

    let state = Provider::new()
        .read_data_source(&client, "wallix-bastion_version", &Map::new())
        .await
        .unwrap();
    assert_eq!(state["id"], "version");
    assert_eq!(state["wab_complete_version"], "10.0.3.0");
    assert_eq!(state["version"], "3.12");
}

#[tokio::test]
async fn test_import_reads_null_members_as_empty() {
    let (mock, url) = MockBastion::start().await;
    mock.insert(
        "users",
        json!({
            "user_name": "alice",
            "email": "alice@example.com",
            "profile": "user",
            "user_auths": ["local_password"],
            "expiration_date": null,
            "groups": null,
            "ip_source": null,
            "is_disabled": null
        }),
    )
    .await;
    let client = client_for(&url, "v3.12");

    let state = Provider::new()
        .import(&client, "wallix-bastion_user", "alice")
        .await
        .unwrap();
    assert_eq!(state["id"], "alice");
    assert_eq!(state["email"], "alice@example.com");
    assert_eq!(state["expiration_date"], "");
    assert_eq!(state["ip_source"], "");
    assert_eq!(state["is_disabled"], false);
    assert_eq!(state["groups"], json!([]));
}

#[tokio::test]
async fn test_device_localdomain_account_chain() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let localdomain = "wallix-bastion_device_localdomain";
    let account = "wallix-bastion_device_localdomain_account";

    let err = provider
        .apply(&client, localdomain, &config(json!({"device_id": "nope", "domain_name": "local"})), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "device with ID nope doesn't exists");
    assert!(!mock.requests().await.iter().any(|r| r.starts_with("POST")));

    let device = provider
        .apply(
            &client,
            "wallix-bastion_device",
            &config(json!({"device_name": "srv1", "host": "10.0.0.1"})),
            None,
        )
        .await
        .unwrap();
    let device_id = device["id"].as_str().unwrap().to_string();

    let domain = provider
        .apply(
            &client,
            localdomain,
            &config(json!({"device_id": device_id, "domain_name": "local"})),
            None,
        )
        .await
        .unwrap();
    let domain_id = domain["id"].as_str().unwrap().to_string();
    assert_eq!(mock.objects(&format!("devices/{device_id}/localdomains")).await.len(), 1);

    let err = provider
        .apply(
            &client,
            account,
            &config(json!({"device_id": device_id, "domain_id": "gone",
                           "account_name": "root", "account_login": "root"})),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("domain_id with ID gone on device_id {device_id} doesn't exists")
    );

    let created = provider
        .apply(
            &client,
            account,
            &config(json!({"device_id": device_id, "domain_id": domain_id,
                           "account_name": "root", "account_login": "root"})),
            None,
        )
        .await
        .unwrap();
    assert!(mock.requests().await.contains(&format!(
        "POST /api/v3.12/devices/{device_id}/localdomains/{domain_id}/accounts/"
    )));

    let imported = provider
        .import(&client, account, &format!("{device_id}/{domain_id}/root"))
        .await
        .unwrap();
    assert_eq!(imported["id"], created["id"]);
    assert_eq!(imported["device_id"], device_id.as_str());
    assert_eq!(imported["domain_id"], domain_id.as_str());
    assert_eq!(imported["account_login"], "root");

    let imported = provider
        .import(&client, localdomain, &format!("{device_id}/local"))
        .await
        .unwrap();
    assert_eq!(imported["id"], domain_id.as_str());

    let err = provider
        .import(&client, account, &format!("{device_id}/root"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "id must be <device_id>/<domain_id>/<account_name>");

    let err = provider
        .import(&client, account, &format!("{device_id}/{domain_id}/admin"))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("don't find account_name with id"), "{err}");
}

#[tokio::test]
async fn test_query_search_needs_exactly_one_match() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let kind = "wallix-bastion_authorization";

    let desired = config(json!({
        "authorization_name": "ops-srv",
        "user_group": "ops",
        "target_group": "servers",
        "authorize_sessions": true,
        "subprotocols": ["SSH_SHELL_SESSION"]
    }));
    let state = provider.apply(&client, kind, &desired, None).await.unwrap();
    assert!(mock
        .requests()
        .await
        .contains(&"GET /api/v3.12/authorizations/?q=authorization_name=ops-srv".to_string()));
    assert_eq!(state["user_group"], "ops");

    let mut changed = desired.clone();
    changed.insert("description".to_string(), json!("ops on servers"));
    let state = provider.apply(&client, kind, &changed, Some(&state)).await.unwrap();
    let id = state["id"].as_str().unwrap().to_string();
    let body = mock
        .body_of(&format!("PUT /api/v3.12/authorizations/{id}?force=true"))
        .await
        .unwrap();
    assert_eq!(body["description"], "ops on servers");
    assert!(body.get("user_group").is_none());

    // A second object with the same name makes the lookup ambiguous
    mock.insert(
        "authorizations",
        json!({"authorization_name": "ops-srv", "user_group": "dev", "target_group": "servers"}),
    )
    .await;
    let err = provider.import(&client, kind, "ops-srv").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "don't find authorization_name with id ops-srv (id must be <authorization_name>)"
    );
    assert!(provider.refresh(&client, kind, &state).await.unwrap().is_some());
}

#[tokio::test]
async fn test_user_password_is_write_only() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let kind = "wallix-bastion_user";

    let desired = config(json!({
        "user_name": "bob",
        "email": "bob@example.com",
        "profile": "user",
        "user_auths": ["local_password"],
        "password": "s3cret"
    }));
    let state = provider.apply(&client, kind, &desired, None).await.unwrap();
    let body = mock.body_of("POST /api/v3.12/users/").await.unwrap();
    assert_eq!(body["password"], "s3cret");

    let refreshed = provider.refresh(&client, kind, &state).await.unwrap().unwrap();
    assert_eq!(refreshed["password"], "s3cret");
    let plan = provider.plan(&client, kind, &desired, Some(&refreshed)).unwrap();
    assert_eq!(plan.action, Action::NoOp, "unexpected changes: {:?}", plan.changes);

    let mut changed = desired.clone();
    changed.insert("email".to_string(), json!("robert@example.com"));
    let state = provider.apply(&client, kind, &changed, Some(&refreshed)).await.unwrap();
    let body = mock.body_of("PUT /api/v3.12/users/bob?force=true").await.unwrap();
    assert_eq!(body["email"], "robert@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("groups").is_none());

    let mut regrouped = changed.clone();
    regrouped.insert("groups".to_string(), json!(["ops"]));
    regrouped.insert("password".to_string(), json!("n3w"));
    provider.apply(&client, kind, &regrouped, Some(&state)).await.unwrap();
    let body = mock.body_of("PUT /api/v3.12/users/bob?force=true").await.unwrap();
    assert_eq!(body["groups"], json!(["ops"]));
    assert_eq!(body["password"], "n3w");
}

#[tokio::test]
async fn test_usergroup_users_sent_only_on_change() {
    let (mock, url) = MockBastion::start().await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let kind = "wallix-bastion_usergroup";

    let desired = config(json!({
        "group_name": "ops",
        "timeframes": ["allthetime"],
        "users": ["alice"]
    }));
    let state = provider.apply(&client, kind, &desired, None).await.unwrap();
    let body = mock.body_of("POST /api/v3.12/usergroups/").await.unwrap();
    assert_eq!(body["users"], json!(["alice"]));
    let id = state["id"].as_str().unwrap().to_string();
    let put = format!("PUT /api/v3.12/usergroups/{id}?force=true");

    let mut described = desired.clone();
    described.insert("description".to_string(), json!("operators"));
    let state = provider.apply(&client, kind, &described, Some(&state)).await.unwrap();
    let body = mock.body_of(&put).await.unwrap();
    assert_eq!(body["description"], "operators");
    assert!(body.get("users").is_none());

    let mut grown = described.clone();
    grown.insert("users".to_string(), json!(["alice", "bob"]));
    let state = provider.apply(&client, kind, &grown, Some(&state)).await.unwrap();
    let body = mock.body_of(&put).await.unwrap();
    assert_eq!(body["users"], json!(["alice", "bob"]));
    assert_eq!(state["users"], json!(["alice", "bob"]));
}

#[tokio::test]
async fn test_domain_data_source() {
    let (mock, url) = MockBastion::start().await;
    let id = mock
        .insert(
            "domains",
            json!({"domain_name": "corp", "domain_real_name": "corp.example.com",
                   "description": "global", "vault_plugin": null}),
        )
        .await;
    let client = client_for(&url, "v3.12");
    let provider = Provider::new();
    let kind = "wallix-bastion_domain";

    let state = provider
        .read_data_source(&client, kind, &config(json!({"domain_name": "corp"})))
        .await
        .unwrap();
    assert_eq!(state["id"], id.as_str());
    assert_eq!(state["domain_real_name"], "corp.example.com");
    assert_eq!(state["description"], "global");
    assert_eq!(state["vault_plugin"], "");
    assert_eq!(state["enable_password_change"], false);

    let err = provider
        .read_data_source(&client, kind, &config(json!({"domain_name": "lab"})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "domain_name lab doesn't exists");
}

#[tokio::test]
async fn test_authdomain_ad_data_source() {
    let (mock, url) = MockBastion::start().await;
    let id = mock
        .insert(
            "authdomains",
            json!({"domain_name": "corp", "type": "AD", "auth_domain_name": "corp.example.com",
                   "default_language": "en", "external_auths": ["ad1"], "secondary_auth": []}),
        )
        .await;
    let provider = Provider::new();
    let kind = "wallix-bastion_authdomain_ad";
    let lookup = config(json!({"domain_name": "corp"}));

    let client = client_for(&url, "v3.12");
    let state = provider.read_data_source(&client, kind, &lookup).await.unwrap();
    assert_eq!(state["id"], id.as_str());
    assert_eq!(state["auth_domain_name"], "corp.example.com");
    assert_eq!(state["external_auths"], json!(["ad1"]));
    assert!(mock
        .requests()
        .await
        .contains(&"GET /api/v3.12/authdomains/?q=domain_name=corp".to_string()));

    let before = mock.requests().await.len();
    let legacy = client_for(&url, "v3.6");
    let err = provider.read_data_source(&legacy, kind, &lookup).await.unwrap_err();
    assert!(err.to_string().contains("not available with api version v3.6"), "{err}");
    assert_eq!(mock.requests().await.len(), before);
}
