//! # bastionctl
//!
//! Command-line driver for the provider. It reads a configuration document,
//! keeps a local JSON state file and walks every declared object through the
//! plan/apply lifecycle.
//!
//! ## Usage
//!
//! ```bash
//! # List resource and data source types, or show one schema
//! bastionctl schema
//! bastionctl schema user
//!
//! # Check the configuration without contacting the appliance
//! bastionctl validate -c bastion.yaml
//!
//! # Show then apply the changes
//! bastionctl plan -c bastion.yaml
//! bastionctl apply -c bastion.yaml
//!
//! # Adopt an existing object
//! bastionctl import user.alice alice
//!
//! # Evaluate a data source
//! bastionctl data version.current
//! ```

pub mod document;
pub mod state;

use crate::client::BastionClient;
use crate::config::ProviderConfig;
use crate::provider::{Action, Plan, Provider};
use crate::schema::Severity;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use document::{full_type_name, Address, Document};
use serde_json::{Map, Value};
use state::{ResourceState, State};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Wallix Bastion provider CLI
#[derive(Debug, Parser)]
#[command(name = "bastionctl")]
#[command(
    about = "Manage Wallix Bastion objects from a declarative configuration",
    long_about = None,
    after_help = "\
Addresses are <type>.<label>; the wallix-bastion_ prefix of the type is optional.

Examples:
  bastionctl schema usergroup
  bastionctl plan -c bastion.yaml
  bastionctl import device.srv1 srv1
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration document (YAML or JSON)
    #[arg(short, long, global = true, default_value = "bastion.yaml")]
    pub config: PathBuf,

    /// State file
    #[arg(long, global = true, default_value = crate::constants::DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Send API requests to this base URL instead of https://<ip>:<port>/api
    #[arg(long, global = true, hide = true)]
    pub base_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the supported types, or print the schema of one of them
    Schema {
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
    /// Validate the configuration document
    Validate,
    /// Show what apply would change
    Plan,
    /// Create, update, replace or destroy objects to match the configuration
    Apply,
    /// Read every object in state again
    Refresh,
    /// Destroy every object in state
    Destroy,
    /// Bring an existing object under management
    Import {
        /// `<type>.<label>` to record the object under
        #[arg(value_name = "NAME")]
        address: String,
        /// Import ID, see `bastionctl schema <type>`
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Evaluate a data source and print its attributes
    Data {
        /// `<type>.<label>` declared in the configuration, or a bare type
        #[arg(value_name = "NAME")]
        address: String,
    },
    /// Print build information, and the appliance version with --remote
    Version {
        #[arg(long)]
        remote: bool,
    },
}

/// Run one command to completion
pub async fn run(cli: Cli) -> Result<()> {
    let provider = Provider::new();
    match &cli.command {
        Commands::Schema { name } => schema(&provider, name.as_deref()),
        Commands::Validate => validate(&provider, &Document::load(&cli.config)?),
        Commands::Plan => {
            let doc = Document::load(&cli.config)?;
            let client = connect(&cli, &doc)?;
            let state = State::load(&cli.state)?;
            plan(&provider, &client, &doc, &state).await
        }
        Commands::Apply => {
            let doc = Document::load(&cli.config)?;
            let client = connect(&cli, &doc)?;
            apply(&provider, &client, &doc, &cli.state).await
        }
        Commands::Refresh => {
            let client = connect(&cli, &optional_document(&cli.config)?)?;
            refresh(&provider, &client, &cli.state).await
        }
        Commands::Destroy => {
            let client = connect(&cli, &optional_document(&cli.config)?)?;
            destroy(&provider, &client, &cli.state).await
        }
        Commands::Import { address, id } => {
            let client = connect(&cli, &optional_document(&cli.config)?)?;
            import(&provider, &client, &cli.state, address, id).await
        }
        Commands::Data { address } => {
            let doc = optional_document(&cli.config)?;
            let client = connect(&cli, &doc)?;
            data(&provider, &client, &doc, address).await
        }
        Commands::Version { remote } => version(&cli, *remote).await,
    }
}

/// Commands that only need the provider block tolerate a missing document
fn optional_document(path: &Path) -> Result<Document> {
    if path.exists() {
        Document::load(path)
    } else {
        debug!(path = %path.display(), "no configuration document, using the environment");
        Ok(Document::default())
    }
}

fn connect(cli: &Cli, doc: &Document) -> Result<BastionClient> {
    let mut config = ProviderConfig::from_block(doc.provider.clone());
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    BastionClient::new(&config).context("Failed to configure the Bastion client")
}

fn schema(provider: &Provider, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        println!("Resources:");
        for name in provider.resource_names() {
            let versions = provider.resource(name)?.versions().join(", ");
            println!("  {name} ({versions})");
        }
        println!("Data sources:");
        for name in provider.data_source_names() {
            let versions = provider.data_source(name)?.versions().join(", ");
            println!("  {name} ({versions})");
        }
        return Ok(());
    };
    let type_name = full_type_name(name);
    let schema = match provider.resource(&type_name) {
        Ok(resource) => resource.schema(),
        Err(_) => provider
            .data_source(&type_name)
            .with_context(|| format!("{name} is neither a resource nor a data source"))?
            .schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema.describe())?);
    Ok(())
}

fn validate(provider: &Provider, doc: &Document) -> Result<()> {
    let mut errors = 0;
    let checks = doc
        .resources
        .iter()
        .map(|(address, config)| (address, provider.validate_resource(&address.type_name, config)))
        .chain(
            doc.data
                .iter()
                .map(|(address, config)| (address, provider.validate_data_source(&address.type_name, config))),
        );
    for (address, diags) in checks {
        let diags = diags.with_context(|| format!("{address}"))?;
        for diag in diags.iter() {
            println!("{address}: {:?} {diag}", diag.severity);
        }
        errors += diags.iter().filter(|d| d.severity == Severity::Error).count();
    }
    if errors > 0 {
        bail!("configuration has {errors} error(s)");
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Prior state refreshed against the appliance; `None` when absent
async fn current(
    provider: &Provider,
    client: &BastionClient,
    state: &State,
    address: &Address,
) -> Result<Option<Map<String, Value>>> {
    let Some(prior) = state.get(&address.to_string()) else {
        return Ok(None);
    };
    provider
        .refresh(client, &address.type_name, &prior.attributes)
        .await
        .with_context(|| format!("Failed to refresh {address}"))
}

/// Addresses in state that the document no longer declares, last first
fn orphans(doc: &Document, state: &State) -> Vec<String> {
    let declared: Vec<String> = doc.resources.iter().map(|(a, _)| a.to_string()).collect();
    state
        .addresses()
        .into_iter()
        .rev()
        .filter(|address| !declared.contains(address))
        .collect()
}

#[derive(Debug, Default)]
struct Summary {
    created: usize,
    updated: usize,
    replaced: usize,
    destroyed: usize,
}

impl Summary {
    fn count(&mut self, action: Action) {
        match action {
            Action::Create => self.created += 1,
            Action::Update => self.updated += 1,
            Action::Replace => self.replaced += 1,
            Action::NoOp => {}
        }
    }
}

fn print_plan(address: &Address, plan: &Plan) {
    println!("{address}: {}", plan.action);
    for change in &plan.changes {
        println!("  {change}");
    }
}

async fn plan(provider: &Provider, client: &BastionClient, doc: &Document, state: &State) -> Result<()> {
    let mut summary = Summary::default();
    for (address, config) in &doc.resources {
        let prior = current(provider, client, state, address).await?;
        let plan = provider
            .plan(client, &address.type_name, config, prior.as_ref())
            .with_context(|| format!("Failed to plan {address}"))?;
        print_plan(address, &plan);
        summary.count(plan.action);
    }
    for address in orphans(doc, state) {
        println!("{address}: destroy");
        summary.destroyed += 1;
    }
    println!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        summary.created, summary.updated, summary.replaced, summary.destroyed
    );
    Ok(())
}

async fn apply(provider: &Provider, client: &BastionClient, doc: &Document, state_path: &Path) -> Result<()> {
    let mut state = State::load(state_path)?;
    let mut summary = Summary::default();

    for (address, config) in &doc.data {
        let attributes = provider
            .read_data_source(client, &address.type_name, config)
            .await
            .with_context(|| format!("Failed to read data source {address}"))?;
        state.data.insert(address.to_string(), attributes);
    }

    for (address, config) in &doc.resources {
        let prior = current(provider, client, &state, address).await?;
        let plan = provider
            .plan(client, &address.type_name, config, prior.as_ref())
            .with_context(|| format!("Failed to plan {address}"))?;
        print_plan(address, &plan);
        if plan.action == Action::NoOp {
            if let Some(prior) = prior {
                state.put(resource_state(address, prior));
            }
            continue;
        }
        let attributes = provider
            .apply(client, &address.type_name, config, prior.as_ref())
            .await
            .with_context(|| format!("Failed to apply {address}"))?;
        state.put(resource_state(address, attributes));
        state.save(state_path)?;
        summary.count(plan.action);
    }

    for address in orphans(doc, &state) {
        destroy_one(provider, client, &mut state, &address).await?;
        state.save(state_path)?;
        summary.destroyed += 1;
    }

    state.save(state_path)?;
    info!(
        created = summary.created,
        updated = summary.updated,
        replaced = summary.replaced,
        destroyed = summary.destroyed,
        "apply complete"
    );
    println!(
        "Apply complete: {} added, {} changed, {} replaced, {} destroyed.",
        summary.created, summary.updated, summary.replaced, summary.destroyed
    );
    Ok(())
}

fn resource_state(address: &Address, attributes: Map<String, Value>) -> ResourceState {
    ResourceState {
        address: address.to_string(),
        type_name: address.type_name.clone(),
        attributes,
    }
}

async fn destroy_one(provider: &Provider, client: &BastionClient, state: &mut State, address: &str) -> Result<()> {
    let Some(resource) = state.get(address) else {
        return Ok(());
    };
    provider
        .destroy(client, &resource.type_name, &resource.attributes)
        .await
        .with_context(|| format!("Failed to destroy {address}"))?;
    println!("{address}: destroyed");
    state.remove(address);
    Ok(())
}

async fn refresh(provider: &Provider, client: &BastionClient, state_path: &Path) -> Result<()> {
    let mut state = State::load(state_path)?;
    for resource in state.resources.clone() {
        match provider
            .refresh(client, &resource.type_name, &resource.attributes)
            .await
            .with_context(|| format!("Failed to refresh {}", resource.address))?
        {
            Some(attributes) => {
                println!("{}: refreshed", resource.address);
                state.put(ResourceState { attributes, ..resource });
            }
            None => {
                println!("{}: gone, removed from state", resource.address);
                state.remove(&resource.address);
            }
        }
    }
    state.save(state_path)
}

async fn destroy(provider: &Provider, client: &BastionClient, state_path: &Path) -> Result<()> {
    let mut state = State::load(state_path)?;
    for address in state.addresses().into_iter().rev() {
        destroy_one(provider, client, &mut state, &address).await?;
        state.save(state_path)?;
    }
    state.data.clear();
    state.save(state_path)?;
    println!("Destroy complete.");
    Ok(())
}

async fn import(provider: &Provider, client: &BastionClient, state_path: &Path, address: &str, id: &str) -> Result<()> {
    let address = Address::parse(address)?;
    let mut state = State::load(state_path)?;
    if state.get(&address.to_string()).is_some() {
        bail!("{address} is already managed");
    }
    let attributes = provider
        .import(client, &address.type_name, id)
        .await
        .with_context(|| format!("Failed to import {address} from {id}"))?;
    state.put(resource_state(&address, attributes));
    state.save(state_path)?;
    println!("{address}: imported");
    Ok(())
}

async fn data(provider: &Provider, client: &BastionClient, doc: &Document, address: &str) -> Result<()> {
    let (type_name, config) = if address.contains('.') {
        let address = Address::parse(address)?;
        let config = doc
            .data_source(&address)
            .cloned()
            .with_context(|| format!("{address} is not declared under data"))?;
        (address.type_name, config)
    } else {
        (full_type_name(address), Map::new())
    };
    let attributes = provider.read_data_source(client, &type_name, &config).await?;
    println!("{}", serde_json::to_string_pretty(&attributes)?);
    Ok(())
}

async fn version(cli: &Cli, remote: bool) -> Result<()> {
    println!(
        "bastionctl {} (git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );
    if remote {
        let client = connect(cli, &optional_document(&cli.config)?)?;
        let info = client.version().await.context("Failed to query the appliance version")?;
        println!("appliance {} (API {})", info.wab_complete_version, info.version);
    }
    Ok(())
}
