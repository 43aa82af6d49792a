use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;

use tracing::debug;

use cvflow_api::{ConnectionConfig, CvClient, HttpClient};
use cvflow_inputs::{actions, ports, InputsEnvelope};
use cvflow_types::{ActionId, DeviceId, StudioId, UpdateId, WorkspaceId};
use cvflow_workflow::{PushOutcome, PushRequest, UpdateSelector, Workflow, WorkflowConfig};

use crate::cli::*;

/// Studio that owns device topology during onboarding.
const TOPOLOGY_STUDIO: &str = "TOPOLOGY";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli { command, server, token, token_file, cert_file, verbose: _ } = cli;
    let conn = Connection { server, token, token_file, cert_file };
    match command {
        // Ports connects only when it needs the platform's hostname tags.
        Command::Ports(args) => cmd_ports(&conn, args).await,
        Command::Get(args) => cmd_get(conn.connect()?, args).await,
        Command::Set(args) => cmd_set(conn.connect()?, args).await,
        Command::Onboard(args) => cmd_onboard(conn.connect()?, args).await,
    }
}

struct Connection {
    server: String,
    token: Option<String>,
    token_file: Option<PathBuf>,
    cert_file: Option<PathBuf>,
}

impl Connection {
    fn has_credentials(&self) -> bool {
        self.token.is_some() || self.token_file.is_some()
    }

    /// Resolve credentials and open the client. Fails before any remote
    /// call when no token is available.
    fn connect(&self) -> anyhow::Result<HttpClient> {
        let token = match (&self.token, &self.token_file) {
            (Some(token), _) => token.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading token file {}", path.display()))?
                .trim()
                .to_string(),
            (None, None) => bail!("no credentials: pass --token or --token-file"),
        };
        let mut config = ConnectionConfig::new(self.server.as_str(), token);
        if let Some(path) = &self.cert_file {
            let pem = std::fs::read(path)
                .with_context(|| format!("reading CA certificate {}", path.display()))?;
            config.ca_cert = Some(pem);
        }
        debug!(server = %self.server, "connecting");
        Ok(HttpClient::connect(config)?)
    }
}

async fn cmd_get(client: HttpClient, args: GetArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}-inputs.yaml", args.studio_id)));
    let workflow = Workflow::new(client, WorkflowConfig::new(StudioId::new(args.studio_id)));
    let inputs = workflow.fetch_mainline_inputs().await?;
    if inputs.is_none() {
        println!("{} studio has no mainline inputs", "!".yellow().bold());
    }
    let envelope = InputsEnvelope::at_root(inputs);
    envelope.to_yaml_file(&output)?;
    println!(
        "{} Inputs written to {}",
        "✓".green().bold(),
        output.display().to_string().bold()
    );
    Ok(())
}

async fn cmd_set(client: HttpClient, args: SetArgs) -> anyhow::Result<()> {
    let mut config = WorkflowConfig::new(StudioId::new(args.studio_id.as_str()));
    if let Some(action_id) = &args.action_id {
        config = config.with_action(ActionId::new(action_id.as_str()));
    }
    let workflow = Workflow::new(client, config);

    let mut request = PushRequest::new(format!("cvflow set {}", args.studio_id));
    request.workspace = args.workspace.map(WorkspaceId::new);
    if let Some(path) = &args.yaml_file {
        request.envelope = Some(
            InputsEnvelope::from_yaml_file(path)
                .with_context(|| format!("reading inputs file {}", path.display()))?,
        );
    }
    if let Some(path) = &args.action_file {
        request.actions = actions::read_action_file(path)
            .with_context(|| format!("reading action file {}", path.display()))?;
        println!("{} autofill action(s) queued", request.actions.len());
    }
    request.devices = args.device.iter().map(|d| DeviceId::new(d.as_str())).collect();
    request.build_only = args.build_only;

    let outcome = workflow.push(request).await?;
    report_outcome(&outcome);
    Ok(())
}

async fn cmd_onboard(client: HttpClient, args: OnboardArgs) -> anyhow::Result<()> {
    let workflow = Workflow::new(client, WorkflowConfig::new(StudioId::new(TOPOLOGY_STUDIO)));
    let workspace_id = match args.workspace {
        Some(id) => WorkspaceId::new(id),
        None => workflow.create_workspace("cvflow onboard").await?,
    };
    let selector = match args.update_id {
        Some(id) => UpdateSelector::One(UpdateId::new(id)),
        None if args.all => UpdateSelector::All,
        None => bail!("pass --update-id or --all"),
    };
    let accepted = workflow.accept_topology_updates(&workspace_id, selector).await?;
    println!("{} {} topology update(s) accepted", "✓".green(), accepted);

    let mut request = PushRequest::new("cvflow onboard");
    request.workspace = Some(workspace_id);
    request.build_only = args.build_only;
    let outcome = workflow.push(request).await?;
    report_outcome(&outcome);
    Ok(())
}

async fn cmd_ports(conn: &Connection, args: PortsArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.tsv)
        .with_context(|| format!("reading port table {}", args.tsv.display()))?;
    let rows = ports::read_tsv_records(&text);
    let mut envelope = InputsEnvelope::from_yaml_file(&args.inputs)
        .with_context(|| format!("reading inputs file {}", args.inputs.display()))?;
    let devices = resolve_devices(conn, &args).await?;
    let Some(doc) = envelope.inputs.as_mut() else {
        bail!("inputs file {} carries no document", args.inputs.display());
    };
    let summary = ports::apply_ports(doc, &rows, devices.as_ref());
    envelope.to_yaml_file(&args.output)?;
    println!(
        "{} {} port(s) patched into {}",
        "✓".green().bold(),
        summary.updated.len(),
        args.output.display().to_string().bold()
    );
    for missed in &summary.missing {
        println!("  {} {}", "not found:".yellow(), missed);
    }
    Ok(())
}

/// Resolve the hostname-to-device list for the port table.
///
/// An explicit devices file wins. Otherwise, when credentials are
/// supplied, the list comes from the platform's `hostname` device tags
/// and is saved next to the inputs file for later offline runs. With
/// neither, the rows must carry their own device IDs.
async fn resolve_devices(
    conn: &Connection,
    args: &PortsArgs,
) -> anyhow::Result<Option<serde_json::Value>> {
    if let Some(path) = &args.devices_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading devices file {}", path.display()))?;
        return Ok(Some(serde_yaml::from_str(&text)?));
    }
    if !conn.has_credentials() {
        return Ok(None);
    }
    let client = conn.connect()?;
    let mut tags = client
        .get_device_tags(&WorkspaceId::mainline(), "hostname")
        .await?;
    tags.sort_by(|a, b| a.value.cmp(&b.value));
    let count = tags.len();
    let list = serde_json::Value::Array(
        tags.into_iter()
            .map(|t| serde_json::json!({"name": t.value, "deviceId": t.device_id}))
            .collect(),
    );
    let snapshot = args.inputs.with_file_name("studio_device_tags.yaml");
    let file = std::fs::File::create(&snapshot)
        .with_context(|| format!("writing device tags to {}", snapshot.display()))?;
    serde_yaml::to_writer(file, &list)?;
    println!(
        "{} {} device tag(s) saved to {}",
        "✓".green(),
        count,
        snapshot.display()
    );
    Ok(Some(list))
}

fn report_outcome(outcome: &PushOutcome) {
    println!(
        "{} Workspace {}",
        "✓".green().bold(),
        outcome.workspace_id.to_string().yellow()
    );
    println!("  Build {} succeeded", outcome.build_id.to_string().dimmed());
    if outcome.cc_ids.is_empty() {
        println!("  Workspace left pending (build only)");
    } else {
        for id in &outcome.cc_ids {
            println!("  Change control {} completed", id.to_string().cyan());
        }
    }
}
