use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cvflow",
    about = "Studio inputs and workspace automation for CloudVision",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Platform endpoint, host[:port] or a full URL
    #[arg(long, global = true, default_value = "www.arista.io")]
    pub server: String,

    /// Service-account access token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// File containing the service-account access token
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// PEM root CA for self-signed deployments
    #[arg(long, global = true)]
    pub cert_file: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a studio's mainline inputs into a YAML file
    Get(GetArgs),
    /// Push studio inputs through build, submit, and change controls
    Set(SetArgs),
    /// Accept pending topology updates and push them
    Onboard(OnboardArgs),
    /// Patch a port TSV table into a local inputs file
    Ports(PortsArgs),
}

#[derive(Args)]
pub struct GetArgs {
    pub studio_id: String,
    /// Where to write the inputs envelope; default <studio-id>-inputs.yaml
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SetArgs {
    pub studio_id: String,
    /// Inputs envelope to write before building
    #[arg(short = 'f', long)]
    pub yaml_file: Option<PathBuf>,
    /// CSV of autofill actions, one device,interface,profileID per line
    #[arg(long, requires = "action_id")]
    pub action_file: Option<PathBuf>,
    /// Autofill action the rows are executed with
    #[arg(long)]
    pub action_id: Option<String>,
    /// Device to assign the studio to (repeatable); default is all devices
    #[arg(short, long)]
    pub device: Vec<String>,
    /// Reuse an existing workspace instead of creating one
    #[arg(long)]
    pub workspace: Option<String>,
    /// Stop after a successful build, leaving the workspace pending
    #[arg(long)]
    pub build_only: bool,
}

#[derive(Args)]
pub struct OnboardArgs {
    /// Accept a single pending update
    #[arg(long, conflicts_with = "all")]
    pub update_id: Option<String>,
    /// Accept every pending update
    #[arg(long)]
    pub all: bool,
    /// Reuse an existing workspace instead of creating one
    #[arg(long)]
    pub workspace: Option<String>,
    /// Stop after a successful build, leaving the workspace pending
    #[arg(long)]
    pub build_only: bool,
}

#[derive(Args)]
pub struct PortsArgs {
    /// Port table, one row per switch port
    pub tsv: PathBuf,
    /// Inputs envelope to patch
    #[arg(short, long)]
    pub inputs: PathBuf,
    /// Where to write the patched envelope
    #[arg(short, long, default_value = "updated-inputs.yaml")]
    pub output: PathBuf,
    /// YAML/JSON list of {name, deviceId} used to resolve switch
    /// hostnames, overriding the platform's hostname tag lookup
    #[arg(long)]
    pub devices_file: Option<PathBuf>,
}
