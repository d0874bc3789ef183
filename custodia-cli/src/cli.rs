//! # CLI Interface
//!
//! Defines the command-line argument structure for the `custodia` binary
//! using `clap` derive. All commands are offline key tooling — nothing
//! here talks to a ledger.

use clap::{Parser, Subcommand};

/// Custodia key and multisig tooling.
///
/// Offline utilities for custodial operators: generate accounts, recover
/// them from 25-word phrases, inspect key blobs, and derive multisig
/// group addresses.
#[derive(Parser, Debug)]
#[command(
    name = "custodia",
    about = "Custodia key and multisig tooling",
    version,
    propagate_version = true
)]
pub struct CustodiaCli {
    /// Log output format: "pretty" or "json".
    #[arg(long, env = "CUSTODIA_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Custodia binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh account and print its addresses.
    Generate(GenerateArgs),
    /// Recover an account from its 25-word recovery phrase.
    Recover(RecoverArgs),
    /// Inspect a hex-encoded key blob: derive its addresses without
    /// importing it anywhere.
    Inspect(InspectArgs),
    /// Derive the address of a multisig group definition.
    MsigAddress(MsigAddressArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Also print the recovery phrase.
    ///
    /// **The phrase IS the private key.** Only use this on a trusted,
    /// offline machine, and never in a shell whose history is persisted.
    #[arg(long)]
    pub with_phrase: bool,

    /// Also print the hex-encoded key blob. Same warnings apply.
    #[arg(long)]
    pub with_key: bool,
}

/// Arguments for the `recover` subcommand.
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// The 25 words of the recovery phrase, in order.
    ///
    /// Pass as separate arguments or as one quoted string; both work.
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// The 128-character hex key blob produced by `generate --with-key`.
    pub encoded: String,
}

/// Arguments for the `msig-address` subcommand.
#[derive(Parser, Debug)]
pub struct MsigAddressArgs {
    /// Number of member signatures required.
    #[arg(long, short = 't')]
    pub threshold: u8,

    /// Member signing addresses in order. Order changes the derived
    /// address, so agree on it before deriving.
    #[arg(required = true, num_args = 1..)]
    pub members: Vec<String>,
}
