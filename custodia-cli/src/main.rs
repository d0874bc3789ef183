// Copyright (c) 2026 Custodia Contributors. MIT License.
// See LICENSE for details.

//! # Custodia CLI
//!
//! Entry point for the `custodia` binary. Parses CLI arguments,
//! initializes logging, and dispatches offline key-tooling commands.
//!
//! The binary supports five subcommands:
//!
//! - `generate`     — generate a fresh account
//! - `recover`      — recover an account from its 25-word phrase
//! - `inspect`      — derive addresses from a hex key blob
//! - `msig-address` — derive a multisig group address
//! - `version`      — print build version information

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;

use custodia::config::PROTOCOL_VERSION;
use custodia::{KeyPair, MultisigGroup, RecoveryPhrase, SigningAddress};

use cli::{Commands, CustodiaCli};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = CustodiaCli::parse();
    logging::init_logging(
        "custodia_cli=info,custodia=info",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Recover(args) => recover(args),
        Commands::Inspect(args) => inspect(args),
        Commands::MsigAddress(args) => msig_address(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Generates a fresh account and prints its public addresses, optionally
/// with the secret backup forms.
fn generate(args: cli::GenerateArgs) -> Result<()> {
    let keypair = KeyPair::generate();
    let addresses = keypair.public_addresses();

    println!("signing address:    {}", addresses.signing);
    println!("encryption address: {}", addresses.encryption);

    if args.with_phrase {
        println!("recovery phrase:    {}", keypair.to_recovery_phrase());
    }
    if args.with_key {
        println!("key blob:           {}", keypair.to_encoded_string());
    }
    if !args.with_phrase && !args.with_key {
        tracing::warn!(
            "no backup form printed; re-run with --with-phrase before the keypair is dropped"
        );
    }
    Ok(())
}

/// Recovers an account from its 25-word phrase and prints its addresses.
fn recover(args: cli::RecoverArgs) -> Result<()> {
    // Accept both quoted-string and word-per-argument invocations.
    let joined = args.words.join(" ");
    let phrase: RecoveryPhrase = joined
        .parse()
        .context("recovery phrase did not parse")?;
    let keypair = KeyPair::from_recovery_phrase(&phrase)
        .context("recovery phrase failed checksum validation")?;
    let addresses = keypair.public_addresses();

    println!("signing address:    {}", addresses.signing);
    println!("encryption address: {}", addresses.encryption);
    Ok(())
}

/// Derives and prints the addresses for a hex-encoded key blob.
fn inspect(args: cli::InspectArgs) -> Result<()> {
    let keypair = KeyPair::from_encoded_string(&args.encoded)
        .context("key blob did not decode")?;
    let addresses = keypair.public_addresses();

    println!("signing address:    {}", addresses.signing);
    println!("encryption address: {}", addresses.encryption);
    Ok(())
}

/// Derives the address of a multisig group definition.
fn msig_address(args: cli::MsigAddressArgs) -> Result<()> {
    let mut members = Vec::with_capacity(args.members.len());
    for raw in &args.members {
        let member: SigningAddress = raw
            .parse()
            .with_context(|| format!("invalid member address: {raw}"))?;
        members.push(member);
    }
    let group = match MultisigGroup::new(args.threshold, members) {
        Ok(group) => group,
        Err(err) => bail!("invalid multisig definition: {err}"),
    };

    println!("group address: {}", group.address());
    println!(
        "definition:    {}-of-{} (version {})",
        group.threshold(),
        group.members().len(),
        group.version()
    );
    Ok(())
}

/// Prints version information.
fn print_version() {
    println!("custodia {} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION);
}
