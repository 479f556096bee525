//! gatehouse: administer a cluster authority stored in a local data directory

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use gatehouse_engine::StorageEngine;
use std::path::PathBuf;
use tracing::info;

mod commands;

fn cli() -> Command {
    Command::new("gatehouse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cluster certificate authority and identity broker")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("PATH")
                .help("Data directory path")
                .default_value("./data")
                .global(true),
        )
        .arg(
            Arg::new("domain")
                .long("domain")
                .value_name("NAME")
                .help("Trust domain of this authority")
                .default_value("cluster.local")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the local CAs and sign key if missing"))
        .subcommand(
            Command::new("token")
                .about("Manage join tokens")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Issue a join token")
                        .arg(Arg::new("node").long("node").value_name("NAME").required(true))
                        .arg(Arg::new("role").long("role").value_name("ROLE").default_value("Node"))
                        .arg(
                            Arg::new("ttl")
                                .long("ttl")
                                .value_name("SECS")
                                .help("Token lifetime in seconds, 0 for no expiry")
                                .value_parser(clap::value_parser!(u64))
                                .default_value("900"),
                        ),
                )
                .subcommand(Command::new("ls").about("List outstanding tokens"))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a join token")
                        .arg(Arg::new("token").value_name("TOKEN").required(true)),
                ),
        )
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Create a user or reset its password")
                        .arg(Arg::new("name").value_name("NAME").required(true))
                        .arg(Arg::new("password").long("password").value_name("PASSWORD").required(true))
                        .arg(
                            Arg::new("login")
                                .long("login")
                                .value_name("LOGIN")
                                .action(ArgAction::Append),
                        ),
                ),
        )
        .subcommand(
            Command::new("sign-in")
                .about("Open a web session")
                .arg(Arg::new("name").value_name("NAME").required(true))
                .arg(Arg::new("password").long("password").value_name("PASSWORD").required(true)),
        )
        .subcommand(
            Command::new("join")
                .about("Redeem a join token and write the node key and certificate")
                .arg(Arg::new("token").long("token").value_name("TOKEN").required(true))
                .arg(Arg::new("node").long("node").value_name("NAME").required(true))
                .arg(Arg::new("role").long("role").value_name("ROLE").default_value("Node"))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .help("Directory to write <node>.key and <node>.cert into")
                        .default_value("."),
                ),
        )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();

    let data_dir: PathBuf = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"));
    let domain = matches
        .get_one::<String>("domain")
        .map(String::as_str)
        .unwrap_or("cluster.local");

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        info!("Created data directory: {}", data_dir.display());
    }

    let engine = StorageEngine::new(&data_dir)
        .with_context(|| format!("failed to open storage at {}", data_dir.display()))?;
    info!("Storage engine initialized");

    let output = commands::run(&engine, domain, &matches)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
