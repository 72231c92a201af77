use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dnsquery::config::parse_server;
use dnsquery::{Resolver, ResolverConfig};

#[derive(Parser)]
#[command(name = "dnsquery")]
#[command(version)]
#[command(about = "Query the Internet domain name service")]
struct Cli {
    /// Seconds to wait for each response
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retries per name server after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// Name server address, optionally with a port (repeatable)
    #[arg(long = "server", value_name = "ADDR")]
    servers: Vec<String>,

    /// Search domain (repeatable)
    #[arg(long = "search", value_name = "DOMAIN")]
    search_domains: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[arg(value_enum)]
    command: Command,

    /// Host name, domain, or IP address to look up
    arg: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    Address,
    Name,
    Hinfo,
    Mx,
    Soa,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;
    debug!(?config, "resolver configuration");
    let resolver = Resolver::new(config);

    let lines = match cli.command {
        Command::Address => resolver.address(&cli.arg)?,
        Command::Name => resolver.name(&cli.arg)?,
        Command::Hinfo => {
            let hinfo = resolver.host_info(&cli.arg)?;
            vec![hinfo.cpu, hinfo.os]
        }
        Command::Mx => resolver.mail_exchangers(&cli.arg)?,
        Command::Soa => resolver.authority(&cli.arg)?,
    };
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<ResolverConfig> {
    let mut config = ResolverConfig::system();
    if let Some(secs) = cli.timeout {
        config.set_timeout(Duration::from_secs(secs))?;
    }
    if let Some(retries) = cli.retries {
        config.set_retries(retries);
    }
    if !cli.servers.is_empty() {
        let servers = cli
            .servers
            .iter()
            .map(|s| parse_server(s))
            .collect::<Result<Vec<_>, _>>()
            .context("invalid --server")?;
        config.set_servers(servers)?;
    }
    if !cli.search_domains.is_empty() {
        config.set_search_domains(cli.search_domains.clone())?;
    }
    Ok(config)
}
