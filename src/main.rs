use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;

use crate::config::config::Config;
use crate::request::ConnectionRequest;

mod config;
mod directory;
mod query;
mod request;


#[derive(Parser)]
#[command(author, version, about = "Runs one LDAP subtree search and prints the raw result")]
struct Args {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory client, e.g. com.sun.jndi.ldap.LdapCtxFactory or test
    #[arg(long)]
    factory: Option<String>,
    /// e.g. ldaps://ldap.example.org:636
    #[arg(short, long)]
    url: Option<String>,
    /// none, simple or EXTERNAL
    #[arg(short, long)]
    auth: Option<String>,
    /// Bind DN
    #[arg(short, long)]
    principal: Option<String>,
    #[arg(long)]
    credentials: Option<String>,
    #[arg(short, long)]
    base_dn: Option<String>,
    #[arg(short, long)]
    filter: Option<String>,
    /// Attribute names separated by '|'
    #[arg(long)]
    attributes: Option<String>,
    #[arg(long, value_parser = humantime::parse_duration)]
    conn_timeout: Option<Duration>,
}

impl Args {
    fn apply(self, request: &mut ConnectionRequest) {
        if let Some(v) = self.factory {
            request.initial_context_factory = v;
        }
        if let Some(v) = self.url {
            request.provider_url = v;
        }
        if let Some(v) = self.auth {
            request.security_authentication = v;
        }
        if let Some(v) = self.principal {
            request.security_principal = v;
        }
        if let Some(v) = self.credentials {
            request.security_credentials = v.into();
        }
        if let Some(v) = self.base_dn {
            request.base_dn = v;
        }
        if let Some(v) = self.filter {
            request.search_filter = v;
        }
        if let Some(v) = self.attributes {
            request.returned_attributes = v;
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    // the exception block always carries the origination trace
    if env::var_os("RUST_BACKTRACE").is_none() && env::var_os("RUST_LIB_BACKTRACE").is_none() {
        env::set_var("RUST_LIB_BACKTRACE", "1");
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let mut config = match &args.config {
        Some(path) => Config::from_file(path.clone()).expect("Failed to parse config"),
        None => Config::default(),
    };
    if args.conn_timeout.is_some() {
        config.conn_timeout = args.conn_timeout;
    }
    args.apply(&mut config.ldap);

    let outcome = query::query(&config.ldap, config.conn_timeout);
    print!("{}", outcome);

    if outcome.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
