use clap::Parser;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use moor_mud_common::Config;

/// CLI surface. Every flag is optional; anything left unset falls through
/// to the config file, then the environment, then the built-in defaults
/// (in ascending precedence, so CLI flags win).
#[derive(Parser, Debug)]
#[command(name = "moor-mud-server", about = "Moor MUD telnet server")]
pub struct Args {
    #[arg(long, value_name = "path", help = "Optional YAML config file")]
    pub config: Option<String>,

    #[arg(long, value_name = "address")]
    pub listen_address: Option<String>,

    #[arg(long, value_name = "port")]
    pub listen_port: Option<u16>,

    #[arg(long, help = "Enable debug logging")]
    pub debug: bool,
}

/// Layers defaults, an optional YAML file, `MOORMUD_*` environment
/// variables, and CLI flags into one [`Config`].
pub fn load(args: &Args) -> eyre::Result<Config> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    if let Some(path) = &args.config {
        figment = figment.merge(Yaml::file(path));
    }
    figment = figment.merge(Env::prefixed("MOORMUD_"));

    let mut config: Config = figment.extract()?;

    if let Some(addr) = &args.listen_address {
        config.listen_address = addr.clone();
    }
    if let Some(port) = args.listen_port {
        config.listen_port = port;
    }

    Ok(config)
}
