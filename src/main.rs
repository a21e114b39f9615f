use clap::Parser;
use stratum_socks_proxy::Cli;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = stratum_socks_proxy::server::run(config).await {
        log::error!(target: "stratum_socks_proxy", "server exited: {e}");
        std::process::exit(1);
    }
}
