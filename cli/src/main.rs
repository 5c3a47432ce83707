use buildtime_cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    buildtime_cli::init_tracing(cli.verbose);
    cli.run().await
}
