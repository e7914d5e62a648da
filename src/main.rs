use anyhow::Context;
use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use options::Options;
use pipeline::Pipeline;

use crate::dns_client::DnsClient;
use crate::endpoints::EndpointFetcher;

mod address_set;
mod config_file;
mod dns_client;
mod endpoints;
mod error;
mod extra_routes;
mod options;
mod pipeline;
mod routes;

fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    let settings = options.into_settings()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level.as_tracing())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let pipeline = Pipeline::new(EndpointFetcher::new()?, DnsClient::new(settings.upstream));

    tracing::subscriber::with_default(subscriber, || runtime.block_on(pipeline.run(&settings)))?;

    Ok(())
}
