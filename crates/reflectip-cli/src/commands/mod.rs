mod providers;
mod resolve;

use std::process::ExitCode;

use reflectip_core::{
    AddressResolver, AddressResolverBuilder, ResolveStrategy, ResolverConfig, RetryConfig,
};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command, SourceSelector};
use crate::error::CliError;

pub async fn run(cli: &Cli, cancel: &CancellationToken) -> Result<ExitCode, CliError> {
    let resolver = build_resolver(cli, ResolverConfig::from_env()?)?;
    let strategy = to_resolve_strategy(cli);

    match cli.command {
        Command::Resolve => resolve::run(cli, &resolver, &strategy, cancel).await,
        Command::Providers => providers::run(cli, &resolver, &strategy),
    }
}

/// Applies command-line overrides on top of the environment configuration.
fn build_resolver(cli: &Cli, mut config: ResolverConfig) -> Result<AddressResolver, CliError> {
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(retries) = cli.retries {
        config.retry = RetryConfig::exponential(retries);
    }

    let builder = AddressResolverBuilder::from_config(config);
    let builder = if cli.mock {
        builder.with_mock_mode()
    } else {
        builder
    };

    Ok(builder.build()?)
}

fn to_resolve_strategy(cli: &Cli) -> ResolveStrategy {
    if !cli.prefer.is_empty() {
        return ResolveStrategy::Priority(cli.prefer.clone());
    }

    match &cli.source {
        SourceSelector::Auto => ResolveStrategy::Auto,
        SourceSelector::Race => ResolveStrategy::Race,
        SourceSelector::Provider(id) => ResolveStrategy::Strict(id.clone()),
    }
}
