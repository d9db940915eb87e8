use std::io::{self, Write};
use std::process::ExitCode;

use reflectip_core::{AddressResolver, ProviderId, ResolveStrategy};
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ProviderEntry {
    id: ProviderId,
    endpoint: String,
    /// Position in the chain the selected strategy would try, if any.
    chain_position: Option<usize>,
}

pub fn run(
    cli: &Cli,
    resolver: &AddressResolver,
    strategy: &ResolveStrategy,
) -> Result<ExitCode, CliError> {
    let entries = provider_entries(resolver, strategy);

    let mut stdout = io::stdout().lock();
    match cli.format {
        OutputFormat::Json => output::write_json(&mut stdout, &entries, cli.pretty)?,
        OutputFormat::Text => {
            for entry in &entries {
                let marker = entry
                    .chain_position
                    .map_or_else(|| String::from("-"), |position| (position + 1).to_string());
                writeln!(stdout, "{marker:>2}  {:<11} {}", entry.id, entry.endpoint)?;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn provider_entries(resolver: &AddressResolver, strategy: &ResolveStrategy) -> Vec<ProviderEntry> {
    let chain = resolver.source_chain_for_strategy(strategy);

    resolver
        .providers()
        .iter()
        .map(|provider| ProviderEntry {
            id: provider.id().clone(),
            endpoint: provider.endpoint().to_string(),
            chain_position: chain.iter().position(|id| id == provider.id()),
        })
        .collect()
}
