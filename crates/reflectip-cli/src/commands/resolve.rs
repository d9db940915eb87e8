use std::io;
use std::process::ExitCode;

use reflectip_core::{AddressResolver, ResolveError, ResolveStrategy};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, OutputFormat};
use crate::error::CliError;
use crate::output::{self, ResolveReport};

/// Exit status when every provider failed or answered without an address.
const NOT_RESOLVED_EXIT: u8 = 3;

pub async fn run(
    cli: &Cli,
    resolver: &AddressResolver,
    strategy: &ResolveStrategy,
    cancel: &CancellationToken,
) -> Result<ExitCode, CliError> {
    let report = match resolver.resolve(strategy, cancel).await {
        Ok(resolution) => ResolveReport::resolved(&resolution)?,
        Err(ResolveError::NotResolved(failure)) => ResolveReport::unresolved(&failure)?,
        Err(ResolveError::Cancelled { .. }) => return Err(CliError::Cancelled),
    };

    let mut stdout = io::stdout().lock();
    match cli.format {
        OutputFormat::Json => output::write_json(&mut stdout, &report, cli.pretty)?,
        OutputFormat::Text => output::write_text(&mut stdout, &mut io::stderr().lock(), &report)?,
    }

    if report.address.is_none() {
        return Ok(ExitCode::from(NOT_RESOLVED_EXIT));
    }

    Ok(ExitCode::SUCCESS)
}
