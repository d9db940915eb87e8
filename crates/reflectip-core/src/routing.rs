use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::adapters;
use crate::config::ResolverConfig;
use crate::error::{FetchError, ValidationError};
use crate::http_client::{HttpClient, HttpError, HttpRequest, ReqwestHttpClient, StaticHttpClient};
use crate::provider::ReflectionProvider;
use crate::retry::RetryConfig;
use crate::source::ProviderId;

/// Provider selection strategy for a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Registered providers in registration order, one at a time.
    Auto,
    /// The given providers in the given order, one at a time.
    Priority(Vec<ProviderId>),
    /// A single provider with no fallback.
    Strict(ProviderId),
    /// All registered providers at once; the first address wins.
    Race,
}

/// Why a single provider attempt did not produce an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The service answered, but the body held no usable address.
    Absent,
    Transport(HttpError),
    NotRegistered,
}

impl AttemptOutcome {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Absent => "provider.absent",
            Self::Transport(_) => "provider.transport",
            Self::NotRegistered => "provider.not_registered",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Absent => String::from("response contained no valid address"),
            Self::Transport(error) => error.message().to_owned(),
            Self::NotRegistered => String::from("provider is not registered"),
        }
    }
}

/// A provider attempt that did not yield an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub provider: ProviderId,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
}

/// Successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub address: IpAddr,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    /// Attempts that failed before the address was found.
    pub failures: Vec<FailedAttempt>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Every candidate failed or answered without an address.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub source_chain: Vec<ProviderId>,
    pub failures: Vec<FailedAttempt>,
    pub latency_ms: u64,
}

impl ResolveFailure {
    /// True when every attempt ended in a transport fault.
    pub fn all_faulted(&self) -> bool {
        !self.failures.is_empty()
            && self
                .failures
                .iter()
                .all(|failure| matches!(failure.outcome, AttemptOutcome::Transport(_)))
    }
}

impl Display for ResolveFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no address could be determined after {} attempt(s)",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(
                f,
                "; {}: {} ({})",
                failure.provider,
                failure.outcome.message(),
                failure.outcome.code()
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    NotResolved(ResolveFailure),
    #[error("address resolution was cancelled")]
    Cancelled {
        source_chain: Vec<ProviderId>,
        latency_ms: u64,
    },
}

pub type ResolveResult = Result<Resolution, ResolveError>;

/// Provider registry and resolution engine.
pub struct AddressResolver {
    providers: Vec<ReflectionProvider>,
    http_client: Arc<dyn HttpClient>,
    timeout: Duration,
    retry: RetryConfig,
}

/// Builder wiring providers, transport and policy from a [`ResolverConfig`].
///
/// ```rust,ignore
/// use reflectip_core::{AddressResolverBuilder, ResolverConfig};
///
/// let resolver = AddressResolverBuilder::from_config(ResolverConfig::from_env()?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct AddressResolverBuilder {
    config: ResolverConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    use_mock: bool,
    custom_providers: Vec<ReflectionProvider>,
}

impl AddressResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ResolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Answer every built-in provider from its sample body, offline.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Replace the built-in registration order.
    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.config.providers = providers;
        self
    }

    /// Register a provider ahead of the built-ins. A built-in id shadows
    /// the built-in provider; a [`ProviderId::custom`] id adds a service.
    pub fn with_provider(mut self, provider: ReflectionProvider) -> Self {
        self.custom_providers.push(provider);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(self) -> Result<AddressResolver, ValidationError> {
        if self.config.timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                key: "timeout_ms",
                value: String::from("0"),
                reason: "timeout must be positive",
            });
        }

        let mut providers = self.custom_providers;
        for id in &self.config.providers {
            providers.push(adapters::builtin(id)?);
        }

        let http_client: Arc<dyn HttpClient> = match self.http_client {
            Some(http_client) => http_client,
            None if self.use_mock => Arc::new(mock_http_client()?),
            None => Arc::new(ReqwestHttpClient::with_user_agent(&self.config.user_agent)?),
        };

        Ok(AddressResolver::new(providers, http_client)?
            .with_timeout(Duration::from_millis(self.config.timeout_ms))
            .with_retry(self.config.retry))
    }
}

fn mock_http_client() -> Result<StaticHttpClient, ValidationError> {
    let mut client = StaticHttpClient::new();
    for provider in adapters::builtin_all()? {
        if let Some(body) = adapters::sample_body(provider.id()) {
            client = client.with_response(provider.endpoint().as_str(), 200, body);
        }
    }
    Ok(client)
}

impl AddressResolver {
    /// Registers `providers` in order. A repeated id keeps its first entry.
    pub fn new(
        providers: Vec<ReflectionProvider>,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        let providers = providers
            .into_iter()
            .filter(|provider| seen.insert(provider.id().clone()))
            .collect::<Vec<_>>();

        if providers.is_empty() {
            return Err(ValidationError::NoProviders);
        }

        Ok(Self {
            providers,
            http_client,
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            retry: RetryConfig::no_retry(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn providers(&self) -> &[ReflectionProvider] {
        &self.providers
    }

    pub fn provider(&self, id: &ProviderId) -> Option<&ReflectionProvider> {
        self.providers.iter().find(|provider| provider.id() == id)
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Providers `strategy` would try, in order.
    pub fn source_chain_for_strategy(&self, strategy: &ResolveStrategy) -> Vec<ProviderId> {
        match strategy {
            ResolveStrategy::Auto | ResolveStrategy::Race => {
                self.providers
                    .iter()
                    .map(|provider| provider.id().clone())
                    .collect()
            }
            ResolveStrategy::Priority(priority) => dedupe_chain(priority),
            ResolveStrategy::Strict(provider) => vec![provider.clone()],
        }
    }

    /// Resolves the public address.
    ///
    /// Transport faults and absent answers move on to the next candidate.
    /// Cancellation stops the resolution at once.
    pub async fn resolve(
        &self,
        strategy: &ResolveStrategy,
        cancel: &CancellationToken,
    ) -> ResolveResult {
        let started = Instant::now();
        let chain = self.source_chain_for_strategy(strategy);

        let result = match strategy {
            ResolveStrategy::Race => self.resolve_race(chain, cancel, started).await,
            _ => self.resolve_sequential(chain, cancel, started).await,
        };

        match &result {
            Ok(resolution) => tracing::info!(
                provider = %resolution.selected_source,
                address = %resolution.address,
                latency_ms = resolution.latency_ms,
                "public address resolved"
            ),
            Err(ResolveError::NotResolved(failure)) => tracing::warn!(
                attempts = failure.failures.len(),
                all_faulted = failure.all_faulted(),
                "no reflection service produced an address"
            ),
            Err(ResolveError::Cancelled { .. }) => tracing::debug!("resolution cancelled"),
        }

        result
    }

    async fn resolve_sequential(
        &self,
        chain: Vec<ProviderId>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> ResolveResult {
        let mut source_chain = Vec::with_capacity(chain.len());
        let mut failures = Vec::new();

        for id in chain {
            source_chain.push(id.clone());
            let Some(provider) = self.provider(&id) else {
                failures.push(FailedAttempt {
                    provider: id,
                    outcome: AttemptOutcome::NotRegistered,
                    latency_ms: 0,
                });
                continue;
            };

            let attempt_started = Instant::now();
            let result = self.query(provider, cancel).await;
            let latency_ms = elapsed_ms(attempt_started);

            match classify(&id, result, latency_ms) {
                Ok(address) => {
                    return Ok(succeed(address, id, source_chain, failures, started));
                }
                Err(Some(failure)) => failures.push(failure),
                Err(None) => {
                    return Err(ResolveError::Cancelled {
                        source_chain,
                        latency_ms: elapsed_ms(started),
                    });
                }
            }
        }

        Err(ResolveError::NotResolved(ResolveFailure {
            source_chain,
            failures,
            latency_ms: elapsed_ms(started),
        }))
    }

    async fn resolve_race(
        &self,
        chain: Vec<ProviderId>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> ResolveResult {
        let mut failures = Vec::new();
        let mut in_flight = FuturesUnordered::new();

        for id in &chain {
            match self.provider(id) {
                Some(provider) => in_flight.push(async move {
                    let attempt_started = Instant::now();
                    let result = self.query(provider, cancel).await;
                    (provider.id(), result, elapsed_ms(attempt_started))
                }),
                None => failures.push(FailedAttempt {
                    provider: id.clone(),
                    outcome: AttemptOutcome::NotRegistered,
                    latency_ms: 0,
                }),
            }
        }

        // Unfinished queries are dropped with `in_flight` once a winner is found.
        while let Some((id, result, latency_ms)) = in_flight.next().await {
            match classify(id, result, latency_ms) {
                Ok(address) => {
                    return Ok(succeed(address, id.clone(), chain, failures, started));
                }
                Err(Some(failure)) => failures.push(failure),
                Err(None) => {
                    return Err(ResolveError::Cancelled {
                        source_chain: chain,
                        latency_ms: elapsed_ms(started),
                    });
                }
            }
        }

        Err(ResolveError::NotResolved(ResolveFailure {
            source_chain: chain,
            failures,
            latency_ms: elapsed_ms(started),
        }))
    }

    /// One provider, with retries on transport faults.
    async fn query(
        &self,
        provider: &ReflectionProvider,
        cancel: &CancellationToken,
    ) -> Result<Option<IpAddr>, FetchError> {
        let mut attempt = 0;

        loop {
            match self.query_once(provider, cancel).await {
                Err(FetchError::Transport(error)) if self.retry.should_retry(&error, attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::debug!(
                        provider = %provider.id(),
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying reflection service"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn query_once(
        &self,
        provider: &ReflectionProvider,
        cancel: &CancellationToken,
    ) -> Result<Option<IpAddr>, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.fetch_and_parse(provider, cancel)) => {
                match result {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Transport(HttpError::timeout(format!(
                        "{} did not answer within {} ms",
                        provider.id(),
                        self.timeout.as_millis()
                    )))),
                }
            }
        }
    }

    async fn fetch_and_parse(
        &self,
        provider: &ReflectionProvider,
        cancel: &CancellationToken,
    ) -> Result<Option<IpAddr>, FetchError> {
        tracing::debug!(
            provider = %provider.id(),
            endpoint = %provider.endpoint(),
            "querying reflection service"
        );

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let request = HttpRequest::get(provider.endpoint().as_str()).with_timeout_ms(timeout_ms);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(HttpError::status(response.status).into());
        }

        provider.parse(response.into_body(), cancel).await
    }
}

/// `Ok` carries an address, `Err(Some)` a failed attempt, `Err(None)` cancellation.
fn classify(
    provider: &ProviderId,
    result: Result<Option<IpAddr>, FetchError>,
    latency_ms: u64,
) -> Result<IpAddr, Option<FailedAttempt>> {
    let outcome = match result {
        Ok(Some(address)) => return Ok(address),
        Ok(None) => AttemptOutcome::Absent,
        Err(FetchError::Transport(error)) => AttemptOutcome::Transport(error),
        Err(FetchError::Cancelled) => return Err(None),
    };

    match &outcome {
        AttemptOutcome::Transport(error) => {
            tracing::warn!(provider = %provider, error = %error, "reflection service failed");
        }
        _ => tracing::debug!(provider = %provider, code = outcome.code(), "no address from provider"),
    }

    Err(Some(FailedAttempt {
        provider: provider.clone(),
        outcome,
        latency_ms,
    }))
}

fn succeed(
    address: IpAddr,
    selected_source: ProviderId,
    source_chain: Vec<ProviderId>,
    failures: Vec<FailedAttempt>,
    started: Instant,
) -> Resolution {
    let mut warnings = Vec::new();
    if !failures.is_empty() {
        warnings.push(format!(
            "fallback succeeded with '{}' after {} failed attempt(s)",
            selected_source,
            failures.len()
        ));
    }

    Resolution {
        address,
        selected_source,
        source_chain,
        failures,
        warnings,
        latency_ms: elapsed_ms(started),
    }
}

fn dedupe_chain(chain: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    chain
        .iter()
        .filter(|provider| seen.insert(*provider))
        .cloned()
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
