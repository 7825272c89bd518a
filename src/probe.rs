// Object-store credential probe
// One listing call, one classified outcome, no retries. The classification
// is pure; only `run_probe` touches the SDK.

/// Result of one probe invocation. Exactly one variant per run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Listing succeeded; bucket names in service order.
    Success(Vec<String>),
    /// No resolvable credentials at all.
    NoCredentials,
    /// Credentials present but incomplete (e.g. key without secret).
    PartialCredentials,
    /// Any other failure raised by the listing call.
    Other(String),
}

impl ProbeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Success(_) => "success",
            ProbeOutcome::NoCredentials => "no-credentials",
            ProbeOutcome::PartialCredentials => "partial-credentials",
            ProbeOutcome::Other(_) => "other",
        }
    }
}

/// Failure taxonomy the store adapter maps SDK errors into, in precedence
/// order: missing beats incomplete beats everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingError {
    MissingCredentials,
    IncompleteCredentials,
    Service(String),
}

/// Classify the outcome of one listing call.
pub fn classify_listing(result: Result<Vec<String>, ListingError>) -> ProbeOutcome {
    match result {
        Ok(names) => ProbeOutcome::Success(names),
        Err(ListingError::MissingCredentials) => ProbeOutcome::NoCredentials,
        Err(ListingError::IncompleteCredentials) => ProbeOutcome::PartialCredentials,
        Err(ListingError::Service(message)) => ProbeOutcome::Other(message),
    }
}

/// Write the outcome to stdout, one fixed message shape per category.
pub fn report(outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Success(buckets) => {
            println!("✅ Connected to the object store!");
            println!("Your buckets:");
            for name in buckets {
                println!(" - {}", name);
            }
        }
        ProbeOutcome::NoCredentials => println!("❌ No credentials were found."),
        ProbeOutcome::PartialCredentials => println!("❌ Credentials are incomplete."),
        ProbeOutcome::Other(message) => println!("❌ Another error occurred: {}", message),
    }
}

// ============================================================================
// STORE BINDING (probe feature)
// ============================================================================

/// Run the probe against the real object store: resolve credentials from
/// the default provider chain, then issue a single ListBuckets call with
/// retries disabled.
#[cfg(feature = "probe")]
pub async fn run_probe() -> ProbeOutcome {
    classify_listing(list_buckets_once().await)
}

#[cfg(feature = "probe")]
async fn list_buckets_once() -> Result<Vec<String>, ListingError> {
    use aws_config::retry::RetryConfig;
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::config::ProvideCredentials;
    use aws_sdk_s3::error::DisplayErrorContext;

    let config = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled())
        .load()
        .await;

    // Resolve credentials up front so missing/incomplete keys classify
    // ahead of any service error.
    match config.credentials_provider() {
        None => return Err(unresolved_credentials()),
        Some(provider) => {
            if provider.provide_credentials().await.is_err() {
                return Err(unresolved_credentials());
            }
        }
    }

    let client = aws_sdk_s3::Client::new(&config);
    match client.list_buckets().send().await {
        Ok(response) => Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect()),
        Err(err) => Err(ListingError::Service(
            DisplayErrorContext(&err).to_string(),
        )),
    }
}

/// The provider chain reports resolution failure without saying why; a
/// lone static key in the environment means the credentials are partial
/// rather than absent.
#[cfg(feature = "probe")]
fn unresolved_credentials() -> ListingError {
    let access = non_empty_env("AWS_ACCESS_KEY_ID");
    let secret = non_empty_env("AWS_SECRET_ACCESS_KEY");

    if access != secret {
        ListingError::IncompleteCredentials
    } else {
        ListingError::MissingCredentials
    }
}

#[cfg(feature = "probe")]
fn non_empty_env(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}
