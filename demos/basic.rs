use resilient_http::{RequestSpec, RetryConfig, RetryingClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_http=debug".into()),
        )
        .init();

    let url = std::env::var("TARGET_URL")?;

    // RETRY_* variables override the defaults; opt into a few retries otherwise.
    let mut config = RetryConfig::from_env()?;
    if config.max_attempts == 0 {
        config = config
            .with_max_attempts(3)
            .with_max_delay_ms(2_000)
            .with_retryable_status_codes([429]);
    }
    let client = RetryingClient::new(config)?;

    match client.send(&RequestSpec::get(url)).await {
        Ok(response) => println!("{}: {}", response.status, response.body),
        Err(err) => match err.status() {
            Some(status) => eprintln!("upstream answered {status}: {err}"),
            None => eprintln!("upstream unreachable: {err}"),
        },
    }

    Ok(())
}
