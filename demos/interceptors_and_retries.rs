//! Example demonstrating interceptors and retry strategies.
//!
//! This example shows how to:
//! - Register request interceptors that shape every outgoing request
//! - Register response interceptors that post-process every response
//! - Configure exponential backoff retries
//! - Remove interceptors by id
//!
//! Run with: `cargo run --example interceptors_and_retries`

use dialpath::{ApiResponse, Client, Error, RequestEnvelope, RetryStrategy};
use http::HeaderValue;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing to see retry attempts
    tracing_subscriber::fmt()
        .with_env_filter("dialpath=info,interceptors_and_retries=info")
        .init();

    println!("=== Request Interceptors ===");
    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .retry_strategy(RetryStrategy::exponential(Duration::from_millis(100), 3))
        .timeout(Duration::from_secs(5))
        .build()?;

    // Tag every outgoing request. Interceptors run in registration order.
    client.add_request_interceptor_with_id("client-tag", |mut envelope: RequestEnvelope| {
        envelope
            .headers
            .insert("x-client", HeaderValue::from_static("dialpath-demo"));
        envelope
    });

    // Log every response after retries have settled.
    let log_id = client.add_response_interceptor(|response: ApiResponse| {
        println!(
            "  [interceptor] {} in {:?} ({} attempt(s))",
            response.status, response.latency, response.attempts
        );
        response
    });

    let response = client.route("posts").id(1).invoke().await?;
    println!("Success: {}", response.success);
    println!();

    println!("=== Unsuccessful responses are returns, not errors ===");
    // A 404 still resolves Ok; only transport failures are Err.
    let missing = client.route("posts").id(999_999_999u64).invoke().await?;
    println!("Success: {}", missing.success);
    if let Some(error) = &missing.error {
        println!("Error code: {:?}", error.code);
        println!("Error message: {:?}", error.message);
    }
    println!();

    println!("=== Retries on transport failure ===");
    // An unroutable host fails at the transport layer and is retried.
    let flaky = Client::builder()
        .base_url("http://localhost:9")?
        .retry_strategy(RetryStrategy::ExponentialBackoff {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            max_retries: 2,
            jitter: true, // Adds randomness to prevent thundering herd
        })
        .timeout(Duration::from_secs(1))
        .build()?;

    let start = std::time::Instant::now();
    match flaky.route("posts").id(1).invoke().await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::RetriesExhausted {
            attempts,
            last_error,
        }) => {
            println!("Gave up after {} attempts: {}", attempts, last_error);
            println!("Total time: {:?}", start.elapsed());
        }
        Err(e) => println!("Failed without retrying: {}", e),
    }
    println!();

    println!("=== Removing interceptors ===");
    let removed = client.remove_response_interceptor(&log_id);
    println!("Removed response logger: {}", removed);
    let quiet = client.route("posts").id(2).invoke().await?;
    println!("No interceptor output this time, status: {}", quiet.status);

    Ok(())
}
