//! Basic example demonstrating dynamic route resolution.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Chain controller and action handles into endpoint paths
//! - Let the action name pick the HTTP verb
//! - Work with parameterized routes
//!
//! Run with: `cargo run --example basic_routing`

use dialpath::{Client, Error};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("dialpath=debug,basic_routing=info")
        .init();

    // Create a client for the JSONPlaceholder API
    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .build()?;

    println!("=== Parameterized GET ===");
    // posts.id(1) with no payload issues GET /posts/1
    let response = client.route("posts").id(1).invoke().await?;
    let post: Post = response.data_as()?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Request latency: {:?}", response.latency);
    println!("Status code: {}", response.status);
    println!();

    println!("=== Inferred POST ===");
    // "create" is a write keyword, so this POSTs to /posts/create
    let posts = client.route("posts");
    let created = posts
        .action("create")
        .expect("create is not a reserved name")
        .send_json(json!({
            "title": "My New Post",
            "body": "This is the content of my new post!",
            "userId": 1
        }))
        .await?;
    println!("Success: {}", created.success);
    println!("Data: {:?}", created.data);
    println!();

    println!("=== Explicit method override ===");
    // The reserved "method" key forces the verb and is stripped from the body
    let deleted = client
        .route("posts")
        .id(1)
        .send_json(json!({"method": "DELETE"}))
        .await?;
    println!("Deleted, status: {}", deleted.status);
    println!();

    println!("=== Route handles are cached ===");
    let stats = client.cache_stats();
    println!(
        "Cached: {} controllers, {} action namespaces, {} parameterized",
        stats.routes, stats.actions, stats.parameterized
    );

    Ok(())
}
