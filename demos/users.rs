use std::sync::Arc;

use graphloader::config::Config;
use graphloader::gateway::{Gateway, GraphQlRequest};
use graphloader::memory_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Serves a few queries over an in-memory store. Run with `RUST_LOG=graphloader=trace` to watch
// each loader batch its keys.
const QUERIES: &[&str] = &[
    "{ users { name posts { title } profile { memberType { id postsLimitPerMonth } } } }",
    "{ users { name subscribedToUser { name } userSubscribedTo { name } } }",
    "{ users { userSubscribedTo { userSubscribedTo { userSubscribedTo { userSubscribedTo { userSubscribedTo { posts { id } } } } } } } }",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graphloader=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = MemoryStore::from_json(include_str!("fixture.json"))?;
    let gateway = Gateway::new(Arc::new(store), &config);

    for query in QUERIES {
        let response = gateway.execute(GraphQlRequest::new(*query)).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}
