//! Print the GraphQL SDL to stdout. Uses in-memory collaborators; nothing is queried.

use std::sync::Arc;

use github_client::GitHubClient;
use repofeed_api::graphql::build_schema;
use repofeed_api::ServerDeps;
use repofeed_domains::{MemoryStore, OpenMeteo};
use repofeed_events::EventBus;

fn main() {
    let github = Arc::new(GitHubClient::new(None));
    let open_meteo = Arc::new(OpenMeteo::new(
        repofeed_common::config::DEFAULT_GEOCODING_URL,
        repofeed_common::config::DEFAULT_WEATHER_URL,
    ));
    let deps = ServerDeps::new(
        Arc::new(MemoryStore::new()),
        github.clone(),
        github,
        open_meteo.clone(),
        open_meteo,
        EventBus::new(),
    );
    print!("{}", build_schema(deps).sdl());
}
