use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;
use github_client::User;

use repofeed_domains::UserDirectory;

// --- UserByLoginLoader ---

/// Batches GitHub profile lookups for `postedBy` across a whole feed page.
pub struct UserByLoginLoader {
    pub users: Arc<dyn UserDirectory>,
}

impl Loader<String> for UserByLoginLoader {
    type Value = User;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        self.users.users(keys).await.map_err(Arc::new)
    }
}
