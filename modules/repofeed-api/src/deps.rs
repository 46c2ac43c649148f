use std::sync::Arc;

use repofeed_domains::{
    FeedRanker, Geocoder, MutationOrchestrator, PersistentStore, RepositoryDirectory,
    UserDirectory, WeatherService,
};
use repofeed_events::{CommentAdded, EventBus, NotificationDispatcher};

/// Central dependency container handed to every GraphQL resolver.
pub struct ServerDeps {
    pub store: Arc<dyn PersistentStore>,
    pub ranker: FeedRanker,
    pub orchestrator: MutationOrchestrator,
    pub dispatcher: NotificationDispatcher,
    pub repositories: Arc<dyn RepositoryDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherService>,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn PersistentStore>,
        repositories: Arc<dyn RepositoryDirectory>,
        users: Arc<dyn UserDirectory>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherService>,
        bus: EventBus<CommentAdded>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(bus);
        Self {
            ranker: FeedRanker::new(store.clone()),
            orchestrator: MutationOrchestrator::new(
                store.clone(),
                repositories.clone(),
                dispatcher.clone(),
            ),
            store,
            dispatcher,
            repositories,
            users,
            geocoder,
            weather,
        }
    }
}
