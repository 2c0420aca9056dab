use std::fmt;
use std::sync::Arc;

use serenity::http::Http;
use sqlx::PgPool;

use crate::cache::ChatCache;
use crate::config::Settings;
use crate::events::EventBus;
use crate::platform::api::ChatApi;
use crate::platform::client_slot::ClientSlot;
use crate::platform::discord::DiscordApi;
use crate::services::delivery::engine::{DeliveryStore, PgDeliveryStore};
use crate::services::delivery::DeliveryEngine;
use crate::services::impersonation::detector::DetectorConfig;
use crate::services::impersonation::photo_hash::AverageHashSimilarity;
use crate::services::impersonation::ImpersonationDetector;
use crate::services::moderation::action::ActionExecutor;
use crate::services::moderation::critical::CriticalScanRegistry;
use crate::services::moderation::spam::{HeuristicSpamClassifier, SpamCoordinator};
use crate::services::moderation::DecisionCoordinator;
use crate::services::reputation::{
    HttpReputationClient, ReputationChecker, ReputationConfig,
};
use crate::services::scheduler::TokioScheduler;
use crate::services::trust::ChatTrustSource;

/// The wired decision and delivery machinery, built once at startup
pub struct Engines {
    pub api: Arc<dyn ChatApi>,
    /// Concrete adapter handle, needed where avatars are materialized
    pub discord: Arc<DiscordApi>,
    pub store: Arc<dyn DeliveryStore>,
    pub delivery: Arc<DeliveryEngine>,
    pub decision: DecisionCoordinator,
    pub actions: ActionExecutor,
    pub impersonation: ImpersonationDetector,
    pub reputation: ReputationChecker,
    pub reputation_config: ReputationConfig,
}

/// Shared data available to all commands and handlers
pub struct Data {
    pub pool: PgPool,
    pub settings: Settings,
    pub bus: EventBus,
    pub chat_cache: Arc<ChatCache>,
    pub client_slot: Arc<ClientSlot>,
    pub engines: Engines,
}

impl Data {
    pub fn new(pool: PgPool, settings: Settings, http: Arc<Http>) -> Arc<Self> {
        let client_slot = Arc::new(ClientSlot::new());
        client_slot.install(&settings.discord_token, http);

        let discord = Arc::new(DiscordApi::new(
            client_slot.clone(),
            settings.avatar_cache_dir.clone(),
        ));
        let api: Arc<dyn ChatApi> = discord.clone();

        let store: Arc<dyn DeliveryStore> = Arc::new(PgDeliveryStore::new(pool.clone()));
        let scheduler = Arc::new(TokioScheduler::new(api.clone(), store.clone()));
        let delivery = Arc::new(DeliveryEngine::new(
            api.clone(),
            scheduler,
            store.clone(),
        ));

        let trust = Arc::new(ChatTrustSource::new(pool.clone(), api.clone()));
        let decision = DecisionCoordinator::new(
            CriticalScanRegistry::standard(&settings),
            SpamCoordinator::new(
                trust.clone(),
                Arc::new(HeuristicSpamClassifier::new(settings.spam_score_threshold)),
            ),
        );

        let actions = ActionExecutor::new(
            api.clone(),
            delivery.clone(),
            pool.clone(),
            settings.fallback_auto_delete_seconds,
        );

        let impersonation = ImpersonationDetector::new(
            discord.clone(),
            Arc::new(AverageHashSimilarity),
            trust,
            api.clone(),
            pool.clone(),
            DetectorConfig::from_settings(&settings),
        );

        let reputation = ReputationChecker::new(Arc::new(HttpReputationClient::new()));
        let reputation_config = ReputationConfig::from_settings(&settings);

        Arc::new(Self {
            pool,
            settings,
            bus: EventBus::new(),
            chat_cache: Arc::new(ChatCache::new()),
            client_slot,
            engines: Engines {
                api,
                discord,
                store,
                delivery,
                decision,
                actions,
                impersonation,
                reputation,
                reputation_config,
            },
        })
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("chat_cache_len", &self.chat_cache.len())
            .finish_non_exhaustive()
    }
}

pub type Context<'a> = poise::Context<'a, Arc<Data>, crate::bot::error::Error>;
