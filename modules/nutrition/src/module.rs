use std::sync::Arc;

use axum::Router;
use dbkit::DbHandle;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::NutritionConfig;
use crate::contract::client::NutritionApi;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::service::{Repositories, Service, ServiceConfig};
use crate::gateways::local::NutritionLocalClient;
use crate::infra::storage::{
    migrations, SqlFoodCatalog, SqlGoalStore, SqlIntakeLog, SqlUserDirectory,
};

/// The nutrition module: SQL repositories wired to the domain service, plus
/// its REST router and in-process client.
#[derive(Clone)]
pub struct NutritionModule {
    db: Arc<DbHandle>,
    config: NutritionConfig,
    service: Arc<Service>,
}

impl NutritionModule {
    /// Wire the module against `db`, dating entries with the host clock.
    pub fn new(db: Arc<DbHandle>, config: NutritionConfig) -> Self {
        Self::with_clock(db, config, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Arc<DbHandle>, config: NutritionConfig, clock: Arc<dyn Clock>) -> Self {
        info!("Initializing nutrition module");
        debug!(
            "Loaded nutrition config: max_goal_value={}, max_quantity_grams={}",
            config.max_goal_value, config.max_quantity_grams
        );

        let repos = Repositories {
            users: Arc::new(SqlUserDirectory::new(db.clone())),
            goals: Arc::new(SqlGoalStore::new(db.clone())),
            foods: Arc::new(SqlFoodCatalog::new(db.clone())),
            intake: Arc::new(SqlIntakeLog::new(db.clone())),
        };
        let service_config = ServiceConfig {
            max_goal_value: config.max_goal_value,
            max_quantity_grams: config.max_quantity_grams,
        };
        let service = Arc::new(Service::new(repos, clock, service_config));

        Self {
            db,
            config,
            service,
        }
    }

    pub fn config(&self) -> &NutritionConfig {
        &self.config
    }

    /// Create missing tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running nutrition database migrations");
        migrations::apply(&self.db).await?;
        info!("Nutrition database migrations completed successfully");
        Ok(())
    }

    /// REST routes under `/api/v1`.
    pub fn router(&self) -> Router {
        routes::router(self.service.clone())
    }

    /// In-process client over the same service.
    pub fn client(&self) -> Arc<dyn NutritionApi> {
        Arc::new(NutritionLocalClient::new(self.service.clone()))
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }
}
