use crate::application::search::VenueSearch;
use crate::availability::clock::SystemClock;
use crate::availability::evaluator::Evaluator;
use crate::availability::zone::TzDatabase;
use crate::config::Settings;
use crate::infrastructure::catalog::JsonCatalog;
use crate::Result;
use tracing::{info, instrument};

/// Search service backed by the JSON catalog and the real clock
pub type CatalogSearch = VenueSearch<JsonCatalog, SystemClock, TzDatabase>;

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    search: CatalogSearch,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        Self::with_settings(Settings::new()?).await
    }

    #[instrument(skip_all, fields(catalog = %settings.catalog.path.display()))]
    pub async fn with_settings(settings: Settings) -> Result<Self> {
        info!("Loading venue catalog from {}", settings.catalog.path.display());
        let catalog = JsonCatalog::from_path(&settings.catalog.path).await?;

        let evaluator = Evaluator::new(SystemClock, TzDatabase)
            .with_transition_horizon(settings.schedule.transition_horizon_days);
        let search = VenueSearch::from_settings(catalog, evaluator, &settings)?;

        info!("Application started successfully");
        Ok(Self { settings, search })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn search(&self) -> &CatalogSearch {
        &self.search
    }

    /// The loaded catalog
    pub fn catalog(&self) -> &JsonCatalog {
        self.search.repository()
    }
}
