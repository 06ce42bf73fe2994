use std::sync::Arc;

use chrono::Utc;

use crate::auth::accounts::AccountService;
use crate::config::{AppConfig, StorageProfile};
use crate::db::{init_db, Database, SqliteStore};
use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;
use crate::gateway::{AccountGateway, ListingGateway};
use crate::local::LocalStore;

/// Everything a request handler needs, shared across astra workers.
pub struct App {
    pub listings: Arc<dyn ListingGateway>,
    pub accounts: Arc<dyn AccountGateway>,
    pub vocabulary: BuildingVocabulary,
    pub config: AppConfig,
}

impl App {
    /// One store serves both listings and accounts.
    pub fn with_store<S>(store: S, vocabulary: BuildingVocabulary, config: AppConfig) -> Self
    where
        S: ListingGateway + AccountGateway + 'static,
    {
        let store = Arc::new(store);
        Self {
            listings: store.clone(),
            accounts: store,
            vocabulary,
            config,
        }
    }

    /// Load the vocabulary, open the configured storage profile and create
    /// the bootstrap administrator when the account table is empty.
    pub fn from_config(config: AppConfig) -> Result<Self, ServerError> {
        let vocabulary = match &config.vocabulary_path {
            Some(path) => {
                let vocab = BuildingVocabulary::from_json_file(path)?;
                tracing::info!(path = %path.display(), buildings = vocab.building_names().count(), "vocabulary loaded");
                vocab
            }
            None => BuildingVocabulary::default(),
        };

        let app = match config.storage.clone() {
            StorageProfile::Sqlite(path) => {
                let db = Database::new(&path);
                init_db(&db)?;
                tracing::info!(profile = "sqlite", path = %path.display(), "storage ready");
                Self::with_store(SqliteStore::new(db, vocabulary.clone()), vocabulary, config)
            }
            StorageProfile::Local(path) => {
                let store = LocalStore::open(&path, vocabulary.clone())?;
                tracing::info!(profile = "local", path = %path.display(), "storage ready");
                Self::with_store(store, vocabulary, config)
            }
        };

        app.bootstrap_admin()?;
        Ok(app)
    }

    pub fn account_service(&self) -> AccountService<'_> {
        AccountService::new(&self.config.accounts, self.accounts.as_ref())
    }

    fn bootstrap_admin(&self) -> Result<(), ServerError> {
        let Some(admin) = &self.config.bootstrap_admin else {
            if self.accounts.count_accounts()? == 0 {
                tracing::warn!("no administrator accounts; set LISTING_DESK_ADMIN_USER and LISTING_DESK_ADMIN_PASSWORD");
            }
            return Ok(());
        };

        if let Some(account) = self
            .account_service()
            .bootstrap(&admin.username, &admin.password, Utc::now())?
        {
            tracing::info!(username = %account.username, "bootstrap administrator created");
        }
        Ok(())
    }
}
