use std::sync::Arc;

use adapter::snapshot::SnapshotStore;
use kernel::repository::catalog::CatalogRepository;
use shared::config::AppConfig;

// DI コンテナ。具象リポジトリの組み立てをここに閉じ込め、
// 利用側はトレイト越しにだけ触る
#[derive(Clone)]
pub struct AppRegistry {
    catalog_repository: Arc<dyn CatalogRepository>,
}

impl AppRegistry {
    pub fn new(config: AppConfig) -> Self {
        let catalog_repository: Arc<dyn CatalogRepository> =
            Arc::new(SnapshotStore::new(config.storage.snapshot_path));
        Self { catalog_repository }
    }

    pub fn catalog_repository(&self) -> Arc<dyn CatalogRepository> {
        self.catalog_repository.clone()
    }
}
