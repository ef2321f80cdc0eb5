use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub snapshot_path: PathBuf,
}

impl AppConfig {
    // 環境変数から設定を組み立てる。未設定の項目は既定値にフォールバックする
    pub fn new() -> Self {
        let snapshot_path = std::env::var("LIBRARY_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("library.json"));
        Self {
            storage: StorageConfig { snapshot_path },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
