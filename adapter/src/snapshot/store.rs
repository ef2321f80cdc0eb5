use std::{fs, path::PathBuf};

use derive_new::new;
use kernel::{catalog::Catalog, repository::catalog::CatalogRepository};
use shared::error::{AppError, AppResult};

use super::model::CatalogSnapshot;

// カタログ全体を 1 ファイルの JSON スナップショットとして読み書きする。
// 書き込みは一時ファイルに出してからリネームし、途中で落ちても既存の
// スナップショットが欠けないようにする
#[derive(new, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl CatalogRepository for SnapshotStore {
    fn load(&self) -> AppResult<Catalog> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no snapshot found, starting empty");
            return Ok(Catalog::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(AppError::IoError)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&raw)?;
        snapshot.try_into()
    }

    fn save(&self, catalog: &Catalog) -> AppResult<()> {
        let json = serde_json::to_string_pretty(&CatalogSnapshot::from(catalog))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(AppError::IoError)?;
        fs::rename(&tmp, &self.path).map_err(AppError::IoError)?;
        tracing::info!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}
