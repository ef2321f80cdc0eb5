use shared::error::AppResult;

use crate::catalog::Catalog;

#[mockall::automock]
pub trait CatalogRepository: Send + Sync {
    // 保存済みのカタログを復元する。保存先がまだ無ければ空のカタログを返す
    fn load(&self) -> AppResult<Catalog>;
    // カタログ全体をスナップショットとして書き出す
    fn save(&self, catalog: &Catalog) -> AppResult<()>;
}
