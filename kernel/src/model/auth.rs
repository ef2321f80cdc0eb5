use bcrypt::{hash, verify, DEFAULT_COST};
use shared::error::AppResult;

use super::{
    id::UserId,
    role::{Capability, Role},
    user::User,
};

// ログイン成功時に生成される一時的なセッション。永続化しない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    permissions: &'static [Capability],
}

impl Session {
    pub fn for_user(user: &User) -> Self {
        let role = user.role();
        Self {
            user_id: user.id,
            user_name: user.name.clone(),
            role,
            permissions: role.permissions(),
        }
    }

    // ゲート対象の操作を呼ぶ前に必ず確認する。副作用なし
    pub fn has_permission(&self, capability: Capability) -> bool {
        self.permissions.contains(&capability)
    }

    pub fn permissions(&self) -> &[Capability] {
        self.permissions
    }
}

pub fn hash_password(raw: &str) -> AppResult<String> {
    Ok(hash(raw, DEFAULT_COST)?)
}

pub fn verify_password(raw: &str, password_hash: &str) -> AppResult<bool> {
    Ok(verify(raw, password_hash)?)
}
