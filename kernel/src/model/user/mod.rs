use garde::Validate;
use shared::error::AppResult;

use super::{auth, id::UserId, role::Role};

use self::event::CreateUser;

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub password_hash: String,
    pub kind: UserKind,
}

// ユーザー種別。種別ごとの固有属性を持ち、権限セットはここから導出される
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKind {
    Student { major: String },
    Faculty { department: String },
    Librarian { location_code: String },
}

impl UserKind {
    pub fn role(&self) -> Role {
        match self {
            UserKind::Student { .. } => Role::Student,
            UserKind::Faculty { .. } => Role::Faculty,
            UserKind::Librarian { .. } => Role::Librarian,
        }
    }
}

impl User {
    // 登録イベントからユーザーを組み立てる。ID はここでランダムに採番し、以後変更しない
    pub fn create(event: CreateUser) -> AppResult<Self> {
        event.validate()?;
        Ok(Self {
            id: UserId::new(),
            name: event.name.trim().to_string(),
            password_hash: auth::hash_password(&event.password)?,
            kind: event.kind,
        })
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }
}

// 取引に記録するユーザー情報のスナップショット。
// 後からユーザーが削除されても取引履歴の表示内容は変わらない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUser {
    pub id: UserId,
    pub name: String,
}

impl From<&User> for TransactionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}
