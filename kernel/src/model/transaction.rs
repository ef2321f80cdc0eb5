use chrono::{DateTime, Duration, Utc};

use super::{book::Book, id::UserId, user::TransactionUser, value::Isbn};

// 貸出期間。loan_book が dueDate を計算するのに使う
pub const LOAN_PERIOD_DAYS: i64 = 14;

pub fn loan_period() -> Duration {
    Duration::days(LOAN_PERIOD_DAYS)
}

// 追記専用の取引ログの 1 エントリ。書籍・ユーザーは発生時点のスナップショットを保持し、
// 後からカタログ側が編集・削除されても過去の取引は変わらない
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Loan(Loan),
    Return(Return),
    Reservation(Reservation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub book: Book,
    pub user: TransactionUser,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub book: Book,
    pub user: TransactionUser,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub book: Book,
    pub user: TransactionUser,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn isbn(&self) -> &Isbn {
        match self {
            Transaction::Loan(t) => &t.book.isbn,
            Transaction::Return(t) => &t.book.isbn,
            Transaction::Reservation(t) => &t.book.isbn,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Transaction::Loan(t) => t.user.id,
            Transaction::Return(t) => t.user.id,
            Transaction::Reservation(t) => t.user.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Transaction::Loan(t) => t.created_at,
            Transaction::Return(t) => t.created_at,
            Transaction::Reservation(t) => t.created_at,
        }
    }

    pub fn as_loan(&self) -> Option<&Loan> {
        match self {
            Transaction::Loan(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_return(&self) -> Option<&Return> {
        match self {
            Transaction::Return(t) => Some(t),
            _ => None,
        }
    }
}
