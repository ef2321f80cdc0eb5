use chrono::{DateTime, Utc};
use kernel::{
    catalog::Catalog,
    model::{
        book::Book,
        id::UserId,
        transaction::{Loan, Reservation, Return, Transaction},
        user::{TransactionUser, User, UserKind},
        value::{AuthorName, BookTitle, Genre, Isbn},
    },
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use uuid::Uuid;

// 保存用のレコード型。kernel の型とは分離し、読み込み時に値型のコンストラクタを
// 通して再検証してから kernel の型へ変換する

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub books: Vec<BookRecord>,
    pub users: Vec<UserRecord>,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookRecord {
    pub isbn: String,
    pub title: String,
    pub authors: Vec<String>,
    pub publication_year: i32,
    pub genre: String,
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
    pub kind: UserKindRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserKindRecord {
    Student { major: String },
    Faculty { department: String },
    Librarian { location_code: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionUserRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransactionRecord {
    Loan {
        book: BookRecord,
        user: TransactionUserRecord,
        created_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    },
    Return {
        book: BookRecord,
        user: TransactionUserRecord,
        created_at: DateTime<Utc>,
    },
    Reservation {
        book: BookRecord,
        user: TransactionUserRecord,
        created_at: DateTime<Utc>,
    },
}

fn conversion(e: AppError) -> AppError {
    AppError::ConversionEntityError(e.to_string())
}

impl TryFrom<BookRecord> for Book {
    type Error = AppError;

    fn try_from(record: BookRecord) -> AppResult<Self> {
        Ok(Book {
            isbn: Isbn::new(record.isbn).map_err(conversion)?,
            title: BookTitle::new(record.title).map_err(conversion)?,
            authors: record
                .authors
                .into_iter()
                .map(|a| AuthorName::new(a).map_err(conversion))
                .collect::<AppResult<Vec<_>>>()?,
            publication_year: record.publication_year,
            genre: Genre::new(record.genre).map_err(conversion)?,
            is_available: record.is_available,
        })
    }
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            isbn: book.isbn.as_str().to_string(),
            title: book.title.as_str().to_string(),
            authors: book.authors.iter().map(|a| a.as_str().to_string()).collect(),
            publication_year: book.publication_year,
            genre: book.genre.as_str().to_string(),
            is_available: book.is_available,
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: UserId::from(record.id),
            name: record.name,
            password_hash: record.password_hash,
            kind: record.kind.into(),
        }
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.raw(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            kind: (&user.kind).into(),
        }
    }
}

impl From<UserKindRecord> for UserKind {
    fn from(record: UserKindRecord) -> Self {
        match record {
            UserKindRecord::Student { major } => UserKind::Student { major },
            UserKindRecord::Faculty { department } => UserKind::Faculty { department },
            UserKindRecord::Librarian { location_code } => UserKind::Librarian { location_code },
        }
    }
}

impl From<&UserKind> for UserKindRecord {
    fn from(kind: &UserKind) -> Self {
        match kind {
            UserKind::Student { major } => UserKindRecord::Student {
                major: major.clone(),
            },
            UserKind::Faculty { department } => UserKindRecord::Faculty {
                department: department.clone(),
            },
            UserKind::Librarian { location_code } => UserKindRecord::Librarian {
                location_code: location_code.clone(),
            },
        }
    }
}

impl From<TransactionUserRecord> for TransactionUser {
    fn from(record: TransactionUserRecord) -> Self {
        Self {
            id: UserId::from(record.id),
            name: record.name,
        }
    }
}

impl From<&TransactionUser> for TransactionUserRecord {
    fn from(user: &TransactionUser) -> Self {
        Self {
            id: user.id.raw(),
            name: user.name.clone(),
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = AppError;

    fn try_from(record: TransactionRecord) -> AppResult<Self> {
        Ok(match record {
            TransactionRecord::Loan {
                book,
                user,
                created_at,
                due_date,
            } => Transaction::Loan(Loan {
                book: book.try_into()?,
                user: user.into(),
                created_at,
                due_date,
            }),
            TransactionRecord::Return {
                book,
                user,
                created_at,
            } => Transaction::Return(Return {
                book: book.try_into()?,
                user: user.into(),
                created_at,
            }),
            TransactionRecord::Reservation {
                book,
                user,
                created_at,
            } => Transaction::Reservation(Reservation {
                book: book.try_into()?,
                user: user.into(),
                created_at,
            }),
        })
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(transaction: &Transaction) -> Self {
        match transaction {
            Transaction::Loan(t) => TransactionRecord::Loan {
                book: (&t.book).into(),
                user: (&t.user).into(),
                created_at: t.created_at,
                due_date: t.due_date,
            },
            Transaction::Return(t) => TransactionRecord::Return {
                book: (&t.book).into(),
                user: (&t.user).into(),
                created_at: t.created_at,
            },
            Transaction::Reservation(t) => TransactionRecord::Reservation {
                book: (&t.book).into(),
                user: (&t.user).into(),
                created_at: t.created_at,
            },
        }
    }
}

impl TryFrom<CatalogSnapshot> for Catalog {
    type Error = AppError;

    fn try_from(snapshot: CatalogSnapshot) -> AppResult<Self> {
        let books = snapshot
            .books
            .into_iter()
            .map(Book::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let users = snapshot.users.into_iter().map(User::from).collect();
        let transactions = snapshot
            .transactions
            .into_iter()
            .map(Transaction::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        // 一意性と可用性の不変条件は集約側で検査される
        Catalog::from_parts(books, users, transactions)
    }
}

impl From<&Catalog> for CatalogSnapshot {
    fn from(catalog: &Catalog) -> Self {
        Self {
            books: catalog.books().iter().map(BookRecord::from).collect(),
            users: catalog.users().iter().map(UserRecord::from).collect(),
            transactions: catalog
                .transactions()
                .iter()
                .map(TransactionRecord::from)
                .collect(),
        }
    }
}
