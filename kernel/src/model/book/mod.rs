use garde::Validate;
use shared::error::AppResult;

use super::value::{AuthorName, BookTitle, Genre, Isbn};

use self::event::CreateBook;

pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub isbn: Isbn,
    pub title: BookTitle,
    pub authors: Vec<AuthorName>,
    pub publication_year: i32,
    pub genre: Genre,
    // 未返却の貸出が存在しない間だけ true。loan/return 操作だけが書き換える
    pub is_available: bool,
}

impl Book {
    // 登録イベントから書籍を組み立てる。新規の書籍は必ず貸出可能な状態から始まる
    pub fn create(event: CreateBook) -> AppResult<Self> {
        event.validate()?;
        Ok(Self {
            isbn: event.isbn()?,
            title: event.title()?,
            authors: event.authors()?,
            publication_year: event.publication_year,
            genre: event.genre()?,
            is_available: true,
        })
    }

    pub fn author_line(&self) -> String {
        self.authors
            .iter()
            .map(AuthorName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
