use garde::Validate;

use super::super::value::{AuthorName, BookTitle, Genre, Isbn};

#[derive(Debug, Validate)]
pub struct CreateBook {
    #[garde(custom(valid_isbn))]
    pub isbn: String,
    #[garde(length(min = 1, max = 200))]
    pub title: String,
    #[garde(length(min = 1), inner(custom(valid_author)))]
    pub authors: Vec<String>,
    #[garde(skip)]
    pub publication_year: i32,
    #[garde(length(min = 1, max = 50))]
    pub genre: String,
}

// 検証規則は値型のコンストラクタに一本化し、garde からはそれを呼ぶだけにする
fn valid_isbn(value: &str, _context: &()) -> garde::Result {
    Isbn::new(value)
        .map(|_| ())
        .map_err(|e| garde::Error::new(e.to_string()))
}

fn valid_author(value: &str, _context: &()) -> garde::Result {
    AuthorName::new(value)
        .map(|_| ())
        .map_err(|e| garde::Error::new(e.to_string()))
}

impl CreateBook {
    // 検証済みイベントから値型を組み立てる。garde 検証を通った後に呼ぶ前提だが、
    // 値型側の検証も通るので信頼できない入力でも壊れない
    pub(crate) fn isbn(&self) -> shared::error::AppResult<Isbn> {
        Isbn::new(&self.isbn)
    }

    pub(crate) fn title(&self) -> shared::error::AppResult<BookTitle> {
        BookTitle::new(&self.title)
    }

    pub(crate) fn authors(&self) -> shared::error::AppResult<Vec<AuthorName>> {
        self.authors.iter().map(AuthorName::new).collect()
    }

    pub(crate) fn genre(&self) -> shared::error::AppResult<Genre> {
        Genre::new(&self.genre)
    }
}
