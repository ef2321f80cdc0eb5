use std::fmt;

use shared::error::{AppError, AppResult};

// 検証済みの値型。生の文字列と混用できないようにそれぞれ別の型にしている。
// `new` が検証付きコンストラクタ、`new_unchecked` は検証済みの入力専用。

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_string();
        if value.len() < 10 {
            return Err(AppError::UnprocessableEntiry(format!(
                "ISBN must be at least 10 characters: {value:?}"
            )));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == 'X')
        {
            return Err(AppError::UnprocessableEntiry(format!(
                "ISBN may contain only digits, hyphens and X: {value:?}"
            )));
        }
        Ok(Self(value))
    }

    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // 13 桁の ISBN はハイフン区切りの表示形式に整形する。それ以外は保持している文字列のまま
    pub fn formatted(&self) -> String {
        let digits: String = self.0.chars().filter(|c| *c != '-').collect();
        if digits.len() == 13 {
            format!(
                "{}-{}-{}-{}-{}",
                &digits[0..3],
                &digits[3..4],
                &digits[4..7],
                &digits[7..12],
                &digits[12..13]
            )
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookTitle(String);

impl BookTitle {
    pub const MAX_LENGTH: usize = 200;

    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(AppError::UnprocessableEntiry(
                "book title must not be empty".into(),
            ));
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(AppError::UnprocessableEntiry(format!(
                "book title must be at most {} characters",
                Self::MAX_LENGTH
            )));
        }
        Ok(Self(value))
    }

    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthorName(String);

impl AuthorName {
    pub const MAX_LENGTH: usize = 100;

    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(AppError::UnprocessableEntiry(
                "author name must not be empty".into(),
            ));
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(AppError::UnprocessableEntiry(format!(
                "author name must be at most {} characters",
                Self::MAX_LENGTH
            )));
        }
        if !value
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '.')
        {
            return Err(AppError::UnprocessableEntiry(format!(
                "author name may contain only letters, spaces, hyphens and periods: {value:?}"
            )));
        }
        Ok(Self(value))
    }

    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Genre(String);

impl Genre {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(AppError::UnprocessableEntiry(
                "genre must not be empty".into(),
            ));
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(AppError::UnprocessableEntiry(format!(
                "genre must be at most {} characters",
                Self::MAX_LENGTH
            )));
        }
        Ok(Self(value))
    }

    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // 比較・集計用の正規化表現。保持している文字列自体は大文字小文字を保つ
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
