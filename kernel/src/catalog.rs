use chrono::{DateTime, Utc};
use shared::error::{AppError, AppResult};

use crate::model::{
    auth::{self, Session},
    book::Book,
    id::UserId,
    transaction::{loan_period, Loan, Reservation, Return, Transaction},
    user::{TransactionUser, User},
    value::Isbn,
};

// 蔵書・ユーザー・取引ログを束ねる集約。
// すべての更新操作は `&self` を受け取って新しい Catalog を返す。失敗時は元の値が
// そのまま残るので、操作は常に「全部適用されるか、何も起きないか」のどちらかになる
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    books: Vec<Book>,
    users: Vec<User>,
    transactions: Vec<Transaction>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // 永続化層から復元するときの入り口。一意性と可用性の不変条件をここで検査し、
    // 壊れたスナップショットは修復せずに拒否する
    pub fn from_parts(
        books: Vec<Book>,
        users: Vec<User>,
        transactions: Vec<Transaction>,
    ) -> AppResult<Self> {
        let catalog = Self {
            books,
            users,
            transactions,
        };
        for (i, book) in catalog.books.iter().enumerate() {
            if catalog.books[..i].iter().any(|b| b.isbn == book.isbn) {
                return Err(AppError::ConversionEntityError(format!(
                    "duplicate ISBN in snapshot: {}",
                    book.isbn
                )));
            }
            let outstanding = catalog.outstanding_loan_for(&book.isbn).is_some();
            if book.is_available == outstanding {
                return Err(AppError::ConversionEntityError(format!(
                    "availability flag contradicts the transaction log for {}",
                    book.isbn
                )));
            }
        }
        for (i, user) in catalog.users.iter().enumerate() {
            if catalog.users[..i].iter().any(|u| u.id == user.id) {
                return Err(AppError::ConversionEntityError(format!(
                    "duplicate user id in snapshot: {}",
                    user.id
                )));
            }
        }
        Ok(catalog)
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn book(&self, isbn: &Isbn) -> Option<&Book> {
        self.books.iter().find(|b| &b.isbn == isbn)
    }

    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    // ---- 更新操作 -----------------------------------------------------

    pub fn add_book(&self, book: Book) -> AppResult<Self> {
        if self.book(&book.isbn).is_some() {
            return Err(AppError::EntityAlreadyExists(format!(
                "a book with ISBN {} is already registered",
                book.isbn
            )));
        }
        let mut next = self.clone();
        next.books.push(book);
        Ok(next)
    }

    // ランダム採番なので衝突しないはずだが、ID の一意性はここでも必ず検査する
    pub fn add_user(&self, user: User) -> AppResult<Self> {
        if self.user(user.id).is_some() {
            return Err(AppError::EntityAlreadyExists(format!(
                "a user with id {} already exists",
                user.id
            )));
        }
        let mut next = self.clone();
        next.users.push(user);
        Ok(next)
    }

    pub fn remove_book(&self, isbn: &Isbn) -> AppResult<Self> {
        if self.book(isbn).is_none() {
            return Err(AppError::EntityNotFound(format!("no book with ISBN {isbn}")));
        }
        if self.outstanding_loan_for(isbn).is_some() {
            return Err(AppError::StateConflict(format!(
                "book {isbn} has an outstanding loan and cannot be removed"
            )));
        }
        let mut next = self.clone();
        next.books.retain(|b| &b.isbn != isbn);
        Ok(next)
    }

    pub fn remove_user(&self, user_id: UserId) -> AppResult<Self> {
        if self.user(user_id).is_none() {
            return Err(AppError::EntityNotFound(format!("no user with id {user_id}")));
        }
        if !self.active_loans_for(user_id).is_empty() {
            return Err(AppError::StateConflict(format!(
                "user {user_id} still has outstanding loans"
            )));
        }
        let mut next = self.clone();
        next.users.retain(|u| u.id != user_id);
        Ok(next)
    }

    pub fn loan_book(&self, isbn: &Isbn, user_id: UserId, now: DateTime<Utc>) -> AppResult<Self> {
        let book = self
            .book(isbn)
            .ok_or_else(|| AppError::EntityNotFound(format!("no book with ISBN {isbn}")))?;
        let user = self
            .user(user_id)
            .ok_or_else(|| AppError::EntityNotFound(format!("no user with id {user_id}")))?;
        if !book.is_available {
            return Err(AppError::StateConflict(format!(
                "book {isbn} is currently on loan"
            )));
        }

        let mut loaned = book.clone();
        loaned.is_available = false;
        let transaction = Transaction::Loan(Loan {
            book: loaned.clone(),
            user: TransactionUser::from(user),
            created_at: now,
            due_date: now + loan_period(),
        });

        let mut next = self.clone();
        next.replace_book(loaned);
        next.transactions.push(transaction);
        Ok(next)
    }

    pub fn return_book(&self, isbn: &Isbn, user_id: UserId, now: DateTime<Utc>) -> AppResult<Self> {
        let book = self
            .book(isbn)
            .ok_or_else(|| AppError::EntityNotFound(format!("no book with ISBN {isbn}")))?;
        match self.outstanding_loan_for(isbn) {
            Some(loan) if loan.user.id == user_id => {}
            _ => {
                return Err(AppError::StateConflict(format!(
                    "no outstanding loan of {isbn} by user {user_id}"
                )))
            }
        }

        let mut returned = book.clone();
        returned.is_available = true;
        let user = self
            .user(user_id)
            .ok_or_else(|| AppError::EntityNotFound(format!("no user with id {user_id}")))?;
        let transaction = Transaction::Return(Return {
            book: returned.clone(),
            user: TransactionUser::from(user),
            created_at: now,
        });

        let mut next = self.clone();
        next.replace_book(returned);
        next.transactions.push(transaction);
        Ok(next)
    }

    // 予約は助言的な記録で、貸出可否には影響しない。順序の履行も保証しない
    pub fn reserve_book(
        &self,
        isbn: &Isbn,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let book = self
            .book(isbn)
            .ok_or_else(|| AppError::EntityNotFound(format!("no book with ISBN {isbn}")))?;
        let user = self
            .user(user_id)
            .ok_or_else(|| AppError::EntityNotFound(format!("no user with id {user_id}")))?;
        let transaction = Transaction::Reservation(Reservation {
            book: book.clone(),
            user: TransactionUser::from(user),
            created_at: now,
        });
        let mut next = self.clone();
        next.transactions.push(transaction);
        Ok(next)
    }

    // ---- 認証 ---------------------------------------------------------

    // 表示名と資格情報の完全一致でユーザーを探す。この規模では線形走査で十分
    pub fn authenticate(&self, name: &str, password: &str) -> AppResult<Session> {
        for user in &self.users {
            if user.name == name && auth::verify_password(password, &user.password_hash)? {
                return Ok(Session::for_user(user));
            }
        }
        Err(AppError::UnauthenticatedError)
    }

    // ---- 読み取り専用ビュー -------------------------------------------

    pub fn available_books(&self) -> Vec<&Book> {
        self.books.iter().filter(|b| b.is_available).collect()
    }

    // 指定ユーザーの未返却の貸出。発生順（古い順）
    pub fn active_loans_for(&self, user_id: UserId) -> Vec<&Loan> {
        self.transactions
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_loan().map(|l| (i, l)))
            .filter(|(i, loan)| loan.user.id == user_id && !self.returned_after(*i, loan))
            .map(|(_, loan)| loan)
            .collect()
    }

    // その ISBN に対して現在未返却の貸出。高々ひとつしか存在しない
    pub fn outstanding_loan_for(&self, isbn: &Isbn) -> Option<&Loan> {
        let (index, loan) = self
            .transactions
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, t)| t.as_loan().filter(|l| &l.book.isbn == isbn).map(|l| (i, l)))?;
        (!self.returned_after(index, loan)).then_some(loan)
    }

    pub fn overdue_loans(&self, now: DateTime<Utc>) -> Vec<&Loan> {
        self.transactions
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_loan().map(|l| (i, l)))
            .filter(|(i, loan)| loan.due_date < now && !self.returned_after(*i, loan))
            .map(|(_, loan)| loan)
            .collect()
    }

    // タイトル・著者・ジャンルに対する大文字小文字を無視した部分一致。登録順で返す
    pub fn search(&self, query: &str) -> Vec<&Book> {
        let query = query.to_lowercase();
        self.books
            .iter()
            .filter(|b| {
                b.title.as_str().to_lowercase().contains(&query)
                    || b.genre.as_str().to_lowercase().contains(&query)
                    || b.authors
                        .iter()
                        .any(|a| a.as_str().to_lowercase().contains(&query))
            })
            .collect()
    }

    // ---- 内部ヘルパー -------------------------------------------------

    fn replace_book(&mut self, book: Book) {
        if let Some(stored) = self.books.iter_mut().find(|b| b.isbn == book.isbn) {
            *stored = book;
        }
    }

    // index 番目の貸出に対応する返却がそれ以降に記録されているか
    fn returned_after(&self, index: usize, loan: &Loan) -> bool {
        self.transactions[index + 1..].iter().any(|t| {
            t.as_return()
                .is_some_and(|r| r.book.isbn == loan.book.isbn && r.user.id == loan.user.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::{
        book::event::CreateBook,
        user::UserKind,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_book(isbn: &str, title: &str) -> Book {
        Book::create(CreateBook {
            isbn: isbn.into(),
            title: title.into(),
            authors: vec!["Joshua Bloch".into()],
            publication_year: 2018,
            genre: "Programming".into(),
        })
        .unwrap()
    }

    fn sample_user(name: &str, kind: UserKind) -> User {
        User {
            id: UserId::new(),
            name: name.into(),
            password_hash: "(unused)".into(),
            kind,
        }
    }

    fn student(name: &str) -> User {
        sample_user(
            name,
            UserKind::Student {
                major: "Computer Science".into(),
            },
        )
    }

    fn catalog_with_one_book_and_user() -> (Catalog, Isbn, UserId) {
        let book = sample_book("978-0134685991", "Effective Java");
        let isbn = book.isbn.clone();
        let user = student("alice");
        let user_id = user.id;
        let catalog = Catalog::new().add_book(book).unwrap().add_user(user).unwrap();
        (catalog, isbn, user_id)
    }

    #[test]
    fn add_book_rejects_duplicate_isbn() {
        let catalog = Catalog::new()
            .add_book(sample_book("978-0134685991", "Effective Java"))
            .unwrap();
        let err = catalog
            .add_book(sample_book("978-0134685991", "Effective Java, 3rd"))
            .unwrap_err();
        assert!(matches!(err, AppError::EntityAlreadyExists(_)));
        assert_eq!(catalog.books().len(), 1);
    }

    #[test]
    fn add_user_rejects_duplicate_id() {
        let user = student("alice");
        let duplicate = User {
            name: "impostor".into(),
            ..user.clone()
        };
        let catalog = Catalog::new().add_user(user).unwrap();
        assert!(matches!(
            catalog.add_user(duplicate),
            Err(AppError::EntityAlreadyExists(_))
        ));
    }

    #[test]
    fn loan_flips_availability_and_appends_a_loan_with_due_date() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();

        assert!(!catalog.book(&isbn).unwrap().is_available);
        assert_eq!(catalog.transactions().len(), 1);
        let loan = catalog.transactions()[0].as_loan().unwrap();
        assert_eq!(loan.due_date, now() + loan_period());
        assert_eq!(loan.user.id, user_id);
    }

    #[test]
    fn second_loan_fails_and_leaves_the_catalog_unchanged() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let after_first = catalog.loan_book(&isbn, user_id, now()).unwrap();

        let before = after_first.clone();
        let err = after_first.loan_book(&isbn, user_id, now()).unwrap_err();
        assert!(matches!(err, AppError::StateConflict(_)));
        // 失敗してもカタログは最初の貸出直後の状態と完全に一致する
        assert_eq!(after_first, before);
        assert_eq!(after_first.transactions().len(), 1);
    }

    #[test]
    fn no_double_loan_even_by_another_user() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let other = student("bob");
        let other_id = other.id;
        let catalog = catalog.add_user(other).unwrap();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();

        assert!(matches!(
            catalog.loan_book(&isbn, other_id, now()),
            Err(AppError::StateConflict(_))
        ));
    }

    #[test]
    fn return_restores_availability_and_second_return_fails() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.return_book(&isbn, user_id, now()).unwrap();

        assert!(catalog.book(&isbn).unwrap().is_available);
        assert_eq!(catalog.transactions().len(), 2);
        assert!(catalog.transactions()[1].as_return().is_some());

        assert!(matches!(
            catalog.return_book(&isbn, user_id, now()),
            Err(AppError::StateConflict(_))
        ));
    }

    #[test]
    fn return_by_a_different_user_fails() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let other = student("bob");
        let other_id = other.id;
        let catalog = catalog.add_user(other).unwrap();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();

        assert!(matches!(
            catalog.return_book(&isbn, other_id, now()),
            Err(AppError::StateConflict(_))
        ));
    }

    #[test]
    fn availability_flag_tracks_outstanding_loans_through_a_history() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let mut catalog = catalog;
        for _ in 0..3 {
            catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
            assert_eq!(
                catalog.book(&isbn).unwrap().is_available,
                catalog.outstanding_loan_for(&isbn).is_none()
            );
            catalog = catalog.return_book(&isbn, user_id, now()).unwrap();
            assert_eq!(
                catalog.book(&isbn).unwrap().is_available,
                catalog.outstanding_loan_for(&isbn).is_none()
            );
        }
        assert_eq!(catalog.transactions().len(), 6);
    }

    #[test]
    fn remove_book_is_blocked_while_a_loan_is_outstanding() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        assert!(matches!(
            catalog.remove_book(&isbn),
            Err(AppError::StateConflict(_))
        ));

        let catalog = catalog.return_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.remove_book(&isbn).unwrap();
        assert!(catalog.book(&isbn).is_none());
        // 既に削除済みの ISBN をもう一度削除しようとすると NotFound
        assert!(matches!(
            catalog.remove_book(&isbn),
            Err(AppError::EntityNotFound(_))
        ));
    }

    #[test]
    fn remove_user_is_blocked_while_the_user_has_loans() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        assert!(matches!(
            catalog.remove_user(user_id),
            Err(AppError::StateConflict(_))
        ));

        let catalog = catalog.return_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.remove_user(user_id).unwrap();
        assert!(catalog.user(user_id).is_none());
    }

    #[test]
    fn reservation_is_recorded_without_touching_availability() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.reserve_book(&isbn, user_id, now()).unwrap();
        assert!(catalog.book(&isbn).unwrap().is_available);
        assert_eq!(catalog.transactions().len(), 1);

        // 貸出中でも予約自体は記録できる
        let other = student("bob");
        let other_id = other.id;
        let catalog = catalog.add_user(other).unwrap();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.reserve_book(&isbn, other_id, now()).unwrap();
        assert!(!catalog.book(&isbn).unwrap().is_available);
        assert_eq!(catalog.transactions().len(), 3);
    }

    #[test]
    fn loan_and_reserve_report_unknown_entities() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let ghost_isbn = Isbn::new("978-1593278281").unwrap();
        assert!(matches!(
            catalog.loan_book(&ghost_isbn, user_id, now()),
            Err(AppError::EntityNotFound(_))
        ));
        assert!(matches!(
            catalog.loan_book(&isbn, UserId::new(), now()),
            Err(AppError::EntityNotFound(_))
        ));
        assert!(matches!(
            catalog.reserve_book(&ghost_isbn, user_id, now()),
            Err(AppError::EntityNotFound(_))
        ));
    }

    #[test]
    fn active_loans_are_listed_oldest_first() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let second = sample_book("978-1593278281", "The Rust Programming Language");
        let second_isbn = second.isbn.clone();
        let catalog = catalog.add_book(second).unwrap();

        let t1 = now();
        let t2 = now() + chrono::Duration::hours(1);
        let catalog = catalog.loan_book(&isbn, user_id, t1).unwrap();
        let catalog = catalog.loan_book(&second_isbn, user_id, t2).unwrap();

        let loans = catalog.active_loans_for(user_id);
        assert_eq!(loans.len(), 2);
        assert_eq!(loans[0].book.isbn, isbn);
        assert_eq!(loans[1].book.isbn, second_isbn);

        let catalog = catalog.return_book(&isbn, user_id, t2).unwrap();
        let loans = catalog.active_loans_for(user_id);
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].book.isbn, second_isbn);
    }

    #[test]
    fn overdue_loans_respect_the_due_date() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();

        assert!(catalog.overdue_loans(now() + loan_period()).is_empty());
        let overdue = catalog.overdue_loans(now() + loan_period() + chrono::Duration::days(1));
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].book.isbn, isbn);
    }

    #[test]
    fn search_matches_title_author_and_genre_case_insensitively() {
        let catalog = Catalog::new()
            .add_book(sample_book("978-0134685991", "Effective Java"))
            .unwrap()
            .add_book(sample_book("978-1593278281", "The Rust Programming Language"))
            .unwrap();

        assert_eq!(catalog.search("effective").len(), 1);
        assert_eq!(catalog.search("JOSHUA").len(), 2);
        assert_eq!(catalog.search("programming").len(), 2);
        assert!(catalog.search("cooking").is_empty());

        // 登録順を保つ
        let hits = catalog.search("programming");
        assert_eq!(hits[0].title.as_str(), "Effective Java");
    }

    #[test]
    fn available_books_excludes_loaned_copies() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        assert_eq!(catalog.available_books().len(), 1);
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        assert!(catalog.available_books().is_empty());
    }

    #[test]
    fn authenticate_matches_name_and_password_exactly() {
        let mut user = student("alice");
        user.password_hash = bcrypt::hash("correct horse", 4).unwrap();
        let catalog = Catalog::new().add_user(user).unwrap();

        let session = catalog.authenticate("alice", "correct horse").unwrap();
        assert_eq!(session.user_name, "alice");
        assert!(matches!(
            catalog.authenticate("alice", "wrong"),
            Err(AppError::UnauthenticatedError)
        ));
        assert!(matches!(
            catalog.authenticate("Alice", "correct horse"),
            Err(AppError::UnauthenticatedError)
        ));
    }

    #[test]
    fn transaction_snapshots_survive_catalog_edits() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.return_book(&isbn, user_id, now()).unwrap();
        let catalog = catalog.remove_book(&isbn).unwrap();
        let catalog = catalog.remove_user(user_id).unwrap();

        // 本人とその蔵書が消えても取引ログには発生時点の姿が残る
        assert_eq!(catalog.transactions().len(), 2);
        let loan = catalog.transactions()[0].as_loan().unwrap();
        assert_eq!(loan.book.isbn, isbn);
        assert_eq!(loan.user.id, user_id);
    }

    #[test]
    fn from_parts_rejects_a_contradictory_availability_flag() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();

        let mut books = catalog.books().to_vec();
        books[0].is_available = true; // 未返却の貸出があるのに貸出可能
        let result = Catalog::from_parts(
            books,
            catalog.users().to_vec(),
            catalog.transactions().to_vec(),
        );
        assert!(matches!(result, Err(AppError::ConversionEntityError(_))));
    }

    #[test]
    fn from_parts_accepts_a_consistent_history() {
        let (catalog, isbn, user_id) = catalog_with_one_book_and_user();
        let catalog = catalog.loan_book(&isbn, user_id, now()).unwrap();
        let rebuilt = Catalog::from_parts(
            catalog.books().to_vec(),
            catalog.users().to_vec(),
            catalog.transactions().to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt, catalog);
    }
}
