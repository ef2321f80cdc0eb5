use std::io::{self, Write};

use chrono::Utc;
use kernel::{
    catalog::Catalog,
    model::{
        auth::Session,
        book::{event::CreateBook, Book},
        id::UserId,
        transaction::Transaction,
        user::{event::CreateUser, User, UserKind},
        value::Isbn,
    },
    repository::catalog::CatalogRepository,
};
use registry::AppRegistry;
use shared::{
    config::AppConfig,
    error::{AppError, AppResult},
};

use crate::menu::MenuAction;

mod menu;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let registry = AppRegistry::new(AppConfig::new());
    let repository = registry.catalog_repository();
    let mut catalog = repository.load()?;
    catalog = bootstrap(catalog)?;

    println!("Library console. Leave the name blank to quit.");
    loop {
        let Some(session) = login(&catalog)? else {
            break;
        };
        println!("Welcome, {} ({})", session.user_name, session.role);
        catalog = session_loop(catalog, &session)?;
    }

    persist(repository.as_ref(), &catalog)?;
    Ok(())
}

// 初回起動でユーザーがひとりもいないとログインできないので、既定の司書を登録する
fn bootstrap(catalog: Catalog) -> AppResult<Catalog> {
    if !catalog.users().is_empty() {
        return Ok(catalog);
    }
    tracing::warn!("no users registered, seeding the default librarian account");
    println!("First run: a librarian account \"admin\" (password \"admin\") was created.");
    let librarian = User::create(CreateUser {
        name: "admin".into(),
        password: "admin".into(),
        kind: UserKind::Librarian {
            location_code: "MAIN".into(),
        },
    })?;
    catalog.add_user(librarian)
}

fn persist(repository: &dyn CatalogRepository, catalog: &Catalog) -> AppResult<()> {
    repository.save(catalog)?;
    tracing::info!("catalog saved");
    Ok(())
}

fn login(catalog: &Catalog) -> anyhow::Result<Option<Session>> {
    loop {
        let name = prompt("Name")?;
        if name.is_empty() {
            return Ok(None);
        }
        let password = prompt("Password")?;
        match catalog.authenticate(&name, &password) {
            Ok(session) => return Ok(Some(session)),
            Err(e) => println!("{e}"),
        }
    }
}

fn session_loop(mut catalog: Catalog, session: &Session) -> anyhow::Result<Catalog> {
    loop {
        let actions = MenuAction::available_to(session);
        println!();
        for (i, action) in actions.iter().enumerate() {
            println!("{:2}. {}", i + 1, action.label());
        }
        let choice = prompt("Select")?;
        let Some(action) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| actions.get(n).copied())
        else {
            println!("Unknown selection.");
            continue;
        };
        if action == MenuAction::Logout {
            return Ok(catalog);
        }
        catalog = dispatch(action, catalog, session)?;
    }
}

fn dispatch(action: MenuAction, catalog: Catalog, session: &Session) -> anyhow::Result<Catalog> {
    // メニューの出し分けとは別に、ゲート対象の操作の直前でも必ず権限を確認する
    if let Some(capability) = action.required_capability() {
        if !session.has_permission(capability) {
            println!("{}", AppError::ForbiddenOperation);
            return Ok(catalog);
        }
    }
    let result = match action {
        MenuAction::ListBooks => {
            list_books(&catalog);
            Ok(None)
        }
        MenuAction::SearchBooks => search_books(&catalog).map(|_| None),
        MenuAction::LoanBook => loan_book(&catalog, session).map(Some),
        MenuAction::ReturnBook => return_book(&catalog, session).map(Some),
        MenuAction::ReserveBook => reserve_book(&catalog, session).map(Some),
        MenuAction::AddBook => add_book(&catalog).map(Some),
        MenuAction::RemoveBook => remove_book(&catalog).map(Some),
        MenuAction::AddUser => add_user(&catalog).map(Some),
        MenuAction::RemoveUser => remove_user(&catalog).map(Some),
        MenuAction::ListUsers => {
            list_users(&catalog);
            Ok(None)
        }
        MenuAction::ViewTransactions => {
            view_transactions(&catalog);
            Ok(None)
        }
        MenuAction::ViewStatistics => {
            view_statistics(&catalog);
            Ok(None)
        }
        MenuAction::Logout => Ok(None),
    };
    match result {
        Ok(Some(updated)) => Ok(updated),
        Ok(None) => Ok(catalog),
        // 集約の操作は失敗しても元のカタログを変えないので、報告して続行する
        Err(PromptError::App(e)) => {
            println!("{e}");
            Ok(catalog)
        }
        Err(PromptError::Io(e)) => Err(e.into()),
    }
}

// 入出力の失敗 (致命的) と業務上の失敗 (報告して継続) を区別する
enum PromptError {
    Io(io::Error),
    App(AppError),
}

impl From<io::Error> for PromptError {
    fn from(e: io::Error) -> Self {
        PromptError::Io(e)
    }
}

impl From<AppError> for PromptError {
    fn from(e: AppError) -> Self {
        PromptError::App(e)
    }
}

type ActionResult<T> = Result<T, PromptError>;

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn print_book(book: &Book) {
    let status = if book.is_available {
        "available"
    } else {
        "on loan"
    };
    println!(
        "  {}  {} / {} ({}, {}) [{}]",
        book.isbn.formatted(),
        book.title,
        book.author_line(),
        book.genre,
        book.publication_year,
        status
    );
}

fn list_books(catalog: &Catalog) {
    if catalog.books().is_empty() {
        println!("No books registered.");
        return;
    }
    for book in catalog.books() {
        print_book(book);
    }
}

fn search_books(catalog: &Catalog) -> ActionResult<()> {
    let query = prompt("Search for")?;
    let hits = catalog.search(&query);
    if hits.is_empty() {
        println!("No matches.");
    }
    for book in hits {
        print_book(book);
    }
    Ok(())
}

fn loan_book(catalog: &Catalog, session: &Session) -> ActionResult<Catalog> {
    let isbn = Isbn::new(prompt("ISBN")?)?;
    let next = catalog.loan_book(&isbn, session.user_id, Utc::now())?;
    println!("Loaned. Due on {}.", due_date_of_last_loan(&next));
    Ok(next)
}

fn due_date_of_last_loan(catalog: &Catalog) -> String {
    catalog
        .transactions()
        .iter()
        .rev()
        .find_map(|t| t.as_loan())
        .map(|l| l.due_date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn return_book(catalog: &Catalog, session: &Session) -> ActionResult<Catalog> {
    let loans = catalog.active_loans_for(session.user_id);
    if loans.is_empty() {
        println!("You have no outstanding loans.");
    } else {
        println!("Your outstanding loans:");
        for loan in loans {
            println!(
                "  {}  {} (due {})",
                loan.book.isbn.formatted(),
                loan.book.title,
                loan.due_date.format("%Y-%m-%d")
            );
        }
    }
    let isbn = Isbn::new(prompt("ISBN to return")?)?;
    let next = catalog.return_book(&isbn, session.user_id, Utc::now())?;
    println!("Returned.");
    Ok(next)
}

fn reserve_book(catalog: &Catalog, session: &Session) -> ActionResult<Catalog> {
    let isbn = Isbn::new(prompt("ISBN to reserve")?)?;
    let next = catalog.reserve_book(&isbn, session.user_id, Utc::now())?;
    println!("Reservation recorded.");
    Ok(next)
}

fn add_book(catalog: &Catalog) -> ActionResult<Catalog> {
    let event = CreateBook {
        isbn: prompt("ISBN")?,
        title: prompt("Title")?,
        authors: prompt("Authors (comma separated)")?
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        publication_year: prompt("Publication year")?
            .parse()
            .map_err(|_| AppError::UnprocessableEntiry("publication year must be a number".into()))?,
        genre: prompt("Genre")?,
    };
    let next = catalog.add_book(Book::create(event)?)?;
    println!("Book registered.");
    Ok(next)
}

fn remove_book(catalog: &Catalog) -> ActionResult<Catalog> {
    let isbn = Isbn::new(prompt("ISBN to remove")?)?;
    let next = catalog.remove_book(&isbn)?;
    println!("Book removed.");
    Ok(next)
}

fn add_user(catalog: &Catalog) -> ActionResult<Catalog> {
    let name = prompt("Name")?;
    let password = prompt("Password")?;
    let kind = match prompt("Kind (student/faculty/librarian)")?.as_str() {
        "student" => UserKind::Student {
            major: prompt("Major")?,
        },
        "faculty" => UserKind::Faculty {
            department: prompt("Department")?,
        },
        "librarian" => UserKind::Librarian {
            location_code: prompt("Location code")?,
        },
        other => {
            return Err(
                AppError::UnprocessableEntiry(format!("unknown user kind: {other}")).into(),
            )
        }
    };
    let user = User::create(CreateUser {
        name,
        password,
        kind,
    })?;
    println!("User registered with id {}.", user.id);
    let next = catalog.add_user(user)?;
    Ok(next)
}

fn remove_user(catalog: &Catalog) -> ActionResult<Catalog> {
    let id: UserId = prompt("User id to remove")?.parse()?;
    let next = catalog.remove_user(id)?;
    println!("User removed.");
    Ok(next)
}

fn list_users(catalog: &Catalog) {
    if catalog.users().is_empty() {
        println!("No users registered.");
        return;
    }
    for user in catalog.users() {
        println!("  {}  {} ({})", user.id, user.name, user.role());
    }
}

fn view_transactions(catalog: &Catalog) {
    if catalog.transactions().is_empty() {
        println!("No transactions recorded.");
        return;
    }
    for transaction in catalog.transactions() {
        let (kind, user) = match transaction {
            Transaction::Loan(t) => ("LOAN", &t.user),
            Transaction::Return(t) => ("RETURN", &t.user),
            Transaction::Reservation(t) => ("RESERVE", &t.user),
        };
        println!(
            "  {}  {:8}  {}  by {}",
            transaction.created_at().format("%Y-%m-%d %H:%M"),
            kind,
            transaction.isbn().formatted(),
            user.name
        );
    }
}

// 取引ログと読み取り専用ビューから組み立てる簡易統計
fn view_statistics(catalog: &Catalog) {
    use std::collections::BTreeMap;

    println!(
        "Books: {} ({} available)",
        catalog.books().len(),
        catalog.available_books().len()
    );
    println!("Users: {}", catalog.users().len());
    println!("Transactions: {}", catalog.transactions().len());
    println!("Overdue loans: {}", catalog.overdue_loans(Utc::now()).len());

    let mut by_genre: BTreeMap<String, usize> = BTreeMap::new();
    for book in catalog.books() {
        *by_genre.entry(book.genre.normalized()).or_default() += 1;
    }
    if !by_genre.is_empty() {
        println!("By genre:");
        for (genre, count) in &by_genre {
            println!("  {genre}: {count}");
        }
    }

    let mut loan_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for transaction in catalog.transactions() {
        if let Some(loan) = transaction.as_loan() {
            *loan_counts.entry(loan.book.title.as_str()).or_default() += 1;
        }
    }
    if let Some((title, count)) = loan_counts.iter().max_by_key(|(_, c)| **c) {
        println!("Most loaned: {title} ({count} loans)");
    }
}
