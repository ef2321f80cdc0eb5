use kernel::model::{auth::Session, role::Capability};

// コンソールメニューの 1 項目。権限が必要な項目はログイン中のロールに応じて出し分ける
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ListBooks,
    SearchBooks,
    LoanBook,
    ReturnBook,
    ReserveBook,
    AddBook,
    RemoveBook,
    AddUser,
    RemoveUser,
    ListUsers,
    ViewTransactions,
    ViewStatistics,
    Logout,
}

impl MenuAction {
    pub const ALL: &'static [MenuAction] = &[
        MenuAction::ListBooks,
        MenuAction::SearchBooks,
        MenuAction::LoanBook,
        MenuAction::ReturnBook,
        MenuAction::ReserveBook,
        MenuAction::AddBook,
        MenuAction::RemoveBook,
        MenuAction::AddUser,
        MenuAction::RemoveUser,
        MenuAction::ListUsers,
        MenuAction::ViewTransactions,
        MenuAction::ViewStatistics,
        MenuAction::Logout,
    ];

    pub fn required_capability(self) -> Option<Capability> {
        match self {
            MenuAction::ListBooks => Some(Capability::ListBooks),
            MenuAction::SearchBooks => Some(Capability::SearchBooks),
            MenuAction::LoanBook => Some(Capability::LoanBook),
            MenuAction::ReturnBook => Some(Capability::ReturnBook),
            MenuAction::ReserveBook => Some(Capability::ReserveBook),
            MenuAction::AddBook => Some(Capability::AddBook),
            MenuAction::RemoveBook => Some(Capability::RemoveBook),
            MenuAction::AddUser => Some(Capability::AddUser),
            MenuAction::RemoveUser => Some(Capability::RemoveUser),
            MenuAction::ListUsers => Some(Capability::ListUsers),
            MenuAction::ViewTransactions => Some(Capability::ViewTransactions),
            MenuAction::ViewStatistics => Some(Capability::ViewStatistics),
            MenuAction::Logout => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::ListBooks => "List books",
            MenuAction::SearchBooks => "Search books",
            MenuAction::LoanBook => "Loan a book",
            MenuAction::ReturnBook => "Return a book",
            MenuAction::ReserveBook => "Reserve a book",
            MenuAction::AddBook => "Add a book",
            MenuAction::RemoveBook => "Remove a book",
            MenuAction::AddUser => "Add a user",
            MenuAction::RemoveUser => "Remove a user",
            MenuAction::ListUsers => "List users",
            MenuAction::ViewTransactions => "View transactions",
            MenuAction::ViewStatistics => "View statistics",
            MenuAction::Logout => "Log out",
        }
    }

    // ログイン中のユーザーが選べる項目だけを番号付きで返す
    pub fn available_to(session: &Session) -> Vec<MenuAction> {
        Self::ALL
            .iter()
            .copied()
            .filter(|action| {
                action
                    .required_capability()
                    .map_or(true, |c| session.has_permission(c))
            })
            .collect()
    }
}
