use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString, Default,
)]
pub enum Role {
    #[default]
    Student,
    Faculty,
    Librarian,
}

// 操作ごとの権限。セッション生成時にロールから導出され、ゲート対象の操作の前に必ず確認する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
pub enum Capability {
    AddBook,
    AddUser,
    RemoveBook,
    RemoveUser,
    LoanBook,
    ReturnBook,
    ReserveBook,
    SearchBooks,
    ListBooks,
    ListUsers,
    ViewTransactions,
    ViewStatistics,
}

impl Role {
    pub fn permissions(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Student | Role::Faculty => {
                &[LoanBook, ReturnBook, ReserveBook, SearchBooks, ListBooks]
            }
            Role::Librarian => &[
                AddBook,
                AddUser,
                RemoveBook,
                RemoveUser,
                LoanBook,
                ReturnBook,
                ReserveBook,
                SearchBooks,
                ListBooks,
                ListUsers,
                ViewTransactions,
                ViewStatistics,
            ],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.permissions().contains(&capability)
    }
}
