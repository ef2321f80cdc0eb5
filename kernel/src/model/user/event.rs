use garde::Validate;

use super::UserKind;

// bcrypt はこれより長い入力を受け付けない
const MAX_PASSWORD_LENGTH: usize = 72;

#[derive(Debug, Validate)]
pub struct CreateUser {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
    #[garde(length(min = 1, max = MAX_PASSWORD_LENGTH))]
    pub password: String,
    #[garde(skip)]
    pub kind: UserKind,
}
