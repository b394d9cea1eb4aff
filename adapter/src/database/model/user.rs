use std::str::FromStr;

use kernel::model::{id::UserId, role::Role, user::User};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub role_name: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(value: UserRow) -> Result<Self, Self::Error> {
        let UserRow {
            user_id,
            user_name,
            email,
            role_name,
        } = value;
        Ok(User {
            user_id,
            user_name,
            email,
            role: Role::from_str(&role_name).map_err(|_| {
                AppError::ConversionEntityError(format!(
                    "ロール名（{role_name}）を解釈できませんでした。"
                ))
            })?,
        })
    }
}
