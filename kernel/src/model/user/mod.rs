use crate::model::{id::UserId, role::Role};

// 住民ディレクトリは別サブシステムの管轄。予約コアからは
// 存在確認とロール参照のための読み取り専用ビューとしてのみ扱う
#[derive(Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: Role,
}
