use async_trait::async_trait;

use crate::model::{id::UserId, user::User};
use shared::error::AppResult;

// 住民ディレクトリへの読み取り専用の窓口。
// 予約コアは存在確認とロールの参照にのみ使う
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;
}
