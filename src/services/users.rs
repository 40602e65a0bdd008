//! User management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, User, UserQuery},
    repository::Repository,
};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()?;
        self.repository.users.create(&user).await
    }

    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        user.validate()?;
        self.repository.users.update(id, &user).await
    }

    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await
    }

    /// Returns the page and the effective (limit, offset)
    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64, i64)> {
        let (limit, offset) = page_bounds(query);
        let users = self.repository.users.list(limit, offset).await?;
        Ok((users, limit, offset))
    }
}

fn page_bounds(query: &UserQuery) -> (i64, i64) {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    (limit, offset)
}
