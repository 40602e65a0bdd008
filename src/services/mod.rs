//! Business logic services

pub mod auth;
pub mod catalog;
pub mod lending;
pub mod seed;
pub mod users;

use std::sync::Arc;

use crate::{
    catalog::CatalogMirror,
    config::AuthConfig,
    repository::{CatalogStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingCoordinator,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Wire services around one catalog store and the mirror built from it
    pub fn new(
        repository: Repository,
        store: Arc<dyn CatalogStore>,
        mirror: Arc<CatalogMirror>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(auth_config),
            catalog: catalog::CatalogService::new(store.clone(), mirror.clone()),
            lending: lending::LendingCoordinator::new(store, mirror),
            users: users::UsersService::new(repository.clone()),
            repository,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}
