mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::config::Config;
use app_core::graph::GraphFactory;
use app_core::jwt::TokenManager;
use app_core::password::Hasher;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
pub use domain::entity::action::ConnectAction;
pub use domain::entity::user::User;
pub use domain::inout::prelude::*;
pub use inbound::router::create_router;
pub use inbound::state::ConnectState;
use sea_orm::DatabaseConnection;
pub use usecase::connect::{ConnectUseCase, FACEBOOK_BACKEND, connect_user};

use crate::outbound::orm::ConnectORM;
use crate::outbound::session::SessionRedis;
use crate::usecase::connect::ConnectService;
use crate::usecase::registration::FormRegistrationBackend;

pub struct Dependency {
    pub db: Arc<DatabaseConnection>,
    pub rds: Pool<RedisConnectionManager>,
    pub config: Arc<Config>,
    pub hasher: Arc<dyn Hasher>,
    pub token: Arc<dyn TokenManager>,
    pub graphs: Arc<dyn GraphFactory>,
}

pub fn new(dep: Dependency) -> ConnectState {
    let session = Arc::new(SessionRedis::new(dep.rds));
    let repo = Arc::new(ConnectORM::new(dep.db));
    let registration = Arc::new(FormRegistrationBackend::new(repo.clone(), dep.hasher));

    let connect_svc = Arc::new(ConnectService::new(dep.config, dep.graphs, dep.token, session, registration, repo));

    ConnectState::new(connect_svc)
}
