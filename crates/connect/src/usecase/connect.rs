use std::collections::BTreeMap;
use std::sync::Arc;

use app_core::config::Config;
use app_core::error::{AppError, IncompleteProfile};
use app_core::graph::{FacebookGraph, GraphFactory};
use app_core::jwt::TokenManager;
use async_trait::async_trait;
use rand::Rng;

use super::converter::{FacebookUserConverter, USERNAME_MAX_LEN};
use super::registration::RegistrationBackend;
use crate::domain::entity::action::ConnectAction;
use crate::domain::entity::profile::FacebookProfile;
use crate::domain::entity::relation::{FacebookFriend, FacebookLike};
use crate::domain::entity::user::User;
use crate::domain::inout::prelude::*;
use crate::domain::merge::{FacebookField, merge_facebook_fields};
use crate::outbound::repository::ConnectRepository;
use crate::outbound::session::SessionRepository;

/// The authentication backend recorded for sessions started by this flow.
pub const FACEBOOK_BACKEND: &str = "facebook";

const GRAPH_NOT_AUTHENTICATED_MSG: &str = "Facebook needs to be authenticated for connect flows";
const CALLER_REQUIRED_MSG: &str = "Connect user can only be used on authenticated users";
const NO_MATCH_MSG: &str = "No local account matches the Facebook profile";

const HARD_FORCE_TOKEN_MAX: u32 = 100_000;
const USERNAME_ATTEMPTS: usize = 1_000;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConnectUseCase: Send + Sync {
    async fn connect(&self, input: ConnectInput) -> Result<ConnectOutput, AppError>;
}

#[derive(Clone)]
pub struct ConnectService {
    config: Arc<Config>,
    graphs: Arc<dyn GraphFactory>,
    token: Arc<dyn TokenManager>,
    session: Arc<dyn SessionRepository>,
    registration: Arc<dyn RegistrationBackend>,
    repo: Arc<dyn ConnectRepository>,
}

impl ConnectService {
    pub fn new(
        config: Arc<Config>,
        graphs: Arc<dyn GraphFactory>,
        token: Arc<dyn TokenManager>,
        session: Arc<dyn SessionRepository>,
        registration: Arc<dyn RegistrationBackend>,
        repo: Arc<dyn ConnectRepository>,
    ) -> Self {
        Self { config, graphs, token, session, registration, repo }
    }

    /// The fields merged from Facebook, read from `facebook.profile_fields`.
    /// Unknown names are skipped; an empty list means the defaults.
    fn profile_fields(&self) -> Vec<FacebookField> {
        let names: Vec<String> = self.config.get_or("facebook.profile_fields", Vec::new());

        let fields: Vec<FacebookField> = names
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(field) => Some(field),
                Err(err) => {
                    tracing::warn!("Ignoring facebook.profile_fields entry: {}", err);
                    None
                },
            })
            .collect();

        if fields.is_empty() { FacebookField::DEFAULTS.to_vec() } else { fields }
    }

    /// Looks up the local account for the Facebook identity: by Facebook id
    /// first, then by email when Facebook has verified it.
    async fn find_matching_user(&self, converter: &FacebookUserConverter) -> Result<Option<User>, AppError> {
        let facebook_id = converter.facebook_id()?;
        if let Some(user) = self.repo.find_user_by_facebook_id(&facebook_id).await? {
            return Ok(Some(user));
        }

        match converter.verified_email() {
            Some(email) => self.repo.find_user_by_email(&email).await,
            None => Ok(None),
        }
    }

    /// Merges the Facebook data into the account of `caller`.
    async fn connect_caller(
        &self,
        caller: Option<i64>,
        graph: &dyn FacebookGraph,
        converter: &FacebookUserConverter,
    ) -> Result<User, AppError> {
        let user_id = caller.ok_or_else(|| AppError::InvalidState(CALLER_REQUIRED_MSG.to_string()))?;
        if !graph.is_authenticated().await {
            return Err(AppError::InvalidState(GRAPH_NOT_AUTHENTICATED_MSG.to_string()));
        }

        let user = self
            .repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::InvalidState(CALLER_REQUIRED_MSG.to_string()))?;

        self.update_user(user, converter).await
    }

    async fn login_user(
        &self,
        user: User,
        graph: &dyn FacebookGraph,
        converter: &FacebookUserConverter,
    ) -> Result<(User, SessionTokens), AppError> {
        let session = self.establish_session(user.id, FACEBOOK_BACKEND).await?;

        // Accounts matched by verified email have never been connected.
        let profile = self.repo.find_profile_by_user_id(user.id).await?;
        let update = needs_update(profile.as_ref());

        let user = if update { self.connect_caller(Some(user.id), graph, converter).await? } else { user };

        tracing::info!(user_id = user.id, updated = update, "Logged in with Facebook");
        Ok((user, session))
    }

    async fn register_user(
        &self,
        graph: &dyn FacebookGraph,
        converter: &FacebookUserConverter,
        form: BTreeMap<String, String>,
        force: ForceRegistration,
    ) -> Result<(User, SessionTokens), AppError> {
        if !graph.is_authenticated().await {
            return Err(AppError::InvalidState(GRAPH_NOT_AUTHENTICATED_MSG.to_string()));
        }

        let mut facebook_data = converter.registration_data()?;
        facebook_data.username = self.unique_username(&facebook_data.username).await?;

        let mut data = form;
        for (key, value) in facebook_data.to_form_data() {
            let submitted = data.get(&key).is_some_and(|v| !v.trim().is_empty());
            if !submitted {
                data.insert(key, value);
            }
        }

        if force.is_hard() {
            if let Some(email) = data.get_mut("email") {
                let token = rand::thread_rng().gen_range(0..=HARD_FORCE_TOKEN_MAX);
                *email = tag_email(email, token);
            }
        }

        let form = match self.registration.clean(&data).await {
            Ok(form) => form,
            Err(AppError::Validation(errors)) => {
                let message = format!("Facebook data gave error: {errors}");
                return Err(AppError::IncompleteProfile(Box::new(IncompleteProfile::new(message, data, errors))));
            },
            Err(err) => return Err(err),
        };

        let user = self.registration.register(form).await?;
        let user = self.update_user(user, converter).await?;
        let session = self.establish_session(user.id, FACEBOOK_BACKEND).await?;

        tracing::info!(user_id = user.id, force_registration = %force, "Registered with Facebook");
        Ok((user, session))
    }

    /// Returns `base`, or `base` cut short and suffixed with the first number
    /// that makes it unused.
    async fn unique_username(&self, base: &str) -> Result<String, AppError> {
        if self.repo.find_user_by_username(base).await?.is_none() {
            return Ok(base.to_string());
        }

        for n in 1..=USERNAME_ATTEMPTS {
            let suffix = n.to_string();
            let stem: String = base.chars().take(USERNAME_MAX_LEN - suffix.len()).collect();
            let candidate = format!("{stem}{suffix}");
            if self.repo.find_user_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!("No free username left for {base}")))
    }

    /// Copies Facebook data onto the user and its profile and links the
    /// Facebook id to this user alone.
    async fn update_user(&self, mut user: User, converter: &FacebookUserConverter) -> Result<User, AppError> {
        let data = converter.registration_data()?;
        let mut profile =
            self.repo.find_profile_by_user_id(user.id).await?.unwrap_or_else(|| FacebookProfile::empty(user.id));

        let mut profile_dirty = profile.fb_update_required;
        if profile.facebook_id.as_deref() != Some(data.facebook_id.as_str()) {
            let cleared = self.repo.clear_facebook_id(&data.facebook_id, user.id).await?;
            if cleared > 0 {
                tracing::info!(
                    user_id = user.id,
                    facebook_id = %data.facebook_id,
                    cleared,
                    "Unlinked Facebook id from other profiles"
                );
            }
            profile.facebook_id = Some(data.facebook_id.clone());
            profile_dirty = true;
        }

        let outcome = merge_facebook_fields(&self.profile_fields(), &data, &mut user, &mut profile);

        let raw_data = Some(converter.raw_data()?);
        if profile.raw_data != raw_data {
            profile.raw_data = raw_data;
            profile_dirty = true;
        }
        profile.fb_update_required = false;

        if outcome.user_dirty {
            self.repo.save_user(&user).await?;
        }
        if outcome.profile_dirty || profile_dirty {
            self.repo.save_profile(&profile).await?;
        }

        Ok(user)
    }

    async fn establish_session(&self, user_id: i64, backend: &str) -> Result<SessionTokens, AppError> {
        let access_token = self.token.create_access_token(user_id)?;
        let refresh_token = self.token.create_refresh_token(user_id)?;

        let claims = self.token.validate_refresh_token(&refresh_token)?;
        let ttl = claims.exp.saturating_sub(claims.iat) as u64;
        self.session.add_session(&claims.jti, user_id, backend, ttl).await?;

        Ok(SessionTokens { access_token, refresh_token })
    }

    /// Stores likes and friends when configured. A duplicate entry means the
    /// same request was submitted twice; it is logged and the flow goes on.
    async fn store_relations(
        &self,
        action: ConnectAction,
        user_id: i64,
        graph: &dyn FacebookGraph,
    ) -> Result<(), AppError> {
        let store_likes = self.config.get_or("facebook.store_likes", false);
        let store_friends = self.config.get_or("facebook.store_friends", false);
        if !store_likes && !store_friends {
            return Ok(());
        }

        let likes: Vec<FacebookLike> = if store_likes {
            graph.likes().await?.into_iter().map(FacebookLike::from).collect()
        } else {
            Vec::new()
        };
        let friends: Vec<FacebookFriend> = if store_friends {
            graph.friends().await?.into_iter().map(FacebookFriend::from).collect()
        } else {
            Vec::new()
        };

        match self.repo.store_relations(user_id, &likes, &friends).await {
            Err(AppError::DuplicateEntry(body)) => {
                tracing::warn!(
                    user_id,
                    action = %action,
                    body = %body,
                    "Integrity error while storing Facebook likes and friends, probably a double submission"
                );
                Ok(())
            },
            result => result,
        }
    }
}

fn needs_update(profile: Option<&FacebookProfile>) -> bool {
    profile.map_or(true, |profile| !profile.is_connected() || profile.fb_update_required)
}

/// Tags the local part of `email` with `+token`.
pub fn tag_email(email: &str, token: u32) -> String {
    email.replacen('@', &format!("+{token}@"), 1)
}

#[async_trait]
impl ConnectUseCase for ConnectService {
    async fn connect(&self, input: ConnectInput) -> Result<ConnectOutput, AppError> {
        let graph = match input.graph {
            Some(graph) => graph,
            None => self.graphs.open(input.access_token.as_deref().unwrap_or_default()),
        };
        if !graph.is_authenticated().await {
            return Err(AppError::InvalidState(GRAPH_NOT_AUTHENTICATED_MSG.to_string()));
        }

        let converter = FacebookUserConverter::from_graph(graph.as_ref()).await?;
        let force = input.force_registration;
        tracing::debug!(force_registration = %force, "Connecting Facebook identity");

        let authenticated = input.caller.is_some();
        let matched = if authenticated || force.is_set() { None } else { self.find_matching_user(&converter).await? };
        let action = ConnectAction::decide(authenticated, force.is_set(), matched.is_some());

        let (user, session) = match action {
            ConnectAction::Connect => {
                let user = self.connect_caller(input.caller, graph.as_ref(), &converter).await?;
                tracing::info!(user_id = user.id, "Connected Facebook account");
                (user, None)
            },
            ConnectAction::Login => {
                let user = matched.ok_or_else(|| AppError::InvalidState(NO_MATCH_MSG.to_string()))?;
                let (user, session) = self.login_user(user, graph.as_ref(), &converter).await?;
                (user, Some(session))
            },
            ConnectAction::Register => {
                let (user, session) = self.register_user(graph.as_ref(), &converter, input.form, force).await?;
                (user, Some(session))
            },
        };

        self.store_relations(action, user.id, graph.as_ref()).await?;

        Ok(ConnectOutput { action, user, session })
    }
}

/// Runs the connect flow for the pieces of a request and returns what was
/// done together with the resulting user.
pub async fn connect_user(
    connector: &dyn ConnectUseCase,
    caller: Option<i64>,
    params: BTreeMap<String, String>,
    access_token: Option<String>,
    graph: Option<Arc<dyn FacebookGraph>>,
) -> Result<(ConnectAction, User), AppError> {
    let output = connector.connect(ConnectInput::from_params(caller, access_token, graph, params)).await?;
    Ok((output.action, output.user))
}
