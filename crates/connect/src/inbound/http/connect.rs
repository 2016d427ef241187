use app_core::extractors::{AppJson, AppQuery};
use app_core::middleware::Caller;
use app_core::response::Response;
use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::domain::entity::action::ConnectAction;
use crate::domain::inout::prelude::*;
use crate::inbound::model::prelude::*;
use crate::inbound::state::ConnectState;

fn action_message(action: ConnectAction) -> &'static str {
    match action {
        ConnectAction::Connect => "Connected Facebook account",
        ConnectAction::Login => "Logged in with Facebook",
        ConnectAction::Register => "Registered with Facebook",
    }
}

#[debug_handler]
pub async fn connect(
    State(state): State<ConnectState>,
    caller: Caller,
    AppQuery(q): AppQuery<ConnectQuery>,
    AppJson(req): AppJson<ConnectRequest>,
) -> impl IntoResponse {
    let mut params = req.form_params();
    params.extend(q.into_params());

    state
        .connect
        .connect(ConnectInput::from_params(caller.user_id(), req.access_token, None, params))
        .await
        .map(|output| {
            let message = action_message(output.action);
            Response::with_message(ConnectResponse::from(output), message)
        })
}
