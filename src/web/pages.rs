use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::Html;
use serde_json::{Value, json};

use super::error::{AuthError, FailureReason};
use super::extractor::{BackendAccess, SignedIn};
use super::html;
use super::state::AppState;
use super::types::{GatedParams, RowsParams, RowsResponse, TablesResponse, VoteRequest};
use crate::error::Error;

const PROTECTED_BODY: &str = r#"<div class="gated-ui protected-content">
  <p class="page-subtitle">You're signed in! This is the protected content.</p>
  <p><a href="/api/auth/logout">Sign out</a></p>
</div>"#;

/// The sign-in gated page. The session marker is the only authorization signal.
pub(super) async fn gated(
    State(state): State<AppState>,
    session: Option<SignedIn>,
    Query(params): Query<GatedParams>,
) -> Html<String> {
    let gated_path = &state.settings.gated_path;
    let body = match session {
        Some(SignedIn) => PROTECTED_BODY.to_string(),
        None => sign_in_prompt(gated_path, params.error.as_deref()),
    };
    Html(html::page("Assignment 3", gated_path, &body))
}

/// Rows of `table` rendered for a page; failures become an inline message.
async fn listing(state: &AppState, table: &str) -> String {
    let Some(backend) = state.backend.as_deref() else {
        return html::NOT_CONFIGURED.to_string();
    };
    match backend.list_rows(table).await {
        Ok(rows) => html::table(&rows),
        Err(e) => {
            tracing::error!(error = %e, table, "Failed to load rows");
            html::LOAD_FAILED.to_string()
        }
    }
}

pub(super) async fn home(State(state): State<AppState>) -> Html<String> {
    let table = state.settings.tables.default_table();
    let listing = listing(&state, table).await;
    let content = format!(
        "<div class=\"card table-card\"><h2>Assignment 2</h2>\n\
         <h3 class=\"table-title\">List chosen: {}</h3>\n{listing}</div>",
        html::escape(table)
    );
    Html(html::page("Humor Project", "/", &content))
}

/// Default table only, no selector.
pub(super) async fn list(State(state): State<AppState>) -> Html<String> {
    let table = state.settings.tables.default_table();
    let listing = listing(&state, table).await;
    let content = format!("<p><a href=\"/\">&larr; Back home</a></p>\n{listing}");
    Html(html::page(&format!("List: {table}"), "/list", &content))
}

/// Allow-listed table chosen by `?table=`, falling back to the default.
pub(super) async fn assignment_2(
    State(state): State<AppState>,
    Query(params): Query<RowsParams>,
) -> Html<String> {
    let catalog = &state.settings.tables;
    let table = catalog.resolve(params.table.as_deref());
    let listing = listing(&state, table).await;
    let content = format!(
        "{select}\n<p class=\"page-subtitle\">Table: {name}</p>\n{listing}",
        select = html::table_select("/assignment-2", catalog.allowed(), table),
        name = html::escape(table),
    );
    Html(html::page("Assignment 2", "/assignment-2", &content))
}

// Only fixed strings are interpolated: unknown error codes never reach the page.
fn sign_in_prompt(gated_path: &str, error: Option<&str>) -> String {
    let error = error
        .and_then(|e| e.parse::<FailureReason>().ok())
        .map(|reason| format!("<p class=\"error gated-ui-error\">{}</p>\n", reason.message()))
        .unwrap_or_default();
    let login = format!(
        "/api/auth/login?redirect_to={}",
        urlencoding::encode(gated_path)
    );
    format!(
        "<div class=\"gated-ui\"><div class=\"gated-ui-card\">\n\
         <p class=\"gated-ui-text\">This route is protected. Sign in with Google to continue.</p>\n\
         {error}<a class=\"gated-ui-button\" href=\"{login}\">Sign in with Google</a>\n\
         </div></div>"
    )
}

pub(super) async fn tables(State(state): State<AppState>) -> Json<TablesResponse> {
    let catalog = &state.settings.tables;
    Json(TablesResponse {
        tables: catalog.allowed().to_vec(),
        default: catalog.default_table().to_string(),
    })
}

pub(super) async fn rows(
    State(state): State<AppState>,
    Query(params): Query<RowsParams>,
) -> Result<Json<RowsResponse>, AuthError> {
    let table = state.settings.tables.resolve(params.table.as_deref()).to_string();
    let rows = state.require_backend()?.list_rows(&table).await?;
    Ok(Json(RowsResponse { table, rows }))
}

pub(super) async fn vote(
    State(state): State<AppState>,
    access: BackendAccess,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<Value>, AuthError> {
    let backend = state.require_backend()?;

    let user = match backend.current_user(&access.access_token).await {
        Ok(user) => user,
        Err(Error::Upstream {
            status: Some(401 | 403),
            ..
        }) => return Err(AuthError::Unauthenticated),
        Err(e) => return Err(e.into()),
    };

    let Json(body) = body.map_err(|e| AuthError::Validation(e.body_text()))?;
    let vote = body.validate()?;

    backend
        .record_vote(&access.access_token, &user.id, &vote)
        .await?;

    tracing::info!(user_id = %user.id, caption_id = %vote.caption_id, "Vote recorded");
    Ok(Json(json!({ "ok": true })))
}
