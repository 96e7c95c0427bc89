//! List, show, create, update and delete views.
//!
//! Each handler runs its store work in one `SessionScope`: the scope commits
//! when the handler succeeds and rolls back when it fails. Request bodies are
//! read first; the scope then runs on the blocking pool.

use std::error::Error as StdError;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use scaffold_core::forms::{Form, FormData};
use scaffold_core::repository::Repository;
use scaffold_core::store::{RecordKey, Session, SessionScope};

use super::request_utils::{
    build_redirect, build_response, map_scaffold_error, parse_form_data,
    read_request_body_with_timeout, MatchitParams,
};
use crate::render::ViewContext;
use crate::router::{AppState, RouterError};
use crate::views::{EntityViews, ViewKind};

/// Lists every record of the type.
///
/// # Endpoint
/// `GET /{prefix}`
///
/// # Response
/// - 200 OK: `{prefix}/list.html` rendered with `entities`
///
/// # Example
/// ```bash
/// curl http://localhost:8080/customer
/// ```
pub async fn list(
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    run_in_scope(state, move |session, state| {
        let records = views
            .repository()
            .get_all(session)
            .map_err(map_scaffold_error)?;
        let context = ViewContext::new(&views, ViewKind::List).with_entities(&records);
        render(state, &context, StatusCode::OK)
    })
    .await
}

/// Shows one record.
///
/// # Endpoint
/// `GET /{prefix}/{key}`
///
/// # Response
/// - 200 OK: `{prefix}/show.html` rendered with `entity`
///
/// # Errors
/// - 404 Not Found: key is malformed or no record has it
pub async fn show(
    params: &MatchitParams<'_, '_>,
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let key = record_key(params, &views)?;
    run_in_scope(state, move |session, state| {
        let record = views
            .repository()
            .get(session, &key)
            .map_err(map_scaffold_error)?;
        let context = ViewContext::new(&views, ViewKind::Show).with_entity(&record);
        render(state, &context, StatusCode::OK)
    })
    .await
}

/// Empty create form, pre-filled with field defaults.
///
/// # Endpoint
/// `GET /{prefix}/new`
pub async fn create_form(
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    run_in_scope(state, move |session, state| {
        let mut form = Form::new(Arc::clone(views.form()));
        form.load_choices(session).map_err(map_scaffold_error)?;
        let context = ViewContext::new(&views, ViewKind::Create).with_form(form.view());
        render(state, &context, StatusCode::OK)
    })
    .await
}

/// Validates a submitted create form and creates the record.
///
/// # Endpoint
/// `POST /{prefix}/new`
///
/// # Request Body
/// `application/x-www-form-urlencoded` fields, or a JSON object when the
/// content type is `application/json`.
///
/// # Response
/// - 303 See Other: record created, `Location` is the success URL
/// - 422 Unprocessable Entity: `{prefix}/create.html` with the form errors
///
/// # Errors
/// - 400 Bad Request: unreadable body
/// - 409 Conflict: a concurrent commit took a unique value first
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/customer/new \
///   -d 'email=ann@example.com&name=Ann'
/// ```
pub async fn create_submit<B>(
    req: Request<B>,
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let data = read_form(req, &state).await?;
    run_in_scope(state, move |session, state| {
        let mut form = Form::submit(Arc::clone(views.form()), &data);
        form.load_choices(session).map_err(map_scaffold_error)?;

        if form.validate(session, None).map_err(map_scaffold_error)? {
            let record = views
                .repository()
                .create(session, form.values())
                .map_err(map_scaffold_error)?;
            return build_redirect(&views.success_url(&record));
        }

        tracing::debug!(entity = %views.entity().name(), errors = ?form.errors(), "Create form rejected");
        let context = ViewContext::new(&views, ViewKind::Create).with_form(form.view());
        render(state, &context, StatusCode::UNPROCESSABLE_ENTITY)
    })
    .await
}

/// Edit form populated from the stored record.
///
/// # Endpoint
/// `GET /{prefix}/{key}/edit`
///
/// # Errors
/// - 404 Not Found: no such record
pub async fn update_form(
    params: &MatchitParams<'_, '_>,
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let key = record_key(params, &views)?;
    run_in_scope(state, move |session, state| {
        let record = views
            .repository()
            .get(session, &key)
            .map_err(map_scaffold_error)?;
        let mut form = Form::with_record(Arc::clone(views.form()), &record);
        form.load_choices(session).map_err(map_scaffold_error)?;
        let context = ViewContext::new(&views, ViewKind::Update)
            .with_form(form.view())
            .with_entity(&record);
        render(state, &context, StatusCode::OK)
    })
    .await
}

/// Validates a submitted edit form and updates the record. Uniqueness
/// checks ignore the record being edited.
///
/// # Endpoint
/// `POST /{prefix}/{key}/edit`
///
/// # Response
/// - 303 See Other: record updated
/// - 422 Unprocessable Entity: `{prefix}/update.html` with the form errors
///
/// # Errors
/// - 404 Not Found: no such record
pub async fn update_submit<B>(
    req: Request<B>,
    params: &MatchitParams<'_, '_>,
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let key = record_key(params, &views)?;
    let data = read_form(req, &state).await?;
    run_in_scope(state, move |session, state| {
        let record = views
            .repository()
            .get(session, &key)
            .map_err(map_scaffold_error)?;
        let mut form = Form::submit(Arc::clone(views.form()), &data);
        form.load_choices(session).map_err(map_scaffold_error)?;

        if form.validate(session, Some(&key)).map_err(map_scaffold_error)? {
            let updated = views
                .repository()
                .update(session, &key, form.values())
                .map_err(map_scaffold_error)?;
            return build_redirect(&views.success_url(&updated));
        }

        tracing::debug!(entity = %views.entity().name(), key = %key, errors = ?form.errors(), "Edit form rejected");
        let context = ViewContext::new(&views, ViewKind::Update)
            .with_form(form.view())
            .with_entity(&record);
        render(state, &context, StatusCode::UNPROCESSABLE_ENTITY)
    })
    .await
}

/// Deletes a record and redirects to the list.
///
/// # Endpoint
/// `POST /{prefix}/{key}/delete`
///
/// # Errors
/// - 404 Not Found: no such record
/// - 409 Conflict: another record still references it
pub async fn delete(
    params: &MatchitParams<'_, '_>,
    views: Arc<EntityViews>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let key = record_key(params, &views)?;
    run_in_scope(state, move |session, state| {
        views
            .repository()
            .delete(session, &key)
            .map_err(map_scaffold_error)?;
        build_redirect(&views.list_url())
    })
    .await
}

/// Runs `f` in a request-scoped session on the blocking pool, since a
/// file-backed commit writes and syncs the snapshot file.
async fn run_in_scope<F>(state: AppState, f: F) -> Result<Response<Bytes>, RouterError>
where
    F: FnOnce(&mut Session, &AppState) -> Result<Response<Bytes>, RouterError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<Response<Bytes>, RouterError> {
        let mut scope = SessionScope::new(Arc::clone(&state.db));
        let result = f(scope.session(), &state);
        let teardown = scope.teardown(result.is_err());
        let response = result?;
        teardown.map_err(map_scaffold_error)?;
        Ok(response)
    })
    .await
    .map_err(|e| RouterError::InternalError(format!("Session task failed: {}", e)))?
}

fn record_key(
    params: &MatchitParams<'_, '_>,
    views: &EntityViews,
) -> Result<RecordKey, RouterError> {
    let raw = params
        .get("key")
        .ok_or_else(|| RouterError::BadRequest("Missing record key".to_string()))?;
    views
        .parse_key(raw)
        .ok_or_else(|| RouterError::NotFound(format!("{}[{}] not found", views.entity().name(), raw)))
}

async fn read_form<B>(req: Request<B>, state: &AppState) -> Result<FormData, RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let (headers, body) = read_request_body_with_timeout(req, &state.config).await?;
    parse_form_data(&headers, &body)
}

fn render(
    state: &AppState,
    context: &ViewContext,
    status: StatusCode,
) -> Result<Response<Bytes>, RouterError> {
    let body = state.renderer.render(context)?;
    build_response(status, state.renderer.content_type(), body)
}
