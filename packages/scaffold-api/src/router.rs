//! Matchit routing configuration.

use std::error::Error as StdError;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use matchit::Router as MatchitRouter;
use scaffold_core::forms::FormSynthesizer;
use scaffold_core::store::Database;
use scaffold_core::ScaffoldError;

use crate::config::ApiConfig;
use crate::handlers::{self, view_handlers, MatchitParams};
use crate::render::{JsonRenderer, Renderer};
use crate::views::EntityViews;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<ApiConfig>,
    pub renderer: Arc<dyn Renderer>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    views: Vec<Arc<EntityViews>>,
    state: AppState,
}

impl Router {
    /// Creates a router with no views, rendering through [`JsonRenderer`].
    pub fn new(db: Arc<Database>, config: ApiConfig) -> Self {
        Self {
            inner: MatchitRouter::new(),
            views: Vec::new(),
            state: AppState {
                db,
                config: Arc::new(config),
                renderer: Arc::new(JsonRenderer),
            },
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.state.renderer = renderer;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn views(&self) -> &[Arc<EntityViews>] {
        &self.views
    }

    /// Adds the five CRUD routes of one record type.
    ///
    /// # Errors
    /// `Configuration` when a route collides with an already registered one.
    pub fn register(&mut self, views: EntityViews) -> Result<(), ScaffoldError> {
        let index = self.views.len();
        let routes = [
            ViewRoute::Collection,
            ViewRoute::New,
            ViewRoute::Item,
            ViewRoute::Edit,
            ViewRoute::Delete,
        ];

        for (pattern, route) in views.route_patterns().into_iter().zip(routes) {
            self.inner
                .insert(pattern.as_str(), RouteHandler { views: index, route })
                .map_err(|e| {
                    ScaffoldError::Configuration(format!("Failed to insert {} route: {}", pattern, e))
                })?;
        }

        tracing::info!(entity = %views.entity().name(), prefix = %views.prefix(), "Registered views");
        self.views.push(Arc::new(views));
        Ok(())
    }

    /// Registers default views for every record type of the database schema.
    pub fn register_all(&mut self, synthesizer: &FormSynthesizer) -> Result<(), ScaffoldError> {
        let schema = Arc::clone(self.state.db.schema());
        for entity in schema.entities() {
            self.register(EntityViews::new(&schema, entity.name(), synthesizer)?)?;
        }
        Ok(())
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let path = req.uri().path().to_string();

        match self.inner.at(&path) {
            Ok(matched) => {
                let handler = *matched.value;
                let views = self
                    .views
                    .get(handler.views)
                    .cloned()
                    .ok_or_else(|| RouterError::InternalError("Unknown view set".to_string()))?;
                handler
                    .route
                    .handle(req, &matched.params, views, self.state.clone())
                    .await
            }
            Err(_) => {
                let error_response = handlers::error_response(
                    404,
                    "Not Found".to_string(),
                    Some(format!("No route found for {}", path)),
                );
                let body = serde_json::to_vec(&error_response).map_err(|e| {
                    RouterError::InternalError(format!("Failed to serialize error response: {}", e))
                })?;
                handlers::build_response(StatusCode::NOT_FOUND, "application/json", Bytes::from(body))
            }
        }
    }

    /// Routes a request, turning routing errors into error responses.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match self.route(req).await {
            Ok(response) => response,
            Err(err) => {
                if matches!(err, RouterError::InternalError(_)) {
                    tracing::error!(%method, %path, error = %err, "Error handling request");
                } else {
                    tracing::debug!(%method, %path, error = %err, "Request rejected");
                }
                Response::from(err)
            }
        };
        tracing::debug!(%method, %path, status = response.status().as_u16(), "Handled request");
        response
    }
}

#[derive(Debug, Clone, Copy)]
struct RouteHandler {
    /// Index into `Router::views`
    views: usize,
    route: ViewRoute,
}

/// Route shapes registered per record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewRoute {
    /// `/p`
    Collection,
    /// `/p/new`
    New,
    /// `/p/{key}`
    Item,
    /// `/p/{key}/edit`
    Edit,
    /// `/p/{key}/delete`
    Delete,
}

impl ViewRoute {
    async fn handle<B>(
        self,
        req: Request<B>,
        params: &MatchitParams<'_, '_>,
        views: Arc<EntityViews>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let method = req.method().clone();
        match (self, method) {
            (ViewRoute::Collection, Method::GET) => view_handlers::list(views, state).await,
            (ViewRoute::New, Method::GET) => view_handlers::create_form(views, state).await,
            (ViewRoute::New, Method::POST) => view_handlers::create_submit(req, views, state).await,
            (ViewRoute::Item, Method::GET) => view_handlers::show(params, views, state).await,
            (ViewRoute::Edit, Method::GET) => view_handlers::update_form(params, views, state).await,
            (ViewRoute::Edit, Method::POST) => {
                view_handlers::update_submit(req, params, views, state).await
            }
            (ViewRoute::Delete, Method::POST) => view_handlers::delete(params, views, state).await,
            _ => Err(RouterError::MethodNotAllowed),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge,
}

impl RouterError {
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RouterError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouterError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::NotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Conflict(_) => StatusCode::CONFLICT,
            RouterError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            RouterError::PayloadTooLarge => write!(f, "Payload Too Large"),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let message = match &err {
            RouterError::InternalError(msg)
            | RouterError::BadRequest(msg)
            | RouterError::NotFound(msg)
            | RouterError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        };

        let error_response = handlers::error_response(status.as_u16(), message, None);
        let body = serde_json::to_vec(&error_response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}", e).into_bytes());

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = status;
        if let Ok(value) = "application/json".parse() {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}
