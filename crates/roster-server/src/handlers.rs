//! Request handlers.

use std::sync::{Arc, OnceLock};

use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use roster_core::{AccountForm, Error, UploadedFile};

use crate::server::AppState;
use crate::views::Views;

const LISTING: &str = "/accounts";

/// Error wrapper that renders a [`roster_core::Error`] as an HTML page.
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::MalformedForm { .. } => StatusCode::BAD_REQUEST,
            Error::Upload { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Templates for error pages, which are rendered without access to the
/// router state.
fn error_views() -> &'static Views {
    static VIEWS: OnceLock<Views> = OnceLock::new();
    VIEWS.get_or_init(Views::new)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        } else {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        }

        let message = self.0.to_string();
        match error_views().error_page(status.as_u16(), &message) {
            Ok(page) => (status, Html(page)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to render error page");
                (status, message).into_response()
            }
        }
    }
}

type HandlerResult<T> = std::result::Result<T, AppError>;

/// Body of the content edit form.
#[derive(Debug, Default, Deserialize)]
pub struct ContentForm {
    /// New bio text.
    #[serde(default)]
    pub content: String,
}

/// `_method` override sent by HTML forms, plus the edit form's content.
#[derive(Debug, Default, Deserialize)]
pub struct MethodOverride {
    /// Requested method, `PATCH` or `DELETE`.
    #[serde(rename = "_method")]
    pub method: Option<String>,
    /// New bio text, for `PATCH`.
    pub content: Option<String>,
}

pub(crate) async fn root() -> Redirect {
    Redirect::to(LISTING)
}

pub(crate) async fn index(State(state): State<Arc<AppState>>) -> HandlerResult<Html<String>> {
    let accounts = state.store.list().await?;
    Ok(Html(state.views.index(&accounts)?))
}

pub(crate) async fn new_account(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Html<String>> {
    Ok(Html(state.views.new_account(None, &AccountForm::default())?))
}

/// Splits a multipart body into the text fields and the optional picture.
async fn read_account_form(
    mut multipart: Multipart,
) -> HandlerResult<(AccountForm, Option<UploadedFile>)> {
    let mut form = AccountForm::default();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "profile_pic" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            let upload = UploadedFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            };
            if !upload.is_empty() {
                file = Some(upload);
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set(&name, value);
        }
    }

    Ok((form, file))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError(Error::malformed_form(err.body_text()))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

/// Reads the creation form from a multipart body (with an optional picture)
/// or, for any other body, as a URL-encoded form without a picture.
async fn read_create_body(
    request: Request,
    state: &Arc<AppState>,
) -> HandlerResult<(AccountForm, Option<UploadedFile>)> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|rejection| AppError(Error::malformed_form(rejection.body_text())))?;
        read_account_form(multipart).await
    } else {
        let Form(form) = Form::<AccountForm>::from_request(request, state)
            .await
            .map_err(|rejection| AppError(Error::malformed_form(rejection.body_text())))?;
        Ok((form, None))
    }
}

pub(crate) async fn create(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> HandlerResult<Response> {
    let (form, file) = read_create_body(request, &state).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(err @ Error::Validation { .. }) => {
            tracing::debug!(error = %err, "Account form rejected");
            let page = state.views.new_account(Some(err.to_string().as_str()), &form)?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
        Err(err) => return Err(err.into()),
    };

    let profile_pic = match file {
        Some(file) => Some(state.uploader.upload(file).await?),
        None => None,
    };

    let account = state.store.create(fields, profile_pic).await?;
    tracing::info!(id = %account.id, username = %account.username, "Account created");

    Ok(Redirect::to(LISTING).into_response())
}

pub(crate) async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Response> {
    Ok(match state.store.find(&id).await? {
        Some(account) => Html(state.views.show(&account)?).into_response(),
        None => Redirect::to(LISTING).into_response(),
    })
}

pub(crate) async fn edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Response> {
    Ok(match state.store.find(&id).await? {
        Some(account) => Html(state.views.edit(&account)?).into_response(),
        None => Redirect::to(LISTING).into_response(),
    })
}

async fn apply_update(state: &AppState, id: &str, content: String) -> HandlerResult<Redirect> {
    if state.store.update_content(id, content).await? {
        tracing::info!(id = %id, "Account content updated");
    } else {
        tracing::debug!(id = %id, "Update for unknown account ignored");
    }
    Ok(Redirect::to(LISTING))
}

async fn apply_delete(state: &AppState, id: &str) -> HandlerResult<Redirect> {
    let removed = state.store.delete(id).await?;
    if removed > 0 {
        tracing::info!(id = %id, "Account deleted");
    } else {
        tracing::debug!(id = %id, "Delete for unknown account ignored");
    }
    Ok(Redirect::to(LISTING))
}

/// A body that is missing or not URL-encoded clears the content.
pub(crate) async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    form: std::result::Result<Form<ContentForm>, FormRejection>,
) -> HandlerResult<Redirect> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    apply_update(&state, &id, form.content).await
}

pub(crate) async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Redirect> {
    apply_delete(&state, &id).await
}

/// `POST /accounts/{id}` standing in for `PATCH` or `DELETE`.
///
/// The override is read from the query string first, then the form body.
pub(crate) async fn override_method(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<MethodOverride>,
    form: std::result::Result<Form<MethodOverride>, FormRejection>,
) -> HandlerResult<Redirect> {
    let body = form.map(|Form(body)| body).unwrap_or_default();
    let method = query
        .method
        .or(body.method)
        .unwrap_or_default()
        .to_ascii_uppercase();

    match method.as_str() {
        "PATCH" => apply_update(&state, &id, body.content.unwrap_or_default()).await,
        "DELETE" => apply_delete(&state, &id).await,
        other => {
            tracing::warn!(id = %id, method = %other, "Unsupported method override");
            Ok(Redirect::to(LISTING))
        }
    }
}
