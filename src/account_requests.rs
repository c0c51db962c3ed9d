use actix_web::http::StatusCode;
use actix_web::web::{block, Data, Form, ServiceConfig};
use actix_web::{get, post, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::AccountError;
use crate::store::AccountStore;

#[derive(Serialize, Deserialize)]
pub struct RegisterParams {
    username: String,
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginParams {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for AccountError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::DuplicateAccount => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage { .. } | Self::Hashing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "account request failed");
            "the account service is unavailable".to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody {
            error: self.code(),
            message,
        })
    }
}

/// Run a store call on the blocking thread pool.
async fn run<T, F>(store: Data<AccountStore>, f: F) -> Result<T, AccountError>
where
    F: FnOnce(&AccountStore) -> Result<T, AccountError> + Send + 'static,
    T: Send + 'static,
{
    block(move || f(&store))
        .await
        .map_err(|err| AccountError::unavailable(err.to_string()))?
}

#[post("/register")]
pub async fn create_account(
    store: Data<AccountStore>,
    params: Form<RegisterParams>,
) -> Result<HttpResponse, AccountError> {
    let RegisterParams {
        username,
        email,
        password,
    } = params.into_inner();

    let account = run(store, move |store| {
        store.register(username.trim(), email.trim(), &password)
    })
    .await?;

    Ok(HttpResponse::Created().json(account))
}

#[post("/login")]
pub async fn login_request(
    store: Data<AccountStore>,
    params: Form<LoginParams>,
) -> Result<HttpResponse, AccountError> {
    let LoginParams { username, password } = params.into_inner();

    let account = run(store, move |store| {
        store.authenticate(username.trim(), &password)
    })
    .await?;

    Ok(HttpResponse::Ok().json(account))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(Health { status: "ok" })
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(create_account)
        .service(login_request)
        .service(health);
}
