use actix::prelude::*;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::LocalBoxFuture;
use serde::Deserialize;

use crate::accounts::{check_registration, create_account, find_user, hash_password, password_matches};
use crate::error::Error;
use crate::models::User;
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::error::ApiError;

/// The user behind the request's Basic credentials.
pub struct CurrentUser {
    pub current_user: User,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.current_user.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Splits an `Authorization: Basic ...` header value into username and password.
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

struct FetchCurrentUser {
    username: String,
}

impl Message for FetchCurrentUser {
    type Result = Result<Option<User>, Error>;
}

impl Handler<FetchCurrentUser> for DbExecutor {
    type Result = Result<Option<User>, Error>;

    fn handle(&mut self, msg: FetchCurrentUser, _: &mut Self::Context) -> Self::Result {
        find_user(&mut self.connection, &msg.username)
    }
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<CurrentUser, ApiError>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let credentials = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_credentials);

        Box::pin(authenticate(state, credentials))
    }
}

async fn authenticate(
    state: Option<web::Data<AppState>>,
    credentials: Option<(String, String)>,
) -> Result<CurrentUser, ApiError> {
    let (username, password) = credentials.ok_or(ApiError::Unauthorized)?;
    let state =
        state.ok_or_else(|| Error::Config("application state is not registered".to_string()))?;

    let user = state
        .db
        .send(FetchCurrentUser { username })
        .await??
        .ok_or(ApiError::Unauthorized)?;

    // bcrypt runs on the blocking pool, the executor only looks the user up
    let (current_user, matches) =
        web::block(move || password_matches(&user, &password).map(|matches| (user, matches)))
            .await??;
    if matches {
        Ok(CurrentUser { current_user })
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RegistrationForm {
    username: String,
    password: String,
}

struct CreateAccount {
    username: String,
    encrypted_password: String,
}

impl Message for CreateAccount {
    type Result = Result<User, Error>;
}

impl Handler<CreateAccount> for DbExecutor {
    type Result = Result<User, Error>;

    fn handle(&mut self, msg: CreateAccount, _: &mut Self::Context) -> Self::Result {
        create_account(&mut self.connection, &msg.username, &msg.encrypted_password)
    }
}

pub async fn perform_registration(
    form: web::Json<RegistrationForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();
    let cost = state.bcrypt_cost;
    let (username, encrypted_password) = web::block(move || -> Result<_, Error> {
        let username = check_registration(&form.username, &form.password)?.to_string();
        Ok((username, hash_password(&form.password, cost)?))
    })
    .await??;

    let user = state
        .db
        .send(CreateAccount {
            username,
            encrypted_password,
        })
        .await??;

    state.backup_after_write(false);
    Ok(HttpResponse::Created().json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn basic_credentials_are_decoded() {
        assert_eq!(
            parse_basic_credentials(&basic("taro:secret")),
            Some(("taro".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn passwords_may_contain_colons() {
        assert_eq!(
            parse_basic_credentials(&basic("taro:a:b")),
            Some(("taro".to_string(), "a:b".to_string()))
        );
    }

    #[test]
    fn malformed_headers_are_ignored() {
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
        assert_eq!(parse_basic_credentials("Basic !!!"), None);
        assert_eq!(parse_basic_credentials(&basic("no-colon")), None);
        assert_eq!(parse_basic_credentials(&basic(":secret")), None);
    }
}
