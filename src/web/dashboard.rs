use actix::prelude::*;
use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::accounts::{prediction_history, HistoryEntry};
use crate::error::Error;
use crate::leaderboard::{personal_summary, Standing};
use crate::models::User;
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::auth::CurrentUser;
use crate::web::error::ApiError;

#[derive(Serialize)]
pub struct DashboardData {
    current_user: User,
    summary: Option<Standing>,
    history: Vec<HistoryEntry>,
}

struct FetchDataForDashboard {
    current_user: User,
}

impl Message for FetchDataForDashboard {
    type Result = Result<DashboardData, Error>;
}

impl Handler<FetchDataForDashboard> for DbExecutor {
    type Result = Result<DashboardData, Error>;

    fn handle(&mut self, msg: FetchDataForDashboard, _: &mut Self::Context) -> Self::Result {
        let username = msg.current_user.username.clone();
        Ok(DashboardData {
            summary: personal_summary(&mut self.connection, &username)?,
            history: prediction_history(&mut self.connection, &username)?,
            current_user: msg.current_user,
        })
    }
}

/// The signed-in user's totals and prediction history.
pub async fn index(auth: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let data = state
        .db
        .send(FetchDataForDashboard {
            current_user: auth.current_user,
        })
        .await??;
    Ok(HttpResponse::Ok().json(data))
}
