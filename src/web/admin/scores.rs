use actix::prelude::*;
use actix_web::{web, HttpResponse};

use crate::error::Error;
use crate::scoring::{rescore_all, ScoreReport};
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::auth::CurrentUser;
use crate::web::error::ApiError;

struct RecalculateScores;

impl Message for RecalculateScores {
    type Result = Result<Vec<ScoreReport>, Error>;
}

impl Handler<RecalculateScores> for DbExecutor {
    type Result = Result<Vec<ScoreReport>, Error>;

    fn handle(&mut self, _msg: RecalculateScores, _ctx: &mut Self::Context) -> Self::Result {
        rescore_all(&mut self.connection)
    }
}

pub async fn recalculate(
    auth: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let reports = state.db.send(RecalculateScores).await??;

    state.backup_after_write(true);
    Ok(HttpResponse::Ok().json(reports))
}
