use actix::prelude::*;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::Error;
use crate::models::RaceResult;
use crate::scoring::{record_result, ScoreReport};
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::auth::CurrentUser;
use crate::web::error::ApiError;

#[derive(Deserialize, Debug, Clone)]
pub struct RaceResultForm {
    first_place: String,
    second_place: String,
    third_place: String,
    #[serde(default)]
    fourth_place: String,
    #[serde(default)]
    fifth_place: String,
    odds_first: Option<f64>,
    odds_second: Option<f64>,
    odds_third: Option<f64>,
}

impl RaceResultForm {
    fn into_result(self, race_id: i32) -> RaceResult {
        RaceResult {
            race_id,
            first_place: self.first_place,
            second_place: self.second_place,
            third_place: self.third_place,
            fourth_place: self.fourth_place,
            fifth_place: self.fifth_place,
            odds_first: self.odds_first,
            odds_second: self.odds_second,
            odds_third: self.odds_third,
        }
    }
}

struct RecordRaceResult {
    result: RaceResult,
}

impl Message for RecordRaceResult {
    type Result = Result<ScoreReport, Error>;
}

impl Handler<RecordRaceResult> for DbExecutor {
    type Result = Result<ScoreReport, Error>;

    fn handle(&mut self, msg: RecordRaceResult, _: &mut Self::Context) -> Self::Result {
        record_result(&mut self.connection, &msg.result)
    }
}

/// Stores the official result and scores the race. Odds problems come back
/// as warnings in the report rather than as an error.
pub async fn update(
    auth: CurrentUser,
    path: web::Path<i32>,
    form: web::Json<RaceResultForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let result = form.into_inner().into_result(path.into_inner());
    let report = state.db.send(RecordRaceResult { result }).await??;

    state.backup_after_write(true);
    Ok(HttpResponse::Ok().json(report))
}
