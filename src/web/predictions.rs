use actix::prelude::*;
use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::Error;
use crate::models::Prediction;
use crate::predictions::submit_prediction;
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::auth::CurrentUser;
use crate::web::error::ApiError;

#[derive(Deserialize, Debug, Clone)]
pub struct PredictionForm {
    honmeiba: String,
}

struct SubmitPrediction {
    race_id: i32,
    username: String,
    honmeiba: String,
    now: NaiveDateTime,
}

impl Message for SubmitPrediction {
    type Result = Result<Prediction, Error>;
}

impl Handler<SubmitPrediction> for DbExecutor {
    type Result = Result<Prediction, Error>;

    fn handle(&mut self, msg: SubmitPrediction, _: &mut Self::Context) -> Self::Result {
        submit_prediction(
            &mut self.connection,
            msg.race_id,
            &msg.username,
            &msg.honmeiba,
            msg.now,
        )
    }
}

pub async fn submit(
    auth: CurrentUser,
    path: web::Path<i32>,
    form: web::Json<PredictionForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let prediction = state
        .db
        .send(SubmitPrediction {
            race_id: path.into_inner(),
            username: auth.current_user.username,
            honmeiba: form.into_inner().honmeiba,
            now: state.now(),
        })
        .await??;

    state.backup_after_write(false);
    Ok(HttpResponse::Ok().json(prediction))
}
