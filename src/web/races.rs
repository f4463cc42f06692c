use std::collections::BTreeMap;

use actix::prelude::*;
use actix_web::{web, HttpResponse};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{races_in_month, races_in_week};
use crate::entries::{display_entries, EntryListing};
use crate::error::Error;
use crate::models::Race;
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::error::ApiError;

#[derive(Deserialize, Debug, Default)]
pub struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

#[derive(Serialize)]
struct Calendar {
    year: i32,
    month: u32,
    days: BTreeMap<u32, Vec<Race>>,
}

struct FetchMonth {
    year: i32,
    month: u32,
}

impl Message for FetchMonth {
    type Result = Result<BTreeMap<u32, Vec<Race>>, Error>;
}

impl Handler<FetchMonth> for DbExecutor {
    type Result = Result<BTreeMap<u32, Vec<Race>>, Error>;

    fn handle(&mut self, msg: FetchMonth, _: &mut Self::Context) -> Self::Result {
        races_in_month(&mut self.connection, msg.year, msg.month)
    }
}

/// Races of a month grouped by day; defaults to the current month.
pub async fn month(
    query: web::Query<MonthQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let today = state.now().date();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let days = state.db.send(FetchMonth { year, month }).await??;
    Ok(HttpResponse::Ok().json(Calendar { year, month, days }))
}

struct FetchWeek {
    today: NaiveDate,
}

impl Message for FetchWeek {
    type Result = Result<Vec<Race>, Error>;
}

impl Handler<FetchWeek> for DbExecutor {
    type Result = Result<Vec<Race>, Error>;

    fn handle(&mut self, msg: FetchWeek, _: &mut Self::Context) -> Self::Result {
        races_in_week(&mut self.connection, msg.today)
    }
}

pub async fn week(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let today = state.now().date();
    let races = state.db.send(FetchWeek { today }).await??;
    Ok(HttpResponse::Ok().json(races))
}

struct FetchEntries {
    race_id: i32,
    now: NaiveDateTime,
}

impl Message for FetchEntries {
    type Result = Result<EntryListing, Error>;
}

impl Handler<FetchEntries> for DbExecutor {
    type Result = Result<EntryListing, Error>;

    fn handle(&mut self, msg: FetchEntries, _: &mut Self::Context) -> Self::Result {
        display_entries(&mut self.connection, msg.race_id, msg.now)
    }
}

pub async fn entries(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let listing = state
        .db
        .send(FetchEntries {
            race_id: path.into_inner(),
            now: state.now(),
        })
        .await??;
    Ok(HttpResponse::Ok().json(listing))
}
