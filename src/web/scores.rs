use actix::prelude::*;
use actix_web::{web, HttpResponse};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::catalog::find_race;
use crate::error::Error;
use crate::leaderboard::{
    filter_options, leaderboard, monthly_leaderboard, race_standings, FilterOptions,
    LeaderboardFilter, RaceStanding, Standing,
};
use crate::models::{Race, RaceResult};
use crate::results::find_result;
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::error::ApiError;

struct FetchLeaderboard {
    filter: LeaderboardFilter,
}

impl Message for FetchLeaderboard {
    type Result = Result<Vec<Standing>, Error>;
}

impl Handler<FetchLeaderboard> for DbExecutor {
    type Result = Result<Vec<Standing>, Error>;

    fn handle(&mut self, msg: FetchLeaderboard, _: &mut Self::Context) -> Self::Result {
        leaderboard(&mut self.connection, &msg.filter)
    }
}

pub async fn index(
    query: web::Query<LeaderboardFilter>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let standings = state
        .db
        .send(FetchLeaderboard {
            filter: query.into_inner(),
        })
        .await??;
    Ok(HttpResponse::Ok().json(standings))
}

#[derive(Deserialize, Debug)]
pub struct MonthlyQuery {
    year: Option<i32>,
    month: Option<u32>,
    limit: Option<usize>,
}

struct FetchMonthlyLeaderboard {
    year: i32,
    month: u32,
    limit: Option<usize>,
}

impl Message for FetchMonthlyLeaderboard {
    type Result = Result<Vec<Standing>, Error>;
}

impl Handler<FetchMonthlyLeaderboard> for DbExecutor {
    type Result = Result<Vec<Standing>, Error>;

    fn handle(&mut self, msg: FetchMonthlyLeaderboard, _: &mut Self::Context) -> Self::Result {
        monthly_leaderboard(&mut self.connection, msg.year, msg.month, msg.limit)
    }
}

pub async fn monthly(
    query: web::Query<MonthlyQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let today = state.now().date();
    let standings = state
        .db
        .send(FetchMonthlyLeaderboard {
            year: query.year.unwrap_or_else(|| today.year()),
            month: query.month.unwrap_or_else(|| today.month()),
            limit: query.limit,
        })
        .await??;
    Ok(HttpResponse::Ok().json(standings))
}

struct FetchFilterOptions;

impl Message for FetchFilterOptions {
    type Result = Result<FilterOptions, Error>;
}

impl Handler<FetchFilterOptions> for DbExecutor {
    type Result = Result<FilterOptions, Error>;

    fn handle(&mut self, _msg: FetchFilterOptions, _: &mut Self::Context) -> Self::Result {
        filter_options(&mut self.connection)
    }
}

pub async fn filters(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let options = state.db.send(FetchFilterOptions).await??;
    Ok(HttpResponse::Ok().json(options))
}

#[derive(Serialize)]
pub struct RaceResultPage {
    race: Race,
    result: RaceResult,
    standings: Vec<RaceStanding>,
}

struct FetchRaceResult {
    race_id: i32,
}

impl Message for FetchRaceResult {
    type Result = Result<RaceResultPage, Error>;
}

impl Handler<FetchRaceResult> for DbExecutor {
    type Result = Result<RaceResultPage, Error>;

    fn handle(&mut self, msg: FetchRaceResult, _: &mut Self::Context) -> Self::Result {
        let conn = &mut self.connection;

        let race = find_race(conn, msg.race_id)?;
        let result = find_result(conn, msg.race_id)?.ok_or(Error::ResultNotFound(msg.race_id))?;
        let standings = race_standings(conn, msg.race_id)?;

        Ok(RaceResultPage {
            race,
            result,
            standings,
        })
    }
}

pub async fn race_result(
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let page = state
        .db
        .send(FetchRaceResult {
            race_id: path.into_inner(),
        })
        .await??;
    Ok(HttpResponse::Ok().json(page))
}
