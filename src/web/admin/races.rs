use actix::prelude::*;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::catalog::{delete_race, insert_races};
use crate::entries::{replace_entries, replace_provisional_entries};
use crate::error::Error;
use crate::models::{Entrant, NewEntrant, NewRace, ProvisionalEntrant, Race};
use crate::web::app_state::{AppState, DbExecutor};
use crate::web::auth::CurrentUser;
use crate::web::error::ApiError;

struct CreateRaces {
    races: Vec<NewRace>,
}

impl Message for CreateRaces {
    type Result = Result<Vec<Race>, Error>;
}

impl Handler<CreateRaces> for DbExecutor {
    type Result = Result<Vec<Race>, Error>;

    fn handle(&mut self, msg: CreateRaces, _: &mut Self::Context) -> Self::Result {
        insert_races(&mut self.connection, &msg.races)
    }
}

pub async fn create(
    auth: CurrentUser,
    form: web::Json<Vec<NewRace>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let races = state
        .db
        .send(CreateRaces {
            races: form.into_inner(),
        })
        .await??;

    state.backup_after_write(true);
    Ok(HttpResponse::Created().json(races))
}

struct DeleteRace {
    race_id: i32,
}

impl Message for DeleteRace {
    type Result = Result<(), Error>;
}

impl Handler<DeleteRace> for DbExecutor {
    type Result = Result<(), Error>;

    fn handle(&mut self, msg: DeleteRace, _: &mut Self::Context) -> Self::Result {
        delete_race(&mut self.connection, msg.race_id)
    }
}

pub async fn delete(
    auth: CurrentUser,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    state
        .db
        .send(DeleteRace {
            race_id: path.into_inner(),
        })
        .await??;

    state.backup_after_write(true);
    Ok(HttpResponse::NoContent().finish())
}

/// A new entry list. The provisional list is just horse names in draw order.
#[derive(Deserialize, Debug)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EntryListForm {
    Provisional { horses: Vec<String> },
    Confirmed { entrants: Vec<NewEntrant> },
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum SavedEntries {
    Provisional(Vec<ProvisionalEntrant>),
    Confirmed(Vec<Entrant>),
}

struct ReplaceEntries {
    race_id: i32,
    form: EntryListForm,
}

impl Message for ReplaceEntries {
    type Result = Result<SavedEntries, Error>;
}

impl Handler<ReplaceEntries> for DbExecutor {
    type Result = Result<SavedEntries, Error>;

    fn handle(&mut self, msg: ReplaceEntries, _: &mut Self::Context) -> Self::Result {
        match msg.form {
            EntryListForm::Provisional { horses } => Ok(SavedEntries::Provisional(
                replace_provisional_entries(&mut self.connection, msg.race_id, &horses)?,
            )),
            EntryListForm::Confirmed { entrants } => Ok(SavedEntries::Confirmed(
                replace_entries(&mut self.connection, msg.race_id, &entrants)?,
            )),
        }
    }
}

pub async fn update_entries(
    auth: CurrentUser,
    path: web::Path<i32>,
    form: web::Json<EntryListForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let saved = state
        .db
        .send(ReplaceEntries {
            race_id: path.into_inner(),
            form: form.into_inner(),
        })
        .await??;

    state.backup_after_write(true);
    Ok(HttpResponse::Ok().json(saved))
}
