use async_trait::async_trait;
use berth_catalog::{ClassConfig, FareClass, RunningDay, Station, Train};
use berth_core::repository::{LedgerError, TrainRepository};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::backend_error;

pub struct PgTrainRepository {
    pool: PgPool,
}

impl PgTrainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TrainRow {
    id: Uuid,
    train_number: String,
    train_name: String,
    source: String,
    destination: String,
    stations: Json<Vec<Station>>,
    classes: Json<BTreeMap<FareClass, ClassConfig>>,
    running_days: Vec<String>,
    duration: String,
}

impl TryFrom<TrainRow> for Train {
    type Error = LedgerError;

    fn try_from(row: TrainRow) -> Result<Self, Self::Error> {
        let running_days = row
            .running_days
            .iter()
            .map(|day| day.parse::<RunningDay>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::Corrupt(format!("train {}: {}", row.train_number, e)))?;

        Ok(Train {
            id: row.id,
            train_number: row.train_number,
            train_name: row.train_name,
            source: row.source,
            destination: row.destination,
            stations: row.stations.0,
            classes: row.classes.0,
            running_days,
            duration: row.duration,
        })
    }
}

const TRAIN_COLUMNS: &str =
    "id, train_number, train_name, source, destination, stations, classes, running_days, duration";

#[async_trait]
impl TrainRepository for PgTrainRepository {
    async fn get_train(&self, id: Uuid) -> Result<Option<Train>, LedgerError> {
        let row: Option<TrainRow> = sqlx::query_as(&format!("SELECT {} FROM trains WHERE id = $1", TRAIN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?;

        row.map(Train::try_from).transpose()
    }

    async fn list_trains(&self) -> Result<Vec<Train>, LedgerError> {
        let rows: Vec<TrainRow> =
            sqlx::query_as(&format!("SELECT {} FROM trains ORDER BY train_number", TRAIN_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(backend_error)?;

        rows.into_iter().map(Train::try_from).collect()
    }

    async fn find_matching(
        &self,
        source: &str,
        destination: &str,
        day: RunningDay,
    ) -> Result<Vec<Train>, LedgerError> {
        // Route matching spans the stations JSON, so only the day is filtered in SQL.
        let rows: Vec<TrainRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trains WHERE $1 = ANY(running_days) ORDER BY train_number",
            TRAIN_COLUMNS
        ))
        .bind(day.name())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        let mut trains = Vec::new();
        for row in rows {
            let train = Train::try_from(row)?;
            if train.matches_origin(source) && train.matches_destination(destination) {
                trains.push(train);
            }
        }
        Ok(trains)
    }

    async fn insert_train(&self, train: &Train) -> Result<(), LedgerError> {
        let running_days: Vec<&str> = train.running_days.iter().map(|d| d.name()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO trains (id, train_number, train_name, source, destination, stations, classes, running_days, duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(train.id)
        .bind(&train.train_number)
        .bind(&train.train_name)
        .bind(&train.source)
        .bind(&train.destination)
        .bind(Json(&train.stations))
        .bind(Json(&train.classes))
        .bind(&running_days)
        .bind(&train.duration)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => match db.constraint() {
                Some("trains_pkey") => Err(LedgerError::DuplicateTrain(train.id.to_string())),
                _ => Err(LedgerError::DuplicateTrain(train.train_number.clone())),
            },
            Err(e) => Err(backend_error(e)),
        }
    }
}
