// storefront/src/db/postgres/journal.rs

//! `StepJournal` over the `shipment_progress` table.

use async_trait::async_trait;
use sqlx::PgPool;
use stepflow::{FlowError, RunOutcome, RunProgress, StepJournal};
use tracing::{debug, warn};

/// A claim older than this is treated as abandoned by a crashed worker.
const STALE_CLAIM_SECS: f64 = 600.0;

#[derive(Debug, Clone)]
pub struct PgShipmentJournal {
  pool: PgPool,
}

impl PgShipmentJournal {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl StepJournal for PgShipmentJournal {
  async fn claim(&self, run_key: &str) -> Result<RunProgress, FlowError> {
    let claimed: Option<(Option<String>,)> = sqlx::query_as(
      "INSERT INTO shipment_progress (run_key, in_progress, claimed_at, updated_at) \
       VALUES ($1, TRUE, now(), now()) \
       ON CONFLICT (run_key) DO UPDATE SET in_progress = TRUE, claimed_at = now(), updated_at = now() \
       WHERE NOT shipment_progress.in_progress \
          OR shipment_progress.claimed_at < now() - make_interval(secs => $2) \
       RETURNING last_completed_step",
    )
    .bind(run_key)
    .bind(STALE_CLAIM_SECS)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| FlowError::journal(run_key, "claim", e))?;

    match claimed {
      Some((last_completed_step,)) => {
        debug!(run_key = %run_key, last_completed_step = ?last_completed_step, "Shipment run claimed.");
        Ok(RunProgress { last_completed_step })
      }
      None => Err(FlowError::RunInProgress {
        run_key: run_key.to_string(),
      }),
    }
  }

  async fn record_step(&self, run_key: &str, step_name: &str, idempotency_key: &str) -> Result<(), FlowError> {
    let updated = sqlx::query(
      "UPDATE shipment_progress SET last_completed_step = $2, \
       step_keys = step_keys || jsonb_build_array($3::text), updated_at = now() \
       WHERE run_key = $1 AND in_progress",
    )
    .bind(run_key)
    .bind(step_name)
    .bind(idempotency_key)
    .execute(&self.pool)
    .await
    .map_err(|e| FlowError::journal(run_key, "record_step", e))?;
    if updated.rows_affected() == 0 {
      return Err(FlowError::Internal(format!("record_step for unclaimed run '{}'", run_key)));
    }
    Ok(())
  }

  async fn release(&self, run_key: &str, outcome: RunOutcome) -> Result<(), FlowError> {
    let updated = sqlx::query(
      "UPDATE shipment_progress SET in_progress = FALSE, last_outcome = $2, updated_at = now() WHERE run_key = $1",
    )
    .bind(run_key)
    .bind(outcome.as_str())
    .execute(&self.pool)
    .await
    .map_err(|e| FlowError::journal(run_key, "release", e))?;
    if updated.rows_affected() == 0 {
      warn!(run_key = %run_key, "Released a shipment run that has no progress row.");
    }
    Ok(())
  }
}
