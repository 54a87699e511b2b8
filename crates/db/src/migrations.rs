use std::collections::HashSet;

use sqlx::migrate::{Migrate, MigrateError, Migrator};
use thiserror::Error;

use crate::DbPool;

/// Ordered, reversible migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Migrate(#[from] MigrateError),
    #[error("unknown migration version {0}")]
    UnknownVersion(i64),
}

impl From<sqlx::Error> for MigrationError {
    fn from(error: sqlx::Error) -> Self {
        Self::Migrate(MigrateError::Execute(error))
    }
}

/// Versions of the embedded forward migrations, ascending.
pub fn known_versions() -> impl Iterator<Item = i64> {
    MIGRATOR
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .map(|migration| migration.version)
}

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Applies the not-yet-applied forward migrations up to and including
/// `target`. Returns the newly applied versions, oldest first.
pub async fn run_to(pool: &DbPool, target: i64) -> Result<Vec<i64>, MigrationError> {
    if !known_versions().any(|version| version == target) {
        return Err(MigrationError::UnknownVersion(target));
    }

    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    if let Some(version) = conn.dirty_version().await? {
        return Err(MigrateError::Dirty(version).into());
    }

    let applied: HashSet<i64> =
        conn.list_applied_migrations().await?.into_iter().map(|migration| migration.version).collect();

    let mut newly_applied = Vec::new();
    for migration in MIGRATOR.iter().filter(|migration| {
        !migration.migration_type.is_down_migration() && migration.version <= target
    }) {
        if applied.contains(&migration.version) {
            continue;
        }
        conn.apply(migration).await?;
        newly_applied.push(migration.version);
    }

    Ok(newly_applied)
}

/// Versions recorded as successfully applied, ascending.
pub async fn applied_versions(pool: &DbPool) -> Result<Vec<i64>, MigrationError> {
    let (tracked,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok(Vec::new());
    }

    let versions = sqlx::query_scalar::<_, i64>(
        "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(versions)
}

/// Reverts the most recently applied migration. Returns its version, or
/// `None` when nothing is applied.
pub async fn rollback_last(pool: &DbPool) -> Result<Option<i64>, MigrationError> {
    let applied = applied_versions(pool).await?;
    let Some((&last, earlier)) = applied.split_last() else {
        return Ok(None);
    };

    let target = earlier.last().copied().unwrap_or(0);
    MIGRATOR.undo(pool, target).await?;
    Ok(Some(last))
}

/// Reverts every applied migration newer than `target`; `0` reverts all.
/// Returns the reverted versions, newest first.
pub async fn rollback_to(pool: &DbPool, target: i64) -> Result<Vec<i64>, MigrationError> {
    let known = target == 0 || known_versions().any(|version| version == target);
    if !known {
        return Err(MigrationError::UnknownVersion(target));
    }

    let applied = applied_versions(pool).await?;
    MIGRATOR.undo(pool, target).await?;
    Ok(applied.into_iter().rev().filter(|version| *version > target).collect())
}
