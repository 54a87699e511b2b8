use crate::commands::{with_database, CommandFailure, CommandResult};
use clientele_db::migrations::{self, MigrationError};

/// Applies every pending migration, or only those up to `target`.
pub fn run(target: Option<i64>) -> CommandResult {
    let result = with_database("migrate", |pool| async move {
        let newly_applied = match target {
            Some(target) => Some(migrations::run_to(&pool, target).await.map_err(classify)?),
            None => {
                migrations::run_pending(&pool)
                    .await
                    .map_err(|error| classify(MigrationError::Migrate(error)))?;
                None
            }
        };
        let applied = migrations::applied_versions(&pool).await.map_err(classify)?;
        Ok::<_, CommandFailure>((newly_applied, applied))
    });

    match result {
        Ok((None, applied)) => CommandResult::success(
            "migrate",
            format!("applied pending migrations; schema at {}", describe_head(&applied)),
        ),
        Ok((Some(newly_applied), applied)) if newly_applied.is_empty() => CommandResult::success(
            "migrate",
            format!("nothing to apply; schema at {}", describe_head(&applied)),
        ),
        Ok((Some(newly_applied), applied)) => {
            let versions =
                newly_applied.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success(
                "migrate",
                format!("applied {versions}; schema at {}", describe_head(&applied)),
            )
        }
        Err(failure) => failure,
    }
}

pub(crate) fn describe_head(applied: &[i64]) -> String {
    applied
        .last()
        .map(|version| format!("version {version}"))
        .unwrap_or_else(|| "version 0".to_string())
}

pub(crate) fn classify(error: MigrationError) -> CommandFailure {
    match error {
        MigrationError::UnknownVersion(_) => ("invalid_target", error.to_string(), 6),
        MigrationError::Migrate(_) => ("migration", error.to_string(), 5),
    }
}
