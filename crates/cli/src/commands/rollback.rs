use crate::commands::migrate::{classify, describe_head};
use crate::commands::{with_database, CommandFailure, CommandResult};
use clientele_db::migrations;

pub fn run(target: Option<i64>) -> CommandResult {
    let result = with_database("rollback", |pool| async move {
        let reverted = match target {
            Some(target) => migrations::rollback_to(&pool, target).await.map_err(classify)?,
            None => migrations::rollback_last(&pool).await.map_err(classify)?.into_iter().collect(),
        };
        let applied = migrations::applied_versions(&pool).await.map_err(classify)?;
        Ok::<_, CommandFailure>((reverted, applied))
    });

    match result {
        Ok((reverted, applied)) if reverted.is_empty() => CommandResult::success(
            "rollback",
            format!("nothing to revert; schema at {}", describe_head(&applied)),
        ),
        Ok((reverted, applied)) => {
            let versions =
                reverted.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success(
                "rollback",
                format!("reverted {versions}; schema at {}", describe_head(&applied)),
            )
        }
        Err(failure) => failure,
    }
}
