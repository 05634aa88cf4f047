//! Daily commit cadence decision logic.
//!
//! Purely a decision function over settings, the calendar, and commit
//! history. Gateway failures degrade to "do not enforce": a broken repo
//! must never freeze the workflow, so errors are swallowed here and only
//! logged at debug level.

use chrono::NaiveDate;
use tracing::debug;

use crate::config::CadenceConfig;
use crate::dates::is_workday;
use crate::git::VersionControlGateway;

/// Decide whether work should be blocked because nothing was committed.
///
/// Rules, in order:
/// 1. disabled check never forces;
/// 2. a non-repository never forces;
/// 3. under `workdays_only`, weekends never force (evaluated on *today*);
/// 4. otherwise force iff yesterday had no commit, where under
///    `workdays_only` a weekend yesterday counts as satisfied (evaluated
///    on *yesterday* — a commit-free Sunday never blocks Monday).
pub fn should_force_commit(
    today: NaiveDate,
    settings: &CadenceConfig,
    gateway: &dyn VersionControlGateway,
) -> bool {
    if !settings.check_enabled {
        return false;
    }

    if !gateway.is_repository().unwrap_or(false) {
        return false;
    }

    if settings.workdays_only && !is_workday(today) {
        return false;
    }

    !has_commit_yesterday(today, settings, gateway)
}

/// Whether yesterday's cadence requirement is satisfied.
pub fn has_commit_yesterday(
    today: NaiveDate,
    settings: &CadenceConfig,
    gateway: &dyn VersionControlGateway,
) -> bool {
    let Some(yesterday) = today.pred_opt() else {
        return true;
    };

    if settings.workdays_only && !is_workday(yesterday) {
        return true;
    }

    match gateway.commits_on_date(yesterday) {
        Ok(commits) => !commits.is_empty(),
        Err(e) => {
            debug!(error = %e, %yesterday, "Commit query failed, treating cadence as satisfied");
            true
        }
    }
}
