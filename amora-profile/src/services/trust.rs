//! Likes, blocks and complaints between profiles, and the complaint-volume
//! auto-moderation rule.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use amora_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Like, NewComplaint, Profile};
use crate::repository::{ComplaintRecord, ProfileRepository, TrustRepository};
use crate::services::profile_service::ensure_active;

/// Complaints in one calendar month above which a profile is suspended.
pub const COMPLAINTS_PER_MONTH_LIMIT: i64 = 1;

fn reject_self(actor_id: Uuid, target_id: Uuid) -> AppResult<()> {
    if actor_id == target_id {
        return Err(AppError::new(ErrorCode::CannotTargetSelf, "cannot target your own profile"));
    }
    Ok(())
}

fn load_target<S>(store: &S, target_id: Uuid) -> AppResult<Profile>
where
    S: ProfileRepository + ?Sized,
{
    store.find_profile(target_id)?.ok_or_else(AppError::profile_not_found)
}

fn edge_blocked<S>(store: &S, from: Uuid, to: Uuid) -> AppResult<bool>
where
    S: TrustRepository + ?Sized,
{
    Ok(store.find_block(from, to)?.is_some_and(|b| b.is_blocked))
}

/// Whether `target` may appear to `viewer`: alive, not suspended, and not
/// blocked by the viewer.
pub fn is_visible_to<S>(store: &S, viewer_id: Uuid, target: &Profile) -> AppResult<bool>
where
    S: TrustRepository + ?Sized,
{
    if target.is_deleted || target.is_blocked || target.id == viewer_id {
        return Ok(false);
    }
    Ok(!edge_blocked(store, viewer_id, target.id)?)
}

pub fn like<S>(store: &S, liker: &Profile, liked_id: Uuid, now: DateTime<Utc>) -> AppResult<Like>
where
    S: ProfileRepository + TrustRepository + ?Sized,
{
    ensure_active(liker)?;
    reject_self(liker.id, liked_id)?;

    let target = load_target(store, liked_id)?;
    ensure_active(&target)?;
    if !is_visible_to(store, liker.id, &target)? || edge_blocked(store, target.id, liker.id)? {
        return Err(AppError::new(ErrorCode::ProfileBlocked, "profile is blocked for this account"));
    }

    let edge = store.upsert_like(liker.id, target.id, true, now)?;
    tracing::info!(like_id = %edge.id, liker_id = %liker.id, liked_id = %target.id, "like recorded");
    Ok(edge)
}

/// Withdraws a like. The edge is kept with `is_liked = false`.
pub fn unlike<S>(store: &S, actor: &Profile, like_id: Uuid, now: DateTime<Utc>) -> AppResult<Like>
where
    S: TrustRepository + ?Sized,
{
    let edge = store
        .find_like_by_id(like_id)?
        .ok_or_else(|| AppError::new(ErrorCode::LikeNotFound, "like not found"))?;

    if edge.profile_id != actor.id {
        return Err(AppError::forbidden("only the liking profile can withdraw a like"));
    }

    let edge = store.upsert_like(edge.profile_id, edge.liked_profile_id, false, now)?;
    tracing::info!(like_id = %edge.id, "like withdrawn");
    Ok(edge)
}

pub fn like_status_for<S>(store: &S, viewer_id: Uuid, target_id: Uuid) -> AppResult<Option<Like>>
where
    S: TrustRepository + ?Sized,
{
    store.find_like(viewer_id, target_id)
}

/// Blocks in both directions. Both edges are written or neither is.
pub fn block<S>(store: &S, blocker: &Profile, blocked_id: Uuid, now: DateTime<Utc>) -> AppResult<()>
where
    S: ProfileRepository + TrustRepository + ?Sized,
{
    ensure_active(blocker)?;
    reject_self(blocker.id, blocked_id)?;
    let target = load_target(store, blocked_id)?;

    store.block_mutual(blocker.id, target.id, now)?;
    tracing::info!(blocker_id = %blocker.id, blocked_id = %target.id, "mutual block recorded");
    Ok(())
}

pub fn month_start(now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::internal("failed to compute start of month"))
}

/// Records a complaint, hides the accused from the complainant, and
/// suspends the accused once monthly complaints exceed the limit.
pub fn file_complaint<S>(
    store: &S,
    complaining: &Profile,
    accused_id: Uuid,
    reason: String,
    now: DateTime<Utc>,
) -> AppResult<ComplaintRecord>
where
    S: ProfileRepository + TrustRepository + ?Sized,
{
    ensure_active(complaining)?;
    reject_self(complaining.id, accused_id)?;
    let accused = load_target(store, accused_id)?;

    let outcome = store.record_complaint(
        NewComplaint {
            id: Uuid::now_v7(),
            profile_id: complaining.id,
            accused_profile_id: accused.id,
            reason,
            created_at: now,
        },
        month_start(now)?,
        COMPLAINTS_PER_MONTH_LIMIT,
    )?;
    metrics::counter!("complaints_filed_total").increment(1);

    if outcome.accused_suspended {
        metrics::counter!("profiles_auto_blocked_total").increment(1);
        tracing::warn!(
            profile_id = %accused.id,
            complaints_this_month = outcome.complaints_this_month,
            "profile auto-blocked by complaint volume"
        );
    }

    tracing::info!(
        complaint_id = %outcome.complaint.id,
        complaining_id = %complaining.id,
        accused_id = %accused.id,
        "complaint filed"
    );

    Ok(outcome)
}
