// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reward profile CRUD operations.
//!
//! Mission and badge sets are stored as JSON arrays; `last_checkin` as RFC 3339.

use chrono::{DateTime, SecondsFormat, Utc};
use questline_core::{QuestlineError, RewardProfile, WalletAddress};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

const SELECT_PROFILE: &str = "SELECT address, xp, level, last_checkin, completed_missions, badges
     FROM profiles WHERE address = ?1";

/// Get a profile by wallet address.
pub async fn get_profile(
    db: &Database,
    address: &WalletAddress,
) -> Result<Option<RewardProfile>, QuestlineError> {
    let address = address.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<RewardProfile>, rusqlite::Error> {
            conn.query_row(SELECT_PROFILE, params![address], profile_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a default profile if none exists, then return the stored row.
pub async fn get_or_create_profile(
    db: &Database,
    address: &WalletAddress,
) -> Result<RewardProfile, QuestlineError> {
    let address = address.0.clone();
    db.connection()
        .call(move |conn| -> Result<RewardProfile, rusqlite::Error> {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO profiles (address) VALUES (?1) ON CONFLICT(address) DO NOTHING",
                params![address],
            )?;
            if inserted > 0 {
                tracing::info!(address = %address, "created reward profile");
            }
            let profile = tx.query_row(SELECT_PROFILE, params![address], profile_from_row)?;
            tx.commit()?;
            Ok(profile)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite (or insert) a profile row.
pub async fn upsert_profile(db: &Database, profile: &RewardProfile) -> Result<(), QuestlineError> {
    let address = profile.address.0.clone();
    let xp = i64::try_from(profile.xp)
        .map_err(|_| QuestlineError::Internal(format!("xp {} exceeds storage range", profile.xp)))?;
    let level = i64::from(profile.level);
    let last_checkin = profile
        .last_checkin
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true));
    let missions = to_json(&profile.completed_missions)?;
    let badges = to_json(&profile.badges)?;

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO profiles (address, xp, level, last_checkin, completed_missions, badges)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(address) DO UPDATE SET
                     xp = excluded.xp,
                     level = excluded.level,
                     last_checkin = excluded.last_checkin,
                     completed_missions = excluded.completed_missions,
                     badges = excluded.badges,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![address, xp, level, last_checkin, missions, badges],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, QuestlineError> {
    serde_json::to_string(value).map_err(|e| QuestlineError::Storage {
        source: Box::new(e),
    })
}

fn profile_from_row(row: &Row<'_>) -> Result<RewardProfile, rusqlite::Error> {
    let xp: i64 = row.get(1)?;
    let level: i64 = row.get(2)?;
    let last_checkin: Option<String> = row.get(3)?;
    let missions: String = row.get(4)?;
    let badges: String = row.get(5)?;

    let last_checkin = last_checkin
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| conversion_error(3, e))
        })
        .transpose()?;

    Ok(RewardProfile {
        address: WalletAddress(row.get(0)?),
        xp: u64::try_from(xp).map_err(|e| conversion_error(1, e))?,
        level: u32::try_from(level).map_err(|e| conversion_error(2, e))?,
        last_checkin,
        completed_missions: serde_json::from_str(&missions).map_err(|e| conversion_error(4, e))?,
        badges: serde_json::from_str(&badges).map_err(|e| conversion_error(5, e))?,
    })
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}
