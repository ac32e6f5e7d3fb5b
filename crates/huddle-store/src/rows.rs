//! Column codecs shared by the row mappers.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use huddle_shared::{Email, ThreadId, Uid};
use rusqlite::types::Type;
use uuid::Uuid;

/// Timestamps are stored with fixed microsecond precision so that the
/// lexical order of the column matches chronological order.
pub(crate) fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Truncate to the precision the database keeps.
pub(crate) fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn conversion<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn ts_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

pub(crate) fn email_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Email> {
    let raw: String = row.get(idx)?;
    Email::parse(&raw).map_err(|e| conversion(idx, e))
}

pub(crate) fn uid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uid> {
    row.get::<_, String>(idx).map(Uid)
}

pub(crate) fn uuid_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion(idx, e))
}

pub(crate) fn thread_id_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<ThreadId> {
    uuid_at(row, idx).map(ThreadId)
}
