use sqlx::{Sqlite, SqlitePool, Transaction};

/// Open a write unit of work that holds SQLite's write lock from its first statement.
///
/// `pool.begin()` issues a deferred `BEGIN`: the first read pins a WAL snapshot and a later
/// write fails with `SQLITE_BUSY_SNAPSHOT` if another connection committed in between. Here
/// the empty deferred transaction is ended on the spot and replaced with `BEGIN IMMEDIATE`,
/// so concurrent writers queue on the busy timeout and every read inside the unit sees the
/// rows its predecessors committed. The returned `Transaction` still owns commit, rollback
/// and rollback-on-drop.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // No statement has run yet, so this COMMIT releases nothing.
    sqlx::query("COMMIT").execute(&mut *tx).await?;

    if let Err(err) = sqlx::query("BEGIN IMMEDIATE").execute(&mut *tx).await {
        // Put a transaction back so the drop-time ROLLBACK matches sqlx's bookkeeping.
        if let Err(restore) = sqlx::query("BEGIN").execute(&mut *tx).await {
            tracing::error!("Failed to restore transaction after BEGIN IMMEDIATE error: {}", restore);
        }
        return Err(err);
    }

    Ok(tx)
}
