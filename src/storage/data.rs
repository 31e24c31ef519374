use chrono::{DateTime, Duration, Utc};
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::DataRecord;

impl Database {
    // ========================================================================
    // Generic data operations
    // ========================================================================

    /// Upsert a keyed value. `updated_at` is always later than the timestamp
    /// of the value it replaces, even if the clock has not moved.
    pub fn put_data(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<DataRecord, DatabaseError> {
        let write_txn = self.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(self.schema().data())?;
            let previous: Option<DataRecord> = table
                .get(key)?
                .map(|v| rmp_serde::from_slice(v.value()))
                .transpose()?;

            let record = DataRecord {
                key: key.to_string(),
                data: value,
                updated_at: next_timestamp(previous.map(|p| p.updated_at)),
            };
            let encoded = rmp_serde::to_vec_named(&record)?;
            table.insert(key, encoded.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Get the full record for a key
    pub fn get_data(&self, key: &str) -> Result<Option<DataRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(self.schema().data())?;

        match table.get(key)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Delete a key. Returns whether it existed.
    pub fn delete_data(&self, key: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = write_txn
            .open_table(self.schema().data())?
            .remove(key)?
            .is_some();
        write_txn.commit()?;
        Ok(deleted)
    }
}

fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(previous) if previous >= now => previous + Duration::microseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_timestamp_without_previous_is_now() {
        let before = Utc::now();
        let ts = next_timestamp(None);
        assert!(ts >= before);
    }

    #[test]
    fn next_timestamp_moves_past_future_previous() {
        let previous = Utc::now() + Duration::seconds(60);
        let ts = next_timestamp(Some(previous));
        assert!(ts > previous);
        assert_eq!(ts - previous, Duration::microseconds(1));
    }

    #[test]
    fn next_timestamp_uses_clock_when_ahead() {
        let previous = Utc::now() - Duration::seconds(60);
        let ts = next_timestamp(Some(previous));
        assert!(ts > previous + Duration::seconds(59));
    }
}
