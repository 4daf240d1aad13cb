use anyhow::Result;
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::AccountId;
use crate::storage::PointStore;

/// Exporter for writing an account's history in portable formats
pub struct Exporter<'a, S> {
    service: &'a LedgerService<S>,
}

impl<'a, S: PointStore> Exporter<'a, S> {
    pub fn new(service: &'a LedgerService<S>) -> Self {
        Self { service }
    }

    /// Export history to CSV format
    pub async fn export_history_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let records = self.service.get_history(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "account_id", "kind", "amount", "recorded_at"])?;

        for record in &records {
            csv_writer.write_record(&[
                record.id.to_string(),
                record.account_id.to_string(),
                record.kind.as_str().to_string(),
                record.amount.to_string(),
                record.recorded_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }

    /// Export history to pretty-printed JSON
    pub async fn export_history_json<W: Write>(
        &self,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<usize> {
        let records = self.service.get_history(account_id).await?;
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writeln!(writer)?;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::LockRegistry;
    use crate::domain::{HistoryRecord, TransactionKind};
    use crate::storage::MemoryStore;

    async fn sample_service() -> LedgerService<MemoryStore> {
        let service = LedgerService::new(MemoryStore::new(), LockRegistry::new());
        service.charge(1, 800).await.unwrap();
        service.use_points(1, 300).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_export_history_csv() {
        let service = sample_service().await;
        let mut buffer = Vec::new();

        let count = Exporter::new(&service)
            .export_history_csv(1, &mut buffer)
            .await
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(count, 2);
        assert_eq!(lines[0], "id,account_id,kind,amount,recorded_at");
        assert!(lines[1].starts_with("1,1,CHARGE,800,"));
        assert!(lines[2].starts_with("2,1,USE,300,"));
    }

    #[tokio::test]
    async fn test_export_history_json() {
        let service = sample_service().await;
        let mut buffer = Vec::new();

        Exporter::new(&service)
            .export_history_json(1, &mut buffer)
            .await
            .unwrap();

        let records: Vec<HistoryRecord> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].kind, TransactionKind::Use);
        assert_eq!(records, service.get_history(1).await.unwrap());
    }
}
