//! Harvest Pipeline
//!
//! Locates the log file for the hour preceding "now", parses it line by
//! line, and POSTs each record to the reporting endpoint. Delivery is
//! best-effort per record: a failed record is logged and dropped, never
//! retried or buffered, and deliveries are committed eagerly regardless
//! of what the surrounding round later agrees on.

use std::path::PathBuf;

use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike};

use super::record::LogRecord;
use crate::config::MevHarvestConfig;
use crate::error::{Error, Result};

/// Summary of one harvest cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Lines parsed into records
    pub parsed: usize,
    /// Records accepted by the endpoint with HTTP 201
    pub delivered: usize,
    /// Records dropped after a failed delivery
    pub skipped: usize,
}

/// Harvests one hourly log file per collection round
pub struct LogHarvestPipeline {
    log_dir: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl LogHarvestPipeline {
    /// Create a pipeline from the agent configuration
    pub fn new(config: &MevHarvestConfig) -> Self {
        Self {
            log_dir: config.agent.log_path.clone(),
            base_url: config.agent.base_url.clone(),
            api_key: config.agent.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Derive the log file path for the hour preceding `now`.
    ///
    /// An unconfigured log directory is a configuration error; the caller
    /// treats it as a zero-record cycle, not a round failure.
    pub fn log_filename(&self, now: NaiveDateTime) -> Result<PathBuf> {
        if self.log_dir.is_empty() {
            return Err(Error::Config("log_path is not configured".into()));
        }

        let current_hour = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .ok_or_else(|| Error::Internal("hour truncation failed".into()))?;
        let one_hour_back = current_hour - ChronoDuration::hours(1);

        let filename = format!("transactions_{}.log", one_hour_back.format("%Y-%m-%d_%H"));
        Ok(PathBuf::from(&self.log_dir).join(filename))
    }

    /// Parse every line of the file at `path`, skipping malformed lines.
    ///
    /// Pure function of the file content: no state is carried between
    /// invocations. A missing file yields zero records.
    pub fn parse_file(&self, path: &PathBuf) -> Result<Vec<LogRecord>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!("Log file not found: {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match LogRecord::parse(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // One malformed line never aborts the file.
                    tracing::error!("{}", e);
                }
            }
        }

        Ok(records)
    }

    /// POST one record to `<base_url>/logs`. HTTP 201 is success; any
    /// other status is a delivery error for this record only.
    pub async fn deliver(&self, record: &LogRecord) -> Result<()> {
        let url = format!("{}/logs", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(record)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 201 {
            return Err(Error::Delivery { status });
        }

        Ok(())
    }

    /// Run one full harvest cycle for the hour preceding `now`.
    ///
    /// Configuration errors and a missing file are logged and yield an
    /// empty report; per-line and per-record failures are absorbed. The
    /// cycle itself never fails the collection round.
    pub async fn harvest(&self, now: NaiveDateTime) -> HarvestReport {
        let mut report = HarvestReport::default();

        let path = match self.log_filename(now) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Harvest skipped: {}", e);
                return report;
            }
        };
        tracing::info!("Harvesting log file {}", path.display());

        let records = match self.parse_file(&path) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Error reading log file {}: {}", path.display(), e);
                return report;
            }
        };
        report.parsed = records.len();

        for record in &records {
            match self.deliver(record).await {
                Ok(()) => {
                    tracing::info!("Delivered record {}", record.trans_id);
                    report.delivered += 1;
                }
                Err(e) => {
                    // Dropped, not retried: delivery is best-effort per
                    // record and independent across records.
                    tracing::error!("Failed to deliver record {}: {}", record.trans_id, e);
                    report.skipped += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const WELL_FORMED: &str = "date=2025-02-05,time=12:14:56,trans_id=0x675216463816,mev_type=front_run,trade_amnt=100.0,expected_amnt=102.0,profit_percentage=2.0,original_loss_percentage=0.0";

    fn pipeline_for(log_dir: &str, base_url: &str) -> LogHarvestPipeline {
        LogHarvestPipeline {
            log_dir: log_dir.to_string(),
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// One-shot HTTP stub answering every request with the given status
    async fn spawn_stub(status_line: &'static str, responses: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for _ in 0..responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let body = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                let _ = socket.write_all(body.as_bytes()).await;
            }
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_log_filename_derivation() {
        let pipeline = pipeline_for("/logs", "http://unused");
        let now = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(13, 22, 0)
            .unwrap();

        let path = pipeline.log_filename(now).unwrap();
        assert_eq!(path, PathBuf::from("/logs/transactions_2025-02-05_12.log"));
    }

    #[test]
    fn test_log_filename_crosses_midnight() {
        let pipeline = pipeline_for("/logs", "http://unused");
        let now = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(0, 5, 0)
            .unwrap();

        let path = pipeline.log_filename(now).unwrap();
        assert_eq!(path, PathBuf::from("/logs/transactions_2025-02-04_23.log"));
    }

    #[test]
    fn test_unconfigured_log_dir() {
        let pipeline = pipeline_for("", "http://unused");
        let now = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(13, 22, 0)
            .unwrap();

        assert!(matches!(
            pipeline.log_filename(now).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn test_missing_file_yields_zero_records() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_for(dir.path().to_str().unwrap(), "http://unused");

        let path = dir.path().join("transactions_2025-02-05_12.log");
        let records = pipeline.parse_file(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transactions_2025-02-05_12.log");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{WELL_FORMED}").unwrap();
        writeln!(file, "date=2025-02-05,time=12:15:00,trans_id=0xdef").unwrap();

        let pipeline = pipeline_for(dir.path().to_str().unwrap(), "http://unused");
        let records = pipeline.parse_file(&path).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trans_id, "0x675216463816");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transactions_2025-02-05_12.log");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{WELL_FORMED}").unwrap();
        writeln!(file, "{}", WELL_FORMED.replace("12:14:56", "12:15:01")).unwrap();

        let pipeline = pipeline_for(dir.path().to_str().unwrap(), "http://unused");
        let first = pipeline.parse_file(&path).unwrap();
        let second = pipeline.parse_file(&path).unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_delivery_success() {
        let base_url = spawn_stub("HTTP/1.1 201 Created", 1).await;
        let pipeline = pipeline_for("/unused", &base_url);

        let record = LogRecord::parse(WELL_FORMED).unwrap();
        pipeline.deliver(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_delivery_non_201_is_error() {
        let base_url = spawn_stub("HTTP/1.1 500 Internal Server Error", 1).await;
        let pipeline = pipeline_for("/unused", &base_url);

        let record = LogRecord::parse(WELL_FORMED).unwrap();
        let err = pipeline.deliver(&record).await.unwrap_err();
        assert!(matches!(err, Error::Delivery { status: 500 }));
    }

    #[tokio::test]
    async fn test_harvest_drops_failed_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transactions_2025-02-05_12.log");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{WELL_FORMED}").unwrap();
        writeln!(file, "not a log line at all").unwrap();

        let base_url = spawn_stub("HTTP/1.1 201 Created", 1).await;
        let pipeline = pipeline_for(dir.path().to_str().unwrap(), &base_url);

        let now = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(13, 22, 0)
            .unwrap();
        let report = pipeline.harvest(now).await;

        assert_eq!(report.parsed, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_harvest_missing_file_is_empty_report() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_for(dir.path().to_str().unwrap(), "http://unused");

        let now = NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(13, 22, 0)
            .unwrap();
        let report = pipeline.harvest(now).await;

        assert_eq!(report, HarvestReport::default());
    }
}
