//! Transaction Log Records
//!
//! One structured record per raw log line. Line format is a
//! comma-separated list of `key=value` pairs, e.g.:
//!
//! ```text
//! date=2025-02-05,time=12:14:56,trans_id=0x675216463816,mev_type=front_run,\
//! trade_amnt=100.0,expected_amnt=102.0,profit_percentage=2.0,original_loss_percentage=0.0
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A structured MEV transaction record parsed from one log line.
///
/// Serialized as-is as the JSON body of one delivery; not retained after
/// delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Transaction date, YYYY-MM-DD
    pub date: String,
    /// Transaction time, HH:MM:SS
    pub time: String,
    /// Transaction identifier
    pub trans_id: String,
    /// MEV classification (e.g. front_run)
    pub mev_type: String,
    /// Traded amount
    pub trade_amnt: f64,
    /// Expected amount
    pub expected_amnt: f64,
    /// Profit percentage
    pub profit_percentage: f64,
    /// Loss percentage before mitigation
    pub original_loss_percentage: f64,
}

impl LogRecord {
    /// Parse one raw log line.
    ///
    /// A missing required key or a non-numeric value in a numeric field
    /// fails this line only; callers skip it and continue with the next.
    pub fn parse(line: &str) -> Result<Self> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for pair in line.split(',') {
            if let Some((key, value)) = pair.split_once('=') {
                fields.insert(key.trim(), value.trim());
            }
        }

        let text = |key: &str| -> Result<String> {
            fields
                .get(key)
                .map(|v| v.to_string())
                .ok_or_else(|| Error::ParseLine {
                    line: line.to_string(),
                    reason: format!("missing required key '{}'", key),
                })
        };

        let numeric = |key: &str| -> Result<f64> {
            let raw = fields.get(key).ok_or_else(|| Error::ParseLine {
                line: line.to_string(),
                reason: format!("missing required key '{}'", key),
            })?;
            raw.parse::<f64>().map_err(|_| Error::ParseLine {
                line: line.to_string(),
                reason: format!("non-numeric value '{}' for key '{}'", raw, key),
            })
        };

        Ok(Self {
            date: text("date")?,
            time: text("time")?,
            trans_id: text("trans_id")?,
            mev_type: text("mev_type")?,
            trade_amnt: numeric("trade_amnt")?,
            expected_amnt: numeric("expected_amnt")?,
            profit_percentage: numeric("profit_percentage")?,
            original_loss_percentage: numeric("original_loss_percentage")?,
        })
    }

    /// Render the record back to the `key=value,...` line form
    #[cfg(test)]
    pub fn to_line(&self) -> String {
        format!(
            "date={},time={},trans_id={},mev_type={},trade_amnt={},expected_amnt={},profit_percentage={},original_loss_percentage={}",
            self.date,
            self.time,
            self.trans_id,
            self.mev_type,
            self.trade_amnt,
            self.expected_amnt,
            self.profit_percentage,
            self.original_loss_percentage,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "date=2025-02-05,time=12:14:56,trans_id=0x675216463816,mev_type=front_run,trade_amnt=100.0,expected_amnt=102.0,profit_percentage=2.0,original_loss_percentage=0.0";

    #[test]
    fn test_parse_well_formed_line() {
        let record = LogRecord::parse(WELL_FORMED).unwrap();

        assert_eq!(record.date, "2025-02-05");
        assert_eq!(record.time, "12:14:56");
        assert_eq!(record.trans_id, "0x675216463816");
        assert_eq!(record.mev_type, "front_run");
        assert_eq!(record.trade_amnt, 100.0);
        assert_eq!(record.expected_amnt, 102.0);
        assert_eq!(record.profit_percentage, 2.0);
        assert_eq!(record.original_loss_percentage, 0.0);
    }

    #[test]
    fn test_line_round_trip() {
        let record = LogRecord::parse(WELL_FORMED).unwrap();
        let reparsed = LogRecord::parse(&record.to_line()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_missing_required_key() {
        let line = "date=2025-02-05,time=12:14:56,trans_id=0xabc,mev_type=front_run";
        let err = LogRecord::parse(line).unwrap_err();
        assert!(matches!(err, Error::ParseLine { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_non_numeric_value() {
        let line = WELL_FORMED.replace("trade_amnt=100.0", "trade_amnt=lots");
        let err = LogRecord::parse(&line).unwrap_err();
        match err {
            Error::ParseLine { reason, .. } => assert!(reason.contains("trade_amnt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_body_field_names() {
        let record = LogRecord::parse(WELL_FORMED).unwrap();
        let body = serde_json::to_value(&record).unwrap();

        assert_eq!(body["trans_id"], "0x675216463816");
        assert_eq!(body["mev_type"], "front_run");
        assert_eq!(body["profit_percentage"], 2.0);
    }
}
