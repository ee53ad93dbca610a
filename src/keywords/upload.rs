use std::collections::BTreeSet;

use serde_json::Value;

use crate::classify::normalize_keyword;
use crate::error::{AppError, Result};

/// Parse a bulk keyword upload.
///
/// Two payload shapes are accepted, matching the watchlist exports this
/// tool is fed:
///
/// - a flat array of tickers: `["TCS", "INFY"]`
/// - an object of named groups, where each group is either a ticker array
///   or a sector map of ticker arrays:
///   `{"V200": ["TCS"], "V40": {"IT": ["INFY", "WIPRO"]}}`
///
/// Every extracted ticker is normalized; tickers that normalize to empty
/// are skipped. The result is deduplicated and sorted. A payload that is
/// not valid JSON or fits neither shape is rejected wholesale — nothing
/// is applied from a malformed upload.
pub fn parse_keyword_upload(payload: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| AppError::Upload(format!("invalid JSON: {e}")))?;

    let mut keywords = BTreeSet::new();

    match &value {
        Value::Array(items) => collect_tickers(items, &mut keywords)?,
        Value::Object(groups) => {
            for (group, entry) in groups {
                match entry {
                    Value::Array(items) => collect_tickers(items, &mut keywords)?,
                    Value::Object(sectors) => {
                        for (sector, tickers) in sectors {
                            let Value::Array(items) = tickers else {
                                return Err(AppError::Upload(format!(
                                    "group {group:?}, sector {sector:?}: expected a ticker array"
                                )));
                            };
                            collect_tickers(items, &mut keywords)?;
                        }
                    }
                    _ => {
                        return Err(AppError::Upload(format!(
                            "group {group:?}: expected a ticker array or a sector map"
                        )));
                    }
                }
            }
        }
        _ => {
            return Err(AppError::Upload(
                "expected a ticker array or an object of keyword groups".to_string(),
            ));
        }
    }

    Ok(keywords.into_iter().collect())
}

fn collect_tickers(items: &[Value], keywords: &mut BTreeSet<String>) -> Result<()> {
    for item in items {
        let Value::String(raw) = item else {
            return Err(AppError::Upload(format!(
                "expected ticker strings, found {item}"
            )));
        };
        let keyword = normalize_keyword(raw);
        if !keyword.is_empty() {
            keywords.insert(keyword);
        }
    }
    Ok(())
}
