//! Run fingerprinting — deterministic identification of a pipeline run.
//!
//! The run id is a blake3 hash over the canonical JSON of the request and
//! the full configuration. Two runs with identical inputs produce the same
//! id, which is what the idempotence guarantee hangs off.

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::pipeline::PipelineRequest;

/// Content-addressed run identifier (hex).
pub fn run_id(request: &PipelineRequest, config: &PipelineConfig) -> String {
    #[derive(Serialize)]
    struct Identity<'a> {
        request: &'a PipelineRequest,
        config: &'a PipelineConfig,
    }

    let identity = Identity { request, config };
    let json = serde_json::to_string(&identity).expect("run identity must serialize");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> PipelineRequest {
        PipelineRequest {
            as_of: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            tickers: None,
            account_balance: 1.0e8,
            force_analysis: false,
        }
    }

    #[test]
    fn identical_inputs_share_an_id() {
        let config = PipelineConfig::default();
        assert_eq!(run_id(&request(), &config), run_id(&request(), &config));
    }

    #[test]
    fn any_input_change_changes_the_id() {
        let config = PipelineConfig::default();
        let base = run_id(&request(), &config);

        let mut req = request();
        req.account_balance = 2.0e8;
        assert_ne!(run_id(&req, &config), base);

        let mut cfg = PipelineConfig::default();
        cfg.evaluation.risk.min_reward_risk = 2.5;
        assert_ne!(run_id(&request(), &cfg), base);
    }
}
