// src/aggregator/snapshot.rs
use crate::probe::ProbeResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated outcome of probing all registered targets at one point in time.
///
/// Superseded by the next cycle's snapshot, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub results: Vec<ProbeResult>,
    pub taken_at: DateTime<Utc>,
    pub overall_ok: bool,
}

impl StatusSnapshot {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        let overall_ok = results.iter().all(|r| r.ok);

        Self {
            results,
            taken_at: Utc::now(),
            overall_ok,
        }
    }

    pub fn healthy_count(&self) -> usize {
        self.results.iter().filter(|r| r.ok).count()
    }

    /// Exit code a process supervisor consumes: 0 healthy, 1 not.
    pub fn exit_code(&self) -> i32 {
        if self.overall_ok {
            0
        } else {
            1
        }
    }

    /// Plain listing of target name -> ok/not-ok, one line per target, for
    /// callers that re-render the snapshot periodically.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();

        for result in &self.results {
            match &result.error {
                None => out.push_str(&format!(
                    "{} ok ({} ms)\n",
                    result.target.name, result.latency_ms
                )),
                Some(err) => {
                    out.push_str(&format!("{} not-ok ({})\n", result.target.name, err))
                }
            }
        }

        out.push_str(&format!(
            "overall: {}\n",
            if self.overall_ok { "ok" } else { "not-ok" }
        ));
        out
    }
}
