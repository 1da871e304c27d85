//! Session metrics aggregation
//!
//! Metrics are folded one completed request at a time. The response-time mean
//! is kept incrementally over successful requests that reported a duration,
//! so after N such requests it equals their arithmetic mean.

use shared::{RequestLog, RequestStatus, SessionMetrics};

/// Fold one request that just reached a terminal status into `metrics`
///
/// Pending entries are ignored. Callers must fold each request at most once.
pub fn fold_completed(metrics: &mut SessionMetrics, log: &RequestLog) {
    match log.status {
        RequestStatus::Pending => return,
        RequestStatus::Error => metrics.error_count += 1,
        RequestStatus::Success => {
            if let Some(duration) = log.duration_ms {
                metrics.success_count += 1;
                let delta = duration as f64 - metrics.average_response_time_ms;
                metrics.average_response_time_ms += delta / metrics.success_count as f64;
            }
        }
    }

    metrics.request_count += 1;
    metrics.total_input_tokens += log.input_tokens.unwrap_or(0);
    metrics.total_output_tokens += log.output_tokens.unwrap_or(0);
    metrics.last_request_time = Some(log.timestamp);

    if let Some(provider) = &log.provider {
        *metrics.providers.entry(provider.clone()).or_insert(0) += 1;
    }
    if let Some(model) = &log.model {
        *metrics.models.entry(model.clone()).or_insert(0) += 1;
    }
}

/// Batch recomputation of a session's metrics from its request history
///
/// Only used to cross-check the incremental aggregation.
#[cfg(test)]
pub fn summarize<'a>(session_id: shared::SessionId, logs: impl IntoIterator<Item = &'a RequestLog>) -> SessionMetrics {
    let mut metrics = SessionMetrics::new(session_id);
    let mut durations = Vec::new();

    for log in logs {
        if log.session_id.as_ref() != Some(&metrics.session_id) || !log.status.is_terminal() {
            continue;
        }
        if log.status == RequestStatus::Success {
            if let Some(duration) = log.duration_ms {
                durations.push(duration);
            }
        }
        fold_completed(&mut metrics, log);
    }

    // Replace the running mean with the direct one
    if !durations.is_empty() {
        metrics.average_response_time_ms = durations.iter().sum::<u64>() as f64 / durations.len() as f64;
    }
    metrics
}
