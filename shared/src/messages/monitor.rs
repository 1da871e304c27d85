//! Monitoring events and stream frames
//!
//! `MonitorEvent` is what the MonitoringService publishes on its broadcast
//! channel; `StreamFrame` is what a subscriber receives on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{RequestLog, SessionId, SessionMetrics};

/// Event published to every live subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum MonitorEvent {
    #[serde(rename = "request:start")]
    RequestStart(RequestLog),
    #[serde(rename = "request:update")]
    RequestUpdate(RequestLog),
    #[serde(rename = "request:end")]
    RequestEnd(RequestLog),
    #[serde(rename = "metrics:update")]
    MetricsUpdate(SessionMetrics),
    #[serde(rename = "cleared")]
    LogsCleared { session_id: Option<SessionId> },
    #[serde(rename = "reset")]
    MetricsReset { session_id: Option<SessionId> },
}

impl MonitorEvent {
    /// Whether a subscriber filtered on `filter` should see this event
    pub fn matches_session(&self, filter: Option<&SessionId>) -> bool {
        let Some(filter) = filter else {
            return true;
        };
        match self {
            MonitorEvent::RequestStart(log)
            | MonitorEvent::RequestUpdate(log)
            | MonitorEvent::RequestEnd(log) => log.session_id.as_ref() == Some(filter),
            MonitorEvent::MetricsUpdate(metrics) => &metrics.session_id == filter,
            MonitorEvent::LogsCleared { session_id } | MonitorEvent::MetricsReset { session_id } => {
                session_id.as_ref().map_or(true, |id| id == filter)
            }
        }
    }

    /// Wire representation for stream subscribers
    pub fn to_frame(&self) -> StreamFrame {
        match self {
            MonitorEvent::RequestStart(log)
            | MonitorEvent::RequestUpdate(log)
            | MonitorEvent::RequestEnd(log) => StreamFrame::Log(log.clone()),
            MonitorEvent::MetricsUpdate(metrics) => StreamFrame::Metrics(vec![metrics.clone()]),
            MonitorEvent::LogsCleared { session_id } => StreamFrame::Cleared(session_id.clone()),
            MonitorEvent::MetricsReset { session_id } => StreamFrame::Reset(session_id.clone()),
        }
    }
}

/// `{type, data}` frame pushed to a stream subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamFrame {
    Initial(Vec<RequestLog>),
    Log(RequestLog),
    Metrics(Vec<SessionMetrics>),
    Cleared(Option<SessionId>),
    Reset(Option<SessionId>),
}
