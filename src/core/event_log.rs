//! 运行级诊断日志（EventLog）
//!
//! 每次运行独占一个实例，只追加；时间戳严格递增（同一时刻的连续追加向后推 1 微秒）。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GoalUnderstood,
    PlanCreated,
    StepStarted,
    StepCompleted,
    StepFailed,
    ResultsSynthesized,
    AgentError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GoalUnderstood => "goal_understood",
            EventKind::PlanCreated => "plan_created",
            EventKind::StepStarted => "step_started",
            EventKind::StepCompleted => "step_completed",
            EventKind::StepFailed => "step_failed",
            EventKind::ResultsSynthesized => "results_synthesized",
            EventKind::AgentError => "agent_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: EventKind,
    pub data: Value,
}

#[derive(Debug, Default, Clone)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条事件；payload 序列化失败时记为 null
    pub fn record(&mut self, event: EventKind, data: impl Serialize) {
        let data = serde_json::to_value(data).unwrap_or(Value::Null);
        self.append(event, data);
    }

    pub fn append(&mut self, event: EventKind, data: Value) {
        let mut timestamp = Utc::now();
        if let Some(last) = self.entries.last() {
            if timestamp <= last.timestamp {
                timestamp = last.timestamp + Duration::microseconds(1);
            }
        }
        tracing::debug!(event = event.as_str(), %timestamp, "event log");
        self.entries.push(EventLogEntry {
            timestamp,
            event,
            data,
        });
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.entries.iter().map(|e| e.event).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<EventLogEntry> {
        self.entries
    }
}
