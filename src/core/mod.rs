//! 核心编排层：错误、执行状态、事件日志、进度、执行引擎、综合与运行编排

pub mod engine;
pub mod error;
pub mod event_log;
pub mod events;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod synthesizer;

pub use engine::ExecutionEngine;
pub use error::{AgentError, StepError};
pub use event_log::{EventKind, EventLog, EventLogEntry};
pub use events::{ChannelSink, LogSink, ProgressEvent, ProgressSink};
pub use orchestrator::{GoalRequest, RunOrchestrator, RunResult};
pub use session::{SessionGuard, SessionInfo, SessionRegistry};
pub use state::{ExecutionState, ExecutionStatus, StepResult, StepStatus};
pub use synthesizer::ResultSynthesizer;
