//! 规划层：目标理解（GoalInterpreter）、计划生成（PlanBuilder）与 LLM 输出解析

pub mod interpreter;
pub mod parse;
pub mod planner;
pub mod types;

pub use interpreter::GoalInterpreter;
pub use parse::Parsed;
pub use planner::{fallback_plan, PlanBuilder};
pub use types::{validate_plan, Plan, PlanError, PlanStep, Understanding};
