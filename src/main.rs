//! Quest 命令行入口
//!
//! 用法：`quest <goal...>`，运行结束后把 RunResult 以 JSON 打印到 stdout；日志写 stderr。

use anyhow::{bail, Context};
use quest::agent::create_orchestrator;
use quest::config::{load_config, AppConfig};
use quest::core::{GoalRequest, LogSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quest::observability::init();

    let goal = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let request = GoalRequest::new(goal);
    let goal = match request.validate() {
        Ok(goal) => goal,
        Err(e) => bail!("{}\nusage: quest <goal...>", e),
    };

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let orchestrator = create_orchestrator(&cfg);
    let result = orchestrator.run(goal, Some(&LogSink)).await;

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize run result")?;
    println!("{}", json);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
