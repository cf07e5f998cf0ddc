//! 流式会话登记表：每个流式连接一个会话，连接结束（读完或断开）时移除
//!
//! 会话只用于观测（列出活跃连接）；运行本身不受会话生命周期影响，客户端断开后运行继续。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub goal: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionInfo>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新会话，返回会话 ID
    pub async fn create(&self, goal: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let info = SessionInfo {
            id: id.clone(),
            goal: goal.to_string(),
            started_at: Utc::now(),
        };
        self.sessions.write().await.insert(id.clone(), info);
        tracing::info!(session = %id, "session created");
        id
    }

    /// 移除会话；返回是否存在
    pub async fn dispose(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session disposed");
        }
        removed
    }

    /// 按开始时间排序的活跃会话
    pub async fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 绑定到连接生命周期的守卫：drop 时移除会话
    pub fn guard(&self, id: impl Into<String>) -> SessionGuard {
        SessionGuard {
            sessions: self.clone(),
            id: id.into(),
        }
    }
}

/// 连接断开或流结束时随流状态一起被 drop，移除对应会话
pub struct SessionGuard {
    sessions: SessionRegistry,
    id: String,
}

impl SessionGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // 锁空闲时同步移除；有竞争时交给后台任务
        if let Ok(mut map) = self.sessions.sessions.try_write() {
            if map.remove(&self.id).is_some() {
                tracing::info!(session = %self.id, "session disposed");
            }
            return;
        }
        let sessions = self.sessions.clone();
        let id = std::mem::take(&mut self.id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.dispose(&id).await;
            });
        }
    }
}
