//! 容器构造描述与诊断信息

use crate::factory::ManagerFactory;
use infrastructure_common::{ContainerError, ContainerState, Manager, ScopeKind, ServiceId};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// 容器句柄
///
/// 创建容器时返回给宿主，用于后续初始化、查询与销毁
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    /// 容器唯一标识
    pub id: Uuid,
    /// 作用域
    pub scope: ScopeKind,
}

impl ContainerHandle {
    /// 创建新的容器句柄
    pub fn new(scope: ScopeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
        }
    }

    /// 是否为全局容器
    pub fn is_global(&self) -> bool {
        self.scope.is_global()
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope, self.id.simple())
    }
}

/// 容器构造描述
#[derive(Clone)]
pub struct ContainerSpec {
    /// 作用域
    pub scope: ScopeKind,
    /// 显式请求的服务（有序）
    pub requested: Vec<ServiceId>,
    /// 预制工厂，覆盖注册表中的默认工厂
    pub prefabs: HashMap<ServiceId, ManagerFactory>,
}

impl ContainerSpec {
    /// 创建新的容器描述
    pub fn new(scope: ScopeKind) -> Self {
        Self {
            scope,
            requested: Vec::new(),
            prefabs: HashMap::new(),
        }
    }

    /// 全局容器描述
    pub fn global() -> Self {
        Self::new(ScopeKind::Global)
    }

    /// 会话容器描述
    pub fn session(id: impl Into<infrastructure_common::SessionId>) -> Self {
        Self::new(ScopeKind::session(id))
    }

    /// 请求指定类型的管理器
    pub fn request<T: Manager>(self) -> Self {
        self.request_id(ServiceId::of::<T>())
    }

    /// 按服务标识请求
    pub fn request_id(mut self, id: impl Into<ServiceId>) -> Self {
        self.requested.push(id.into());
        self
    }

    /// 批量请求
    pub fn request_all<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        self.requested.extend(ids.into_iter().map(Into::into));
        self
    }

    /// 请求服务并使用预制工厂创建
    pub fn with_prefab(mut self, id: impl Into<ServiceId>, factory: ManagerFactory) -> Self {
        let id = id.into();
        if !self.requested.contains(&id) {
            self.requested.push(id.clone());
        }
        self.prefabs.insert(id, factory);
        self
    }
}

impl fmt::Debug for ContainerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerSpec")
            .field("scope", &self.scope)
            .field("requested", &self.requested)
            .field("prefabs", &self.prefabs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 被跳过的服务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedService {
    /// 服务标识
    pub service: ServiceId,
    /// 跳过原因
    pub error: ContainerError,
}

/// 初始化报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// 本容器新创建的服务（awake 顺序）
    pub created: Vec<ServiceId>,
    /// 由全局容器提供、未在本地创建的服务
    pub provided_by_global: Vec<ServiceId>,
    /// 被跳过的服务
    pub skipped: Vec<SkippedService>,
}

impl InitReport {
    /// 是否没有跳过任何服务
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// 实例诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSnapshot {
    /// 服务标识
    pub service: ServiceId,
    /// 是否启用
    pub enabled: bool,
    /// 是否已调用 start
    pub started: bool,
}

/// 容器诊断快照
#[derive(Debug, Clone)]
pub struct ContainerSnapshot {
    /// 容器句柄
    pub handle: ContainerHandle,
    /// 生命周期状态
    pub state: ContainerState,
    /// 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// 实例列表（按创建顺序）
    pub instances: Vec<InstanceSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::factory_fn;

    #[derive(Debug, Default)]
    struct ScoreManager {
        starting_score: i32,
    }

    impl Manager for ScoreManager {}

    #[test]
    fn test_spec_builder_keeps_request_order() {
        let spec = ContainerSpec::session("level-1")
            .request_id("Audio")
            .request::<ScoreManager>()
            .request_all(["Ui", "Player"]);

        assert_eq!(spec.scope, ScopeKind::session("level-1"));
        assert_eq!(
            spec.requested,
            ["Audio", "ScoreManager", "Ui", "Player"]
                .into_iter()
                .map(ServiceId::new)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_prefab_is_requested_once() {
        let spec = ContainerSpec::global()
            .request::<ScoreManager>()
            .with_prefab(
                ServiceId::of::<ScoreManager>(),
                factory_fn(|| ScoreManager { starting_score: 10 }),
            );

        assert_eq!(spec.requested.len(), 1);
        assert!(spec.prefabs.contains_key(&ServiceId::of::<ScoreManager>()));
    }

    #[test]
    fn test_handle_display_contains_scope() {
        let handle = ContainerHandle::new(ScopeKind::Global);
        assert!(handle.to_string().starts_with("global#"));
        assert!(handle.is_global());
    }
}
