//! 容器生命周期管理

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 容器生命周期状态
///
/// 线性状态机：`Uninitialized → Initializing → Active → Destroyed`，不允许回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerState {
    /// 已创建，尚未初始化
    #[default]
    Uninitialized,
    /// 初始化中（按依赖顺序创建实例）
    Initializing,
    /// 运行中
    Active,
    /// 已销毁（终止状态）
    Destroyed,
}

impl ContainerState {
    /// 是否允许迁移到目标状态
    pub fn can_transition_to(self, next: ContainerState) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Initializing)
                | (Self::Initializing, Self::Active)
                | (Self::Uninitialized | Self::Initializing | Self::Active, Self::Destroyed)
        )
    }

    /// 是否处于运行中
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// 是否已销毁
    pub fn is_destroyed(self) -> bool {
        self == Self::Destroyed
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initializing => "Initializing",
            Self::Active => "Active",
            Self::Destroyed => "Destroyed",
        };
        f.write_str(name)
    }
}

/// 会话标识（例如场景名称）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// 创建会话标识
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// 获取名称
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SessionId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0.to_string()
    }
}

/// 容器作用域
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// 进程级全局作用域，同一时间最多一个
    Global,
    /// 会话作用域，按会话标识唯一
    Session(SessionId),
}

impl ScopeKind {
    /// 创建会话作用域
    pub fn session(id: impl Into<SessionId>) -> Self {
        Self::Session(id.into())
    }

    /// 是否为全局作用域
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// 获取会话标识
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Global => None,
            Self::Session(id) => Some(id),
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Session(id) => write!(f, "session:{}", id),
        }
    }
}

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 实例创建后立即同步调用
    Awake,
    /// 下一次帧开始时调用一次
    Start,
    /// 每帧更新
    Update,
    /// 固定步长更新，每帧零次或多次
    FixedUpdate,
    /// 帧末更新
    LateUpdate,
    /// 容器销毁时调用
    Destroy,
}

impl Phase {
    /// 驱动器每帧分发的阶段
    pub const TICK_PHASES: [Phase; 3] = [Phase::Update, Phase::FixedUpdate, Phase::LateUpdate];

    /// 阶段名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Start => "start",
            Self::Update => "update",
            Self::FixedUpdate => "fixed_update",
            Self::LateUpdate => "late_update",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
