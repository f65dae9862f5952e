//! 错误类型定义

use crate::lifecycle::{ContainerState, SessionId};
use crate::metadata::ServiceId;
use thiserror::Error;

/// 声明注册错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("服务重复注册且声明冲突: {service}, 原因: {reason}")]
    DuplicateRegistration { service: ServiceId, reason: String },

    #[error("服务类型未注册: {service}")]
    UnknownServiceType { service: ServiceId },

    #[error("服务不能依赖自身: {service}")]
    SelfDependency { service: ServiceId },
}

/// 依赖图解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("检测到循环依赖: {service} ({})", format_chain(.chain))]
    CyclicDependency {
        service: ServiceId,
        chain: Vec<ServiceId>,
    },

    #[error("服务类型未注册: {service}")]
    UnknownServiceType { service: ServiceId },
}

impl ResolveError {
    /// 出错的服务
    pub fn service(&self) -> &ServiceId {
        match self {
            Self::CyclicDependency { service, .. } | Self::UnknownServiceType { service } => {
                service
            }
        }
    }
}

fn format_chain(chain: &[ServiceId]) -> String {
    chain
        .iter()
        .map(ServiceId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 服务查找错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("服务类型未注册: {service}")]
    UnknownServiceType { service: ServiceId },

    #[error("{requester} 未声明对 {target} 的依赖")]
    UndeclaredDependencyAccess {
        requester: ServiceId,
        target: ServiceId,
    },

    #[error("{requester} 无法获取已声明的依赖 {target}：实例不存在")]
    MissingInstance {
        requester: ServiceId,
        target: ServiceId,
    },

    #[error("服务 {service} 的实例类型不是 {expected}")]
    TypeMismatch {
        service: ServiceId,
        expected: &'static str,
    },
}

/// 容器错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("非法的容器状态迁移: {from} -> {to}")]
    InvalidStateTransition {
        from: ContainerState,
        to: ContainerState,
    },

    #[error("仅全局服务 {service} 不能放入非全局容器 {scope}")]
    InvalidPlacement { service: ServiceId, scope: String },

    #[error("服务 {service} 没有可用的工厂")]
    MissingFactory { service: ServiceId },

    #[error("依赖解析失败: {source}")]
    Resolve {
        #[from]
        source: ResolveError,
    },

    #[error("全局容器已存在")]
    DuplicateGlobalContainer,

    #[error("会话容器已存在: {session}")]
    DuplicateSession { session: SessionId },

    #[error("容器不存在: {container}")]
    ContainerNotFound { container: String },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("不支持的配置格式: {path}")]
    UnsupportedFormat { path: String },

    #[error("配置项无效: {key}, 原因: {message}")]
    InvalidValue { key: String, message: String },
}

/// 运行时核心错误类型
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("声明错误: {source}")]
    DeclarationError {
        #[from]
        source: DeclarationError,
    },

    #[error("容器错误: {source}")]
    ContainerError {
        #[from]
        source: ContainerError,
    },

    #[error("运行时核心已初始化，不允许重复初始化")]
    AlreadyInitialized,

    #[error("日志初始化失败: {message}")]
    LoggingInitFailed { message: String },
}

/// 结果类型别名
pub type DeclarationResult<T> = Result<T, DeclarationError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
pub type ServiceResult<T> = Result<T, ServiceError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CoreResult<T> = Result<T, CoreError>;
