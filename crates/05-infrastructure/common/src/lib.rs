//! # Infrastructure Common
//!
//! 这个 crate 提供了管理器运行时的公共类型和 traits。
//!
//! ## 核心组件
//!
//! - [`Manager`] - 管理器（长生命周期单例服务）基础 trait
//! - [`ServiceContext`] - 生命周期回调中访问已声明依赖的上下文
//! - [`ServiceHandle`] - 指向某个管理器实例的强类型句柄
//! - [`ServiceId`] / [`ServiceDeclaration`] - 服务标识与依赖声明
//! - [`ContainerState`] / [`ScopeKind`] / [`Phase`] - 容器生命周期
//!
//! ## 设计原则
//!
//! - 依赖关系由静态声明表决定，运行时按声明校验
//! - 单线程协作式调度，所有回调同步执行
//! - 错误按容器隔离，不会中断整帧调度

pub mod component;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
