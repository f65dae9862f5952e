//! # Dependency Injection Abstractions
//!
//! 管理器依赖注入抽象层，定义声明注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`DeclarationRegistry`] - 服务声明注册表
//! - [`DependencyResolver`] - 依赖图解析器（拓扑排序 + 循环检测）
//! - [`ManagerFactory`] - 管理器实例工厂
//! - [`ContainerSpec`] / [`ContainerHandle`] - 容器构造描述与句柄
//! - [`DeclarationManifest`] - 以纯数据形式提供的声明清单

pub mod container;
pub mod factory;
pub mod manifest;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use manifest::*;
pub use registry::*;
pub use resolver::*;
