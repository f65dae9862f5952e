//! # 管理器容器具体实现
//!
//! 提供管理器容器（按依赖顺序自动构造、契约检查的服务查找）
//! 以及按帧驱动各生命周期阶段的执行驱动器。
//!
//! ## 核心类型
//!
//! - [`ManagerContainer`] - 管理器容器，状态机 `Uninitialized → Initializing → Active → Destroyed`
//! - [`ExecutionDriver`] - 持有全局容器与会话容器，分发 start / update / fixed update / late update
//! - [`ServiceInstance`] - 容器中的单个管理器实例

pub mod container;
pub mod driver;
pub mod instance;

pub use container::*;
pub use driver::*;
pub use instance::*;
