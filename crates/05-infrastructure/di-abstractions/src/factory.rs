//! 管理器工厂
//!
//! 提供管理器实例创建的工厂函数支持

use infrastructure_common::Manager;
use std::sync::Arc;

/// 管理器工厂函数类型
pub type ManagerFactory = Arc<dyn Fn() -> Box<dyn Manager> + Send + Sync>;

/// 使用 `Default` 创建实例的工厂
pub fn default_factory<T>() -> ManagerFactory
where
    T: Manager + Default,
{
    Arc::new(|| Box::new(T::default()) as Box<dyn Manager>)
}

/// Lambda 工厂包装器
///
/// 常用于预制（prefab）：同一类型在不同容器中使用不同的初始参数
pub fn factory_fn<T, F>(factory: F) -> ManagerFactory
where
    T: Manager,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Manager>)
}
