//! 元数据定义
//!
//! 提供服务标识与服务依赖声明

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// 服务类型标识
///
/// 以驻留字符串作为稳定键。`ServiceId::of::<T>()` 取类型的短名称，
/// 声明清单中使用同样的字符串。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    /// 从名称创建服务标识
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// 从类型获取服务标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(short_type_name::<T>())
    }

    /// 获取名称
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 获取简短的类型名称（不包含模块路径）
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // 泛型参数里同样可能出现 `::`，只截取尖括号之前的路径部分
    let path_end = full.find('<').unwrap_or(full.len());
    let start = full[..path_end].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0.to_string()
    }
}

/// 服务声明
///
/// 启动阶段构建一次，之后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDeclaration {
    /// 服务标识
    pub id: ServiceId,
    /// 依赖的服务（保持声明顺序，已去重）
    pub dependencies: Vec<ServiceId>,
    /// 是否只能放在全局容器中
    pub global_only: bool,
}

impl ServiceDeclaration {
    /// 创建新的服务声明
    pub fn new(
        id: ServiceId,
        dependencies: impl IntoIterator<Item = ServiceId>,
        global_only: bool,
    ) -> Self {
        let mut unique: Vec<ServiceId> = Vec::new();
        for dependency in dependencies {
            if !unique.contains(&dependency) {
                unique.push(dependency);
            }
        }

        Self {
            id,
            dependencies: unique,
            global_only,
        }
    }

    /// 是否声明了对指定服务的依赖
    pub fn depends_on(&self, target: &ServiceId) -> bool {
        self.dependencies.contains(target)
    }
}
