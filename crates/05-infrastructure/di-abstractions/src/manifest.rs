//! 声明清单
//!
//! 由外部构建步骤生成或手写的纯数据声明表，替代运行时反射扫描

use serde::{Deserialize, Serialize};

/// 声明清单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationManifest {
    /// 服务声明列表（按注册顺序）
    #[serde(default)]
    pub services: Vec<ManifestEntry>,
}

/// 清单中的单个服务声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// 服务名称
    pub name: String,
    /// 依赖的服务名称
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// 是否只能放在全局容器中
    #[serde(default)]
    pub global_only: bool,
}

impl DeclarationManifest {
    /// 创建空清单
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加声明
    pub fn with_service<S: Into<String>>(
        mut self,
        name: S,
        depends_on: impl IntoIterator<Item = S>,
        global_only: bool,
    ) -> Self {
        self.services.push(ManifestEntry {
            name: name.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            global_only,
        });
        self
    }
}
