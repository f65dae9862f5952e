//! 服务声明注册表
//!
//! 进程级的不可变声明表：服务标识 → 依赖集合 + 仅全局标记 + 默认工厂。
//! 启动阶段集中注册，随后以 `Arc<DeclarationRegistry>` 共享，不再修改。

use crate::factory::{default_factory, ManagerFactory};
use crate::manifest::DeclarationManifest;
use infrastructure_common::{
    DeclarationError, DeclarationResult, Manager, ServiceDeclaration, ServiceId,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// 注册信息
#[derive(Clone)]
struct Registration {
    /// 服务声明
    declaration: ServiceDeclaration,
    /// 默认工厂
    factory: Option<ManagerFactory>,
    /// 绑定的 Rust 类型（仅类型化注册时记录）
    rust_type: Option<(TypeId, &'static str)>,
}

/// 服务声明注册表
#[derive(Clone, Default)]
pub struct DeclarationRegistry {
    registrations: HashMap<ServiceId, Registration>,
    order: Vec<ServiceId>,
}

impl DeclarationRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务声明
    ///
    /// 相同声明重复注册会被忽略；同一服务的冲突声明返回 `DuplicateRegistration`，
    /// 不会被静默覆盖。
    pub fn register(
        &mut self,
        id: ServiceId,
        dependencies: impl IntoIterator<Item = ServiceId>,
        global_only: bool,
    ) -> DeclarationResult<()> {
        let declaration = ServiceDeclaration::new(id.clone(), dependencies, global_only);

        if declaration.depends_on(&id) {
            return Err(DeclarationError::SelfDependency { service: id });
        }

        if let Some(existing) = self.registrations.get(&id) {
            if existing.declaration == declaration {
                debug!("重复注册相同声明，忽略: {}", id);
                return Ok(());
            }

            return Err(DeclarationError::DuplicateRegistration {
                reason: format!(
                    "已有声明 依赖 {:?} 仅全局 {}，新声明 依赖 {:?} 仅全局 {}",
                    existing.declaration.dependencies,
                    existing.declaration.global_only,
                    declaration.dependencies,
                    declaration.global_only
                ),
                service: id,
            });
        }

        info!(
            "注册服务声明: {} (依赖 {} 个, 仅全局: {})",
            id,
            declaration.dependencies.len(),
            global_only
        );

        self.order.push(id.clone());
        self.registrations.insert(
            id,
            Registration {
                declaration,
                factory: None,
                rust_type: None,
            },
        );
        Ok(())
    }

    /// 注册管理器类型
    ///
    /// 以 `ServiceId::of::<T>()` 注册声明，并绑定 `T::default` 作为默认工厂
    pub fn register_manager<T>(
        &mut self,
        dependencies: impl IntoIterator<Item = ServiceId>,
        global_only: bool,
    ) -> DeclarationResult<ServiceId>
    where
        T: Manager + Default,
    {
        let id = ServiceId::of::<T>();
        let rust_type = (TypeId::of::<T>(), std::any::type_name::<T>());

        if let Some((existing_type, existing_name)) = self
            .registrations
            .get(&id)
            .and_then(|registration| registration.rust_type)
        {
            if existing_type != rust_type.0 {
                return Err(DeclarationError::DuplicateRegistration {
                    reason: format!("已绑定类型 {}，新类型 {}", existing_name, rust_type.1),
                    service: id,
                });
            }
        }

        self.register(id.clone(), dependencies, global_only)?;

        if let Some(registration) = self.registrations.get_mut(&id) {
            registration.rust_type = Some(rust_type);
            if registration.factory.is_none() {
                registration.factory = Some(default_factory::<T>());
            }
        }

        Ok(id)
    }

    /// 为已声明的服务绑定默认工厂
    pub fn bind_factory(&mut self, id: &ServiceId, factory: ManagerFactory) -> DeclarationResult<()> {
        let registration = self
            .registrations
            .get_mut(id)
            .ok_or_else(|| DeclarationError::UnknownServiceType { service: id.clone() })?;

        if registration.factory.is_some() {
            debug!("替换服务默认工厂: {}", id);
        }
        registration.factory = Some(factory);
        Ok(())
    }

    /// 应用声明清单
    pub fn apply_manifest(&mut self, manifest: &DeclarationManifest) -> DeclarationResult<usize> {
        for entry in &manifest.services {
            self.register(
                ServiceId::new(&entry.name),
                entry.depends_on.iter().map(ServiceId::new),
                entry.global_only,
            )?;
        }

        info!("应用声明清单完成，共 {} 条", manifest.services.len());
        Ok(manifest.services.len())
    }

    /// 查找服务声明
    pub fn lookup(&self, id: &ServiceId) -> DeclarationResult<&ServiceDeclaration> {
        self.registrations
            .get(id)
            .map(|registration| &registration.declaration)
            .ok_or_else(|| DeclarationError::UnknownServiceType { service: id.clone() })
    }

    /// 是否已注册
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.registrations.contains_key(id)
    }

    /// `requester` 是否声明了对 `target` 的依赖
    pub fn depends_on(&self, requester: &ServiceId, target: &ServiceId) -> bool {
        self.registrations
            .get(requester)
            .is_some_and(|registration| registration.declaration.depends_on(target))
    }

    /// 是否为仅全局服务
    pub fn is_global_only(&self, id: &ServiceId) -> bool {
        self.registrations
            .get(id)
            .is_some_and(|registration| registration.declaration.global_only)
    }

    /// 获取默认工厂
    pub fn factory(&self, id: &ServiceId) -> Option<&ManagerFactory> {
        self.registrations
            .get(id)
            .and_then(|registration| registration.factory.as_ref())
    }

    /// 已注册的服务数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按注册顺序遍历声明
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDeclaration> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.registrations.get(id))
            .map(|registration| &registration.declaration)
    }

    /// 按注册顺序列出服务标识
    pub fn service_ids(&self) -> &[ServiceId] {
        &self.order
    }

    /// 验证声明表
    ///
    /// 返回所有指向未注册服务的依赖
    pub fn validate(&self) -> Result<(), Vec<DeclarationError>> {
        let mut errors = Vec::new();

        for declaration in self.iter() {
            for dependency in &declaration.dependencies {
                if !self.contains(dependency) {
                    warn!("服务 {} 依赖未注册的服务 {}", declaration.id, dependency);
                    errors.push(DeclarationError::UnknownServiceType {
                        service: dependency.clone(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for DeclarationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclarationRegistry")
            .field("declarations", &self.iter().collect::<Vec<_>>())
            .field(
                "factories",
                &self
                    .order
                    .iter()
                    .filter(|id| self.factory(id).is_some())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
