//! 管理器基础接口定义
//!
//! 提供所有管理器必须实现的基础 trait，以及生命周期回调中访问依赖的上下文

use crate::errors::{ServiceError, ServiceResult};
use crate::metadata::ServiceId;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 向 `Any` 转换的辅助 trait，对所有 `'static` 类型自动实现
pub trait AsAny: Any {
    /// 转换为 `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// 转换为 `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 管理器基础 trait
///
/// 管理器是长生命周期的单例服务，由容器按依赖顺序创建，
/// 并由执行驱动器按阶段调用以下回调。所有回调默认为空实现。
pub trait Manager: AsAny + Send + Sync + fmt::Debug {
    /// 实例创建后立即调用，此时所有已声明的依赖都已完成 awake
    fn on_awake(&mut self, _services: &ServiceContext<'_>) {}

    /// 创建后的下一次帧开始时调用一次
    fn on_start(&mut self, _services: &ServiceContext<'_>) {}

    /// 每帧更新
    fn on_update(&mut self, _services: &ServiceContext<'_>) {}

    /// 固定步长更新
    fn on_fixed_update(&mut self, _services: &ServiceContext<'_>) {}

    /// 帧末更新
    fn on_late_update(&mut self, _services: &ServiceContext<'_>) {}

    /// 所属容器销毁时调用
    fn on_destroy(&mut self) {}
}

/// 管理器实例的共享存储
pub type ManagerCell = Arc<RwLock<Box<dyn Manager>>>;

/// 将管理器包装为共享存储
pub fn manager_cell(manager: Box<dyn Manager>) -> ManagerCell {
    Arc::new(RwLock::new(manager))
}

/// 向下转换为具体管理器类型
pub fn downcast_ref<T: Manager>(manager: &dyn Manager) -> Option<&T> {
    manager.as_any().downcast_ref::<T>()
}

/// 向下转换为具体管理器类型（可变）
pub fn downcast_mut<T: Manager>(manager: &mut dyn Manager) -> Option<&mut T> {
    manager.as_any_mut().downcast_mut::<T>()
}

/// 服务查找 trait
///
/// 由容器实现，按声明契约解析依赖
pub trait ServiceLookup {
    /// 查找 `requester` 已声明的依赖 `target`
    fn lookup(&self, requester: &ServiceId, target: &ServiceId) -> ServiceResult<ManagerCell>;
}

/// 生命周期回调中的服务上下文
///
/// 请求者即当前正在执行回调的管理器，只能访问它声明过的依赖
pub struct ServiceContext<'a> {
    requester: &'a ServiceId,
    lookup: &'a dyn ServiceLookup,
}

impl<'a> ServiceContext<'a> {
    /// 创建新的服务上下文
    pub fn new(requester: &'a ServiceId, lookup: &'a dyn ServiceLookup) -> Self {
        Self { requester, lookup }
    }

    /// 当前请求者
    pub fn requester(&self) -> &ServiceId {
        self.requester
    }

    /// 获取依赖的管理器
    ///
    /// 失败时返回 `None`，诊断信息已由容器记录
    pub fn get<T: Manager>(&self) -> Option<ServiceHandle<T>> {
        self.try_get::<T>().ok()
    }

    /// 获取依赖的管理器，返回具体错误
    pub fn try_get<T: Manager>(&self) -> ServiceResult<ServiceHandle<T>> {
        self.try_get_named::<T>(&ServiceId::of::<T>())
    }

    /// 按服务标识获取依赖的管理器
    ///
    /// 用于以自定义名称注册的服务
    pub fn try_get_named<T: Manager>(&self, target: &ServiceId) -> ServiceResult<ServiceHandle<T>> {
        let cell = self.lookup.lookup(self.requester, target)?;
        ServiceHandle::new(target.clone(), cell)
    }
}

impl fmt::Debug for ServiceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("requester", &self.requester)
            .finish()
    }
}

/// 强类型管理器句柄
///
/// 创建时已校验实例类型，可以跨帧持有
pub struct ServiceHandle<T> {
    id: ServiceId,
    cell: ManagerCell,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Manager> ServiceHandle<T> {
    /// 创建句柄，校验实例类型
    pub fn new(id: ServiceId, cell: ManagerCell) -> ServiceResult<Self> {
        let matches = (**cell.read()).as_any().is::<T>();
        if !matches {
            return Err(ServiceError::TypeMismatch {
                service: id,
                expected: std::any::type_name::<T>(),
            });
        }

        Ok(Self {
            id,
            cell,
            _marker: PhantomData,
        })
    }

    /// 服务标识
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// 只读访问
    pub fn read(&self) -> MappedRwLockReadGuard<'_, T> {
        RwLockReadGuard::map(self.cell.read(), |manager| {
            downcast_ref::<T>(&**manager).expect("instance type is checked when the handle is created")
        })
    }

    /// 可变访问
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, T> {
        RwLockWriteGuard::map(self.cell.write(), |manager| {
            downcast_mut::<T>(&mut **manager).expect("instance type is checked when the handle is created")
        })
    }

    /// 是否指向同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T> Clone for ServiceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            cell: Arc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ServiceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
