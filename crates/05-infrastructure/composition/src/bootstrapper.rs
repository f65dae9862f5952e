//! 运行时核心
//!
//! 进程内只允许存在一个运行时核心。核心持有执行驱动器，
//! 并在存活期间对外发布当前的声明注册表。

use crate::builder::ManagerCoreBuilder;
use di_abstractions::{ContainerHandle, ContainerSpec, DeclarationRegistry, InitReport};
use di_impl::ExecutionDriver;
use infrastructure_common::{CoreError, CoreResult, Manager, ServiceHandle, SessionId};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// 当前存活核心的声明注册表
static CURRENT_REGISTRY: Lazy<RwLock<Option<Arc<DeclarationRegistry>>>> =
    Lazy::new(|| RwLock::new(None));

/// 获取当前存活核心的声明注册表
pub fn current_registry() -> Option<Arc<DeclarationRegistry>> {
    CURRENT_REGISTRY.read().clone()
}

/// 是否存在存活的运行时核心
pub fn is_core_initialized() -> bool {
    CURRENT_REGISTRY.read().is_some()
}

/// 运行时核心
#[derive(Debug)]
pub struct ManagerCore {
    driver: ExecutionDriver,
    live: bool,
}

impl ManagerCore {
    /// 创建运行时核心构建器
    pub fn builder() -> ManagerCoreBuilder {
        ManagerCoreBuilder::new()
    }

    /// 初始化运行时核心
    ///
    /// 已有存活核心时返回 `AlreadyInitialized`
    pub fn init(registry: Arc<DeclarationRegistry>) -> CoreResult<Self> {
        {
            let mut current = CURRENT_REGISTRY.write();
            if current.is_some() {
                return Err(CoreError::AlreadyInitialized);
            }
            *current = Some(registry.clone());
        }

        info!("运行时核心已初始化: {} 个服务声明", registry.len());
        Ok(Self {
            driver: ExecutionDriver::new(registry),
            live: true,
        })
    }

    /// 执行驱动器
    pub fn driver(&self) -> &ExecutionDriver {
        &self.driver
    }

    /// 执行驱动器（可变）
    pub fn driver_mut(&mut self) -> &mut ExecutionDriver {
        &mut self.driver
    }

    /// 声明注册表
    pub fn registry(&self) -> &Arc<DeclarationRegistry> {
        self.driver.registry()
    }

    /// 核心是否存活
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// 创建并初始化容器
    pub fn open_container(&mut self, spec: ContainerSpec) -> CoreResult<(ContainerHandle, InitReport)> {
        let handle = self.driver.create_container(spec)?;
        let report = self.driver.initialize(&handle)?;
        Ok((handle, report))
    }

    /// 关闭会话容器
    pub fn close_session(&mut self, session: &SessionId) -> CoreResult<()> {
        self.driver.destroy_session(session)?;
        Ok(())
    }

    /// 驱动一帧
    ///
    /// 依次执行帧开始、更新、`fixed_steps` 次固定步长更新和帧末更新
    pub fn run_frame(&mut self, fixed_steps: u32) {
        self.driver.on_frame_start();
        self.driver.on_update();
        for _ in 0..fixed_steps {
            self.driver.on_fixed_update();
        }
        self.driver.on_late_update();
    }

    /// 获取会话中的管理器，本地没有时回退到全局容器
    pub fn get_manager<T: Manager>(&self, session: &SessionId) -> Option<ServiceHandle<T>> {
        self.driver.get_manager::<T>(session)
    }

    /// 获取全局容器中的管理器
    pub fn get_global_manager<T: Manager>(&self) -> Option<ServiceHandle<T>> {
        self.driver.get_global_manager::<T>()
    }

    /// 关闭运行时核心
    ///
    /// 销毁全部容器并释放进程内的核心标记，重复调用无操作
    pub fn shutdown(&mut self) {
        if !self.live {
            return;
        }

        self.driver.shutdown();
        CURRENT_REGISTRY.write().take();
        self.live = false;
        info!("运行时核心已关闭，共运行 {} 帧", self.driver.tick_count());
    }
}

impl Drop for ManagerCore {
    fn drop(&mut self) {
        if self.live {
            debug!("运行时核心在析构时关闭");
        }
        self.shutdown();
    }
}
