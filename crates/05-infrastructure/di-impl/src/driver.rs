//! 执行驱动器
//!
//! 持有全局容器与按注册顺序排列的会话容器，
//! 负责容器的创建、初始化、销毁以及每帧的阶段分发。

use crate::container::ManagerContainer;
use di_abstractions::{ContainerHandle, ContainerSnapshot, ContainerSpec, DeclarationRegistry, InitReport};
use infrastructure_common::{
    ContainerError, ContainerResult, ContainerState, Manager, ManagerCell, Phase, ScopeKind,
    ServiceError, ServiceHandle, ServiceId, ServiceResult, SessionId,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 执行驱动器
#[derive(Debug)]
pub struct ExecutionDriver {
    registry: Arc<DeclarationRegistry>,
    global: Option<ManagerContainer>,
    sessions: Vec<ManagerContainer>,
    tick_count: u64,
}

impl ExecutionDriver {
    /// 创建驱动器
    pub fn new(registry: Arc<DeclarationRegistry>) -> Self {
        Self {
            registry,
            global: None,
            sessions: Vec::new(),
            tick_count: 0,
        }
    }

    /// 共享的声明注册表
    pub fn registry(&self) -> &Arc<DeclarationRegistry> {
        &self.registry
    }

    /// 创建容器
    ///
    /// 全局容器只能存在一个；同一会话标识只能对应一个存活的会话容器。
    pub fn create_container(&mut self, spec: ContainerSpec) -> ContainerResult<ContainerHandle> {
        match &spec.scope {
            ScopeKind::Global => {
                if self.global.is_some() {
                    error!("重复创建全局容器");
                    return Err(ContainerError::DuplicateGlobalContainer);
                }
            }
            ScopeKind::Session(session) => {
                if self.session_index(session).is_some() {
                    error!("重复创建会话容器: {}", session);
                    return Err(ContainerError::DuplicateSession {
                        session: session.clone(),
                    });
                }
            }
        }

        let container = ManagerContainer::new(spec, self.registry.clone());
        let handle = container.handle().clone();
        if handle.is_global() {
            self.global = Some(container);
        } else {
            self.sessions.push(container);
        }

        info!("已创建容器: {}", handle);
        Ok(handle)
    }

    /// 初始化容器
    ///
    /// 会话容器初始化前，若全局容器仍未初始化则先初始化全局容器。
    /// 依赖解析失败而进入 `Destroyed` 的容器会从驱动器中移除；
    /// 对已初始化的容器重复调用只返回错误，容器保持原状。
    pub fn initialize(&mut self, handle: &ContainerHandle) -> ContainerResult<InitReport> {
        if handle.is_global() {
            return self.initialize_global(handle);
        }

        let index = self
            .sessions
            .iter()
            .position(|container| container.handle() == handle)
            .ok_or_else(|| not_found(handle))?;

        if let Some(global) = self.global.as_ref() {
            if global.state() == ContainerState::Uninitialized {
                let global_handle = global.handle().clone();
                debug!("会话容器 {} 初始化前先初始化全局容器", handle);
                if let Err(source) = self.initialize_global(&global_handle) {
                    warn!("全局容器初始化失败，会话容器 {} 将不使用全局服务: {}", handle, source);
                }
            }
        }

        let result = self.sessions[index].initialize(self.global.as_ref());
        if let Err(source) = &result {
            error!("会话容器 {} 初始化失败: {}", handle, source);
            if self.sessions[index].state().is_destroyed() {
                self.sessions.remove(index);
            }
        }
        result
    }

    fn initialize_global(&mut self, handle: &ContainerHandle) -> ContainerResult<InitReport> {
        let global = self
            .global
            .as_mut()
            .filter(|container| container.handle() == handle)
            .ok_or_else(|| not_found(handle))?;

        let result = global.initialize(None);
        if let Err(source) = &result {
            error!("全局容器初始化失败: {}", source);
            if global.state().is_destroyed() {
                self.global = None;
            }
        }
        result
    }

    /// 初始化所有未初始化的容器
    ///
    /// 先全局后会话（按注册顺序）；单个容器的失败不影响其他容器。
    pub fn initialize_all(&mut self) -> Vec<(ContainerHandle, ContainerResult<InitReport>)> {
        let pending: Vec<ContainerHandle> = self
            .global
            .iter()
            .chain(self.sessions.iter())
            .filter(|container| container.state() == ContainerState::Uninitialized)
            .map(|container| container.handle().clone())
            .collect();

        pending
            .into_iter()
            .map(|handle| {
                let result = self.initialize(&handle);
                (handle, result)
            })
            .collect()
    }

    /// 销毁容器并将其移出分发集合
    pub fn destroy(&mut self, handle: &ContainerHandle) -> ContainerResult<()> {
        if handle.is_global() {
            match self.global.take() {
                Some(mut global) if global.handle() == handle => {
                    global.destroy();
                    Ok(())
                }
                other => {
                    self.global = other;
                    Err(not_found(handle))
                }
            }
        } else {
            let index = self
                .sessions
                .iter()
                .position(|container| container.handle() == handle)
                .ok_or_else(|| not_found(handle))?;
            self.sessions.remove(index).destroy();
            Ok(())
        }
    }

    /// 按会话标识销毁会话容器
    pub fn destroy_session(&mut self, session: &SessionId) -> ContainerResult<()> {
        let index = self
            .session_index(session)
            .ok_or_else(|| ContainerError::ContainerNotFound {
                container: ScopeKind::Session(session.clone()).to_string(),
            })?;
        self.sessions.remove(index).destroy();
        Ok(())
    }

    /// 销毁全局容器
    pub fn destroy_global(&mut self) -> ContainerResult<()> {
        let mut global = self
            .global
            .take()
            .ok_or_else(|| ContainerError::ContainerNotFound {
                container: ScopeKind::Global.to_string(),
            })?;
        global.destroy();
        Ok(())
    }

    /// 关闭驱动器
    ///
    /// 按注册顺序的逆序销毁会话容器，最后销毁全局容器
    pub fn shutdown(&mut self) {
        info!("关闭执行驱动器: {} 个会话容器", self.sessions.len());
        while let Some(mut session) = self.sessions.pop() {
            session.destroy();
        }
        if let Some(mut global) = self.global.take() {
            global.destroy();
        }
    }

    /// 帧开始
    ///
    /// 各容器排空一次待 start 队列，只处理进入时已排队的实例
    pub fn on_frame_start(&mut self) {
        self.tick_count += 1;

        let mut started = 0;
        if let Some(global) = self.global.as_mut() {
            started += global.drain_pending_start(None);
        }
        for session in &mut self.sessions {
            started += session.drain_pending_start(self.global.as_ref());
        }

        if started > 0 {
            debug!("第 {} 帧开始: 启动 {} 个实例", self.tick_count, started);
        }
    }

    /// 每帧更新
    pub fn on_update(&self) {
        self.dispatch(Phase::Update);
    }

    /// 固定步长更新
    pub fn on_fixed_update(&self) {
        self.dispatch(Phase::FixedUpdate);
    }

    /// 帧末更新
    pub fn on_late_update(&self) {
        self.dispatch(Phase::LateUpdate);
    }

    fn dispatch(&self, phase: Phase) {
        let global = self.global.as_ref();
        let mut dispatched = global.map_or(0, |container| container.dispatch(phase, None));
        for session in &self.sessions {
            dispatched += session.dispatch(phase, global);
        }
        if dispatched > 0 {
            tracing::trace!("分发阶段 {}: {} 个实例", phase, dispatched);
        }
    }

    /// 获取会话中的管理器，本地没有时回退到全局容器
    pub fn get_manager<T: Manager>(&self, session: &SessionId) -> Option<ServiceHandle<T>> {
        let id = ServiceId::of::<T>();
        let cell = self
            .session(session)
            .and_then(|container| container.find_local(&id))
            .or_else(|| self.global.as_ref().and_then(|global| global.find_local(&id)))
            .map(|instance| instance.cell().clone());

        match cell {
            Some(cell) => typed(id, cell),
            None => {
                debug!("会话 {} 中不存在管理器 {}", session, id);
                None
            }
        }
    }

    /// 获取全局容器中的管理器
    pub fn get_global_manager<T: Manager>(&self) -> Option<ServiceHandle<T>> {
        let id = ServiceId::of::<T>();
        let cell = self
            .global
            .as_ref()
            .and_then(|global| global.find_local(&id))
            .map(|instance| instance.cell().clone())?;
        typed(id, cell)
    }

    /// 在指定容器中按声明契约查找服务
    ///
    /// 容器不存在（或已销毁移除）时返回 `UnknownServiceType`
    pub fn get_service(
        &self,
        handle: &ContainerHandle,
        requester: &ServiceId,
        target: &ServiceId,
    ) -> ServiceResult<ManagerCell> {
        match self.container(handle) {
            Some(container) => container.get_service(self.global.as_ref(), requester, target),
            None => {
                warn!("容器 {} 不存在，无法查找服务 {}", handle, target);
                Err(ServiceError::UnknownServiceType {
                    service: requester.clone(),
                })
            }
        }
    }

    /// 设置容器中服务的启用状态
    pub fn set_enabled(
        &mut self,
        handle: &ContainerHandle,
        service: &ServiceId,
        enabled: bool,
    ) -> ContainerResult<bool> {
        let container = if handle.is_global() {
            self.global.as_mut().filter(|container| container.handle() == handle)
        } else {
            self.sessions.iter_mut().find(|container| container.handle() == handle)
        };
        container
            .map(|container| container.set_enabled(service, enabled))
            .ok_or_else(|| not_found(handle))
    }

    /// 按句柄获取容器
    pub fn container(&self, handle: &ContainerHandle) -> Option<&ManagerContainer> {
        if handle.is_global() {
            self.global.as_ref().filter(|container| container.handle() == handle)
        } else {
            self.sessions.iter().find(|container| container.handle() == handle)
        }
    }

    /// 全局容器
    pub fn global(&self) -> Option<&ManagerContainer> {
        self.global.as_ref()
    }

    /// 按会话标识获取会话容器
    pub fn session(&self, session: &SessionId) -> Option<&ManagerContainer> {
        self.session_index(session).map(|index| &self.sessions[index])
    }

    fn session_index(&self, session: &SessionId) -> Option<usize> {
        self.sessions
            .iter()
            .position(|container| container.handle().scope.session_id() == Some(session))
    }

    /// 容器状态，已移除的容器返回 `None`
    pub fn container_state(&self, handle: &ContainerHandle) -> Option<ContainerState> {
        self.container(handle).map(ManagerContainer::state)
    }

    /// 容器诊断快照
    pub fn snapshot(&self, handle: &ContainerHandle) -> Option<ContainerSnapshot> {
        self.container(handle).map(ManagerContainer::snapshot)
    }

    /// 所有存活容器的句柄（全局在前，会话按注册顺序）
    pub fn handles(&self) -> Vec<ContainerHandle> {
        self.global
            .iter()
            .chain(self.sessions.iter())
            .map(|container| container.handle().clone())
            .collect()
    }

    /// 已经过的帧数
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl Drop for ExecutionDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn not_found(handle: &ContainerHandle) -> ContainerError {
    ContainerError::ContainerNotFound {
        container: handle.to_string(),
    }
}

fn typed<T: Manager>(id: ServiceId, cell: ManagerCell) -> Option<ServiceHandle<T>> {
    match ServiceHandle::new(id, cell) {
        Ok(handle) => Some(handle),
        Err(source) => {
            warn!("{}", source);
            None
        }
    }
}
