//! 管理器容器
//!
//! 每个容器拥有一组管理器实例，按依赖顺序创建并驱动 awake，
//! 之后由执行驱动器在各阶段分发回调。

use crate::instance::ServiceInstance;
use chrono::{DateTime, Utc};
use di_abstractions::{
    resolve, ContainerHandle, ContainerSnapshot, ContainerSpec, DeclarationRegistry,
    InitReport, InstanceSnapshot, ManagerFactory, SkippedService,
};
use infrastructure_common::{
    ContainerError, ContainerResult, ContainerState, Manager, ManagerCell, Phase,
    ServiceContext, ServiceError, ServiceHandle, ServiceId, ServiceLookup, ServiceResult,
};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 自动构造的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Autoconstructed {
    /// 本地已存在
    Existing,
    /// 由全局容器提供，未在本地创建
    ProvidedByGlobal,
    /// 新创建并已完成 awake
    Created,
}

/// 管理器容器
pub struct ManagerContainer {
    handle: ContainerHandle,
    registry: Arc<DeclarationRegistry>,
    requested: Vec<ServiceId>,
    prefabs: HashMap<ServiceId, ManagerFactory>,
    instances: HashMap<ServiceId, ServiceInstance>,
    creation_order: Vec<ServiceId>,
    pending_start: VecDeque<ServiceId>,
    active: Vec<ServiceId>,
    state: ContainerState,
    created_at: DateTime<Utc>,
}

/// 回调期间使用的查找视图
struct ContainerLookup<'a> {
    container: &'a ManagerContainer,
    global: Option<&'a ManagerContainer>,
}

impl ServiceLookup for ContainerLookup<'_> {
    fn lookup(&self, requester: &ServiceId, target: &ServiceId) -> ServiceResult<ManagerCell> {
        self.container.get_service(self.global, requester, target)
    }
}

impl ManagerContainer {
    /// 根据构造描述创建容器，初始状态为 `Uninitialized`
    pub fn new(spec: ContainerSpec, registry: Arc<DeclarationRegistry>) -> Self {
        let handle = ContainerHandle::new(spec.scope);
        debug!("创建容器: {}, 请求服务: {:?}", handle, spec.requested);

        Self {
            handle,
            registry,
            requested: spec.requested,
            prefabs: spec.prefabs,
            instances: HashMap::new(),
            creation_order: Vec::new(),
            pending_start: VecDeque::new(),
            active: Vec::new(),
            state: ContainerState::Uninitialized,
            created_at: Utc::now(),
        }
    }

    /// 容器句柄
    pub fn handle(&self) -> &ContainerHandle {
        &self.handle
    }

    /// 当前生命周期状态
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// 共享的声明注册表
    pub fn registry(&self) -> &Arc<DeclarationRegistry> {
        &self.registry
    }

    fn transition(&mut self, next: ContainerState) -> ContainerResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ContainerError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("容器 {} 状态迁移: {} -> {}", self.handle, self.state, next);
        self.state = next;
        Ok(())
    }

    /// 初始化容器
    ///
    /// 解析请求服务的依赖闭包，按依赖顺序创建实例并同步调用 awake。
    /// 单个服务的放置或工厂错误只会跳过该服务并记录在报告中；
    /// 依赖图解析失败时容器直接进入 `Destroyed` 并返回错误。
    ///
    /// `global` 为全局容器，会话容器通过它复用全局服务。
    pub fn initialize(&mut self, global: Option<&ManagerContainer>) -> ContainerResult<InitReport> {
        self.transition(ContainerState::Initializing)?;
        info!("初始化容器: {}", self.handle);

        let order = match resolve(&self.registry, &self.requested) {
            Ok(order) => order,
            Err(source) => {
                error!("容器 {} 依赖解析失败: {}", self.handle, source);
                self.state = ContainerState::Destroyed;
                return Err(source.into());
            }
        };

        let global = if self.handle.is_global() {
            None
        } else {
            global.filter(|container| container.handle.is_global() && !container.state.is_destroyed())
        };

        let mut report = InitReport::default();
        for id in order {
            if self.instances.contains_key(&id) {
                continue;
            }

            // 仅全局服务不能放在会话容器中
            if !self.handle.is_global() && self.registry.is_global_only(&id) {
                let error = ContainerError::InvalidPlacement {
                    service: id.clone(),
                    scope: self.handle.scope.to_string(),
                };
                warn!("{}", error);
                report.skipped.push(SkippedService { service: id, error });
                continue;
            }

            match self.autoconstruct(&id, global) {
                Ok(Autoconstructed::Created) => report.created.push(id),
                Ok(Autoconstructed::ProvidedByGlobal) => report.provided_by_global.push(id),
                Ok(Autoconstructed::Existing) => {}
                Err(error) => {
                    warn!("容器 {} 跳过服务 {}: {}", self.handle, id, error);
                    report.skipped.push(SkippedService { service: id, error });
                }
            }
        }

        self.transition(ContainerState::Active)?;
        info!(
            "容器 {} 初始化完成: 创建 {} 个, 全局提供 {} 个, 跳过 {} 个",
            self.handle,
            report.created.len(),
            report.provided_by_global.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// 确保服务在本容器中可用
    ///
    /// 本地已有则复用；会话容器优先复用全局实例；
    /// 否则用预制工厂或注册表工厂创建，立即调用 awake 并排入待 start 队列。
    pub(crate) fn autoconstruct(
        &mut self,
        id: &ServiceId,
        global: Option<&ManagerContainer>,
    ) -> ContainerResult<Autoconstructed> {
        if self.instances.contains_key(id) {
            return Ok(Autoconstructed::Existing);
        }

        if self.state != ContainerState::Initializing {
            return Err(ContainerError::InvalidStateTransition {
                from: self.state,
                to: ContainerState::Initializing,
            });
        }

        if !self.handle.is_global() {
            if let Some(global) = global {
                if global.contains(id) {
                    debug!("服务 {} 由全局容器提供", id);
                    return Ok(Autoconstructed::ProvidedByGlobal);
                }
            }
        }

        let factory = self
            .prefabs
            .get(id)
            .or_else(|| self.registry.factory(id))
            .cloned()
            .ok_or_else(|| ContainerError::MissingFactory {
                service: id.clone(),
            })?;

        let instance = ServiceInstance::new(id.clone(), self.handle.id, factory());
        self.instances.insert(id.clone(), instance);
        self.creation_order.push(id.clone());

        let lookup = ContainerLookup {
            container: self,
            global,
        };
        if let Some(instance) = self.instances.get(id) {
            instance.invoke(Phase::Awake, &ServiceContext::new(id, &lookup));
        }

        self.pending_start.push_back(id.clone());
        debug!("容器 {} 创建服务: {}", self.handle, id);
        Ok(Autoconstructed::Created)
    }

    /// 按声明契约查找服务
    ///
    /// `requester` 只能获取它声明过的依赖。会话容器在本地找不到时
    /// 回退到全局容器。失败时记录警告并返回错误。
    pub fn get_service(
        &self,
        global: Option<&ManagerContainer>,
        requester: &ServiceId,
        target: &ServiceId,
    ) -> ServiceResult<ManagerCell> {
        let result = self.lookup_service(global, requester, target);
        if let Err(error) = &result {
            warn!("容器 {} 查找服务失败: {}", self.handle, error);
        }
        result
    }

    fn lookup_service(
        &self,
        global: Option<&ManagerContainer>,
        requester: &ServiceId,
        target: &ServiceId,
    ) -> ServiceResult<ManagerCell> {
        if self.state.is_destroyed() || !self.registry.contains(requester) {
            return Err(ServiceError::UnknownServiceType {
                service: requester.clone(),
            });
        }

        if !self.registry.depends_on(requester, target) {
            return Err(ServiceError::UndeclaredDependencyAccess {
                requester: requester.clone(),
                target: target.clone(),
            });
        }

        if let Some(instance) = self.instances.get(target) {
            return Ok(instance.cell().clone());
        }

        if !self.handle.is_global() {
            let from_global = global
                .filter(|container| container.handle.is_global() && !container.state.is_destroyed())
                .and_then(|container| container.find_local(target));
            if let Some(instance) = from_global {
                return Ok(instance.cell().clone());
            }
        }

        Err(ServiceError::MissingInstance {
            requester: requester.clone(),
            target: target.clone(),
        })
    }

    /// 按类型查找 `requester` 声明过的依赖
    pub fn get<T: Manager>(
        &self,
        global: Option<&ManagerContainer>,
        requester: &ServiceId,
    ) -> ServiceResult<ServiceHandle<T>> {
        let target = ServiceId::of::<T>();
        let cell = self.get_service(global, requester, &target)?;
        ServiceHandle::new(target, cell)
    }

    /// 本地实例，不做契约检查
    pub fn find_local(&self, id: &ServiceId) -> Option<&ServiceInstance> {
        self.instances.get(id)
    }

    /// 本地是否存在该服务的实例
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.instances.contains_key(id)
    }

    /// 本地实例数量
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// 是否没有本地实例
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// 设置服务的启用状态
    ///
    /// 禁用的实例不接收 update 类阶段的回调。返回服务是否存在。
    pub fn set_enabled(&mut self, id: &ServiceId, enabled: bool) -> bool {
        match self.instances.get_mut(id) {
            Some(instance) => {
                instance.set_enabled(enabled);
                debug!("容器 {} 服务 {} 启用状态: {}", self.handle, id, enabled);
                true
            }
            None => false,
        }
    }

    /// 诊断快照
    pub fn snapshot(&self) -> ContainerSnapshot {
        let instances = self
            .creation_order
            .iter()
            .filter_map(|id| self.instances.get(id))
            .map(|instance| InstanceSnapshot {
                service: instance.id().clone(),
                enabled: instance.is_enabled(),
                started: instance.is_started(),
            })
            .collect();

        ContainerSnapshot {
            handle: self.handle.clone(),
            state: self.state,
            created_at: self.created_at,
            instances,
        }
    }

    /// 已进入活动列表的服务（按 start 顺序）
    pub fn active_services(&self) -> &[ServiceId] {
        &self.active
    }

    /// 等待 start 的服务数量
    pub fn pending_start_len(&self) -> usize {
        self.pending_start.len()
    }

    /// 对待 start 队列做一次排空
    ///
    /// 只处理进入时已在队列中的实例：调用 start 并移入活动列表。
    /// 返回本次启动的实例数量。
    pub fn drain_pending_start(&mut self, global: Option<&ManagerContainer>) -> usize {
        if !self.state.is_active() {
            return 0;
        }

        let count = self.pending_start.len();
        let batch: Vec<ServiceId> = self.pending_start.drain(..count).collect();
        let global = global.filter(|container| container.handle.is_global() && !self.handle.is_global());

        for id in batch {
            {
                let lookup = ContainerLookup {
                    container: self,
                    global,
                };
                match self.instances.get(&id) {
                    Some(instance) => instance.invoke(Phase::Start, &ServiceContext::new(&id, &lookup)),
                    None => continue,
                }
            }

            if let Some(instance) = self.instances.get_mut(&id) {
                instance.mark_started();
            }
            self.active.push(id);
        }

        count
    }

    /// 向所有启用的活动实例分发更新阶段
    ///
    /// 只接受 update、fixed update 与 late update。返回收到回调的实例数量。
    pub fn dispatch(&self, phase: Phase, global: Option<&ManagerContainer>) -> usize {
        if !self.state.is_active() || !Phase::TICK_PHASES.contains(&phase) {
            return 0;
        }

        let global = global.filter(|container| container.handle.is_global() && !self.handle.is_global());
        let lookup = ContainerLookup {
            container: self,
            global,
        };

        let mut dispatched = 0;
        for id in &self.active {
            if let Some(instance) = self.instances.get(id).filter(|instance| instance.is_enabled()) {
                instance.invoke(phase, &ServiceContext::new(id, &lookup));
                dispatched += 1;
            }
        }
        dispatched
    }

    /// 销毁容器
    ///
    /// 按创建顺序的逆序调用 destroy（依赖者先于依赖），
    /// 清空全部实例。对已销毁的容器无操作。
    pub fn destroy(&mut self) {
        if self.state.is_destroyed() {
            return;
        }

        info!("销毁容器: {}, 实例数: {}", self.handle, self.instances.len());
        for id in self.creation_order.iter().rev() {
            if let Some(instance) = self.instances.get(id) {
                instance.destroy();
            }
        }

        self.instances.clear();
        self.creation_order.clear();
        self.pending_start.clear();
        self.active.clear();
        self.state = ContainerState::Destroyed;
    }
}

impl Drop for ManagerContainer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for ManagerContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerContainer")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("requested", &self.requested)
            .field("instances", &self.creation_order)
            .field("pending_start", &self.pending_start)
            .field("active", &self.active)
            .finish()
    }
}
