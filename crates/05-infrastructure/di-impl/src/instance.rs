//! 服务实例

use infrastructure_common::{manager_cell, Manager, ManagerCell, Phase, ServiceContext, ServiceId};
use std::fmt;
use tracing::trace;
use uuid::Uuid;

/// 服务实例
///
/// 由所属容器在初始化阶段创建，随容器销毁而移除
pub struct ServiceInstance {
    id: ServiceId,
    container: Uuid,
    enabled: bool,
    started: bool,
    cell: ManagerCell,
}

impl ServiceInstance {
    /// 创建服务实例
    pub(crate) fn new(id: ServiceId, container: Uuid, manager: Box<dyn Manager>) -> Self {
        Self {
            id,
            container,
            enabled: true,
            started: false,
            cell: manager_cell(manager),
        }
    }

    /// 服务标识
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// 所属容器
    pub fn container_id(&self) -> Uuid {
        self.container
    }

    /// 是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 设置启用状态
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 是否已调用 start
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    /// 共享存储
    pub fn cell(&self) -> &ManagerCell {
        &self.cell
    }

    /// 调用生命周期回调
    pub(crate) fn invoke(&self, phase: Phase, services: &ServiceContext<'_>) {
        trace!("{} -> {}", self.id, phase);
        let mut manager = self.cell.write();
        match phase {
            Phase::Awake => manager.on_awake(services),
            Phase::Start => manager.on_start(services),
            Phase::Update => manager.on_update(services),
            Phase::FixedUpdate => manager.on_fixed_update(services),
            Phase::LateUpdate => manager.on_late_update(services),
            Phase::Destroy => manager.on_destroy(),
        }
    }

    /// 调用销毁回调
    pub(crate) fn destroy(&self) {
        trace!("{} -> {}", self.id, Phase::Destroy);
        self.cell.write().on_destroy();
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("enabled", &self.enabled)
            .field("started", &self.started)
            .finish()
    }
}
