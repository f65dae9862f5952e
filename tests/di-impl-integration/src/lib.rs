//! 集中集成测试的共享夹具
//!
//! [`Recorder`] 把收到的每个生命周期回调写入共享的 [`Journal`]，
//! 测试据此断言回调顺序。

use di_abstractions::{factory_fn, DeclarationRegistry};
use infrastructure_common::{Manager, ServiceContext, ServiceId};
use parking_lot::Mutex;
use std::sync::Arc;

/// 回调记录
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// 追加一条记录
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    /// 当前全部记录
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// 清空记录
    pub fn clear(&self) {
        self.0.lock().clear();
    }

    /// 某条记录的位置
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|recorded| recorded == entry)
    }

    /// 某条记录出现的次数
    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|recorded| *recorded == entry).count()
    }
}

/// 记录回调的管理器
#[derive(Debug)]
pub struct Recorder {
    name: String,
    journal: Journal,
}

impl Recorder {
    fn record(&self, hook: &str) {
        self.journal.push(format!("{}.{}", self.name, hook));
    }
}

impl Manager for Recorder {
    fn on_awake(&mut self, _services: &ServiceContext<'_>) {
        self.record("awake");
    }

    fn on_start(&mut self, _services: &ServiceContext<'_>) {
        self.record("start");
    }

    fn on_update(&mut self, _services: &ServiceContext<'_>) {
        self.record("update");
    }

    fn on_fixed_update(&mut self, _services: &ServiceContext<'_>) {
        self.record("fixed_update");
    }

    fn on_late_update(&mut self, _services: &ServiceContext<'_>) {
        self.record("late_update");
    }

    fn on_destroy(&mut self) {
        self.record("destroy");
    }
}

/// 声明图中的一个服务：名称、依赖、是否仅全局
pub type Declaration<'a> = (&'a str, &'a [&'a str], bool);

/// 按声明图构建注册表，每个服务都绑定一个 [`Recorder`] 工厂
pub fn recorder_registry(graph: &[Declaration<'_>], journal: &Journal) -> DeclarationRegistry {
    let mut registry = DeclarationRegistry::new();
    for &(name, dependencies, global_only) in graph {
        let id = ServiceId::new(name);
        registry
            .register(id.clone(), dependencies.iter().map(ServiceId::new), global_only)
            .expect("test declarations must be valid");

        let journal = journal.clone();
        let name = name.to_string();
        registry
            .bind_factory(
                &id,
                factory_fn(move || Recorder {
                    name: name.clone(),
                    journal: journal.clone(),
                }),
            )
            .expect("service was just declared");
    }
    registry
}

/// 服务标识列表
pub fn ids(names: &[&str]) -> Vec<ServiceId> {
    names.iter().map(ServiceId::new).collect()
}
