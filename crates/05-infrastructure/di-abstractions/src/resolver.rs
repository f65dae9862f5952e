//! 依赖图解析器
//!
//! 有序请求列表 → 有序解析列表（依赖在前），或循环依赖错误。
//! 纯函数，不修改注册表，可重复调用。

use crate::registry::DeclarationRegistry;
use infrastructure_common::{ResolveError, ResolveResult, ServiceId};
use std::collections::HashMap;
use tracing::{trace, warn};

/// 访问标记，未出现在表中即为未访问
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitMark {
    InProgress,
    Done,
}

/// 依赖图解析器
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
    registry: &'a DeclarationRegistry,
}

impl<'a> DependencyResolver<'a> {
    /// 创建解析器
    pub fn new(registry: &'a DeclarationRegistry) -> Self {
        Self { registry }
    }

    /// 解析请求列表
    ///
    /// 结果包含每个请求的服务及其全部传递依赖，各出现一次；
    /// 对声明图中每一对（依赖, 依赖者），依赖的位置都在前面。
    /// 互不依赖的兄弟节点保持请求顺序。
    ///
    /// 遍历按依赖链深度递归，极深的依赖链可能耗尽调用栈。
    pub fn resolve(&self, requested: &[ServiceId]) -> ResolveResult<Vec<ServiceId>> {
        let mut marks: HashMap<ServiceId, VisitMark> = HashMap::new();
        let mut path: Vec<ServiceId> = Vec::new();
        let mut order: Vec<ServiceId> = Vec::new();

        for id in requested {
            if !marks.contains_key(id) {
                self.visit(id, &mut marks, &mut path, &mut order)?;
            }
        }

        trace!("依赖解析完成: {:?}", order);
        Ok(order)
    }

    /// 深度优先后序遍历
    fn visit(
        &self,
        current: &ServiceId,
        marks: &mut HashMap<ServiceId, VisitMark>,
        path: &mut Vec<ServiceId>,
        order: &mut Vec<ServiceId>,
    ) -> ResolveResult<()> {
        match marks.get(current) {
            Some(VisitMark::Done) => return Ok(()),
            Some(VisitMark::InProgress) => {
                let start = path.iter().position(|id| id == current).unwrap_or(0);
                let mut chain = path[start..].to_vec();
                chain.push(current.clone());

                warn!("检测到循环依赖: {}", current);
                return Err(ResolveError::CyclicDependency {
                    service: current.clone(),
                    chain,
                });
            }
            None => {}
        }

        let declaration = self.registry.lookup(current).map_err(|_| {
            if let Some(dependent) = path.last() {
                warn!("服务 {} 依赖未注册的服务 {}", dependent, current);
            }
            ResolveError::UnknownServiceType {
                service: current.clone(),
            }
        })?;

        marks.insert(current.clone(), VisitMark::InProgress);
        path.push(current.clone());

        for dependency in &declaration.dependencies {
            self.visit(dependency, marks, path, order)?;
        }

        path.pop();
        marks.insert(current.clone(), VisitMark::Done);
        order.push(current.clone());
        Ok(())
    }
}

/// 解析请求列表的便捷函数
pub fn resolve(registry: &DeclarationRegistry, requested: &[ServiceId]) -> ResolveResult<Vec<ServiceId>> {
    DependencyResolver::new(registry).resolve(requested)
}
