//! 运行时核心构建器

use crate::bootstrapper::ManagerCore;
use crate::config_sources::{load_core_config, load_manifest, CoreConfig};
use di_abstractions::{ContainerSpec, DeclarationManifest, DeclarationRegistry, ManagerFactory};
use infrastructure_common::{CoreError, CoreResult, Manager, ServiceId};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// 运行时核心构建器
///
/// 使用建造者模式完成服务声明、容器布局与日志配置，
/// `build` 时创建并初始化全部已配置的容器
pub struct ManagerCoreBuilder {
    /// 服务声明注册表
    registry: DeclarationRegistry,
    /// 启动时创建的容器（按顺序）
    containers: Vec<ContainerSpec>,
    /// 是否在构建时校验声明图
    validation_enabled: bool,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ManagerCoreBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            registry: DeclarationRegistry::new(),
            containers: Vec::new(),
            validation_enabled: true,
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 使用已有的声明注册表
    pub fn with_registry(mut self, registry: DeclarationRegistry) -> Self {
        debug!("使用外部声明注册表: {} 个服务", registry.len());
        self.registry = registry;
        self
    }

    /// 注册管理器类型
    pub fn register_manager<T: Manager + Default>(
        mut self,
        dependencies: impl IntoIterator<Item = ServiceId>,
        global_only: bool,
    ) -> CoreResult<Self> {
        self.registry.register_manager::<T>(dependencies, global_only)?;
        Ok(self)
    }

    /// 注册服务声明
    pub fn register(
        mut self,
        id: impl Into<ServiceId>,
        dependencies: impl IntoIterator<Item = ServiceId>,
        global_only: bool,
    ) -> CoreResult<Self> {
        self.registry.register(id.into(), dependencies, global_only)?;
        Ok(self)
    }

    /// 为已声明的服务绑定工厂
    pub fn bind_factory(mut self, id: impl Into<ServiceId>, factory: ManagerFactory) -> CoreResult<Self> {
        self.registry.bind_factory(&id.into(), factory)?;
        Ok(self)
    }

    /// 应用声明清单
    pub fn with_manifest(mut self, manifest: &DeclarationManifest) -> CoreResult<Self> {
        let applied = self.registry.apply_manifest(manifest)?;
        info!("应用声明清单: {} 个服务", applied);
        Ok(self)
    }

    /// 从文件加载并应用声明清单
    pub fn add_manifest_file<P: AsRef<Path>>(self, path: P) -> CoreResult<Self> {
        let manifest = load_manifest(path)?;
        self.with_manifest(&manifest)
    }

    /// 应用核心配置：日志设置与容器布局
    pub fn with_config(mut self, config: &CoreConfig) -> CoreResult<Self> {
        if config.logging.enabled {
            self = self.with_logging(config.logging.to_logging_config()?);
        }

        let specs = config.container_specs();
        debug!("核心配置声明了 {} 个容器", specs.len());
        self.containers.extend(specs);
        Ok(self)
    }

    /// 从文件加载并应用核心配置
    pub fn add_config_file<P: AsRef<Path>>(self, path: P) -> CoreResult<Self> {
        let config = load_core_config(path)?;
        self.with_config(&config)
    }

    /// 添加启动时创建的容器
    pub fn with_container(mut self, spec: ContainerSpec) -> Self {
        self.containers.push(spec);
        self
    }

    /// 启用或禁用声明图校验
    pub fn enable_validation(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建运行时核心
    ///
    /// 已配置的容器按顺序创建并初始化，单个容器初始化失败只记录警告
    pub fn build(self) -> CoreResult<ManagerCore> {
        info!("开始构建运行时核心");

        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        if self.validation_enabled {
            if let Err(errors) = self.registry.validate() {
                for error in &errors {
                    warn!("声明校验警告: {}", error);
                }
            }
        }

        let mut core = ManagerCore::init(Arc::new(self.registry))?;

        for spec in self.containers {
            core.driver_mut().create_container(spec)?;
        }

        for (handle, result) in core.driver_mut().initialize_all() {
            if let Err(error) = result {
                warn!("容器 {} 初始化失败: {}", handle, error);
            }
        }

        info!("运行时核心构建完成");
        Ok(core)
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> CoreResult<()> {
        let config = &self.logging_config;
        let level = config.level.as_str().to_ascii_lowercase();
        let filter = if config.prefer_env_filter {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
        } else {
            EnvFilter::new(level)
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number);

        if config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| CoreError::LoggingInitFailed {
            message: e.to_string(),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for ManagerCoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否优先使用 `RUST_LOG` 环境变量
    pub prefer_env_filter: bool,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            prefer_env_filter: true,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            prefer_env_filter: true,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            prefer_env_filter: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 指定日志级别，不再读取环境变量
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self.prefer_env_filter = false;
        self
    }
}
