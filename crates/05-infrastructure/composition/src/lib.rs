//! # 运行时组合层
//!
//! 将声明注册表、执行驱动器、日志与配置组合成进程内唯一的运行时核心。
//!
//! ## 主要功能
//!
//! - **核心构建器**: 使用构建者模式完成服务声明与容器布局
//! - **配置源**: 以 TOML / JSON 加载核心配置与声明清单
//! - **生命周期管理**: 运行时核心的初始化、逐帧驱动与关闭
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ManagerCore;
//! use di_abstractions::ContainerSpec;
//! use infrastructure_common::Manager;
//!
//! #[derive(Debug, Default)]
//! struct ScoreManager;
//! impl Manager for ScoreManager {}
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut core = ManagerCore::builder()
//!         .register_manager::<ScoreManager>([], false)?
//!         .with_container(ContainerSpec::global().request::<ScoreManager>())
//!         .build()?;
//!
//!     core.run_frame(1);
//!     assert!(core.get_global_manager::<ScoreManager>().is_some());
//!
//!     core.shutdown();
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod builder;
pub mod config_sources;

// 重新导出主要类型
pub use bootstrapper::{current_registry, is_core_initialized, ManagerCore};
pub use builder::{LoggingConfig, ManagerCoreBuilder};
pub use config_sources::{
    load_core_config, load_manifest, parse_document, ConfigFormat, ContainerLayout, CoreConfig,
    LoggingSettings, SessionLayout,
};

// 重新导出错误类型
pub use infrastructure_common::CoreError;
