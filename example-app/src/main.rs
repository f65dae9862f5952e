//! # 示例应用程序
//!
//! 演示如何声明管理器、按配置创建全局与会话容器，并逐帧驱动生命周期

use anyhow::{Context, Result};
use clap::Parser;
use di_abstractions::ContainerSpec;
use infrastructure_common::{Manager, ServiceContext, ServiceId, SessionId};
use infrastructure_composition::{LoggingConfig, ManagerCore, ManagerCoreBuilder};
use std::path::PathBuf;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 管理器容器示例应用")]
struct Args {
    /// 核心配置文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 运行的帧数
    #[arg(long, default_value_t = 5)]
    frames: u32,

    /// 每帧的固定步长更新次数
    #[arg(long, default_value_t = 2)]
    fixed_steps: u32,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// 游戏设置，只能放在全局容器中
#[derive(Debug)]
struct GameSettings {
    points_per_frame: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self { points_per_frame: 10 }
    }
}

impl Manager for GameSettings {
    fn on_awake(&mut self, _services: &ServiceContext<'_>) {
        info!("GameSettings 就绪: 每帧 {} 分", self.points_per_frame);
    }
}

/// 音效管理器
#[derive(Debug, Default)]
struct AudioManager {
    played: Vec<String>,
}

impl AudioManager {
    fn play(&mut self, clip: &str) {
        self.played.push(clip.to_string());
    }
}

impl Manager for AudioManager {
    fn on_destroy(&mut self) {
        info!("AudioManager 销毁，共播放 {} 个音效", self.played.len());
    }
}

/// 分数管理器
#[derive(Debug, Default)]
struct ScoreManager {
    score: u32,
}

impl Manager for ScoreManager {
    fn on_start(&mut self, _services: &ServiceContext<'_>) {
        info!("ScoreManager 开始计分");
    }
}

/// 玩家管理器，依赖分数、设置与音效
#[derive(Debug, Default)]
struct PlayerManager {
    physics_steps: u32,
}

impl Manager for PlayerManager {
    fn on_update(&mut self, services: &ServiceContext<'_>) {
        let points = services
            .get::<GameSettings>()
            .map_or(1, |settings| settings.read().points_per_frame);

        if let Some(score) = services.get::<ScoreManager>() {
            score.write().score += points;
        }
    }

    fn on_fixed_update(&mut self, _services: &ServiceContext<'_>) {
        self.physics_steps += 1;
    }

    fn on_late_update(&mut self, services: &ServiceContext<'_>) {
        if self.physics_steps % 5 == 0 {
            if let Some(audio) = services.get::<AudioManager>() {
                audio.write().play("footstep");
            }
        }
    }
}

/// HUD 管理器，依赖玩家与分数
#[derive(Debug, Default)]
struct HudManager {
    last_score: u32,
}

impl Manager for HudManager {
    fn on_late_update(&mut self, services: &ServiceContext<'_>) {
        if let Some(score) = services.get::<ScoreManager>() {
            self.last_score = score.read().score;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut core = build_core(&args)?;
    info!("启动 Lorn ADSP 示例应用");

    if core.driver().handles().is_empty() {
        info!("未提供容器配置，使用默认布局");
        open_default_layout(&mut core)?;
    }

    for frame in 1..=args.frames {
        core.run_frame(args.fixed_steps);
        report_frame(&core, frame);
    }

    for handle in core.driver().handles() {
        if let Some(snapshot) = core.driver().snapshot(&handle) {
            let services: Vec<&str> = snapshot
                .instances
                .iter()
                .map(|instance| instance.service.as_str())
                .collect();
            info!("容器 {} [{}]: {:?}", snapshot.handle, snapshot.state, services);
        }
    }

    core.shutdown();
    info!("应用已关闭");
    Ok(())
}

/// 声明全部管理器并按配置构建运行时核心
fn build_core(args: &Args) -> Result<ManagerCore> {
    let level = args
        .log_level
        .parse::<tracing::Level>()
        .with_context(|| format!("无效的日志级别: {}", args.log_level))?;

    let mut builder = declare_managers(ManagerCore::builder())?
        .with_logging(LoggingConfig::default().with_level(level));

    if let Some(path) = &args.config {
        builder = builder
            .add_config_file(path)
            .with_context(|| format!("加载配置文件失败: {}", path.display()))?;
    }

    builder.build().context("构建运行时核心失败")
}

fn declare_managers(builder: ManagerCoreBuilder) -> Result<ManagerCoreBuilder> {
    let settings = ServiceId::of::<GameSettings>();
    let audio = ServiceId::of::<AudioManager>();
    let score = ServiceId::of::<ScoreManager>();
    let player = ServiceId::of::<PlayerManager>();

    let builder = builder
        .register_manager::<GameSettings>([], true)?
        .register_manager::<AudioManager>([], false)?
        .register_manager::<ScoreManager>([], false)?
        .register_manager::<PlayerManager>([score.clone(), settings, audio], false)?
        .register_manager::<HudManager>([player, score], false)?;
    Ok(builder)
}

fn open_default_layout(core: &mut ManagerCore) -> Result<()> {
    core.open_container(
        ContainerSpec::global()
            .request::<GameSettings>()
            .request::<AudioManager>(),
    )?;

    let (_, report) = core.open_container(ContainerSpec::session("level-1").request::<HudManager>())?;
    info!(
        "level-1 已创建: {:?}, 由全局提供: {:?}",
        report.created, report.provided_by_global
    );
    Ok(())
}

fn report_frame(core: &ManagerCore, frame: u32) {
    let level = SessionId::new("level-1");
    match core.get_manager::<HudManager>(&level) {
        Some(hud) => info!("第 {} 帧: HUD 分数 {}", frame, hud.read().last_score),
        None => warn!("第 {} 帧: level-1 中没有 HudManager", frame),
    }
}
