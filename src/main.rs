//! # The 33rd House 会员服务主程序

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use house_membership::{
    AppError, Result,
    api::ApiServer,
    app::AppContext,
    config::ConfigManager,
    database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
};

#[derive(Debug, Parser)]
#[command(name = "house33", version, about = "The 33rd House membership backend")]
struct Cli {
    /// 配置文件路径，缺省时按 HOUSE_CONFIG_PATH / RUST_ENV 查找
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别，覆盖默认过滤规则
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 运行迁移并启动 HTTP 服务（默认）
    Serve,
    /// 只运行数据库迁移
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::load()?,
    };
    let config = config_manager.into_config();
    config.validate().map_err(AppError::config)?;

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;

    if matches!(cli.command, Some(Command::Migrate)) {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrate_only",
            "数据库迁移完成，退出"
        );
        return Ok(());
    }

    let context = Arc::new(AppContext::build(Arc::new(config), Arc::new(db))?);

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );
    if let Err(e) = ApiServer::new(context).serve().await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}
