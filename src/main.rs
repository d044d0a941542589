use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::error;

use music_partner_bot::utils::logging;
use music_partner_bot::{BotController, Config, CookieValidator, PartnerClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(success) => {
            logging::log_run_result(success);
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            // 日志可能尚未初始化
            logging::init(false);
            error!("{:#}", e);
            logging::log_run_result(false);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let client = PartnerClient::new(&config).context("创建 HTTP 客户端失败")?;

    // 校验 Cookie
    let status = CookieValidator::new(&client, &config).validate().await;
    if !status.is_valid() {
        error!("Cookie 校验未通过，终止运行: {}", status);
        return Ok(false);
    }

    // 初始化并运行
    let bot = BotController::new(&client, &config).context("初始化评定流程失败")?;
    Ok(bot.run().await)
}
