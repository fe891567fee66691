use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use infra::config::AppConfigImpl;
use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::path::Path;

const LOG_FILE: &str = "tracktint.log";
const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

/// 日志同时输出到控制台和 `log_dir` 下的日志文件
fn log_config(log_dir: &Path, level: LevelFilter) -> Result<Config, Box<dyn std::error::Error>> {
    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_dir.join(LOG_FILE))?;

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .appender(Appender::builder().build(
            "stdout",
            Box::new(
                ConsoleAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
                    .build(),
            ),
        ))
        .build(Root::builder().appender("file").appender("stdout").build(level))?;
    Ok(config)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let config = log_config(
        Path::new("."),
        log_level.parse().unwrap_or(LevelFilter::Info),
    )
    .unwrap();
    log4rs::init_config(config).unwrap();

    let cfg = match AppConfigImpl::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    let server_cfg = cfg.server();
    log::info!("Listening on {}:{}", server_cfg.host, server_cfg.port);

    let app_state = web::Data::new(server::AppState::new(cfg));
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .configure(server::color_api::configure_service)
    })
    .bind((server_cfg.host.as_str(), server_cfg.port))?
    .run()
    .await
}
