// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 词频分析服务端
//!
//! 基于 Tokio 多线程运行时：
//! - 每个客户端连接在独立任务中完成一次会话（抓取、计数、排名、分阶段回传）
//! - 会话之间不共享词频表
//! - 后台管理控制台（stop / status / help）

use wordfreq::{
    config::Config,
    extractor::Fetcher,
    server::{self, ServerState},
    util::init_logging,
};

use log::{error, info};
use std::sync::Arc;
use tokio::runtime::Builder;

fn main() {
    // 1. 日志：log4rs，通过外部 YAML 配置级别与输出目的地
    init_logging("config/log4rs.yaml");

    // 2. 运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");

    // 3. 按配置分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            return;
        }
    };

    runtime.block_on(async move {
        let fetcher = match Fetcher::from_config(&config) {
            Ok(fetcher) => Arc::new(fetcher),
            Err(e) => {
                error!("无法初始化页面抓取器：{}", e);
                return;
            }
        };

        let listener = match server::bind(&config).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("服务端启动失败：{}", e);
                return;
            }
        };
        info!("端口{}绑定完成", config.port());

        let state = ServerState::new();
        server::spawn_console(state.clone());
        server::run(listener, fetcher, Arc::new(config), state).await;
    });
}
