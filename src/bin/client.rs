// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 词频分析客户端
//!
//! 用法：`wordfreq-client [--json] [URL [START [END [TAG]]]]`
//!
//! 缺省分析 Project Gutenberg 上的《乌鸦》。

use wordfreq::{
    client::ClientSession,
    config::Config,
    param::{DEFAULT_END_MARKER, DEFAULT_START_MARKER, DEFAULT_WEBSITE},
    request::Request,
    util::{default_session_tag, init_logging, render_report},
};

use chrono::Local;
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging("config/log4rs.yaml");
    let config = Config::from_toml("config/development.toml");

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json = match args.iter().position(|a| a == "--json") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    let mut fields = args.into_iter();
    let url = fields.next().unwrap_or_else(|| DEFAULT_WEBSITE.to_string());
    let start = fields.next().unwrap_or_else(|| DEFAULT_START_MARKER.to_string());
    let end = fields.next().unwrap_or_else(|| DEFAULT_END_MARKER.to_string());
    let tag = fields
        .next()
        .unwrap_or_else(|| default_session_tag(Local::now()));

    if url.is_empty() {
        error!("URL不能为空");
        return ExitCode::FAILURE;
    }
    info!("使用默认站点：{}", url == DEFAULT_WEBSITE);

    let request = Request::new(&url, &start, &end, &tag);
    let session = ClientSession::from_config(&config);
    let report = match session.run(&request).await {
        Ok(report) => report,
        Err(e) => {
            error!("会话失败：{}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("无法序列化结果：{}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", render_report(&report.top, &report.all, Local::now()));
    }
    ExitCode::SUCCESS
}
