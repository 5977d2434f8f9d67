// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务端主循环
//!
//! 持续接收新连接，每个连接分发到独立的 Tokio 任务中执行会话，
//! 单个会话的阻塞 I/O 或失败不会影响其他会话。

use crate::{config::Config, exception::Exception, extractor::Fetcher, session::handle_session};

use log::{debug, error, info, warn};
use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{Arc, Mutex},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
};

/// 服务端运行状态
///
/// shutdown: 停机标志，主循环在处理完下一个连接后退出
/// active: 当前活跃会话数
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    shutdown: Arc<Mutex<bool>>,
    active: Arc<Mutex<u32>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        if let Ok(mut flag) = self.shutdown.lock() {
            *flag = true;
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.lock().map(|flag| *flag).unwrap_or(true)
    }

    pub fn active_sessions(&self) -> u32 {
        self.active.lock().map(|count| *count).unwrap_or(0)
    }

    fn enter(&self) {
        if let Ok(mut count) = self.active.lock() {
            *count += 1;
        }
    }

    fn leave(&self) {
        if let Ok(mut count) = self.active.lock() {
            *count = count.saturating_sub(1);
        }
    }
}

/// 按配置绑定监听地址：`local` 为真时只监听 127.0.0.1，否则监听 0.0.0.0
pub async fn bind(config: &Config) -> Result<TcpListener, Exception> {
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, config.port());
    info!("服务端将在{}上监听Socket连接", socket);
    TcpListener::bind(socket).await.map_err(|e| {
        error!("无法绑定端口：{}，错误：{}", config.port(), e);
        Exception::from(e)
    })
}

/// 主事件循环 (Accept Loop)
pub async fn run(listener: TcpListener, fetcher: Arc<Fetcher>, config: Arc<Config>, state: ServerState) {
    let mut id: u128 = 0;
    loop {
        if state.is_shutting_down() {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                error!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]新的连接：{}", id, addr);

        let fetcher = Arc::clone(&fetcher);
        let config = Arc::clone(&config);
        let state_clone = state.clone();
        tokio::spawn(async move {
            state_clone.enter();
            match handle_session(stream, id, &fetcher, &config).await {
                Ok(summary) => info!(
                    "[ID{}] {}, 不同词{}个, 计入{}个, exit={}",
                    id,
                    summary.session_tag,
                    summary.distinct_words,
                    summary.counted_tokens,
                    summary.exited_cleanly
                ),
                Err(e) => warn!("[ID{}]会话中止：{}", id, e),
            }
            state_clone.leave();
        });
        id += 1;
    }
}

/// 交互式管理控制台，运行在后台，不阻塞监听循环
pub fn spawn_console(state: ServerState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin());
        let mut input = String::new();
        loop {
            input.clear();
            match reader.read_line(&mut input).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            match input.trim() {
                "stop" => {
                    state.request_shutdown();
                    println!("停机指令已激活，服务器将在处理完下一个连接后关闭...");
                    break;
                }
                "help" => {
                    println!("== Wordfreq Help ==");
                    println!("stop   - 发出停机信号");
                    println!("status - 查看当前活跃会话数");
                    println!("help   - 显示此帮助信息");
                    println!("===================");
                }
                "status" => {
                    println!("== Wordfreq 状态 ==");
                    println!("当前活跃会话数: {}", state.active_sessions());
                    println!("===================");
                }
                "" => {}
                cmd => println!("无效的命令：{}", cmd),
            }
        }
    })
}
