// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 客户端会话
//!
//! 连接服务端、发送请求帧、依次读取两个阶段，最后发送 `exit...`。
//! 连接、每次读行与每次写出都受同一个固定超时约束，超时只终止本地等待。

use crate::{
    config::Config,
    exception::Exception,
    param::EXIT_SENTINEL,
    ranker::RankedList,
    request::Request,
    response::PhaseReader,
};

use log::{debug, error, info};
use serde_derive::Serialize;
use std::{future::Future, time::Duration};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

/// 一次会话的完整结果，交给展示层渲染
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// 阶段 A：前 10 名
    pub top: RankedList,
    /// 阶段 B：完整列表
    pub all: RankedList,
}

/// 客户端会话参数，由调用方显式传入
#[derive(Debug, Clone)]
pub struct ClientSession {
    host: String,
    port: u16,
    timeout: Duration,
}

async fn bounded<F, T>(limit: Duration, fut: F) -> Result<T, Exception>
where
    F: Future<Output = Result<T, Exception>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Exception::Timeout)?
}

impl ClientSession {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host(), config.port(), config.client_timeout())
    }

    /// 执行一次完整会话
    pub async fn run(&self, request: &Request) -> Result<Report, Exception> {
        let address = format!("{}:{}", self.host, self.port);
        let stream = bounded(self.timeout, async {
            TcpStream::connect(&address).await.map_err(|e| {
                error!("无法连接到服务端{}：{}", address, e);
                Exception::from(e)
            })
        })
        .await?;
        debug!("已连接到服务端{}", address);

        let (read_half, mut write_half) = stream.into_split();
        bounded(self.timeout, request.write_to(&mut write_half)).await?;
        info!("请求已发送：{}", request.url());

        let mut phases = PhaseReader::with_timeout(BufReader::new(read_half), self.timeout);
        let top = phases.read_phase().await?;
        debug!("阶段A接收完毕，共{}项", top.len());
        let all = phases.read_phase().await?;
        debug!("阶段B接收完毕，共{}项", all.len());

        bounded(self.timeout, async {
            write_half
                .write_all(format!("{}\n", EXIT_SENTINEL).as_bytes())
                .await?;
            write_half.flush().await?;
            Ok::<(), Exception>(())
        })
        .await?;
        debug!("已通知服务端结束会话");

        Ok(Report { top, all })
    }
}
