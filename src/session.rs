// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务端会话处理
//!
//! 一个连接对应一个会话，会话内各步骤严格串行：
//! 读请求帧 → 抓取并分词 → 计数 → 排名 → 阶段 A → 阶段 B → 等待 `exit...`。
//!
//! 词频表是会话内的局部变量，无论正常结束还是中途断开，函数返回时都会被销毁。

use crate::{
    config::Config,
    exception::Exception,
    extractor::Fetcher,
    param::EXIT_SENTINEL,
    ranker::rank,
    request::Request,
    response::write_phase,
    store::FrequencyStore,
    util::read_trimmed_line,
};

use log::{debug, error, info, warn};
use std::{future::Future, time::Duration, time::Instant};
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// 一次会话的摘要，用于日志与测试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_tag: String,
    /// 不同词的个数
    pub distinct_words: usize,
    /// 计入的词总数
    pub counted_tokens: usize,
    /// 客户端是否发送了 `exit...`
    pub exited_cleanly: bool,
}

async fn within<F, T>(limit: Option<Duration>, fut: F) -> Result<T, Exception>
where
    F: Future<Output = Result<T, Exception>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Exception::Timeout)?,
        None => fut.await,
    }
}

/// 等待客户端的 `exit...`，返回是否收到。
///
/// 其他行记录后忽略；EOF、超时或读错误都视为会话中止。
async fn await_exit<R>(reader: &mut R, limit: Option<Duration>, id: u128) -> bool
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match within(limit, read_trimmed_line(reader)).await {
            Ok(Some(line)) if line == EXIT_SENTINEL => return true,
            Ok(Some(line)) => warn!("[ID{}]等待exit...时收到多余的行：{}", id, line),
            Ok(None) => {
                debug!("[ID{}]客户端未发送exit...即关闭连接", id);
                return false;
            }
            Err(e) => {
                warn!("[ID{}]等待exit...失败：{}", id, e);
                return false;
            }
        }
    }
}

/// 处理一个客户端连接的完整会话。
///
/// # 错误处理
/// - 请求帧不完整：`ShortRequest`，不做任何处理。
/// - 请求行超过 `MAX_LINE_BYTES`：`MalformedFrame`，不再继续读取。
/// - 抓取失败：直接返回错误，不输出任何阶段，连接随之关闭。
///   协议里没有错误帧。为此另加一个哨兵会让只认识 `pause...` 的老客户端
///   把它当成结果行解析失败，所以关闭连接就是唯一的失败信号，
///   客户端看到的是 `ConnectionClosed`，与网络中断无法区分。具体原因只记在服务端日志里。
/// - 起始标记不存在：按空结果继续。
/// - 写出时连接断开：返回 `ConnectionClosed`，不重试。
pub async fn handle_session<S>(
    stream: S,
    id: u128,
    fetcher: &Fetcher,
    config: &Config,
) -> Result<SessionSummary, Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let idle_limit = config.session_timeout();

    let request = within(idle_limit, Request::read_from(&mut reader, id)).await?;
    info!(
        "[ID{}]会话标签：'{}'，目标：{}，起始标记：'{}'，结束标记：'{}'",
        id,
        request.session_tag(),
        request.url(),
        request.start_marker(),
        request.end_marker()
    );

    let start_time = Instant::now();
    let tokens = match fetcher
        .extract(request.url(), request.start_marker(), request.end_marker(), id)
        .await
    {
        Ok(tokens) => tokens,
        Err(Exception::NoMatch) => {
            warn!("[ID{}]页面中没有起始标记，返回空结果", id);
            Vec::new()
        }
        Err(e) => {
            error!("[ID{}]抓取失败，终止会话：{}", id, e);
            return Err(e);
        }
    };

    let mut store = FrequencyStore::new();
    let counted_tokens = store.record_all(&tokens);
    let ranked = rank(&store);
    let top = ranked.top_ten();
    debug!(
        "[ID{}]分词{}个，计入{}个，不同词{}个，用时{}ms",
        id,
        tokens.len(),
        counted_tokens,
        ranked.len(),
        start_time.elapsed().as_millis()
    );

    for (name, phase) in [("A", &top), ("B", &ranked)] {
        if let Err(e) = write_phase(&mut write_half, phase).await {
            warn!("[ID{}]发送阶段{}时连接断开：{}", id, name, e);
            return Err(e);
        }
        debug!("[ID{}]阶段{}发送完毕，共{}项", id, name, phase.len());
    }

    let exited_cleanly = await_exit(&mut reader, idle_limit, id).await;
    let distinct_words = store.len();
    drop(store);
    debug!("[ID{}]会话词频表已释放", id);
    let _ = write_half.shutdown().await;

    Ok(SessionSummary {
        session_tag: request.session_tag().to_string(),
        distinct_words,
        counted_tokens,
        exited_cleanly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::PhaseReader;
    use tokio::io::{duplex, AsyncReadExt};

    fn offline_fetcher() -> Fetcher {
        Fetcher::new(Duration::from_secs(1), false).unwrap()
    }

    #[tokio::test]
    async fn test_short_request_aborts_without_output() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"http://127.0.0.1:1/\nstart\n").await.unwrap();
        client.shutdown().await.unwrap();

        let config = Config::new();
        let result = handle_session(server, 1, &offline_fetcher(), &config).await;
        assert_eq!(result.unwrap_err(), Exception::ShortRequest);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_aborts_without_phases() {
        let (mut client, server) = duplex(1024);
        client.write_all(b"not a url\nstart\nend\ntag\n").await.unwrap();

        let config = Config::new();
        let result = handle_session(server, 2, &offline_fetcher(), &config).await;
        assert_eq!(result.unwrap_err(), Exception::InvalidUrl);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_closes_without_sentinel() {
        let (client, server) = duplex(1024);
        let (read_half, mut write_half) = tokio::io::split(client);
        write_half
            .write_all(b"http://127.0.0.1:1/\nstart\nend\ntag\n")
            .await
            .unwrap();

        let config = Config::new();
        let result = handle_session(server, 4, &offline_fetcher(), &config).await;
        assert!(result.unwrap_err().is_fetch_error());

        // 客户端只能看到连接关闭
        let mut phases = PhaseReader::new(BufReader::new(read_half));
        assert_eq!(
            phases.read_phase().await.unwrap_err(),
            Exception::ConnectionClosed
        );
    }

    #[tokio::test]
    async fn test_idle_client_times_out() {
        let (_client, server) = duplex(1024);
        let config = Config::new().with_session_timeout(1);
        let result = handle_session(server, 3, &offline_fetcher(), &config).await;
        assert_eq!(result.unwrap_err(), Exception::Timeout);
    }

    #[tokio::test]
    async fn test_await_exit_skips_noise() {
        let mut input: &[u8] = b"hello\nexit...\n";
        assert!(await_exit(&mut input, None, 0).await);

        let mut eof: &[u8] = b"hello\n";
        assert!(!await_exit(&mut eof, None, 0).await);
    }
}
