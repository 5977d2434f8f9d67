// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了词频会话在抓取、统计与传输过程中可能出现的各类异常情况。
//!
//! ## 分类
//! - **抓取错误**：`InvalidUrl`、`FetchFailed`、`UnexpectedStatus`，统称 FetchError，会话直接终止。
//! - **内容错误**：`NoMatch`，起始标记未出现。调用方将其视为空结果而非致命错误。
//! - **协议错误**：`ShortRequest`、`MalformedFrame`，会话立即终止，不做任何部分处理。
//! - **连接错误**：`Timeout`、`ConnectionClosed`、`Io`，只影响发现它的那一端的当前会话。

use std::{fmt, io};

/// 会话处理过程中发生的异常类型。
///
/// 详细原因在出错位置用日志记录，这里只携带分类本身。
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 目标地址无法解析为合法的 http/https URL。
    InvalidUrl,
    /// 网络传输失败（DNS、连接、抓取超时、读取正文失败等）。
    FetchFailed,
    /// 目标站点返回了非 2xx 状态码。
    UnexpectedStatus,
    /// 页面中从未出现起始标记。
    NoMatch,
    /// 客户端在发送完 4 行请求之前关闭了连接。
    ShortRequest,
    /// 收到的数据帧无法按 `<word>,<count>` 格式解码。
    MalformedFrame,
    /// 等待对端超时（客户端侧的固定超时或服务端的空闲超时）。
    Timeout,
    /// 连接被对端关闭或重置。
    ConnectionClosed,
    /// 其他 I/O 错误。
    Io,
}

use Exception::*;

impl Exception {
    /// 是否属于抓取阶段的错误（FetchError）。
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, InvalidUrl | FetchFailed | UnexpectedStatus)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidUrl => write!(f, "Invalid target URL"),
            FetchFailed => write!(f, "Failed to fetch the target page"),
            UnexpectedStatus => write!(f, "Target page answered with a non-success status"),
            NoMatch => write!(f, "Start marker not found in the page"),
            ShortRequest => write!(f, "Request frame ended before all 4 lines were read"),
            MalformedFrame => write!(f, "Malformed protocol frame"),
            Timeout => write!(f, "Timed out waiting for the peer"),
            ConnectionClosed => write!(f, "Connection closed by peer"),
            Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for Exception {}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => ConnectionClosed,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Timeout,
            _ => Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_grouping() {
        assert!(InvalidUrl.is_fetch_error());
        assert!(FetchFailed.is_fetch_error());
        assert!(UnexpectedStatus.is_fetch_error());
        assert!(!NoMatch.is_fetch_error());
        assert!(!Timeout.is_fetch_error());
    }

    #[test]
    fn test_io_error_mapping() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(Exception::from(reset), ConnectionClosed);

        let pipe = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(Exception::from(pipe), ConnectionClosed);

        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(Exception::from(timed_out), Timeout);

        let other = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(Exception::from(other), Io);
    }
}
