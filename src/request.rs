// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求帧模块
//!
//! 客户端连接建立后立即发送且只发送一次请求帧，固定 4 行，顺序为：
//! 1. 目标 URL
//! 2. 起始标记
//! 3. 结束标记
//! 4. 会话标签（可以为空）
//!
//! 服务端必须读满 4 行才开始抓取，少于 4 行即为协议错误。

use crate::{exception::Exception, param::REQUEST_LINES, util::read_trimmed_line};
use log::{debug, error};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

/// 一次词频分析请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// 待分析的页面
    url: String,
    /// 起始标记（字面子串，区分大小写）
    start_marker: String,
    /// 结束标记
    end_marker: String,
    /// 会话标签，仅用于日志
    session_tag: String,
}

impl Request {
    pub fn new(url: &str, start_marker: &str, end_marker: &str, session_tag: &str) -> Self {
        Self {
            url: url.to_string(),
            start_marker: start_marker.to_string(),
            end_marker: end_marker.to_string(),
            session_tag: session_tag.to_string(),
        }
    }

    /// 从连接中读取完整的请求帧。
    ///
    /// # 错误处理
    /// 在读满 4 行之前遇到 EOF 返回 `ShortRequest`，其余 I/O 错误按 `Exception::from` 映射。
    pub async fn read_from<R>(reader: &mut R, id: u128) -> Result<Self, Exception>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut fields = Vec::with_capacity(REQUEST_LINES);
        while fields.len() < REQUEST_LINES {
            match read_trimmed_line(reader).await? {
                Some(line) => fields.push(line),
                None => {
                    error!(
                        "[ID{}]请求帧只收到{}行，连接已关闭",
                        id,
                        fields.len()
                    );
                    return Err(Exception::ShortRequest);
                }
            }
        }
        debug!("[ID{}]请求帧接收完毕", id);

        let session_tag = fields.pop().unwrap_or_default();
        let end_marker = fields.pop().unwrap_or_default();
        let start_marker = fields.pop().unwrap_or_default();
        let url = fields.pop().unwrap_or_default();
        Ok(Self {
            url,
            start_marker,
            end_marker,
            session_tag,
        })
    }

    /// 编码为 4 行文本。任何字段含有换行符都会破坏帧边界，因此直接拒绝。
    pub fn to_frame(&self) -> Result<String, Exception> {
        let fields = [
            &self.url,
            &self.start_marker,
            &self.end_marker,
            &self.session_tag,
        ];
        if fields.iter().any(|f| f.contains(['\n', '\r'])) {
            return Err(Exception::MalformedFrame);
        }
        let mut frame = String::new();
        for field in fields {
            frame.push_str(field);
            frame.push('\n');
        }
        Ok(frame)
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> Result<(), Exception>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = self.to_frame()?;
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl Request {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn start_marker(&self) -> &str {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &str {
        &self.end_marker
    }

    pub fn session_tag(&self) -> &str {
        &self.session_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::MAX_LINE_BYTES;

    #[tokio::test]
    async fn test_read_full_frame() {
        let mut input: &[u8] = b"https://example.com/\n<h1>\nran.\nalice\n";
        let request = Request::read_from(&mut input, 1).await.unwrap();
        assert_eq!(request.url(), "https://example.com/");
        assert_eq!(request.start_marker(), "<h1>");
        assert_eq!(request.end_marker(), "ran.");
        assert_eq!(request.session_tag(), "alice");
    }

    #[tokio::test]
    async fn test_read_frame_with_empty_tag_and_crlf() {
        let mut input: &[u8] = b"https://example.com/\r\nstart\r\nend\r\n\r\n";
        let request = Request::read_from(&mut input, 1).await.unwrap();
        assert_eq!(request, Request::new("https://example.com/", "start", "end", ""));
    }

    #[tokio::test]
    async fn test_short_frame_is_rejected() {
        let mut input: &[u8] = b"https://example.com/\nstart\nend\n";
        let result = Request::read_from(&mut input, 1).await;
        assert_eq!(result.unwrap_err(), Exception::ShortRequest);

        let mut empty: &[u8] = b"";
        let result = Request::read_from(&mut empty, 2).await;
        assert_eq!(result.unwrap_err(), Exception::ShortRequest);
    }

    #[tokio::test]
    async fn test_unterminated_last_line_still_counts() {
        let mut input: &[u8] = b"u\ns\ne\ntag";
        let request = Request::read_from(&mut input, 1).await.unwrap();
        assert_eq!(request.session_tag(), "tag");
    }

    #[tokio::test]
    async fn test_frame_round_trip() {
        let request = Request::new("http://127.0.0.1/page", "<h1>The Raven</h1>", "", "t-1");
        let mut wire = Vec::new();
        request.write_to(&mut wire).await.unwrap();
        assert_eq!(
            String::from_utf8(wire.clone()).unwrap(),
            "http://127.0.0.1/page\n<h1>The Raven</h1>\n\nt-1\n"
        );

        let mut reader: &[u8] = &wire;
        assert_eq!(Request::read_from(&mut reader, 0).await.unwrap(), request);
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected() {
        let mut frame = "a".repeat(4 * MAX_LINE_BYTES);
        frame.push_str("\nstart\nend\ntag\n");
        let mut input: &[u8] = frame.as_bytes();
        let result = Request::read_from(&mut input, 1).await;
        assert_eq!(result.unwrap_err(), Exception::MalformedFrame);
        // 超限后不再把整行读进内存
        assert!(input.len() > 2 * MAX_LINE_BYTES);
    }

    #[test]
    fn test_newline_in_field_is_rejected() {
        let request = Request::new("http://x/", "a\nb", "", "");
        assert_eq!(request.to_frame().unwrap_err(), Exception::MalformedFrame);
    }
}
