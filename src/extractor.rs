// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文本抽取模块
//!
//! 负责把一个网页变成小写单词序列：
//! 1. 逐行读取页面，丢弃起始标记之前的内容。
//! 2. 从起始标记所在行开始（含该行）累积，直到结束标记所在行（含该行）为止。
//! 3. 整体转为小写，删除 `<...>` 标记。
//! 4. 按“字母与撇号以外的任意连续字符”切分成词。
//!
//! 页面正文按网络分块边到边切行，捕获到结束标记后立刻停止读取。

use crate::{
    config::Config,
    exception::Exception,
    param::{MARKUP, WORD_DELIMITER},
};

use bytes::BytesMut;
use log::{debug, error};
use std::time::Duration;
use url::Url;

/// 区间捕获的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    /// 还没有遇到起始标记
    Waiting,
    /// 正在累积
    Capturing,
    /// 已遇到结束标记
    Done,
}

/// 按行喂入的区间捕获器。
///
/// 起始标记所在行本身不检查结束标记；空的结束标记表示一直捕获到页面末尾。
#[derive(Debug)]
pub struct RegionCapture<'a> {
    start_marker: &'a str,
    end_marker: &'a str,
    buffer: String,
    state: CaptureState,
}

impl<'a> RegionCapture<'a> {
    pub fn new(start_marker: &'a str, end_marker: &'a str) -> Self {
        Self {
            start_marker,
            end_marker,
            buffer: String::new(),
            state: CaptureState::Waiting,
        }
    }

    /// 喂入一行，返回是否已经可以停止读取。
    pub fn feed(&mut self, line: &str) -> bool {
        match self.state {
            CaptureState::Waiting => {
                if line.contains(self.start_marker) {
                    self.push(line);
                    self.state = CaptureState::Capturing;
                }
            }
            CaptureState::Capturing => {
                self.push(line);
                if !self.end_marker.is_empty() && line.contains(self.end_marker) {
                    self.state = CaptureState::Done;
                }
            }
            CaptureState::Done => {}
        }
        self.state == CaptureState::Done
    }

    fn push(&mut self, line: &str) {
        self.buffer.push(' ');
        self.buffer.push_str(line);
    }

    /// 结束捕获。读到流末尾仍未见结束标记时返回已捕获的部分。
    pub fn finish(self) -> Result<String, Exception> {
        match self.state {
            CaptureState::Waiting => Err(Exception::NoMatch),
            _ => Ok(self.buffer),
        }
    }
}

/// 对一段完整文本执行区间捕获。
pub fn capture_region<'a, I>(lines: I, start_marker: &str, end_marker: &str) -> Result<String, Exception>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut capture = RegionCapture::new(start_marker, end_marker);
    for line in lines {
        if capture.feed(line) {
            break;
        }
    }
    capture.finish()
}

/// 将捕获到的区间转为小写单词序列。
///
/// 这里只做词法切分，过滤抽取残留是计数阶段的职责。
pub fn tokenize(region: &str) -> Vec<String> {
    let lowered = region.to_lowercase();
    let stripped = MARKUP.replace_all(&lowered, "");
    WORD_DELIMITER
        .split(&stripped)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// 把网络分块拼成行。`scanned` 之前的字节已确认不含换行符，
/// 新分块到来时只扫描新增部分，没有换行的超长行也只扫一遍。
struct LineBuffer {
    pending: BytesMut,
    scanned: usize,
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            pending: BytesMut::new(),
            scanned: 0,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// 取出下一整行（含换行符）
    fn next_line(&mut self) -> Option<BytesMut> {
        let found = self.pending[self.scanned..].iter().position(|b| *b == b'\n');
        match found {
            Some(pos) => {
                let line = self.pending.split_to(self.scanned + pos + 1);
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = self.pending.len();
                None
            }
        }
    }

    /// 正文结束后没有换行符的最后一行
    fn remainder(self) -> Option<BytesMut> {
        (!self.pending.is_empty()).then_some(self.pending)
    }
}

/// 页面抓取器，内部持有一个可复用的 HTTP 客户端。
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(timeout: Duration, use_proxy: bool) -> Result<Self, Exception> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if !use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| {
            error!("无法构建HTTP客户端：{}", e);
            Exception::FetchFailed
        })?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self, Exception> {
        Self::new(config.fetch_timeout(), config.use_proxy())
    }

    /// 抓取页面并返回起止标记之间的原始文本。
    pub async fn fetch_region(
        &self,
        url: &str,
        start_marker: &str,
        end_marker: &str,
        id: u128,
    ) -> Result<String, Exception> {
        let parsed = Url::parse(url).map_err(|e| {
            error!("[ID{}]非法的URL：{}，错误：{}", id, url, e);
            Exception::InvalidUrl
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            error!("[ID{}]不支持的URL协议：{}", id, parsed.scheme());
            return Err(Exception::InvalidUrl);
        }

        let mut response = self.client.get(parsed).send().await.map_err(|e| {
            error!("[ID{}]抓取{}失败：{}", id, url, e);
            Exception::FetchFailed
        })?;
        let status = response.status();
        if !status.is_success() {
            error!("[ID{}]抓取{}返回状态码{}", id, url, status);
            return Err(Exception::UnexpectedStatus);
        }
        debug!("[ID{}]页面响应{}，开始逐行读取", id, status);

        let mut capture = RegionCapture::new(start_marker, end_marker);
        let mut lines = LineBuffer::new();
        loop {
            let chunk = response.chunk().await.map_err(|e| {
                error!("[ID{}]读取页面正文失败：{}", id, e);
                Exception::FetchFailed
            })?;
            let Some(chunk) = chunk else { break };
            lines.push(&chunk);
            while let Some(line) = lines.next_line() {
                if capture.feed(&decode_line(&line)) {
                    debug!("[ID{}]已遇到结束标记，停止读取", id);
                    return capture.finish();
                }
            }
        }
        if let Some(rest) = lines.remainder() {
            capture.feed(&decode_line(&rest));
        }
        capture.finish()
    }

    /// 抓取、截取并分词。
    pub async fn extract(
        &self,
        url: &str,
        start_marker: &str,
        end_marker: &str,
        id: u128,
    ) -> Result<Vec<String>, Exception> {
        let region = self.fetch_region(url, start_marker, end_marker, id).await?;
        Ok(tokenize(&region))
    }
}
