// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 结果帧模块
//!
//! 服务端分两个阶段回传结果，每个阶段都以单独一行 `pause...` 结束：
//! - 阶段 A：前 10 名
//! - 阶段 B：完整列表
//!
//! 每个词频编码为 `<word>,<count>`。接收端允许多个词频挤在同一行，用逗号连接。
//!
//! ## 哨兵判定
//! 接收端把每行按逗号切开，等于 `pause...` 的片段视为空片段丢弃；
//! 是否结束本阶段则用**整行**与 `pause...` 比较。所以 `the,3,pause...` 不会结束阶段，
//! 哨兵必须独占一行。老客户端依赖这一行为，不要改成按片段结束。

use crate::{
    exception::Exception,
    param::{FIELD_SEPARATOR, PAUSE_SENTINEL},
    ranker::RankedList,
    store::WordCount,
    util::read_trimmed_line,
};

use log::{debug, warn};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

/// 编码单个词频
pub fn encode_entry(entry: &WordCount) -> String {
    format!("{}{}{}", entry.word, FIELD_SEPARATOR, entry.count)
}

/// 编码一个完整阶段：每个词频一行，最后是哨兵行
pub fn encode_phase(list: &RankedList) -> String {
    let mut out = String::new();
    for entry in list {
        out.push_str(&encode_entry(entry));
        out.push('\n');
    }
    out.push_str(PAUSE_SENTINEL);
    out.push('\n');
    out
}

/// 写出一个阶段并刷新。对端断开时返回 `ConnectionClosed`，调用方不应重试。
pub async fn write_phase<W>(writer: &mut W, list: &RankedList) -> Result<(), Exception>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encode_phase(list).as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// 解码一行中的所有词频。
///
/// 等于哨兵的片段与空片段被忽略，剩下的片段按 (词, 次数) 两两配对。
pub fn decode_line(line: &str) -> Result<Vec<WordCount>, Exception> {
    let fragments: Vec<&str> = line
        .split(FIELD_SEPARATOR)
        .map(|f| if f == PAUSE_SENTINEL { "" } else { f })
        .filter(|f| !f.is_empty())
        .collect();

    if fragments.len() % 2 != 0 {
        warn!("结果行的片段个数为奇数：{}", line);
        return Err(Exception::MalformedFrame);
    }

    fragments
        .chunks(2)
        .map(|pair| match pair[1].trim().parse::<u64>() {
            Ok(count) => Ok(WordCount::new(pair[0], count)),
            Err(_) => {
                warn!("无法解析词频：{}", pair[1]);
                Err(Exception::MalformedFrame)
            }
        })
        .collect()
}

/// 整行是否为阶段结束哨兵
pub fn is_phase_end(line: &str) -> bool {
    line == PAUSE_SENTINEL
}

/// 按阶段读取结果帧
pub struct PhaseReader<R> {
    reader: R,
    line_timeout: Option<Duration>,
}

impl<R> PhaseReader<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_timeout: None,
        }
    }

    /// 每读一行最多等待 `timeout`，超时返回 `Timeout`
    pub fn with_timeout(reader: R, timeout: Duration) -> Self {
        Self {
            reader,
            line_timeout: Some(timeout),
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>, Exception> {
        match self.line_timeout {
            Some(limit) => tokio::time::timeout(limit, read_trimmed_line(&mut self.reader))
                .await
                .map_err(|_| Exception::Timeout)?,
            None => read_trimmed_line(&mut self.reader).await,
        }
    }

    /// 读取一个阶段，直到独占一行的哨兵为止。哨兵之前连接关闭返回 `ConnectionClosed`。
    pub async fn read_phase(&mut self) -> Result<RankedList, Exception> {
        let mut entries = Vec::new();
        loop {
            let line = match self.next_line().await? {
                Some(line) => line,
                None => return Err(Exception::ConnectionClosed),
            };
            entries.extend(decode_line(&line)?);
            if is_phase_end(&line) {
                break;
            }
        }
        debug!("阶段读取完毕，共{}项", entries.len());
        Ok(RankedList::from_ranked(entries))
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn list(entries: &[(&str, u64)]) -> RankedList {
        RankedList::from_ranked(entries.iter().map(|(w, c)| WordCount::new(w, *c)).collect())
    }

    #[test]
    fn test_encode_phase() {
        let encoded = encode_phase(&list(&[("the", 3), ("cat", 2)]));
        assert_eq!(encoded, "the,3\ncat,2\npause...\n");
        assert_eq!(encode_phase(&RankedList::default()), "pause...\n");
    }

    #[test]
    fn test_decode_packed_line() {
        let decoded = decode_line("the,3,cat,2").unwrap();
        assert_eq!(decoded, vec![WordCount::new("the", 3), WordCount::new("cat", 2)]);
    }

    #[test]
    fn test_decode_embedded_sentinel_fragment_is_ignored() {
        let decoded = decode_line("the,3,pause...").unwrap();
        assert_eq!(decoded, vec![WordCount::new("the", 3)]);
        assert!(!is_phase_end("the,3,pause..."));
        assert!(decode_line("pause...").unwrap().is_empty());
        assert!(is_phase_end("pause..."));
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(decode_line("the").unwrap_err(), Exception::MalformedFrame);
        assert_eq!(decode_line("the,many").unwrap_err(), Exception::MalformedFrame);
        assert!(decode_line("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_packed_stream_decodes_to_two_entries() {
        let input: &[u8] = b"the,3,cat,2\npause...\n";
        let mut reader = PhaseReader::new(input);
        let phase = reader.read_phase().await.unwrap();
        assert_eq!(phase, list(&[("the", 3), ("cat", 2)]));
    }

    #[tokio::test]
    async fn test_embedded_sentinel_does_not_end_phase() {
        let input: &[u8] = b"the,3,pause...\ncat,2\npause...\nnext,1\npause...\n";
        let mut reader = PhaseReader::new(input);
        let first = reader.read_phase().await.unwrap();
        assert_eq!(first, list(&[("the", 3), ("cat", 2)]));
        let second = reader.read_phase().await.unwrap();
        assert_eq!(second, list(&[("next", 1)]));
    }

    #[tokio::test]
    async fn test_eof_before_sentinel() {
        let input: &[u8] = b"the,3\ncat,2\n";
        let mut reader = PhaseReader::new(input);
        assert_eq!(reader.read_phase().await.unwrap_err(), Exception::ConnectionClosed);
    }

    #[tokio::test]
    async fn test_two_phase_round_trip() {
        let all = list(&[("the", 3), ("cat", 2), ("title", 1), ("sat", 1)]);
        let top = list(&[("the", 3), ("cat", 2)]);

        let mut wire = Vec::new();
        write_phase(&mut wire, &top).await.unwrap();
        write_phase(&mut wire, &all).await.unwrap();

        let mut reader = PhaseReader::new(wire.as_slice());
        assert_eq!(reader.read_phase().await.unwrap(), top);
        assert_eq!(reader.read_phase().await.unwrap(), all);
    }

    #[tokio::test]
    async fn test_line_timeout() {
        let (client, _server) = tokio::io::duplex(64);
        let mut reader =
            PhaseReader::with_timeout(tokio::io::BufReader::new(client), Duration::from_millis(50));
        assert_eq!(reader.read_phase().await.unwrap_err(), Exception::Timeout);
    }

    fn ranked_entries() -> impl Strategy<Value = Vec<(String, u64)>> {
        proptest::collection::vec(("[a-z']{1,8}", 1u64..1000), 0..40)
    }

    // 同一行里挤 `per_line` 个词频
    fn encode_packed(list: &RankedList, per_line: usize) -> String {
        let mut out = String::new();
        for chunk in list.entries().chunks(per_line) {
            let fields: Vec<String> = chunk.iter().map(encode_entry).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out.push_str(PAUSE_SENTINEL);
        out.push('\n');
        out
    }

    fn read_two_phases(wire: &[u8]) -> (RankedList, RankedList) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mut reader = PhaseReader::new(wire);
            let first = reader.read_phase().await.unwrap();
            let second = reader.read_phase().await.unwrap();
            (first, second)
        })
    }

    proptest! {
        #[test]
        fn prop_phases_survive_the_wire(entries in ranked_entries(), per_line in 1usize..5) {
            let all = RankedList::from_ranked(
                entries.iter().map(|(w, c)| WordCount::new(w, *c)).collect(),
            );
            let top = all.top_ten();

            let wire = format!("{}{}", encode_phase(&top), encode_phase(&all));
            let (first, second) = read_two_phases(wire.as_bytes());
            prop_assert_eq!(&first, &top);
            prop_assert_eq!(&second, &all);

            let packed = format!("{}{}", encode_packed(&top, per_line), encode_packed(&all, per_line));
            let (first, second) = read_two_phases(packed.as_bytes());
            prop_assert_eq!(&first, &top);
            prop_assert_eq!(&second, &all);
        }
    }
}
