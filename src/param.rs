// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了客户端与服务端共享的常量，包括：
//! - 会话控制用的哨兵行（`pause...`、`exit...`）。
//! - 请求帧的行数与排行榜长度。
//! - 文本抽取用到的正则表达式。
//! - 客户端缺省请求（爱伦·坡《乌鸦》）。

use lazy_static::lazy_static;
use regex::Regex;

/// 标记一个结果阶段结束的哨兵行
pub const PAUSE_SENTINEL: &str = "pause...";

/// 客户端通知服务端结束会话的哨兵行
pub const EXIT_SENTINEL: &str = "exit...";

/// 请求帧固定的行数：URL、起始标记、结束标记、会话标签
pub const REQUEST_LINES: usize = 4;

/// 排行榜（第一阶段）的长度
pub const TOP_N: usize = 10;

/// 单行（请求帧或结果帧）的字节上限，不含换行符
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// 结果帧中字段的分隔符
pub const FIELD_SEPARATOR: char = ',';

/// 缺省的待分析页面
pub const DEFAULT_WEBSITE: &str = "https://www.gutenberg.org/files/1065/1065-h/1065-h.htm";

/// 缺省起始标记
pub const DEFAULT_START_MARKER: &str = "<h1>The Raven</h1>";

/// 缺省结束标记
pub const DEFAULT_END_MARKER: &str = "<!--end chapter-->";

/// 计数前需要丢弃的抽取残留：包含该子串的词不计数
pub const MDASH_ARTIFACT: &str = "mdash";

lazy_static! {
    /// 非贪婪的标记匹配：`<` 与其后第一个 `>` 之间的内容整体删除。
    pub static ref MARKUP: Regex = Regex::new(r"<.*?>").unwrap();

    /// 分词分隔符：拉丁字母与撇号（含印刷体撇号 `’`）以外的任意连续字符。
    pub static ref WORD_DELIMITER: Regex = Regex::new(r"[^a-zA-Z'’]+").unwrap();
}
