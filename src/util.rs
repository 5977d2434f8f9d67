use chrono::{DateTime, Local};
use log::{warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::{exception::Exception, param::MAX_LINE_BYTES, ranker::RankedList};

// 从 YAML 初始化 log4rs，文件缺失或无效时退回到 info 级别的控制台日志
pub fn init_logging(path: &str) {
    let file_error = match log4rs::init_file(path, Default::default()) {
        Ok(()) => return,
        Err(e) => e,
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {M} - {m}{n}",
        )))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if log4rs::init_config(config).is_ok() {
                warn!("无法加载日志配置{}：{}，改用控制台日志", path, file_error);
            }
        }
        Err(e) => eprintln!("无法初始化日志系统：{}", e),
    }
}

// 读取一行并去掉行尾的 \n / \r\n，EOF 时返回 None。
// 超过 MAX_LINE_BYTES 仍未见到换行符即为 MalformedFrame，不再继续缓冲。
pub async fn read_trimmed_line<R>(reader: &mut R) -> Result<Option<String>, Exception>
where
    R: AsyncBufRead + Unpin,
{
    // 内容加上 \r\n
    let limit = MAX_LINE_BYTES as u64 + 2;
    let mut buf = Vec::new();
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
    }
    while buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > MAX_LINE_BYTES || (!terminated && n as u64 == limit) {
        warn!("单行超过{}字节，拒绝继续读取", MAX_LINE_BYTES);
        return Err(Exception::MalformedFrame);
    }
    String::from_utf8(buf).map(Some).map_err(|e| {
        warn!("行内容不是合法的UTF-8：{}", e);
        Exception::MalformedFrame
    })
}

// 按时间生成缺省的会话标签
pub fn default_session_tag(now: DateTime<Local>) -> String {
    format!("client-{}", now.format("%Y%m%d-%H%M%S"))
}

// 渲染为对齐的文本表格
pub fn render_ranked(title: &str, list: &RankedList) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {} ==\n", title));
    if list.is_empty() {
        out.push_str("(无结果)\n");
        return out;
    }
    let rank_width = list.len().to_string().len();
    let word_width = list.iter().map(|e| e.word.chars().count()).max().unwrap_or(0);
    for (i, entry) in list.iter().enumerate() {
        out.push_str(&format!(
            "{:>rw$}. {:<ww$}  {}\n",
            i + 1,
            entry.word,
            entry.count,
            rw = rank_width,
            ww = word_width
        ));
    }
    out
}

pub fn render_report(top: &RankedList, all: &RankedList, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "生成时间：{}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S %Z")
    ));
    out.push_str(&render_ranked("Top 10", top));
    out.push('\n');
    out.push_str(&render_ranked(&format!("全部 {} 个词", all.len()), all));
    out
}
