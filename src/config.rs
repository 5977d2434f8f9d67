use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    local: bool,
    worker_threads: usize,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_client_timeout_secs")]
    client_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
    #[serde(default = "default_session_timeout_secs")]
    session_timeout_secs: u64,
    #[serde(default = "default_use_proxy")]
    use_proxy: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_client_timeout_secs() -> u64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_session_timeout_secs() -> u64 {
    60
}

fn default_use_proxy() -> bool {
    true
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 8000,
            local: true,
            worker_threads: num_cpus::get(),
            host: default_host(),
            client_timeout_secs: default_client_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            session_timeout_secs: default_session_timeout_secs(),
            use_proxy: default_use_proxy(),
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                warn!("无法打开配置文件{}：{}，使用默认配置", filename, e);
                return Config::new();
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}失败：{}，使用默认配置", filename, e);
            return Config::new();
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(content: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.client_timeout_secs == 0 {
            warn!("client_timeout_secs被设置为0，客户端不允许无限等待，因此该值将被改为10。");
            raw_config.client_timeout_secs = default_client_timeout_secs();
        }
        raw_config
    }

    /// 覆盖端口，供测试与命令行使用
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 关闭系统代理，回环地址上的测试需要直连
    pub fn without_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    pub fn with_session_timeout(mut self, secs: u64) -> Self {
        self.session_timeout_secs = secs;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// 服务端等待请求帧与 `exit...` 的空闲上限，0 表示不限
    pub fn session_timeout(&self) -> Option<Duration> {
        match self.session_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }
}
