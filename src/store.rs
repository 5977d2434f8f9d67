// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 词频表模块
//!
//! 每个会话独占一个 `FrequencyStore`，会话结束即随之销毁，不存在跨会话共享，因此无需加锁。
//! 具体的存储实现通过 `CountStorage` 注入，词频表只依赖 get / set / create 三个能力。

use std::collections::HashMap;

use serde_derive::{Deserialize, Serialize};

use crate::param::MDASH_ARTIFACT;

/// 一个词及其出现次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl WordCount {
    pub fn new(word: &str, count: u64) -> Self {
        Self {
            word: word.to_string(),
            count,
        }
    }
}

/// 词频表背后的存储能力。
///
/// `entries` 必须按词第一次被 `create` 的顺序返回，排名的平局规则依赖这个顺序。
#[cfg_attr(test, mockall::automock)]
pub trait CountStorage {
    fn get(&self, word: &str) -> Option<u64>;
    fn set(&mut self, word: &str, count: u64);
    fn create(&mut self, word: &str, count: u64);
    fn entries(&self) -> Vec<(String, u64)>;
}

/// 进程内存储：哈希索引 + 按发现顺序排列的记录。
#[derive(Debug, Default)]
pub struct MemoryStorage {
    index: HashMap<String, usize>,
    records: Vec<(String, u64)>,
}

impl CountStorage for MemoryStorage {
    fn get(&self, word: &str) -> Option<u64> {
        self.index.get(word).map(|&i| self.records[i].1)
    }

    fn set(&mut self, word: &str, count: u64) {
        match self.index.get(word) {
            Some(&i) => self.records[i].1 = count,
            None => self.create(word, count),
        }
    }

    fn create(&mut self, word: &str, count: u64) {
        if let Some(&i) = self.index.get(word) {
            self.records[i].1 = count;
            return;
        }
        self.index.insert(word.to_string(), self.records.len());
        self.records.push((word.to_string(), count));
    }

    fn entries(&self) -> Vec<(String, u64)> {
        self.records.clone()
    }
}

/// 判断一个词是否应当计数。
///
/// 空串、单个空格、包含 "mdash" 或制表符的词都是抽取残留。
pub fn is_countable(token: &str) -> bool {
    !token.is_empty() && token != " " && !token.contains(MDASH_ARTIFACT) && !token.contains('\t')
}

/// 单个会话的词频表
pub struct FrequencyStore<S: CountStorage = MemoryStorage> {
    storage: S,
}

impl FrequencyStore<MemoryStorage> {
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::default())
    }
}

impl Default for FrequencyStore<MemoryStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CountStorage> FrequencyStore<S> {
    pub fn with_storage(storage: S) -> Self {
        Self { storage }
    }

    /// 不存在则置 1，否则加 1
    pub fn increment(&mut self, word: &str) {
        match self.storage.get(word) {
            Some(count) => self.storage.set(word, count + 1),
            None => self.storage.create(word, 1),
        }
    }

    /// 查询次数，`None` 表示该词不存在
    pub fn query(&self, word: &str) -> Option<u64> {
        self.storage.get(word)
    }

    /// 过滤后计数，返回是否被计入
    pub fn record(&mut self, token: &str) -> bool {
        if !is_countable(token) {
            return false;
        }
        self.increment(token);
        true
    }

    /// 依次计数所有词，返回被计入的个数
    pub fn record_all<I, T>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        tokens
            .into_iter()
            .filter(|token| self.record(token.as_ref()))
            .count()
    }

    /// 按发现顺序返回所有词频
    pub fn entries(&self) -> Vec<WordCount> {
        self.storage
            .entries()
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.storage.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有次数之和
    pub fn total(&self) -> u64 {
        self.storage.entries().iter().map(|(_, count)| count).sum()
    }
}
