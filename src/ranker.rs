// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 排名模块
//!
//! 排名规则：次数降序；次数相同时保持词第一次出现的顺序，不按字母重排。
//! 排行榜与完整列表是同一次排名的两个视图，排行榜永远是完整列表的前缀。

use std::cmp::Ordering;

use serde_derive::{Deserialize, Serialize};

use crate::{
    param::TOP_N,
    store::{CountStorage, FrequencyStore, WordCount},
};

/// 排好序的词频列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedList {
    entries: Vec<WordCount>,
}

/// 显式的排名顺序：次数降序，发现顺序升序。
///
/// 参数为 `(发现序号, 词频)`。
pub fn by_count_then_discovery(a: &(usize, WordCount), b: &(usize, WordCount)) -> Ordering {
    b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0))
}

/// 对词频表中当前所有的词排名
pub fn rank<S: CountStorage>(store: &FrequencyStore<S>) -> RankedList {
    RankedList::from_discovered(store.entries())
}

/// 取前 `n` 项，不足 `n` 项时全部返回
pub fn top_n(list: &RankedList, n: usize) -> RankedList {
    RankedList {
        entries: list.entries.iter().take(n).cloned().collect(),
    }
}

impl RankedList {
    /// 从按发现顺序排列的词频构建排名
    pub fn from_discovered(discovered: Vec<WordCount>) -> Self {
        let mut indexed: Vec<(usize, WordCount)> = discovered.into_iter().enumerate().collect();
        indexed.sort_by(by_count_then_discovery);
        Self {
            entries: indexed.into_iter().map(|(_, entry)| entry).collect(),
        }
    }

    /// 直接包装已经排好序的条目，解码端使用
    pub fn from_ranked(entries: Vec<WordCount>) -> Self {
        Self { entries }
    }

    /// 标准的前 10 名视图
    pub fn top_ten(&self) -> RankedList {
        top_n(self, TOP_N)
    }

    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordCount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a WordCount;
    type IntoIter = std::slice::Iter<'a, WordCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
