//! 枚举定义的值

use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// 标签到序号（从 0 开始，按声明顺序）的映射
///
/// 标签重复时以最后一次出现的序号为准。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValues {
    labels: Vec<String>,
}

impl EnumValues {
    /// 从标签列表创建
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// 标签对应的序号
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().rposition(|l| l == label)
    }

    /// 序号对应的标签
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// 不同标签的数量
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 按声明顺序遍历 (标签, 序号)，重复标签只出现在最后一次的位置
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(index, label)| self.index_of(label) == Some(*index))
            .map(|(index, label)| (label.as_str(), index))
    }

    /// 转换为映射
    pub fn to_map(&self) -> HashMap<String, usize> {
        self.iter()
            .map(|(label, index)| (label.to_string(), index))
            .collect()
    }
}

impl Serialize for EnumValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
