//! 评分策略 - 业务能力层

use std::fmt;

use crate::models::WorkItem;

/// 评分值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Three,
    Four,
}

impl Score {
    pub fn as_str(self) -> &'static str {
        match self {
            Score::Three => "3",
            Score::Four => "4",
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次评分的结果：分数 + 标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub score: Score,
    pub tag: String,
}

/// 评分策略
///
/// 作品名或作者名中含有 ASCII 字母时给 4 分，否则 3 分；标签固定为 `{score}-A-1`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringPolicy;

impl ScoringPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn score_for(&self, work: &WorkItem) -> Rating {
        let has_latin = work
            .name
            .chars()
            .chain(work.author_name.chars())
            .any(|c| c.is_ascii_alphabetic());

        let score = if has_latin { Score::Four } else { Score::Three };
        Rating {
            score,
            tag: format!("{}-A-1", score),
        }
    }
}
