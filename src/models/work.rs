use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// 待评定的作品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_id")]
    pub resource_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author_name: String,
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}「{}」", self.name, self.author_name)
    }
}

/// 一条评定任务（每日任务或额外任务）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RatingTask {
    #[serde(default)]
    pub completed: bool,
    /// 已完成任务的评分
    #[serde(default, deserialize_with = "deserialize_score")]
    pub score: Option<i64>,
    pub work: WorkItem,
}

/// 每日必做任务批次
///
/// 每次运行只拉取一次，之后不再变更
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBatch {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub completed_count: u32,
    #[serde(default)]
    pub works: Vec<RatingTask>,
}

impl DailyBatch {
    /// 今日任务是否已全部完成
    pub fn is_complete(&self) -> bool {
        self.count == self.completed_count
    }

    /// 尚未评分的作品，保持服务端返回顺序
    pub fn pending(&self) -> impl Iterator<Item = &WorkItem> {
        self.works.iter().filter(|t| !t.completed).map(|t| &t.work)
    }
}

/// 额外评定队列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraQueue {
    /// 未完成的作品，保持列表顺序
    pub pending: Vec<WorkItem>,
    /// 今日已完成的额外任务数
    pub completed_count: usize,
}

impl ExtraQueue {
    /// 按 `completed` 拆分服务端返回的任务列表
    pub fn from_tasks(tasks: Vec<RatingTask>) -> Self {
        let (completed, pending): (Vec<_>, Vec<_>) = tasks.into_iter().partition(|t| t.completed);
        Self {
            pending: pending.into_iter().map(|t| t.work).collect(),
            completed_count: completed.len(),
        }
    }
}

// 服务端的 id 时而是字符串时而是数字
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a numeric score, a numeric string or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let value = value.trim();
            if value.is_empty() {
                return Ok(None);
            }
            value
                .parse::<f64>()
                .map(|v| Some(v as i64))
                .map_err(|_| E::custom(format!("invalid score: {}", value)))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as i64))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value as i64))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daily_batch_mixed_id_and_score_types() {
        let batch: DailyBatch = serde_json::from_value(json!({
            "id": 9001,
            "count": 3,
            "completedCount": 1,
            "works": [
                {"completed": true, "score": "4", "work": {"id": 1, "resourceId": 11, "name": "W1", "authorName": "A"}},
                {"completed": false, "score": null, "work": {"id": "2", "resourceId": "22", "name": "W2", "authorName": "B"}},
                {"completed": false, "work": {"id": 3, "name": "W3", "authorName": "C"}}
            ]
        }))
        .unwrap();

        assert_eq!(batch.id, "9001");
        assert!(!batch.is_complete());
        assert_eq!(batch.works[0].score, Some(4));
        assert_eq!(batch.works[1].score, None);
        assert_eq!(batch.works[2].work.resource_id, "");
        let pending: Vec<_> = batch.pending().map(|w| w.id.as_str()).collect();
        assert_eq!(pending, vec!["2", "3"]);
    }

    #[test]
    fn test_float_score() {
        let task: RatingTask =
            serde_json::from_value(json!({"completed": true, "score": 3.0, "work": {"id": 1}})).unwrap();
        assert_eq!(task.score, Some(3));
    }

    #[test]
    fn test_extra_queue_partition_keeps_order() {
        let tasks: Vec<RatingTask> = serde_json::from_value(json!([
            {"completed": true, "work": {"id": 1}},
            {"completed": false, "work": {"id": 2}},
            {"completed": true, "work": {"id": 3}},
            {"completed": false, "work": {"id": 4}}
        ]))
        .unwrap();

        let queue = ExtraQueue::from_tasks(tasks);
        assert_eq!(queue.completed_count, 2);
        let ids: Vec<_> = queue.pending.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }
}
