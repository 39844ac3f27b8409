use crate::domain::model::{ActivityRecord, UserId};
use std::collections::BTreeMap;

/// 依總互動數由高到低排序，同分時以員工 ID 由小到大
pub fn rank(records: BTreeMap<UserId, ActivityRecord>) -> Vec<ActivityRecord> {
    let mut ranked: Vec<ActivityRecord> = records.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| a.employee.id.cmp(&b.employee.id))
    });
    ranked
}
