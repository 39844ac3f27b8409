use crate::core::fetcher::ReactorsByItem;
use crate::domain::model::{ActivityMark, ActivityRecord, Post, Roster, UserId};
use std::collections::BTreeMap;

/// 把貼文 × 員工名單 × 按讚 / 轉發集合合併成每位員工的活動紀錄。
///
/// 標記順序與傳入的貼文順序一致；不在對照表裡的貼文視為沒有任何反應。
/// 名單中的每位員工都會有一筆紀錄。
pub fn aggregate(
    posts: &[Post],
    roster: &Roster,
    likes_by_item: &ReactorsByItem,
    reposts_by_item: &ReactorsByItem,
) -> BTreeMap<UserId, ActivityRecord> {
    let mut records: BTreeMap<UserId, ActivityRecord> = roster
        .iter()
        .map(|(id, employee)| (*id, ActivityRecord::new(employee.clone())))
        .collect();

    for post in posts {
        let likers = likes_by_item.get(&post.id);
        let reposters = reposts_by_item.get(&post.id);

        for (employee_id, record) in records.iter_mut() {
            let liked = likers.is_some_and(|set| set.contains(employee_id));
            let reposted = reposters.is_some_and(|set| set.contains(employee_id));
            record.push(ActivityMark::classify(liked, reposted));
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Employee, ReactorSet};
    use std::collections::HashMap;

    fn post(id: i64) -> Post {
        Post {
            id,
            date: 1_700_000_000 + id,
            text: String::new(),
            views: Default::default(),
            likes: Default::default(),
            reposts: Default::default(),
            comments: Default::default(),
        }
    }

    fn roster() -> Roster {
        [(10, "Alice"), (20, "Bob")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id,
                    Employee {
                        id,
                        name: name.to_string(),
                        url: format!("https://vk.com/id{}", id),
                        domain: format!("id{}", id),
                    },
                )
            })
            .collect()
    }

    fn sets(entries: &[(i64, Vec<i64>)]) -> HashMap<i64, ReactorSet> {
        entries
            .iter()
            .map(|(post, ids)| (*post, ids.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn test_worked_example() {
        let posts = vec![post(1), post(2)];
        let likes = sets(&[(1, vec![10]), (2, vec![10, 20])]);
        let reposts = sets(&[(1, vec![20]), (2, vec![])]);

        let records = aggregate(&posts, &roster(), &likes, &reposts);

        let alice = &records[&10];
        assert_eq!(alice.marks(), &[ActivityMark::Like, ActivityMark::Like]);
        assert_eq!(alice.stats().likes(), 2);
        assert_eq!(alice.stats().reposts(), 0);
        assert_eq!(alice.total(), 2);

        let bob = &records[&20];
        assert_eq!(bob.marks(), &[ActivityMark::Repost, ActivityMark::Like]);
        assert_eq!(bob.stats().likes(), 1);
        assert_eq!(bob.stats().reposts(), 1);
        assert_eq!(bob.total(), 2);
    }

    #[test]
    fn test_both_mark_counts_twice() {
        let posts = vec![post(5)];
        let likes = sets(&[(5, vec![10])]);
        let reposts = sets(&[(5, vec![10])]);

        let records = aggregate(&posts, &roster(), &likes, &reposts);

        assert_eq!(records[&10].marks(), &[ActivityMark::Both]);
        assert_eq!(records[&10].total(), 2);
        assert_eq!(records[&20].marks(), &[ActivityMark::None]);
        assert_eq!(records[&20].total(), 0);
    }

    #[test]
    fn test_mark_order_follows_input_order() {
        let likes = sets(&[(1, vec![10]), (2, vec![])]);
        let reposts = sets(&[(1, vec![]), (2, vec![10])]);

        let forward = aggregate(&[post(1), post(2)], &roster(), &likes, &reposts);
        let reverse = aggregate(&[post(2), post(1)], &roster(), &likes, &reposts);

        assert_eq!(
            forward[&10].marks(),
            &[ActivityMark::Like, ActivityMark::Repost]
        );
        assert_eq!(
            reverse[&10].marks(),
            &[ActivityMark::Repost, ActivityMark::Like]
        );
    }

    #[test]
    fn test_missing_post_entries_count_as_empty() {
        let records = aggregate(&[post(9)], &roster(), &HashMap::new(), &HashMap::new());
        assert_eq!(records.len(), 2);
        assert_eq!(records[&10].marks(), &[ActivityMark::None]);
    }

    #[test]
    fn test_non_roster_reactors_are_ignored() {
        let likes = sets(&[(1, vec![99, 100])]);
        let records = aggregate(&[post(1)], &roster(), &likes, &HashMap::new());
        assert!(records.values().all(|r| r.total() == 0));
        assert!(!records.contains_key(&99));
    }

    #[test]
    fn test_no_posts_gives_empty_records_for_everyone() {
        let records = aggregate(&[], &roster(), &HashMap::new(), &HashMap::new());
        assert_eq!(records.len(), 2);
        assert!(records.values().all(|r| r.marks().is_empty()));
    }
}
