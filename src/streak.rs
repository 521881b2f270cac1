//! Activity streak and achievement computation
//!
//! Pure functions only. Calling `recompute_streak` twice on the same day
//! yields the same result as calling it once.

use crate::record::{Achievement, FitnessRecord};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Derived fields after an activity event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub last_active: NaiveDate,
    pub achievements: BTreeSet<Achievement>,
}

impl StreakUpdate {
    /// Achievements present in this update but not in `before`
    pub fn newly_unlocked(&self, before: &BTreeSet<Achievement>) -> Vec<Achievement> {
        self.achievements.difference(before).copied().collect()
    }
}

pub fn recompute_streak(record: &FitnessRecord, today: NaiveDate) -> StreakUpdate {
    let (streak, last_active) = match record.last_active_date {
        None => (1, today),
        Some(last) => match (today - last).num_days() {
            // Clock went backwards; keep what we have.
            d if d < 0 => (record.streak, last),
            0 => (record.streak, today),
            1 => (record.streak.saturating_add(1), today),
            _ => (1, today),
        },
    };

    let mut achievements = record.achievements.clone();
    achievements.extend(
        Achievement::ALL
            .into_iter()
            .filter(|a| streak >= a.threshold()),
    );

    StreakUpdate {
        streak,
        last_active,
        achievements,
    }
}

impl FitnessRecord {
    /// Apply an activity event for `today`, returning achievements unlocked by it
    pub fn record_activity(&mut self, today: NaiveDate) -> Vec<Achievement> {
        let update = recompute_streak(self, today);
        let unlocked = update.newly_unlocked(&self.achievements);
        self.streak = update.streak;
        self.last_active_date = Some(update.last_active);
        self.achievements = update.achievements;
        unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn record_with(last: Option<NaiveDate>, streak: u32) -> FitnessRecord {
        FitnessRecord {
            last_active_date: last,
            streak,
            ..FitnessRecord::default()
        }
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let update = recompute_streak(&record_with(None, 0), today());
        assert_eq!(update.streak, 1);
        assert_eq!(update.last_active, today());
    }

    #[test]
    fn test_consecutive_day_increments() {
        let record = record_with(Some(today() - Duration::days(1)), 5);
        assert_eq!(recompute_streak(&record, today()).streak, 6);
    }

    #[test]
    fn test_gap_resets_to_one() {
        let record = record_with(Some(today() - Duration::days(3)), 12);
        assert_eq!(recompute_streak(&record, today()).streak, 1);
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let mut record = record_with(Some(today() - Duration::days(1)), 5);
        record.record_activity(today());
        assert_eq!(record.streak, 6);
        record.record_activity(today());
        assert_eq!(record.streak, 6);
        assert_eq!(record.last_active_date, Some(today()));
    }

    #[test]
    fn test_clock_moving_backwards_changes_nothing() {
        let record = record_with(Some(today()), 4);
        let update = recompute_streak(&record, today() - Duration::days(2));
        assert_eq!(update.streak, 4);
        assert_eq!(update.last_active, today());
    }

    #[test]
    fn test_seven_day_unlock_reported_once() {
        let mut record = record_with(Some(today() - Duration::days(1)), 6);
        let unlocked = record.record_activity(today());
        assert_eq!(unlocked, vec![Achievement::SevenDayStreak]);
        assert!(record.record_activity(today()).is_empty());
    }

    #[test]
    fn test_achievements_survive_reset() {
        let mut record = record_with(Some(today() - Duration::days(1)), 29);
        record.record_activity(today());
        assert!(record.achievements.contains(&Achievement::ThirtyDayStreak));
        assert!(record.achievements.contains(&Achievement::SevenDayStreak));

        record.record_activity(today() + Duration::days(5));
        assert_eq!(record.streak, 1);
        assert_eq!(record.achievements.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_achievements_never_shrink(
            gaps in proptest::collection::vec(0i64..4, 1..60),
        ) {
            let mut record = FitnessRecord::default();
            let mut day = today();
            let mut seen = BTreeSet::new();
            for gap in gaps {
                day = day + Duration::days(gap);
                record.record_activity(day);
                prop_assert!(record.achievements.is_superset(&seen));
                prop_assert!(record.streak >= 1);
                seen.clone_from(&record.achievements);
            }
        }

        #[test]
        fn prop_repeat_same_day_is_noop(streak in 0u32..100, back in 0i64..5) {
            let record = record_with(Some(today() - Duration::days(back)), streak);
            let once = recompute_streak(&record, today());
            let mut applied = record.clone();
            applied.streak = once.streak;
            applied.last_active_date = Some(once.last_active);
            applied.achievements = once.achievements.clone();
            prop_assert_eq!(recompute_streak(&applied, today()), once);
        }
    }
}
