//! Fitness record types
//!
//! One `FitnessRecord` exists per user. It is the only persisted state; the
//! serialized JSON form is what the persistence backend stores.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_WATER_GOAL: u32 = 8;
pub const DEFAULT_CALORIE_GOAL: u32 = 2000;

/// A single body-weight measurement in kilograms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub value: f64,
}

/// One exercise logged on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub sets: u32,
    pub reps: u32,
    pub time_of_day: NaiveTime,
}

/// Hydration tracking. Today's count is looked up by date, so it resets at
/// day rollover without any explicit reset step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterLog {
    pub daily_goal: u32,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, u32>,
}

impl Default for WaterLog {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_WATER_GOAL,
            history: BTreeMap::new(),
        }
    }
}

impl WaterLog {
    pub fn count_on(&self, date: NaiveDate) -> u32 {
        self.history.get(&date).copied().unwrap_or(0)
    }

    /// Percentage of the daily goal reached, capped at 100
    pub fn progress_percent(&self, date: NaiveDate) -> u32 {
        if self.daily_goal == 0 {
            return 100;
        }
        let pct = u64::from(self.count_on(date)) * 100 / u64::from(self.daily_goal);
        u32::try_from(pct.min(100)).unwrap_or(100)
    }
}

/// A meal entry. Only the name is validated (non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub date: NaiveDate,
    pub time_of_day: NaiveTime,
}

/// Calorie tracking, keyed by day like `WaterLog`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieLog {
    pub daily_goal: u32,
    #[serde(default)]
    pub history: BTreeMap<NaiveDate, u32>,
}

impl Default for CalorieLog {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_CALORIE_GOAL,
            history: BTreeMap::new(),
        }
    }
}

impl CalorieLog {
    pub fn consumed_on(&self, date: NaiveDate) -> u32 {
        self.history.get(&date).copied().unwrap_or(0)
    }
}

/// Unlockable streak milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Achievement {
    #[serde(rename = "7-day-streak")]
    SevenDayStreak,
    #[serde(rename = "30-day-streak")]
    ThirtyDayStreak,
}

impl Achievement {
    pub const ALL: [Achievement; 2] = [Achievement::SevenDayStreak, Achievement::ThirtyDayStreak];

    /// Streak length that unlocks this achievement
    pub fn threshold(self) -> u32 {
        match self {
            Achievement::SevenDayStreak => 7,
            Achievement::ThirtyDayStreak => 30,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7-day-streak",
            Achievement::ThirtyDayStreak => "30-day-streak",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Achievement::SevenDayStreak => "7-day streak",
            Achievement::ThirtyDayStreak => "30-day streak",
        }
    }
}

/// Everything the tracker knows about one user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessRecord {
    #[serde(default)]
    pub weight_log: Vec<WeightEntry>,
    #[serde(default)]
    pub workouts: BTreeMap<NaiveDate, BTreeMap<String, WorkoutEntry>>,
    #[serde(default)]
    pub water: WaterLog,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub calories: CalorieLog,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub achievements: BTreeSet<Achievement>,
}

impl FitnessRecord {
    pub fn log_weight(&mut self, date: NaiveDate, value: f64) {
        self.weight_log.push(WeightEntry { date, value });
    }

    /// Record an exercise for `date`. A second log of the same exercise on the
    /// same day replaces the first.
    pub fn log_workout(&mut self, date: NaiveDate, exercise: &str, entry: WorkoutEntry) {
        self.workouts
            .entry(date)
            .or_default()
            .insert(exercise.to_string(), entry);
    }

    pub fn add_water_glass(&mut self, date: NaiveDate) -> u32 {
        let count = self.water.history.entry(date).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn set_water_goal(&mut self, goal: u32) {
        self.water.daily_goal = goal;
    }

    pub fn set_calorie_goal(&mut self, goal: u32) {
        self.calories.daily_goal = goal;
    }

    pub fn log_meal(&mut self, meal: Meal) {
        self.meals.push(meal);
    }

    /// Add to the day's total and return it. `None` if the total would
    /// overflow; the record is left unchanged.
    pub fn log_calories(&mut self, date: NaiveDate, kcal: u32) -> Option<u32> {
        let total = self.calories.consumed_on(date).checked_add(kcal)?;
        self.calories.history.insert(date, total);
        Some(total)
    }

    pub fn meals_on(&self, date: NaiveDate) -> impl Iterator<Item = &Meal> {
        self.meals.iter().filter(move |m| m.date == date)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
