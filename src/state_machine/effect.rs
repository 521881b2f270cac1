//! Effects produced by state transitions

use super::transition::ValidationError;
use crate::record::{Achievement, FitnessRecord, Meal, WorkoutEntry};
use chrono::{NaiveDate, NaiveTime};

/// A change to the user's fitness record, fully determined at transition time
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    LogWeight {
        date: NaiveDate,
        value: f64,
    },
    LogWorkout {
        date: NaiveDate,
        time_of_day: NaiveTime,
        exercise: String,
        sets: u32,
        reps: u32,
    },
    SetWaterGoal {
        goal: u32,
    },
    SetCalorieGoal {
        goal: u32,
    },
    LogMeal {
        date: NaiveDate,
        time_of_day: NaiveTime,
        name: String,
    },
    LogCalories {
        date: NaiveDate,
        kcal: u32,
    },
}

impl Mutation {
    /// Apply to `record`, returning achievements unlocked by it.
    ///
    /// Only a workout counts as an activity event for the streak. A value that
    /// the record cannot hold is refused and leaves the record untouched.
    pub fn apply(&self, record: &mut FitnessRecord) -> Result<Vec<Achievement>, ValidationError> {
        let unlocked = match self {
            Mutation::LogWeight { date, value } => {
                record.log_weight(*date, *value);
                Vec::new()
            }
            Mutation::LogWorkout {
                date,
                time_of_day,
                exercise,
                sets,
                reps,
            } => {
                record.log_workout(
                    *date,
                    exercise,
                    WorkoutEntry {
                        sets: *sets,
                        reps: *reps,
                        time_of_day: *time_of_day,
                    },
                );
                record.record_activity(*date)
            }
            Mutation::SetWaterGoal { goal } => {
                record.set_water_goal(*goal);
                Vec::new()
            }
            Mutation::SetCalorieGoal { goal } => {
                record.set_calorie_goal(*goal);
                Vec::new()
            }
            Mutation::LogMeal {
                date,
                time_of_day,
                name,
            } => {
                record.log_meal(Meal {
                    name: name.clone(),
                    date: *date,
                    time_of_day: *time_of_day,
                });
                Vec::new()
            }
            Mutation::LogCalories { date, kcal } => {
                record
                    .log_calories(*date, *kcal)
                    .ok_or(ValidationError::TooLarge { example: "500" })?;
                Vec::new()
            }
        };
        Ok(unlocked)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::LogWeight { .. } => "log_weight",
            Mutation::LogWorkout { .. } => "log_workout",
            Mutation::SetWaterGoal { .. } => "set_water_goal",
            Mutation::SetCalorieGoal { .. } => "set_calorie_goal",
            Mutation::LogMeal { .. } => "log_meal",
            Mutation::LogCalories { .. } => "log_calories",
        }
    }
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist a change to the record. The new state only takes hold once
    /// this succeeds.
    Commit(Mutation),

    /// Ask the user for the input the new state expects
    AwaitInput,

    /// Tell the user the flow was abandoned
    NotifyCancelled,
}

impl Effect {
    pub fn commit(mutation: Mutation) -> Self {
        Effect::Commit(mutation)
    }
}
