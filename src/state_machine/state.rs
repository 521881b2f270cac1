//! Conversation state types

use crate::catalog::Category;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The multi-step flows a user can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Weight,
    Workout,
    WaterGoal,
    CalorieGoal,
    Meal,
    Calories,
}

impl Flow {
    pub const ALL: [Flow; 6] = [
        Flow::Weight,
        Flow::Workout,
        Flow::WaterGoal,
        Flow::CalorieGoal,
        Flow::Meal,
        Flow::Calories,
    ];

    /// Human-readable name used in "finish or cancel" messages
    pub fn title(self) -> &'static str {
        match self {
            Flow::Weight => "weight entry",
            Flow::Workout => "workout log",
            Flow::WaterGoal => "water goal",
            Flow::CalorieGoal => "calorie goal",
            Flow::Meal => "meal entry",
            Flow::Calories => "calorie entry",
        }
    }

    /// State entered when this flow starts
    pub fn initial_state(self) -> ConvState {
        match self {
            Flow::Weight => ConvState::LoggingWeight,
            Flow::Workout => ConvState::LoggingWorkout {
                stage: WorkoutStage::ChoosingCategory,
            },
            Flow::WaterGoal => ConvState::SettingWaterGoal,
            Flow::CalorieGoal => ConvState::SettingCalorieGoal,
            Flow::Meal => ConvState::LoggingMeal,
            Flow::Calories => ConvState::LoggingCalories,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Sub-states of the workout flow. Later stages carry the draft collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum WorkoutStage {
    ChoosingCategory,
    ChoosingExercise { category: Category },
    EnteringSets { exercise: String },
    EnteringReps { exercise: String, sets: u32 },
}

/// Per-user conversation state. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No flow in progress
    #[default]
    Idle,
    LoggingWeight,
    LoggingWorkout { stage: WorkoutStage },
    SettingWaterGoal,
    SettingCalorieGoal,
    LoggingMeal,
    LoggingCalories,
}

impl ConvState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConvState::Idle)
    }

    /// The flow this state belongs to, if any
    pub fn flow(&self) -> Option<Flow> {
        match self {
            ConvState::Idle => None,
            ConvState::LoggingWeight => Some(Flow::Weight),
            ConvState::LoggingWorkout { .. } => Some(Flow::Workout),
            ConvState::SettingWaterGoal => Some(Flow::WaterGoal),
            ConvState::SettingCalorieGoal => Some(Flow::CalorieGoal),
            ConvState::LoggingMeal => Some(Flow::Meal),
            ConvState::LoggingCalories => Some(Flow::Calories),
        }
    }

    /// Whether this state waits for a typed reply (as opposed to a button)
    pub fn expects_text(&self) -> bool {
        match self {
            ConvState::Idle => false,
            ConvState::LoggingWorkout { stage } => matches!(
                stage,
                WorkoutStage::EnteringSets { .. } | WorkoutStage::EnteringReps { .. }
            ),
            _ => true,
        }
    }
}

/// Inputs to a transition that come from outside the state itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvContext {
    pub user_id: String,
    pub today: NaiveDate,
    pub time_of_day: NaiveTime,
}

impl ConvContext {
    pub fn new(user_id: impl Into<String>, today: NaiveDate, time_of_day: NaiveTime) -> Self {
        Self {
            user_id: user_id.into(),
            today,
            time_of_day,
        }
    }
}
