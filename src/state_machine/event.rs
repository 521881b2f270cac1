//! Inbound actions and the events they feed into the state machine

use super::state::Flow;
use crate::catalog::{exercise_slug, Category};

/// A button press, identified by its action id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LogWeight,
    LogWorkout,
    ChooseCategory(Category),
    /// Exercise slug as carried on the button, resolved against the category later
    ChooseExercise(String),
    SetWaterGoal,
    SetCalorieGoal,
    LogMeal,
    LogCalories,
    Cancel,
    MainMenu,
    WaterTracker,
    AddWater,
    Nutrition,
    ViewProgress,
    DailyChallenge,
    CompleteChallenge,
    Settings,
    Unknown(String),
}

impl Action {
    /// Parse an action id such as `log_weight` or `exercise_jump_rope`
    pub fn parse(id: &str) -> Self {
        match id {
            "log_weight" => Action::LogWeight,
            "log_workout" => Action::LogWorkout,
            "set_water_goal" => Action::SetWaterGoal,
            "set_calorie_goal" => Action::SetCalorieGoal,
            "log_meal" => Action::LogMeal,
            "log_calories" => Action::LogCalories,
            "cancel" => Action::Cancel,
            "main_menu" => Action::MainMenu,
            "water_tracker" => Action::WaterTracker,
            "add_water" => Action::AddWater,
            "nutrition" => Action::Nutrition,
            "view_progress" => Action::ViewProgress,
            "daily_challenge" => Action::DailyChallenge,
            "complete_challenge" => Action::CompleteChallenge,
            "settings" => Action::Settings,
            other => {
                if let Some(category) = other.strip_prefix("category_").and_then(Category::from_id) {
                    Action::ChooseCategory(category)
                } else if let Some(slug) = other.strip_prefix("exercise_").filter(|s| !s.is_empty()) {
                    Action::ChooseExercise(slug.to_string())
                } else {
                    Action::Unknown(other.to_string())
                }
            }
        }
    }

    /// The action id a button must carry to produce this action
    pub fn id(&self) -> String {
        match self {
            Action::LogWeight => "log_weight".into(),
            Action::LogWorkout => "log_workout".into(),
            Action::ChooseCategory(c) => format!("category_{}", c.id()),
            Action::ChooseExercise(slug) => format!("exercise_{slug}"),
            Action::SetWaterGoal => "set_water_goal".into(),
            Action::SetCalorieGoal => "set_calorie_goal".into(),
            Action::LogMeal => "log_meal".into(),
            Action::LogCalories => "log_calories".into(),
            Action::Cancel => "cancel".into(),
            Action::MainMenu => "main_menu".into(),
            Action::WaterTracker => "water_tracker".into(),
            Action::AddWater => "add_water".into(),
            Action::Nutrition => "nutrition".into(),
            Action::ViewProgress => "view_progress".into(),
            Action::DailyChallenge => "daily_challenge".into(),
            Action::CompleteChallenge => "complete_challenge".into(),
            Action::Settings => "settings".into(),
            Action::Unknown(id) => id.clone(),
        }
    }

    pub fn exercise(name: &str) -> Self {
        Action::ChooseExercise(exercise_slug(name))
    }

    /// The state machine event for this action, or `None` for stateless views
    pub fn to_event(&self) -> Option<Event> {
        match self {
            Action::LogWeight => Some(Event::Begin(Flow::Weight)),
            Action::LogWorkout => Some(Event::Begin(Flow::Workout)),
            Action::SetWaterGoal => Some(Event::Begin(Flow::WaterGoal)),
            Action::SetCalorieGoal => Some(Event::Begin(Flow::CalorieGoal)),
            Action::LogMeal => Some(Event::Begin(Flow::Meal)),
            Action::LogCalories => Some(Event::Begin(Flow::Calories)),
            Action::ChooseCategory(c) => Some(Event::ChooseCategory(*c)),
            Action::ChooseExercise(slug) => Some(Event::ChooseExercise(slug.clone())),
            Action::Cancel => Some(Event::Cancel),
            _ => None,
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Entry point of a flow
    Begin(Flow),
    ChooseCategory(Category),
    ChooseExercise(String),
    /// Free-text reply from the user
    Reply(String),
    Cancel,
}
