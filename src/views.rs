//! Reply payloads and the text/keyboard renderers behind them

use crate::catalog::{exercise_slug, Category, Challenge};
use crate::record::{Achievement, FitnessRecord};
use crate::state_machine::{
    Action, ConvState, Flow, Mutation, TransitionError, ValidationError, WorkoutStage,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;

const BAR_CELLS: u32 = 10;
const FILLED: &str = "🟩";
const EMPTY: &str = "⬜";

/// An inline button carrying an action id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: &Action) -> Self {
        Self {
            label: label.into(),
            action: action.id(),
        }
    }
}

pub type Keyboard = Vec<Vec<Button>>;

/// A message plus the buttons shown under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderPayload {
    pub text: String,
    pub buttons: Keyboard,
}

/// A message that asks the user for input within a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowPrompt {
    pub flow: Flow,
    pub text: String,
    pub buttons: Keyboard,
}

/// What the transport should show the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Render(RenderPayload),
    Prompt(FlowPrompt),
}

impl Reply {
    pub fn render(text: impl Into<String>, buttons: Keyboard) -> Self {
        Reply::Render(RenderPayload {
            text: text.into(),
            buttons,
        })
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Render(r) => &r.text,
            Reply::Prompt(p) => &p.text,
        }
    }

    pub fn buttons(&self) -> &Keyboard {
        match self {
            Reply::Render(r) => &r.buttons,
            Reply::Prompt(p) => &p.buttons,
        }
    }

    pub fn is_prompt(&self) -> bool {
        matches!(self, Reply::Prompt(_))
    }
}

// ============================================================================
// Keyboards
// ============================================================================

pub fn main_menu_keyboard() -> Keyboard {
    vec![
        vec![
            Button::new("📊 Log Weight", &Action::LogWeight),
            Button::new("🏋️ Log Workout", &Action::LogWorkout),
        ],
        vec![
            Button::new("💧 Water Tracker", &Action::WaterTracker),
            Button::new("🍎 Nutrition", &Action::Nutrition),
        ],
        vec![
            Button::new("📈 View Progress", &Action::ViewProgress),
            Button::new("🔥 Daily Challenge", &Action::DailyChallenge),
        ],
        vec![Button::new("⚙️ Settings", &Action::Settings)],
    ]
}

fn main_menu_row() -> Vec<Button> {
    vec![Button::new("🏠 Main Menu", &Action::MainMenu)]
}

fn cancel_keyboard() -> Keyboard {
    vec![vec![Button::new("🚫 Cancel", &Action::Cancel)]]
}

fn category_keyboard() -> Keyboard {
    let mut rows: Keyboard = Category::ALL
        .iter()
        .map(|c| vec![Button::new(format!("{} Exercises", c.title()), &Action::ChooseCategory(*c))])
        .collect();
    rows.push(main_menu_row());
    rows
}

fn exercise_keyboard(category: Category) -> Keyboard {
    let mut rows: Keyboard = category
        .exercises()
        .iter()
        .map(|name| vec![Button::new(*name, &Action::ChooseExercise(exercise_slug(name)))])
        .collect();
    rows.push(vec![Button::new("🔙 Back", &Action::LogWorkout)]);
    rows
}

// ============================================================================
// Menus and commands
// ============================================================================

pub fn main_menu() -> Reply {
    Reply::render("🏠 Main Menu", main_menu_keyboard())
}

pub fn welcome(first_name: &str) -> Reply {
    Reply::render(
        format!("👋 Welcome {first_name} to Fitness Tracker Pro!\nYour complete fitness companion:"),
        main_menu_keyboard(),
    )
}

pub fn help() -> Reply {
    Reply::render(
        "ℹ️ Fitness Tracker Pro\n\n\
         /start - open the tracker\n\
         /menu - back to the main menu\n\
         /cancel - abandon the current entry\n\
         /help - show this message\n\n\
         Use the buttons to log weight, workouts, water and meals.",
        main_menu_keyboard(),
    )
}

pub fn unknown_command(command: &str) -> Reply {
    Reply::render(
        format!("🤷 I don't know the command /{command}. Try /help."),
        main_menu_keyboard(),
    )
}

pub fn cancelled() -> Reply {
    Reply::render("Operation cancelled", main_menu_keyboard())
}

pub fn settings() -> Reply {
    Reply::render(
        "⚙️ Settings\n\nConfigure your fitness tracker:",
        vec![
            vec![
                Button::new("💧 Water Goal", &Action::SetWaterGoal),
                Button::new("🔥 Calorie Goal", &Action::SetCalorieGoal),
            ],
            main_menu_row(),
        ],
    )
}

// ============================================================================
// Flow prompts
// ============================================================================

/// The prompt asking for whatever `state` expects next
pub fn prompt_for(state: &ConvState) -> Option<Reply> {
    let flow = state.flow()?;
    let (text, buttons) = match state {
        ConvState::Idle => return None,
        ConvState::LoggingWeight => ("Enter your current weight (kg):".to_string(), cancel_keyboard()),
        ConvState::LoggingWorkout { stage } => match stage {
            WorkoutStage::ChoosingCategory => ("🏋️ Select Workout Category:".to_string(), category_keyboard()),
            WorkoutStage::ChoosingExercise { category } => {
                (format!("{} Exercises:", category.title()), exercise_keyboard(*category))
            }
            WorkoutStage::EnteringSets { exercise } => {
                (format!("Selected: {exercise}\nEnter number of sets:"), cancel_keyboard())
            }
            WorkoutStage::EnteringReps { sets, .. } => {
                (format!("Enter number of reps for {sets} sets:"), cancel_keyboard())
            }
        },
        ConvState::SettingWaterGoal => ("Enter your daily water goal (glasses):".to_string(), cancel_keyboard()),
        ConvState::SettingCalorieGoal => ("Enter your daily calorie goal (kcal):".to_string(), cancel_keyboard()),
        ConvState::LoggingMeal => ("What did you eat? (e.g. 'Chicken salad')".to_string(), cancel_keyboard()),
        ConvState::LoggingCalories => ("Enter calories consumed:".to_string(), cancel_keyboard()),
    };
    Some(Reply::Prompt(FlowPrompt { flow, text, buttons }))
}

/// Re-prompt after malformed input, keeping the same state
pub fn invalid_input(state: &ConvState, error: &ValidationError) -> Reply {
    match prompt_for(state) {
        Some(Reply::Prompt(mut prompt)) => {
            prompt.text = match error {
                ValidationError::ExpectedChoice => format!("{error}\n\n{}", prompt.text),
                _ => error.to_string(),
            };
            Reply::Prompt(prompt)
        }
        _ => Reply::render(error.to_string(), main_menu_keyboard()),
    }
}

/// Neutral answer to a rejected event
pub fn rejected(state: &ConvState, error: &TransitionError) -> Reply {
    match error {
        TransitionError::Validation(v) => invalid_input(state, v),
        TransitionError::FlowInProgress { active } => {
            let mut reply = prompt_for(state).unwrap_or_else(main_menu);
            if let Reply::Prompt(p) = &mut reply {
                p.text = format!("⏳ Please finish or cancel your {active} first.\n\n{}", p.text);
            }
            reply
        }
        TransitionError::InvalidTransition(_) => match prompt_for(state) {
            Some(Reply::Prompt(mut p)) => {
                p.text = format!("🤔 Nothing to do with that right now.\n\n{}", p.text);
                Reply::Prompt(p)
            }
            _ => Reply::render("🤔 Nothing to do right now.", main_menu_keyboard()),
        },
    }
}

/// Storage failed; the active draft (if any) is still in place
pub fn storage_unavailable(state: &ConvState) -> Reply {
    let text = "⚠️ Your data couldn't be saved or loaded right now. Please try again in a moment.";
    match prompt_for(state) {
        Some(Reply::Prompt(mut p)) => {
            p.text = format!("{text}\n\n{}", p.text);
            Reply::Prompt(p)
        }
        _ => Reply::render(text, main_menu_keyboard()),
    }
}

// ============================================================================
// Commit confirmations
// ============================================================================

pub fn confirmation(mutation: &Mutation, record: &FitnessRecord, unlocked: &[Achievement]) -> Reply {
    let mut text = match mutation {
        Mutation::LogWeight { value, .. } => format!("✅ Weight {value:?}kg saved!"),
        Mutation::LogWorkout {
            exercise, sets, reps, ..
        } => format!(
            "✅ Workout logged!\n{exercise}: {sets} sets of {reps} reps\n🔥 Current streak: {} days",
            record.streak
        ),
        Mutation::SetWaterGoal { goal } => format!("✅ Water goal set to {goal} glasses per day!"),
        Mutation::SetCalorieGoal { goal } => format!("✅ Calorie goal set to {goal} kcal per day!"),
        Mutation::LogMeal { name, .. } => format!("✅ Meal logged: {name}"),
        Mutation::LogCalories { date, kcal } => format!(
            "✅ {kcal} calories logged!\nToday: {}/{} kcal",
            record.calories.consumed_on(*date),
            record.calories.daily_goal
        ),
    };
    for achievement in unlocked {
        let _ = write!(text, "\n🏆 Achievement unlocked: {}", achievement.title());
    }
    Reply::render(text, main_menu_keyboard())
}

// ============================================================================
// Stateless views
// ============================================================================

/// Ten-cell bar, one filled cell per full 10%
pub fn progress_bar(percent: u32) -> String {
    let filled = (percent.min(100) / 10).min(BAR_CELLS);
    let mut bar = FILLED.repeat(filled as usize);
    bar.push_str(&EMPTY.repeat((BAR_CELLS - filled) as usize));
    bar
}

pub fn water_tracker(record: &FitnessRecord, today: NaiveDate) -> Reply {
    let count = record.water.count_on(today);
    let percent = record.water.progress_percent(today);
    Reply::render(
        format!(
            "💧 Water Tracker\n\nToday's intake: {count}/{} glasses\n{} {percent}%\n\nKeep hydrating for better performance!",
            record.water.daily_goal,
            progress_bar(percent)
        ),
        vec![
            vec![
                Button::new("➕ Add Glass", &Action::AddWater),
                Button::new("⚙️ Set Goal", &Action::SetWaterGoal),
            ],
            main_menu_row(),
        ],
    )
}

pub fn nutrition(record: &FitnessRecord, today: NaiveDate) -> Reply {
    let mut text = format!(
        "🍎 Nutrition Tracker\n\nCalories today: {}/{} kcal\n",
        record.calories.consumed_on(today),
        record.calories.daily_goal
    );
    let mut meals = record.meals_on(today).peekable();
    if meals.peek().is_some() {
        text.push_str("\n🍽️ Meals today:\n");
        for meal in meals {
            let _ = writeln!(text, "  {} {}", meal.time_of_day.format("%H:%M"), meal.name);
        }
    }
    text.push_str("\nTrack your meals and calories:");
    Reply::render(
        text,
        vec![
            vec![
                Button::new("📝 Log Meal", &Action::LogMeal),
                Button::new("🔥 Log Calories", &Action::LogCalories),
            ],
            vec![Button::new("⚙️ Set Calorie Goal", &Action::SetCalorieGoal)],
            main_menu_row(),
        ],
    )
}

pub fn progress(record: &FitnessRecord, today: NaiveDate) -> Reply {
    let mut text = String::from("📊 Your Progress\n\n");

    if !record.weight_log.is_empty() {
        text.push_str("⚖️ Weight History:\n");
        let skip = record.weight_log.len().saturating_sub(5);
        for entry in &record.weight_log[skip..] {
            let _ = writeln!(text, "{}: {:?}kg", entry.date, entry.value);
        }
        text.push('\n');
    }

    if !record.workouts.is_empty() {
        text.push_str("🏋️ Recent Workouts:\n");
        let skip = record.workouts.len().saturating_sub(3);
        for (date, exercises) in record.workouts.iter().skip(skip) {
            let _ = writeln!(text, "\n{date}:");
            for (exercise, entry) in exercises {
                let _ = writeln!(text, "  {exercise}: {}x{}", entry.sets, entry.reps);
            }
        }
    }

    let _ = write!(
        text,
        "\n🍎 Nutrition Today: {}/{} kcal",
        record.calories.consumed_on(today),
        record.calories.daily_goal
    );
    let _ = write!(text, "\n\n🔥 Current streak: {} days", record.streak);

    if !record.achievements.is_empty() {
        text.push_str("\n\n🏆 Achievements:");
        for achievement in &record.achievements {
            let _ = write!(text, "\n{}", achievement.title());
        }
    }

    Reply::render(text, vec![main_menu_row()])
}

pub fn challenge(challenge: &Challenge) -> Reply {
    Reply::render(
        format!(
            "🔥 Today's Challenge\n\n🏆 {}\n{}\n\n🎁 Reward: {}",
            challenge.name, challenge.description, challenge.reward
        ),
        vec![
            vec![Button::new("✅ I Did It!", &Action::CompleteChallenge)],
            main_menu_row(),
        ],
    )
}

pub fn challenge_completed() -> Reply {
    Reply::render("🎉 Great job completing today's challenge!", main_menu_keyboard())
}
