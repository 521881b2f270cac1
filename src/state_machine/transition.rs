//! Pure state transition function

use super::effect::Mutation;
use super::state::{Flow, WorkoutStage};
use super::{ConvContext, ConvState, Effect, Event};
use crate::catalog::Category;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The record mutation this transition commits, if any
    pub fn mutation(&self) -> Option<&Mutation> {
        self.effects.iter().find_map(|e| match e {
            Effect::Commit(m) => Some(m),
            _ => None,
        })
    }
}

/// Input that the current state cannot accept. The state is left unchanged
/// and the user is asked again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid number (e.g. {example})")]
    NotANumber { example: &'static str },
    #[error("Please enter a number greater than zero (e.g. {example})")]
    NotPositive { example: &'static str },
    #[error("Please describe what you ate (e.g. 'Chicken salad')")]
    EmptyText,
    #[error("Please choose one of the buttons below")]
    ExpectedChoice,
    #[error("That would take today's total past what can be recorded; nothing was saved (try e.g. {example})")]
    TooLarge { example: &'static str },
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A {active} is in progress (finish or cancel it first)")]
    FlowInProgress { active: Flow },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Whether the event was out of place, as opposed to malformed input
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            TransitionError::FlowInProgress { .. } | TransitionError::InvalidTransition(_)
        )
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. Record changes
/// are described by `Effect::Commit` and applied by the caller.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Flow entry
        // ============================================================
        (ConvState::Idle, Event::Begin(flow)) => {
            Ok(TransitionResult::new(flow.initial_state()).with_effect(Effect::AwaitInput))
        }

        // "Back" from the exercise list, or re-asking for the category list
        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::ChoosingCategory | WorkoutStage::ChoosingExercise { .. },
            },
            Event::Begin(Flow::Workout),
        ) => Ok(TransitionResult::new(Flow::Workout.initial_state()).with_effect(Effect::AwaitInput)),

        (active, Event::Begin(_)) => Err(TransitionError::FlowInProgress {
            active: active_flow(active)?,
        }),

        // ============================================================
        // Cancellation
        // ============================================================
        (ConvState::Idle, Event::Cancel) => Err(TransitionError::InvalidTransition(
            "nothing to cancel".to_string(),
        )),

        (_, Event::Cancel) => {
            Ok(TransitionResult::new(ConvState::Idle).with_effect(Effect::NotifyCancelled))
        }

        // ============================================================
        // Workout flow
        // ============================================================
        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::ChoosingCategory,
            },
            Event::ChooseCategory(category),
        ) => Ok(TransitionResult::new(ConvState::LoggingWorkout {
            stage: WorkoutStage::ChoosingExercise { category },
        })
        .with_effect(Effect::AwaitInput)),

        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::ChoosingExercise { category },
            },
            Event::ChooseExercise(slug),
        ) => {
            let exercise = resolve_exercise(*category, &slug)?;
            Ok(TransitionResult::new(ConvState::LoggingWorkout {
                stage: WorkoutStage::EnteringSets {
                    exercise: exercise.to_string(),
                },
            })
            .with_effect(Effect::AwaitInput))
        }

        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::EnteringSets { exercise },
            },
            Event::Reply(text),
        ) => {
            let sets = parse_positive(&text, "3")?;
            Ok(TransitionResult::new(ConvState::LoggingWorkout {
                stage: WorkoutStage::EnteringReps {
                    exercise: exercise.clone(),
                    sets,
                },
            })
            .with_effect(Effect::AwaitInput))
        }

        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::EnteringReps { exercise, sets },
            },
            Event::Reply(text),
        ) => {
            let reps = parse_positive(&text, "12")?;
            Ok(TransitionResult::new(ConvState::Idle).with_effect(Effect::commit(
                Mutation::LogWorkout {
                    date: context.today,
                    time_of_day: context.time_of_day,
                    exercise: exercise.clone(),
                    sets: *sets,
                    reps,
                },
            )))
        }

        (
            ConvState::LoggingWorkout {
                stage: WorkoutStage::ChoosingCategory | WorkoutStage::ChoosingExercise { .. },
            },
            Event::Reply(_),
        ) => Err(ValidationError::ExpectedChoice.into()),

        // ============================================================
        // Single-reply flows
        // ============================================================
        (ConvState::LoggingWeight, Event::Reply(text)) => {
            let value = parse_weight(&text)?;
            Ok(commit(Mutation::LogWeight {
                date: context.today,
                value,
            }))
        }

        (ConvState::SettingWaterGoal, Event::Reply(text)) => {
            let goal = parse_positive(&text, "8")?;
            Ok(commit(Mutation::SetWaterGoal { goal }))
        }

        (ConvState::SettingCalorieGoal, Event::Reply(text)) => {
            let goal = parse_positive(&text, "2000")?;
            Ok(commit(Mutation::SetCalorieGoal { goal }))
        }

        (ConvState::LoggingMeal, Event::Reply(text)) => {
            let name = text.trim();
            if name.is_empty() {
                return Err(ValidationError::EmptyText.into());
            }
            Ok(commit(Mutation::LogMeal {
                date: context.today,
                time_of_day: context.time_of_day,
                name: name.to_string(),
            }))
        }

        (ConvState::LoggingCalories, Event::Reply(text)) => {
            let kcal = parse_count(&text, "500")?;
            Ok(commit(Mutation::LogCalories {
                date: context.today,
                kcal,
            }))
        }

        (ConvState::Idle, Event::Reply(_)) => Err(TransitionError::InvalidTransition(
            "no flow is waiting for a reply".to_string(),
        )),

        // ============================================================
        // Stale or mismatched buttons
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} does not apply in state {state:?}"
        ))),
    }
}

fn commit(mutation: Mutation) -> TransitionResult {
    TransitionResult::new(ConvState::Idle).with_effect(Effect::commit(mutation))
}

fn active_flow(state: &ConvState) -> Result<Flow, TransitionError> {
    state
        .flow()
        .ok_or_else(|| TransitionError::InvalidTransition("no active flow".to_string()))
}

fn resolve_exercise(category: Category, slug: &str) -> Result<&'static str, TransitionError> {
    category.exercise_by_slug(slug).ok_or_else(|| {
        TransitionError::InvalidTransition(format!("{slug} is not a {category} exercise"))
    })
}

fn parse_weight(text: &str) -> Result<f64, ValidationError> {
    let example = "75.5";
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber { example })?;
    if !value.is_finite() {
        return Err(ValidationError::NotANumber { example });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { example });
    }
    Ok(value)
}

fn parse_count(text: &str, example: &'static str) -> Result<u32, ValidationError> {
    text.trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber { example })
}

fn parse_positive(text: &str, example: &'static str) -> Result<u32, ValidationError> {
    match parse_count(text, example)? {
        0 => Err(ValidationError::NotPositive { example }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn test_context() -> ConvContext {
        ConvContext::new(
            "u1",
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        )
    }

    fn workout(stage: WorkoutStage) -> ConvState {
        ConvState::LoggingWorkout { stage }
    }

    fn step(state: &ConvState, event: Event) -> TransitionResult {
        transition(state, &test_context(), event).unwrap()
    }

    #[test]
    fn test_idle_begin_enters_flow() {
        for flow in Flow::ALL {
            let result = step(&ConvState::Idle, Event::Begin(flow));
            assert_eq!(result.new_state, flow.initial_state());
            assert_eq!(result.effects, vec![Effect::AwaitInput]);
        }
    }

    #[test]
    fn test_full_workout_flow() {
        let ctx = test_context();
        let s1 = step(&ConvState::Idle, Event::Begin(Flow::Workout)).new_state;
        let s2 = step(&s1, Event::ChooseCategory(Category::Strength)).new_state;
        assert_eq!(s2, workout(WorkoutStage::ChoosingExercise { category: Category::Strength }));

        let s3 = step(&s2, Event::ChooseExercise("squats".into())).new_state;
        assert_eq!(s3, workout(WorkoutStage::EnteringSets { exercise: "Squats".into() }));

        let s4 = step(&s3, Event::Reply(" 3 ".into())).new_state;
        assert_eq!(
            s4,
            workout(WorkoutStage::EnteringReps {
                exercise: "Squats".into(),
                sets: 3
            })
        );

        let done = step(&s4, Event::Reply("12".into()));
        assert_eq!(done.new_state, ConvState::Idle);
        assert_eq!(
            done.mutation(),
            Some(&Mutation::LogWorkout {
                date: ctx.today,
                time_of_day: ctx.time_of_day,
                exercise: "Squats".into(),
                sets: 3,
                reps: 12,
            })
        );
    }

    #[test]
    fn test_exercise_from_other_category_is_rejected() {
        let state = workout(WorkoutStage::ChoosingExercise { category: Category::Cardio });
        let err = transition(&state, &test_context(), Event::ChooseExercise("squats".into())).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_back_returns_to_category_choice() {
        let state = workout(WorkoutStage::ChoosingExercise { category: Category::Cardio });
        let result = step(&state, Event::Begin(Flow::Workout));
        assert_eq!(result.new_state, Flow::Workout.initial_state());
    }

    #[test]
    fn test_second_entry_point_is_rejected() {
        let state = workout(WorkoutStage::EnteringSets { exercise: "Running".into() });
        let err = transition(&state, &test_context(), Event::Begin(Flow::Weight)).unwrap_err();
        assert_eq!(err, TransitionError::FlowInProgress { active: Flow::Workout });

        let err = transition(&state, &test_context(), Event::Begin(Flow::Workout)).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_weight_validation() {
        let state = ConvState::LoggingWeight;
        let ctx = test_context();
        for bad in ["abc", "", "NaN", "inf"] {
            let err = transition(&state, &ctx, Event::Reply(bad.into())).unwrap_err();
            assert_eq!(err, TransitionError::Validation(ValidationError::NotANumber { example: "75.5" }), "{bad}");
        }
        for bad in ["0", "-3"] {
            let err = transition(&state, &ctx, Event::Reply(bad.into())).unwrap_err();
            assert_eq!(err, TransitionError::Validation(ValidationError::NotPositive { example: "75.5" }), "{bad}");
        }

        let ok = step(&state, Event::Reply("75.5".into()));
        assert_eq!(ok.new_state, ConvState::Idle);
        assert_eq!(
            ok.mutation(),
            Some(&Mutation::LogWeight {
                date: ctx.today,
                value: 75.5
            })
        );
    }

    #[test]
    fn test_validation_message_matches_prompt_example() {
        assert_eq!(
            ValidationError::NotANumber { example: "75.5" }.to_string(),
            "Please enter a valid number (e.g. 75.5)"
        );
    }

    #[test]
    fn test_sets_and_reps_must_be_positive_integers() {
        let sets = workout(WorkoutStage::EnteringSets { exercise: "Yoga".into() });
        for bad in ["0", "2.5", "-1", "three"] {
            assert!(matches!(
                transition(&sets, &test_context(), Event::Reply(bad.into())),
                Err(TransitionError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_goals() {
        let water = step(&ConvState::SettingWaterGoal, Event::Reply("10".into()));
        assert_eq!(water.mutation(), Some(&Mutation::SetWaterGoal { goal: 10 }));

        let cal = step(&ConvState::SettingCalorieGoal, Event::Reply("1800".into()));
        assert_eq!(cal.mutation(), Some(&Mutation::SetCalorieGoal { goal: 1800 }));

        let err = transition(&ConvState::SettingWaterGoal, &test_context(), Event::Reply("0".into()))
            .unwrap_err();
        assert_eq!(err, TransitionError::Validation(ValidationError::NotPositive { example: "8" }));
    }

    #[test]
    fn test_meal_is_trimmed_and_non_empty() {
        let ok = step(&ConvState::LoggingMeal, Event::Reply("  Chicken salad ".into()));
        assert!(matches!(
            ok.mutation(),
            Some(Mutation::LogMeal { name, .. }) if name == "Chicken salad"
        ));

        let err = transition(&ConvState::LoggingMeal, &test_context(), Event::Reply("   ".into()))
            .unwrap_err();
        assert_eq!(err, TransitionError::Validation(ValidationError::EmptyText));
    }

    #[test]
    fn test_zero_calories_allowed() {
        let ok = step(&ConvState::LoggingCalories, Event::Reply("0".into()));
        assert!(matches!(ok.mutation(), Some(Mutation::LogCalories { kcal: 0, .. })));
    }

    #[test]
    fn test_cancel() {
        let state = workout(WorkoutStage::EnteringReps {
            exercise: "Running".into(),
            sets: 2,
        });
        let result = step(&state, Event::Cancel);
        assert_eq!(result.new_state, ConvState::Idle);
        assert_eq!(result.effects, vec![Effect::NotifyCancelled]);

        let err = transition(&ConvState::Idle, &test_context(), Event::Cancel).unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn test_stale_inputs_are_invalid() {
        let ctx = test_context();
        assert!(transition(&ConvState::Idle, &ctx, Event::Reply("12".into()))
            .unwrap_err()
            .is_invalid_transition());
        assert!(transition(&ConvState::Idle, &ctx, Event::ChooseCategory(Category::Cardio))
            .unwrap_err()
            .is_invalid_transition());
        assert!(
            transition(&ConvState::LoggingWeight, &ctx, Event::ChooseExercise("running".into()))
                .unwrap_err()
                .is_invalid_transition()
        );
    }

    #[test]
    fn test_text_while_choosing_asks_for_button() {
        let err = transition(
            &Flow::Workout.initial_state(),
            &test_context(),
            Event::Reply("running".into()),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::Validation(ValidationError::ExpectedChoice));
    }
}
