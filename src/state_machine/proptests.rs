//! Property-based tests for the state machine

use super::effect::Mutation;
use super::event::Event;
use super::state::{Flow, WorkoutStage};
use super::transition::{transition, TransitionError};
use super::*;
use crate::catalog::{exercise_slug, Category};
use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;

fn test_context() -> ConvContext {
    ConvContext::new(
        "prop-user",
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    )
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_flow() -> impl Strategy<Value = Flow> {
    prop::sample::select(Flow::ALL.to_vec())
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn arb_exercise() -> impl Strategy<Value = String> {
    arb_category().prop_flat_map(|c| prop::sample::select(c.exercises().to_vec()).prop_map(String::from))
}

fn arb_workout_stage() -> impl Strategy<Value = WorkoutStage> {
    prop_oneof![
        Just(WorkoutStage::ChoosingCategory),
        arb_category().prop_map(|category| WorkoutStage::ChoosingExercise { category }),
        arb_exercise().prop_map(|exercise| WorkoutStage::EnteringSets { exercise }),
        (arb_exercise(), 1u32..20).prop_map(|(exercise, sets)| WorkoutStage::EnteringReps { exercise, sets }),
    ]
}

fn arb_active_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::LoggingWeight),
        arb_workout_stage().prop_map(|stage| ConvState::LoggingWorkout { stage }),
        Just(ConvState::SettingWaterGoal),
        Just(ConvState::SettingCalorieGoal),
        Just(ConvState::LoggingMeal),
        Just(ConvState::LoggingCalories),
    ]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![Just(ConvState::Idle), arb_active_state()]
}

fn arb_reply() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..5000).prop_map(|n| n.to_string()),
        (0.0f64..300.0).prop_map(|f| format!("{f:.1}")),
        "[a-zA-Z ]{0,20}",
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_flow().prop_map(Event::Begin),
        arb_category().prop_map(Event::ChooseCategory),
        arb_exercise().prop_map(|e| Event::ChooseExercise(exercise_slug(&e))),
        arb_reply().prop_map(Event::Reply),
        Just(Event::Cancel),
    ]
}

// ============================================================================
// Invariant Checks
// ============================================================================

/// Every mutation carries values that passed validation
fn mutation_is_valid(mutation: &Mutation) -> bool {
    match mutation {
        Mutation::LogWeight { value, .. } => value.is_finite() && *value > 0.0,
        Mutation::LogWorkout { sets, reps, exercise, .. } => {
            *sets > 0
                && *reps > 0
                && Category::ALL
                    .iter()
                    .any(|c| c.exercises().contains(&exercise.as_str()))
        }
        Mutation::SetWaterGoal { goal } | Mutation::SetCalorieGoal { goal } => *goal > 0,
        Mutation::LogMeal { name, .. } => !name.trim().is_empty(),
        Mutation::LogCalories { .. } => true,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A commit only ever happens on the way back to Idle, and is always valid
    #[test]
    fn prop_commits_end_flow(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ConvState::Idle;
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                if let Some(m) = result.mutation() {
                    prop_assert_eq!(&result.new_state, &ConvState::Idle);
                    prop_assert!(mutation_is_valid(m), "invalid mutation {:?}", m);
                    prop_assert_eq!(result.effects.len(), 1);
                }
                state = result.new_state;
            }
        }
    }

    // Cancel from any active state returns to Idle without committing
    #[test]
    fn prop_cancel_always_idles(state in arb_active_state()) {
        let result = transition(&state, &test_context(), Event::Cancel).unwrap();
        prop_assert_eq!(&result.new_state, &ConvState::Idle);
        prop_assert!(result.mutation().is_none());
    }

    // Starting a different flow never replaces an active one
    #[test]
    fn prop_active_flow_rejects_other_entry(state in arb_active_state(), flow in arb_flow()) {
        prop_assume!(state.flow() != Some(flow));
        let result = transition(&state, &test_context(), Event::Begin(flow));
        prop_assert!(
            matches!(result, Err(TransitionError::FlowInProgress { .. })),
            "expected rejection, got {:?}",
            result
        );
    }

    // Rejected events never mutate anything: the caller keeps the old state
    #[test]
    fn prop_transition_is_deterministic(state in arb_state(), event in arb_event()) {
        let ctx = test_context();
        let a = transition(&state, &ctx, event.clone());
        let b = transition(&state, &ctx, event);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_state, b.new_state);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
    }

    // Any non-numeric reply to a numeric prompt re-prompts the same state
    #[test]
    fn prop_non_numeric_reply_is_validation_error(text in "[a-zA-Z]{1,12}") {
        prop_assume!(!text.eq_ignore_ascii_case("nan") && !text.to_ascii_lowercase().starts_with("inf"));
        for state in [ConvState::LoggingWeight, ConvState::SettingWaterGoal, ConvState::LoggingCalories] {
            let result = transition(&state, &test_context(), Event::Reply(text.clone()));
            prop_assert!(matches!(result, Err(TransitionError::Validation(_))));
        }
    }
}
