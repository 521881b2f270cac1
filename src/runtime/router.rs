//! Per-user dispatch of commands, button actions and text replies

use super::traits::{choose, Clock, RandomSource};
use crate::catalog::CHALLENGES;
use crate::state_machine::{
    transition, Action, ConvContext, ConvState, Effect, Event, TransitionError,
};
use crate::store::{RecordStore, StoreError};
use crate::views::{self, Reply};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Session = Arc<Mutex<ConvState>>;

/// Routes inbound actions to the active flow or to a stateless view.
///
/// Each user has one session mutex, held for the whole dispatch, so a user's
/// actions run one at a time in arrival order. The record store is only ever
/// locked while the session is held.
pub struct CommandRouter {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl CommandRouter {
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            store,
            clock,
            rng,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Number of users with a session in memory
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Handle a top-level command such as `/start`
    pub async fn handle_command(&self, user_id: &str, command: &str, first_name: Option<&str>) -> Reply {
        let command = normalize_command(command);
        tracing::info!(user_id = %user_id, command = %command, "Handling command");

        let session = self.session(user_id).await;
        let reply = {
            let mut state = session.lock().await;
            match command.as_str() {
                "start" => match self.store.get(user_id).await {
                    Ok(_) => {
                        reset(&mut state, user_id);
                        views::welcome(first_name.unwrap_or("there"))
                    }
                    Err(e) => self.storage_failed(user_id, &state, &e),
                },
                "menu" => {
                    reset(&mut state, user_id);
                    views::main_menu()
                }
                "cancel" => self.dispatch(user_id, &mut state, Event::Cancel).await,
                "help" => views::help(),
                other => {
                    tracing::debug!(user_id = %user_id, command = %other, "Unknown command");
                    views::unknown_command(other)
                }
            }
        };
        self.release_if_idle(user_id, session).await;
        reply
    }

    /// Handle a button press
    pub async fn handle_action(&self, user_id: &str, action_id: &str) -> Reply {
        let action = Action::parse(action_id);
        tracing::info!(user_id = %user_id, action = %action_id, "Handling action");

        let session = self.session(user_id).await;
        let reply = {
            let mut state = session.lock().await;
            self.route_action(user_id, &mut state, action).await
        };
        self.release_if_idle(user_id, session).await;
        reply
    }

    /// Handle free text typed by the user
    pub async fn handle_text_reply(&self, user_id: &str, text: &str) -> Reply {
        tracing::debug!(user_id = %user_id, len = text.len(), "Handling text reply");

        let session = self.session(user_id).await;
        let reply = {
            let mut state = session.lock().await;
            self.dispatch(user_id, &mut state, Event::Reply(text.to_string()))
                .await
        };
        self.release_if_idle(user_id, session).await;
        reply
    }

    async fn route_action(&self, user_id: &str, state: &mut ConvState, action: Action) -> Reply {
        if let Some(event) = action.to_event() {
            return self.dispatch(user_id, state, event).await;
        }

        let today = self.clock.today();
        match action {
            Action::MainMenu => {
                reset(state, user_id);
                views::main_menu()
            }
            Action::WaterTracker => match self.store.get(user_id).await {
                Ok(record) => views::water_tracker(&record, today),
                Err(e) => self.storage_failed(user_id, state, &e),
            },
            Action::AddWater => match self.store.update(user_id, |r| r.add_water_glass(today)).await {
                Ok((record, count)) => {
                    tracing::info!(user_id = %user_id, count, "Water glass added");
                    views::water_tracker(&record, today)
                }
                Err(e) => self.storage_failed(user_id, state, &e),
            },
            Action::Nutrition => match self.store.get(user_id).await {
                Ok(record) => views::nutrition(&record, today),
                Err(e) => self.storage_failed(user_id, state, &e),
            },
            Action::ViewProgress => match self.store.get(user_id).await {
                Ok(record) => views::progress(&record, today),
                Err(e) => self.storage_failed(user_id, state, &e),
            },
            Action::DailyChallenge => match choose(self.rng.as_ref(), &CHALLENGES) {
                Some(challenge) => views::challenge(challenge),
                None => views::main_menu(),
            },
            Action::CompleteChallenge => views::challenge_completed(),
            Action::Settings => views::settings(),
            Action::Unknown(id) => {
                tracing::debug!(user_id = %user_id, action = %id, "Unknown action");
                views::rejected(state, &TransitionError::InvalidTransition(format!("unknown action {id}")))
            }
            // Stateful actions were dispatched above
            _ => views::main_menu(),
        }
    }

    /// Run one event through the state machine and execute its effects.
    ///
    /// The new state is only installed once any commit has succeeded, so a
    /// storage failure leaves the draft in place for a retry.
    async fn dispatch(&self, user_id: &str, state: &mut ConvState, event: Event) -> Reply {
        let now = self.clock.now();
        let context = ConvContext::new(user_id, now.date(), now.time());

        let result = match transition(state, &context, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(user_id = %user_id, state = ?state, error = %e, "Event rejected");
                return views::rejected(state, &e);
            }
        };

        let mut reply = None;
        for effect in &result.effects {
            match effect {
                Effect::Commit(mutation) => {
                    match self.store.try_update(user_id, |r| mutation.apply(r)).await {
                        Ok(Ok((record, unlocked))) => {
                            tracing::info!(
                                user_id = %user_id,
                                mutation = mutation.kind(),
                                streak = record.streak,
                                "Committed"
                            );
                            for achievement in &unlocked {
                                tracing::info!(user_id = %user_id, achievement = achievement.id(), "Achievement unlocked");
                            }
                            reply = Some(views::confirmation(mutation, &record, &unlocked));
                        }
                        Ok(Err(refused)) => {
                            tracing::info!(user_id = %user_id, mutation = mutation.kind(), error = %refused, "Commit refused");
                            return views::invalid_input(state, &refused);
                        }
                        Err(e) => return self.storage_failed(user_id, state, &e),
                    }
                }
                Effect::AwaitInput => reply = views::prompt_for(&result.new_state),
                Effect::NotifyCancelled => {
                    tracing::info!(user_id = %user_id, flow = ?state.flow(), "Flow cancelled");
                    reply = Some(views::cancelled());
                }
            }
        }

        if state.flow() != result.new_state.flow() {
            tracing::debug!(user_id = %user_id, from = ?state.flow(), to = ?result.new_state.flow(), "Flow changed");
        }
        *state = result.new_state;
        reply.unwrap_or_else(views::main_menu)
    }

    fn storage_failed(&self, user_id: &str, state: &ConvState, error: &StoreError) -> Reply {
        tracing::warn!(user_id = %user_id, error = %error, retryable = error.is_retryable(), "Store call failed");
        views::storage_unavailable(state)
    }

    async fn session(&self, user_id: &str) -> Session {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions.entry(user_id.to_string()).or_default().clone()
    }

    /// Drop the session once it is idle and nobody else is waiting on it.
    ///
    /// Clones are only handed out under the map lock, so with the write lock
    /// held the strong count cannot grow: map + ours == 2 means no waiter.
    async fn release_if_idle(&self, user_id: &str, session: Session) {
        let mut sessions = self.sessions.write().await;
        let idle = Arc::strong_count(&session) == 2
            && session.try_lock().map(|s| s.is_idle()).unwrap_or(false);
        // Our clone must be gone before the map lock is released
        drop(session);
        if idle {
            sessions.remove(user_id);
        }
    }

    #[cfg(test)]
    async fn state_of(&self, user_id: &str) -> ConvState {
        match self.sessions.read().await.get(user_id) {
            Some(session) => session.lock().await.clone(),
            None => ConvState::Idle,
        }
    }
}

fn reset(state: &mut ConvState, user_id: &str) {
    if let Some(flow) = state.flow() {
        tracing::info!(user_id = %user_id, flow = %flow, "Abandoning flow");
    }
    *state = ConvState::Idle;
}

/// "/Start@FitBot " -> "start"
fn normalize_command(command: &str) -> String {
    let command = command.trim().trim_start_matches('/');
    let command = command.split('@').next().unwrap_or(command);
    command.to_lowercase()
}
