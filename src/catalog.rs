//! Fixed exercise taxonomy and daily challenge catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// Workout category offered in the first step of the workout flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cardio,
    Strength,
    Flexibility,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cardio, Category::Strength, Category::Flexibility];

    pub fn id(self) -> &'static str {
        match self {
            Category::Cardio => "cardio",
            Category::Strength => "strength",
            Category::Flexibility => "flexibility",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Cardio => "Cardio",
            Category::Strength => "Strength",
            Category::Flexibility => "Flexibility",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn exercises(self) -> &'static [&'static str] {
        match self {
            Category::Cardio => &["Running", "Cycling", "Swimming", "Jump Rope"],
            Category::Strength => &["Push-ups", "Pull-ups", "Squats", "Lunges"],
            Category::Flexibility => &["Yoga", "Stretching", "Pilates"],
        }
    }

    /// Resolve a button slug (see [`exercise_slug`]) back to the canonical name
    pub fn exercise_by_slug(self, slug: &str) -> Option<&'static str> {
        self.exercises()
            .iter()
            .copied()
            .find(|name| exercise_slug(name) == slug)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// "Jump Rope" -> "jump_rope"
pub fn exercise_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// A daily challenge offered at random
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub name: &'static str,
    pub description: &'static str,
    pub reward: &'static str,
}

pub const CHALLENGES: [Challenge; 3] = [
    Challenge {
        name: "Plank Challenge",
        description: "Hold a plank for 2 minutes",
        reward: "Core strength boost!",
    },
    Challenge {
        name: "Squat Challenge",
        description: "Do 50 bodyweight squats",
        reward: "Leg day complete!",
    },
    Challenge {
        name: "Hydration Challenge",
        description: "Drink 10 glasses of water",
        reward: "Better hydration!",
    },
];
