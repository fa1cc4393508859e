pub mod interactive;
pub mod table;

pub use interactive::{ConsoleNotifier, InteractiveSession};
pub use table::render_table;

use std::fmt;
use std::str::FromStr;

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    AddStudent,
    DisplayTable,
    SearchByRollNumber,
    TrainAndPredict,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::AddStudent,
        MenuChoice::DisplayTable,
        MenuChoice::SearchByRollNumber,
        MenuChoice::TrainAndPredict,
        MenuChoice::Exit,
    ];

    pub fn number(self) -> u8 {
        match self {
            MenuChoice::AddStudent => 1,
            MenuChoice::DisplayTable => 2,
            MenuChoice::SearchByRollNumber => 3,
            MenuChoice::TrainAndPredict => 4,
            MenuChoice::Exit => 5,
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuChoice::AddStudent => "Add Student Data",
            MenuChoice::DisplayTable => "Display Students Table",
            MenuChoice::SearchByRollNumber => "Search Student by Roll Number",
            MenuChoice::TrainAndPredict => "Train Model and Predict Score",
            MenuChoice::Exit => "Exit",
        };
        write!(f, "{}. {}", self.number(), label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChoice(pub String);

impl fmt::Display for InvalidChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid choice '{}'. Please select a valid option.", self.0)
    }
}

impl FromStr for MenuChoice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|choice| trimmed == choice.number().to_string())
            .ok_or_else(|| InvalidChoice(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1", MenuChoice::AddStudent)]
    #[test_case(" 2 ", MenuChoice::DisplayTable)]
    #[test_case("3", MenuChoice::SearchByRollNumber)]
    #[test_case("4", MenuChoice::TrainAndPredict)]
    #[test_case("5", MenuChoice::Exit)]
    fn test_menu_choice_parses(input: &str, expected: MenuChoice) {
        assert_eq!(input.parse::<MenuChoice>(), Ok(expected));
    }

    #[test_case("0")]
    #[test_case("6")]
    #[test_case("exit")]
    #[test_case("")]
    fn test_invalid_menu_choice(input: &str) {
        assert!(input.parse::<MenuChoice>().is_err());
    }

    #[test]
    fn test_menu_labels() {
        assert_eq!(MenuChoice::TrainAndPredict.to_string(), "4. Train Model and Predict Score");
    }
}
