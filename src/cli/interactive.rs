use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use tracing::error;

use crate::cli::table::render_table;
use crate::cli::MenuChoice;
use crate::config::PredictorConfig;
use crate::core::{LearningStyle, NewStudent, RollNumber, StudentFeatures};
use crate::ml::{
    EarlyWarning, NotificationSink, RiskClassifier, RiskLevel, ScoringPipeline, TracingNotifier,
    FEATURE_NAMES,
};
use crate::storage::RecordStore;

/// Prints the early-warning banner and forwards the event to the log
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, warning: &EarlyWarning) {
        println!(
            "\n{}",
            style("⚠️  Warning: Student at risk of underperforming! ⚠️").bold().red()
        );
        println!(
            "{}\n",
            style("📢 Sending notification to parents and teachers...").yellow()
        );
        TracingNotifier.notify(warning);
    }
}

/// Menu-driven session over one record store
pub struct InteractiveSession {
    store: Box<dyn RecordStore>,
    config: PredictorConfig,
    theme: ColorfulTheme,
}

impl InteractiveSession {
    pub fn new(store: Box<dyn RecordStore>, config: PredictorConfig) -> Self {
        Self {
            store,
            config,
            theme: ColorfulTheme::default(),
        }
    }

    /// Loop until the user picks Exit. Failed operations are reported and
    /// the menu is shown again.
    pub fn run(&mut self) -> Result<()> {
        loop {
            println!("\n{}", style("Options:").bold().cyan());
            for choice in MenuChoice::ALL {
                println!("{}", choice);
            }

            let input: String = Input::with_theme(&self.theme)
                .with_prompt("Select an option (1-5)")
                .allow_empty(true)
                .interact_text()?;

            let choice = match input.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(invalid) => {
                    println!("{}", style(invalid).yellow());
                    continue;
                }
            };

            if choice == MenuChoice::Exit {
                println!("Exiting the program.");
                return Ok(());
            }

            if let Err(e) = self.dispatch(choice) {
                error!(error = %e, operation = %choice, "Operation failed");
                println!("{} {:#}", style("✗").red().bold(), e);
            }
        }
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<()> {
        match choice {
            MenuChoice::AddStudent => self.add_student(),
            MenuChoice::DisplayTable => self.display_table(),
            MenuChoice::SearchByRollNumber => self.search_student(),
            MenuChoice::TrainAndPredict => self.train_and_predict(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn add_student(&mut self) -> Result<()> {
        println!("{}", style("Enter student details:").bold());

        let name: String = Input::with_theme(&self.theme)
            .with_prompt("Name")
            .validate_with(|input: &String| {
                if input.trim().is_empty() {
                    Err("Name cannot be empty")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        let features = self.prompt_features()?;
        let score = self.prompt_f64("Current Exam Score out of 500", 0.0, 500.0)?;

        let student = NewStudent {
            name: name.trim().to_string(),
            features,
            score: Some(score),
        };
        let roll_number = self.store.insert(&student)?;

        println!(
            "{} (Roll Number: {})",
            style("Student data inserted successfully.").green(),
            style(roll_number).cyan()
        );
        Ok(())
    }

    fn display_table(&self) -> Result<()> {
        let records = self.store.fetch_all()?;
        if records.is_empty() {
            println!("No data in 'students' table.");
        } else {
            println!("\n{}", style("Current 'students' Table Data:").bold());
            println!("{}", render_table(&records));
        }
        Ok(())
    }

    fn search_student(&self) -> Result<()> {
        let roll_number: i64 = Input::with_theme(&self.theme)
            .with_prompt("Enter Roll Number to search")
            .interact_text()?;

        match self.store.fetch_by_id(RollNumber(roll_number))? {
            Some(record) => {
                println!("\n{}", style("Student Details:").bold());
                println!("{}", render_table(&[record]));
            }
            None => println!("No student found with Roll Number: {}", roll_number),
        }
        Ok(())
    }

    fn train_and_predict(&self) -> Result<()> {
        let pipeline = ScoringPipeline::new(
            &*self.store,
            self.config.model.clone(),
            RiskClassifier::new(self.config.warning.threshold),
        );

        let report = pipeline.train()?;
        let metrics = &report.metrics;

        println!("{}", style("Model trained successfully.").green().bold());
        println!(
            "Records: {} (train {}, test {})",
            report.record_count, metrics.train_size, metrics.test_size
        );
        println!("Mean Squared Error: {}", metrics.mse);
        match metrics.r_squared {
            Some(r2) => println!("R-squared Score: {}", r2),
            None => println!("R-squared Score: N/A - Not enough data"),
        }
        println!("{}", style("Coefficients:").dim());
        for (name, coef) in FEATURE_NAMES.iter().zip(report.model.coefficients.iter()) {
            println!("  {:<26} {:>12.4}", name, coef);
        }
        println!("  {:<26} {:>12.4}", "intercept", report.model.intercept);

        println!("\nEnter details for a new student to predict their score.");
        let features = self.prompt_features()?;
        let result = pipeline.score(&report.model, &features, &ConsoleNotifier);

        let line = format!("Predicted Score: {:.2}", result.predicted_score);
        match result.risk {
            RiskLevel::Normal => println!("{}", style(line).green().bold()),
            RiskLevel::AtRisk => println!("{}", style(line).red().bold()),
        }
        Ok(())
    }

    fn prompt_features(&self) -> Result<StudentFeatures> {
        let attendance = self.prompt_i64("Attendance (as a percentage)", 0, 100)?;
        let hours_studied = self.prompt_f64("Hours Studied", 0.0, f64::MAX)?;
        let weekly_study_hours = self.prompt_f64("Weekly Study Hours", 0.0, 168.0)?;
        let previous_score = self.prompt_f64("Previous Score out of 500", 0.0, 500.0)?;
        let assignments_completed = self.prompt_i64("Assignments Completed (1-30)", 0, 30)?;
        let stress_level = self.prompt_i64("Stress Level (1-10)", 1, 10)?;

        let styles = LearningStyle::ALL;
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Learning Style")
            .items(&styles)
            .default(0)
            .interact()?;

        let extracurriculars_involved =
            self.prompt_i64("Extracurricular Involvement (number of activities)", 0, i64::MAX)?;
        let goal_score = self.prompt_f64("Goal Score for the term out of 500", 0.0, 500.0)?;

        Ok(StudentFeatures {
            attendance: Some(attendance),
            hours_studied: Some(hours_studied),
            weekly_study_hours: Some(weekly_study_hours),
            previous_score: Some(previous_score),
            assignments_completed: Some(assignments_completed),
            stress_level: Some(stress_level),
            learning_style: Some(styles[selection].to_string()),
            extracurriculars_involved: Some(extracurriculars_involved),
            goal_score: Some(goal_score),
        })
    }

    fn prompt_i64(&self, prompt: &str, min: i64, max: i64) -> Result<i64> {
        let value = Input::<i64>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(move |value: &i64| {
                if (min..=max).contains(value) {
                    Ok(())
                } else {
                    Err(format!("Enter a whole number between {} and {}", min, max))
                }
            })
            .interact_text()?;
        Ok(value)
    }

    fn prompt_f64(&self, prompt: &str, min: f64, max: f64) -> Result<f64> {
        let value = Input::<f64>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(move |value: &f64| {
                if value.is_finite() && *value >= min && *value <= max {
                    Ok(())
                } else if max == f64::MAX {
                    Err(format!("Enter a number of at least {}", min))
                } else {
                    Err(format!("Enter a number between {} and {}", min, max))
                }
            })
            .interact_text()?;
        Ok(value)
    }
}
