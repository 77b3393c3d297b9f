//! The `levelcheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("levelcheck.toml").exists() {
        println!("levelcheck.toml already exists, skipping.");
    } else {
        std::fs::write("levelcheck.toml", SAMPLE_CONFIG)?;
        println!("Created levelcheck.toml");
    }

    std::fs::create_dir_all("plans")?;
    let example_path = std::path::Path::new("plans/example.toml");
    if example_path.exists() {
        println!("plans/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PLAN)?;
        println!("Created plans/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust levelcheck.toml to your calibration");
    println!("  2. Run: levelcheck validate --plan plans/example.toml");
    println!("  3. Run: levelcheck evaluate --plan plans/example.toml --results <results.json>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# levelcheck configuration

# static | dynamic
mode = "static"
# terminate | advance
exhaustion = "terminate"
provisional_below = 0.6
default_pass_percent = 50.0

[calibration]
neutral = 0.5
grade_half_width = 1.0

[weights]
error_weight = 0.7
default_slow_weight = 0.3

[max_attempts]
vertical_operations = 3

[speed_weights]
vertical_operations = 0.35
"#;

const EXAMPLE_PLAN: &str = r#"[plan]
id = "example"
name = "Example Placement"
description = "A short placement test to get started"

[[mini_games]]
game_type = "vertical_operations"

[mini_games.config]
max_number_range = 2
num_operations = 2
operations_allowed = ["addition", "subtraction"]
allow_carry = true

[[mini_games]]
game_type = "compare_numbers"

[mini_games.config]
max_number_range = 2
num_questions = 5

[[mini_games]]
game_type = "identify_place_value"
"#;
