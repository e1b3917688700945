//! `appforge tools`: list the tools offered to the model.

use appforge_core::provider::ToolDefinition;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = appforge_config::AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut definitions = appforge_tools::default_registry().definitions();
    if config.agent.advertise_run_command {
        definitions.push(appforge_tools::run_command_definition());
    }

    println!("Agent tools");
    println!("===========");
    println!();
    for def in &definitions {
        println!("{}", describe(def));
    }

    Ok(())
}

fn describe(def: &ToolDefinition) -> String {
    let required = def.required_parameters();
    let args = if required.is_empty() {
        String::new()
    } else {
        format!("({})", required.join(", "))
    };
    format!("  {}{args}\n      {}", def.name, def.description)
}
