use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use toolbox_runtime::ContainerEngine;

pub fn run<E: ContainerEngine>(engine: &E, json: bool) -> Result<u8, String> {
    let containers = engine.list_containers().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&containers)?);
    } else if containers.is_empty() {
        println!("no toolbox containers found");
    } else {
        println!("{:<24} {:<10} IMAGE", "CONTAINER NAME", "STATUS");
        for c in &containers {
            println!(
                "{:<24} {:<10} {}",
                c.name,
                colorize_status(&c.status),
                c.image
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
