use dashboard::export::create_example_charts;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Generating example charts...");
    match create_example_charts(Path::new("chart_output")) {
        Ok(charts) => {
            println!("Generated {} example charts:", charts.len());
            for (kind, path) in charts {
                println!("- {}: {}", kind, path.display());
            }
        }
        Err(e) => eprintln!("Failed to generate charts: {}", e),
    }
}
