use dashboard::export::save_chart;
use dashboard::graph::ChartType;
use dashboard::normalizer::normalize_text;
use std::env;
use std::fs;
use std::path::Path;

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} normalize <file>", program);
    eprintln!("  {} chart <file> <line|bar> <out.svg|out.png>", program);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("dashboard-cli");

    match args.get(1).map(String::as_str) {
        Some("normalize") if args.len() == 3 => {
            let records = normalize_text(&fs::read_to_string(&args[2])?);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Some("chart") if args.len() == 5 => {
            let records = normalize_text(&fs::read_to_string(&args[2])?);
            let chart_type: ChartType = args[3].parse()?;
            save_chart(Path::new(&args[4]), &records, chart_type)?;
            println!(
                "Wrote {} chart of {} records to {}",
                chart_type,
                records.len(),
                args[4]
            );
        }
        _ => usage(program),
    }

    Ok(())
}
