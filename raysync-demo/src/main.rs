mod cli;
mod scene;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--queries") => cli::run_queries(),
        Some("--continuous") | None => {
            let seconds = args
                .get(2)
                .map(|s| s.parse::<f32>())
                .transpose()?
                .unwrap_or(3.0);
            cli::run_continuous(seconds)
        }
        Some(other) => {
            anyhow::bail!("unknown mode `{}` (expected --continuous [seconds] or --queries)", other)
        }
    }
}
