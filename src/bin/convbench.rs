//! Benchmark runner: one cross-backend parity run over the canonical
//! 1024x1024 image / 19x19 all-ones filter configuration.

use convr::harness::{self, BenchConfig, RunStatus};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = BenchConfig::default();
    println!(
        "convolving {}x{} image against {}x{} filter",
        cfg.image_h, cfg.image_w, cfg.filter_h, cfg.filter_w
    );

    match harness::run(&cfg) {
        Ok(report) => {
            for run in &report.runs {
                let status = match run.status {
                    RunStatus::Reference => "reference",
                    RunStatus::Verified => "ok",
                    RunStatus::Skipped => "skipped",
                };
                println!(
                    "{:<16} {:>12} us  [{}]",
                    run.backend.name(),
                    run.elapsed.as_micros(),
                    status
                );
            }
            println!("{} result cells compared per backend", report.out_cells);
        }
        Err(e) => {
            eprintln!("parity run failed: {e}");
            std::process::exit(1);
        }
    }
}
