use std::process;

use matrix_mul::{Config, Coordinator, Matrix, Mode, Outcome, Shape, USAGE, Worker, run_local};
use mesh::GrpcTransport;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    match config.mode.clone() {
        Mode::Local { participants } => {
            let (a, b) = operands(&config);
            println!("Running {} participants in-process", participants);
            let run = run_local(&a, &b, participants).await;
            for (rank, served) in (1..).zip(&run.workers) {
                if let Err(e) = served {
                    eprintln!("Worker {} failed: {}", rank, e);
                }
            }
            report(&a, &b, &run.outcome?);
        }
        Mode::Node { rank, peers } => {
            let transport = GrpcTransport::bind(rank, peers, config.delivery.clone()).await?;
            if rank == matrix_mul::COORDINATOR {
                let (a, b) = operands(&config);
                let coordinator = Coordinator::new(transport);
                let outcome = coordinator.run(&a, &b).await?;
                report(&a, &b, &outcome);
            } else {
                println!("Worker {} (PID: {}) waiting for work...", rank, process::id());
                let part = Worker::new(transport, config.shape).serve().await?;
                println!("Worker {} done with rows [{}, {})", rank, part.lower, part.upper);
            }
        }
    }

    Ok(())
}

fn operands(config: &Config) -> (Matrix, Matrix) {
    let Shape {
        a_rows,
        a_cols,
        b_cols,
    } = config.shape;
    if config.random {
        let mut rng = rand::thread_rng();
        (
            Matrix::random(a_rows, a_cols, &mut rng),
            Matrix::random(a_cols, b_cols, &mut rng),
        )
    } else {
        (Matrix::index_sum(a_rows, a_cols), Matrix::index_sum(a_cols, b_cols))
    }
}

fn report(a: &Matrix, b: &Matrix, outcome: &Outcome) {
    println!("\nTime taken: {:?}\n", outcome.elapsed);
    println!("Matrix A ({}x{}):\n{}", a.rows(), a.cols(), a);
    println!("Matrix B ({}x{}):\n{}", b.rows(), b.cols(), b);
    println!(
        "Result ({}x{}):\n{}",
        outcome.result.rows(),
        outcome.result.cols(),
        outcome.result
    );
}
