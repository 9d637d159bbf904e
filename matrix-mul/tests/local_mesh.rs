use matrix_mul::{
    ConfigError, Coordinator, Error, Matrix, Partition, RESULT_DATA, RESULT_LOWER, RESULT_UPPER,
    Shape, WORK_DATA, WORK_LOWER, WORK_UPPER, Worker, run_local,
};
use mesh::{LocalTransport, Transport};
use rand::SeedableRng;
use rand::rngs::StdRng;

async fn assert_matches_golden(a: &Matrix, b: &Matrix, participants: usize) {
    let golden = a.multiply(b).unwrap();
    let run = run_local(a, b, participants).await;

    let outcome = run.outcome.unwrap();
    assert_eq!(outcome.result, golden, "{} participants", participants);
    assert_eq!(run.workers.len(), participants - 1);
    for served in run.workers {
        served.unwrap();
    }
}

#[tokio::test]
async fn rectangular_reference_case_matches_golden_model() {
    let a = Matrix::index_sum(5, 32);
    let b = Matrix::index_sum(32, 5);
    for participants in 2..=6 {
        assert_matches_golden(&a, &b, participants).await;
    }
}

#[tokio::test]
async fn square_case_matches_golden_model() {
    let a = Matrix::from_rows(vec![
        vec![1, 2, 3, 4],
        vec![5, 6, 7, 8],
        vec![9, 10, 11, 12],
        vec![13, 14, 15, 16],
    ])
    .unwrap();
    let b = Matrix::from_rows(vec![
        vec![2, 0, 0, 1],
        vec![0, 2, 1, 0],
        vec![1, 0, 2, 0],
        vec![0, 1, 0, 2],
    ])
    .unwrap();
    for participants in 2..=5 {
        assert_matches_golden(&a, &b, participants).await;
    }
}

#[tokio::test]
async fn random_operands_match_golden_model() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = Matrix::random(17, 9, &mut rng);
    let b = Matrix::random(9, 11, &mut rng);
    assert_matches_golden(&a, &b, 5).await;
}

#[tokio::test]
async fn single_worker_takes_the_whole_row_range() {
    let a = Matrix::index_sum(5, 32);
    let b = Matrix::index_sum(32, 5);
    let run = run_local(&a, &b, 2).await;

    assert_eq!(run.outcome.unwrap().result, a.multiply(&b).unwrap());
    assert_eq!(run.workers.len(), 1);
    assert_eq!(run.workers[0].as_ref().unwrap(), &Partition::new(0, 5));
}

#[tokio::test]
async fn workers_cover_the_expected_partitions() {
    let a = Matrix::index_sum(5, 3);
    let b = Matrix::index_sum(3, 2);
    let run = run_local(&a, &b, 5).await;

    run.outcome.unwrap();
    let served: Vec<Partition> = run.workers.into_iter().map(Result::unwrap).collect();
    assert_eq!(
        served,
        vec![
            Partition::new(0, 1),
            Partition::new(1, 2),
            Partition::new(2, 3),
            Partition::new(3, 5),
        ]
    );
}

#[tokio::test]
async fn single_participant_is_a_configuration_error() {
    let a = Matrix::index_sum(4, 4);
    let run = run_local(&a, &a, 1).await;

    assert!(matches!(
        run.outcome,
        Err(Error::Configuration(ConfigError::TooFewParticipants(1)))
    ));
    assert!(run.workers.is_empty());
}

#[tokio::test]
async fn more_workers_than_rows_aborts_every_worker() {
    let a = Matrix::index_sum(2, 3);
    let b = Matrix::index_sum(3, 3);
    let run = run_local(&a, &b, 4).await;

    assert!(matches!(
        run.outcome,
        Err(Error::Configuration(ConfigError::MoreWorkersThanRows { rows: 2, workers: 3 }))
    ));
    assert_eq!(run.workers.len(), 3);
    for served in run.workers {
        assert!(served.unwrap_err().is_abort());
    }
}

#[tokio::test]
async fn mismatched_operands_are_rejected_before_dispatch() {
    let a = Matrix::index_sum(4, 3);
    let b = Matrix::index_sum(4, 3);
    let run = run_local(&a, &b, 3).await;

    assert!(matches!(
        run.outcome,
        Err(Error::Configuration(ConfigError::DimensionMismatch(4, 3, 4, 3)))
    ));
    assert!(run.workers.iter().all(|served| matches!(served, Err(e) if e.is_abort())));
}

#[tokio::test]
async fn worker_rejects_rows_that_do_not_match_its_bounds() {
    let mut ranks = LocalTransport::mesh(2);
    let worker = Worker::new(ranks.pop().unwrap(), Shape::new(4, 3, 2));
    let root = ranks.pop().unwrap();

    let serving = tokio::spawn(async move { worker.serve().await });

    // Two rows announced, one row of data sent.
    let handles = vec![
        root.send(1, WORK_LOWER, vec![0]),
        root.send(1, WORK_UPPER, vec![2]),
        root.send(1, WORK_DATA, vec![1, 2, 3]),
    ];
    mesh::wait_all(handles).await.unwrap();

    let served = serving.await.unwrap();
    assert!(matches!(served, Err(Error::ProtocolViolation { rank: 0, .. })));

    // The worker told the coordinator to give up.
    assert!(matches!(
        root.recv(1, RESULT_LOWER).await,
        Err(mesh::Error::Aborted { rank: 1 })
    ));
}

#[tokio::test]
async fn coordinator_rejects_a_worker_returning_foreign_rows() {
    let mut ranks = LocalTransport::mesh(2);
    let rogue = ranks.pop().unwrap();
    let coordinator = Coordinator::new(ranks.pop().unwrap());

    let a = Matrix::index_sum(3, 2);
    let b = Matrix::index_sum(2, 2);
    let rogue_task = tokio::spawn(async move {
        for tag in [WORK_LOWER, WORK_UPPER, WORK_DATA] {
            rogue.recv(0, tag).await?;
        }
        rogue.broadcast(0, Vec::new()).await?;
        let handles = vec![
            rogue.send(0, RESULT_LOWER, vec![1]),
            rogue.send(0, RESULT_UPPER, vec![3]),
            rogue.send(0, RESULT_DATA, vec![0; 4]),
        ];
        mesh::wait_all(handles).await?;
        // Expect the coordinator's abort once it has seen the bad bounds.
        rogue.recv(0, WORK_LOWER).await
    });

    let outcome = coordinator.run(&a, &b).await;
    assert!(matches!(outcome, Err(Error::ProtocolViolation { rank: 1, .. })));
    assert!(matches!(
        rogue_task.await.unwrap(),
        Err(mesh::Error::Aborted { rank: 0 })
    ));
}

#[tokio::test]
async fn coordinator_rejects_a_worker_returning_short_rows() {
    let mut ranks = LocalTransport::mesh(2);
    let rogue = ranks.pop().unwrap();
    let coordinator = Coordinator::new(ranks.pop().unwrap());

    let a = Matrix::index_sum(3, 2);
    let b = Matrix::index_sum(2, 2);
    let rogue_task = tokio::spawn(async move {
        for tag in [WORK_LOWER, WORK_UPPER, WORK_DATA] {
            rogue.recv(0, tag).await?;
        }
        rogue.broadcast(0, Vec::new()).await?;
        // Correct bounds, but one value short of 3 rows x 2 columns.
        let handles = vec![
            rogue.send(0, RESULT_LOWER, vec![0]),
            rogue.send(0, RESULT_UPPER, vec![3]),
            rogue.send(0, RESULT_DATA, vec![0; 5]),
        ];
        mesh::wait_all(handles).await?;
        rogue.recv(0, WORK_LOWER).await
    });

    let outcome = coordinator.run(&a, &b).await;
    assert!(matches!(outcome, Err(Error::ProtocolViolation { rank: 1, .. })));
    assert!(matches!(
        rogue_task.await.unwrap(),
        Err(mesh::Error::Aborted { rank: 0 })
    ));
}

#[tokio::test]
async fn overflowing_product_aborts_instead_of_panicking() {
    let half = i64::MAX / 2;
    let a = Matrix::from_rows(vec![vec![half, half]]).unwrap();
    let b = Matrix::from_rows(vec![vec![1], vec![2]]).unwrap();
    assert!(matches!(
        a.multiply(&b),
        Err(Error::Overflow { row: 0, col: 0 })
    ));

    let run = run_local(&a, &b, 2).await;
    assert!(matches!(
        run.workers[0],
        Err(Error::Overflow { row: 0, col: 0 })
    ));
    // The coordinator hears the worker's abort rather than a dropped link.
    assert!(matches!(
        run.outcome,
        Err(Error::Transport(mesh::Error::Aborted { rank: 1 }))
    ));
}

#[tokio::test]
async fn wrong_roles_are_refused_without_aborting_the_mesh() {
    let mut ranks = LocalTransport::mesh(2);
    let one = ranks.pop().unwrap();
    let zero = ranks.pop().unwrap();
    let a = Matrix::index_sum(2, 2);

    let misplaced_coordinator = Coordinator::new(one);
    assert!(matches!(
        misplaced_coordinator.run(&a, &a).await,
        Err(Error::Configuration(ConfigError::NotCoordinator(1)))
    ));
    let misplaced_worker = Worker::new(zero, Shape::new(2, 2, 2));
    assert!(matches!(
        misplaced_worker.serve().await,
        Err(Error::Configuration(ConfigError::NotWorker))
    ));

    // Neither side sent an abort, so ordinary traffic still flows both ways.
    let one = misplaced_coordinator.into_inner();
    let zero = misplaced_worker.into_inner();
    one.send(0, RESULT_LOWER, vec![1]).wait().await.unwrap();
    zero.send(1, WORK_LOWER, vec![0]).wait().await.unwrap();
    assert_eq!(zero.recv(1, RESULT_LOWER).await.unwrap(), vec![1]);
    assert_eq!(one.recv(0, WORK_LOWER).await.unwrap(), vec![0]);
}
