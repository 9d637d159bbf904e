use std::time::Duration;

use matrix_mul::{Coordinator, Matrix, Partition, Shape, Worker};
use mesh::{DeliveryPolicy, GrpcTransport, PeerAddr};
use tokio::net::TcpListener;

async fn start_mesh(size: usize) -> Vec<GrpcTransport> {
    let mut listeners = Vec::with_capacity(size);
    let mut peers = Vec::with_capacity(size);
    for _ in 0..size {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        peers.push(PeerAddr::from(listener.local_addr().unwrap().to_string()));
        listeners.push(listener);
    }

    let policy = DeliveryPolicy {
        attempts: 20,
        initial_backoff: Duration::from_millis(20),
        max_backoff: Duration::from_millis(200),
    };
    listeners
        .into_iter()
        .enumerate()
        .map(|(rank, listener)| {
            GrpcTransport::from_listener(rank, listener, peers.clone(), policy.clone()).unwrap()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reference_case_over_grpc() {
    let a = Matrix::index_sum(5, 32);
    let b = Matrix::index_sum(32, 5);
    let shape = Shape::of(&a, &b).unwrap();

    let mut endpoints = start_mesh(4).await.into_iter();
    let root = endpoints.next().unwrap();
    let workers: Vec<_> = endpoints
        .map(|endpoint| tokio::spawn(async move { Worker::new(endpoint, shape).serve().await }))
        .collect();

    // The coordinator keeps serving acks until every worker is through.
    let coordinator = Coordinator::new(root);
    let outcome = coordinator.run(&a, &b).await.unwrap();
    assert_eq!(outcome.result, a.multiply(&b).unwrap());

    let mut served = Vec::new();
    for worker in workers {
        served.push(worker.await.unwrap().unwrap());
    }
    drop(coordinator);
    assert_eq!(
        served,
        vec![Partition::new(0, 1), Partition::new(1, 2), Partition::new(2, 5)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_square_case_over_grpc() {
    let a = Matrix::index_sum(4, 4);
    let b = Matrix::from_fn(4, 4, |i, j| if i == j { 2 } else { 0 });
    let shape = Shape::of(&a, &b).unwrap();

    let mut endpoints = start_mesh(2).await.into_iter();
    let root = endpoints.next().unwrap();
    let worker = endpoints.next().unwrap();
    let serving = tokio::spawn(async move { Worker::new(worker, shape).serve().await });

    let coordinator = Coordinator::new(root);
    let outcome = coordinator.run(&a, &b).await.unwrap();
    assert_eq!(outcome.result, Matrix::from_fn(4, 4, |i, j| 2 * (i + j) as i64));
    assert_eq!(serving.await.unwrap().unwrap(), Partition::new(0, 4));
    drop(coordinator);
}
