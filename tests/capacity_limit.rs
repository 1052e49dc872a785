mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use channelqueue::ChannelQueue;
use common::BLOCK_WINDOW;
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn cap_and_len() {
    common::init_logging();
    assert_eq!(ChannelQueue::<i32>::new(-1).cap(), -1);

    let q = ChannelQueue::new(3);
    assert_eq!(q.cap(), 3);
    assert_eq!(q.len().await, 0);
    for i in 0..3 {
        assert_eq!(q.len().await, i as usize);
        q.ingress().send(i).await;
    }
    assert_eq!(q.len().await, 3);

    let ingress = q.ingress().clone();
    let done = Arc::new(AtomicBool::new(false));
    let done_clone = done.clone();
    let fourth = tokio::spawn(async move {
        ingress.send(3).await;
        done_clone.store(true, Ordering::SeqCst);
    });

    sleep(BLOCK_WINDOW).await;
    assert!(!done.load(Ordering::SeqCst), "fourth write should block");

    assert_eq!(q.egress().recv().await, Some(0));
    fourth.await.unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(q.len().await, 3);
}

#[tokio::test]
async fn full_queue_times_out_writer() {
    let q = ChannelQueue::new(32);
    for _ in 0..q.cap() {
        q.ingress().send(()).await;
    }
    let res = timeout(BLOCK_WINDOW, q.ingress().send(())).await;
    assert!(res.is_err(), "expected timeout on full queue");

    // The abandoned write never made it in.
    assert_eq!(q.len().await, 32);
    q.close();
    let mut drained = 0;
    while q.egress().recv().await.is_some() {
        drained += 1;
    }
    assert_eq!(drained, 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn len_never_exceeds_capacity() {
    const CAP: usize = 4;
    let q = Arc::new(ChannelQueue::new(CAP as isize));

    let ingress = q.ingress().clone();
    let writer = tokio::spawn(async move {
        for i in 0..200u32 {
            ingress.send(i).await;
        }
        ingress.close();
    });

    let mut next = 0u32;
    loop {
        assert!(q.len().await <= CAP);
        match q.egress().recv().await {
            Some(i) => {
                assert_eq!(i, next);
                next += 1;
            }
            None => break,
        }
        if next % 16 == 0 {
            sleep(Duration::from_millis(1)).await;
        }
    }
    assert_eq!(next, 200);
    writer.await.unwrap();
}

#[tokio::test]
async fn unbounded_never_blocks_writer() {
    let q = ChannelQueue::new(0);
    let res = timeout(Duration::from_secs(5), async {
        for i in 0..10_000u32 {
            q.ingress().send(i).await;
        }
    })
    .await;
    assert!(res.is_ok());
    assert_eq!(q.len().await, 10_000);
    q.shutdown().await;
}
