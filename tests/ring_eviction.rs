mod common;

use std::time::Duration;

use channelqueue::{ChannelQueue, Policy};
use tokio::time::timeout;

async fn drain<T: Send + 'static>(q: &ChannelQueue<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(item) = q.egress().recv().await {
        out.push(item);
    }
    out
}

#[tokio::test]
async fn ring_keeps_most_recent_items() {
    common::init_logging();
    let q = ChannelQueue::ring(5);
    assert_eq!(q.policy(), Policy::Ring);

    for c in "hello".chars() {
        q.ingress().send(c).await;
    }
    q.ingress().send('w').await;
    assert_eq!(q.len().await, 5);
    assert_eq!(q.egress().recv().await, Some('e'));

    for c in "abcdefghij".chars() {
        q.ingress().send(c).await;
    }
    q.close();
    let rest: String = drain(&q).await.into_iter().collect();
    assert_eq!(rest, "fghij");
}

#[tokio::test]
async fn overfilled_ring_yields_last_items_in_order() {
    const CAP: usize = 8;
    const EXTRA: usize = 13;
    let q = ChannelQueue::ring(CAP as isize);
    for i in 0..CAP + EXTRA {
        q.ingress().send(i).await;
    }
    q.close();
    assert_eq!(drain(&q).await, (EXTRA..CAP + EXTRA).collect::<Vec<_>>());
}

#[tokio::test]
async fn ring_never_blocks_writer() {
    let q = ChannelQueue::ring(2);
    let res = timeout(Duration::from_secs(5), async {
        for i in 0..1000u32 {
            q.ingress().send(i).await;
        }
    })
    .await;
    assert!(res.is_ok());
    assert!(q.len().await <= 2);
}

#[tokio::test]
async fn ring_of_one_holds_latest() {
    let q = ChannelQueue::ring(1);
    assert_eq!(q.policy(), Policy::RingOfOne);
    assert_eq!(q.cap(), 1);

    for c in "hello".chars() {
        q.ingress().send(c).await;
    }
    assert_eq!(q.len().await, 1);
    assert_eq!(q.egress().recv().await, Some('o'));
    assert_eq!(q.len().await, 0);

    q.ingress().send('w').await;
    q.close();
    assert_eq!(drain(&q).await, vec!['w']);
}

#[tokio::test]
async fn unbounded_ring_is_fifo() {
    let q = ChannelQueue::ring(-3);
    assert_eq!(q.policy(), Policy::Fifo);
    assert_eq!(q.cap(), -1);
    for i in 0..100 {
        q.ingress().send(i).await;
    }
    q.close();
    assert_eq!(drain(&q).await, (0..100).collect::<Vec<_>>());
}
