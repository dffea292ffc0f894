//! Cross-thread delivery through the dispatch queue into signals.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_structure_core::{
    DeliveryMode, DispatchError, DispatchQueue, PerfSpan, Signal, ThreadAffinity,
};
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_producers_are_serialized_on_owner() {
    init_tracing();
    let queue = DispatchQueue::<(usize, usize)>::new(DeliveryMode::Queued);
    let affinity = ThreadAffinity::current();

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let sender = queue.sender();
            std::thread::spawn(move || {
                for seq in 0..25 {
                    sender.send((producer, seq)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(queue.pending_count(), 100);

    let delivered = Signal::<(usize, usize)>::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _guard = delivered.connect_scoped(move |&(producer, seq)| {
        affinity.assert_same_thread();
        sink.lock().push((producer, seq));
    });

    {
        let _perf = PerfSpan::new("drain");
        while let Some(item) = queue.try_next() {
            delivered.emit(item);
        }
    }

    let seen = seen.lock();
    assert_eq!(seen.len(), 100);
    // Each producer's items keep their submission order.
    for producer in 0..4 {
        let seqs: Vec<usize> = seen
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(seqs, (0..25).collect::<Vec<_>>());
    }
}

#[test]
fn test_blocked_signal_drops_deliveries() {
    init_tracing();
    let queue = DispatchQueue::<u32>::new(DeliveryMode::Synchronous);
    let signal = Signal::<u32>::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    signal.connect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    queue.post(1);
    queue.post(2);
    let previous = signal.set_blocked(true);
    for item in queue.drain() {
        signal.emit(item);
    }
    signal.set_blocked(previous);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    queue.post(3);
    for item in queue.drain() {
        signal.emit(item);
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sender_outliving_queue() {
    init_tracing();
    let sender = DispatchQueue::<u32>::new(DeliveryMode::Queued).sender();
    assert!(matches!(sender.send(1), Err(DispatchError::QueueClosed)));
}
