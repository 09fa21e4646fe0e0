use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;
use rstest::rstest;
use trunner_core::{ParkingLock, RawLock, SpinLock, Step, WorkItem, WorkQueue};

const PRODUCERS: usize = 8;
const ITEMS_PER_PRODUCER: usize = 250;

/// Payload: which producer submitted the item, its index and how many passes it needs.
struct Job {
    producer: usize,
    index: usize,
    passes_left: u32,
}

fn run_producers_and_driver<L>(lock: L) -> (Vec<(usize, usize)>, u64)
where
    L: RawLock + Send + Sync + 'static,
{
    let queue = Arc::new(WorkQueue::new(lock));
    let completions = Arc::new(Mutex::new(Vec::new()));
    let producing = Arc::new(AtomicBool::new(true));

    // One driver runs concurrently with the producers.
    let driver = {
        let queue = Arc::clone(&queue);
        let producing = Arc::clone(&producing);
        thread::spawn(move || {
            while producing.load(Ordering::Acquire) {
                queue.drive_once();
                thread::yield_now();
            }
        })
    };

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            let completions = Arc::clone(&completions);
            thread::spawn(move || {
                for index in 0..ITEMS_PER_PRODUCER {
                    let job = Job {
                        producer,
                        index,
                        passes_left: (index % 3) as u32 + 1,
                    };
                    let done = Arc::clone(&completions);
                    let item = WorkItem::new(job, |job| {
                        job.passes_left -= 1;
                        if job.passes_left == 0 { Step::Done } else { Step::Pending }
                    })
                    .on_complete(move |job| done.lock().push((job.producer, job.index)));
                    queue.submit(item).unwrap();
                }
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    producing.store(false, Ordering::Release);
    driver.join().unwrap();

    while queue.drive_once() {}

    let stats = queue.stats();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.submitted, (PRODUCERS * ITEMS_PER_PRODUCER) as u64);

    let queue = Arc::into_inner(queue).expect("all threads joined");
    assert_eq!(queue.teardown(), 0);

    let completions = completions.lock().clone();
    (completions, stats.completed)
}

#[rstest]
#[case::parking(0)]
#[case::spin(1)]
fn concurrent_submits_complete_exactly_once(#[case] lock_kind: u8) {
    let (completions, completed) = match lock_kind {
        0 => run_producers_and_driver(ParkingLock::new()),
        _ => run_producers_and_driver(SpinLock::new()),
    };

    let total = PRODUCERS * ITEMS_PER_PRODUCER;
    assert_eq!(completions.len(), total);
    assert_eq!(completed, total as u64);

    let unique: HashSet<_> = completions.iter().copied().collect();
    assert_eq!(unique.len(), total, "duplicate completion callbacks");
    for producer in 0..PRODUCERS {
        for index in 0..ITEMS_PER_PRODUCER {
            assert!(unique.contains(&(producer, index)), "missing {producer}/{index}");
        }
    }
}

#[test]
fn per_producer_order_is_preserved_within_a_pass() {
    let queue = Arc::new(WorkQueue::new(ParkingLock::new()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for index in 0..100usize {
                    let seen = Arc::clone(&seen);
                    queue
                        .submit(WorkItem::new((producer, index), move |key| {
                            seen.lock().push(*key);
                            Step::Done
                        }))
                        .unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    assert!(queue.drive_once());
    assert!(queue.is_empty());

    let seen = seen.lock();
    for producer in 0..4 {
        let indices: Vec<usize> = seen
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, i)| *i)
            .collect();
        assert_eq!(indices, (0..100).collect::<Vec<_>>());
    }
}
