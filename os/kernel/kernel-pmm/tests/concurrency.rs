mod common;

use common::{TestPlatform, bind_core, drain, seeded};
use kernel_pmm::{FrameRegistry, PhysicalFrame};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

const CORES: usize = 4;

type Pool = FrameRegistry<TestPlatform, CORES>;

/// Runs `body(core)` on one thread per core, all released together.
fn on_every_core<F>(frames: &Arc<Pool>, body: F)
where
    F: Fn(&Pool, usize) + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let start = Arc::new(Barrier::new(CORES));
    let handles: Vec<_> = (0..CORES)
        .map(|core| {
            let frames = Arc::clone(frames);
            let body = Arc::clone(&body);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                bind_core(core);
                start.wait();
                body(&frames, core);
            })
        })
        .collect();
    for h in handles {
        h.join().expect("core thread panicked");
    }
}

#[test]
fn frames_are_conserved_and_never_issued_twice() {
    const PAGES: usize = 256;
    const ROUNDS: usize = 2_000;

    let frames = Arc::new(seeded::<CORES>(PAGES));
    let outstanding = Arc::new(Mutex::new(HashSet::<PhysicalFrame>::new()));

    let held_by_all = Arc::clone(&outstanding);
    on_every_core(&frames, move |frames, core| {
        let mut mine = Vec::new();
        for round in 0..ROUNDS {
            // Uneven per-core rhythm so lists drain and refill at different times.
            if (round + core) % 3 != 0 {
                if let Some(frame) = frames.allocate() {
                    assert!(
                        held_by_all.lock().unwrap().insert(frame),
                        "{frame} handed out twice"
                    );
                    mine.push(frame);
                }
            } else if let Some(frame) = mine.pop() {
                held_by_all.lock().unwrap().remove(&frame);
                unsafe { frames.deallocate(frame.start_address()) };
            }
        }
        for frame in mine {
            held_by_all.lock().unwrap().remove(&frame);
            unsafe { frames.deallocate(frame.start_address()) };
        }
    });

    assert!(outstanding.lock().unwrap().is_empty());
    assert_eq!(frames.stats().total(), PAGES);

    let all = drain(&frames);
    let distinct: HashSet<_> = all.iter().copied().collect();
    assert_eq!(all.len(), PAGES);
    assert_eq!(distinct.len(), PAGES, "a frame was linked into two lists");
}

/// Fewer frames than cores, and every frame is freed on the next core over,
/// so most lists are empty most of the time and every core keeps stealing
/// from every other core while holding its own lock. With blocking nested
/// acquisition this wedges within a few rounds.
#[test]
fn mutual_stealing_does_not_deadlock() {
    const ROUNDS: usize = 20_000;
    const PAGES: usize = 2;

    let frames = Arc::new(seeded::<CORES>(PAGES));
    let handed_out = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&handed_out);
    on_every_core(&frames, move |frames, core| {
        for _ in 0..ROUNDS {
            if let Some(frame) = frames.allocate() {
                counter.fetch_add(1, Ordering::Relaxed);
                bind_core((core + 1) % CORES);
                unsafe { frames.deallocate(frame.start_address()) };
                bind_core(core);
            }
        }
    });

    assert!(handed_out.load(Ordering::Relaxed) > 0);
    assert_eq!(frames.stats().total(), PAGES);
}

#[test]
fn balance_plus_outstanding_stays_constant() {
    const PAGES: usize = 64;

    let frames = Arc::new(seeded::<CORES>(PAGES));
    let outstanding = Arc::new(AtomicUsize::new(0));
    let phase = Arc::new(Barrier::new(CORES));

    let out = Arc::clone(&outstanding);
    let totals = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&totals);
    on_every_core(&frames, move |frames, core| {
        // Phase 1: each core grabs a share.
        let mine: Vec<_> = (0..PAGES / CORES).filter_map(|_| frames.allocate()).collect();
        out.fetch_add(mine.len(), Ordering::SeqCst);
        phase.wait();

        // Quiescent point: nobody is inside the pool.
        if core == 0 {
            let free = frames.stats().total();
            seen.lock().unwrap().push(free + out.load(Ordering::SeqCst));
        }
        phase.wait();

        // Phase 2: give everything back.
        for frame in mine {
            unsafe { frames.deallocate(frame.start_address()) };
            out.fetch_sub(1, Ordering::SeqCst);
        }
    });

    assert_eq!(totals.lock().unwrap().as_slice(), &[PAGES]);
    assert_eq!(outstanding.load(Ordering::SeqCst), 0);
    assert_eq!(frames.stats().total(), PAGES);
}
