/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Headers over one block may be created and dropped concurrently.

mod common;

use std::{sync::Arc, thread};

use cvmat::{Mat, MatType};

#[test]
fn concurrent_share_and_drop() {
    let counter = Arc::new(common::CountingAllocator::default());
    let m = Mat::new_in(&[64, 64], MatType::F32C1, counter.clone()).unwrap();

    thread::scope(|s| {
        for t in 0..8 {
            let m = &m;
            s.spawn(move || {
                for i in 0..1000 {
                    let view = m.row((t * 7 + i) % 64);
                    let alias = view.share();
                    assert!(alias.refcount().unwrap() >= 3);
                    drop(view);
                    let _ = alias.col(3);
                }
            });
        }
    });

    assert_eq!(m.refcount(), Some(1));
    assert_eq!(counter.live(), 1);
    drop(m);
    assert_eq!(counter.live(), 0);
    assert_eq!(counter.total(), 1);
}

#[test]
fn last_reference_dropped_elsewhere() {
    let counter = Arc::new(common::CountingAllocator::default());
    let m = Mat::filled(&[8, 8], MatType::U8C1, 3.0).unwrap();
    let mut owned = Mat::with_allocator(counter.clone());
    m.copy_to(&mut owned).unwrap();
    assert_eq!(counter.live(), 1);

    let views: Vec<Mat> = (0..8).map(|i| owned.row(i)).collect();
    drop(owned);

    let handles: Vec<_> = views
        .into_iter()
        .map(|view| {
            thread::spawn(move || view.row_slice::<u8>(0).iter().map(|&v| v as u32).sum::<u32>())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 24);
    }
    assert_eq!(counter.live(), 0);
}

#[test]
fn disjoint_rows_written_in_parallel() {
    let mut m = Mat::zeros(&[16, 32], MatType::S32C1).unwrap();
    thread::scope(|s| {
        for (i, line) in m.lines_mut::<i32>().enumerate() {
            s.spawn(move || line.fill(i as i32));
        }
    });
    for i in 0..16 {
        assert!(m.row_slice::<i32>(i).iter().all(|&v| v == i as i32));
    }
}
