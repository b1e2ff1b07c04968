extern crate membership_collections;
extern crate rand;

use membership_collections::skiplist::SkipList;
use rand::{Rng, SeedableRng, XorShiftRng};
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn int_test_single_thread_scenario() {
    let list = SkipList::new(100);

    assert!(list.insert("m"));
    assert!(list.insert("a"));
    assert!(list.insert("z"));
    assert!(!list.insert("m"));

    assert_eq!(list.range(&"b", &"y"), vec!["m"]);

    assert!(list.remove(&"m"));
    assert!(!list.contains(&"m"));
    assert_eq!(list.range(&"a", &"z"), vec!["a", "z"]);
}

#[test]
fn int_test_randomized_against_model() {
    let mut rng: XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);
    let list = SkipList::new(10_000);
    let mut expected = Vec::new();

    for _ in 0..10_000 {
        let key = rng.gen::<u32>();

        assert_eq!(list.insert(key), !expected.contains(&key));
        expected.push(key);
    }

    expected.sort();
    expected.dedup();

    assert_eq!(list.len(), expected.len());
    assert_eq!(list.iter().collect::<Vec<u32>>(), expected);

    for key in &expected {
        assert!(list.contains(key));
    }

    let (to_remove, to_keep) = expected.split_at(expected.len() / 2);
    for key in to_remove {
        assert!(list.remove(key));
        assert!(!list.remove(key));
    }

    assert_eq!(list.len(), to_keep.len());
    assert_eq!(list.iter().collect::<Vec<u32>>(), to_keep.to_vec());

    for key in to_remove {
        assert!(!list.contains(key));
    }
    for key in to_keep {
        assert!(list.contains(key));
    }
}

#[test]
fn int_test_level_zero_is_sorted() {
    let mut rng: XorShiftRng = SeedableRng::from_seed([2, 2, 2, 2]);
    let list = SkipList::new(1000);

    for _ in 0..1000 {
        list.insert(rng.gen::<u16>());
    }

    let keys = list.iter().collect::<Vec<u16>>();
    for window in keys.windows(2) {
        assert!(window[0] < window[1]);
    }
}

#[test]
fn int_test_add_remove_round_trip() {
    let list = SkipList::new(100);

    assert!(list.insert(String::from("key")));
    assert!(list.remove(&String::from("key")));
    assert!(!list.contains(&String::from("key")));
    assert!(list.is_empty());
}

#[test]
fn int_test_concurrent_duplicate_inserts() {
    let list = Arc::new(SkipList::new(1000));
    let keys: Arc<Vec<String>> = Arc::new((0..100).map(|index| format!("key{:03}", index)).collect());
    let mut handles = vec![];

    for _ in 0..8 {
        let list = Arc::clone(&list);
        let keys = Arc::clone(&keys);
        handles.push(thread::spawn(move || {
            keys.iter().filter(|key| list.insert((*key).clone())).count()
        }));
    }

    let winners: usize = handles.into_iter().map(|handle| handle.join().unwrap()).sum();

    // exactly one insertion of each key may report success
    assert_eq!(winners, 100);
    assert_eq!(list.len(), 100);
    for key in keys.iter() {
        assert!(list.contains(key));
    }
}

#[test]
fn int_test_concurrent_mixed_operations() {
    let list = Arc::new(SkipList::new(1000));
    let keys: Arc<Vec<String>> = Arc::new((0..1000).map(|index| format!("key{:04}", index)).collect());
    let balances: Arc<Vec<AtomicIsize>> =
        Arc::new((0..1000).map(|_| AtomicIsize::new(0)).collect());
    let mut handles = vec![];

    for thread_id in 0..8u32 {
        let list = Arc::clone(&list);
        let keys = Arc::clone(&keys);
        let balances = Arc::clone(&balances);
        handles.push(thread::spawn(move || {
            let mut rng: XorShiftRng =
                SeedableRng::from_seed([thread_id + 1, 17, 23, 31]);
            for _ in 0..10_000 {
                let index = rng.gen_range(0, keys.len());
                match rng.gen_range(0, 4) {
                    0 | 1 => {
                        if list.insert(keys[index].clone()) {
                            balances[index].fetch_add(1, Ordering::SeqCst);
                        }
                    },
                    2 => {
                        if list.remove(&keys[index]) {
                            balances[index].fetch_sub(1, Ordering::SeqCst);
                        }
                    },
                    _ => {
                        list.contains(&keys[index]);
                    },
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // successful insertions and removals of a key alternate under any
    // linearization, so each balance is zero or one and matches the final
    // membership
    let mut expected = Vec::new();
    for (index, balance) in balances.iter().enumerate() {
        let balance = balance.load(Ordering::SeqCst);
        assert!(balance == 0 || balance == 1);
        assert_eq!(list.contains(&keys[index]), balance == 1);
        if balance == 1 {
            expected.push(keys[index].clone());
        }
    }

    assert_eq!(list.len(), expected.len());
    assert_eq!(list.iter().collect::<Vec<String>>(), expected);
}

#[test]
fn int_test_range_under_concurrent_inserts() {
    let list = Arc::new(SkipList::new(10_000));

    for index in 0..1000 {
        list.insert(index * 2);
    }

    let writer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            for index in 0..1000 {
                list.insert(index * 2 + 1);
            }
        })
    };

    // keys present for the whole scan are always reported
    for _ in 0..100 {
        let keys = list.range(&0, &1998);
        assert!(keys.len() >= 1000);
        for window in keys.windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    writer.join().unwrap();
    assert_eq!(list.range(&0, &1998).len(), 1999);
}
