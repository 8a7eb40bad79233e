//! Property-based tests for synchronized and sorted views.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use syncview::buffer::{ObservableDeque, ObservableList};
use syncview::projection::{ViewExt, ViewList};

// =============================================================================
// Test helpers
// =============================================================================

/// A mutation of the source list. Indices are reduced modulo the current
/// length when applied.
#[derive(Clone, Debug)]
enum SourceOp {
    Push(i32),
    Extend(Vec<i32>),
    Insert(usize, i32),
    RemoveAt(usize),
    RemoveRange(usize, usize),
    Set(usize, i32),
    Move(usize, usize),
    Reverse,
    Sort,
    Clear,
}

fn arbitrary_source_op() -> impl Strategy<Value = SourceOp> {
    prop_oneof![
        4 => (-50..50i32).prop_map(SourceOp::Push),
        1 => prop::collection::vec(-50..50i32, 0..5).prop_map(SourceOp::Extend),
        3 => (any::<usize>(), -50..50i32).prop_map(|(i, x)| SourceOp::Insert(i, x)),
        3 => any::<usize>().prop_map(SourceOp::RemoveAt),
        1 => (any::<usize>(), 0..4usize).prop_map(|(i, n)| SourceOp::RemoveRange(i, n)),
        3 => (any::<usize>(), -50..50i32).prop_map(|(i, x)| SourceOp::Set(i, x)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| SourceOp::Move(a, b)),
        1 => Just(SourceOp::Reverse),
        1 => Just(SourceOp::Sort),
        1 => Just(SourceOp::Clear),
    ]
}

fn apply(source: &ObservableList<i32>, op: &SourceOp) {
    let len = source.len();
    match op {
        SourceOp::Push(x) => source.push(*x),
        SourceOp::Extend(xs) => source.extend(xs.iter().copied()),
        SourceOp::Insert(i, x) => source.insert(i % (len + 1), *x).unwrap(),
        SourceOp::RemoveAt(i) if len > 0 => {
            source.remove_at(i % len).unwrap();
        }
        SourceOp::RemoveRange(i, n) if len > 0 => {
            let start = i % len;
            let count = (*n).min(len - start);
            source.remove_range(start, count).unwrap();
        }
        SourceOp::Set(i, x) if len > 0 => {
            source.set(i % len, *x).unwrap();
        }
        SourceOp::Move(a, b) if len > 0 => source.move_item(a % len, b % len).unwrap(),
        SourceOp::Reverse => source.reverse(),
        SourceOp::Sort => source.sort_by(|a, b| a.cmp(b)),
        SourceOp::Clear => source.clear(),
        _ => {}
    }
}

/// Either a source mutation or a change of the view's filter.
#[derive(Clone, Debug)]
enum ViewOp {
    Source(SourceOp),
    AttachFilter(i32),
    ResetFilter,
}

fn arbitrary_view_op() -> impl Strategy<Value = ViewOp> {
    prop_oneof![
        8 => arbitrary_source_op().prop_map(ViewOp::Source),
        1 => (2..5i32).prop_map(ViewOp::AttachFilter),
        1 => Just(ViewOp::ResetFilter),
    ]
}

// =============================================================================
// Synchronized view properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An unfiltered view always equals the source, transformed element-wise
    #[test]
    fn unfiltered_view_replays_the_source(
        initial in prop::collection::vec(-50..50i32, 0..10),
        ops in prop::collection::vec(arbitrary_source_op(), 1..60),
    ) {
        let source = ObservableList::with_data(initial);
        let view = source.create_view(|x| x * 2);

        for op in &ops {
            apply(&source, op);

            let expected: Vec<(i32, i32)> = source.to_vec().into_iter().map(|x| (x, x * 2)).collect();
            prop_assert_eq!(view.snapshot().unwrap(), expected);
            prop_assert_eq!(view.len(), source.len());
        }
    }

    /// The visible count matches the filter and a ViewList fed only with
    /// view events stays equal to the filtered source
    #[test]
    fn visible_count_and_flat_list_follow_the_filter(
        initial in prop::collection::vec(-50..50i32, 0..10),
        ops in prop::collection::vec(arbitrary_view_op(), 1..60),
    ) {
        let source = ObservableList::with_data(initial);
        let view = source.create_view(|x| x.to_string());
        let modulus = Arc::new(Mutex::new(None::<i32>));

        let list = Arc::new(Mutex::new(ViewList::new()));
        let stale = Arc::new(Mutex::new(false));
        list.lock().resync(view.snapshot().unwrap().into_iter().map(|(_, v)| v));
        let (l, s) = (list.clone(), stale.clone());
        let _sub = view.subscribe(move |change| {
            if !l.lock().apply(change) {
                *s.lock() = true;
            }
        });

        for op in &ops {
            match op {
                ViewOp::Source(op) => apply(&source, op),
                ViewOp::AttachFilter(m) => {
                    let m = *m;
                    *modulus.lock() = Some(m);
                    view.attach_filter_fn(move |x, _| x % m == 0);
                }
                ViewOp::ResetFilter => {
                    *modulus.lock() = None;
                    view.reset_filter();
                }
            }

            if std::mem::take(&mut *stale.lock()) {
                list.lock().resync(view.snapshot().unwrap().into_iter().map(|(_, v)| v));
            }

            let m = *modulus.lock();
            let expected: Vec<String> = source
                .to_vec()
                .into_iter()
                .filter(|x| m.map_or(true, |m| x % m == 0))
                .map(|x| x.to_string())
                .collect();
            prop_assert_eq!(view.len(), expected.len());
            prop_assert_eq!(view.unfiltered_len(), source.len());
            let guard = list.lock();
            prop_assert_eq!(guard.as_slice(), expected.as_slice());
        }
    }
}

// =============================================================================
// Sorted view properties
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
struct Item {
    id: u32,
    score: i32,
}

/// Push, remove or rescore; rescoring keeps or renews the identity.
#[derive(Clone, Debug)]
enum SortedOp {
    Push(i32),
    RemoveAt(usize),
    Rescore(usize, i32, bool),
    Move(usize, usize),
}

fn arbitrary_sorted_op() -> impl Strategy<Value = SortedOp> {
    prop_oneof![
        3 => (-10..10i32).prop_map(SortedOp::Push),
        2 => any::<usize>().prop_map(SortedOp::RemoveAt),
        2 => (any::<usize>(), -10..10i32, any::<bool>()).prop_map(|(i, s, keep)| SortedOp::Rescore(i, s, keep)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| SortedOp::Move(a, b)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both sorted variants enumerate in (compare key, identity) order
    #[test]
    fn sorted_views_stay_ordered(
        ops in prop::collection::vec(arbitrary_sorted_op(), 1..60),
    ) {
        let source: ObservableList<Item> = ObservableList::new();
        let by_value = source
            .create_sorted_view(|item| item.id, |item| item.score, |a, b| a.score.cmp(&b.score))
            .unwrap();
        let by_view = source
            .create_sorted_view_by_view(|item| item.id, |item| -item.score, |a: &i32, b: &i32| a.cmp(b))
            .unwrap();
        let mut next_id = 0;

        for op in &ops {
            let len = source.len();
            match op {
                SortedOp::Push(score) => {
                    source.push(Item { id: next_id, score: *score });
                    next_id += 1;
                }
                SortedOp::RemoveAt(i) if len > 0 => {
                    source.remove_at(i % len).unwrap();
                }
                SortedOp::Rescore(i, score, keep) if len > 0 => {
                    let i = i % len;
                    let id = if *keep {
                        source.get(i).unwrap().id
                    } else {
                        next_id += 1;
                        next_id - 1
                    };
                    source.set(i, Item { id, score: *score }).unwrap();
                }
                SortedOp::Move(a, b) if len > 0 => source.move_item(a % len, b % len).unwrap(),
                _ => {}
            }

            let mut expected = source.to_vec();
            expected.sort_by(|a, b| a.score.cmp(&b.score).then(a.id.cmp(&b.id)));
            let sorted: Vec<Item> = by_value.snapshot().unwrap().into_iter().map(|(item, _)| item).collect();
            prop_assert_eq!(&sorted, &expected);

            expected.sort_by(|a, b| (-a.score).cmp(&-b.score).then(a.id.cmp(&b.id)));
            let sorted: Vec<Item> = by_view.snapshot().unwrap().into_iter().map(|(item, _)| item).collect();
            prop_assert_eq!(&sorted, &expected);
        }
    }
}

/// A sorted-view step: a source mutation or a change of the filter.
#[derive(Clone, Debug)]
enum FilteredSortedOp {
    Source(SortedOp),
    AttachFilter(i32),
    ResetFilter,
}

fn arbitrary_filtered_sorted_op() -> impl Strategy<Value = FilteredSortedOp> {
    prop_oneof![
        8 => arbitrary_sorted_op().prop_map(FilteredSortedOp::Source),
        1 => (2..5i32).prop_map(FilteredSortedOp::AttachFilter),
        1 => Just(FilteredSortedOp::ResetFilter),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Events of a filtered sorted view carry visible ranks: a ViewList fed
    /// only with them equals the filtered, sorted source
    #[test]
    fn filtered_sorted_view_reports_visible_ranks(
        ops in prop::collection::vec(arbitrary_filtered_sorted_op(), 1..60),
    ) {
        let source: ObservableList<Item> = ObservableList::new();
        let view = source
            .create_sorted_view(|item| item.id, |item| item.id, |a, b| a.score.cmp(&b.score))
            .unwrap();
        let modulus = Arc::new(Mutex::new(None::<i32>));

        let list = Arc::new(Mutex::new(ViewList::new()));
        let stale = Arc::new(Mutex::new(false));
        let (l, s) = (list.clone(), stale.clone());
        let _sub = view.subscribe(move |change| {
            if !l.lock().apply(change) {
                *s.lock() = true;
            }
        });
        let mut next_id = 0;

        for op in &ops {
            let len = source.len();
            match op {
                FilteredSortedOp::Source(SortedOp::Push(score)) => {
                    source.push(Item { id: next_id, score: *score });
                    next_id += 1;
                }
                FilteredSortedOp::Source(SortedOp::RemoveAt(i)) if len > 0 => {
                    source.remove_at(i % len).unwrap();
                }
                FilteredSortedOp::Source(SortedOp::Rescore(i, score, keep)) if len > 0 => {
                    let i = i % len;
                    let id = if *keep {
                        source.get(i).unwrap().id
                    } else {
                        next_id += 1;
                        next_id - 1
                    };
                    source.set(i, Item { id, score: *score }).unwrap();
                }
                FilteredSortedOp::Source(SortedOp::Move(a, b)) if len > 0 => {
                    source.move_item(a % len, b % len).unwrap()
                }
                FilteredSortedOp::AttachFilter(m) => {
                    let m = *m;
                    *modulus.lock() = Some(m);
                    view.attach_filter_fn(move |item, _| item.score % m == 0);
                }
                FilteredSortedOp::ResetFilter => {
                    *modulus.lock() = None;
                    view.reset_filter();
                }
                _ => {}
            }

            if std::mem::take(&mut *stale.lock()) {
                list.lock().resync(view.snapshot().unwrap().into_iter().map(|(_, id)| id));
            }

            let m = *modulus.lock();
            let mut expected = source.to_vec();
            expected.sort_by(|a, b| a.score.cmp(&b.score).then(a.id.cmp(&b.id)));
            let expected: Vec<u32> = expected
                .into_iter()
                .filter(|item| m.map_or(true, |m| item.score % m == 0))
                .map(|item| item.id)
                .collect();
            prop_assert_eq!(view.len(), expected.len());
            prop_assert_eq!(view.unfiltered_len(), source.len());
            let guard = list.lock();
            prop_assert_eq!(guard.as_slice(), expected.as_slice());
        }
    }
}

// =============================================================================
// Deque-sourced view properties
// =============================================================================

#[derive(Clone, Debug)]
enum DequeOp {
    PushFront(i32),
    PushBack(i32),
    PopFront,
    PopBack,
    Clear,
    AttachFilter(i32),
    ResetFilter,
}

fn arbitrary_deque_op() -> impl Strategy<Value = DequeOp> {
    prop_oneof![
        3 => (-50..50i32).prop_map(DequeOp::PushFront),
        3 => (-50..50i32).prop_map(DequeOp::PushBack),
        2 => Just(DequeOp::PopFront),
        2 => Just(DequeOp::PopBack),
        1 => Just(DequeOp::Clear),
        1 => (2..5i32).prop_map(DequeOp::AttachFilter),
        1 => Just(DequeOp::ResetFilter),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A view over a deque follows pushes and pops at both ends
    #[test]
    fn deque_view_follows_both_ends(
        initial in prop::collection::vec(-50..50i32, 0..10),
        ops in prop::collection::vec(arbitrary_deque_op(), 1..60),
    ) {
        let deque = ObservableDeque::new();
        for x in initial {
            deque.push_back(x);
        }
        let view = deque.create_view(|x| x * 3);
        let modulus = Arc::new(Mutex::new(None::<i32>));

        let list = Arc::new(Mutex::new(ViewList::new()));
        let stale = Arc::new(Mutex::new(false));
        list.lock().resync(view.snapshot().unwrap().into_iter().map(|(_, v)| v));
        let (l, s) = (list.clone(), stale.clone());
        let _sub = view.subscribe(move |change| {
            if !l.lock().apply(change) {
                *s.lock() = true;
            }
        });

        for op in &ops {
            let len = deque.len();
            match op {
                DequeOp::PushFront(x) => deque.push_front(*x),
                DequeOp::PushBack(x) => deque.push_back(*x),
                DequeOp::PopFront if len > 0 => {
                    deque.pop_front().unwrap();
                }
                DequeOp::PopBack if len > 0 => {
                    deque.pop_back().unwrap();
                }
                DequeOp::Clear => deque.clear(),
                DequeOp::AttachFilter(m) => {
                    let m = *m;
                    *modulus.lock() = Some(m);
                    view.attach_filter_fn(move |x, _| x % m == 0);
                }
                DequeOp::ResetFilter => {
                    *modulus.lock() = None;
                    view.reset_filter();
                }
                _ => {}
            }

            if std::mem::take(&mut *stale.lock()) {
                list.lock().resync(view.snapshot().unwrap().into_iter().map(|(_, v)| v));
            }

            let m = *modulus.lock();
            let expected: Vec<(i32, i32)> = deque
                .to_vec()
                .into_iter()
                .filter(|x| m.map_or(true, |m| x % m == 0))
                .map(|x| (x, x * 3))
                .collect();
            let views: Vec<i32> = expected.iter().map(|(_, v)| *v).collect();
            prop_assert_eq!(view.snapshot().unwrap(), expected);
            prop_assert_eq!(view.len(), views.len());
            prop_assert_eq!(view.unfiltered_len(), deque.len());
            let guard = list.lock();
            prop_assert_eq!(guard.as_slice(), views.as_slice());
        }
    }
}
