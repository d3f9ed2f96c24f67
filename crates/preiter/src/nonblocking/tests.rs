use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::blocking;
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::loader::{BoxLoader, Expand, Loader, LoaderFactory};
use crate::node::Node;
use crate::sizeable::Sizeable;
use crate::step::Step;

fn leaf<T>(value: T) -> Mixed<T> {
    Node::Leaf(value)
}

fn nested(items: Vec<Mixed<i32>>) -> Mixed<i32> {
    Node::Nested(Recursable::new(Array::new(items)))
}

fn lazy_nested(items: Vec<Mixed<i32>>) -> Mixed<i32> {
    Node::Nested(Recursable::new(Lazy::from_values(items)))
}

fn fifteen() -> Vec<Mixed<i32>> {
    vec![
        leaf(1),
        leaf(2),
        nested(vec![leaf(3), leaf(4)]),
        leaf(5),
        lazy_nested(vec![leaf(6), leaf(7)]),
        nested(vec![leaf(8), leaf(9)]),
        leaf(10),
        nested(vec![
            lazy_nested(vec![leaf(11), leaf(12)]),
            nested(vec![leaf(13), leaf(14), leaf(15)]),
        ]),
    ]
}

async fn drain<T: Send>(cursor: &mut BoxCursor<T>, direction: Direction) -> Vec<T> {
    let mut out = Vec::new();
    while let Step::Value(value) = cursor.get(direction).await.expect("step") {
        out.push(value);
    }
    out
}

async fn expect_n<S: Sequence<Item = i32>>(sequence: &S, n: i32) {
    let mut cursor = sequence.cursor();
    for expected in 1..=n {
        assert_eq!(cursor.next().await.expect("next"), Step::Value(expected));
    }
    for _ in 0..3 {
        assert_eq!(cursor.next().await.expect("next"), Step::Exhausted(Term::EndOfData));
    }
    for expected in (1..=n).rev() {
        assert_eq!(cursor.previous().await.expect("previous"), Step::Value(expected));
    }
    for _ in 0..3 {
        assert_eq!(
            cursor.previous().await.expect("previous"),
            Step::Exhausted(Term::StartOfData)
        );
    }
    cursor.jump(Term::EndOfData).await.expect("jump");
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(n));
    cursor.jump(Term::StartOfData).await.expect("jump");
    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
}

async fn expect_empty<S: Sequence<Item = i32>>(sequence: &S) {
    let mut cursor = sequence.cursor();
    assert_eq!(cursor.next().await.expect("next"), Step::Exhausted(Term::EndOfData));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Exhausted(Term::StartOfData));
}

/// Source yielding `0..len` with a yield point before every element and
/// a shared pull counter.
struct Counting {
    next: usize,
    len: usize,
    pulls: Arc<AtomicUsize>,
}

#[async_trait]
impl Source<usize> for Counting {
    async fn pull(&mut self) -> Result<Option<usize>, BoxError> {
        tokio::task::yield_now().await;
        if self.next == self.len {
            return Ok(None);
        }
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.next += 1;
        Ok(Some(self.next - 1))
    }
}

/// Source failing once at `fail_at`.
struct Flaky<T> {
    items: Vec<T>,
    index: usize,
    fail_at: usize,
    failed: bool,
}

impl<T> Flaky<T> {
    fn new(items: Vec<T>, fail_at: usize) -> Self {
        Self {
            items,
            index: 0,
            fail_at,
            failed: false,
        }
    }
}

#[async_trait]
impl<T: Clone + Send> Source<T> for Flaky<T> {
    async fn pull(&mut self) -> Result<Option<T>, BoxError> {
        if self.index == self.fail_at && !self.failed {
            self.failed = true;
            return Err(io::Error::other("connection reset").into());
        }
        let Some(item) = self.items.get(self.index).cloned() else {
            return Ok(None);
        };
        self.index += 1;
        Ok(Some(item))
    }
}

/// Loader refusing while `failures` is above zero.
struct StubbornLoader {
    failures: Arc<AtomicUsize>,
}

impl<R: Expand> Loader<R> for StubbornLoader {
    fn load(&mut self, recursable: &R) -> Result<R::Recursor, Error> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
        {
            return Err(Error::load(recursable.key(), io::Error::other("not yet")));
        }
        Ok(recursable.recursor())
    }

    fn release(&mut self, _identity: Identity, _recursor: R::Recursor) {}
}

fn stubborn<R: Expand + 'static>(failures: &Arc<AtomicUsize>) -> LoaderFactory<R> {
    let failures = Arc::clone(failures);
    Arc::new(move || -> BoxLoader<R> {
        Box::new(StubbornLoader {
            failures: Arc::clone(&failures),
        })
    })
}

// ============================================================================
// Array, Lazy and sources
// ============================================================================

#[tokio::test]
async fn array_walks_both_ways() {
    expect_n(&Array::new(vec![1, 2, 3, 4]), 4).await;
    expect_empty(&Array::new(Vec::<i32>::new())).await;
}

#[tokio::test]
async fn lazy_from_stream_walks_both_ways() {
    let stream = futures::stream::iter((1..=7).map(Ok::<i32, io::Error>));
    expect_n(&Lazy::from_stream(stream), 7).await;
}

#[tokio::test]
async fn lazy_from_empty_iterator_is_empty() {
    expect_empty(&Lazy::from_values(Vec::<i32>::new())).await;
}

#[tokio::test]
async fn lazy_retry_after_pull_error() {
    let lazy = Lazy::new(Flaky::new(vec![1, 2, 3], 2));
    let mut cursor = lazy.cursor();
    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));

    let error = cursor.next().await.expect_err("third pull fails");
    assert_eq!(error.sequence(), Some(lazy.identity()));
    assert_eq!(lazy.buffered(), 2);

    assert_eq!(cursor.next().await.expect("retry"), Step::Value(3));
    assert_eq!(cursor.next().await.expect("next"), Step::Exhausted(Term::EndOfData));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lazy_growth_is_serialized_across_tasks() {
    let pulls = Arc::new(AtomicUsize::new(0));
    let lazy = Lazy::new(Counting {
        next: 0,
        len: 200,
        pulls: Arc::clone(&pulls),
    });

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let mut cursor = lazy.cursor();
        tasks.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Step::Value(value) = cursor.next().await.expect("next") {
                seen.push(value);
            }
            seen
        }));
    }
    for task in tasks {
        let seen = task.await.expect("join");
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }
    assert_eq!(pulls.load(Ordering::SeqCst), 200);
    assert!(lazy.is_complete());
}

// ============================================================================
// Filter, Transform and Wrapped
// ============================================================================

#[tokio::test]
async fn filter_and_transform_compose() {
    let sequence = Array::new((1..=6).collect::<Vec<_>>())
        .filtered(|value| value % 3 != 0)
        .transformed(|value| value * 10);
    let mut cursor = sequence.cursor();
    assert_eq!(drain(&mut cursor, Direction::Forward).await, vec![10, 20, 40, 50]);
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![50, 40, 20, 10]);
}

#[tokio::test]
async fn async_transform_failure_is_retryable() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&attempts);
    let sequence = Array::new(vec![1, 2, 3]).then(move |value| {
        let first_try = value == 2 && seen.fetch_add(1, Ordering::SeqCst) == 0;
        async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            if first_try {
                Err(io::Error::other("thumbnailer unavailable"))
            } else {
                Ok(format!("#{value}"))
            }
        }
    });
    let mut cursor = sequence.cursor();
    assert_eq!(cursor.next().await.expect("next"), Step::Value("#1".to_owned()));
    assert!(matches!(cursor.next().await, Err(Error::Map { .. })));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value("#2".to_owned()));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value("#1".to_owned()));
}

#[tokio::test]
async fn wrapped_blocking_sequence_behaves_the_same() {
    let root = blocking::HeteroStack::collate(
        vec![
            blocking::Mixed::Leaf(1),
            blocking::Mixed::Nested(blocking::Recursable::new(blocking::Array::new(vec![
                blocking::Mixed::Leaf(2),
                blocking::Mixed::Leaf(3),
            ]))),
        ]
        .into_iter()
        .map(Ok::<_, io::Error>),
    );
    let wrapped = Wrapped::new(blocking::HeteroStack::flatten(root));
    expect_n(&wrapped, 3).await;
}

// ============================================================================
// Stacks
// ============================================================================

#[tokio::test]
async fn hetero_flattens_fifteen() {
    let root = HeteroStack::collate(IterSource(fifteen().into_iter().map(Ok::<_, io::Error>)));
    expect_n(&HeteroStack::flatten(root.clone()), 15).await;
    expect_n(&HeteroStack::flatten_cached(root, 64), 15).await;
}

#[tokio::test]
async fn hetero_size_grows_with_open_levels() {
    let root = Recursable::new(Array::new(vec![leaf(1), lazy_nested(vec![leaf(2), leaf(3)])]));
    let stack = HeteroStack::flatten(root);
    let mut cursor = stack.cursor();
    assert_eq!(cursor.size(), 2);
    cursor.next().await.expect("next");
    cursor.next().await.expect("next");
    assert_eq!(cursor.size(), 3);
    cursor.jump(Term::EndOfData).await.expect("jump");
    assert_eq!(cursor.size(), 2);
}

#[tokio::test]
async fn hetero_nested_pull_error_is_retryable() {
    let failing = Node::Nested(Recursable::new(Lazy::new(Flaky::new(vec![leaf(2), leaf(3)], 1))));
    let root = Recursable::new(Array::new(vec![leaf(1), failing, leaf(4)]));
    let stack = HeteroStack::flatten_cached(root, 16);
    let mut cursor = stack.cursor();
    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert!(matches!(cursor.next().await, Err(Error::Pull { .. })));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(3));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(4));
}

#[tokio::test]
async fn hetero_pull_error_after_leaving_a_level_keeps_it_open() {
    let raw = Flaky::new(vec![nested(vec![leaf(1), leaf(2)]), leaf(9)], 1);
    let stack = HeteroStack::flatten(Recursable::new(Lazy::new(raw)));
    let mut cursor = stack.cursor();

    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert!(matches!(cursor.next().await, Err(Error::Pull { .. })));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(9));
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![2, 1]);
}

#[tokio::test]
async fn hetero_expansion_failure_after_leaving_a_level_keeps_it_open() {
    let failures = Arc::new(AtomicUsize::new(0));
    let root = Recursable::new(Array::new(vec![nested(vec![leaf(1), leaf(2)]), nested(vec![leaf(3)])]));
    let stack = HeteroStack::flatten_with(root, stubborn(&failures));
    let mut cursor = stack.cursor();

    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    failures.store(1, Ordering::SeqCst);
    assert!(matches!(cursor.next().await, Err(Error::Load { .. })));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(3));
}

#[tokio::test]
async fn homo_flattens_fifteen() {
    let leaves = |values: Vec<i32>| Node::Nested(Homo::leaves(Array::new(values)));
    let raw: Vec<HomoMixed<i32>> = vec![
        Node::Leaf(1),
        Node::Leaf(2),
        leaves(vec![3, 4]),
        Node::Leaf(5),
        leaves(vec![6, 7]),
        leaves(vec![8, 9]),
        Node::Leaf(10),
        Node::Nested(HomoStack::collate(IterSource(
            vec![
                Node::Nested(Homo::leaves(Lazy::from_values(vec![11, 12]))),
                Node::Nested(HomoStack::collate(IterSource(
                    vec![Node::Leaf(13), Node::Leaf(14), Node::Leaf(15)]
                        .into_iter()
                        .map(Ok::<_, io::Error>),
                ))),
            ]
            .into_iter()
            .map(Ok::<_, io::Error>),
        ))),
    ];
    let root = HomoStack::collate(IterSource(raw.into_iter().map(Ok::<_, io::Error>)));
    expect_n(&HomoStack::flatten(root.clone()), 15).await;
    expect_n(&HomoStack::flatten_cached(root, 64), 15).await;
}

#[tokio::test]
async fn homogenize_matches_hetero_flattening() {
    let root = Recursable::new(Array::new(fifteen()));
    let homo = HomoStack::homogenize(&root);
    assert_eq!(homo.identity(), root.identity());
    expect_n(&HomoStack::flatten(homo), 15).await;
}

#[tokio::test]
async fn homo_of_empty_levels_is_empty() {
    let raw: Vec<HomoMixed<i32>> = vec![
        Node::Nested(Homo::leaves(Array::new(Vec::new()))),
        Node::Nested(HomoStack::collate(IterSource(std::iter::empty::<Result<HomoMixed<i32>, io::Error>>()))),
    ];
    let root = HomoStack::collate(IterSource(raw.into_iter().map(Ok::<_, io::Error>)));
    expect_empty(&HomoStack::flatten(root)).await;
}

#[tokio::test]
async fn homo_pull_error_after_leaving_levels_keeps_them_open() {
    let inner = Homo::branches(Array::new(vec![Homo::leaves(Array::new(vec![1, 2]))]));
    let raw = Flaky::new(vec![inner, Homo::leaves(Array::new(vec![9]))], 1);
    let stack = HomoStack::flatten(Homo::branches(Lazy::new(raw)));
    let mut cursor = stack.cursor();

    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert!(matches!(cursor.next().await, Err(Error::Pull { .. })));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(9));
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![2, 1]);
}

#[tokio::test]
async fn homo_expansion_failure_leaves_position_unchanged() {
    let failures = Arc::new(AtomicUsize::new(0));
    let root = Homo::branches(Array::new(vec![
        Homo::leaves(Array::new(vec![1, 2])),
        Homo::leaves(Array::new(vec![3])),
    ]));
    let stack = HomoStack::flatten_with(root, stubborn(&failures));
    let mut cursor = stack.cursor();

    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    failures.store(1, Ordering::SeqCst);
    assert!(matches!(cursor.next().await, Err(Error::Load { .. })));
    assert_eq!(cursor.previous().await.expect("previous"), Step::Value(1));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(2));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(3));
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![2, 1]);
}

#[tokio::test]
async fn homo_collated_run_pull_error_is_retryable() {
    let raw: Flaky<HomoMixed<i32>> = Flaky::new(vec![Node::Leaf(1), Node::Leaf(2), Node::Leaf(3)], 1);
    let stack = HomoStack::flatten(HomoStack::collate(raw));
    let mut cursor = stack.cursor();

    assert_eq!(cursor.next().await.expect("next"), Step::Value(1));
    assert!(matches!(cursor.next().await, Err(Error::Pull { .. })));
    assert_eq!(cursor.next().await.expect("retry"), Step::Value(2));
    assert_eq!(cursor.next().await.expect("next"), Step::Value(3));
    assert!(cursor.next().await.expect("next").is_exhausted());
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![3, 2, 1]);
}

#[tokio::test]
async fn homo_collator_drain_failure_is_retryable() {
    let raw: Flaky<HomoMixed<i32>> = Flaky::new(
        vec![Node::Leaf(1), Node::Leaf(2), Node::Nested(Homo::leaves(Array::new(vec![9])))],
        1,
    );
    let stack = HomoStack::flatten(HomoStack::collate(raw));
    let mut cursor = stack.cursor();

    assert!(cursor.jump(Term::EndOfData).await.is_err());
    cursor.jump(Term::EndOfData).await.expect("retry");
    assert_eq!(drain(&mut cursor, Direction::Backward).await, vec![9, 2, 1]);
}
