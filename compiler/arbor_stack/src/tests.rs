use super::*;

/// A chain shaped like `((((0 + 1) + 1) + 1) ...)`, walked recursively.
enum Chain {
    Leaf(u64),
    Add(Box<Chain>),
}

fn build(depth: u64) -> Chain {
    let mut node = Chain::Leaf(0);
    for _ in 0..depth {
        node = Chain::Add(Box::new(node));
    }
    node
}

fn sum(node: &Chain) -> u64 {
    ensure_sufficient_stack(|| match node {
        Chain::Leaf(n) => *n,
        Chain::Add(inner) => sum(inner) + 1,
    })
}

fn release(node: Chain) {
    // Iterative drop so the test does not overflow while freeing the chain.
    let mut current = node;
    while let Chain::Add(inner) = current {
        current = *inner;
    }
}

#[test]
fn shallow_chain() {
    let chain = build(10);
    assert_eq!(sum(&chain), 10);
    release(chain);
}

#[test]
fn deep_chain_does_not_overflow() {
    let chain = build(200_000);
    assert_eq!(sum(&chain), 200_000);
    release(chain);
}

#[test]
fn passes_result_through() {
    let result: Result<i32, &str> = ensure_sufficient_stack(|| Err("boom"));
    assert_eq!(result, Err("boom"));
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn reports_remaining_stack() {
    assert!(remaining_stack().is_some_and(|n| n > 0));
}
