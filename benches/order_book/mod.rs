use criterion::Criterion;

mod aggressive_walk;

/// Register all order book benchmarks.
pub fn register_benchmarks(c: &mut Criterion) {
    add_limit::register_benchmarks(c);
    aggressive_walk::register_benchmarks(c);
}
