//! Benchmarks for the scope resolver
//!
//! Measures performance of:
//! - Department filtering over growing assignment lists
//! - Employee checks through the in-memory directory
//! - Cached directory lookups

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rota_authz::{CachedHierarchy, InMemoryHierarchy, RoleAssignment, ScopeResolver, UserContext};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn directory(properties: usize, departments: usize, employees: usize) -> InMemoryHierarchy {
    let directory = InMemoryHierarchy::new();
    for p in 0..properties {
        for d in 0..departments {
            for e in 0..employees {
                directory
                    .add_employee(&format!("P{}", p), &format!("D{}", d), &format!("E{}-{}-{}", p, d, e))
                    .unwrap();
            }
        }
    }
    directory
}

fn user_with_assignments(count: usize) -> UserContext {
    (0..count).fold(UserContext::new("bench-user").unwrap(), |user, i| {
        user.with_assignment(
            RoleAssignment::department(&format!("P{}", i % 4), &format!("D{}", i % 16)).unwrap(),
        )
    })
}

fn bench_accessible_departments(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let resolver = ScopeResolver::new(Arc::new(InMemoryHierarchy::new()));

    let mut group = c.benchmark_group("accessible_departments");

    for count in [1, 10, 100, 1000] {
        let user = user_with_assignments(count);
        group.bench_with_input(BenchmarkId::new("assignments", count), &user, |b, user| {
            b.iter(|| {
                rt.block_on(resolver.accessible_departments(black_box(user), black_box("P1")))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_employee_check(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let user = user_with_assignments(32);

    let mut group = c.benchmark_group("employee_check");

    let plain = ScopeResolver::new(Arc::new(directory(4, 16, 50)));
    group.bench_function("in_memory", |b| {
        b.iter(|| {
            rt.block_on(plain.can_access_employee(black_box(&user), "P1", black_box("E1-5-10")))
                .unwrap()
        });
    });

    let cached = ScopeResolver::new(Arc::new(CachedHierarchy::new(directory(4, 16, 50))));
    group.bench_function("cached", |b| {
        b.iter(|| {
            rt.block_on(cached.can_access_employee(black_box(&user), "P1", black_box("E1-5-10")))
                .unwrap()
        });
    });

    group.finish();
}

fn bench_resolve_property_wide(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let hierarchy = directory(1, 64, 10);
    hierarchy.add_manager("gm", "P0").unwrap();
    let resolver = ScopeResolver::new(Arc::new(hierarchy));
    let manager = UserContext::new("gm")
        .unwrap()
        .with_assignment(RoleAssignment::property("P0").unwrap());

    c.bench_function("resolve_property_wide", |b| {
        b.iter(|| rt.block_on(resolver.resolve(black_box(&manager), "P0")).unwrap());
    });
}

criterion_group!(
    benches,
    bench_accessible_departments,
    bench_employee_check,
    bench_resolve_property_wide
);
criterion_main!(benches);
