#![allow(dead_code)]

use bindery::{Binding, Container, Inject, InstantiateErrorKind};
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

#[inline]
fn container_with_transients() -> Container {
    let container = Container::explicit();
    container.set(Binding::transient(|| Ok::<_, InstantiateErrorKind>(CAAA)));
    container.set(Binding::transient(|Inject(caaa): Inject<CAAA>| Ok::<_, InstantiateErrorKind>(CAA(caaa))));
    container.set(Binding::transient(|Inject(caa): Inject<CAA>| Ok::<_, InstantiateErrorKind>(CA(caa))));
    container.set(Binding::transient(|Inject(ca): Inject<CA>| Ok::<_, InstantiateErrorKind>(C(ca))));
    container.set(Binding::transient(|| Ok::<_, InstantiateErrorKind>(B(2))));
    container.set(Binding::transient(|Inject(b): Inject<B>, Inject(c): Inject<C>| {
        Ok::<_, InstantiateErrorKind>(A(b, c))
    }));
    container
}

#[inline]
fn container_get(container: &Container) {
    let _ = container.resolve::<A>().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let container_1 = Container::explicit();
    container_1.set(Binding::instance(B(2)));

    let container_2 = Container::explicit();
    container_2.set(Binding::singleton(|| Ok::<_, InstantiateErrorKind>(B(2))));

    let container_3 = container_with_transients();

    let container_4 = container_with_transients();
    container_4.set(Binding::singleton(|| Ok::<_, InstantiateErrorKind>(CAAA)));

    let bound = container_3
        .bind(|Inject(a): Inject<A>, Inject(c): Inject<C>| Arc::ptr_eq(&a.1, &c))
        .share::<C>();

    c.bench_function("container_new", |b| b.iter(Container::new))
        .bench_function("container_resolve_instance", |b| b.iter(|| container_1.resolve::<B>().unwrap()))
        .bench_function("container_resolve_singleton", |b| b.iter(|| container_2.resolve::<B>().unwrap()))
        .bench_function("container_resolve_nested", |b| b.iter(|| container_get(&container_3)))
        .bench_function("container_resolve_nested_with_singleton", |b| {
            b.iter(|| container_get(&container_4))
        })
        .bench_function("container_validate", |b| b.iter(|| container_3.validate().unwrap()))
        .bench_function("bound_call_shared", |b| b.iter(|| bound.call().unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
