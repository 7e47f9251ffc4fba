use core::hint::black_box;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fanout::{Event, Pipeline, PipelineConfig, ProcessError, ShutdownPolicy};
use tokio::runtime::Builder;

const EVENTS: u64 = 10_000;

#[derive(Clone, Copy, Debug)]
struct PipelineBenchParams {
    num_workers: usize,
    ingest_capacity: usize,
}

async fn run_pipeline(params: PipelineBenchParams) {
    let config = PipelineConfig {
        ingest_capacity: params.ingest_capacity,
        shutdown_policy: ShutdownPolicy::DrainPending,
        ..PipelineConfig::with_workers(params.num_workers)
    };
    let pipeline = Pipeline::start(config, |_: usize, event: Event| async move {
        black_box(event);
        Ok::<(), ProcessError>(())
    })
    .expect("valid config");

    let relay = pipeline.relay();
    for i in 0..EVENTS {
        relay
            .submit_async(Event::new(i))
            .await
            .expect("pipeline open");
    }

    let report = pipeline.shutdown().await;
    assert_eq!(report.stats.processed, EVENTS);
}

fn pipeline_bench(c: &mut Criterion) {
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(EVENTS));

    for num_workers in [1, 4, 16] {
        for ingest_capacity in [1, 64] {
            let params = PipelineBenchParams {
                num_workers,
                ingest_capacity,
            };
            group.bench_with_input(
                BenchmarkId::new(
                    format!("workers={num_workers}"),
                    format!("ingest={ingest_capacity}"),
                ),
                &params,
                |b, &params| b.to_async(&runtime).iter(|| run_pipeline(params)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, pipeline_bench);
criterion_main!(benches);
