use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metar_provider::attributes::*;
use metar_provider::{
    combine, normalize, Condition, ConditionOperator, EvaluationContext, FilterGroup,
    InMemorySource, LocalEvaluator, MetarId, MetarProvider, ObservationRecord, ProviderConfig,
    Query,
};
use tokio::runtime::Runtime;

const STATIONS: [&str; 8] = ["KATL", "KJFK", "KLAX", "KORD", "KDFW", "KDEN", "KSEA", "KBOS"];
const WEATHER: [Option<&str>; 5] = [None, Some("-RA"), Some("RA BR"), Some("SN"), Some("TSRA")];

fn sample_records(count: usize) -> Vec<ObservationRecord> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let station = STATIONS[i % STATIONS.len()];
            let time = start + Duration::minutes((i / STATIONS.len()) as i64 * 5);
            let clouds = if i % 3 == 0 {
                "BKN at 5000"
            } else {
                "FEW at 2500\nOVC at 900"
            };
            ObservationRecord::new(MetarId::encode(station, time).unwrap())
                .with(STATION, station)
                .with(OBSERVATION_TIME, time)
                .with(VISIBILITY_STATUTE_MI, (i % 11) as f64)
                .with(WX_STRING, WEATHER[i % WEATHER.len()])
                .with(CLOUDS, clouds)
        })
        .collect()
}

fn sample_query() -> Query {
    Query::or()
        .with_group(
            FilterGroup::and()
                .with_condition(Condition::single(
                    VISIBILITY_STATUTE_MI,
                    ConditionOperator::GreaterEqual,
                    3,
                ))
                .with_condition(Condition::single(WX_STRING, ConditionOperator::Contains, "RA")),
        )
        .with_group(FilterGroup::or().with_condition(Condition::like(CLOUDS, "%OVC%")))
}

fn bench_filtering(c: &mut Criterion) {
    let records = sample_records(5_000);
    let query = sample_query();
    let evaluator = LocalEvaluator::metar();

    c.bench_function("combine_5000", |b| {
        b.iter(|| {
            let normalized = normalize(black_box(&query)).unwrap();
            let mut context = EvaluationContext::default();
            combine(records.clone(), &normalized, &evaluator, &mut context).unwrap()
        })
    });

    let rt = Runtime::new().unwrap();
    let provider = MetarProvider::with_source(
        InMemorySource::new(records.clone()),
        ProviderConfig::builder().region_codes(Vec::new()).build(),
    );
    c.bench_function("retrieve_multiple_5000", |b| {
        b.to_async(&rt).iter(|| async {
            provider
                .retrieve_multiple(black_box(&query))
                .call()
                .await
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_filtering);
criterion_main!(benches);
