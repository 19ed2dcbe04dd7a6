/*!
# List Query Benchmarks

Measures the cost of translating request parameters into SQL, and of running
the full list pipeline against an in-memory SQLite database.

## Usage

```bash
# Run all benchmarks
cargo bench --bench query_benchmarks

# Run one group
cargo bench --bench query_benchmarks -- "Query Building"

# Quick benchmark with fewer samples
cargo bench --bench query_benchmarks -- --quick
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use listcrate::{ListResource, QueryContext, QueryParams};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    entity::prelude::*,
};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "benchmark_posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: String,
    pub view_count: i32,
    pub score: Option<f64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

struct Posts;

impl ListResource for Posts {
    type EntityType = Entity;
    const RESOURCE_NAME_PLURAL: &'static str = "posts";

    fn searchable_fields() -> &'static [&'static str] {
        &["title", "content"]
    }
}

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().map(|(key, value)| (*key, *value)).collect()
}

fn scenarios() -> Vec<(&'static str, QueryParams)> {
    vec![
        ("empty", QueryParams::new()),
        ("equality", params(&[("category", "Category2")])),
        ("membership", params(&[("category", "Category1,Category3")])),
        ("range", params(&[("viewCount", "[between]100,500")])),
        ("search", params(&[("q", "performance")])),
        ("sorted", params(&[("sort", "-viewCount,title")])),
        (
            "complex",
            params(&[
                ("category", "Category1,Category2"),
                ("viewCount", "[>=]100"),
                ("score", "[!=]null"),
                ("q", "benchmark"),
                ("sort", "-createdAt"),
                ("fields", "title,viewCount"),
                ("page", "2"),
                ("limit", "25"),
            ]),
        ),
    ]
}

async fn setup_benchmark_db(count: usize) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(Entity)))
        .await?;

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let rows: Vec<ActiveModel> = (0..count)
        .map(|i| {
            let n = i32::try_from(i).unwrap_or(i32::MAX);
            ActiveModel {
                title: Set(format!("Benchmark Post {i}")),
                content: Set(format!("Content about performance testing {i}")),
                category: Set(format!("Category{}", i % 5)),
                view_count: Set(n * 7 % 1000),
                score: Set((i % 3 != 0).then(|| f64::from(n % 50) / 10.0)),
                created_at: Set(start + ChronoDuration::minutes(i64::from(n))),
                ..Default::default()
            }
        })
        .collect();

    for chunk in rows.chunks(500) {
        Entity::insert_many(chunk.to_vec()).exec(&db).await?;
    }
    Ok(db)
}

fn bench_query_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("Query Building");

    for (name, params) in scenarios() {
        group.bench_with_input(BenchmarkId::new("statement", name), &params, |b, params| {
            b.iter(|| {
                std::hint::black_box(
                    QueryContext::from_select(Entity::find(), params.clone())
                        .prepare(Posts::searchable_fields())
                        .statement(DbBackend::Postgres),
                )
            });
        });
    }

    group.finish();
}

fn bench_list_execution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    for size in [100, 1000] {
        let db = rt.block_on(setup_benchmark_db(size)).unwrap();

        let mut group = c.benchmark_group(format!("List Execution SQLite ({size} records)"));
        group.measurement_time(Duration::from_secs(10));

        for (name, params) in scenarios() {
            group.bench_with_input(BenchmarkId::new("list", name), &params, |b, params| {
                b.iter(|| {
                    rt.block_on(std::hint::black_box(Posts::list(&db, params.clone())))
                        .unwrap()
                });
            });
        }

        group.finish();
    }
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_query_building, bench_list_execution
}
criterion_main!(benches);
